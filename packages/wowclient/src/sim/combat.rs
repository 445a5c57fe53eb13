//! The simulator's combat loop: the player swings at a fixed cadence,
//! every aggroed NPC swings on its own timer, and damage comes from a
//! deterministic level-scaled table.

use crate::{
    entity::Guid,
    events::{GameEvent, GameEvents},
    game_state::GameState,
};
use std::collections::HashMap;


/// Seconds between player auto-attack swings.
pub const SWING_SPEED: f32 = 2.0;

/// Deterministic melee damage for a combatant of this level.
pub fn damage_for_level(level: u32) -> u32 {
    2 + 3 * level
}

#[derive(Debug)]
struct NpcCombat {
    swing_timer: f32,
}

/// Auto-attack state. Deaths come back from `tick`; the driver decides
/// what a death means (XP, loot, quest credit, respawn).
#[derive(Debug, Default)]
pub struct CombatSim {
    attacking: Option<Guid>,
    player_swing: f32,
    aggro: HashMap<Guid, NpcCombat>,
}

impl CombatSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_combat(&self) -> bool {
        !self.aggro.is_empty()
    }

    pub fn attacking(&self) -> Option<Guid> {
        self.attacking
    }

    /// Begin auto-attacking; the victim fights back on an independent
    /// timer offset so swings do not lockstep.
    pub fn engage(&mut self, victim: Guid, events: &mut GameEvents, player: Guid) {
        if self.attacking == Some(victim) {
            return;
        }
        self.attacking = Some(victim);
        self.player_swing = 0.5;
        self.aggro
            .entry(victim)
            .or_insert(NpcCombat { swing_timer: SWING_SPEED * 0.75 });
        events.push(GameEvent::AttackStarted { attacker: player, victim });
    }

    pub fn disengage(&mut self, events: &mut GameEvents, player: Guid) {
        if self.attacking.take().is_some() {
            events.push(GameEvent::AttackStopped { attacker: player });
        }
    }

    /// Drop a dead or despawned NPC from the aggro list.
    pub fn forget(&mut self, guid: Guid) {
        self.aggro.remove(&guid);
        if self.attacking == Some(guid) {
            self.attacking = None;
        }
    }

    /// Advance every swing timer. NPCs whose health crossed to zero this
    /// tick are returned; the player hitting zero is clamped and surfaced
    /// as an event only.
    pub fn tick(&mut self, dt: f32, state: &mut GameState, events: &mut GameEvents) -> Vec<Guid> {
        let mut deaths = Vec::new();
        let player_guid = state.player_guid;
        let player_level = state.progress.level;

        // player swing
        if let Some(victim) = self.attacking {
            let victim_alive = state
                .entities
                .get(victim)
                .map(|e| e.is_alive())
                .unwrap_or(false);
            if !victim_alive {
                self.attacking = None;
            } else {
                self.player_swing -= dt;
                if self.player_swing <= 0.0 {
                    self.player_swing += SWING_SPEED;
                    let damage = damage_for_level(player_level);
                    if let Some(unit) =
                        state.entities.get_mut(victim).and_then(|e| e.unit_mut())
                    {
                        let was_alive = unit.health > 0;
                        unit.health = unit.health.saturating_sub(damage);
                        if was_alive && unit.health == 0 {
                            deaths.push(victim);
                            events.push(GameEvent::UnitDied(victim));
                        }
                    }
                }
            }
        }

        // every aggroed npc swings independently
        let mut npc_hits = Vec::new();
        for (&guid, npc) in self.aggro.iter_mut() {
            let Some(unit) = state.entities.get(guid).and_then(|e| e.unit()) else {
                continue;
            };
            if unit.health == 0 {
                continue;
            }
            npc.swing_timer -= dt;
            while npc.swing_timer <= 0.0 {
                npc.swing_timer += SWING_SPEED;
                npc_hits.push(damage_for_level(unit.level));
            }
        }
        for damage in npc_hits {
            let Some(unit) = state
                .entities
                .get_mut(player_guid)
                .and_then(|e| e.unit_mut())
            else {
                continue;
            };
            let was_alive = unit.health > 0;
            unit.health = unit.health.saturating_sub(damage);
            if was_alive && unit.health == 0 {
                events.push(GameEvent::UnitDied(player_guid));
            }
        }

        for guid in &deaths {
            self.forget(*guid);
        }
        deaths
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ObjectKind;

    fn arena() -> (CombatSim, GameState, GameEvents) {
        let mut state = GameState::new();
        state.player_guid = 1;
        state.progress.level = 1;
        let player = state.entities.create(1, ObjectKind::Player);
        let unit = player.unit_mut().unwrap();
        unit.level = 1;
        unit.health = 60;
        unit.max_health = 60;
        let boar = state.entities.create(100, ObjectKind::Unit);
        let unit = boar.unit_mut().unwrap();
        unit.level = 1;
        unit.health = 11;
        unit.max_health = 11;
        (CombatSim::new(), state, GameEvents::new())
    }

    #[test]
    fn swings_kill_and_report_once() {
        let (mut combat, mut state, mut events) = arena();
        combat.engage(100, &mut events, 1);
        let mut deaths = Vec::new();
        // 11 hp at 5 damage per swing: dead on the third swing
        for _ in 0..20 {
            deaths.extend(combat.tick(1.0, &mut state, &mut events));
        }
        assert_eq!(deaths, vec![100]);
        assert_eq!(state.entities.get(100).unwrap().unit().unwrap().health, 0);
        assert!(!combat.in_combat() || combat.attacking().is_none());
    }

    #[test]
    fn npc_fights_back_until_dead() {
        let (mut combat, mut state, mut events) = arena();
        combat.engage(100, &mut events, 1);
        for _ in 0..20 {
            combat.tick(1.0, &mut state, &mut events);
        }
        let player_hp = state.entities.get(1).unwrap().unit().unwrap().health;
        assert!(player_hp < 60, "the boar landed hits");
        assert!(player_hp > 0, "three swings of 5 cannot down 60 hp");
    }

    #[test]
    fn player_damage_is_deterministic() {
        assert_eq!(damage_for_level(1), 5);
        assert_eq!(damage_for_level(10), 32);
        assert_eq!(damage_for_level(1), damage_for_level(1));
    }
}
