//! The thread-of-truth data model the UI consumes: entities in view plus
//! the active player's aggregates. Both drivers mutate exactly this, so
//! the UI cannot tell a real server from the single-player simulator.

use crate::{
    action_bar::ActionBar,
    auras::Auras,
    chat::ChatHistory,
    entity::{Entity, EntityMgr, Guid},
    group::Group,
    inventory::Inventory,
    quest_log::QuestLog,
    spell::SpellBook,
};
use std::collections::{HashMap, HashSet};


/// Level/experience progression for the active player.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub level: u32,
    pub xp: u32,
    pub next_level_xp: u32,
    pub unspent_talent_points: u32,
}

#[derive(Debug, Default)]
pub struct GameState {
    pub entities: EntityMgr,
    pub player_guid: Guid,
    pub map: u32,
    pub inventory: Inventory,
    pub action_bar: ActionBar,
    pub auras: Auras,
    pub group: Option<Group>,
    pub quest_log: QuestLog,
    pub chat: ChatHistory,
    pub spellbook: SpellBook,
    pub money: u32,
    pub progress: Progress,
    /// Current selection.
    pub target: Guid,
    /// Names learned from queries; outlives the entities they named.
    pub name_cache: HashMap<Guid, String>,
    /// Accumulated game time in seconds, the clock aura timestamps use.
    pub game_time: f64,
    /// Guids whose visible equipment changed since the compositor last ran.
    equipment_dirty: HashSet<Guid>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entities.get(self.player_guid)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.entities.get_mut(self.player_guid)
    }

    pub fn target_entity(&self) -> Option<&Entity> {
        self.entities.get(self.target)
    }

    pub fn mark_equipment_dirty(&mut self, guid: Guid) {
        self.equipment_dirty.insert(guid);
    }

    /// Drain the dirty set; the shell calls this once per frame and
    /// re-composites what came out.
    pub fn take_equipment_dirty(&mut self) -> Vec<Guid> {
        self.equipment_dirty.drain().collect()
    }

    pub fn name_of(&self, guid: Guid) -> Option<&str> {
        if let Some(name) = self.name_cache.get(&guid) {
            return Some(name);
        }
        self.entities
            .get(guid)
            .and_then(|e| e.player())
            .map(|p| p.name.as_str())
    }

    /// Session teardown: entities and transient windows go away, the
    /// player-scoped aggregates are reset.
    pub fn reset(&mut self) {
        *self = GameState {
            game_time: self.game_time,
            ..GameState::default()
        };
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ObjectKind;

    #[test]
    fn equipment_dirty_drains_once() {
        let mut state = GameState::new();
        state.mark_equipment_dirty(5);
        state.mark_equipment_dirty(5);
        state.mark_equipment_dirty(9);
        let mut dirty = state.take_equipment_dirty();
        dirty.sort();
        assert_eq!(dirty, vec![5, 9]);
        assert!(state.take_equipment_dirty().is_empty());
    }

    #[test]
    fn name_cache_survives_entity_destroy() {
        let mut state = GameState::new();
        state.entities.create(3, ObjectKind::Player).player_mut().unwrap().name =
            "Aldra".to_owned();
        state.name_cache.insert(3, "Aldra".to_owned());
        state.entities.destroy(3);
        assert_eq!(state.name_of(3), Some("Aldra"));
    }
}
