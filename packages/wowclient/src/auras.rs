//! Aura slots for the player and for the current target.

use crate::entity::Guid;
use serde::{Serialize, Deserialize};


/// One visible aura. `duration` of `None` means it does not expire.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuraSlot {
    pub spell_id: u32,
    pub flags: u8,
    pub caster: Guid,
    /// Game-time seconds at application.
    pub applied_at: f64,
    pub duration: Option<f32>,
    pub max_duration: f32,
}

impl AuraSlot {
    pub fn remaining(&self, now: f64) -> Option<f32> {
        self.duration.map(|d| (d as f64 - (now - self.applied_at)).max(0.0) as f32)
    }

    pub fn expired(&self, now: f64) -> bool {
        self.remaining(now).map(|r| r <= 0.0).unwrap_or(false)
    }
}

/// The two parallel aura vectors the UI reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Auras {
    pub own: Vec<AuraSlot>,
    pub target: Vec<AuraSlot>,
}

impl Auras {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply into a slot index, growing the vector as the server dictates.
    pub fn set_own(&mut self, slot: usize, aura: AuraSlot) {
        set_slot(&mut self.own, slot, aura);
    }

    pub fn set_target(&mut self, slot: usize, aura: AuraSlot) {
        set_slot(&mut self.target, slot, aura);
    }

    /// A zero spell id in an update means the slot was cleared.
    pub fn clear_own(&mut self, slot: usize) {
        clear_slot(&mut self.own, slot);
    }

    pub fn clear_target(&mut self, slot: usize) {
        clear_slot(&mut self.target, slot);
    }

    pub fn clear_all_target(&mut self) {
        self.target.clear();
    }

    /// Drop expired own-auras, for the single-player driver which has no
    /// server to do it.
    pub fn expire(&mut self, now: f64) {
        self.own.retain(|a| !a.expired(now));
        self.target.retain(|a| !a.expired(now));
    }
}

fn set_slot(vec: &mut Vec<AuraSlot>, slot: usize, aura: AuraSlot) {
    if slot >= vec.len() {
        vec.resize(
            slot + 1,
            AuraSlot {
                spell_id: 0,
                flags: 0,
                caster: 0,
                applied_at: 0.0,
                duration: None,
                max_duration: 0.0,
            },
        );
    }
    vec[slot] = aura;
}

fn clear_slot(vec: &mut Vec<AuraSlot>, slot: usize) {
    if let Some(entry) = vec.get_mut(slot) {
        entry.spell_id = 0;
    }
    while vec.last().map(|a| a.spell_id == 0).unwrap_or(false) {
        vec.pop();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn aura(spell_id: u32, applied_at: f64, duration: Option<f32>) -> AuraSlot {
        AuraSlot {
            spell_id,
            flags: 0,
            caster: 1,
            applied_at,
            duration,
            max_duration: duration.unwrap_or(0.0),
        }
    }

    #[test]
    fn remaining_and_expiry() {
        let a = aura(10, 100.0, Some(30.0));
        assert_eq!(a.remaining(110.0), Some(20.0));
        assert!(!a.expired(110.0));
        assert!(a.expired(130.5));
        // permanent aura never expires
        assert!(!aura(11, 0.0, None).expired(1e9));
    }

    #[test]
    fn slot_updates_grow_and_shrink() {
        let mut auras = Auras::new();
        auras.set_own(3, aura(5, 0.0, None));
        assert_eq!(auras.own.len(), 4);
        assert_eq!(auras.own[3].spell_id, 5);
        auras.clear_own(3);
        assert!(auras.own.is_empty());
    }
}
