//! Single-player persistence: one local file per character, flushed
//! through dirty-flag coalescing. Updates set bits; a short debounce plus
//! a long periodic timer decide when to hit disk, and high-priority flags
//! (XP, level) bypass the debounce.

use crate::{
    action_bar::ActionBar,
    auras::AuraSlot,
    character::{AppearanceBytes, Class, Gender, Race},
    inventory::Inventory,
    quest_log::QuestLog,
    settings::Settings,
    spell::SpellBook,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use anyhow::{Result, Context};
use bitflags::bitflags;
use serde::{Serialize, Deserialize};


/// Seconds a low-priority change may sit before flushing.
const DEBOUNCE: f32 = 2.0;
/// Seconds between unconditional flushes of anything dirty.
const PERIODIC: f32 = 60.0;

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct DirtyFlags: u32 {
        const IDENTITY = 1 << 0;
        const INVENTORY = 1 << 1;
        const SPELLS = 1 << 2;
        const ACTION_BAR = 1 << 3;
        const AURAS = 1 << 4;
        const QUESTS = 1 << 5;
        const MONEY = 1 << 6;
        const XP = 1 << 7;
        const LEVEL = 1 << 8;
        const POSITION = 1 << 9;
        const STATS = 1 << 10;
        const SETTINGS = 1 << 11;
    }
}

impl DirtyFlags {
    /// Flags that flush immediately rather than waiting out the debounce.
    pub fn high_priority() -> Self {
        DirtyFlags::XP | DirtyFlags::LEVEL
    }
}

/// Everything a character save holds. The encoding is opaque to callers;
/// schema changes may require migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub name: String,
    pub race: Race,
    pub class: Class,
    pub gender: Gender,
    pub appearance: AppearanceBytes,
    pub level: u32,
    pub xp: u32,
    pub money: u32,
    pub map: u32,
    pub zone: u32,
    pub pos: [f32; 3],
    pub yaw: f32,
    pub health: u32,
    pub max_health: u32,
    pub power: u32,
    pub max_power: u32,
    pub unspent_talent_points: u32,
    pub inventory: Inventory,
    pub action_bar: ActionBar,
    pub auras: Vec<AuraSlot>,
    pub spellbook: SpellBook,
    pub quest_log: QuestLog,
    pub settings: Settings,
}

pub fn load(path: &Path) -> Result<SaveData> {
    let bytes = fs::read(path).with_context(|| format!("reading save {:?}", path))?;
    bincode::deserialize(&bytes).context("decoding save")
}

pub fn store(path: &Path, data: &SaveData) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(data).context("encoding save")?;
    fs::write(path, bytes).with_context(|| format!("writing save {:?}", path))?;
    Ok(())
}

/// Tracks what changed and when to flush it.
#[derive(Debug)]
pub struct SaveTracker {
    path: PathBuf,
    dirty: DirtyFlags,
    /// Seconds until the debounced flush, when armed.
    debounce: Option<f32>,
    periodic: f32,
}

impl SaveTracker {
    pub fn new(path: PathBuf) -> Self {
        SaveTracker {
            path,
            dirty: DirtyFlags::empty(),
            debounce: None,
            periodic: PERIODIC,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Record a change. The earliest pending deadline wins, and
    /// high-priority flags arm an immediate flush.
    pub fn mark(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
        let wait = if flags.intersects(DirtyFlags::high_priority()) {
            0.0
        } else {
            DEBOUNCE
        };
        self.debounce = Some(match self.debounce {
            Some(existing) => existing.min(wait),
            None => wait,
        });
    }

    /// Advance the timers; true means the caller should flush now.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.dirty.is_empty() {
            self.debounce = None;
            return false;
        }
        self.periodic -= dt;
        if let Some(remaining) = self.debounce.as_mut() {
            *remaining -= dt;
        }
        let due = self.debounce.map(|r| r <= 0.0).unwrap_or(false) || self.periodic <= 0.0;
        if due {
            self.debounce = None;
            self.periodic = PERIODIC;
        }
        due
    }

    pub fn clear(&mut self) {
        self.dirty = DirtyFlags::empty();
        self.debounce = None;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_priority_waits_out_the_debounce() {
        let mut tracker = SaveTracker::new(PathBuf::from("x"));
        tracker.mark(DirtyFlags::POSITION);
        assert!(!tracker.tick(1.0));
        assert!(!tracker.tick(0.5));
        assert!(tracker.tick(0.6));
        tracker.clear();
        assert!(!tracker.tick(100.0));
    }

    #[test]
    fn high_priority_bypasses_the_debounce() {
        let mut tracker = SaveTracker::new(PathBuf::from("x"));
        tracker.mark(DirtyFlags::XP);
        assert!(tracker.tick(0.01));
    }

    #[test]
    fn repeated_marks_coalesce_to_the_earliest_deadline() {
        let mut tracker = SaveTracker::new(PathBuf::from("x"));
        tracker.mark(DirtyFlags::POSITION);
        tracker.tick(1.5);
        // re-marking must not push the deadline back out
        tracker.mark(DirtyFlags::MONEY);
        assert!(tracker.tick(0.6));
        assert_eq!(tracker.dirty(), DirtyFlags::POSITION | DirtyFlags::MONEY);
    }

    #[test]
    fn save_round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!(
            "wowclient-save-test-{}.sav",
            std::process::id(),
        ));
        let data = SaveData {
            name: "Aldra".to_owned(),
            race: Race::Orc,
            class: Class::Shaman,
            gender: Gender::Female,
            appearance: AppearanceBytes::default(),
            level: 3,
            xp: 120,
            money: 95,
            map: 1,
            zone: 14,
            pos: [-618.5, -4251.6, 38.7],
            yaw: 1.0,
            health: 71,
            max_health: 71,
            power: 90,
            max_power: 90,
            unspent_talent_points: 0,
            inventory: Inventory::new(),
            action_bar: ActionBar::new(),
            auras: Vec::new(),
            spellbook: SpellBook::new(),
            quest_log: QuestLog::new(),
            settings: Settings::default(),
        };
        store(&path, &data).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.name, "Aldra");
        assert_eq!(loaded.race, Race::Orc);
        assert_eq!(loaded.level, 3);
        assert_eq!(loaded.pos, data.pos);
        let _ = fs::remove_file(&path);
    }
}
