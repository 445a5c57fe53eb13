//! Events the drivers (session or single-player) surface to the shell.
//!
//! Instead of a callback slot per concern, both drivers push typed events
//! into one queue and the shell drains it each frame. Ownership stays
//! one-way: nothing here closes over the shell.

use crate::{
    character::CharacterSummary,
    entity::Guid,
    item::Quality,
    session::SessionState,
};
use std::collections::VecDeque;
use vek::*;


/// An open loot window.
#[derive(Debug, Clone, Default)]
pub struct LootWindow {
    pub source: Guid,
    pub money: u32,
    pub items: Vec<LootItem>,
}

#[derive(Debug, Clone)]
pub struct LootItem {
    pub slot: u8,
    pub item_id: u32,
    pub display_id: u32,
    pub count: u32,
    pub quality: Quality,
}

/// An open vendor window.
#[derive(Debug, Clone, Default)]
pub struct VendorWindow {
    pub vendor: Guid,
    pub items: Vec<VendorItem>,
}

#[derive(Debug, Clone)]
pub struct VendorItem {
    pub index: u32,
    pub item_id: u32,
    pub display_id: u32,
    pub price: u32,
    pub available: u32,
}

/// An open gossip menu.
#[derive(Debug, Clone, Default)]
pub struct GossipMenu {
    pub npc: Guid,
    pub text_id: u32,
    pub options: Vec<GossipOption>,
    pub quests: Vec<GossipQuest>,
}

#[derive(Debug, Clone)]
pub struct GossipOption {
    pub index: u32,
    pub icon: u8,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct GossipQuest {
    pub quest_id: u32,
    pub icon: u32,
    pub level: i32,
    pub title: String,
}

/// Everything a driver can tell the shell.
#[derive(Debug)]
pub enum GameEvent {
    SessionState(SessionState),
    SessionFailed { reason: String },
    CharList(Vec<CharacterSummary>),
    WorldEntered { map: u32, pos: Vec3<f32>, yaw: f32 },
    EntityCreated(Guid),
    EntityDestroyed(Guid),
    /// The named entity's visible equipment changed; the compositor
    /// should re-run.
    EquipmentChanged(Guid),
    AttackStarted { attacker: Guid, victim: Guid },
    AttackStopped { attacker: Guid },
    UnitDied(Guid),
    UnitRespawned(Guid),
    XpGained { amount: u32, victim: Guid },
    LevelUp { level: u32 },
    CastFailed { spell_id: u32, message: &'static str },
    LootOpened(LootWindow),
    LootSlotRemoved { slot: u8 },
    LootClosed,
    VendorOpened(VendorWindow),
    GossipOpened(GossipMenu),
    GossipClosed,
    QuestDetails {
        giver: Guid,
        quest_id: u32,
        title: String,
        details: String,
        objectives: String,
    },
    QuestRewardOffered { quest_id: u32, title: String },
    QuestCompleted { quest_id: u32, xp: u32, money: u32 },
    GroupUpdated,
    Latency { ms: u32 },
}

/// The queue both drivers feed.
#[derive(Debug, Default)]
pub struct GameEvents {
    queue: VecDeque<GameEvent>,
}

impl GameEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
