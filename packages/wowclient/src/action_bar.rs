//! The 12-slot action bar with per-slot cooldowns.

use serde::{Serialize, Deserialize};


pub const ACTION_SLOTS: usize = 12;

/// What a slot is bound to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Empty,
    Spell(u32),
    Item(u32),
    Macro(u32),
}

impl Default for Action {
    fn default() -> Self {
        Action::Empty
    }
}

/// A slot plus its independent countdown.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct ActionSlot {
    pub action: Action,
    pub cooldown_remaining: f32,
    pub cooldown_total: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionBar {
    pub slots: [ActionSlot; ACTION_SLOTS],
}

impl ActionBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a slot, e.g. from a spellbook drag. Cooldown state resets.
    pub fn set(&mut self, index: usize, action: Action) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = ActionSlot { action, ..ActionSlot::default() };
        }
    }

    pub fn clear(&mut self, index: usize) {
        self.set(index, Action::Empty);
    }

    pub fn get(&self, index: usize) -> Action {
        self.slots.get(index).map(|s| s.action).unwrap_or(Action::Empty)
    }

    /// Move a binding between slots, swapping whatever was there.
    pub fn swap(&mut self, from: usize, to: usize) {
        if from < ACTION_SLOTS && to < ACTION_SLOTS && from != to {
            self.slots.swap(from, to);
        }
    }

    pub fn start_cooldown(&mut self, index: usize, total: f32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.cooldown_remaining = total;
            slot.cooldown_total = total;
        }
    }

    /// Whether the slot is bound and off cooldown.
    pub fn is_ready(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .map(|s| s.action != Action::Empty && s.cooldown_remaining <= 0.0)
            .unwrap_or(false)
    }

    /// Advance every countdown.
    pub fn tick(&mut self, dt: f32) {
        for slot in &mut self.slots {
            if slot.cooldown_remaining > 0.0 {
                slot.cooldown_remaining = (slot.cooldown_remaining - dt).max(0.0);
                if slot.cooldown_remaining == 0.0 {
                    slot.cooldown_total = 0.0;
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_counts_down_independently() {
        let mut bar = ActionBar::new();
        bar.set(0, Action::Spell(100));
        bar.set(1, Action::Item(200));
        bar.start_cooldown(0, 1.5);
        assert!(!bar.is_ready(0));
        assert!(bar.is_ready(1));
        bar.tick(1.0);
        assert!(!bar.is_ready(0));
        bar.tick(1.0);
        assert!(bar.is_ready(0));
    }

    #[test]
    fn empty_slot_is_never_ready() {
        let bar = ActionBar::new();
        assert!(!bar.is_ready(0));
        assert!(!bar.is_ready(99));
    }

    #[test]
    fn swap_carries_cooldown_with_the_slot() {
        let mut bar = ActionBar::new();
        bar.set(2, Action::Spell(7));
        bar.start_cooldown(2, 10.0);
        bar.swap(2, 5);
        assert_eq!(bar.get(5), Action::Spell(7));
        assert_eq!(bar.get(2), Action::Empty);
        assert!(!bar.is_ready(5));
    }
}
