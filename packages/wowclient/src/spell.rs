//! Spell bookkeeping: the known-spell set and the fixed table of
//! user-facing cast-failure messages keyed by the numeric result code.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};


/// Result byte meaning the cast went through.
pub const SPELL_CAST_OK: u8 = 0xFF;

/// The player's known spells. Ordered so the spellbook renders stably.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellBook {
    pub known: BTreeSet<u32>,
}

impl SpellBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learn(&mut self, spell_id: u32) -> bool {
        self.known.insert(spell_id)
    }

    pub fn unlearn(&mut self, spell_id: u32) -> bool {
        self.known.remove(&spell_id)
    }

    pub fn knows(&self, spell_id: u32) -> bool {
        self.known.contains(&spell_id)
    }
}

/// User-facing message for a cast-failure code. Out-of-table codes get a
/// generic message rather than a panic.
pub fn cast_failure_message(code: u8) -> &'static str {
    CAST_FAILURE_MESSAGES
        .get(code as usize)
        .copied()
        .unwrap_or("You can't do that right now.")
}

/// One entry per cast-result code, in wire order.
static CAST_FAILURE_MESSAGES: &[&str] = &[
    "You are in combat.",                                     // 0x00
    "You are already at full health.",
    "You are already at full mana.",
    "You are already at full power.",
    "That creature is already being tamed.",
    "You already control a charmed creature.",
    "You already control a summoned creature.",
    "That is already open.",
    "A more powerful spell is already active.",
    "Autotrack interrupted.",
    "No valid target for this spell.",                        // 0x0A
    "Invalid target.",
    "That target cannot be charmed.",
    "That item cannot be disenchanted.",
    "Your enchanting skill is too low to disenchant that.",
    "That cannot be milled.",
    "That cannot be prospected.",
    "You cannot cast that on a tapped creature.",
    "You cannot duel while invisible.",
    "You cannot duel while stealthed.",
    "You are too close to enemies to stealth.",               // 0x14
    "You can't do that while in your current state.",
    "You are dead.",
    "You are charmed.",
    "That chest is in use.",
    "You are confused.",
    "",                                                       // silent failure
    "You must have the proper item equipped.",
    "You must have the proper item class equipped.",
    "You must have the proper weapon in your main hand.",
    "You must have the proper weapon in your off-hand.",      // 0x1E
    "Internal spell error.",
    "The spell fizzled.",
    "You are fleeing.",
    "That food is too low level for you.",
    "That target is too high level.",
    "You are not hungry.",
    "The target is immune.",
    "You cannot use that here.",
    "Interrupted.",
    "Interrupted by combat.",                                 // 0x28
    "That item is already enchanted.",
    "The item is gone.",
    "You must have the proper item to cast that.",
    "That item is not ready yet.",
    "You are not the required level for that.",
    "Target not in line of sight.",
    "The target is too low level.",
    "Your caster level is too low.",
    "Your main hand is empty.",
    "You can't do that while moving.",                        // 0x32
    "You need ammo for that.",
    "You need an ammo pouch for that.",
    "You need exotic ammo for that.",
    "You need more of that item.",
    "No path available.",
    "You must be behind your target.",
    "Your cast didn't land in fishable water.",
    "You are not flying.",
    "You can't use that here.",
    "You must be in front of your target.",                   // 0x3C
    "You are not in control of your actions.",
    "You haven't learned that spell.",
    "You are not mounted.",
    "You can't do that while on a taxi.",
    "You can't do that while on a transport.",
    "That ability is not ready yet.",
    "You are in shapeshift form.",
    "You must be standing to do that.",
    "That item cannot be traded.",
    "You are not trading.",                                   // 0x46
    "Your weapon must be unsheathed.",
    "You can't do that while you are a ghost.",
    "You can't do that while looting.",
    "Out of ammo.",
    "No charges remain.",
    "You have no champion.",
    "That ability requires combo points.",
    "Dueling is not allowed here.",
    "You are exhausted.",
    "Your cast didn't land in fishable water.",               // 0x50
    "You cannot use items while shapeshifted.",
    "Mounts are not allowed here.",
    "You do not have a pet.",
    "Not enough power.",
    "There is nothing to dispel.",
    "There is nothing to steal.",
    "You can only use that above water.",
    "You can only use that during the day.",
    "You can only use that indoors.",
    "You can only use that while mounted.",                   // 0x5A
    "You can only use that at night.",
    "You can only use that outdoors.",
    "You must be in shapeshift form.",
    "You must be stealthed.",
    "You can only use that underwater.",
    "Out of range.",
    "You are pacified.",
    "You are possessed.",
    "You do not have the required reagents.",
    "You are not in the right area.",                         // 0x64
    "You must be near a spell focus object.",
    "You are rooted.",
    "You are silenced.",
    "Another action is in progress.",
    "You have already learned that spell.",
    "That spell is not available to you.",
    "You are stunned.",
    "Your target is dead.",
    "Your target is in combat.",
    "Your target is in the wrong state.",                     // 0x6E
    "Your target is dueling.",
    "Your target must be an enemy.",
    "Your target is enraged.",
    "Your target must be friendly.",
    "Your target is in combat.",
    "You cannot target players.",
    "Your target is player controlled.",
    "Your target must be dead.",
    "Your target is not in your party.",
    "That creature has not been looted.",                     // 0x78
    "Your target must be a player.",
    "That target has no pockets to pick.",
    "Your target has no weapons equipped.",
    "Your target has no ranged weapon equipped.",
    "That creature cannot be skinned.",
    "You are not thirsty.",
    "You are too close to your target.",
    "You have too many of that item.",
    "You must have the required totem category item.",
    "You must have the required totems.",                     // 0x82
    "Try again.",
    "Your target must be behind you.",
    "Your target must be in front of you.",
    "Your pet doesn't like that food.",
    "You are too fatigued to do that.",
    "Your target is not in your instance.",
    "You can't do that while trading.",
    "Your target is not in your raid.",
    "Your target is free-for-all flagged.",
    "There are no nearby corpses to eat.",                    // 0x8C
    "You can only use that in battlegrounds.",
    "Your target must be a ghost.",
    "You cannot be transformed right now.",
    "The weather is not right for that.",
    "You are immune to damage.",
    "Prevented by a mechanic.",
    "Your play time has expired.",
    "Your reputation is not high enough.",
    "Your skill is not high enough.",
    "You can't do that while in an arena.",                   // 0x96
    "You can't do that while shapeshifted.",
    "You can't do that while stealthed.",
    "You can't do that while immune to damage.",
    "You can't do that on a mounted target.",
    "The water is too shallow.",
    "Your target is in a sanctuary.",
    "Your target is trivial.",
    "You can't do that right now.",
    "You require expert riding skill.",
    "You require artisan riding skill.",                      // 0xA0
    "You are busy.",
    "You are inactive.",
    "Your play time is partially expired.",
    "You have no play time remaining.",
    "You are not in a battleground.",
    "You are not in a raid instance.",
    "You can only use that in an arena.",
    "Your target is locked to a raid instance.",
    "That is always usable.",
    "You must be on the ground.",                             // 0xAA
    "Your fishing skill is too low.",
    "You cannot enchant an item in the trade window.",
    "A summon is already pending.",
    "That item has the maximum number of sockets.",
    "Your pet can be renamed.",
    "Your target cannot be resurrected.",
    "Unknown spell failure.",
    "You can't do that yet.",
    "That charge is spent.",
    "Your zone is being evacuated.",                          // 0xB4
    "Spell is unavailable in this form.",
    "You cannot do that while swimming.",
    "That spell requires a specific form.",
    "That item is not usable right now.",
    "That object is busy.",
    "You are falling.",
    "The target is tapped by someone else.",
    "No valid destination.",
    "Your target has no mana.",
    "You are not standing on solid ground.",                  // 0xBE
];


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_table_is_total() {
        assert!(!cast_failure_message(0).is_empty());
        assert_eq!(cast_failure_message(0x3E), "You haven't learned that spell.");
        // out-of-table codes fall back, never panic
        assert_eq!(cast_failure_message(250), "You can't do that right now.");
    }

    #[test]
    fn spellbook_learn_unlearn() {
        let mut book = SpellBook::new();
        assert!(book.learn(133));
        assert!(!book.learn(133));
        assert!(book.knows(133));
        assert!(book.unlearn(133));
        assert!(!book.knows(133));
    }
}
