//! The player's fixed-shape inventory: equipment, backpack, auxiliary
//! bags, and the bank.
//!
//! Slot assignments are exclusive. Every mutation here moves item
//! instances by value, so the same instance can never be visible in two
//! slots at once.

use crate::item::{ItemInstance, InventoryType};
use serde::{Serialize, Deserialize};


pub const BACKPACK_SLOTS: usize = 16;
pub const EQUIPMENT_SLOTS: usize = 23;
pub const BAG_COUNT: usize = 4;
pub const BAG_MAX_SLOTS: usize = 36;
pub const BANK_SLOTS: usize = 28;
pub const BANK_BAG_COUNT: usize = 7;

/// Equipment slot indices, wire-compatible with the char-enum order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EquipSlot {
    Head = 0,
    Neck = 1,
    Shoulders = 2,
    Shirt = 3,
    Chest = 4,
    Waist = 5,
    Legs = 6,
    Feet = 7,
    Wrists = 8,
    Hands = 9,
    Finger1 = 10,
    Finger2 = 11,
    Trinket1 = 12,
    Trinket2 = 13,
    Back = 14,
    MainHand = 15,
    OffHand = 16,
    Ranged = 17,
    Tabard = 18,
    Bag1 = 19,
    Bag2 = 20,
    Bag3 = 21,
    Bag4 = 22,
}

impl EquipSlot {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        use EquipSlot::*;
        const ALL: [EquipSlot; EQUIPMENT_SLOTS] = [
            Head, Neck, Shoulders, Shirt, Chest, Waist, Legs, Feet, Wrists,
            Hands, Finger1, Finger2, Trinket1, Trinket2, Back, MainHand,
            OffHand, Ranged, Tabard, Bag1, Bag2, Bag3, Bag4,
        ];
        ALL.get(index).copied()
    }
}

/// An auxiliary bag: absent, or present with up to 36 slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bag {
    pub slots: Vec<Option<ItemInstance>>,
}

impl Bag {
    pub fn with_size(size: usize) -> Self {
        Bag { slots: vec![None; size.min(BAG_MAX_SLOTS)] }
    }
}

/// Where an `add_item` landed, or why it could not.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddOutcome {
    Merged { backpack_slot: usize },
    Placed { backpack_slot: usize },
    NoRoom,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    equipment: [Option<ItemInstance>; EQUIPMENT_SLOTS],
    backpack: [Option<ItemInstance>; BACKPACK_SLOTS],
    bags: [Bag; BAG_COUNT],
    bank: [Option<ItemInstance>; BANK_SLOTS],
    bank_bags: [Bag; BANK_BAG_COUNT],
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equipped(&self, slot: EquipSlot) -> Option<&ItemInstance> {
        self.equipment[slot.index()].as_ref()
    }

    pub fn backpack_slot(&self, index: usize) -> Option<&ItemInstance> {
        self.backpack.get(index).and_then(|s| s.as_ref())
    }

    pub fn bank_slot(&self, index: usize) -> Option<&ItemInstance> {
        self.bank.get(index).and_then(|s| s.as_ref())
    }

    pub fn bag(&self, index: usize) -> Option<&Bag> {
        self.bags.get(index)
    }

    pub fn set_backpack_slot(&mut self, index: usize, item: Option<ItemInstance>) {
        if let Some(slot) = self.backpack.get_mut(index) {
            *slot = item;
        }
    }

    pub fn set_equipped(&mut self, slot: EquipSlot, item: Option<ItemInstance>) {
        self.equipment[slot.index()] = item;
    }

    pub fn clear_backpack_slot(&mut self, index: usize) -> Option<ItemInstance> {
        self.backpack.get_mut(index).and_then(|s| s.take())
    }

    /// All occupied equipment slots, for the compositor and geoset logic.
    pub fn equipped_items(&self) -> impl Iterator<Item = (EquipSlot, &ItemInstance)> {
        self.equipment
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref().map(|item| (EquipSlot::from_index(i).unwrap(), item))
            })
    }

    /// Merge into existing stacks of the same item id first, then take the
    /// first empty backpack slot.
    pub fn add_item(&mut self, mut item: ItemInstance) -> AddOutcome {
        if item.max_stack > 1 {
            for (i, slot) in self.backpack.iter_mut().enumerate() {
                let Some(existing) = slot else { continue };
                if existing.item_id != item.item_id {
                    continue;
                }
                let room = existing.max_stack.saturating_sub(existing.stack_count);
                if room == 0 {
                    continue;
                }
                let moved = room.min(item.stack_count);
                existing.stack_count += moved;
                item.stack_count -= moved;
                if item.stack_count == 0 {
                    return AddOutcome::Merged { backpack_slot: i };
                }
            }
        }
        match self.first_free_backpack_slot() {
            Some(i) => {
                self.backpack[i] = Some(item);
                AddOutcome::Placed { backpack_slot: i }
            }
            None => AddOutcome::NoRoom,
        }
    }

    pub fn first_free_backpack_slot(&self) -> Option<usize> {
        self.backpack.iter().position(|s| s.is_none())
    }

    /// Equip an item according to its inventory type. Returns the item back
    /// if there is nowhere to put it.
    ///
    /// Paired slots (rings, trinkets) prefer their first empty instance.
    /// A two-hander clears the off-hand into the backpack; conversely an
    /// off-hand piece displaces an equipped two-hander into the backpack.
    pub fn equip(&mut self, item: ItemInstance) -> Result<EquipSlot, ItemInstance> {
        use InventoryType::*;
        let slot = match item.inventory_type {
            Head => EquipSlot::Head,
            Neck => EquipSlot::Neck,
            Shoulders => EquipSlot::Shoulders,
            Shirt => EquipSlot::Shirt,
            Chest | Robe => EquipSlot::Chest,
            Waist => EquipSlot::Waist,
            Legs => EquipSlot::Legs,
            Feet => EquipSlot::Feet,
            Wrists => EquipSlot::Wrists,
            Hands => EquipSlot::Hands,
            Finger => self.first_empty_of(EquipSlot::Finger1, EquipSlot::Finger2),
            Trinket => self.first_empty_of(EquipSlot::Trinket1, EquipSlot::Trinket2),
            Cloak => EquipSlot::Back,
            Weapon | TwoHandWeapon | WeaponMainHand => EquipSlot::MainHand,
            Shield | WeaponOffHand | Holdable => EquipSlot::OffHand,
            Ranged | RangedRight | Thrown | Relic => EquipSlot::Ranged,
            Tabard => EquipSlot::Tabard,
            Bag | Quiver => {
                return Err(item);
            }
            NonEquip | Ammo => return Err(item),
        };

        if item.inventory_type == TwoHandWeapon {
            if let Some(off_hand) = self.equipment[EquipSlot::OffHand.index()].take() {
                if let AddOutcome::NoRoom = self.add_item(off_hand.clone()) {
                    // no room to displace; restore and refuse
                    self.equipment[EquipSlot::OffHand.index()] = Some(off_hand);
                    return Err(item);
                }
            }
        }
        if slot == EquipSlot::OffHand {
            let two_hander_in_main = self
                .equipped(EquipSlot::MainHand)
                .map(|i| i.inventory_type == TwoHandWeapon)
                .unwrap_or(false);
            if two_hander_in_main {
                let main = self.equipment[EquipSlot::MainHand.index()].take().unwrap();
                if let AddOutcome::NoRoom = self.add_item(main.clone()) {
                    self.equipment[EquipSlot::MainHand.index()] = Some(main);
                    return Err(item);
                }
            }
        }

        // a previous occupant goes back to the backpack
        if let Some(previous) = self.equipment[slot.index()].take() {
            if let AddOutcome::NoRoom = self.add_item(previous.clone()) {
                self.equipment[slot.index()] = Some(previous);
                return Err(item);
            }
        }
        self.equipment[slot.index()] = Some(item);
        Ok(slot)
    }

    fn first_empty_of(&self, a: EquipSlot, b: EquipSlot) -> EquipSlot {
        if self.equipment[a.index()].is_none() { a } else { b }
    }

    /// Remove up to `count` of an item across backpack and bags, shrinking
    /// stacks and emptying slots. Returns how many were actually removed.
    pub fn remove_items(&mut self, item_id: u32, count: u32) -> u32 {
        let mut left = count;
        let backpack = self.backpack.iter_mut();
        let bags = self.bags.iter_mut().flat_map(|b| b.slots.iter_mut());
        for slot in backpack.chain(bags) {
            if left == 0 {
                break;
            }
            let Some(item) = slot else { continue };
            if item.item_id != item_id {
                continue;
            }
            let taken = item.stack_count.min(left);
            item.stack_count -= taken;
            left -= taken;
            if item.stack_count == 0 {
                *slot = None;
            }
        }
        count - left
    }

    /// Count of an item id across backpack and bags, for quest counters.
    pub fn count_of(&self, item_id: u32) -> u32 {
        let backpack = self.backpack.iter().flatten();
        let bags = self.bags.iter().flat_map(|b| b.slots.iter().flatten());
        backpack
            .chain(bags)
            .filter(|i| i.item_id == item_id)
            .map(|i| i.stack_count)
            .sum()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Quality;

    fn two_hander() -> ItemInstance {
        ItemInstance::simple(2000, "Greatsword", InventoryType::TwoHandWeapon)
    }

    fn shield() -> ItemInstance {
        ItemInstance::simple(3000, "Buckler", InventoryType::Shield)
    }

    #[test]
    fn add_item_merges_then_places() {
        let mut inv = Inventory::new();
        assert_eq!(
            inv.add_item(ItemInstance::stackable(10, "Linen", 15, 20)),
            AddOutcome::Placed { backpack_slot: 0 },
        );
        assert_eq!(
            inv.add_item(ItemInstance::stackable(10, "Linen", 10, 20)),
            AddOutcome::Placed { backpack_slot: 1 },
        );
        // 15 + 10 splits as fill-to-20 then remainder 5
        assert_eq!(inv.backpack_slot(0).unwrap().stack_count, 20);
        assert_eq!(inv.backpack_slot(1).unwrap().stack_count, 5);
        // stack bound holds everywhere
        for i in 0..BACKPACK_SLOTS {
            if let Some(item) = inv.backpack_slot(i) {
                assert!(item.stack_count <= item.max_stack);
            }
        }
    }

    #[test]
    fn add_item_fails_when_full() {
        let mut inv = Inventory::new();
        for _ in 0..BACKPACK_SLOTS {
            assert_ne!(
                inv.add_item(ItemInstance::simple(1, "Rock", InventoryType::NonEquip)),
                AddOutcome::NoRoom,
            );
        }
        assert_eq!(
            inv.add_item(ItemInstance::simple(1, "Rock", InventoryType::NonEquip)),
            AddOutcome::NoRoom,
        );
    }

    #[test]
    fn two_hander_clears_off_hand() {
        let mut inv = Inventory::new();
        inv.set_equipped(EquipSlot::OffHand, Some(shield()));
        let slot = inv.equip(two_hander()).unwrap();
        assert_eq!(slot, EquipSlot::MainHand);
        assert!(inv.equipped(EquipSlot::OffHand).is_none());
        // the shield landed in the backpack
        assert_eq!(inv.backpack_slot(0).unwrap().item_id, 3000);
    }

    #[test]
    fn off_hand_displaces_two_hander() {
        let mut inv = Inventory::new();
        inv.equip(two_hander()).unwrap();
        let slot = inv.equip(shield()).unwrap();
        assert_eq!(slot, EquipSlot::OffHand);
        assert!(inv.equipped(EquipSlot::MainHand).is_none());
        assert_eq!(inv.backpack_slot(0).unwrap().item_id, 2000);
    }

    #[test]
    fn paired_slots_prefer_first_empty() {
        let mut inv = Inventory::new();
        let ring = |id| ItemInstance {
            quality: Quality::Uncommon,
            ..ItemInstance::simple(id, "Ring", InventoryType::Finger)
        };
        assert_eq!(inv.equip(ring(1)).unwrap(), EquipSlot::Finger1);
        assert_eq!(inv.equip(ring(2)).unwrap(), EquipSlot::Finger2);
        // both full: the replacement displaces an occupant to the backpack
        assert_eq!(inv.equip(ring(3)).unwrap(), EquipSlot::Finger2);
        assert_eq!(inv.backpack_slot(0).unwrap().item_id, 2);
    }

    #[test]
    fn slot_exclusivity_under_mixed_ops() {
        let mut inv = Inventory::new();
        inv.add_item(shield());
        let item = inv.clear_backpack_slot(0).unwrap();
        inv.equip(item).unwrap();
        inv.equip(two_hander()).unwrap();
        // the shield must exist in exactly one place
        let in_backpack = (0..BACKPACK_SLOTS)
            .filter(|&i| inv.backpack_slot(i).map(|x| x.item_id) == Some(3000))
            .count();
        let equipped = inv
            .equipped(EquipSlot::OffHand)
            .map(|x| x.item_id == 3000)
            .unwrap_or(false) as usize;
        assert_eq!(in_backpack + equipped, 1);
    }
}
