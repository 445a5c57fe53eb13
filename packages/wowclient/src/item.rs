//! Item instances as they live in inventory slots and loot windows.

use serde::{Serialize, Deserialize};


#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Quality {
    Poor = 0,
    Common = 1,
    Uncommon = 2,
    Rare = 3,
    Epic = 4,
    Legendary = 5,
}

impl Quality {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Quality::Poor,
            1 => Quality::Common,
            2 => Quality::Uncommon,
            3 => Quality::Rare,
            4 => Quality::Epic,
            5 => Quality::Legendary,
            _ => return None,
        })
    }
}

/// The item template's inventory-type byte, which drives where a piece can
/// be equipped and which geoset groups it toggles.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InventoryType {
    NonEquip = 0,
    Head = 1,
    Neck = 2,
    Shoulders = 3,
    Shirt = 4,
    Chest = 5,
    Waist = 6,
    Legs = 7,
    Feet = 8,
    Wrists = 9,
    Hands = 10,
    Finger = 11,
    Trinket = 12,
    Weapon = 13,
    Shield = 14,
    Ranged = 15,
    Cloak = 16,
    TwoHandWeapon = 17,
    Bag = 18,
    Tabard = 19,
    Robe = 20,
    WeaponMainHand = 21,
    WeaponOffHand = 22,
    Holdable = 23,
    Ammo = 24,
    Thrown = 25,
    RangedRight = 26,
    Quiver = 27,
    Relic = 28,
}

impl InventoryType {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => InventoryType::NonEquip,
            1 => InventoryType::Head,
            2 => InventoryType::Neck,
            3 => InventoryType::Shoulders,
            4 => InventoryType::Shirt,
            5 => InventoryType::Chest,
            6 => InventoryType::Waist,
            7 => InventoryType::Legs,
            8 => InventoryType::Feet,
            9 => InventoryType::Wrists,
            10 => InventoryType::Hands,
            11 => InventoryType::Finger,
            12 => InventoryType::Trinket,
            13 => InventoryType::Weapon,
            14 => InventoryType::Shield,
            15 => InventoryType::Ranged,
            16 => InventoryType::Cloak,
            17 => InventoryType::TwoHandWeapon,
            18 => InventoryType::Bag,
            19 => InventoryType::Tabard,
            20 => InventoryType::Robe,
            21 => InventoryType::WeaponMainHand,
            22 => InventoryType::WeaponOffHand,
            23 => InventoryType::Holdable,
            24 => InventoryType::Ammo,
            25 => InventoryType::Thrown,
            26 => InventoryType::RangedRight,
            27 => InventoryType::Quiver,
            28 => InventoryType::Relic,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Flat stat block. Zeroes mean the template grants nothing there.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    pub stamina: i32,
    pub strength: i32,
    pub agility: i32,
    pub intellect: i32,
    pub spirit: i32,
    pub armor: i32,
    pub min_damage: f32,
    pub max_damage: f32,
}

/// A concrete stack of items occupying one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    pub item_id: u32,
    pub display_id: u32,
    pub name: String,
    pub inventory_type: InventoryType,
    pub quality: Quality,
    pub stack_count: u32,
    pub max_stack: u32,
    pub stats: ItemStats,
    pub sell_price: u32,
}

impl ItemInstance {
    /// A one-of item with no stats, enough for tests and loot synthesis.
    pub fn simple(item_id: u32, name: &str, inventory_type: InventoryType) -> Self {
        ItemInstance {
            item_id,
            display_id: item_id,
            name: name.to_owned(),
            inventory_type,
            quality: Quality::Common,
            stack_count: 1,
            max_stack: 1,
            stats: ItemStats::default(),
            sell_price: 0,
        }
    }

    pub fn stackable(item_id: u32, name: &str, count: u32, max_stack: u32) -> Self {
        ItemInstance {
            stack_count: count.min(max_stack),
            max_stack,
            ..Self::simple(item_id, name, InventoryType::NonEquip)
        }
    }
}
