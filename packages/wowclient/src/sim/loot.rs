//! Local loot synthesis: when there is no server, kills roll against a
//! small level-scaled candidate table.

use crate::{
    entity::Guid,
    events::{LootItem, LootWindow},
    item::{InventoryType, ItemInstance, ItemStats, Quality},
};
use rand::Rng;
use rand_pcg::Pcg64Mcg;


/// One candidate drop.
struct Candidate {
    item_id: u32,
    name: &'static str,
    display_id: u32,
    quality: Quality,
    inventory_type: InventoryType,
    /// Drop chance in percent.
    chance: u32,
    max_count: u32,
    /// Victims below this level never drop it.
    min_level: u32,
    max_stack: u32,
    sell_price: u32,
}

static CANDIDATES: &[Candidate] = &[
    Candidate {
        item_id: 117, name: "Tough Jerky", display_id: 2473,
        quality: Quality::Common, inventory_type: InventoryType::NonEquip,
        chance: 40, max_count: 3, min_level: 1, max_stack: 20, sell_price: 1,
    },
    Candidate {
        item_id: 2589, name: "Linen Cloth", display_id: 7026,
        quality: Quality::Common, inventory_type: InventoryType::NonEquip,
        chance: 55, max_count: 2, min_level: 1, max_stack: 20, sell_price: 3,
    },
    Candidate {
        item_id: 805, name: "Small Red Pouch", display_id: 7295,
        quality: Quality::Common, inventory_type: InventoryType::Bag,
        chance: 5, max_count: 1, min_level: 2, max_stack: 1, sell_price: 25,
    },
    Candidate {
        item_id: 1395, name: "Apprentice's Pants", display_id: 9892,
        quality: Quality::Poor, inventory_type: InventoryType::Legs,
        chance: 12, max_count: 1, min_level: 1, max_stack: 1, sell_price: 5,
    },
    Candidate {
        item_id: 2361, name: "Battleworn Hammer", display_id: 8690,
        quality: Quality::Poor, inventory_type: InventoryType::TwoHandWeapon,
        chance: 8, max_count: 1, min_level: 2, max_stack: 1, sell_price: 15,
    },
    Candidate {
        item_id: 4536, name: "Shiny Red Apple", display_id: 6410,
        quality: Quality::Common, inventory_type: InventoryType::NonEquip,
        chance: 25, max_count: 2, min_level: 1, max_stack: 20, sell_price: 1,
    },
];

/// Roll a loot window for a victim. The window carries the same shape the
/// server's loot response would.
pub fn generate_local_loot(source: Guid, victim_level: u32, rng: &mut Pcg64Mcg) -> LootWindow {
    let money = victim_level * rng.gen_range(1..=5);
    let mut items = Vec::new();
    for candidate in CANDIDATES {
        if victim_level < candidate.min_level {
            continue;
        }
        if rng.gen_range(0..100) >= candidate.chance {
            continue;
        }
        let count = rng.gen_range(1..=candidate.max_count);
        items.push(LootItem {
            slot: items.len() as u8,
            item_id: candidate.item_id,
            display_id: candidate.display_id,
            count,
            quality: candidate.quality,
        });
    }
    LootWindow { source, money, items }
}

/// Materialize a rolled loot slot as a real item instance.
pub fn item_for_loot(loot: &LootItem) -> ItemInstance {
    let candidate = CANDIDATES.iter().find(|c| c.item_id == loot.item_id);
    match candidate {
        Some(c) => ItemInstance {
            item_id: c.item_id,
            display_id: c.display_id,
            name: c.name.to_owned(),
            inventory_type: c.inventory_type,
            quality: c.quality,
            stack_count: loot.count.min(c.max_stack),
            max_stack: c.max_stack,
            stats: ItemStats::default(),
            sell_price: c.sell_price,
        },
        None => ItemInstance::stackable(loot.item_id, "", loot.count, 20),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn loot_respects_level_floor() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        for _ in 0..200 {
            let window = generate_local_loot(10, 1, &mut rng);
            assert!(window.items.iter().all(|i| i.item_id != 2361 && i.item_id != 805));
        }
    }

    #[test]
    fn loot_slots_are_sequential() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let window = generate_local_loot(10, 5, &mut rng);
        for (i, item) in window.items.iter().enumerate() {
            assert_eq!(item.slot as usize, i);
        }
    }

    #[test]
    fn materialized_items_keep_the_stack_bound() {
        let loot = LootItem {
            slot: 0,
            item_id: 2589,
            display_id: 7026,
            count: 99,
            quality: Quality::Common,
        };
        let item = item_for_loot(&loot);
        assert!(item.stack_count <= item.max_stack);
        assert_eq!(item.name, "Linen Cloth");
    }
}
