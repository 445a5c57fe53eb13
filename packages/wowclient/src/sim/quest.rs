//! The simulator's local quest flow: a compiled-in quest table, gossip
//! menus for the questgiver, and accept/reward/abandon handled without a
//! server.

use crate::{
    entity::Guid,
    events::{GossipMenu, GossipQuest},
    quest_log::{ObjectiveCount, QuestLogEntry},
};


/// One quest the simulator can hand out.
pub struct SimQuest {
    pub quest_id: u32,
    pub title: &'static str,
    pub details: &'static str,
    pub objectives: &'static str,
    /// (creature entry, kills required), zero entry for none.
    pub kill: (u32, u32),
    /// (item id, count required), zero id for none.
    pub collect: (u32, u32),
    pub xp_reward: u32,
    pub money_reward: u32,
}

pub static SIM_QUESTS: &[SimQuest] = &[
    SimQuest {
        quest_id: 9000,
        title: "Thinning the Herd",
        details: "The boars around camp grow bolder by the day. Cull them \
                  before they ruin another harvest.",
        objectives: "Kill 4 Elder Boars.",
        kill: (90001, 4),
        collect: (0, 0),
        xp_reward: 170,
        money_reward: 25,
    },
    SimQuest {
        quest_id: 9001,
        title: "A Meal for the Road",
        details: "Travelers ask for jerky, and my stocks are bare. Bring me \
                  what you can scavenge.",
        objectives: "Collect 3 pieces of Tough Jerky.",
        kill: (0, 0),
        collect: (117, 3),
        xp_reward: 140,
        money_reward: 40,
    },
];

pub fn quest_by_id(quest_id: u32) -> Option<&'static SimQuest> {
    SIM_QUESTS.iter().find(|q| q.quest_id == quest_id)
}

/// Log entry for a freshly accepted quest, item counters pre-seeded from
/// what the player already carries.
pub fn log_entry(quest: &SimQuest, items_on_hand: u32) -> QuestLogEntry {
    let mut entry = QuestLogEntry {
        quest_id: quest.quest_id,
        title: quest.title.to_owned(),
        objectives_text: quest.objectives.to_owned(),
        complete: false,
        kills: Vec::new(),
        items: Vec::new(),
    };
    if quest.kill.0 != 0 {
        entry.kills.push(ObjectiveCount { id: quest.kill.0, have: 0, need: quest.kill.1 });
    }
    if quest.collect.0 != 0 {
        entry.items.push(ObjectiveCount {
            id: quest.collect.0,
            have: items_on_hand.min(quest.collect.1),
            need: quest.collect.1,
        });
        entry.complete = items_on_hand >= quest.collect.1 && quest.kill.0 == 0;
    }
    entry
}

/// The questgiver's gossip menu: every sim quest not yet turned in, in
/// the same shape a server gossip packet produces.
pub fn questgiver_menu(npc: Guid, taken: impl Fn(u32) -> bool) -> GossipMenu {
    GossipMenu {
        npc,
        text_id: 1,
        options: Vec::new(),
        quests: SIM_QUESTS
            .iter()
            .filter(|q| !taken(q.quest_id))
            .map(|q| GossipQuest {
                quest_id: q.quest_id,
                icon: 2,
                level: 1,
                title: q.title.to_owned(),
            })
            .collect(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_quest_preseeds_from_inventory() {
        let quest = quest_by_id(9001).unwrap();
        let entry = log_entry(quest, 2);
        assert_eq!(entry.items[0].have, 2);
        assert!(!entry.complete);
        let entry = log_entry(quest, 5);
        assert_eq!(entry.items[0].have, 3);
        assert!(entry.complete);
    }

    #[test]
    fn menu_omits_taken_quests() {
        let menu = questgiver_menu(50, |id| id == 9000);
        assert_eq!(menu.quests.len(), SIM_QUESTS.len() - 1);
        assert!(menu.quests.iter().all(|q| q.quest_id != 9000));
    }
}
