//! The quest log. Detail/offer/reward panels are transient UI state and
//! are not stored here.

use serde::{Serialize, Deserialize};


pub const MAX_QUEST_LOG_ENTRIES: usize = 25;

/// Progress on one objective counter.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveCount {
    pub id: u32,
    pub have: u32,
    pub need: u32,
}

impl ObjectiveCount {
    pub fn done(&self) -> bool {
        self.have >= self.need
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestLogEntry {
    pub quest_id: u32,
    pub title: String,
    pub objectives_text: String,
    pub complete: bool,
    /// Per-creature kill counters.
    pub kills: Vec<ObjectiveCount>,
    /// Per-item collection counters.
    pub items: Vec<ObjectiveCount>,
}

impl QuestLogEntry {
    fn all_done(&self) -> bool {
        self.kills.iter().all(ObjectiveCount::done)
            && self.items.iter().all(ObjectiveCount::done)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestLog {
    pub entries: Vec<QuestLogEntry>,
}

impl QuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, quest_id: u32) -> Option<&QuestLogEntry> {
        self.entries.iter().find(|e| e.quest_id == quest_id)
    }

    /// Accept into the log. Refused when full or already present.
    pub fn accept(&mut self, entry: QuestLogEntry) -> bool {
        if self.entries.len() >= MAX_QUEST_LOG_ENTRIES || self.get(entry.quest_id).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn remove(&mut self, quest_id: u32) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.quest_id != quest_id);
        self.entries.len() != before
    }

    /// Credit a creature kill against every quest tracking it. Returns the
    /// quests that just became complete.
    pub fn credit_kill(&mut self, creature_id: u32) -> Vec<u32> {
        self.credit(creature_id, |e| &mut e.kills)
    }

    /// Re-evaluate an item counter after inventory changed.
    pub fn credit_item(&mut self, item_id: u32, have_now: u32) -> Vec<u32> {
        let mut completed = Vec::new();
        for entry in &mut self.entries {
            let Some(counter) = entry.items.iter_mut().find(|c| c.id == item_id) else {
                continue;
            };
            counter.have = have_now.min(counter.need);
            if !entry.complete && entry.all_done() {
                entry.complete = true;
                completed.push(entry.quest_id);
            }
        }
        completed
    }

    fn credit(
        &mut self,
        id: u32,
        counters: impl Fn(&mut QuestLogEntry) -> &mut Vec<ObjectiveCount>,
    ) -> Vec<u32> {
        let mut completed = Vec::new();
        for entry in &mut self.entries {
            let Some(counter) = counters(entry).iter_mut().find(|c| c.id == id) else {
                continue;
            };
            if counter.have < counter.need {
                counter.have += 1;
            }
            if !entry.complete && entry.all_done() {
                entry.complete = true;
                completed.push(entry.quest_id);
            }
        }
        completed
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn kill_quest(quest_id: u32, creature: u32, need: u32) -> QuestLogEntry {
        QuestLogEntry {
            quest_id,
            title: "Cull the pack".to_owned(),
            objectives_text: String::new(),
            complete: false,
            kills: vec![ObjectiveCount { id: creature, have: 0, need }],
            items: Vec::new(),
        }
    }

    #[test]
    fn kills_complete_a_quest() {
        let mut log = QuestLog::new();
        assert!(log.accept(kill_quest(100, 17, 2)));
        assert!(log.credit_kill(17).is_empty());
        assert_eq!(log.credit_kill(17), vec![100]);
        assert!(log.get(100).unwrap().complete);
        // further kills do not overshoot the counter
        log.credit_kill(17);
        assert_eq!(log.get(100).unwrap().kills[0].have, 2);
    }

    #[test]
    fn duplicate_accept_refused() {
        let mut log = QuestLog::new();
        assert!(log.accept(kill_quest(100, 17, 2)));
        assert!(!log.accept(kill_quest(100, 17, 2)));
    }
}
