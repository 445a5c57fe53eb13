//! Chat history and server-text token substitution.

use crate::{
    character::Gender,
    entity::Guid,
};
use std::collections::VecDeque;


/// Bound on retained chat history.
pub const CHAT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum ChatType {
    System = 0,
    Say = 1,
    Party = 2,
    Raid = 3,
    Guild = 4,
    Officer = 5,
    Yell = 6,
    Whisper = 7,
    WhisperInform = 9,
    Emote = 10,
    TextEmote = 11,
    MonsterSay = 12,
    MonsterYell = 14,
    Channel = 17,
    Loot = 27,
    Unknown = 255,
}

impl ChatType {
    pub fn from_id(id: u8) -> Self {
        match id {
            0 => ChatType::System,
            1 => ChatType::Say,
            2 => ChatType::Party,
            3 => ChatType::Raid,
            4 => ChatType::Guild,
            5 => ChatType::Officer,
            6 => ChatType::Yell,
            7 => ChatType::Whisper,
            9 => ChatType::WhisperInform,
            10 => ChatType::Emote,
            11 => ChatType::TextEmote,
            12 => ChatType::MonsterSay,
            14 => ChatType::MonsterYell,
            17 => ChatType::Channel,
            27 => ChatType::Loot,
            _ => ChatType::Unknown,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum Language {
    Universal = 0,
    Orcish = 1,
    Darnassian = 2,
    Taurahe = 3,
    Dwarvish = 6,
    Common = 7,
    Demonic = 8,
    Titan = 9,
    Thalassian = 10,
    Draconic = 11,
    Gnomish = 13,
    Troll = 14,
    Gutterspeak = 33,
    Draenei = 35,
    Addon = 0xFFFFFFFF,
}

impl Language {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => Language::Orcish,
            2 => Language::Darnassian,
            3 => Language::Taurahe,
            6 => Language::Dwarvish,
            7 => Language::Common,
            8 => Language::Demonic,
            9 => Language::Titan,
            10 => Language::Thalassian,
            11 => Language::Draconic,
            13 => Language::Gnomish,
            14 => Language::Troll,
            33 => Language::Gutterspeak,
            35 => Language::Draenei,
            0xFFFFFFFF => Language::Addon,
            _ => Language::Universal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub chat_type: ChatType,
    pub language: Language,
    pub sender_guid: Guid,
    pub sender_name: String,
    pub target: String,
    pub text: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        ChatMessage {
            chat_type: ChatType::System,
            language: Language::Universal,
            sender_guid: 0,
            sender_name: String::new(),
            target: String::new(),
            text: text.into(),
        }
    }
}

/// Bounded FIFO of recent messages.
#[derive(Debug, Default)]
pub struct ChatHistory {
    messages: VecDeque<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        if self.messages.len() == CHAT_HISTORY_LIMIT {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Substitute server text tokens: `$n` the player name, `$b` a line break,
/// and `$g male:female;` picks one arm by gender. Text without `$` passes
/// through untouched.
pub fn substitute_tokens(text: &str, gender: Gender, player_name: &str) -> String {
    if !text.contains('$') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push_str(player_name),
            Some('b') | Some('B') => out.push('\n'),
            Some('g') | Some('G') => {
                let mut male = String::new();
                let mut female = String::new();
                let mut in_female = false;
                for t in chars.by_ref() {
                    match t {
                        ':' if !in_female => in_female = true,
                        ';' => break,
                        t if in_female => female.push(t),
                        t => male.push(t),
                    }
                }
                out.push_str(match gender {
                    Gender::Female => female.trim_start(),
                    Gender::Male | Gender::Other(_) => male.trim_start(),
                });
            }
            Some(other) => {
                out.push('$');
                out.push(other);
            }
            None => out.push('$'),
        }
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_identity() {
        let text = "Well met, traveler.";
        assert_eq!(substitute_tokens(text, Gender::Male, "Aldra"), text);
    }

    #[test]
    fn gender_token_picks_an_arm() {
        let text = "Welcome, $g sir:madam;!";
        assert_eq!(substitute_tokens(text, Gender::Male, ""), "Welcome, sir!");
        assert_eq!(substitute_tokens(text, Gender::Female, ""), "Welcome, madam!");
        // nonbinary clamps to the male arm
        assert_eq!(substitute_tokens(text, Gender::Other(2), ""), "Welcome, sir!");
    }

    #[test]
    fn name_and_break_tokens() {
        assert_eq!(
            substitute_tokens("$n,$bwelcome.", Gender::Male, "Aldra"),
            "Aldra,\nwelcome.",
        );
    }

    #[test]
    fn history_is_bounded() {
        let mut history = ChatHistory::new();
        for i in 0..150 {
            history.push(ChatMessage::system(format!("{}", i)));
        }
        assert_eq!(history.len(), CHAT_HISTORY_LIMIT);
        assert_eq!(history.iter().next().unwrap().text, "50");
    }
}
