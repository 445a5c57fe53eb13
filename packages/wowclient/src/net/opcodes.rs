//! Opcode constants for the 3.3.5a world link, restricted to what this
//! client sends or handles.

// --- authentication ---
pub const SMSG_AUTH_CHALLENGE: u16 = 0x01EC;
pub const CMSG_AUTH_SESSION: u16 = 0x01ED;
pub const SMSG_AUTH_RESPONSE: u16 = 0x01EE;

// --- characters ---
pub const CMSG_CHAR_ENUM: u16 = 0x0037;
pub const SMSG_CHAR_ENUM: u16 = 0x003B;
pub const CMSG_PLAYER_LOGIN: u16 = 0x003D;

// --- world entry / exit ---
pub const SMSG_LOGIN_VERIFY_WORLD: u16 = 0x0236;
pub const CMSG_LOGOUT_REQUEST: u16 = 0x004B;
pub const SMSG_LOGOUT_RESPONSE: u16 = 0x004C;
pub const SMSG_LOGOUT_COMPLETE: u16 = 0x004D;

// --- keep-alive ---
pub const CMSG_PING: u16 = 0x01DC;
pub const SMSG_PONG: u16 = 0x01DD;
pub const CMSG_KEEP_ALIVE: u16 = 0x0407;

// --- time ---
pub const SMSG_TIME_SYNC_REQ: u16 = 0x0390;
pub const CMSG_TIME_SYNC_RESP: u16 = 0x0391;

// --- object mutation ---
pub const SMSG_UPDATE_OBJECT: u16 = 0x00A9;
pub const SMSG_DESTROY_OBJECT: u16 = 0x00AA;
pub const SMSG_COMPRESSED_UPDATE_OBJECT: u16 = 0x01F6;
pub const SMSG_MONSTER_MOVE: u16 = 0x00DD;

// --- movement (bidirectional MSG_* family) ---
pub const MSG_MOVE_START_FORWARD: u16 = 0x00B5;
pub const MSG_MOVE_STOP: u16 = 0x00B7;
pub const MSG_MOVE_SET_FACING: u16 = 0x00DA;
pub const MSG_MOVE_HEARTBEAT: u16 = 0x00EE;

// --- chat ---
pub const CMSG_MESSAGECHAT: u16 = 0x0095;
pub const SMSG_MESSAGECHAT: u16 = 0x0096;
pub const SMSG_NOTIFICATION: u16 = 0x01CB;
pub const SMSG_MOTD: u16 = 0x033D;

// --- name queries ---
pub const CMSG_NAME_QUERY: u16 = 0x0050;
pub const SMSG_NAME_QUERY: u16 = 0x0051;

// --- combat ---
pub const CMSG_SET_SELECTION: u16 = 0x013D;
pub const CMSG_ATTACKSWING: u16 = 0x0141;
pub const CMSG_ATTACKSTOP: u16 = 0x0142;
pub const SMSG_ATTACKSTART: u16 = 0x0143;
pub const SMSG_ATTACKSTOP: u16 = 0x0144;
pub const SMSG_ATTACKERSTATEUPDATE: u16 = 0x014A;

// --- spells and auras ---
pub const SMSG_INITIAL_SPELLS: u16 = 0x012A;
pub const CMSG_CAST_SPELL: u16 = 0x012E;
pub const SMSG_CAST_FAILED: u16 = 0x0130;
pub const SMSG_SPELL_START: u16 = 0x0131;
pub const SMSG_SPELL_GO: u16 = 0x0132;
pub const SMSG_AURA_UPDATE_ALL: u16 = 0x0495;
pub const SMSG_AURA_UPDATE: u16 = 0x0496;

// --- loot ---
pub const CMSG_AUTOSTORE_LOOT_ITEM: u16 = 0x0108;
pub const CMSG_LOOT: u16 = 0x015D;
pub const CMSG_LOOT_MONEY: u16 = 0x015E;
pub const CMSG_LOOT_RELEASE: u16 = 0x015F;
pub const SMSG_LOOT_RESPONSE: u16 = 0x0160;
pub const SMSG_LOOT_RELEASE_RESPONSE: u16 = 0x0161;
pub const SMSG_LOOT_REMOVED: u16 = 0x0162;
pub const SMSG_LOOT_MONEY_NOTIFY: u16 = 0x0163;
pub const SMSG_ITEM_PUSH_RESULT: u16 = 0x0166;

// --- gossip and quests ---
pub const CMSG_GOSSIP_HELLO: u16 = 0x017B;
pub const CMSG_GOSSIP_SELECT_OPTION: u16 = 0x017C;
pub const SMSG_GOSSIP_MESSAGE: u16 = 0x017D;
pub const SMSG_GOSSIP_COMPLETE: u16 = 0x017E;
pub const SMSG_QUESTGIVER_QUEST_DETAILS: u16 = 0x0188;
pub const CMSG_QUESTGIVER_ACCEPT_QUEST: u16 = 0x0189;
pub const SMSG_QUESTGIVER_OFFER_REWARD: u16 = 0x018D;
pub const CMSG_QUESTGIVER_CHOOSE_REWARD: u16 = 0x018E;
pub const SMSG_QUESTGIVER_QUEST_COMPLETE: u16 = 0x0191;
pub const CMSG_QUESTLOG_REMOVE_QUEST: u16 = 0x0194;
pub const SMSG_QUESTUPDATE_ADD_KILL: u16 = 0x0199;

// --- group ---
pub const SMSG_GROUP_INVITE: u16 = 0x006F;
pub const SMSG_GROUP_LIST: u16 = 0x007D;
pub const SMSG_PARTY_MEMBER_STATS: u16 = 0x007E;

// --- vendors ---
pub const CMSG_LIST_INVENTORY: u16 = 0x019E;
pub const SMSG_LIST_INVENTORY: u16 = 0x019F;
pub const CMSG_SELL_ITEM: u16 = 0x01A0;
pub const CMSG_BUY_ITEM: u16 = 0x01A2;

// --- progression ---
pub const SMSG_LOG_XPGAIN: u16 = 0x01D0;
pub const SMSG_LEVELUP_INFO: u16 = 0x01D4;

// --- login-time stubs the client acknowledges but does not model ---
pub const SMSG_TUTORIAL_FLAGS: u16 = 0x00FD;
pub const SMSG_ACTION_BUTTONS: u16 = 0x0129;
pub const SMSG_ACCOUNT_DATA_TIMES: u16 = 0x0209;

/// Diagnostic name for logging.
pub fn opcode_name(opcode: u16) -> &'static str {
    match opcode {
        SMSG_AUTH_CHALLENGE => "SMSG_AUTH_CHALLENGE",
        CMSG_AUTH_SESSION => "CMSG_AUTH_SESSION",
        SMSG_AUTH_RESPONSE => "SMSG_AUTH_RESPONSE",
        CMSG_CHAR_ENUM => "CMSG_CHAR_ENUM",
        SMSG_CHAR_ENUM => "SMSG_CHAR_ENUM",
        CMSG_PLAYER_LOGIN => "CMSG_PLAYER_LOGIN",
        SMSG_LOGIN_VERIFY_WORLD => "SMSG_LOGIN_VERIFY_WORLD",
        CMSG_LOGOUT_REQUEST => "CMSG_LOGOUT_REQUEST",
        SMSG_LOGOUT_RESPONSE => "SMSG_LOGOUT_RESPONSE",
        SMSG_LOGOUT_COMPLETE => "SMSG_LOGOUT_COMPLETE",
        CMSG_PING => "CMSG_PING",
        SMSG_PONG => "SMSG_PONG",
        CMSG_KEEP_ALIVE => "CMSG_KEEP_ALIVE",
        SMSG_TIME_SYNC_REQ => "SMSG_TIME_SYNC_REQ",
        CMSG_TIME_SYNC_RESP => "CMSG_TIME_SYNC_RESP",
        SMSG_UPDATE_OBJECT => "SMSG_UPDATE_OBJECT",
        SMSG_DESTROY_OBJECT => "SMSG_DESTROY_OBJECT",
        SMSG_COMPRESSED_UPDATE_OBJECT => "SMSG_COMPRESSED_UPDATE_OBJECT",
        SMSG_MONSTER_MOVE => "SMSG_MONSTER_MOVE",
        MSG_MOVE_START_FORWARD => "MSG_MOVE_START_FORWARD",
        MSG_MOVE_STOP => "MSG_MOVE_STOP",
        MSG_MOVE_SET_FACING => "MSG_MOVE_SET_FACING",
        MSG_MOVE_HEARTBEAT => "MSG_MOVE_HEARTBEAT",
        CMSG_MESSAGECHAT => "CMSG_MESSAGECHAT",
        SMSG_MESSAGECHAT => "SMSG_MESSAGECHAT",
        SMSG_NOTIFICATION => "SMSG_NOTIFICATION",
        SMSG_MOTD => "SMSG_MOTD",
        CMSG_NAME_QUERY => "CMSG_NAME_QUERY",
        SMSG_NAME_QUERY => "SMSG_NAME_QUERY",
        CMSG_SET_SELECTION => "CMSG_SET_SELECTION",
        CMSG_ATTACKSWING => "CMSG_ATTACKSWING",
        CMSG_ATTACKSTOP => "CMSG_ATTACKSTOP",
        SMSG_ATTACKSTART => "SMSG_ATTACKSTART",
        SMSG_ATTACKSTOP => "SMSG_ATTACKSTOP",
        SMSG_ATTACKERSTATEUPDATE => "SMSG_ATTACKERSTATEUPDATE",
        SMSG_INITIAL_SPELLS => "SMSG_INITIAL_SPELLS",
        CMSG_CAST_SPELL => "CMSG_CAST_SPELL",
        SMSG_CAST_FAILED => "SMSG_CAST_FAILED",
        SMSG_SPELL_START => "SMSG_SPELL_START",
        SMSG_SPELL_GO => "SMSG_SPELL_GO",
        SMSG_AURA_UPDATE_ALL => "SMSG_AURA_UPDATE_ALL",
        SMSG_AURA_UPDATE => "SMSG_AURA_UPDATE",
        CMSG_AUTOSTORE_LOOT_ITEM => "CMSG_AUTOSTORE_LOOT_ITEM",
        CMSG_LOOT => "CMSG_LOOT",
        CMSG_LOOT_MONEY => "CMSG_LOOT_MONEY",
        CMSG_LOOT_RELEASE => "CMSG_LOOT_RELEASE",
        SMSG_LOOT_RESPONSE => "SMSG_LOOT_RESPONSE",
        SMSG_LOOT_RELEASE_RESPONSE => "SMSG_LOOT_RELEASE_RESPONSE",
        SMSG_LOOT_REMOVED => "SMSG_LOOT_REMOVED",
        SMSG_LOOT_MONEY_NOTIFY => "SMSG_LOOT_MONEY_NOTIFY",
        SMSG_ITEM_PUSH_RESULT => "SMSG_ITEM_PUSH_RESULT",
        CMSG_GOSSIP_HELLO => "CMSG_GOSSIP_HELLO",
        CMSG_GOSSIP_SELECT_OPTION => "CMSG_GOSSIP_SELECT_OPTION",
        SMSG_GOSSIP_MESSAGE => "SMSG_GOSSIP_MESSAGE",
        SMSG_GOSSIP_COMPLETE => "SMSG_GOSSIP_COMPLETE",
        SMSG_QUESTGIVER_QUEST_DETAILS => "SMSG_QUESTGIVER_QUEST_DETAILS",
        CMSG_QUESTGIVER_ACCEPT_QUEST => "CMSG_QUESTGIVER_ACCEPT_QUEST",
        SMSG_QUESTGIVER_OFFER_REWARD => "SMSG_QUESTGIVER_OFFER_REWARD",
        CMSG_QUESTGIVER_CHOOSE_REWARD => "CMSG_QUESTGIVER_CHOOSE_REWARD",
        SMSG_QUESTGIVER_QUEST_COMPLETE => "SMSG_QUESTGIVER_QUEST_COMPLETE",
        CMSG_QUESTLOG_REMOVE_QUEST => "CMSG_QUESTLOG_REMOVE_QUEST",
        SMSG_QUESTUPDATE_ADD_KILL => "SMSG_QUESTUPDATE_ADD_KILL",
        SMSG_GROUP_INVITE => "SMSG_GROUP_INVITE",
        SMSG_GROUP_LIST => "SMSG_GROUP_LIST",
        SMSG_PARTY_MEMBER_STATS => "SMSG_PARTY_MEMBER_STATS",
        CMSG_LIST_INVENTORY => "CMSG_LIST_INVENTORY",
        SMSG_LIST_INVENTORY => "SMSG_LIST_INVENTORY",
        CMSG_SELL_ITEM => "CMSG_SELL_ITEM",
        CMSG_BUY_ITEM => "CMSG_BUY_ITEM",
        SMSG_LOG_XPGAIN => "SMSG_LOG_XPGAIN",
        SMSG_LEVELUP_INFO => "SMSG_LEVELUP_INFO",
        SMSG_TUTORIAL_FLAGS => "SMSG_TUTORIAL_FLAGS",
        SMSG_ACTION_BUTTONS => "SMSG_ACTION_BUTTONS",
        SMSG_ACCOUNT_DATA_TIMES => "SMSG_ACCOUNT_DATA_TIMES",
        _ => "UNKNOWN",
    }
}
