//! Inbound opcode routing. One handler per opcode family; every handler
//! mutates the game state and surfaces events, and a malformed payload
//! aborts only that packet.

use crate::{
    character::*,
    chat::{ChatMessage, ChatType, Language},
    entity::{Entity, Guid},
    events::*,
    game_state::GameState,
    item::{ItemInstance, Quality},
    net::{
        opcodes::*,
        wire::{Reader, Writer},
    },
    session::{SessionState, WorldSession},
    sim::xp::xp_for_level,
    spell::cast_failure_message,
    update::{self, fields, UpdateBlock},
};
use anyhow::Result;
use vek::*;


/// Route one frame. Decode failures are logged and the packet dropped;
/// they never unwind into the session.
pub(super) fn handle_frame(
    session: &mut WorldSession,
    state: &mut GameState,
    events: &mut GameEvents,
    opcode: u16,
    payload: &[u8],
) {
    let mut r = Reader::new(payload);
    let result = match opcode {
        SMSG_AUTH_CHALLENGE => on_auth_challenge(session, events, &mut r),
        SMSG_AUTH_RESPONSE => on_auth_response(session, events, &mut r),
        SMSG_CHAR_ENUM => on_char_enum(session, events, &mut r),
        SMSG_LOGIN_VERIFY_WORLD => on_login_verify(session, state, events, &mut r),
        SMSG_PONG => on_pong(session, events, &mut r),
        SMSG_TIME_SYNC_REQ => on_time_sync(session, &mut r),
        SMSG_UPDATE_OBJECT => on_update_object(session, state, events, payload, false),
        SMSG_COMPRESSED_UPDATE_OBJECT => on_update_object(session, state, events, payload, true),
        SMSG_DESTROY_OBJECT => on_destroy_object(state, events, &mut r),
        SMSG_MONSTER_MOVE => on_monster_move(state, &mut r),
        MSG_MOVE_START_FORWARD | MSG_MOVE_STOP | MSG_MOVE_SET_FACING
        | MSG_MOVE_HEARTBEAT => on_peer_movement(state, &mut r),
        SMSG_MESSAGECHAT => on_chat(session, state, &mut r),
        SMSG_MOTD => on_motd(state, &mut r),
        SMSG_NOTIFICATION => on_notification(state, &mut r),
        SMSG_NAME_QUERY => on_name_query(state, &mut r),
        SMSG_ATTACKSTART => on_attack_start(events, &mut r),
        SMSG_ATTACKSTOP => on_attack_stop(events, &mut r),
        SMSG_ATTACKERSTATEUPDATE => on_attacker_state(state, events, &mut r),
        SMSG_INITIAL_SPELLS => on_initial_spells(state, &mut r),
        SMSG_ACTION_BUTTONS => on_action_buttons(state, &mut r),
        SMSG_CAST_FAILED => on_cast_failed(state, events, &mut r),
        SMSG_SPELL_GO => on_spell_go(state, &mut r),
        SMSG_SPELL_START => Ok(()),
        SMSG_AURA_UPDATE | SMSG_AURA_UPDATE_ALL => on_aura_update(session, state, &mut r),
        SMSG_LOOT_RESPONSE => on_loot_response(events, &mut r),
        SMSG_LOOT_REMOVED => on_loot_removed(events, &mut r),
        SMSG_LOOT_MONEY_NOTIFY => on_loot_money(state, &mut r),
        SMSG_LOOT_RELEASE_RESPONSE => on_loot_release(events, &mut r),
        SMSG_ITEM_PUSH_RESULT => on_item_push(state, &mut r),
        SMSG_GOSSIP_MESSAGE => on_gossip_message(events, &mut r),
        SMSG_GOSSIP_COMPLETE => {
            events.push(GameEvent::GossipClosed);
            Ok(())
        }
        SMSG_QUESTGIVER_QUEST_DETAILS => on_quest_details(events, &mut r),
        SMSG_QUESTGIVER_OFFER_REWARD => on_quest_offer_reward(events, &mut r),
        SMSG_QUESTGIVER_QUEST_COMPLETE => on_quest_complete(state, events, &mut r),
        SMSG_QUESTUPDATE_ADD_KILL => on_quest_add_kill(state, &mut r),
        SMSG_GROUP_INVITE => on_group_invite(state, &mut r),
        SMSG_GROUP_LIST => on_group_list(state, events, &mut r),
        SMSG_PARTY_MEMBER_STATS => on_party_member_stats(state, &mut r),
        SMSG_LIST_INVENTORY => on_vendor_list(events, &mut r),
        SMSG_LOG_XPGAIN => on_xp_gain(state, events, &mut r),
        SMSG_LEVELUP_INFO => on_levelup(state, events, &mut r),
        SMSG_LOGOUT_RESPONSE => Ok(()),
        SMSG_LOGOUT_COMPLETE => on_logout_complete(session, state, events),
        SMSG_TUTORIAL_FLAGS | SMSG_ACCOUNT_DATA_TIMES => Ok(()),
        other => {
            warn!(
                opcode = format_args!("{:#06x}", other),
                state = ?session.state(),
                "unhandled opcode, dropping",
            );
            Ok(())
        }
    };
    if let Err(e) = result {
        warn!(
            %e,
            opcode = opcode_name(opcode),
            "malformed payload, packet dropped",
        );
    }
}

/// Protocol gate: handlers for stateful opcodes call this first. A wrong
/// state logs and drops without failing the session.
fn gate(session: &WorldSession, wanted: &[SessionState], opcode: &str) -> bool {
    let ok = wanted.contains(&session.state());
    if !ok {
        warn!(
            opcode,
            state = ?session.state(),
            "opcode outside expected state, dropping",
        );
    }
    ok
}

// --- handshake ---

fn on_auth_challenge(
    session: &mut WorldSession,
    events: &mut GameEvents,
    r: &mut Reader,
) -> Result<()> {
    if !gate(session, &[SessionState::Connected], "SMSG_AUTH_CHALLENGE") {
        return Ok(());
    }
    r.u32()?;
    let mut server_seed = [0u8; 4];
    server_seed.copy_from_slice(r.bytes(4)?);
    session.set_state(SessionState::ChallengeReceived, events);

    let packet = session.build_auth_session(server_seed);
    session.send(CMSG_AUTH_SESSION, packet);
    if let Some(conn) = session.conn.as_mut() {
        let key = session.session_key.clone();
        conn.install_cipher(&key);
    }
    session.set_state(SessionState::AuthSent, events);
    Ok(())
}

fn on_auth_response(
    session: &mut WorldSession,
    events: &mut GameEvents,
    r: &mut Reader,
) -> Result<()> {
    if !gate(session, &[SessionState::AuthSent], "SMSG_AUTH_RESPONSE") {
        return Ok(());
    }
    let code = r.u8()?;
    match code {
        0x0C => {
            session.set_state(SessionState::Authenticated, events);
            session.set_state(SessionState::Ready, events);
        }
        other => {
            let reason = auth_reject_reason(other);
            session.fail(format!("auth: {}", reason), events);
        }
    }
    Ok(())
}

fn auth_reject_reason(code: u8) -> &'static str {
    match code {
        0x0D => "authentication failed",
        0x0E => "authentication rejected",
        0x15 => "account in use",
        0x1B => "account banned",
        0x1F => "account suspended",
        0x20 => "too many requests",
        0x1C => "this character is still logged in",
        _ => "authentication error",
    }
}

// --- characters ---

fn on_char_enum(
    session: &mut WorldSession,
    events: &mut GameEvents,
    r: &mut Reader,
) -> Result<()> {
    if !gate(
        session,
        &[SessionState::Ready, SessionState::CharListRequested],
        "SMSG_CHAR_ENUM",
    ) {
        return Ok(());
    }
    let count = r.u8()?;
    let mut list = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let guid = r.u64()?;
        let name = r.cstring()?;
        let race_id = r.u8()?;
        let class_id = r.u8()?;
        let gender = Gender::from_byte(r.u8()?);
        let appearance = AppearanceBytes {
            skin: r.u8()?,
            face: r.u8()?,
            hair_style: r.u8()?,
            hair_color: r.u8()?,
            facial_hair: r.u8()?,
        };
        let level = r.u8()?;
        let zone = r.u32()?;
        let map = r.u32()?;
        let pos = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
        let guild_id = r.u32()?;
        let flags = r.u32()?;
        r.u32()?; // customization flags
        r.u8()?; // first login
        let pet_display_id = r.u32()?;
        let pet_level = r.u32()?;
        let pet_family = r.u32()?;
        let mut equipment = [CharEnumEquip::default(); 23];
        for slot in equipment.iter_mut() {
            slot.display_id = r.u32()?;
            slot.inventory_type = r.u8()?;
            slot.enchant_aura = r.u32()?;
        }
        let (Some(race), Some(class)) = (Race::from_id(race_id), Class::from_id(class_id)) else {
            warn!(race_id, class_id, "char enum entry with unknown race/class, skipping");
            continue;
        };
        list.push(CharacterSummary {
            guid,
            name,
            race,
            class,
            gender,
            appearance,
            level,
            zone,
            map,
            pos: coords::server_to_canonical(pos),
            guild_id,
            flags,
            pet_display_id,
            pet_level,
            pet_family,
            equipment,
        });
    }
    session.set_state(SessionState::CharListReceived, events);
    events.push(GameEvent::CharList(list));
    Ok(())
}

fn on_login_verify(
    session: &mut WorldSession,
    state: &mut GameState,
    events: &mut GameEvents,
    r: &mut Reader,
) -> Result<()> {
    if !gate(session, &[SessionState::EnteringWorld], "SMSG_LOGIN_VERIFY_WORLD") {
        return Ok(());
    }
    let map = r.u32()?;
    let pos = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
    let yaw = r.f32()?;
    let pos = coords::server_to_canonical(pos);
    let yaw = coords::server_to_canonical_yaw(yaw);
    state.player_guid = session.pending_login();
    state.map = map;
    session.set_state(SessionState::InWorld, events);
    events.push(GameEvent::WorldEntered { map, pos, yaw });
    Ok(())
}

// --- liveness ---

fn on_pong(session: &mut WorldSession, events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let seq = r.u32()?;
    if let Some((sent_seq, sent_at)) = session.ping_sent_at.take() {
        if sent_seq == seq {
            session.latency_ms = ((session.now() - sent_at) * 1000.0) as u32;
            events.push(GameEvent::Latency { ms: session.latency_ms });
        } else {
            trace!(seq, sent_seq, "pong for a stale ping");
        }
    }
    Ok(())
}

fn on_time_sync(session: &mut WorldSession, r: &mut Reader) -> Result<()> {
    let counter = r.u32()?;
    let mut w = Writer::new();
    w.u32(counter).u32((session.now() * 1000.0) as u32);
    session.send(CMSG_TIME_SYNC_RESP, w);
    Ok(())
}

// --- object mutation ---

fn on_update_object(
    session: &mut WorldSession,
    state: &mut GameState,
    events: &mut GameEvents,
    payload: &[u8],
    compressed: bool,
) -> Result<()> {
    if !gate(session, &[SessionState::InWorld], "SMSG_UPDATE_OBJECT") {
        return Ok(());
    }
    let blocks = if compressed {
        update::decode_compressed_update(payload)?
    } else {
        update::decode_update(payload)?
    };
    apply_update_blocks(state, events, blocks);
    Ok(())
}

/// Blocks apply strictly in order: a create lands before a same-guid
/// update from the same packet.
pub(crate) fn apply_update_blocks(
    state: &mut GameState,
    events: &mut GameEvents,
    blocks: Vec<UpdateBlock>,
) {
    for block in blocks {
        match block {
            UpdateBlock::Create { guid, kind, movement, values } => {
                let entity = state.entities.create(guid, kind);
                entity.pos = coords::server_to_canonical(movement.pos);
                entity.yaw = coords::server_to_canonical_yaw(movement.yaw);
                if let Some(unit) = entity.unit_mut() {
                    unit.target = movement.target;
                }
                let dirty = apply_entity_fields(state.entities.get_mut(guid).unwrap(), &values);
                if movement.is_self {
                    state.player_guid = guid;
                }
                apply_player_scoped_fields(state, guid, &values);
                events.push(GameEvent::EntityCreated(guid));
                if dirty {
                    state.mark_equipment_dirty(guid);
                    events.push(GameEvent::EquipmentChanged(guid));
                }
            }
            UpdateBlock::Values { guid, values } => {
                let Some(entity) = state.entities.get_mut(guid) else {
                    // an update for a guid never created in-session
                    warn!(guid, "update-values for unknown guid, discarding");
                    continue;
                };
                let was_alive = entity.is_alive();
                let dirty = apply_entity_fields(entity, &values);
                let now_alive = entity.is_alive();
                apply_player_scoped_fields(state, guid, &values);
                if was_alive && !now_alive {
                    events.push(GameEvent::UnitDied(guid));
                } else if !was_alive && now_alive {
                    events.push(GameEvent::UnitRespawned(guid));
                }
                if dirty {
                    state.mark_equipment_dirty(guid);
                    events.push(GameEvent::EquipmentChanged(guid));
                }
            }
            UpdateBlock::Movement { guid, movement } => {
                match state.entities.get_mut(guid) {
                    Some(entity) => {
                        entity.pos = coords::server_to_canonical(movement.pos);
                        entity.yaw = coords::server_to_canonical_yaw(movement.yaw);
                    }
                    None => warn!(guid, "movement for unknown guid, discarding"),
                }
            }
            UpdateBlock::OutOfRange { guids } => {
                for guid in guids {
                    if state.entities.destroy(guid) {
                        events.push(GameEvent::EntityDestroyed(guid));
                    }
                }
            }
        }
    }
}

/// Fold a sparse field array into the entity. Returns whether any visible
/// equipment field changed.
fn apply_entity_fields(entity: &mut Entity, values: &update::FieldMap) -> bool {
    let mut equipment_dirty = false;
    for (&field, &value) in values {
        entity.raw_fields.insert(field, value);
        match field {
            fields::OBJECT_FIELD_ENTRY => entity.entry = value,
            fields::UNIT_FIELD_HEALTH => {
                if let Some(unit) = entity.unit_mut() {
                    unit.health = value;
                }
            }
            fields::UNIT_FIELD_MAXHEALTH => {
                if let Some(unit) = entity.unit_mut() {
                    unit.max_health = value;
                }
            }
            fields::UNIT_FIELD_LEVEL => {
                if let Some(unit) = entity.unit_mut() {
                    unit.level = value;
                }
            }
            fields::UNIT_FIELD_FACTIONTEMPLATE => {
                if let Some(unit) = entity.unit_mut() {
                    unit.faction_template = value;
                }
            }
            fields::UNIT_FIELD_FLAGS => {
                if let Some(unit) = entity.unit_mut() {
                    unit.flags = value;
                }
            }
            fields::UNIT_FIELD_DISPLAYID => {
                if let Some(unit) = entity.unit_mut() {
                    unit.display_id = value;
                }
            }
            fields::UNIT_FIELD_NATIVEDISPLAYID => {
                if let Some(unit) = entity.unit_mut() {
                    unit.native_display_id = value;
                }
            }
            fields::UNIT_FIELD_MOUNTDISPLAYID => {
                if let Some(unit) = entity.unit_mut() {
                    unit.mount_display_id = value;
                }
            }
            fields::UNIT_FIELD_BOUNDINGRADIUS => {
                if let Some(unit) = entity.unit_mut() {
                    unit.bounding_radius = f32::from_bits(value);
                }
            }
            fields::UNIT_FIELD_TARGET => {
                if let Some(unit) = entity.unit_mut() {
                    unit.target = (unit.target & !0xFFFF_FFFF) | value as u64;
                }
            }
            fields::UNIT_FIELD_BYTES_0 => {
                let [race, class, gender, _power] = value.to_le_bytes();
                if let Some(player) = entity.player_mut() {
                    player.race = Race::from_id(race);
                    player.class = Class::from_id(class);
                    player.gender = Gender::from_byte(gender);
                }
            }
            fields::PLAYER_GUILDID => {
                if let Some(player) = entity.player_mut() {
                    player.guild_id = value;
                }
            }
            fields::PLAYER_BYTES => {
                if let Some(player) = entity.player_mut() {
                    let [skin, face, hair_style, hair_color] = value.to_le_bytes();
                    player.appearance.skin = skin;
                    player.appearance.face = face;
                    player.appearance.hair_style = hair_style;
                    player.appearance.hair_color = hair_color;
                }
            }
            fields::PLAYER_BYTES_2 => {
                if let Some(player) = entity.player_mut() {
                    player.appearance.facial_hair = value.to_le_bytes()[0];
                }
            }
            _ => {
                if let Some(pwr) = fields::power_index(field) {
                    if let Some(unit) = entity.unit_mut() {
                        unit.power[pwr] = value;
                    }
                } else if let Some(pwr) = fields::max_power_index(field) {
                    if let Some(unit) = entity.unit_mut() {
                        unit.max_power[pwr] = value;
                    }
                } else if let Some(slot) = fields::visible_item_slot(field) {
                    if let Some(player) = entity.player_mut() {
                        player.equipment_display[slot as usize] = value;
                        equipment_dirty = true;
                    }
                }
                // anything else stays raw for later re-interpretation
            }
        }
    }
    equipment_dirty
}

/// XP, next-level XP, and coinage only mean something for the active
/// player.
fn apply_player_scoped_fields(state: &mut GameState, guid: Guid, values: &update::FieldMap) {
    if guid != state.player_guid {
        return;
    }
    if let Some(&xp) = values.get(&fields::PLAYER_XP) {
        state.progress.xp = xp;
    }
    if let Some(&next) = values.get(&fields::PLAYER_NEXT_LEVEL_XP) {
        state.progress.next_level_xp = next;
    }
    if let Some(&money) = values.get(&fields::PLAYER_FIELD_COINAGE) {
        state.money = money;
    }
    if let Some(&level) = values.get(&(fields::UNIT_FIELD_LEVEL)) {
        state.progress.level = level;
    }
}

fn on_destroy_object(state: &mut GameState, events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let guid = r.u64()?;
    r.u8()?; // on-death flag
    if state.entities.destroy(guid) {
        events.push(GameEvent::EntityDestroyed(guid));
    }
    Ok(())
}

fn on_monster_move(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let guid = r.packed_guid()?;
    r.u8()?;
    let current = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
    r.u32()?; // spline id
    let move_type = r.u8()?;
    let dest = match move_type {
        // stop
        1 => current,
        _ => {
            r.u32()?; // spline flags
            r.u32()?; // duration
            let point_count = r.u32()?;
            if point_count == 0 || r.remaining() < 12 {
                current
            } else {
                Vec3::new(r.f32()?, r.f32()?, r.f32()?)
            }
        }
    };
    match state.entities.get_mut(guid) {
        Some(entity) => entity.pos = coords::server_to_canonical(dest),
        None => trace!(guid, "monster move for unknown guid"),
    }
    Ok(())
}

fn on_peer_movement(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let guid = r.packed_guid()?;
    r.u32()?; // movement flags
    r.u16()?;
    r.u32()?; // time
    let pos = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
    let yaw = r.f32()?;
    match state.entities.get_mut(guid) {
        Some(entity) => {
            entity.pos = coords::server_to_canonical(pos);
            entity.yaw = coords::server_to_canonical_yaw(yaw);
        }
        None => trace!(guid, "movement for unknown guid"),
    }
    Ok(())
}

// --- chat ---

fn on_chat(session: &mut WorldSession, state: &mut GameState, r: &mut Reader) -> Result<()> {
    let chat_type = ChatType::from_id(r.u8()?);
    let language = Language::from_id(r.u32()?);
    let sender_guid = r.u64()?;
    r.u32()?; // flags
    let target = if chat_type == ChatType::Channel {
        r.cstring()?
    } else {
        String::new()
    };
    r.u64()?; // target guid
    let text = r.lstring()?;
    r.u8()?; // chat tag

    let sender_name = match state.name_of(sender_guid) {
        Some(name) => name.to_owned(),
        None => {
            if sender_guid != 0 {
                session.name_query(sender_guid);
            }
            String::new()
        }
    };
    state.chat.push(ChatMessage {
        chat_type,
        language,
        sender_guid,
        sender_name,
        target,
        text,
    });
    Ok(())
}

fn on_motd(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let lines = r.u32()?;
    for _ in 0..lines {
        let line = r.cstring()?;
        state.chat.push(ChatMessage::system(line));
    }
    Ok(())
}

fn on_notification(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let text = r.cstring()?;
    state.chat.push(ChatMessage::system(text));
    Ok(())
}

fn on_name_query(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let guid = r.packed_guid()?;
    let known = r.u8()?;
    if known != 0 {
        trace!(guid, "name query answered unknown");
        return Ok(());
    }
    let name = r.cstring()?;
    r.cstring()?; // realm name, empty on same realm
    state.name_cache.insert(guid, name);
    Ok(())
}

// --- combat ---

fn on_attack_start(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let attacker = r.u64()?;
    let victim = r.u64()?;
    events.push(GameEvent::AttackStarted { attacker, victim });
    Ok(())
}

fn on_attack_stop(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let attacker = r.packed_guid()?;
    r.packed_guid()?;
    events.push(GameEvent::AttackStopped { attacker });
    Ok(())
}

fn on_attacker_state(
    state: &mut GameState,
    events: &mut GameEvents,
    r: &mut Reader,
) -> Result<()> {
    r.u32()?; // hit info
    let _attacker = r.packed_guid()?;
    let victim = r.packed_guid()?;
    let damage = r.u32()?;
    let Some(entity) = state.entities.get_mut(victim) else {
        return Ok(());
    };
    if let Some(unit) = entity.unit_mut() {
        let was_alive = unit.health > 0;
        unit.health = unit.health.saturating_sub(damage);
        if was_alive && unit.health == 0 {
            events.push(GameEvent::UnitDied(victim));
        }
    }
    Ok(())
}

// --- spells and auras ---

fn on_initial_spells(state: &mut GameState, r: &mut Reader) -> Result<()> {
    r.u8()?;
    let count = r.u16()?;
    for _ in 0..count {
        let spell_id = r.u32()?;
        r.u16()?;
        state.spellbook.learn(spell_id);
    }
    Ok(())
}

fn on_action_buttons(state: &mut GameState, r: &mut Reader) -> Result<()> {
    use crate::action_bar::Action;
    r.u8()?; // packing mode
    for index in 0..crate::action_bar::ACTION_SLOTS {
        if r.remaining() < 4 {
            break;
        }
        let packed = r.u32()?;
        let id = packed & 0x00FF_FFFF;
        let action = match (packed >> 24) as u8 {
            _ if id == 0 => Action::Empty,
            0x00 => Action::Spell(id),
            0x40 => Action::Macro(id),
            0x80 => Action::Item(id),
            other => {
                trace!(other, "unknown action button type");
                Action::Empty
            }
        };
        state.action_bar.set(index, action);
    }
    Ok(())
}

fn on_cast_failed(state: &mut GameState, events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    r.u8()?; // cast count
    let spell_id = r.u32()?;
    let code = r.u8()?;
    let message = cast_failure_message(code);
    if !message.is_empty() {
        state.chat.push(ChatMessage::system(message));
    }
    events.push(GameEvent::CastFailed { spell_id, message });
    Ok(())
}

fn on_spell_go(state: &mut GameState, r: &mut Reader) -> Result<()> {
    r.packed_guid()?; // caster
    let caster_unit = r.packed_guid()?;
    r.u8()?; // cast id
    let spell_id = r.u32()?;
    if caster_unit == state.player_guid {
        // reflect the global cooldown on any bar slot bound to this spell
        for index in 0..crate::action_bar::ACTION_SLOTS {
            if state.action_bar.get(index) == crate::action_bar::Action::Spell(spell_id) {
                state.action_bar.start_cooldown(index, 1.5);
            }
        }
    }
    Ok(())
}

const AURA_FLAG_CASTER_IS_UNIT: u8 = 0x08;
const AURA_FLAG_HAS_DURATION: u8 = 0x20;

fn on_aura_update(session: &WorldSession, state: &mut GameState, r: &mut Reader) -> Result<()> {
    let guid = r.packed_guid()?;
    let now = session.now();
    while r.remaining() > 0 {
        let slot = r.u8()? as usize;
        let spell_id = r.u32()?;
        if spell_id == 0 {
            if guid == state.player_guid {
                state.auras.clear_own(slot);
            } else if guid == state.target {
                state.auras.clear_target(slot);
            }
            continue;
        }
        let flags = r.u8()?;
        r.u8()?; // caster level
        r.u8()?; // stack count
        let caster = if flags & AURA_FLAG_CASTER_IS_UNIT == 0 {
            r.packed_guid()?
        } else {
            guid
        };
        let (duration, max_duration) = if flags & AURA_FLAG_HAS_DURATION != 0 {
            let max = r.u32()? as f32 / 1000.0;
            let remaining = r.u32()? as f32 / 1000.0;
            (Some(remaining), max)
        } else {
            (None, 0.0)
        };
        let aura = crate::auras::AuraSlot {
            spell_id,
            flags,
            caster,
            applied_at: now,
            duration,
            max_duration,
        };
        if guid == state.player_guid {
            state.auras.set_own(slot, aura);
        } else if guid == state.target {
            state.auras.set_target(slot, aura);
        }
    }
    Ok(())
}

// --- loot ---

fn on_loot_response(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let source = r.u64()?;
    r.u8()?; // loot type
    let money = r.u32()?;
    let count = r.u8()?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let slot = r.u8()?;
        let item_id = r.u32()?;
        let item_count = r.u32()?;
        let display_id = r.u32()?;
        r.u32()?; // random suffix
        r.u32()?; // random property
        r.u8()?; // slot type
        items.push(LootItem {
            slot,
            item_id,
            display_id,
            count: item_count,
            quality: Quality::Common,
        });
    }
    events.push(GameEvent::LootOpened(LootWindow { source, money, items }));
    Ok(())
}

fn on_loot_removed(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let slot = r.u8()?;
    events.push(GameEvent::LootSlotRemoved { slot });
    Ok(())
}

fn on_loot_money(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let amount = r.u32()?;
    state.money = state.money.saturating_add(amount);
    Ok(())
}

fn on_loot_release(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    r.u64()?;
    events.push(GameEvent::LootClosed);
    Ok(())
}

fn on_item_push(state: &mut GameState, r: &mut Reader) -> Result<()> {
    r.u64()?; // receiver
    r.u32()?; // looted vs created
    r.u32()?;
    r.u32()?; // show in chat
    r.u8()?; // bag slot
    r.u32()?; // item slot
    let item_id = r.u32()?;
    r.u32()?; // suffix factor
    r.u32()?; // random property
    let count = r.u32()?;

    let item = ItemInstance::stackable(item_id, "", count, 20);
    state.inventory.add_item(item);
    let have = state.inventory.count_of(item_id);
    state.quest_log.credit_item(item_id, have);
    Ok(())
}

// --- gossip and quests ---

fn on_gossip_message(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let npc = r.u64()?;
    r.u32()?; // menu id
    let text_id = r.u32()?;
    let option_count = r.u32()?;
    let mut options = Vec::with_capacity(option_count.min(64) as usize);
    for _ in 0..option_count {
        let index = r.u32()?;
        let icon = r.u8()?;
        r.u8()?; // coded
        r.u32()?; // required money
        let text = r.cstring()?;
        r.cstring()?; // confirmation text
        options.push(GossipOption { index, icon, text });
    }
    let quest_count = r.u32()?;
    let mut quests = Vec::with_capacity(quest_count.min(64) as usize);
    for _ in 0..quest_count {
        let quest_id = r.u32()?;
        let icon = r.u32()?;
        let level = r.i32()?;
        r.u32()?; // flags
        r.u8()?; // repeatable
        let title = r.cstring()?;
        quests.push(GossipQuest { quest_id, icon, level, title });
    }
    events.push(GameEvent::GossipOpened(GossipMenu { npc, text_id, options, quests }));
    Ok(())
}

fn on_quest_details(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let giver = r.u64()?;
    r.u64()?; // shared-quest originator
    let quest_id = r.u32()?;
    let title = r.cstring()?;
    let details = r.cstring()?;
    let objectives = r.cstring()?;
    events.push(GameEvent::QuestDetails { giver, quest_id, title, details, objectives });
    Ok(())
}

fn on_quest_offer_reward(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    r.u64()?;
    let quest_id = r.u32()?;
    let title = r.cstring()?;
    events.push(GameEvent::QuestRewardOffered { quest_id, title });
    Ok(())
}

fn on_quest_complete(state: &mut GameState, events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let quest_id = r.u32()?;
    let xp = r.u32()?;
    let money = r.u32()?;
    state.quest_log.remove(quest_id);
    state.money = state.money.saturating_add(money);
    events.push(GameEvent::QuestCompleted { quest_id, xp, money });
    Ok(())
}

fn on_quest_add_kill(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let quest_id = r.u32()?;
    let entry = r.u32()?;
    let have = r.u32()?;
    let need = r.u32()?;
    r.u64()?; // credit guid
    for log_entry in &mut state.quest_log.entries {
        if log_entry.quest_id != quest_id {
            continue;
        }
        match log_entry.kills.iter_mut().find(|c| c.id == entry) {
            Some(counter) => {
                counter.have = have.min(need);
                counter.need = need;
            }
            None => log_entry.kills.push(crate::quest_log::ObjectiveCount {
                id: entry,
                have: have.min(need),
                need,
            }),
        }
    }
    Ok(())
}

// --- group ---

fn on_group_invite(state: &mut GameState, r: &mut Reader) -> Result<()> {
    r.u8()?; // can accept
    let inviter = r.cstring()?;
    state.chat.push(ChatMessage::system(format!("{} invites you to a group.", inviter)));
    Ok(())
}

fn on_group_list(state: &mut GameState, events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    use crate::group::*;
    r.u8()?; // group type
    r.u8()?; // own subgroup
    r.u8()?; // member flags
    r.u8()?; // own roles
    r.u64()?; // group guid
    r.u32()?; // update counter
    let count = r.u32()?;
    let mut members = Vec::with_capacity(count.min(MAX_GROUP_MEMBERS as u32) as usize);
    for _ in 0..count {
        let name = r.cstring()?;
        let guid = r.u64()?;
        let online = r.u8()? != 0;
        let sub_group = r.u8()?;
        r.u8()?; // member flags
        let role_flags = r.u8()?;
        members.push(GroupMember {
            name,
            guid,
            sub_group,
            role_flags,
            online,
            stats: MemberStats::default(),
        });
    }
    let leader = r.u64()?;
    let loot_policy = if r.remaining() >= 1 {
        let policy = LootPolicy::from_id(r.u8()?);
        // master looter guid and threshold follow; nothing here needs them
        policy
    } else {
        LootPolicy::FreeForAll
    };

    if members.is_empty() {
        state.group = None;
    } else {
        let mut group = Group::new(leader, loot_policy);
        for member in members {
            group.upsert_member(member);
        }
        state.group = Some(group);
    }
    events.push(GameEvent::GroupUpdated);
    Ok(())
}

const MEMBER_STATUS: u32 = 0x0001;
const MEMBER_CUR_HP: u32 = 0x0002;
const MEMBER_MAX_HP: u32 = 0x0004;
const MEMBER_POWER_TYPE: u32 = 0x0008;
const MEMBER_CUR_POWER: u32 = 0x0010;
const MEMBER_MAX_POWER: u32 = 0x0020;
const MEMBER_LEVEL: u32 = 0x0040;
const MEMBER_ZONE: u32 = 0x0080;
const MEMBER_POSITION: u32 = 0x0100;

fn on_party_member_stats(state: &mut GameState, r: &mut Reader) -> Result<()> {
    let guid = r.packed_guid()?;
    let mask = r.u32()?;
    let Some(group) = state.group.as_mut() else {
        return Ok(());
    };
    let Some(member) = group.member_mut(guid) else {
        trace!(guid, "stats for a non-member");
        return Ok(());
    };
    if mask & MEMBER_STATUS != 0 {
        member.online = r.u16()? & 0x1 != 0;
    }
    if mask & MEMBER_CUR_HP != 0 {
        member.stats.health = r.u32()?;
    }
    if mask & MEMBER_MAX_HP != 0 {
        member.stats.max_health = r.u32()?;
    }
    if mask & MEMBER_POWER_TYPE != 0 {
        r.u8()?;
    }
    if mask & MEMBER_CUR_POWER != 0 {
        member.stats.power = r.u16()? as u32;
    }
    if mask & MEMBER_MAX_POWER != 0 {
        member.stats.max_power = r.u16()? as u32;
    }
    if mask & MEMBER_LEVEL != 0 {
        member.stats.level = r.u16()? as u32;
    }
    if mask & MEMBER_ZONE != 0 {
        member.stats.zone = r.u16()? as u32;
    }
    if mask & MEMBER_POSITION != 0 {
        member.stats.pos = Vec2::new(r.u16()? as f32, r.u16()? as f32);
    }
    Ok(())
}

// --- vendors ---

fn on_vendor_list(events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let vendor = r.u64()?;
    let count = r.u8()?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = r.u32()?;
        let item_id = r.u32()?;
        let display_id = r.u32()?;
        let available = r.u32()?;
        let price = r.u32()?;
        r.u32()?; // durability
        r.u32()?; // buy count
        r.u32()?; // extended cost
        items.push(VendorItem { index, item_id, display_id, price, available });
    }
    events.push(GameEvent::VendorOpened(VendorWindow { vendor, items }));
    Ok(())
}

// --- progression ---

fn on_xp_gain(state: &mut GameState, events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let victim = r.u64()?;
    let amount = r.u32()?;
    r.u8()?; // xp type
    state.progress.xp = state.progress.xp.saturating_add(amount);
    events.push(GameEvent::XpGained { amount, victim });
    Ok(())
}

fn on_levelup(state: &mut GameState, events: &mut GameEvents, r: &mut Reader) -> Result<()> {
    let level = r.u32()?;
    state.progress.level = level;
    state.progress.next_level_xp = xp_for_level(level);
    events.push(GameEvent::LevelUp { level });
    Ok(())
}

fn on_logout_complete(
    session: &mut WorldSession,
    state: &mut GameState,
    events: &mut GameEvents,
) -> Result<()> {
    if !gate(session, &[SessionState::InWorld], "SMSG_LOGOUT_COMPLETE") {
        return Ok(());
    }
    state.reset();
    session.set_state(SessionState::Ready, events);
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::ObjectKind, update::fields as uf};

    fn in_world_fixture() -> (WorldSession, GameState, GameEvents) {
        let mut session = WorldSession::new("t", &[0u8; 40]);
        session.state = SessionState::InWorld;
        (session, GameState::new(), GameEvents::new())
    }

    fn create_unit_blocks(guid: Guid, health: u32) -> Vec<UpdateBlock> {
        let mut values = update::FieldMap::new();
        values.insert(uf::UNIT_FIELD_HEALTH, health);
        values.insert(uf::UNIT_FIELD_MAXHEALTH, health);
        vec![UpdateBlock::Create {
            guid,
            kind: ObjectKind::Unit,
            movement: update::MovementInfo {
                pos: Vec3::new(100.0, 200.0, 50.0),
                ..Default::default()
            },
            values,
        }]
    }

    #[test]
    fn create_block_lands_in_canonical_frame() {
        let (_, mut state, mut events) = in_world_fixture();
        apply_update_blocks(&mut state, &mut events, create_unit_blocks(9, 80));
        let entity = state.entities.get(9).unwrap();
        // server (100, 200, 50) swaps to canonical (200, 100, 50)
        assert_eq!(entity.pos, Vec3::new(200.0, 100.0, 50.0));
        assert_eq!(entity.unit().unwrap().health, 80);
    }

    #[test]
    fn update_for_unknown_guid_is_discarded() {
        let (_, mut state, mut events) = in_world_fixture();
        let mut values = update::FieldMap::new();
        values.insert(uf::UNIT_FIELD_HEALTH, 1);
        apply_update_blocks(
            &mut state,
            &mut events,
            vec![UpdateBlock::Values { guid: 1234, values }],
        );
        assert!(state.entities.get(1234).is_none());
    }

    #[test]
    fn same_packet_create_then_update_applies_in_order() {
        let (_, mut state, mut events) = in_world_fixture();
        let mut blocks = create_unit_blocks(5, 100);
        let mut values = update::FieldMap::new();
        values.insert(uf::UNIT_FIELD_HEALTH, 40);
        blocks.push(UpdateBlock::Values { guid: 5, values });
        apply_update_blocks(&mut state, &mut events, blocks);
        assert_eq!(state.entities.get(5).unwrap().unit().unwrap().health, 40);
    }

    #[test]
    fn health_reaching_zero_emits_death() {
        let (_, mut state, mut events) = in_world_fixture();
        apply_update_blocks(&mut state, &mut events, create_unit_blocks(5, 10));
        while events.pop().is_some() {}
        let mut values = update::FieldMap::new();
        values.insert(uf::UNIT_FIELD_HEALTH, 0);
        apply_update_blocks(
            &mut state,
            &mut events,
            vec![UpdateBlock::Values { guid: 5, values }],
        );
        assert!(matches!(events.pop(), Some(GameEvent::UnitDied(5))));
    }

    #[test]
    fn visible_item_change_marks_equipment_dirty() {
        let (_, mut state, mut events) = in_world_fixture();
        apply_update_blocks(
            &mut state,
            &mut events,
            vec![UpdateBlock::Create {
                guid: 2,
                kind: ObjectKind::Player,
                movement: Default::default(),
                values: update::FieldMap::new(),
            }],
        );
        let mut values = update::FieldMap::new();
        values.insert(uf::PLAYER_VISIBLE_ITEM_1_ENTRYID + 8, 31337);
        apply_update_blocks(
            &mut state,
            &mut events,
            vec![UpdateBlock::Values { guid: 2, values }],
        );
        assert_eq!(state.take_equipment_dirty(), vec![2]);
        let player = state.entities.get(2).unwrap().player().unwrap();
        assert_eq!(player.equipment_display[4], 31337);
    }

    #[test]
    fn out_of_range_destroys() {
        let (_, mut state, mut events) = in_world_fixture();
        apply_update_blocks(&mut state, &mut events, create_unit_blocks(5, 10));
        apply_update_blocks(
            &mut state,
            &mut events,
            vec![UpdateBlock::OutOfRange { guids: vec![5] }],
        );
        assert!(state.entities.get(5).is_none());
    }
}
