//! The world session: drives the connection through its states, routes
//! inbound opcodes to handlers, and emits movement heartbeats.
//!
//! All I/O happens inside `update`, which pumps a bounded amount per
//! frame. Errors are classified: transport and auth failures land the
//! session on `Failed`; protocol and decode problems are logged and the
//! offending packet dropped.

mod process_msg;
mod movement;

use crate::{
    entity::Guid,
    events::{GameEvent, GameEvents},
    game_state::GameState,
    net::{
        conn::WorldConn,
        opcodes::*,
        wire::Writer,
    },
};
use sha1::{Sha1, Digest};


/// Seconds between pings; doubles as the liveness probe.
const PING_INTERVAL: f32 = 30.0;

/// Client build number the server expects.
const CLIENT_BUILD: u32 = 12340;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    ChallengeReceived,
    AuthSent,
    Authenticated,
    Ready,
    CharListRequested,
    CharListReceived,
    EnteringWorld,
    InWorld,
    Failed,
}

pub struct WorldSession {
    state: SessionState,
    conn: Option<WorldConn>,
    account: String,
    session_key: Vec<u8>,
    client_seed: [u8; 4],
    ping_timer: f32,
    ping_seq: u32,
    ping_sent_at: Option<(u32, f64)>,
    latency_ms: u32,
    time: f64,
    movement: movement::MovementTracker,
    /// Guid named in the pending player-login request.
    pending_login: Guid,
}

impl WorldSession {
    /// A session holding the account name and the 40-byte session key the
    /// login handshake produced.
    pub fn new(account: &str, session_key: &[u8]) -> Self {
        WorldSession {
            state: SessionState::Disconnected,
            conn: None,
            account: account.to_uppercase(),
            session_key: session_key.to_vec(),
            client_seed: rand::random(),
            ping_timer: 0.0,
            ping_seq: 0,
            ping_sent_at: None,
            latency_ms: 0,
            time: 0.0,
            movement: movement::MovementTracker::new(),
            pending_login: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn latency_ms(&self) -> u32 {
        self.latency_ms
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn client_seed(&self) -> [u8; 4] {
        self.client_seed
    }

    fn pending_login(&self) -> Guid {
        self.pending_login
    }

    fn now(&self) -> f64 {
        self.time
    }

    /// Open the TCP link. The auth exchange proceeds from the server's
    /// challenge inside `update`.
    pub fn connect(&mut self, host: &str, port: u16, events: &mut GameEvents) {
        if self.state != SessionState::Disconnected {
            warn!(state = ?self.state, "connect called on a live session");
            return;
        }
        self.set_state(SessionState::Connecting, events);
        match WorldConn::connect(host, port) {
            Ok(conn) => {
                self.conn = Some(conn);
                self.set_state(SessionState::Connected, events);
            }
            Err(e) => self.fail(format!("connect: {:#}", e), events),
        }
    }

    /// Tear down at any time. If the handshake was still in flight the
    /// failure surfaces, then the session lands on `Disconnected`.
    pub fn disconnect(&mut self, events: &mut GameEvents) {
        let mid_handshake = matches!(
            self.state,
            SessionState::Connecting
                | SessionState::Connected
                | SessionState::ChallengeReceived
                | SessionState::AuthSent,
        );
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
        if mid_handshake {
            events.push(GameEvent::SessionFailed {
                reason: "disconnected during handshake".to_owned(),
            });
        }
        self.movement = movement::MovementTracker::new();
        self.ping_sent_at = None;
        self.set_state(SessionState::Disconnected, events);
    }

    /// Transport or auth failure: surface the reason, drop the socket.
    fn fail(&mut self, reason: String, events: &mut GameEvents) {
        error!(%reason, "session failed");
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
        self.set_state(SessionState::Failed, events);
        events.push(GameEvent::SessionFailed { reason });
    }

    fn set_state(&mut self, state: SessionState, events: &mut GameEvents) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "session state");
            self.state = state;
            events.push(GameEvent::SessionState(state));
        }
    }

    /// Pump socket I/O, decode buffered frames, route them, then do the
    /// periodic work (pings, movement heartbeat). Never blocks.
    pub fn update(&mut self, dt: f32, state: &mut GameState, events: &mut GameEvents) {
        self.time += dt as f64;
        if self.conn.is_none() {
            return;
        }

        let frames = match self.conn.as_mut().unwrap().pump() {
            Ok(frames) => frames,
            Err(e) => {
                self.fail(format!("transport: {:#}", e), events);
                return;
            }
        };
        for frame in frames {
            process_msg::handle_frame(self, state, events, frame.opcode, &frame.payload);
            if self.conn.is_none() {
                // a handler failed the session
                return;
            }
        }

        if self.state >= SessionState::Authenticated {
            self.ping_timer += dt;
            if self.ping_timer >= PING_INTERVAL {
                self.ping_timer = 0.0;
                self.send_ping();
            }
        }
        if self.state == SessionState::InWorld {
            movement::send_heartbeat_if_moved(self, state);
        }
    }

    fn send_ping(&mut self) {
        self.ping_seq += 1;
        let seq = self.ping_seq;
        let latency = self.latency_ms;
        self.ping_sent_at = Some((seq, self.time));
        let mut w = Writer::new();
        w.u32(seq).u32(latency);
        self.send(CMSG_PING, w);
    }

    /// Queue one outbound frame. A dead connection drops it silently; the
    /// transport error that killed it already surfaced.
    fn send(&mut self, opcode: u16, w: Writer) {
        let Some(conn) = self.conn.as_mut() else { return };
        let payload = w.into_bytes();
        if let Err(e) = conn.send(opcode, &payload) {
            warn!(%e, opcode = opcode_name(opcode), "failed to queue frame");
        }
    }

    // --- intents the shell forwards from the UI ---

    pub fn request_char_list(&mut self, events: &mut GameEvents) {
        if self.state < SessionState::Ready {
            warn!(state = ?self.state, "char list requested before ready");
            return;
        }
        self.send(CMSG_CHAR_ENUM, Writer::new());
        self.set_state(SessionState::CharListRequested, events);
    }

    pub fn player_login(&mut self, guid: Guid, events: &mut GameEvents) {
        if self.state != SessionState::CharListReceived {
            warn!(state = ?self.state, "player login outside char list state");
            return;
        }
        self.pending_login = guid;
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_PLAYER_LOGIN, w);
        self.set_state(SessionState::EnteringWorld, events);
    }

    pub fn send_chat(&mut self, chat_type: u32, language: u32, target: &str, text: &str) {
        let mut w = Writer::new();
        w.u32(chat_type).u32(language);
        if !target.is_empty() {
            w.cstring(target);
        }
        w.cstring(text);
        self.send(CMSG_MESSAGECHAT, w);
    }

    pub fn set_selection(&mut self, guid: Guid) {
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_SET_SELECTION, w);
    }

    pub fn attack_swing(&mut self, guid: Guid) {
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_ATTACKSWING, w);
    }

    pub fn attack_stop(&mut self) {
        self.send(CMSG_ATTACKSTOP, Writer::new());
    }

    pub fn cast_spell(&mut self, spell_id: u32, target: Guid) {
        let mut w = Writer::new();
        // cast count, spell, flags, then a target-guid target block
        w.u8(0).u32(spell_id).u8(0);
        w.u32(if target != 0 { 0x2 } else { 0x0 });
        if target != 0 {
            w.packed_guid(target);
        }
        self.send(CMSG_CAST_SPELL, w);
    }

    pub fn loot(&mut self, guid: Guid) {
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_LOOT, w);
    }

    pub fn loot_money(&mut self) {
        self.send(CMSG_LOOT_MONEY, Writer::new());
    }

    pub fn loot_item(&mut self, slot: u8) {
        let mut w = Writer::new();
        w.u8(slot);
        self.send(CMSG_AUTOSTORE_LOOT_ITEM, w);
    }

    pub fn loot_release(&mut self, guid: Guid) {
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_LOOT_RELEASE, w);
    }

    pub fn gossip_hello(&mut self, guid: Guid) {
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_GOSSIP_HELLO, w);
    }

    pub fn gossip_select(&mut self, guid: Guid, menu_id: u32, option: u32) {
        let mut w = Writer::new();
        w.u64(guid).u32(menu_id).u32(option);
        self.send(CMSG_GOSSIP_SELECT_OPTION, w);
    }

    pub fn quest_accept(&mut self, giver: Guid, quest_id: u32) {
        let mut w = Writer::new();
        w.u64(giver).u32(quest_id);
        self.send(CMSG_QUESTGIVER_ACCEPT_QUEST, w);
    }

    pub fn quest_choose_reward(&mut self, giver: Guid, quest_id: u32, reward: u32) {
        let mut w = Writer::new();
        w.u64(giver).u32(quest_id).u32(reward);
        self.send(CMSG_QUESTGIVER_CHOOSE_REWARD, w);
    }

    pub fn quest_remove(&mut self, slot: u8) {
        let mut w = Writer::new();
        w.u8(slot);
        self.send(CMSG_QUESTLOG_REMOVE_QUEST, w);
    }

    pub fn vendor_list(&mut self, guid: Guid) {
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_LIST_INVENTORY, w);
    }

    pub fn sell_item(&mut self, vendor: Guid, item: Guid, count: u32) {
        let mut w = Writer::new();
        w.u64(vendor).u64(item).u32(count);
        self.send(CMSG_SELL_ITEM, w);
    }

    pub fn buy_item(&mut self, vendor: Guid, item_id: u32, count: u8) {
        let mut w = Writer::new();
        w.u64(vendor).u32(item_id).u8(count);
        self.send(CMSG_BUY_ITEM, w);
    }

    pub fn name_query(&mut self, guid: Guid) {
        let mut w = Writer::new();
        w.u64(guid);
        self.send(CMSG_NAME_QUERY, w);
    }

    pub fn logout_request(&mut self) {
        self.send(CMSG_LOGOUT_REQUEST, Writer::new());
    }

    /// Compute the auth-session proof digest over the account, a zero
    /// word, both seeds, and the session key.
    fn auth_digest(&self, server_seed: [u8; 4]) -> [u8; 20] {
        let digest = Sha1::new()
            .chain_update(self.account.as_bytes())
            .chain_update([0u8; 4])
            .chain_update(self.client_seed)
            .chain_update(server_seed)
            .chain_update(&self.session_key)
            .finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        out
    }

    fn build_auth_session(&self, server_seed: [u8; 4]) -> Writer {
        let mut w = Writer::new();
        w.u32(CLIENT_BUILD);
        w.u32(0); // login server id
        w.cstring(&self.account);
        w.u32(0); // login server type
        w.bytes(&self.client_seed);
        w.u32(0); // region
        w.u32(0); // battlegroup
        w.u32(1); // realm id
        w.u64(0); // dos response
        w.bytes(&self.auth_digest(server_seed));
        w.u32(0); // no addon data
        w
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_per_seed() {
        let session = WorldSession::new("tester", &[7u8; 40]);
        let a = session.auth_digest([1, 2, 3, 4]);
        let b = session.auth_digest([1, 2, 3, 4]);
        let c = session.auth_digest([4, 3, 2, 1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn account_is_uppercased_for_the_wire() {
        let session = WorldSession::new("tester", &[0u8; 40]);
        assert_eq!(session.account(), "TESTER");
    }

    #[test]
    fn auth_session_packet_carries_the_client_seed() {
        let session = WorldSession::new("a", &[0u8; 40]);
        let packet = session.build_auth_session([0; 4]).into_bytes();
        let seed = session.client_seed();
        let at = packet
            .windows(4)
            .position(|win| win == &seed[..])
            .expect("client seed present in auth session");
        // build, login server id, account + nul, login server type
        assert_eq!(at, 4 + 4 + 2 + 4);
    }

    #[test]
    fn intents_require_session_progress() {
        let mut session = WorldSession::new("a", &[0u8; 40]);
        let mut events = GameEvents::new();
        // not ready yet: refused without a state change
        session.request_char_list(&mut events);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(events.is_empty());
    }

    /// Full handshake against a loopback server: one auth challenge and a
    /// success response walk the session to Ready, with exactly one auth
    /// session packet (4-byte client seed included) in between.
    #[test]
    fn handshake_reaches_ready_over_loopback() {
        use crate::{game_state::GameState, net::crypto::HeaderCrypto};
        use std::{
            io::{Read, Write},
            net::TcpListener,
            thread,
            time::Duration,
        };

        let key = [9u8; 40];
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut session = WorldSession::new("tester", &key);
        let mut state = GameState::new();
        let mut events = GameEvents::new();
        session.connect(&addr.ip().to_string(), addr.port(), &mut events);
        assert_eq!(session.state(), SessionState::Connected);

        let (mut server, _) = listener.accept().unwrap();

        // server -> client: auth challenge, header in the clear
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]); // server seed
        payload.extend_from_slice(&[0u8; 32]);
        let mut frame = Vec::new();
        frame.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
        frame.extend_from_slice(&SMSG_AUTH_CHALLENGE.to_le_bytes());
        frame.extend_from_slice(&payload);
        server.write_all(&frame).unwrap();

        let pump = |session: &mut WorldSession, state: &mut GameState, events: &mut GameEvents| {
            for _ in 0..50 {
                session.update(0.016, state, events);
                thread::sleep(Duration::from_millis(2));
            }
        };
        pump(&mut session, &mut state, &mut events);
        assert_eq!(session.state(), SessionState::AuthSent);

        // client -> server: exactly one auth session, plaintext header
        let mut header = [0u8; 6];
        server.read_exact(&mut header).unwrap();
        let size = u16::from_be_bytes([header[0], header[1]]) as usize;
        let opcode = u32::from_le_bytes([header[2], header[3], header[4], header[5]]);
        assert_eq!(opcode, CMSG_AUTH_SESSION as u32);
        let mut body = vec![0u8; size - 4];
        server.read_exact(&mut body).unwrap();
        // client seed sits after build, login server id, account + nul, type
        let seed_at = 4 + 4 + "TESTER".len() + 1 + 4;
        assert_eq!(&body[seed_at..seed_at + 4], session.client_seed().as_slice());

        // server -> client: auth ok, header ciphered like the server would
        let mut server_crypto = HeaderCrypto::new(&key);
        let response = [0x0Cu8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut header = Vec::new();
        header.extend_from_slice(&((response.len() as u16 + 2).to_be_bytes()));
        header.extend_from_slice(&SMSG_AUTH_RESPONSE.to_le_bytes());
        // the client undoes this with the same keystream
        server_crypto.decrypt(&mut header);
        server.write_all(&header).unwrap();
        server.write_all(&response).unwrap();

        pump(&mut session, &mut state, &mut events);
        assert_eq!(session.state(), SessionState::Ready);

        // the observable state walk, in order
        let mut walk = Vec::new();
        while let Some(event) = events.pop() {
            if let GameEvent::SessionState(s) = event {
                walk.push(s);
            }
        }
        assert_eq!(walk, vec![
            SessionState::Connecting,
            SessionState::Connected,
            SessionState::ChallengeReceived,
            SessionState::AuthSent,
            SessionState::Authenticated,
            SessionState::Ready,
        ]);
    }
}
