//! Outbound movement: a heartbeat goes out when the player's position or
//! facing changed meaningfully, stamped with a monotone counter.

use crate::{
    game_state::GameState,
    net::{
        opcodes::MSG_MOVE_HEARTBEAT,
        wire::Writer,
    },
    session::WorldSession,
};
use coords::{canonical_to_server, canonical_to_server_yaw};
use vek::*;


/// Positional change below this is jitter, not movement.
const MIN_MOVE_DELTA: f32 = 0.01;
const MIN_YAW_DELTA: f32 = 0.005;

#[derive(Debug)]
pub(super) struct MovementTracker {
    last_pos: Option<Vec3<f32>>,
    last_yaw: f32,
    /// Monotone per-send stamp.
    pub stamp: u32,
}

impl MovementTracker {
    pub fn new() -> Self {
        MovementTracker {
            last_pos: None,
            last_yaw: 0.0,
            stamp: 0,
        }
    }

    fn moved_meaningfully(&self, pos: Vec3<f32>, yaw: f32) -> bool {
        match self.last_pos {
            None => true,
            Some(last) => {
                (pos - last).magnitude() > MIN_MOVE_DELTA
                    || (yaw - self.last_yaw).abs() > MIN_YAW_DELTA
            }
        }
    }
}

/// Check the player entity and emit a heartbeat if it moved.
pub(super) fn send_heartbeat_if_moved(session: &mut WorldSession, state: &GameState) {
    let Some(player) = state.player() else { return };
    let (pos, yaw) = (player.pos, player.yaw);
    if !session.movement.moved_meaningfully(pos, yaw) {
        return;
    }
    session.movement.last_pos = Some(pos);
    session.movement.last_yaw = yaw;
    session.movement.stamp += 1;

    let wire_pos = canonical_to_server(pos);
    let wire_yaw = canonical_to_server_yaw(yaw);
    let time_ms = (session.now() * 1000.0) as u32;

    let mut w = Writer::new();
    w.packed_guid(state.player_guid);
    w.u32(0); // movement flags
    w.u16(0);
    w.u32(time_ms);
    w.f32(wire_pos.x).f32(wire_pos.y).f32(wire_pos.z);
    w.f32(wire_yaw);
    w.u32(0); // fall time
    session.send(MSG_MOVE_HEARTBEAT, w);
}
