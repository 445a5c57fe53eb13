//! Decoder for the object-mutation packets: create, value-update, and
//! out-of-range blocks, in the plain and zlib-compressed framings.
//!
//! The decoder is pure: it turns payload bytes into [`UpdateBlock`]s and
//! leaves application to the session. Positions stay in the server's wire
//! frame here; the session performs the canonical swap before storage.
//! Field arrays are bitmask-driven and kept sparse, so unknown indices
//! survive as data instead of being dropped.

pub mod fields;

use crate::{
    entity::{Guid, ObjectKind},
    net::wire::Reader,
};
use std::{
    collections::HashMap,
    io::Read,
};
use anyhow::{Result, Context, bail};
use bitflags::bitflags;
use flate2::read::ZlibDecoder;
use vek::*;


bitflags! {
    /// Movement state bits in wire order.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct MovementFlags: u32 {
        const FORWARD = 0x0000_0001;
        const BACKWARD = 0x0000_0002;
        const STRAFE_LEFT = 0x0000_0004;
        const STRAFE_RIGHT = 0x0000_0008;
        const TURN_LEFT = 0x0000_0010;
        const TURN_RIGHT = 0x0000_0020;
        const WALKING = 0x0000_0100;
        const ON_TRANSPORT = 0x0000_0200;
        const DISABLE_GRAVITY = 0x0000_0400;
        const ROOT = 0x0000_0800;
        const FALLING = 0x0000_1000;
        const FALLING_FAR = 0x0000_2000;
        const SWIMMING = 0x0020_0000;
        const ASCENDING = 0x0040_0000;
        const CAN_FLY = 0x0100_0000;
        const FLYING = 0x0200_0000;
        const SPLINE_ELEVATION = 0x0400_0000;
        const SPLINE_ENABLED = 0x0800_0000;
    }
}

bitflags! {
    /// Per-block update flags on create/movement blocks.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct UpdateFlags: u16 {
        const SELF = 0x0001;
        const TRANSPORT = 0x0002;
        const HAS_TARGET = 0x0004;
        const LOW_GUID = 0x0008;
        const HIGH_GUID = 0x0010;
        const LIVING = 0x0020;
        const STATIONARY = 0x0040;
        const VEHICLE = 0x0080;
        const GO_POSITION = 0x0100;
        const ROTATION = 0x0200;
    }
}

/// Transport attachment inside a movement block.
#[derive(Debug, Copy, Clone, Default)]
pub struct TransportInfo {
    pub guid: Guid,
    pub offset: Vec3<f32>,
    pub yaw: f32,
    pub time: u32,
    pub seat: u8,
}

/// Movement speeds in wire order.
#[derive(Debug, Copy, Clone, Default)]
pub struct Speeds {
    pub walk: f32,
    pub run: f32,
    pub run_back: f32,
    pub swim: f32,
    pub swim_back: f32,
    pub flight: f32,
    pub flight_back: f32,
    pub turn: f32,
    pub pitch: f32,
}

/// Decoded movement state. Position and yaw are wire-frame.
#[derive(Debug, Copy, Clone, Default)]
pub struct MovementInfo {
    pub update_flags: UpdateFlags,
    pub flags: MovementFlags,
    pub flags2: u16,
    pub time: u32,
    pub pos: Vec3<f32>,
    pub yaw: f32,
    pub pitch: Option<f32>,
    pub fall_time: u32,
    pub transport: Option<TransportInfo>,
    pub speeds: Option<Speeds>,
    pub target: Guid,
    pub is_self: bool,
}

/// Sparse field array keyed by numeric update-field index.
pub type FieldMap = HashMap<u16, u32>;

#[derive(Debug)]
pub enum UpdateBlock {
    Create {
        guid: Guid,
        kind: ObjectKind,
        movement: MovementInfo,
        values: FieldMap,
    },
    Values {
        guid: Guid,
        values: FieldMap,
    },
    Movement {
        guid: Guid,
        movement: MovementInfo,
    },
    OutOfRange {
        guids: Vec<Guid>,
    },
}

const UPDATE_TYPE_VALUES: u8 = 0;
const UPDATE_TYPE_MOVEMENT: u8 = 1;
const UPDATE_TYPE_CREATE_OBJECT: u8 = 2;
const UPDATE_TYPE_CREATE_OBJECT2: u8 = 3;
const UPDATE_TYPE_OUT_OF_RANGE: u8 = 4;
const UPDATE_TYPE_NEAR_OBJECTS: u8 = 5;

/// Decode a plain update-object payload into its blocks, in order.
pub fn decode_update(payload: &[u8]) -> Result<Vec<UpdateBlock>> {
    let mut r = Reader::new(payload);
    let count = r.u32().context("update: block count")?;
    let mut blocks = Vec::with_capacity(count.min(1024) as usize);
    for i in 0..count {
        blocks.push(decode_block(&mut r).with_context(|| format!("update block {}", i))?);
    }
    Ok(blocks)
}

/// The compressed variant: u32 inflated size, then a zlib stream wrapping
/// the plain form.
pub fn decode_compressed_update(payload: &[u8]) -> Result<Vec<UpdateBlock>> {
    let mut r = Reader::new(payload);
    let inflated_size = r.u32().context("compressed update: size")? as usize;
    let mut inflated = Vec::with_capacity(inflated_size);
    ZlibDecoder::new(r.bytes(r.remaining())?)
        .read_to_end(&mut inflated)
        .context("compressed update: inflate")?;
    if inflated.len() != inflated_size {
        warn!(
            expected = inflated_size,
            got = inflated.len(),
            "compressed update: inflated size mismatch",
        );
    }
    decode_update(&inflated)
}

fn decode_block(r: &mut Reader) -> Result<UpdateBlock> {
    let block_type = r.u8()?;
    Ok(match block_type {
        UPDATE_TYPE_VALUES => {
            let guid = r.packed_guid()?;
            let values = read_field_mask(r)?;
            UpdateBlock::Values { guid, values }
        }
        UPDATE_TYPE_MOVEMENT => {
            let guid = r.packed_guid()?;
            let movement = read_movement(r)?;
            UpdateBlock::Movement { guid, movement }
        }
        UPDATE_TYPE_CREATE_OBJECT | UPDATE_TYPE_CREATE_OBJECT2 => {
            let guid = r.packed_guid()?;
            let tag = r.u8()?;
            let kind = ObjectKind::from_tag(tag)
                .ok_or_else(|| anyhow::anyhow!("unknown object type tag {}", tag))?;
            let movement = read_movement(r)?;
            let values = read_field_mask(r)?;
            UpdateBlock::Create { guid, kind, movement, values }
        }
        UPDATE_TYPE_OUT_OF_RANGE | UPDATE_TYPE_NEAR_OBJECTS => {
            let count = r.u32()?;
            let mut guids = Vec::with_capacity(count.min(1024) as usize);
            for _ in 0..count {
                guids.push(r.packed_guid()?);
            }
            if block_type == UPDATE_TYPE_NEAR_OBJECTS {
                // informational only; nothing to apply
                UpdateBlock::OutOfRange { guids: Vec::new() }
            } else {
                UpdateBlock::OutOfRange { guids }
            }
        }
        other => bail!("unknown update block type {}", other),
    })
}

/// Movement block in wire order: update flags, then living state or a
/// static position, then the optional per-flag tails.
fn read_movement(r: &mut Reader) -> Result<MovementInfo> {
    let update_flags = UpdateFlags::from_bits_retain(r.u16()?);
    let mut info = MovementInfo {
        update_flags,
        is_self: update_flags.contains(UpdateFlags::SELF),
        ..MovementInfo::default()
    };

    if update_flags.contains(UpdateFlags::LIVING) {
        info.flags = MovementFlags::from_bits_retain(r.u32()?);
        info.flags2 = r.u16()?;
        info.time = r.u32()?;
        info.pos = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
        info.yaw = r.f32()?;

        if info.flags.contains(MovementFlags::ON_TRANSPORT) {
            info.transport = Some(TransportInfo {
                guid: r.packed_guid()?,
                offset: Vec3::new(r.f32()?, r.f32()?, r.f32()?),
                yaw: r.f32()?,
                time: r.u32()?,
                seat: r.u8()?,
            });
        }
        if info.flags.intersects(MovementFlags::SWIMMING | MovementFlags::FLYING) {
            info.pitch = Some(r.f32()?);
        }
        info.fall_time = r.u32()?;
        if info.flags.contains(MovementFlags::FALLING) {
            // vertical speed plus jump direction and magnitude
            r.skip(16)?;
        }
        if info.flags.contains(MovementFlags::SPLINE_ELEVATION) {
            r.skip(4)?;
        }
        info.speeds = Some(Speeds {
            walk: r.f32()?,
            run: r.f32()?,
            run_back: r.f32()?,
            swim: r.f32()?,
            swim_back: r.f32()?,
            flight: r.f32()?,
            flight_back: r.f32()?,
            turn: r.f32()?,
            pitch: r.f32()?,
        });
        if info.flags.contains(MovementFlags::SPLINE_ENABLED) {
            bail!("spline movement blocks are not supported");
        }
    } else if update_flags.contains(UpdateFlags::GO_POSITION) {
        let transport_guid = r.packed_guid()?;
        info.pos = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
        // transport-local offset then shared yaw
        let offset = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
        info.yaw = r.f32()?;
        r.skip(4)?;
        info.transport = Some(TransportInfo {
            guid: transport_guid,
            offset,
            yaw: info.yaw,
            time: 0,
            seat: 0,
        });
    } else if update_flags.contains(UpdateFlags::STATIONARY) {
        info.pos = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
        info.yaw = r.f32()?;
    }

    if update_flags.contains(UpdateFlags::HIGH_GUID) {
        r.skip(4)?;
    }
    if update_flags.contains(UpdateFlags::LOW_GUID) {
        r.skip(4)?;
    }
    if update_flags.contains(UpdateFlags::HAS_TARGET) {
        info.target = r.packed_guid()?;
    }
    if update_flags.contains(UpdateFlags::TRANSPORT) {
        r.skip(4)?;
    }
    if update_flags.contains(UpdateFlags::VEHICLE) {
        r.skip(8)?;
    }
    if update_flags.contains(UpdateFlags::ROTATION) {
        r.skip(8)?;
    }
    Ok(info)
}

/// Bitmask-prefixed sparse field array. Never assumes a field count: the
/// mask says exactly which 32-bit values follow.
fn read_field_mask(r: &mut Reader) -> Result<FieldMap> {
    let word_count = r.u8()? as usize;
    let mut mask = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        mask.push(r.u32()?);
    }
    let mut values = FieldMap::new();
    for (word_idx, word) in mask.iter().enumerate() {
        for bit in 0..32 {
            if word & (1 << bit) != 0 {
                let field = (word_idx * 32 + bit) as u16;
                values.insert(field, r.u32()?);
            }
        }
    }
    Ok(values)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::wire::Writer;
    use flate2::{write::ZlibEncoder, Compression};
    use std::io::Write as _;

    /// Build a create block for a stationary unit with the given fields.
    fn create_block(w: &mut Writer, guid: Guid, fields: &[(u16, u32)]) {
        w.u8(UPDATE_TYPE_CREATE_OBJECT);
        w.packed_guid(guid);
        w.u8(ObjectKind::Unit as u8);
        w.u16(UpdateFlags::STATIONARY.bits());
        w.f32(10.0).f32(20.0).f32(30.0).f32(1.0);
        write_fields(w, fields);
    }

    fn write_fields(w: &mut Writer, fields: &[(u16, u32)]) {
        let words = fields.iter().map(|&(f, _)| f as usize / 32 + 1).max().unwrap_or(0);
        let mut mask = vec![0u32; words];
        for &(f, _) in fields {
            mask[f as usize / 32] |= 1 << (f % 32);
        }
        w.u8(words as u8);
        for word in mask {
            w.u32(word);
        }
        let mut sorted = fields.to_vec();
        sorted.sort_by_key(|&(f, _)| f);
        for (_, v) in sorted {
            w.u32(v);
        }
    }

    #[test]
    fn create_block_round_trip() {
        let mut w = Writer::new();
        w.u32(1);
        create_block(&mut w, 0x42, &[
            (fields::UNIT_FIELD_HEALTH, 150),
            (fields::UNIT_FIELD_MAXHEALTH, 200),
            (fields::UNIT_FIELD_LEVEL, 5),
            // an index nothing in the client knows yet
            (0x300, 77),
        ]);
        let blocks = decode_update(&w.into_bytes()).unwrap();
        assert_eq!(blocks.len(), 1);
        let UpdateBlock::Create { guid, kind, movement, values } = &blocks[0] else {
            panic!("expected create block");
        };
        assert_eq!(*guid, 0x42);
        assert_eq!(*kind, ObjectKind::Unit);
        assert_eq!(movement.pos, Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(values.get(&fields::UNIT_FIELD_HEALTH), Some(&150));
        // unknown fields are retained, not dropped
        assert_eq!(values.get(&0x300), Some(&77));
    }

    #[test]
    fn values_and_out_of_range_blocks() {
        let mut w = Writer::new();
        w.u32(2);
        w.u8(UPDATE_TYPE_VALUES);
        w.packed_guid(7);
        write_fields(&mut w, &[(fields::UNIT_FIELD_HEALTH, 0)]);
        w.u8(UPDATE_TYPE_OUT_OF_RANGE);
        w.u32(2);
        w.packed_guid(7);
        w.packed_guid(9);
        let blocks = decode_update(&w.into_bytes()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], UpdateBlock::Values { guid: 7, .. }));
        let UpdateBlock::OutOfRange { guids } = &blocks[1] else {
            panic!("expected out-of-range block");
        };
        assert_eq!(guids, &[7, 9]);
    }

    #[test]
    fn living_movement_block_with_speeds() {
        let mut w = Writer::new();
        w.u32(1);
        w.u8(UPDATE_TYPE_CREATE_OBJECT2);
        w.packed_guid(1);
        w.u8(ObjectKind::Player as u8);
        w.u16((UpdateFlags::LIVING | UpdateFlags::SELF).bits());
        w.u32(0); // movement flags
        w.u16(0);
        w.u32(1000);
        w.f32(1.0).f32(2.0).f32(3.0).f32(0.5);
        w.u32(0); // fall time
        for speed in [2.5f32, 7.0, 4.5, 4.72, 2.5, 7.0, 4.5, 3.14, 3.14] {
            w.f32(speed);
        }
        write_fields(&mut w, &[(fields::OBJECT_FIELD_TYPE, 0x19)]);
        let blocks = decode_update(&w.into_bytes()).unwrap();
        let UpdateBlock::Create { movement, .. } = &blocks[0] else {
            panic!("expected create block");
        };
        assert!(movement.is_self);
        assert_eq!(movement.speeds.unwrap().run, 7.0);
        assert_eq!(movement.yaw, 0.5);
    }

    #[test]
    fn compressed_variant_matches_plain() {
        let mut w = Writer::new();
        w.u32(1);
        create_block(&mut w, 0x99, &[(fields::UNIT_FIELD_LEVEL, 10)]);
        let plain = w.into_bytes();

        let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
        z.write_all(&plain).unwrap();
        let deflated = z.finish().unwrap();
        let mut payload = (plain.len() as u32).to_le_bytes().to_vec();
        payload.extend_from_slice(&deflated);

        let blocks = decode_compressed_update(&payload).unwrap();
        assert!(matches!(blocks[0], UpdateBlock::Create { guid: 0x99, .. }));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        assert!(decode_update(&[1, 0, 0, 0]).is_err());
        assert!(decode_compressed_update(&[0, 1]).is_err());
    }
}
