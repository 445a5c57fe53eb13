
mod frames;
mod tile;


pub use crate::{
    frames::{
        server_to_canonical,
        canonical_to_server,
        canonical_to_render,
        render_to_canonical,
        render_to_adt,
        adt_to_render,
        server_to_canonical_yaw,
        canonical_to_server_yaw,
    },
    tile::{
        TILE,
        ZEROPOINT,
        MAP_TILES,
        LIGHT_COORD_SCALE,
        world_to_tile,
    },
};


#[cfg(test)]
use vek::*;

#[test]
fn test_frame_round_trips() {
    let cases = [
        Vec3::new(100.0f32, 200.0, 50.0),
        Vec3::new(-8949.95, -132.493, 83.5312),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(16000.0, -16000.0, 500.0),
    ];
    for v in cases {
        let c = server_to_canonical(v);
        assert!((canonical_to_server(c) - v).magnitude() <= 1e-5);
        let r = canonical_to_render(c);
        assert!((render_to_canonical(r) - c).magnitude() <= 1e-5);
        let a = render_to_adt(r);
        assert!((adt_to_render(a) - r).magnitude() <= 1e-5);
    }
}

#[test]
fn test_server_canonical_swaps_xy() {
    let c = server_to_canonical(Vec3::new(100.0f32, 200.0, 50.0));
    assert_eq!(c, Vec3::new(200.0, 100.0, 50.0));
    let r = canonical_to_render(c);
    assert_eq!(r, Vec3::new(100.0, 200.0, 50.0));
}

#[test]
fn test_yaw_round_trip() {
    use std::f32::consts::{PI, TAU};
    for i in 0..64 {
        let theta = i as f32 * TAU / 64.0;
        let back = server_to_canonical_yaw(canonical_to_server_yaw(theta));
        let diff = (back - theta).rem_euclid(TAU);
        assert!(diff < 1e-5 || TAU - diff < 1e-5, "yaw {} -> {}", theta, back);
    }
    // pi/2 - pi/4 = pi/4, so this yaw is its own image
    assert!((server_to_canonical_yaw(PI / 4.0) - PI / 4.0).abs() < 1e-6);
}

#[test]
fn test_tile_index_in_range() {
    let cases = [
        (0.0f32, 0.0f32),
        (17066.0, -17066.0),
        (1e9, -1e9),
        (-533.3333, 533.3333),
    ];
    for (x, y) in cases {
        let (tx, ty) = world_to_tile(x, y);
        assert!(tx < 64 && ty < 64);
    }
    assert_eq!(world_to_tile(0.0, 0.0), (32, 32));
}
