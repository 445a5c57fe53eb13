//! Conversions between the wire, canonical, and render coordinate frames.
//!
//! The server transmits positions in its own axis order and yaw convention.
//! Canonical coordinates are the map's axes, which everything in the data
//! model stores. The render frame keeps +Z up but swaps X/Y relative to
//! canonical. All conversions are pure and pairwise inverse.

use crate::tile::ZEROPOINT;
use std::f32::consts::{FRAC_PI_2, TAU};
use vek::*;


/// Server wire order to canonical map axes. Swaps x and y.
pub fn server_to_canonical(v: Vec3<f32>) -> Vec3<f32> {
    Vec3::new(v.y, v.x, v.z)
}

/// Canonical map axes to server wire order. Swaps x and y.
pub fn canonical_to_server(v: Vec3<f32>) -> Vec3<f32> {
    Vec3::new(v.y, v.x, v.z)
}

/// Canonical map axes to the render frame. Swaps x and y, +Z stays up.
pub fn canonical_to_render(v: Vec3<f32>) -> Vec3<f32> {
    Vec3::new(v.y, v.x, v.z)
}

/// Render frame to canonical map axes.
pub fn render_to_canonical(v: Vec3<f32>) -> Vec3<f32> {
    Vec3::new(v.y, v.x, v.z)
}

/// Render frame to ADT placement coordinates (positive quadrant, origin at
/// the 32-tile center).
pub fn render_to_adt(v: Vec3<f32>) -> Vec3<f32> {
    Vec3::new(ZEROPOINT - v.x, ZEROPOINT - v.y, v.z)
}

/// ADT placement coordinates back to the render frame.
pub fn adt_to_render(v: Vec3<f32>) -> Vec3<f32> {
    Vec3::new(ZEROPOINT - v.x, ZEROPOINT - v.y, v.z)
}

/// Server yaw convention to canonical yaw. The transform is its own inverse.
pub fn server_to_canonical_yaw(yaw: f32) -> f32 {
    (FRAC_PI_2 - yaw).rem_euclid(TAU)
}

/// Canonical yaw to server yaw convention.
pub fn canonical_to_server_yaw(yaw: f32) -> f32 {
    (FRAC_PI_2 - yaw).rem_euclid(TAU)
}
