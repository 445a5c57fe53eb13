//! Map tile constants and indexing.


/// Side length of one ADT tile in world units.
pub const TILE: f32 = 1600.0 / 3.0;

/// World coordinate of the map center, 32 tiles from the edge.
pub const ZEROPOINT: f32 = 32.0 * TILE;

/// The map is a square grid of this many tiles per side.
pub const MAP_TILES: u32 = 64;

/// Empirical scale applied to light volume positions. Some data sets may
/// want 36.0 here; left at unity until a fixture disagrees.
pub const LIGHT_COORD_SCALE: f32 = 1.0;

/// Tile index of a canonical world position. Clamped to the map grid, so
/// any finite input yields a valid index.
pub fn world_to_tile(x: f32, y: f32) -> (u32, u32) {
    (tile_index(x), tile_index(y))
}

fn tile_index(coord: f32) -> u32 {
    let idx = (32.0 - coord / TILE).floor();
    if idx < 0.0 {
        0
    } else if idx > 63.0 {
        63
    } else {
        idx as u32
    }
}
