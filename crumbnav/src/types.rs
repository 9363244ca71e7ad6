// Core types shared across the navmesh builder.
//
// Defines the three coordinate spaces the builder works in, plus the grid
// identifier and the small 2D vector used for sub-tile sample points:
// - `TileCoord`:   one world tile on a grid (integer, unbounded).
// - `ChunkCoord`:  one chunk on a grid; chunk (cx, cy) owns tiles
//                  `[cx * chunk_size, (cx + 1) * chunk_size)` on each axis.
// - `SampleCoord`: one breadcrumb cell inside a chunk's sample array, local
//                  to that chunk (0,0 is the lower-left corner of the
//                  expansion margin).
//
// Collision layer constants live in `collision_group`. They mirror the
// bit layout the occupancy provider reports for its shapes; the builder
// never interprets individual bits beyond the pathfinding-relevant filter
// configured in `NavMeshConfig::relevant_layers`.
//
// **Critical constraint: determinism.** Every coordinate type derives `Ord`
// so it can key a `BTreeMap`/`BTreeSet`. No `HashMap` anywhere in the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of one tile grid (one infinite tile plane).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridId(pub u32);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

/// Opaque handle to an anchored occupant, as issued by the occupancy
/// provider. Resolution may fail if the occupant was deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccupantId(pub u64);

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A tile position on a grid. X grows east, Y grows north.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Integer chunk coordinate. Uses floor division, so tile -1 belongs to
/// chunk -1, not chunk 0.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk that owns `tile`.
    pub fn containing(tile: TileCoord, chunk_size: u32) -> Self {
        let size = chunk_size as i32;
        Self {
            x: tile.x.div_euclid(size),
            y: tile.y.div_euclid(size),
        }
    }

    /// The lowest-x, lowest-y tile owned by this chunk.
    pub fn origin_tile(self, chunk_size: u32) -> TileCoord {
        let size = chunk_size as i32;
        TileCoord::new(self.x * size, self.y * size)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk({}, {})", self.x, self.y)
    }
}

/// A breadcrumb position inside one chunk's sample array.
///
/// Ordered by `x` then `y`, which fixes the order the boundary tracer picks
/// start cells in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SampleCoord {
    pub x: i32,
    pub y: i32,
}

impl SampleCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cardinal neighbor one step in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for SampleCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// A breadcrumb position in grid-wide sample space:
/// `tile * sub_step + sub_index` on each axis. Unlike `SampleCoord` it is
/// independent of any chunk, so consumers can look cells up without
/// knowing chunk boundaries.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridSampleCoord {
    pub x: i32,
    pub y: i32,
}

impl GridSampleCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile this sample falls in.
    pub fn tile(self, sub_step: u32) -> TileCoord {
        let step = sub_step as i32;
        TileCoord::new(self.x.div_euclid(step), self.y.div_euclid(step))
    }
}

/// Inclusive rectangle of tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBounds {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileBounds {
    pub fn new(min: TileCoord, max: TileCoord) -> Self {
        Self { min, max }
    }

    /// Grow to include `tile`.
    pub fn include(&mut self, tile: TileCoord) {
        self.min.x = self.min.x.min(tile.x);
        self.min.y = self.min.y.min(tile.y);
        self.max.x = self.max.x.max(tile.x);
        self.max.y = self.max.y.max(tile.y);
    }

    /// Every chunk overlapping these bounds, in ascending order.
    pub fn chunks(&self, chunk_size: u32) -> impl Iterator<Item = ChunkCoord> + use<> {
        let lo = ChunkCoord::containing(self.min, chunk_size);
        let hi = ChunkCoord::containing(self.max, chunk_size);
        (lo.x..=hi.x).flat_map(move |x| (lo.y..=hi.y).map(move |y| ChunkCoord::new(x, y)))
    }
}

/// The four cardinal directions, declared in the fixed rotational order
/// the boundary tracer probes them in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    West,
    South,
    East,
    North,
}

impl Direction {
    /// Probe order: west, south, east, north.
    pub const ALL: [Direction; 4] = [
        Direction::West,
        Direction::South,
        Direction::East,
        Direction::North,
    ];

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::West => (-1, 0),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::North => (0, 1),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::West => Direction::East,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::North => Direction::South,
        }
    }

    /// Single-bit mask used by the cleanup neighbor classification.
    pub const fn bit(self) -> u8 {
        match self {
            Direction::West => 0b0001,
            Direction::South => 0b0010,
            Direction::East => 0b0100,
            Direction::North => 0b1000,
        }
    }
}

/// A point or offset in grid-local tile units (1.0 = one tile).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross).
    pub fn perp_dot(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Rotate counter-clockwise by `radians`.
    pub fn rotated(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ---------------------------------------------------------------------------
// Collision groups
// ---------------------------------------------------------------------------

/// Collision layer bits as reported by the occupancy provider.
pub mod collision_group {
    pub const OPAQUE: u32 = 1 << 0;
    pub const IMPASSABLE: u32 = 1 << 1;
    pub const MID_IMPASSABLE: u32 = 1 << 2;
    pub const HIGH_IMPASSABLE: u32 = 1 << 3;
    pub const LOW_IMPASSABLE: u32 = 1 << 4;
    pub const GHOST_IMPASSABLE: u32 = 1 << 5;
    pub const BULLET_IMPASSABLE: u32 = 1 << 6;
    pub const INTERACT_IMPASSABLE: u32 = 1 << 7;
    pub const DOOR_PASSABLE: u32 = 1 << 8;

    /// Layers that block or shape walking agents. Anything outside this set
    /// (purely opaque decals, ghost walls, bullet-only barriers) is ignored
    /// by the sampler under the default config.
    pub const PATHFINDING: u32 =
        IMPASSABLE | MID_IMPASSABLE | HIGH_IMPASSABLE | LOW_IMPASSABLE | DOOR_PASSABLE;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_containing_uses_floor_division() {
        assert_eq!(
            ChunkCoord::containing(TileCoord::new(0, 7), 8),
            ChunkCoord::new(0, 0)
        );
        assert_eq!(
            ChunkCoord::containing(TileCoord::new(8, 15), 8),
            ChunkCoord::new(1, 1)
        );
        assert_eq!(
            ChunkCoord::containing(TileCoord::new(-1, -8), 8),
            ChunkCoord::new(-1, -1)
        );
        assert_eq!(
            ChunkCoord::containing(TileCoord::new(-9, 0), 8),
            ChunkCoord::new(-2, 0)
        );
    }

    #[test]
    fn origin_tile_inverts_containing() {
        for x in -20..20 {
            let tile = TileCoord::new(x, -x);
            let chunk = ChunkCoord::containing(tile, 8);
            let origin = chunk.origin_tile(8);
            assert!(origin.x <= tile.x && tile.x < origin.x + 8);
            assert!(origin.y <= tile.y && tile.y < origin.y + 8);
        }
    }

    #[test]
    fn grid_sample_tile_handles_negatives() {
        assert_eq!(GridSampleCoord::new(0, 3).tile(4), TileCoord::new(0, 0));
        assert_eq!(GridSampleCoord::new(-1, 4).tile(4), TileCoord::new(-1, 1));
        assert_eq!(GridSampleCoord::new(-4, -5).tile(4), TileCoord::new(-1, -2));
    }

    #[test]
    fn tile_bounds_chunks_cover_range() {
        let mut bounds = TileBounds::new(TileCoord::new(0, 0), TileCoord::new(0, 0));
        bounds.include(TileCoord::new(9, -1));
        let chunks: Vec<_> = bounds.chunks(8).collect();
        assert_eq!(
            chunks,
            vec![
                ChunkCoord::new(0, -1),
                ChunkCoord::new(0, 0),
                ChunkCoord::new(1, -1),
                ChunkCoord::new(1, 0),
            ]
        );
    }

    #[test]
    fn direction_opposites_cancel() {
        for dir in Direction::ALL {
            let start = SampleCoord::new(3, 3);
            assert_eq!(start.step(dir).step(dir.opposite()), start);
        }
    }

    #[test]
    fn direction_bits_are_distinct() {
        let combined = Direction::ALL.iter().fold(0u8, |acc, d| {
            assert_eq!(acc & d.bit(), 0);
            acc | d.bit()
        });
        assert_eq!(combined, 0b1111);
    }

    #[test]
    fn vec2_rotation_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotated(std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sample_coord_ordering_is_x_major() {
        assert!(SampleCoord::new(0, 9) < SampleCoord::new(1, 0));
        assert!(SampleCoord::new(2, 1) < SampleCoord::new(2, 3));
    }
}
