// Occupancy provider seam.
//
// The navmesh builder never owns world geometry. It asks an
// `OccupancyProvider` whether a tile is empty and which occupants are
// anchored to it, then resolves each occupant handle to an `Occupant`:
// collision participation flags, layer/mask bits, a 2D transform, and a
// list of `Shape`s expressed in the occupant's local space.
//
// Resolution is allowed to fail (`occupant()` returns `None`) when the
// occupant was deleted between the tile query and the lookup; the sampler
// skips such handles.
//
// `TileWorld` in `world.rs` is the in-crate reference implementation used
// by the tool and the tests. Engine integrations implement the trait over
// their own entity storage.
//
// See also: `sampler.rs`, the only consumer of this trait.

use crate::types::{GridId, OccupantId, TileCoord, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Occupant handles anchored to one tile. Most tiles hold zero to two.
pub type OccupantList = SmallVec<[OccupantId; 4]>;

/// Source of tile emptiness and anchored-occupant geometry.
pub trait OccupancyProvider {
    /// Whether the grid is still alive. Chunks queued for a grid that no
    /// longer exists are dropped instead of rebuilt.
    fn grid_exists(&self, grid: GridId) -> bool;

    /// Whether the tile at `tile` is empty (vacuum / no floor).
    fn is_tile_empty(&self, grid: GridId, tile: TileCoord) -> bool;

    /// Handles of every occupant anchored to `tile`.
    fn anchored_occupants(&self, grid: GridId, tile: TileCoord) -> OccupantList;

    /// Resolve a handle. `None` if the occupant no longer exists.
    fn occupant(&self, id: OccupantId) -> Option<&Occupant>;
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box. Containment is inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// A box that contains nothing.
    pub fn empty() -> Self {
        Self {
            min: Vec2::new(f32::INFINITY, f32::INFINITY),
            max: Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    fn include(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }
}

/// A collision shape in occupant-local space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned (in local space) rectangle.
    Rect { center: Vec2, half_extents: Vec2 },
    Circle { center: Vec2, radius: f32 },
    /// Convex polygon; either winding order is accepted.
    Polygon { vertices: SmallVec<[Vec2; 8]> },
}

impl Shape {
    /// A rectangle covering exactly one tile, for an occupant whose
    /// transform sits at the tile's lower-left corner.
    pub fn unit_tile() -> Self {
        Shape::Rect {
            center: Vec2::new(0.5, 0.5),
            half_extents: Vec2::new(0.5, 0.5),
        }
    }

    /// Local-space bounding box.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Shape::Rect {
                center,
                half_extents,
            } => Aabb::new(*center - *half_extents, *center + *half_extents),
            Shape::Circle { center, radius } => {
                let r = Vec2::new(*radius, *radius);
                Aabb::new(*center - r, *center + r)
            }
            Shape::Polygon { vertices } => {
                let mut aabb = Aabb::empty();
                for &v in vertices {
                    aabb.include(v);
                }
                aabb
            }
        }
    }

    /// Exact point containment in local space. Points on the outline count
    /// as inside.
    pub fn contains_local(&self, p: Vec2) -> bool {
        match self {
            Shape::Rect {
                center,
                half_extents,
            } => {
                let d = p - *center;
                d.x.abs() <= half_extents.x && d.y.abs() <= half_extents.y
            }
            Shape::Circle { center, radius } => (p - *center).length_squared() <= radius * radius,
            Shape::Polygon { vertices } => convex_contains(vertices, p),
        }
    }
}

/// Convex containment: the point must be on the same side of every edge.
fn convex_contains(vertices: &[Vec2], p: Vec2) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut saw_positive = false;
    let mut saw_negative = false;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let cross = (b - a).perp_dot(p - a);
        if cross > 0.0 {
            saw_positive = true;
        } else if cross < 0.0 {
            saw_negative = true;
        }
        if saw_positive && saw_negative {
            return false;
        }
    }
    true
}

/// Placement of an occupant on its grid: translation in tile units plus a
/// counter-clockwise rotation in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    pub position: Vec2,
    pub rotation: f32,
}

impl Transform2 {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    /// Map a grid-local point into this transform's local space.
    pub fn to_local(&self, grid_point: Vec2) -> Vec2 {
        let offset = grid_point - self.position;
        if self.rotation == 0.0 {
            offset
        } else {
            offset.rotated(-self.rotation)
        }
    }
}

/// A resolved anchored occupant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    /// Hard fixtures block movement; soft ones (sensors, triggers) do not.
    pub hard: bool,
    /// Whether the occupant currently participates in collision at all.
    pub collidable: bool,
    pub collision_layer: u32,
    pub collision_mask: u32,
    pub transform: Transform2,
    pub shapes: SmallVec<[Shape; 2]>,
}

impl Occupant {
    /// A hard, collidable occupant with one shape.
    pub fn solid(layer: u32, mask: u32, transform: Transform2, shape: Shape) -> Self {
        let mut shapes = SmallVec::new();
        shapes.push(shape);
        Self {
            hard: true,
            collidable: true,
            collision_layer: layer,
            collision_mask: mask,
            transform,
            shapes,
        }
    }

    /// Whether this occupant can shape the navmesh under `relevant_layers`.
    pub fn is_relevant(&self, relevant_layers: u32) -> bool {
        self.hard
            && self.collidable
            && ((self.collision_layer | self.collision_mask) & relevant_layers) != 0
    }
}
