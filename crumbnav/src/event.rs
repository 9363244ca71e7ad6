// Geometry-change events fed into the navmesh.
//
// The host forwards every change that can alter static collision geometry
// as a `GeometryEvent`. `NavMeshSystem::handle_event()` turns each one into
// dirty-chunk marks (or grid lifecycle bookkeeping) synchronously; nothing
// expensive happens until the scheduler's next drain.
//
// Which events dirty what:
// - `CollisionChanged`: the occupant's tile chunk.
// - `BodyTypeChanged`:  the tile chunk, only when the transition enters or
//                       leaves `Static` (dynamic <-> kinematic is ignored).
// - `Moved`:            for static bodies only; the old and the new tile
//                       chunk (one mark if they coincide).
// - `TileChanged`:      the tile chunk.
// - `GridCreated`:      every chunk overlapping `bounds`, if given.
// - `GridRemoved`:      drops the grid's chunks, dirty marks and backlog.
//
// See also: `navmesh.rs` for the handler, `world.rs` whose mutators return
// the matching event for each change they make.

use crate::types::{GridId, TileBounds, TileCoord};
use serde::{Deserialize, Serialize};

/// Physics body classification. Only static bodies shape the navmesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    #[default]
    Static,
    Dynamic,
    Kinematic,
}

impl BodyType {
    pub fn is_static(self) -> bool {
        self == BodyType::Static
    }
}

/// A tile on a specific grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePosition {
    pub grid: GridId,
    pub tile: TileCoord,
}

impl TilePosition {
    pub fn new(grid: GridId, tile: TileCoord) -> Self {
        Self { grid, tile }
    }
}

/// A change that may invalidate navmesh chunks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeometryEvent {
    /// An occupant started or stopped participating in collision.
    CollisionChanged { grid: GridId, tile: TileCoord },
    /// An occupant's body type changed.
    BodyTypeChanged {
        grid: GridId,
        tile: TileCoord,
        old: BodyType,
        new: BodyType,
    },
    /// An occupant moved. `from` is `None` for spawns, `to` is `None` for
    /// deletions or moves off every grid.
    Moved {
        from: Option<TilePosition>,
        to: Option<TilePosition>,
        body_type: BodyType,
    },
    /// A tile's emptiness changed (floor placed or removed).
    TileChanged { grid: GridId, tile: TileCoord },
    /// A grid came into existence. `bounds` covers its populated tiles.
    GridCreated {
        grid: GridId,
        bounds: Option<TileBounds>,
    },
    GridRemoved { grid: GridId },
}
