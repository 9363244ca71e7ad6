// In-memory tile world: the reference `OccupancyProvider`.
//
// `TileWorld` stores any number of sparse grids. Each grid records which
// tiles have floor (non-empty) and which occupants are anchored to which
// tile. Occupants live in one registry keyed by `OccupantId`, so a handle
// can outlive its record (see `orphan_occupant()`), which is how tests
// exercise the sampler's skip-on-failed-resolution path.
//
// Every mutator returns the `GeometryEvent` describing what it changed, so
// a host drives the navmesh with:
//
//     let event = world.set_collidable(id, false);
//     navmesh.handle_event(&event);
//
// Tiles default to empty: a grid with no floor is all space. Only
// `BodyType::Static` occupants are reported as anchored.
//
// See also: `occupancy.rs` for the trait, `event.rs` for the events,
// `crumbnav_tool`'s scene loader which builds a `TileWorld` from JSON.
//
// **Critical constraint: determinism.** All storage is `BTreeMap`/`BTreeSet`
// so iteration (and therefore occupant order inside a tile) is stable.

use crate::event::{BodyType, GeometryEvent, TilePosition};
use crate::occupancy::{OccupancyProvider, Occupant, OccupantList};
use crate::types::{GridId, OccupantId, TileBounds, TileCoord, Vec2};
use std::collections::{BTreeMap, BTreeSet};

/// One sparse grid.
#[derive(Clone, Debug, Default)]
struct GridTiles {
    floor: BTreeSet<TileCoord>,
    anchored: BTreeMap<TileCoord, Vec<OccupantId>>,
}

/// An occupant plus where it lives.
#[derive(Clone, Debug)]
pub struct OccupantRecord {
    pub position: TilePosition,
    pub body_type: BodyType,
    pub occupant: Occupant,
}

/// Sparse multi-grid tile world.
#[derive(Clone, Debug, Default)]
pub struct TileWorld {
    grids: BTreeMap<GridId, GridTiles>,
    occupants: BTreeMap<OccupantId, OccupantRecord>,
    next_occupant: u64,
}

impl TileWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty grid. Re-adding an existing grid keeps its contents.
    pub fn add_grid(&mut self, grid: GridId) -> GeometryEvent {
        self.grids.entry(grid).or_default();
        GeometryEvent::GridCreated {
            grid,
            bounds: self.grid_bounds(grid),
        }
    }

    /// Remove a grid and every occupant anchored to it.
    pub fn remove_grid(&mut self, grid: GridId) -> GeometryEvent {
        self.grids.remove(&grid);
        self.occupants.retain(|_, record| record.position.grid != grid);
        GeometryEvent::GridRemoved { grid }
    }

    pub fn has_grid(&self, grid: GridId) -> bool {
        self.grids.contains_key(&grid)
    }

    /// Set or clear floor on one tile. Returns `None` if the grid does not
    /// exist or the tile already had the requested state.
    pub fn set_floor(&mut self, grid: GridId, tile: TileCoord, floor: bool) -> Option<GeometryEvent> {
        let tiles = self.grids.get_mut(&grid)?;
        let changed = if floor {
            tiles.floor.insert(tile)
        } else {
            tiles.floor.remove(&tile)
        };
        changed.then_some(GeometryEvent::TileChanged { grid, tile })
    }

    /// Floor every tile in `bounds`. Returns one event per changed tile.
    pub fn fill_floor(&mut self, grid: GridId, bounds: TileBounds) -> Vec<GeometryEvent> {
        let mut events = Vec::new();
        for x in bounds.min.x..=bounds.max.x {
            for y in bounds.min.y..=bounds.max.y {
                if let Some(event) = self.set_floor(grid, TileCoord::new(x, y), true) {
                    events.push(event);
                }
            }
        }
        events
    }

    /// Anchor a new occupant to `tile`. Returns `None` if the grid does not
    /// exist.
    pub fn spawn(
        &mut self,
        grid: GridId,
        tile: TileCoord,
        body_type: BodyType,
        occupant: Occupant,
    ) -> Option<(OccupantId, GeometryEvent)> {
        let tiles = self.grids.get_mut(&grid)?;
        let id = OccupantId(self.next_occupant);
        self.next_occupant += 1;
        tiles.anchored.entry(tile).or_default().push(id);
        let position = TilePosition::new(grid, tile);
        self.occupants.insert(
            id,
            OccupantRecord {
                position,
                body_type,
                occupant,
            },
        );
        Some((
            id,
            GeometryEvent::Moved {
                from: None,
                to: Some(position),
                body_type,
            },
        ))
    }

    /// Delete an occupant and its tile handle.
    pub fn despawn(&mut self, id: OccupantId) -> Option<GeometryEvent> {
        let record = self.occupants.remove(&id)?;
        self.detach_handle(id, record.position);
        Some(GeometryEvent::Moved {
            from: Some(record.position),
            to: None,
            body_type: record.body_type,
        })
    }

    /// Delete an occupant's record but leave its handle in the tile index,
    /// as if the occupant were deleted while a query was in flight.
    pub fn orphan_occupant(&mut self, id: OccupantId) -> bool {
        self.occupants.remove(&id).is_some()
    }

    /// Move an occupant to another tile (possibly on another grid). Its
    /// transform shifts by the tile delta so its shapes follow it.
    pub fn move_to(&mut self, id: OccupantId, to: TilePosition) -> Option<GeometryEvent> {
        if !self.grids.contains_key(&to.grid) {
            return None;
        }
        let from = self.occupants.get(&id)?.position;
        self.detach_handle(id, from);
        if let Some(tiles) = self.grids.get_mut(&to.grid) {
            tiles.anchored.entry(to.tile).or_default().push(id);
        }
        let record = self.occupants.get_mut(&id)?;
        let delta = Vec2::new((to.tile.x - from.tile.x) as f32, (to.tile.y - from.tile.y) as f32);
        record.occupant.transform.position = record.occupant.transform.position + delta;
        record.position = to;
        Some(GeometryEvent::Moved {
            from: Some(from),
            to: Some(to),
            body_type: record.body_type,
        })
    }

    pub fn set_collidable(&mut self, id: OccupantId, collidable: bool) -> Option<GeometryEvent> {
        let record = self.occupants.get_mut(&id)?;
        record.occupant.collidable = collidable;
        Some(GeometryEvent::CollisionChanged {
            grid: record.position.grid,
            tile: record.position.tile,
        })
    }

    pub fn set_body_type(&mut self, id: OccupantId, body_type: BodyType) -> Option<GeometryEvent> {
        let record = self.occupants.get_mut(&id)?;
        let old = record.body_type;
        record.body_type = body_type;
        Some(GeometryEvent::BodyTypeChanged {
            grid: record.position.grid,
            tile: record.position.tile,
            old,
            new: body_type,
        })
    }

    pub fn record(&self, id: OccupantId) -> Option<&OccupantRecord> {
        self.occupants.get(&id)
    }

    /// Smallest tile rectangle covering every floored or occupied tile.
    pub fn grid_bounds(&self, grid: GridId) -> Option<TileBounds> {
        let tiles = self.grids.get(&grid)?;
        let mut all = tiles.floor.iter().chain(tiles.anchored.keys());
        let first = *all.next()?;
        let mut bounds = TileBounds::new(first, first);
        for &tile in all {
            bounds.include(tile);
        }
        Some(bounds)
    }

    fn detach_handle(&mut self, id: OccupantId, position: TilePosition) {
        if let Some(tiles) = self.grids.get_mut(&position.grid) {
            if let Some(handles) = tiles.anchored.get_mut(&position.tile) {
                handles.retain(|h| *h != id);
                if handles.is_empty() {
                    tiles.anchored.remove(&position.tile);
                }
            }
        }
    }
}

impl OccupancyProvider for TileWorld {
    fn grid_exists(&self, grid: GridId) -> bool {
        self.has_grid(grid)
    }

    fn is_tile_empty(&self, grid: GridId, tile: TileCoord) -> bool {
        self.grids
            .get(&grid)
            .is_none_or(|tiles| !tiles.floor.contains(&tile))
    }

    fn anchored_occupants(&self, grid: GridId, tile: TileCoord) -> OccupantList {
        let Some(handles) = self.grids.get(&grid).and_then(|t| t.anchored.get(&tile)) else {
            return OccupantList::new();
        };
        handles
            .iter()
            .copied()
            .filter(|id| {
                // Orphaned handles are passed through; the sampler skips
                // them when resolution fails.
                self.occupants
                    .get(id)
                    .is_none_or(|record| record.body_type.is_static())
            })
            .collect()
    }

    fn occupant(&self, id: OccupantId) -> Option<&Occupant> {
        self.occupants.get(&id).map(|record| &record.occupant)
    }
}
