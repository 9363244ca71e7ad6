// crumbnav — incremental breadcrumb navmesh builder for tile grids.
//
// This crate turns the static collision geometry of one or more infinite
// tile grids into per-chunk breadcrumb arrays and traced boundary edges,
// and keeps them current as geometry changes. Changes are debounced per
// chunk and rebuilt in batches on a cooldown. It has no engine dependencies:
// hosts implement `OccupancyProvider` and forward `GeometryEvent`s.
//
// Module overview:
// - `navmesh.rs`:    NavMeshSystem: event handling, cooldown scheduler, queries.
// - `sampler.rs`:    Samples tile emptiness and occupant shapes into a chunk.
// - `cleanup.rs`:    Neighbor-equivalence passes: interior / boundary / dropped.
// - `trace.rs`:      Walks boundary cells into ordered edges.
// - `chunk.rs`:      NavChunk (dense cell array + edges) and ChunkStore.
// - `dirty.rs`:      Per-grid dirty chunk sets.
// - `breadcrumb.rs`: Breadcrumb cell and its flag set.
// - `occupancy.rs`:  OccupancyProvider trait, occupants, shapes, transforms.
// - `world.rs`:      TileWorld, an in-memory OccupancyProvider.
// - `event.rs`:      GeometryEvent and body types.
// - `debug.rs`:      Debug subscriber queues and chunk debug messages.
// - `config.rs`:     NavMeshConfig, all tunable parameters.
// - `types.rs`:      Coordinates, IDs, directions, Vec2, collision groups.
//
// Polygonization of the traced edges (collinear merging, loop closing,
// triangulation) is not part of this crate.
//
// **Critical constraint: determinism.** Rebuilding a chunk is a pure
// function of occupancy state. No `HashMap`, no system time; ordered
// collections throughout.

pub mod breadcrumb;
pub mod chunk;
pub mod cleanup;
pub mod config;
pub mod debug;
pub mod dirty;
pub mod event;
pub mod navmesh;
pub mod occupancy;
pub mod sampler;
pub mod trace;
pub mod types;
pub mod world;

pub use config::{ConfigError, NavMeshConfig};
pub use navmesh::{ChunkState, NavMeshSystem, RebuildReport};
pub use world::TileWorld;
