// Chunk sampler: occupancy -> breadcrumb array.
//
// For one chunk, walks every tile of the footprint plus the expansion
// margin, splits each tile into `sub_step x sub_step` sub-cells, and records
// per sub-cell:
//
//   1. `SPACE` if the tile is empty and no shape covers the sub-cell centre,
//   2. `IS_BORDER` if the tile lies in the expansion margin,
//   3. the OR of collision layer/mask over every relevant shape that
//      contains the sub-cell centre.
//
// Relevant occupants are hard, collidable, and have a layer or mask bit in
// `relevant_layers`. Each candidate shape is tested with its local AABB
// first and with the exact point test only when the box passes. Sub-cell
// centres are mapped into each occupant's local space through its
// `Transform2` before testing.
//
// Handles that fail to resolve are skipped. A sampling pass never fails.
//
// See also: `cleanup.rs` which consumes the sampled chunk, `occupancy.rs`
// for the provider trait and shape tests.
//
// **Critical constraint: determinism.** Masks are combined with OR, so the
// result does not depend on occupant or shape order. Sampling unchanged
// occupancy twice yields identical arrays.

use crate::breadcrumb::{Breadcrumb, BreadcrumbFlags};
use crate::chunk::NavChunk;
use crate::config::NavMeshConfig;
use crate::occupancy::{Aabb, OccupancyProvider, Occupant, Shape};
use crate::types::{ChunkCoord, GridId, SampleCoord, TileCoord, Vec2};
use smallvec::SmallVec;

/// A relevant occupant with its shapes' bounding boxes precomputed.
struct Candidate<'a> {
    occupant: &'a Occupant,
    shapes: SmallVec<[(Aabb, &'a Shape); 2]>,
}

impl Candidate<'_> {
    /// Collision bits this occupant contributes at `point` (grid space).
    fn contribution(&self, point: Vec2) -> Option<(u32, u32)> {
        let local = self.occupant.transform.to_local(point);
        let hit = self
            .shapes
            .iter()
            .any(|(aabb, shape)| aabb.contains(local) && shape.contains_local(local));
        hit.then_some((self.occupant.collision_layer, self.occupant.collision_mask))
    }
}

/// Samples chunks against an injected occupancy provider.
pub struct Sampler<'a, P: OccupancyProvider + ?Sized> {
    provider: &'a P,
    config: &'a NavMeshConfig,
}

impl<'a, P: OccupancyProvider + ?Sized> Sampler<'a, P> {
    pub fn new(provider: &'a P, config: &'a NavMeshConfig) -> Self {
        Self { provider, config }
    }

    /// Build the raw (uncleaned) breadcrumb array for `chunk` on `grid`.
    pub fn sample(&self, grid: GridId, chunk: ChunkCoord) -> NavChunk {
        let config = self.config;
        let mut out = NavChunk::blank(chunk, config);
        let origin = chunk.origin_tile(config.chunk_size);
        let expansion = config.expansion as i32;
        let own_tiles = expansion..expansion + config.chunk_size as i32;

        for ty in 0..config.tiles_per_axis() as i32 {
            for tx in 0..config.tiles_per_axis() as i32 {
                let tile = TileCoord::new(origin.x - expansion + tx, origin.y - expansion + ty);
                let border = !own_tiles.contains(&tx) || !own_tiles.contains(&ty);
                self.sample_tile(grid, tile, (tx, ty), border, &mut out);
            }
        }
        out
    }

    fn sample_tile(
        &self,
        grid: GridId,
        tile: TileCoord,
        (tx, ty): (i32, i32),
        border: bool,
        out: &mut NavChunk,
    ) {
        let step = self.config.sub_step as i32;
        let empty = self.provider.is_tile_empty(grid, tile);
        let candidates = self.candidates(grid, tile);

        for sy in 0..step {
            for sx in 0..step {
                let coord = SampleCoord::new(tx * step + sx, ty * step + sy);
                let center = Vec2::new(
                    tile.x as f32 + (sx as f32 + 0.5) / step as f32,
                    tile.y as f32 + (sy as f32 + 0.5) / step as f32,
                );

                let mut crumb = Breadcrumb::new(coord);
                for candidate in &candidates {
                    if let Some((layer, mask)) = candidate.contribution(center) {
                        crumb.collision_layer |= layer;
                        crumb.collision_mask |= mask;
                    }
                }
                crumb
                    .flags
                    .set(BreadcrumbFlags::SPACE, empty && !crumb.has_collision());
                crumb.flags.set(BreadcrumbFlags::IS_BORDER, border);

                debug_assert!(
                    !crumb.is_space() || !crumb.has_collision(),
                    "space cell {coord} carries collision bits"
                );
                out.set(coord, Some(crumb));
            }
        }
    }

    /// Resolve and filter the occupants anchored to `tile`.
    fn candidates(&self, grid: GridId, tile: TileCoord) -> SmallVec<[Candidate<'a>; 4]> {
        let provider: &'a P = self.provider;
        provider
            .anchored_occupants(grid, tile)
            .into_iter()
            .filter_map(|id| provider.occupant(id))
            .filter(|occupant| occupant.is_relevant(self.config.relevant_layers))
            .map(|occupant| Candidate {
                occupant,
                shapes: occupant
                    .shapes
                    .iter()
                    .map(|shape| (shape.local_aabb(), shape))
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BodyType;
    use crate::occupancy::Transform2;
    use crate::types::{TileBounds, collision_group};
    use crate::world::TileWorld;

    const GRID: GridId = GridId(1);

    fn floored_world() -> TileWorld {
        let mut world = TileWorld::new();
        world.add_grid(GRID);
        world.fill_floor(
            GRID,
            TileBounds::new(TileCoord::new(-2, -2), TileCoord::new(10, 10)),
        );
        world
    }

    fn wall(tile: TileCoord) -> Occupant {
        Occupant::solid(
            collision_group::IMPASSABLE,
            collision_group::MID_IMPASSABLE,
            Transform2::at(Vec2::new(tile.x as f32, tile.y as f32)),
            Shape::unit_tile(),
        )
    }

    #[test]
    fn sample_array_has_configured_size() {
        let world = TileWorld::new();
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        let n = (config.chunk_size + 2 * config.expansion) * config.sub_step;
        assert_eq!(chunk.samples_per_axis(), n);
        assert_eq!(chunk.cells().len(), (n * n) as usize);
        assert!(chunk.cells().iter().all(Option::is_some));
    }

    #[test]
    fn empty_tiles_sample_as_space() {
        let world = TileWorld::new();
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        assert!(chunk.breadcrumbs().all(|c| c.is_space() && !c.has_collision()));
    }

    #[test]
    fn floored_tiles_are_not_space() {
        let world = floored_world();
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        assert!(chunk.breadcrumbs().all(|c| !c.is_space()));
    }

    #[test]
    fn border_flag_marks_expansion_margin() {
        let world = TileWorld::new();
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        for crumb in chunk.breadcrumbs() {
            assert_eq!(crumb.is_border(), !chunk.in_own_window(crumb.coord));
        }
    }

    #[test]
    fn wall_fills_its_sub_cells() {
        let mut world = floored_world();
        let tile = TileCoord::new(3, 3);
        world.spawn(GRID, tile, BodyType::Static, wall(tile));
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));

        // Tile 3 of the footprint starts at local sample (1 + 3) * 4 = 16.
        for x in 0..40 {
            for y in 0..40 {
                let crumb = chunk.get(SampleCoord::new(x, y)).unwrap();
                let inside = (16..20).contains(&x) && (16..20).contains(&y);
                assert_eq!(crumb.has_collision(), inside, "at ({x}, {y})");
                if inside {
                    assert_eq!(crumb.collision_layer, collision_group::IMPASSABLE);
                    assert_eq!(crumb.collision_mask, collision_group::MID_IMPASSABLE);
                }
            }
        }
    }

    #[test]
    fn overlapping_shapes_or_their_masks() {
        let mut world = floored_world();
        let tile = TileCoord::new(2, 2);
        world.spawn(GRID, tile, BodyType::Static, wall(tile));
        let mut low = wall(tile);
        low.collision_layer = collision_group::LOW_IMPASSABLE;
        low.collision_mask = 0;
        low.shapes[0] = Shape::Rect {
            center: Vec2::new(0.25, 0.5),
            half_extents: Vec2::new(0.25, 0.5),
        };
        world.spawn(GRID, tile, BodyType::Static, low);

        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        // Left half of the tile (local x 12, 13) sees both occupants.
        let left = chunk.get(SampleCoord::new(12, 12)).unwrap();
        assert_eq!(
            left.collision_layer,
            collision_group::IMPASSABLE | collision_group::LOW_IMPASSABLE
        );
        let right = chunk.get(SampleCoord::new(15, 12)).unwrap();
        assert_eq!(right.collision_layer, collision_group::IMPASSABLE);
    }

    #[test]
    fn irrelevant_occupants_are_ignored() {
        let mut world = floored_world();
        let tile = TileCoord::new(1, 1);
        let mut decal = wall(tile);
        decal.collision_layer = collision_group::OPAQUE;
        decal.collision_mask = 0;
        world.spawn(GRID, tile, BodyType::Static, decal);
        let mut sensor = wall(tile);
        sensor.hard = false;
        world.spawn(GRID, tile, BodyType::Static, sensor);

        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        assert!(chunk.breadcrumbs().all(|c| !c.has_collision()));
    }

    #[test]
    fn occupant_on_empty_tile_clears_space() {
        let mut world = TileWorld::new();
        world.add_grid(GRID);
        let tile = TileCoord::new(0, 0);
        world.spawn(GRID, tile, BodyType::Static, wall(tile));
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        let covered = chunk.get(SampleCoord::new(5, 5)).unwrap();
        assert!(covered.has_collision());
        assert!(!covered.is_space());
        for crumb in chunk.breadcrumbs() {
            assert!(!(crumb.is_space() && crumb.has_collision()));
        }
    }

    #[test]
    fn unresolvable_occupant_is_skipped() {
        let mut world = floored_world();
        let tile = TileCoord::new(4, 4);
        let (id, _) = world.spawn(GRID, tile, BodyType::Static, wall(tile)).unwrap();
        world.orphan_occupant(id);
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));
        assert!(chunk.breadcrumbs().all(|c| !c.has_collision()));
    }

    #[test]
    fn rotated_occupant_uses_local_space() {
        let mut world = floored_world();
        let tile = TileCoord::new(4, 4);
        // A bar along local +x, rotated a quarter turn so it runs north from
        // the tile centre: covers |dx| <= 0.2, 0 <= dy <= 0.5.
        let bar = Occupant::solid(
            collision_group::IMPASSABLE,
            0,
            Transform2 {
                position: Vec2::new(4.5, 4.5),
                rotation: std::f32::consts::FRAC_PI_2,
            },
            Shape::Rect {
                center: Vec2::new(0.25, 0.0),
                half_extents: Vec2::new(0.25, 0.2),
            },
        );
        world.spawn(GRID, tile, BodyType::Static, bar);
        let config = NavMeshConfig::default();
        let chunk = Sampler::new(&world, &config).sample(GRID, ChunkCoord::new(0, 0));

        // Tile 4 spans local samples 20..24 on both axes.
        let hit: Vec<_> = chunk
            .breadcrumbs()
            .filter(|c| c.has_collision())
            .map(|c| c.coord)
            .collect();
        assert_eq!(
            hit,
            vec![
                SampleCoord::new(21, 22),
                SampleCoord::new(22, 22),
                SampleCoord::new(21, 23),
                SampleCoord::new(22, 23),
            ]
        );
    }

    #[test]
    fn sampling_is_deterministic() {
        let mut world = floored_world();
        for i in 0..5 {
            let tile = TileCoord::new(i, 7 - i);
            world.spawn(GRID, tile, BodyType::Static, wall(tile));
        }
        let config = NavMeshConfig::default();
        let sampler = Sampler::new(&world, &config);
        let a = sampler.sample(GRID, ChunkCoord::new(0, 0));
        let b = sampler.sample(GRID, ChunkCoord::new(0, 0));
        assert_eq!(a, b);
    }
}
