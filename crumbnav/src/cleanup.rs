// Cleanup / pruner: separates interior cells from boundary candidates.
//
// Each pass reads a snapshot of the chunk taken at the start of the pass
// and writes into the live array, so the outcome never depends on scan
// order. For every surviving cell strictly inside the sample array, the
// four cardinal neighbors are tested for equivalence (same space status,
// same aggregated layer and mask) and the cell is classified by which
// neighbors matched:
//
//   none               -> dropped (isolated noise, collision or not)
//   one, or W+E / S+N  -> kept as boundary if it carries collision bits,
//                         otherwise dropped (thin empty noise)
//   all four           -> INTERIOR
//   anything else      -> kept as boundary (INTERIOR cleared)
//
// Cells on the outermost ring of the chunk's own footprint never keep
// INTERIOR: neighboring chunks are not consulted, so the ring cannot be
// proven enclosed.
//
// Passes stop early once one changes nothing. If the pass budget runs out
// while cells were still being dropped, a final settle step clears any
// INTERIOR flag whose neighbors no longer all match, so the interior
// invariant holds on return either way.
//
// See also: `sampler.rs` which produces the input, `trace.rs` which walks
// the surviving boundary cells.

use crate::breadcrumb::{Breadcrumb, BreadcrumbFlags};
use crate::chunk::NavChunk;
use crate::types::{Direction, SampleCoord};
use log::trace;

const WEST_EAST: u8 = Direction::West.bit() | Direction::East.bit();
const SOUTH_NORTH: u8 = Direction::South.bit() | Direction::North.bit();
const ALL_FOUR: u8 = 0b1111;

/// What a pass decided for one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
    Drop,
    Boundary,
    Interior,
}

/// Bitmask of the cardinal neighbors of `coord` equivalent to `cell`,
/// read from `cells`. Dropped or out-of-range neighbors never match.
fn equivalent_neighbors(chunk: &NavChunk, cells: &[Option<Breadcrumb>], cell: &Breadcrumb) -> u8 {
    let mut bits = 0;
    for dir in Direction::ALL {
        let matched = chunk
            .index(cell.coord.step(dir))
            .and_then(|i| cells[i].as_ref())
            .is_some_and(|neighbor| cell.equivalent(neighbor));
        if matched {
            bits |= dir.bit();
        }
    }
    bits
}

fn classify(cell: &Breadcrumb, neighbors: u8) -> Verdict {
    match neighbors {
        0 => Verdict::Drop,
        ALL_FOUR => Verdict::Interior,
        n if n.count_ones() == 1 || n == WEST_EAST || n == SOUTH_NORTH => {
            if cell.has_collision() {
                Verdict::Boundary
            } else {
                Verdict::Drop
            }
        }
        _ => Verdict::Boundary,
    }
}

/// Apply `verdict` (and the own-ring rule) to a copy of `cell`.
fn resolve(chunk: &NavChunk, cell: &Breadcrumb, verdict: Verdict) -> Option<Breadcrumb> {
    let mut out = *cell;
    match verdict {
        Verdict::Drop => return None,
        Verdict::Boundary => out.flags.remove(BreadcrumbFlags::INTERIOR),
        Verdict::Interior => out.flags.insert(BreadcrumbFlags::INTERIOR),
    }
    if chunk.on_own_ring(cell.coord) {
        out.flags.remove(BreadcrumbFlags::INTERIOR);
    }
    Some(out)
}

/// Run one pass. Returns the number of cells that changed.
fn run_pass(chunk: &mut NavChunk) -> usize {
    let snapshot = chunk.cells().to_vec();
    let n = chunk.samples_per_axis() as i32;
    let mut changed = 0;

    for y in 1..n - 1 {
        for x in 1..n - 1 {
            let coord = SampleCoord::new(x, y);
            let Some(i) = chunk.index(coord) else {
                continue;
            };
            let Some(cell) = snapshot[i] else {
                continue;
            };
            let neighbors = equivalent_neighbors(chunk, &snapshot, &cell);
            let next = resolve(chunk, &cell, classify(&cell, neighbors));
            if next != snapshot[i] {
                chunk.cells_mut()[i] = next;
                changed += 1;
            }
        }
    }
    changed
}

/// Clear INTERIOR from any cell that lost an equivalent neighbor after it
/// was classified.
fn settle_interior(chunk: &mut NavChunk) -> usize {
    let snapshot = chunk.cells().to_vec();
    let mut cleared = 0;
    for (i, slot) in snapshot.iter().enumerate() {
        let Some(cell) = slot else {
            continue;
        };
        if cell.is_interior() && equivalent_neighbors(chunk, &snapshot, cell) != ALL_FOUR {
            if let Some(live) = chunk.cells_mut()[i].as_mut() {
                live.flags.remove(BreadcrumbFlags::INTERIOR);
                cleared += 1;
            }
        }
    }
    cleared
}

/// Clean `chunk` in place with at most `max_passes` passes. Returns the
/// number of passes actually run.
pub fn clean(chunk: &mut NavChunk, max_passes: u32) -> u32 {
    let mut passes = 0;
    let mut settled = false;
    while passes < max_passes {
        passes += 1;
        let changed = run_pass(chunk);
        trace!(
            "cleanup {} pass {passes}: {changed} cells changed",
            chunk.coord
        );
        if changed == 0 {
            settled = true;
            break;
        }
    }
    if !settled {
        let cleared = settle_interior(chunk);
        if cleared > 0 {
            trace!(
                "cleanup {}: pass budget exhausted, cleared {cleared} stale interior flags",
                chunk.coord
            );
        }
    }
    debug_assert!(
        chunk
            .breadcrumbs()
            .all(|c| !c.is_interior() || !chunk.on_own_ring(c.coord)),
        "interior cell on the own ring of {}",
        chunk.coord
    );
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavMeshConfig;
    use crate::types::ChunkCoord;

    /// A tiny config: 2 tiles per chunk, 1 tile margin, 2 sub-steps.
    /// Samples per axis = (2 + 2) * 2 = 8; own window = 2..6.
    fn small_config() -> NavMeshConfig {
        NavMeshConfig {
            chunk_size: 2,
            expansion: 1,
            sub_step: 2,
            ..NavMeshConfig::default()
        }
    }

    fn space_chunk(config: &NavMeshConfig) -> NavChunk {
        let mut chunk = NavChunk::blank(ChunkCoord::new(0, 0), config);
        let n = config.samples_per_axis() as i32;
        for y in 0..n {
            for x in 0..n {
                let coord = SampleCoord::new(x, y);
                let border = !chunk.in_own_window(coord);
                if let Some(cell) = chunk.get_mut(coord) {
                    cell.flags.insert(BreadcrumbFlags::SPACE);
                    cell.flags.set(BreadcrumbFlags::IS_BORDER, border);
                }
            }
        }
        chunk
    }

    fn solid(chunk: &mut NavChunk, coord: SampleCoord, layer: u32) {
        if let Some(cell) = chunk.get_mut(coord) {
            cell.flags.remove(BreadcrumbFlags::SPACE);
            cell.collision_layer = layer;
        }
    }

    #[test]
    fn classify_table() {
        let empty = Breadcrumb::new(SampleCoord::new(1, 1));
        let mut wall = empty;
        wall.collision_layer = 2;

        assert_eq!(classify(&wall, 0), Verdict::Drop);
        assert_eq!(classify(&empty, 0), Verdict::Drop);
        assert_eq!(classify(&wall, Direction::North.bit()), Verdict::Boundary);
        assert_eq!(classify(&empty, Direction::North.bit()), Verdict::Drop);
        assert_eq!(classify(&wall, WEST_EAST), Verdict::Boundary);
        assert_eq!(classify(&empty, SOUTH_NORTH), Verdict::Drop);
        assert_eq!(classify(&empty, ALL_FOUR), Verdict::Interior);
        let l_shape = Direction::West.bit() | Direction::North.bit();
        assert_eq!(classify(&empty, l_shape), Verdict::Boundary);
        let three = ALL_FOUR & !Direction::East.bit();
        assert_eq!(classify(&empty, three), Verdict::Boundary);
    }

    #[test]
    fn uniform_space_becomes_interior_except_own_ring() {
        let config = small_config();
        let mut chunk = space_chunk(&config);
        clean(&mut chunk, config.cleanup_passes);

        for y in 0..8 {
            for x in 0..8 {
                let coord = SampleCoord::new(x, y);
                let cell = chunk.get(coord).unwrap();
                let array_edge = x == 0 || y == 0 || x == 7 || y == 7;
                let expected = !array_edge && !chunk.on_own_ring(coord);
                assert_eq!(cell.is_interior(), expected, "at {coord}");
            }
        }
    }

    #[test]
    fn isolated_wall_cell_is_dropped() {
        let config = small_config();
        let mut chunk = space_chunk(&config);
        let lone = SampleCoord::new(3, 3);
        solid(&mut chunk, lone, 2);
        clean(&mut chunk, config.cleanup_passes);
        assert!(chunk.get(lone).is_none());
    }

    #[test]
    fn wall_line_is_kept_as_boundary() {
        let config = small_config();
        let mut chunk = space_chunk(&config);
        for x in 1..7 {
            solid(&mut chunk, SampleCoord::new(x, 4), 2);
        }
        clean(&mut chunk, config.cleanup_passes);
        for x in 2..6 {
            let cell = chunk.get(SampleCoord::new(x, 4)).unwrap();
            assert!(!cell.is_interior());
            assert!(cell.has_collision());
        }
    }

    #[test]
    fn thin_empty_corridor_is_dropped() {
        let config = small_config();
        let mut chunk = NavChunk::blank(ChunkCoord::new(0, 0), &config);
        // Everything solid except a one-cell-wide empty column at x = 4.
        for y in 0..8 {
            for x in 0..8 {
                let coord = SampleCoord::new(x, y);
                if x == 4 {
                    if let Some(cell) = chunk.get_mut(coord) {
                        cell.flags.insert(BreadcrumbFlags::SPACE);
                    }
                } else {
                    solid(&mut chunk, coord, 2);
                }
            }
        }
        clean(&mut chunk, config.cleanup_passes);
        for y in 1..7 {
            assert!(chunk.get(SampleCoord::new(4, y)).is_none(), "y = {y}");
        }
    }

    #[test]
    fn short_wall_stub_survives() {
        let config = small_config();
        let mut chunk = space_chunk(&config);
        // Each end of a two-cell stub has exactly one equivalent neighbor
        // and carries collision, so both are kept.
        solid(&mut chunk, SampleCoord::new(3, 3), 2);
        solid(&mut chunk, SampleCoord::new(3, 4), 2);
        let passes = clean(&mut chunk, 3);
        assert!(chunk.get(SampleCoord::new(3, 3)).is_some());
        assert!(chunk.get(SampleCoord::new(3, 4)).is_some());
        // Pass 1 reclassifies, pass 2 observes no change.
        assert_eq!(passes, 2);
    }

    #[test]
    fn stops_early_when_nothing_changes() {
        let config = small_config();
        let mut chunk = space_chunk(&config);
        clean(&mut chunk, 3);
        let before = chunk.clone();
        assert_eq!(clean(&mut chunk, 3), 1);
        assert_eq!(before, chunk);
    }

    #[test]
    fn result_is_independent_of_scan_order() {
        // A pass reads only the snapshot, so cleaning a mirrored input
        // yields the mirrored output.
        let config = small_config();
        let mut a = space_chunk(&config);
        let mut b = space_chunk(&config);
        let pattern = [(2, 2), (3, 2), (4, 2), (3, 3), (5, 5)];
        for &(x, y) in &pattern {
            solid(&mut a, SampleCoord::new(x, y), 2);
            solid(&mut b, SampleCoord::new(7 - x, y), 2);
        }
        clean(&mut a, 3);
        clean(&mut b, 3);
        for y in 0..8 {
            for x in 0..8 {
                let left = a.get(SampleCoord::new(x, y)).map(|c| (c.flags, c.collision_layer));
                let right = b
                    .get(SampleCoord::new(7 - x, y))
                    .map(|c| (c.flags, c.collision_layer));
                assert_eq!(left, right, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn interior_invariant_holds_with_single_pass() {
        let config = small_config();
        let mut chunk = space_chunk(&config);
        // An empty dead end at (3, 4) hangs off (3, 3). Pass 1 marks (3, 3)
        // INTERIOR and drops the dead end in the same pass, leaving the
        // flag stale until it is settled.
        for coord in [(2, 4), (4, 4), (3, 5)] {
            solid(&mut chunk, SampleCoord::new(coord.0, coord.1), 2);
        }
        assert_eq!(clean(&mut chunk, 1), 1);
        assert!(chunk.get(SampleCoord::new(3, 4)).is_none());
        assert!(!chunk.get(SampleCoord::new(3, 3)).unwrap().is_interior());
        for cell in chunk.breadcrumbs() {
            if cell.is_interior() {
                assert_eq!(equivalent_neighbors(&chunk, chunk.cells(), cell), ALL_FOUR);
                assert!(!chunk.on_own_ring(cell.coord));
            }
        }
    }
}
