// Boundary tracer: walks the cells cleanup left as boundary candidates
// into ordered edges.
//
// The working set is every surviving, non-interior cell inside the chunk's
// own footprint. Expansion-margin cells exist only to give cleanup context
// at the chunk border; they are never traced, so the partition covers
// exactly the own-footprint boundary cells.
//
// While the working set is non-empty, the lowest remaining coordinate
// (x-major, see `SampleCoord`'s `Ord`) starts a new edge. The edge grows by
// probing west, south, east, north in that order, skipping the direction
// that would step straight back, and taking the first neighbor that is
// still in the working set. It ends when no probe qualifies. Every taken
// cell leaves the working set, so each boundary cell lands in exactly one
// edge.
//
// Edges are raw cell runs: no collinear merging and no closed-loop
// detection. Polygon construction is a separate, not yet implemented stage.
//
// See also: `cleanup.rs` which decides which cells are boundary,
// `chunk.rs` where the edges are stored alongside the cells.

use crate::chunk::{Edge, NavChunk};
use crate::types::{Direction, SampleCoord};
use std::collections::BTreeSet;

/// Trace every boundary edge of `chunk`.
pub fn trace_edges(chunk: &NavChunk) -> Vec<Edge> {
    let mut open: BTreeSet<SampleCoord> = chunk
        .breadcrumbs()
        .filter(|cell| !cell.is_interior() && chunk.in_own_window(cell.coord))
        .map(|cell| cell.coord)
        .collect();

    let mut edges = Vec::new();
    while let Some(start) = open.pop_first() {
        let mut points = vec![start];
        let mut current = start;
        let mut heading = None;
        while let Some((dir, next)) = next_step(chunk, &open, current, heading) {
            open.remove(&next);
            points.push(next);
            current = next;
            heading = Some(dir);
        }
        edges.push(Edge { points });
    }
    edges
}

fn next_step(
    chunk: &NavChunk,
    open: &BTreeSet<SampleCoord>,
    current: SampleCoord,
    heading: Option<Direction>,
) -> Option<(Direction, SampleCoord)> {
    Direction::ALL
        .into_iter()
        .filter(|dir| heading.is_none_or(|h| *dir != h.opposite()))
        .map(|dir| (dir, current.step(dir)))
        .find(|(_, next)| chunk.in_own_window(*next) && open.contains(next))
}
