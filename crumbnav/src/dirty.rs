// Dirty tracker: the debounced per-grid set of chunks awaiting rebuild.
//
// Marking is a set insertion and nothing else, so it is safe to call from
// any event handler at any point in the frame. Repeated marks of the same
// chunk collapse. The scheduler drains the whole set at once when its
// cooldown fires.
//
// See also: `navmesh.rs` which owns the tracker and drains it,
// `event.rs` for which geometry changes produce marks.
//
// **Critical constraint: determinism.** Grids and chunks are kept in
// `BTreeMap`/`BTreeSet`, so `drain()` yields chunks in a stable order and
// rebuild batches are reproducible.

use crate::types::{ChunkCoord, GridId, TileCoord};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
pub struct DirtyTracker {
    chunk_size: u32,
    grids: BTreeMap<GridId, BTreeSet<ChunkCoord>>,
}

impl DirtyTracker {
    pub fn new(chunk_size: u32) -> Self {
        Self {
            chunk_size,
            grids: BTreeMap::new(),
        }
    }

    /// Mark `chunk` of `grid` dirty. Returns true if it was not already.
    pub fn mark(&mut self, grid: GridId, chunk: ChunkCoord) -> bool {
        self.grids.entry(grid).or_default().insert(chunk)
    }

    /// Mark the chunk that owns `tile`.
    pub fn mark_tile(&mut self, grid: GridId, tile: TileCoord) -> bool {
        self.mark(grid, ChunkCoord::containing(tile, self.chunk_size))
    }

    pub fn is_dirty(&self, grid: GridId, chunk: ChunkCoord) -> bool {
        self.grids.get(&grid).is_some_and(|set| set.contains(&chunk))
    }

    /// Forget one mark, e.g. after a forced rebuild.
    pub fn unmark(&mut self, grid: GridId, chunk: ChunkCoord) -> bool {
        let Some(set) = self.grids.get_mut(&grid) else {
            return false;
        };
        let removed = set.remove(&chunk);
        if set.is_empty() {
            self.grids.remove(&grid);
        }
        removed
    }

    /// Drop every mark for `grid`. Returns how many were dropped.
    pub fn remove_grid(&mut self, grid: GridId) -> usize {
        self.grids.remove(&grid).map_or(0, |set| set.len())
    }

    /// Take every mark for every grid, leaving the tracker empty.
    pub fn drain(&mut self) -> Vec<(GridId, ChunkCoord)> {
        std::mem::take(&mut self.grids)
            .into_iter()
            .flat_map(|(grid, set)| set.into_iter().map(move |chunk| (grid, chunk)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Total dirty chunks across all grids.
    pub fn len(&self) -> usize {
        self.grids.values().map(BTreeSet::len).sum()
    }
}
