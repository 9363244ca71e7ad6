// Chunks and the chunk store.
//
// A `NavChunk` is the dense sample array for one chunk of one grid:
// `samples_per_axis^2` cells stored row-major (`index = x + y * n`), each
// either a `Breadcrumb` or `None` once cleanup has dropped it. The chunk
// also keeps the boundary edges produced by its most recent trace.
//
// A chunk is never partially valid: the sampler builds a fresh `NavChunk`
// and the store replaces the old one wholesale.
//
// `ChunkStore` maps grid -> chunk coordinate -> chunk. Grids are registered
// on creation and dropped (with all their chunks) on removal.
//
// See also: `sampler.rs` which builds chunks, `navmesh.rs` which owns the
// store, `config.rs` for the sample-array geometry.

use crate::breadcrumb::Breadcrumb;
use crate::config::NavMeshConfig;
use crate::types::{ChunkCoord, GridId, GridSampleCoord, SampleCoord, TileCoord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One traced boundary contour: an ordered run of 4-connected cells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub points: Vec<SampleCoord>,
}

impl Edge {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Cell counts by classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStats {
    pub interior: usize,
    pub boundary: usize,
    pub dropped: usize,
    pub space: usize,
}

/// The sampled, cleaned, traced state of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct NavChunk {
    pub coord: ChunkCoord,
    /// Tile at the lower-left of the chunk's own footprint.
    pub origin: TileCoord,
    samples_per_axis: u32,
    sub_step: u32,
    expansion: u32,
    own_start: i32,
    own_end: i32,
    cells: Vec<Option<Breadcrumb>>,
    edges: Vec<Edge>,
}

impl NavChunk {
    /// A chunk whose every cell holds a blank breadcrumb at its coordinate.
    pub fn blank(coord: ChunkCoord, config: &NavMeshConfig) -> Self {
        let n = config.samples_per_axis() as i32;
        let own = config.own_window();
        let mut cells = Vec::with_capacity((n * n) as usize);
        for y in 0..n {
            for x in 0..n {
                cells.push(Some(Breadcrumb::new(SampleCoord::new(x, y))));
            }
        }
        Self {
            coord,
            origin: coord.origin_tile(config.chunk_size),
            samples_per_axis: n as u32,
            sub_step: config.sub_step,
            expansion: config.expansion,
            own_start: own.start,
            own_end: own.end,
            cells,
            edges: Vec::new(),
        }
    }

    pub fn samples_per_axis(&self) -> u32 {
        self.samples_per_axis
    }

    pub fn sub_step(&self) -> u32 {
        self.sub_step
    }

    /// Flat index of `coord`, or `None` if it is outside the sample array.
    pub fn index(&self, coord: SampleCoord) -> Option<usize> {
        let n = self.samples_per_axis as i32;
        if coord.x < 0 || coord.y < 0 || coord.x >= n || coord.y >= n {
            return None;
        }
        Some((coord.x + coord.y * n) as usize)
    }

    /// The cell at `coord`. `None` for dropped cells and out-of-range
    /// coordinates alike.
    pub fn get(&self, coord: SampleCoord) -> Option<&Breadcrumb> {
        self.index(coord).and_then(|i| self.cells[i].as_ref())
    }

    pub fn set(&mut self, coord: SampleCoord, cell: Option<Breadcrumb>) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = cell;
        }
    }

    pub fn get_mut(&mut self, coord: SampleCoord) -> Option<&mut Breadcrumb> {
        let i = self.index(coord)?;
        self.cells[i].as_mut()
    }

    /// Raw cell array, row-major.
    pub fn cells(&self) -> &[Option<Breadcrumb>] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Option<Breadcrumb>] {
        &mut self.cells
    }

    /// Every cell that survived cleanup.
    pub fn breadcrumbs(&self) -> impl Iterator<Item = &Breadcrumb> + '_ {
        self.cells.iter().flatten()
    }

    /// Whether `coord` lies inside the chunk's own footprint.
    pub fn in_own_window(&self, coord: SampleCoord) -> bool {
        let own = self.own_start..self.own_end;
        own.contains(&coord.x) && own.contains(&coord.y)
    }

    /// Whether `coord` lies on the outermost ring of the own footprint.
    pub fn on_own_ring(&self, coord: SampleCoord) -> bool {
        self.in_own_window(coord)
            && (coord.x == self.own_start
                || coord.y == self.own_start
                || coord.x == self.own_end - 1
                || coord.y == self.own_end - 1)
    }

    /// Convert a local sample coordinate to grid-wide sample space.
    pub fn to_grid_sample(&self, coord: SampleCoord) -> GridSampleCoord {
        let step = self.sub_step as i32;
        let margin = (self.expansion * self.sub_step) as i32;
        GridSampleCoord::new(
            self.origin.x * step - margin + coord.x,
            self.origin.y * step - margin + coord.y,
        )
    }

    /// Convert a grid-wide sample coordinate to this chunk's local space.
    /// The result may fall outside the sample array.
    pub fn to_local_sample(&self, coord: GridSampleCoord) -> SampleCoord {
        let step = self.sub_step as i32;
        let margin = (self.expansion * self.sub_step) as i32;
        SampleCoord::new(
            coord.x - self.origin.x * step + margin,
            coord.y - self.origin.y * step + margin,
        )
    }

    /// Boundary edges from the most recent trace.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
    }

    pub fn stats(&self) -> ChunkStats {
        let mut stats = ChunkStats::default();
        for cell in &self.cells {
            match cell {
                None => stats.dropped += 1,
                Some(crumb) => {
                    if crumb.is_interior() {
                        stats.interior += 1;
                    } else {
                        stats.boundary += 1;
                    }
                    if crumb.is_space() {
                        stats.space += 1;
                    }
                }
            }
        }
        stats
    }
}

/// Every chunk of every grid.
#[derive(Clone, Debug, Default)]
pub struct ChunkStore {
    grids: BTreeMap<GridId, BTreeMap<ChunkCoord, NavChunk>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_grid(&mut self, grid: GridId) {
        self.grids.entry(grid).or_default();
    }

    /// Drop a grid and all of its chunks. Returns how many chunks went.
    pub fn remove_grid(&mut self, grid: GridId) -> usize {
        self.grids.remove(&grid).map_or(0, |chunks| chunks.len())
    }

    pub fn has_grid(&self, grid: GridId) -> bool {
        self.grids.contains_key(&grid)
    }

    pub fn get(&self, grid: GridId, coord: ChunkCoord) -> Option<&NavChunk> {
        self.grids.get(&grid)?.get(&coord)
    }

    /// Store a rebuilt chunk, registering the grid if needed and replacing
    /// any previous version.
    pub fn insert(&mut self, grid: GridId, chunk: NavChunk) {
        self.grids.entry(grid).or_default().insert(chunk.coord, chunk);
    }

    /// Every (grid, chunk) pair, in order.
    pub fn iter(&self) -> impl Iterator<Item = (GridId, &NavChunk)> + '_ {
        self.grids
            .iter()
            .flat_map(|(grid, chunks)| chunks.values().map(move |chunk| (*grid, chunk)))
    }

    pub fn chunk_count(&self) -> usize {
        self.grids.values().map(BTreeMap::len).sum()
    }

    /// Look up the breadcrumb at a grid-wide sample coordinate. Only the
    /// owning chunk's own footprint is consulted, never another chunk's
    /// expansion margin.
    pub fn breadcrumb(
        &self,
        grid: GridId,
        coord: GridSampleCoord,
        config: &NavMeshConfig,
    ) -> Option<&Breadcrumb> {
        let tile = coord.tile(config.sub_step);
        let chunk = self.get(grid, ChunkCoord::containing(tile, config.chunk_size))?;
        chunk.get(chunk.to_local_sample(coord))
    }
}
