// The navmesh service: chunk store, dirty tracking and the rebuild
// scheduler behind one owning object.
//
// `NavMeshSystem` is the single owner of every piece of mutable navmesh
// state. Hosts feed it geometry events, advance it with frame time, and
// query it; the occupancy provider is passed in per call rather than held,
// so the system never outlives or aliases the world it reads.
//
// ## Chunk lifecycle
//
//   Unbuilt --mark--> Dirty --cooldown--> Rebuilding --> Clean --mark--> Dirty
//
// Rebuilding is synchronous and always a full redo: Sampler -> Cleanup ->
// Boundary Tracer, then the finished chunk replaces the stored one. There
// is no partially valid chunk.
//
// ## Scheduling
//
// Marking dirty is a set insertion (see `dirty.rs`). `update()` drives the
// expensive work:
//
//   1. While the dirty set is non-empty a cooldown window is open. The
//      window opens at the first `update()` that sees a mark; that call's
//      frame time is not counted, since the mark may have landed anywhere
//      in the frame. Later calls add their frame time.
//   2. Once the window has accumulated `rebuild_cooldown_secs` (reaching
//      it exactly is enough, so a zero cooldown drains on the marking
//      frame) and the pending queue is empty, the whole dirty set (all grids) moves to the
//      pending queue and the window closes. Marks landing after this open a
//      new window.
//   3. Pending chunks are rebuilt in (grid, chunk) order, at most
//      `max_chunks_per_tick` per call. The rest stay queued and are worked
//      off by later calls before anything newer.
//
// So a chunk marked any number of times inside one window is rebuilt once,
// and never before a full cooldown has elapsed since the mark.
//
// ## Grid removal
//
// `GridRemoved` drops the grid's chunks, dirty marks and pending entries.
// If a provider loses a grid without the event arriving, the scheduler
// notices at rebuild time (`grid_exists`) and drops the entry instead.
//
// See also: `event.rs` for the dirtying rules, `debug.rs` for the
// subscriber queues, `world.rs` for the reference provider.
//
// **Critical constraint: determinism.** All queues are `BTreeMap`/`BTreeSet`
// and the pipeline stages are pure functions of provider state, so the same
// events and frame times produce identical chunks in identical order.

use crate::breadcrumb::Breadcrumb;
use crate::chunk::{ChunkStore, Edge, NavChunk};
use crate::cleanup::clean;
use crate::config::{ConfigError, NavMeshConfig};
use crate::debug::{ChunkDebugMessage, DebugMessage, DebugPublisher, DebugSubscriberId};
use crate::dirty::DirtyTracker;
use crate::event::GeometryEvent;
use crate::occupancy::OccupancyProvider;
use crate::sampler::Sampler;
use crate::trace::trace_edges;
use crate::types::{ChunkCoord, GridId, GridSampleCoord, TileCoord};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Where a chunk is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Never built (or its grid was removed).
    Unbuilt,
    /// Built and not marked since.
    Clean,
    /// Marked, or queued for rebuild.
    Dirty,
}

/// What one `update()` call did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Chunks rebuilt, in the order they were processed.
    pub rebuilt: Vec<(GridId, ChunkCoord)>,
    /// Queued chunks discarded because their grid no longer exists.
    pub dropped: usize,
    /// Chunks still pending after this call.
    pub backlog: usize,
}

impl RebuildReport {
    pub fn is_empty(&self) -> bool {
        self.rebuilt.is_empty() && self.dropped == 0 && self.backlog == 0
    }
}

#[derive(Clone, Debug)]
pub struct NavMeshSystem {
    config: NavMeshConfig,
    store: ChunkStore,
    dirty: DirtyTracker,
    pending: BTreeSet<(GridId, ChunkCoord)>,
    /// Frame time accumulated in the open cooldown window, `None` when no
    /// window is open.
    window: Option<f32>,
    debug: DebugPublisher,
}

impl NavMeshSystem {
    pub fn new(config: NavMeshConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            dirty: DirtyTracker::new(config.chunk_size),
            config,
            store: ChunkStore::new(),
            pending: BTreeSet::new(),
            window: None,
            debug: DebugPublisher::new(),
        })
    }

    pub fn config(&self) -> &NavMeshConfig {
        &self.config
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Events and marking
    // -----------------------------------------------------------------------

    /// Translate one geometry event into dirty marks or grid bookkeeping.
    pub fn handle_event(&mut self, event: &GeometryEvent) {
        match *event {
            GeometryEvent::CollisionChanged { grid, tile }
            | GeometryEvent::TileChanged { grid, tile } => {
                self.mark_dirty(grid, tile);
            }
            GeometryEvent::BodyTypeChanged {
                grid,
                tile,
                old,
                new,
            } => {
                if old.is_static() != new.is_static() {
                    self.mark_dirty(grid, tile);
                }
            }
            GeometryEvent::Moved {
                from,
                to,
                body_type,
            } => {
                if body_type.is_static() {
                    for position in [from, to].into_iter().flatten() {
                        self.mark_dirty(position.grid, position.tile);
                    }
                }
            }
            GeometryEvent::GridCreated { grid, bounds } => {
                self.store.add_grid(grid);
                if let Some(bounds) = bounds {
                    for chunk in bounds.chunks(self.config.chunk_size) {
                        self.dirty.mark(grid, chunk);
                    }
                }
            }
            GeometryEvent::GridRemoved { grid } => self.remove_grid(grid),
        }
    }

    /// Mark the chunk owning `tile` dirty. Returns true if it was not
    /// already marked.
    pub fn mark_dirty(&mut self, grid: GridId, tile: TileCoord) -> bool {
        self.dirty.mark_tile(grid, tile)
    }

    fn remove_grid(&mut self, grid: GridId) {
        let chunks = self.store.remove_grid(grid);
        let marks = self.dirty.remove_grid(grid);
        let before = self.pending.len();
        self.pending.retain(|(g, _)| *g != grid);
        let queued = before - self.pending.len();
        if marks + queued > 0 {
            warn!("{grid} removed with {marks} dirty and {queued} queued chunks; dropping them");
        }
        debug!("{grid} removed, {chunks} chunks discarded");
        self.debug.publish(DebugMessage::GridRemoved { grid });
    }

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------

    /// Advance the scheduler by `frame_time` seconds and rebuild whatever is
    /// due.
    pub fn update<P: OccupancyProvider + ?Sized>(
        &mut self,
        provider: &P,
        frame_time: f32,
    ) -> RebuildReport {
        if self.dirty.is_empty() {
            self.window = None;
        } else {
            let elapsed = match self.window {
                None => 0.0,
                Some(acc) => acc + frame_time,
            };
            if elapsed >= self.config.rebuild_cooldown_secs && self.pending.is_empty() {
                self.pending.extend(self.dirty.drain());
                self.window = None;
            } else {
                self.window = Some(elapsed);
            }
        }

        let budget = self.config.max_chunks_per_tick.unwrap_or(usize::MAX);
        let mut report = RebuildReport::default();
        while report.rebuilt.len() < budget {
            let Some((grid, chunk)) = self.pending.pop_first() else {
                break;
            };
            if self.rebuild_chunk(provider, grid, chunk) {
                report.rebuilt.push((grid, chunk));
            } else {
                warn!("dropping queued {chunk} of missing {grid}");
                report.dropped += 1;
            }
        }
        report.backlog = self.pending.len();

        if !report.is_empty() {
            info!(
                "navmesh batch: {} rebuilt, {} dropped, {} pending",
                report.rebuilt.len(),
                report.dropped,
                report.backlog
            );
        }
        report
    }

    /// Rebuild one chunk right now, bypassing the cooldown, and clear any
    /// mark or queue entry it had. Returns false if the grid does not exist.
    pub fn force_rebuild<P: OccupancyProvider + ?Sized>(
        &mut self,
        provider: &P,
        grid: GridId,
        chunk: ChunkCoord,
    ) -> bool {
        self.dirty.unmark(grid, chunk);
        self.pending.remove(&(grid, chunk));
        self.rebuild_chunk(provider, grid, chunk)
    }

    fn rebuild_chunk<P: OccupancyProvider + ?Sized>(
        &mut self,
        provider: &P,
        grid: GridId,
        coord: ChunkCoord,
    ) -> bool {
        if !provider.grid_exists(grid) {
            return false;
        }
        let mut chunk = Sampler::new(provider, &self.config).sample(grid, coord);
        let passes = clean(&mut chunk, self.config.cleanup_passes);
        let edges = trace_edges(&chunk);
        debug!(
            "rebuilt {grid} {coord}: {passes} cleanup passes, {} edges",
            edges.len()
        );
        chunk.set_edges(edges);
        if self.debug.has_subscribers() {
            self.debug
                .publish(DebugMessage::Chunk(ChunkDebugMessage::from_chunk(grid, &chunk)));
        }
        self.store.insert(grid, chunk);
        true
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get_chunk(&self, grid: GridId, chunk: ChunkCoord) -> Option<&NavChunk> {
        self.store.get(grid, chunk)
    }

    /// The breadcrumb at a grid-wide sample coordinate, if its chunk is
    /// built and the cell survived cleanup.
    pub fn get_breadcrumb(&self, grid: GridId, coord: GridSampleCoord) -> Option<&Breadcrumb> {
        self.store.breadcrumb(grid, coord, &self.config)
    }

    /// Edges from the chunk's most recent trace.
    pub fn get_edges(&self, grid: GridId, chunk: ChunkCoord) -> Option<&[Edge]> {
        self.store.get(grid, chunk).map(NavChunk::edges)
    }

    pub fn chunk_state(&self, grid: GridId, chunk: ChunkCoord) -> ChunkState {
        if self.is_dirty(grid, chunk) {
            ChunkState::Dirty
        } else if self.store.get(grid, chunk).is_some() {
            ChunkState::Clean
        } else {
            ChunkState::Unbuilt
        }
    }

    /// Marked or queued for rebuild.
    pub fn is_dirty(&self, grid: GridId, chunk: ChunkCoord) -> bool {
        self.dirty.is_dirty(grid, chunk) || self.pending.contains(&(grid, chunk))
    }

    /// Chunks marked but not yet drained.
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Chunks drained but not yet rebuilt.
    pub fn backlog_len(&self) -> usize {
        self.pending.len()
    }

    // -----------------------------------------------------------------------
    // Debug subscribers
    // -----------------------------------------------------------------------

    /// Subscribe to chunk debug messages. The new queue starts with one
    /// message per chunk already built.
    pub fn subscribe_debug(&mut self) -> DebugSubscriberId {
        let id = self.debug.subscribe();
        for (grid, chunk) in self.store.iter() {
            self.debug
                .send_to(id, DebugMessage::Chunk(ChunkDebugMessage::from_chunk(grid, chunk)));
        }
        id
    }

    pub fn unsubscribe_debug(&mut self, id: DebugSubscriberId) -> bool {
        self.debug.unsubscribe(id)
    }

    pub fn drain_debug_messages(&mut self, id: DebugSubscriberId) -> Vec<DebugMessage> {
        self.debug.drain(id)
    }
}
