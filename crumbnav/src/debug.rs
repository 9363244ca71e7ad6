// Debug publisher: per-subscriber message queues for overlay tooling.
//
// Consumers (debug overlays, the `navdump` tool) subscribe and then drain
// their queue at their own pace. Each rebuilt chunk produces one
// `DebugMessage::Chunk` per subscriber carrying the cells that survived
// cleanup and the traced edges; grid removal produces a
// `DebugMessage::GridRemoved`. Nothing is built when nobody subscribes.
//
// Messages are plain serde values so a tool can dump them as JSON.
//
// See also: `navmesh.rs` which publishes after every rebuild and sends a
// snapshot of existing chunks to new subscribers.

use crate::breadcrumb::Breadcrumb;
use crate::chunk::{Edge, NavChunk};
use crate::types::{ChunkCoord, GridId, TileCoord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle returned by `subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DebugSubscriberId(pub u32);

/// Everything a debug overlay needs to draw one chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkDebugMessage {
    pub grid: GridId,
    pub chunk: ChunkCoord,
    pub origin: TileCoord,
    pub sub_step: u32,
    pub samples_per_axis: u32,
    /// Surviving cells in row-major order.
    pub breadcrumbs: Vec<Breadcrumb>,
    pub edges: Vec<Edge>,
}

impl ChunkDebugMessage {
    pub fn from_chunk(grid: GridId, chunk: &NavChunk) -> Self {
        Self {
            grid,
            chunk: chunk.coord,
            origin: chunk.origin,
            sub_step: chunk.sub_step(),
            samples_per_axis: chunk.samples_per_axis(),
            breadcrumbs: chunk.breadcrumbs().copied().collect(),
            edges: chunk.edges().to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DebugMessage {
    Chunk(ChunkDebugMessage),
    GridRemoved { grid: GridId },
}

#[derive(Clone, Debug, Default)]
pub struct DebugPublisher {
    next_id: u32,
    queues: BTreeMap<DebugSubscriberId, Vec<DebugMessage>>,
}

impl DebugPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> DebugSubscriberId {
        let id = DebugSubscriberId(self.next_id);
        self.next_id += 1;
        self.queues.insert(id, Vec::new());
        id
    }

    /// Stop delivery to `id` and discard its undrained messages. Returns
    /// false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: DebugSubscriberId) -> bool {
        self.queues.remove(&id).is_some()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.queues.is_empty()
    }

    /// Queue `message` for every subscriber.
    pub fn publish(&mut self, message: DebugMessage) {
        for queue in self.queues.values_mut() {
            queue.push(message.clone());
        }
    }

    /// Queue `message` for one subscriber only.
    pub fn send_to(&mut self, id: DebugSubscriberId, message: DebugMessage) {
        if let Some(queue) = self.queues.get_mut(&id) {
            queue.push(message);
        }
    }

    /// Take everything queued for `id`. Empty for unknown subscribers.
    pub fn drain(&mut self, id: DebugSubscriberId) -> Vec<DebugMessage> {
        self.queues
            .get_mut(&id)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}
