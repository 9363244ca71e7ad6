// JSON scene files: a navmesh config plus the grids, floor and occupants to
// build a `TileWorld` from.
//
// A scene looks like:
//
//   {
//     "config": { "chunk_size": 8, "rebuild_cooldown_secs": 0.25 },
//     "frame_time": 0.05,
//     "grids": [{
//       "id": 1,
//       "floor": [{ "min": { "x": 0, "y": 0 }, "max": { "x": 7, "y": 7 } }],
//       "floor_tiles": [{ "x": 9, "y": 0 }],
//       "occupants": [{
//         "tile": { "x": 3, "y": 3 },
//         "layer": 2, "mask": 2,
//         "shapes": [{ "Circle": { "center": { "x": 0.5, "y": 0.5 }, "radius": 0.4 } }]
//       }]
//     }]
//   }
//
// Every field except `grids[].id` has a default. An occupant's transform
// sits at its tile's lower-left corner plus `offset`, rotated by `rotation`
// radians; with no shapes it gets a unit tile rectangle.
//
// `run()` replays the scene into a fresh `NavMeshSystem` through the same
// event path a host uses, then steps frames until nothing is left dirty or
// queued.

use crumbnav::debug::DebugMessage;
use crumbnav::event::{BodyType, GeometryEvent};
use crumbnav::occupancy::{Occupant, Shape, Transform2};
use crumbnav::types::{GridId, TileBounds, TileCoord, Vec2};
use crumbnav::{ConfigError, NavMeshConfig, NavMeshSystem, TileWorld};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Errors raised while loading or running a scene.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scene JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid scene: {0}")]
    Invalid(String),
    #[error("navmesh still busy after {0} frames")]
    Stalled(u32),
}

fn default_true() -> bool {
    true
}

fn default_frame_time() -> f32 {
    1.0 / 60.0
}

fn default_max_frames() -> u32 {
    10_000
}

/// One anchored occupant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupantSpec {
    pub tile: TileCoord,
    #[serde(default)]
    pub body_type: BodyType,
    #[serde(default)]
    pub layer: u32,
    #[serde(default)]
    pub mask: u32,
    #[serde(default = "default_true")]
    pub hard: bool,
    #[serde(default = "default_true")]
    pub collidable: bool,
    /// Offset of the occupant origin from the tile's lower-left corner.
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl OccupantSpec {
    pub fn to_occupant(&self) -> Occupant {
        let shapes = if self.shapes.is_empty() {
            vec![Shape::unit_tile()]
        } else {
            self.shapes.clone()
        };
        Occupant {
            hard: self.hard,
            collidable: self.collidable,
            collision_layer: self.layer,
            collision_mask: self.mask,
            transform: Transform2 {
                position: Vec2::new(self.tile.x as f32, self.tile.y as f32) + self.offset,
                rotation: self.rotation,
            },
            shapes: shapes.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub id: GridId,
    #[serde(default)]
    pub floor: Vec<TileBounds>,
    #[serde(default)]
    pub floor_tiles: Vec<TileCoord>,
    #[serde(default)]
    pub occupants: Vec<OccupantSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub config: NavMeshConfig,
    /// Seconds advanced per simulated frame.
    #[serde(default = "default_frame_time")]
    pub frame_time: f32,
    /// Give up if the navmesh is still busy after this many frames.
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
    pub grids: Vec<GridSpec>,
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self, ToolError> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ToolError> {
        self.config.validate()?;
        if !(self.frame_time.is_finite() && self.frame_time > 0.0) {
            return Err(ToolError::Invalid(format!(
                "frame_time must be positive, got {}",
                self.frame_time
            )));
        }
        let mut seen = BTreeSet::new();
        for grid in &self.grids {
            if !seen.insert(grid.id) {
                return Err(ToolError::Invalid(format!("duplicate {}", grid.id)));
            }
            if let Some(bounds) = grid
                .floor
                .iter()
                .find(|b| b.min.x > b.max.x || b.min.y > b.max.y)
            {
                return Err(ToolError::Invalid(format!(
                    "{}: floor rectangle min {} exceeds max {}",
                    grid.id, bounds.min, bounds.max
                )));
            }
        }
        Ok(())
    }

    /// Build the world, returning every event its construction produced in
    /// order.
    pub fn build_world(&self) -> (TileWorld, Vec<GeometryEvent>) {
        let mut world = TileWorld::new();
        let mut events = Vec::new();
        for grid in &self.grids {
            events.push(world.add_grid(grid.id));
            for &bounds in &grid.floor {
                events.extend(world.fill_floor(grid.id, bounds));
            }
            for &tile in &grid.floor_tiles {
                events.extend(world.set_floor(grid.id, tile, true));
            }
            for spec in &grid.occupants {
                if let Some((_, event)) =
                    world.spawn(grid.id, spec.tile, spec.body_type, spec.to_occupant())
                {
                    events.push(event);
                }
            }
        }
        (world, events)
    }
}

/// The result of replaying a scene.
pub struct SceneRun {
    pub world: TileWorld,
    pub nav: NavMeshSystem,
    /// Debug messages published during the run, in order.
    pub messages: Vec<DebugMessage>,
    /// Frames stepped until the navmesh settled.
    pub frames: u32,
}

/// Replay `scene` and step frames until every dirty chunk is rebuilt.
pub fn run(scene: &Scene) -> Result<SceneRun, ToolError> {
    let mut nav = NavMeshSystem::new(scene.config.clone())?;
    let subscriber = nav.subscribe_debug();
    let (world, events) = scene.build_world();
    debug!("scene produced {} geometry events", events.len());
    for event in &events {
        nav.handle_event(event);
    }

    let mut frames = 0;
    while nav.dirty_count() > 0 || nav.backlog_len() > 0 {
        if frames >= scene.max_frames {
            return Err(ToolError::Stalled(frames));
        }
        nav.update(&world, scene.frame_time);
        frames += 1;
    }
    info!(
        "scene settled after {frames} frames, {} chunks built",
        nav.store().chunk_count()
    );

    let messages = nav.drain_debug_messages(subscriber);
    Ok(SceneRun {
        world,
        nav,
        messages,
        frames,
    })
}
