// crumbnav_tool — offline scene runner for the crumbnav navmesh builder.
//
// Loads a JSON scene, replays it into a `NavMeshSystem` and reports what
// got built. The `navdump` binary (`main.rs`) is a thin CLI over this
// library; tests drive the library directly.
//
// Module overview:
// - `scene.rs`:  Scene file format, world construction, the replay loop.
// - `report.rs`: Per-chunk statistics and the text table.

pub mod report;
pub mod scene;

pub use scene::{Scene, SceneRun, ToolError, run};
