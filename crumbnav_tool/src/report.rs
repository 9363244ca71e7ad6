// Per-chunk summaries of a settled navmesh.

use crumbnav::NavMeshSystem;
use crumbnav::chunk::ChunkStats;
use crumbnav::types::{ChunkCoord, GridId};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkReport {
    pub grid: GridId,
    pub chunk: ChunkCoord,
    pub stats: ChunkStats,
    pub edges: usize,
    pub longest_edge: usize,
}

/// One report per built chunk, in (grid, chunk) order.
pub fn chunk_reports(nav: &NavMeshSystem) -> Vec<ChunkReport> {
    nav.store()
        .iter()
        .map(|(grid, chunk)| ChunkReport {
            grid,
            chunk: chunk.coord,
            stats: chunk.stats(),
            edges: chunk.edges().len(),
            longest_edge: chunk.edges().iter().map(|e| e.len()).max().unwrap_or(0),
        })
        .collect()
}

/// Fixed-width table of `reports`.
pub fn format_table(reports: &[ChunkReport]) -> String {
    let header = ["interior", "boundary", "dropped", "edges", "longest"].map(String::from);
    let mut out = row("grid", "chunk", header);
    for r in reports {
        out.push_str(&row(
            &r.grid.to_string(),
            &r.chunk.to_string(),
            [
                r.stats.interior,
                r.stats.boundary,
                r.stats.dropped,
                r.edges,
                r.longest_edge,
            ]
            .map(|n| n.to_string()),
        ));
    }
    out
}

fn row(grid: &str, chunk: &str, counts: [String; 5]) -> String {
    let [interior, boundary, dropped, edges, longest] = counts;
    format!(
        "{grid:<10} {chunk:<16} {interior:>8} {boundary:>8} {dropped:>8} {edges:>6} {longest:>8}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumbnav::{NavMeshConfig, TileWorld};

    #[test]
    fn empty_chunk_report() {
        let mut world = TileWorld::new();
        world.add_grid(GridId(1));
        let mut nav = NavMeshSystem::new(NavMeshConfig::default()).unwrap();
        nav.force_rebuild(&world, GridId(1), ChunkCoord::new(0, 0));

        let reports = chunk_reports(&nav);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].edges, 1);
        assert_eq!(reports[0].longest_edge, 124);
        assert_eq!(reports[0].stats.dropped, 0);

        let table = format_table(&reports);
        assert_eq!(table.lines().count(), 2);
        assert!(table.lines().nth(1).unwrap().starts_with("grid#1"));
        let header = table.lines().next().unwrap();
        assert!(header.starts_with("grid       chunk            interior"));
        assert_eq!(header.len(), table.lines().nth(1).unwrap().len());
    }
}
