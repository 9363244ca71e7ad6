// CLI entry point for the navmesh dump tool.
//
// Replays a JSON scene (see `scene.rs` for the format) into the navmesh
// builder and prints either a per-chunk table or every debug message as
// JSON. Logging goes to stderr through `env_logger`; `RUST_LOG` overrides
// the default level.
//
// Usage:
//   navdump --scene <PATH> [OPTIONS]
//     --json        Print the debug messages as JSON instead of a table
//     --verbose     Default log level debug instead of info

use crumbnav_tool::report::{chunk_reports, format_table};
use crumbnav_tool::{Scene, run};
use log::error;

struct Args {
    scene: String,
    json: bool,
    verbose: bool,
}

fn main() {
    let args = parse_args();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let outcome = Scene::load(&args.scene).and_then(|scene| run(&scene));
    let scene_run = match outcome {
        Ok(scene_run) => scene_run,
        Err(e) => {
            error!("{}: {e}", args.scene);
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&scene_run.messages) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("failed to encode debug messages: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", format_table(&chunk_reports(&scene_run.nav)));
        println!(
            "{} chunks after {} frames",
            scene_run.nav.store().chunk_count(),
            scene_run.frames
        );
    }
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let mut scene = None;
    let mut json = false;
    let mut verbose = false;
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--scene" => {
                i += 1;
                scene = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--scene requires a path");
                    std::process::exit(1);
                }));
            }
            "--json" => json = true,
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(scene) = scene else {
        eprintln!("--scene is required");
        print_usage();
        std::process::exit(1);
    };
    Args {
        scene,
        json,
        verbose,
    }
}

fn print_usage() {
    println!("Usage: navdump --scene <PATH> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --scene <PATH>   Scene JSON file to replay");
    println!("  --json           Print debug messages as JSON");
    println!("  --verbose, -v    Log at debug level (RUST_LOG overrides)");
    println!("  --help, -h       Show this help");
}
