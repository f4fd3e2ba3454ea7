//! proxymesh: densify terrain and urban scans into watertight proxy meshes.
//!
//! # Logging
//!
//! Set `RUST_LOG` to override the verbosity flags:
//! - `RUST_LOG=proxymesh_algorithms=debug` - per-pass raster detail
//! - `RUST_LOG=debug` - all debug output
//!
//! # Example
//!
//! ```bash
//! proxymesh generate scan.ply proxy.ply -r 0.5 --fuse-samples --height-map height.pfm
//! proxymesh normalize-values proxy.ply normalized.ply -e 0.02 -c
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{generate, normalize_values};

/// proxymesh - height-field densification of scanned point clouds
#[derive(Parser)]
#[command(name = "proxymesh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress all log output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a proxy mesh from a point cloud
    Generate(generate::GenerateArgs),

    /// Rescale per-vertex values of a mesh into [0, 1]
    NormalizeValues(normalize_values::NormalizeValuesArgs),
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "info",
            1 => "info,proxymesh_core=debug,proxymesh_algorithms=debug,proxymesh_io=debug,proxymesh_reconstruction=debug,proxymesh=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Generate(args) => generate::run(args),
        Commands::NormalizeValues(args) => normalize_values::run(args),
    };

    if let Err(e) = &result {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  Caused by: {}", cause);
        }
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "proxymesh",
            "generate",
            "cloud.ply",
            "mesh.ply",
            "-r",
            "0.5",
            "--fuse-samples",
            "--height-map",
            "height.pfm",
        ])
        .unwrap();

        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.resolution, 0.5);
        assert!(args.fuse_samples);
        assert_eq!(args.height_map, Some(PathBuf::from("height.pfm")));
        assert!(args.samples_dump.is_none());
    }

    #[test]
    fn test_parse_normalize_values() {
        let cli = Cli::try_parse_from([
            "proxymesh",
            "normalize-values",
            "in.ply",
            "out.ply",
            "-e",
            "0.1",
            "-c",
            "-i",
            "-2",
            "-m",
            "a.ply,b.ply",
        ])
        .unwrap();

        let Commands::NormalizeValues(args) = cli.command else {
            panic!("expected normalize-values");
        };
        assert_eq!(args.epsilon, 0.1);
        assert!(args.clamp);
        assert_eq!(args.ignore, -2.0);
        assert_eq!(args.meshes, vec![PathBuf::from("a.ply"), PathBuf::from("b.ply")]);
    }
}
