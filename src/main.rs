use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use terrain2stl::api::TerrariumClient;
use terrain2stl::config::{FileConfig, TileSourceConfig, limits, resolve_verbose};
use terrain2stl::logging::init_logging;
use terrain2stl::mesh::{MeshConfig, estimate_stl_size, inspect_stl, write_stl};
use terrain2stl::terrain::FetchLimits;
use terrain2stl::{BoundingBox, ExportOptions, ExportRequest, export_terrain};

/// Generate 3D-printable STL terrain models from elevation map tiles
///
/// Examples:
///   # Matterhorn at the default 512 vertex resolution
///   terrain2stl --bounds 7.62,45.95,7.70,46.01 -o matterhorn.stl
///
///   # Flatter terrain needs more exaggeration
///   terrain2stl --bounds -0.2,51.4,0.0,51.6 --exaggeration 5 --base-height 3
///
///   # Read a JSON export request
///   terrain2stl --request request.json
#[derive(Parser, Debug)]
#[command(name = "terrain2stl")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches terrain2stl.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bounding box as west,south,east,north in degrees
    #[arg(short = 'b', long, value_delimiter = ',', allow_hyphen_values = true)]
    bounds: Option<Vec<f64>>,

    /// JSON request file: {"bounds": [w, s, e, n], "resolution": 512, "minHeight": 2}
    #[arg(long, conflicts_with = "bounds")]
    request: Option<PathBuf>,

    /// Mesh vertices along the west-east edge
    #[arg(short = 'r', long)]
    resolution: Option<u32>,

    /// Vertical exaggeration multiplier
    #[arg(long)]
    exaggeration: Option<f64>,

    /// Base thickness in mm under the lowest point
    #[arg(long)]
    base_height: Option<f64>,

    /// Elevation tile URL template with {z}, {x} and {y} placeholders
    #[arg(long)]
    tile_url: Option<String>,

    /// Output STL file path
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?;
            Some(toml::from_str(&contents).context("Failed to parse config file")?)
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load()
    };

    let verbose = resolve_verbose(args.verbose, file_config.as_ref());
    init_logging(verbose).context("Failed to initialize logging")?;

    let options = resolve_options(&args, file_config.as_ref())?;

    let mut tile_config: TileSourceConfig = file_config
        .as_ref()
        .and_then(|c| c.tiles.clone())
        .unwrap_or_default();
    if let Some(ref url) = args.tile_url {
        tile_config.url_template = url.clone();
    }

    let output_path = args
        .output
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output.clone()))
        .unwrap_or_else(|| PathBuf::from("terrain.stl"));

    println!("terrain2stl - Terrain Model STL Generator");
    println!("=========================================");
    println!();

    if verbose {
        let b = &options.bounds;
        println!("Configuration:");
        println!(
            "  Bounds: W {:.5} S {:.5} E {:.5} N {:.5}",
            b.west, b.south, b.east, b.north
        );
        println!("  Resolution: {}", options.mesh.resolution);
        println!("  Exaggeration: {}", options.mesh.vertical_exaggeration);
        println!("  Base height: {}mm", options.mesh.base_thickness_mm);
        println!("  Tile source: {}", tile_config.url_template);
        println!("  Output: {}", output_path.display());
        println!();
    }

    let client = TerrariumClient::new(&tile_config).context("Failed to create tile client")?;
    let fetch_limits = FetchLimits {
        max_tiles: limits::MAX_TILES,
        deadline: Duration::from_secs(tile_config.fetch_deadline_secs),
    };

    let spinner = create_spinner("Fetching elevation tiles and building mesh...");
    let start = Instant::now();
    let export = export_terrain(&options, Arc::new(client), &fetch_limits)
        .context("Failed to export terrain")?;
    spinner.finish_with_message(format!(
        "Zoom {} ({} tiles, {} failed) -> {}x{} grid, {} triangles [{:.1}s]",
        export.zoom(),
        export.range.len(),
        export.failed_tiles.len(),
        export.mesh_width,
        export.mesh_height,
        export.triangles,
        start.elapsed().as_secs_f32()
    ));

    if !export.failed_tiles.is_empty() {
        println!(
            "Warning: {} tile(s) could not be fetched and were left flat",
            export.failed_tiles.len()
        );
    }

    let spinner = create_spinner("Validating and writing STL file...");
    let start = Instant::now();

    let report = inspect_stl(&export.stl).context("Generated STL failed validation")?;
    write_stl(&output_path, &export.stl)?;

    spinner.finish_with_message(format!(
        "Wrote {} triangles ({:.1} KB) [{:.1}s]",
        report.triangles,
        estimate_stl_size(report.triangles) as f64 / 1024.0,
        start.elapsed().as_secs_f32()
    ));

    println!();
    println!("{}", report.summary());
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );
    println!();
    println!("Output: {}", output_path.display());

    Ok(())
}

/// Merge request file, CLI flags and config file into export options.
///
/// CLI flags win over the request file, which wins over the config file.
fn resolve_options(args: &Args, file_config: Option<&FileConfig>) -> Result<ExportOptions> {
    let mut options = if let Some(ref path) = args.request {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?;
        ExportRequest::from_json(&json)?.into_options()
    } else {
        let bounds = match (&args.bounds, file_config.and_then(|c| c.bounds)) {
            (Some(values), _) => {
                let values: [f64; 4] = values.as_slice().try_into().map_err(|_| {
                    anyhow::anyhow!(
                        "--bounds takes exactly 4 values (west,south,east,north), got {}",
                        values.len()
                    )
                })?;
                values
            }
            (None, Some(values)) => values,
            (None, None) => bail!("Must provide --bounds, --request, or bounds in a config file"),
        };

        let mesh = match file_config {
            Some(c) => MeshConfig::default()
                .with_resolution(c.resolution)
                .with_exaggeration(c.exaggeration)
                .with_base_thickness(c.base_height),
            None => MeshConfig::default(),
        };
        ExportOptions::new(BoundingBox::from_array(bounds)).with_mesh(mesh)
    };

    if let Some(resolution) = args.resolution {
        options.mesh = options.mesh.with_resolution(resolution);
    }
    if let Some(exaggeration) = args.exaggeration {
        options.mesh = options.mesh.with_exaggeration(exaggeration);
    }
    if let Some(base) = args.base_height {
        options.mesh = options.mesh.with_base_thickness(base);
    }

    options.validate()?;
    Ok(options)
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
