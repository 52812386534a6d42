use serde::Deserialize;
use std::path::PathBuf;

/// Defaults and hard limits for a single export.
///
/// The tile and vertex caps bound memory and latency for any bounding box:
/// the composite raster holds at most `MAX_TILES * 256 * 256` pixels and the
/// vertex grid at most `MAX_MESH_VERTICES` positions.
pub mod limits {
    pub const DEFAULT_RESOLUTION: u32 = 512;
    pub const MAX_RESOLUTION: u32 = 2048;
    pub const MAX_MESH_VERTICES: usize = 2048 * 2048;

    pub const MAX_TILES: usize = 20;
    pub const FETCH_DEADLINE_SECS: u64 = 60;

    /// Model footprint along x in mm
    pub const MODEL_WIDTH_MM: f64 = 100.0;
    pub const VERTICAL_EXAGGERATION: f64 = 1.5;
    pub const BASE_THICKNESS_MM: f64 = 2.0;
}

fn default_resolution() -> u32 {
    limits::DEFAULT_RESOLUTION
}
fn default_exaggeration() -> f64 {
    limits::VERTICAL_EXAGGERATION
}
fn default_base_height() -> f64 {
    limits::BASE_THICKNESS_MM
}
fn default_verbose() -> bool {
    false
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    /// `[west, south, east, north]` in degrees
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
    #[serde(default = "default_resolution")]
    pub resolution: u32,
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f64,
    #[serde(default = "default_base_height")]
    pub base_height: f64,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub tiles: Option<TileSourceConfig>,
}

fn default_url_template() -> String {
    "https://s3.amazonaws.com/elevation-tiles-prod/terrarium/{z}/{x}/{y}.png".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    2
}

fn default_fetch_deadline_secs() -> u64 {
    limits::FETCH_DEADLINE_SECS
}

fn default_user_agent() -> String {
    format!("terrain2stl/{}", env!("CARGO_PKG_VERSION"))
}

/// Where elevation tiles come from and how patiently to wait for them
#[derive(Debug, Deserialize, Clone)]
pub struct TileSourceConfig {
    /// URL with `{z}`, `{x}` and `{y}` placeholders
    #[serde(default = "default_url_template")]
    pub url_template: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Budget for the whole fetch phase
    #[serde(default = "default_fetch_deadline_secs")]
    pub fetch_deadline_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            fetch_deadline_secs: default_fetch_deadline_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FileConfig {
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        // Logging is not up yet; it depends on this file's `verbose`
                        eprintln!(
                            "Warning: Failed to parse config file {}: {}",
                            path.display(),
                            e
                        );
                    }
                }
            }
        }
        None
    }
}

/// Verbose logging is on if either the `-v` flag or the config file asks for it
pub fn resolve_verbose(flag: bool, config: Option<&FileConfig>) -> bool {
    flag || config.is_some_and(|c| c.verbose)
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("terrain2stl.toml"));
    paths.push(PathBuf::from(".terrain2stl.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("terrain2stl").join("config.toml"));
        paths.push(config_dir.join("terrain2stl.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".terrain2stl.toml"));
    }

    paths
}
