//! Bootstrap configuration loading
//!
//! Configuration comes from a single TOML file. Every section and field has a
//! built-in default, so a missing file (or a missing section) never prevents
//! start-up: the loader warns and falls back to defaults. A file that exists
//! but cannot be parsed is a configuration error.
//!
//! # Config file resolution priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`LYRICLOUD_CONFIG`)
//! 3. Platform config directory (`~/.config/lyricloud/config.toml` on Linux)
//! 4. Compiled defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LYRICLOUD_CONFIG";

/// Default HTTP port for the word-cloud service
pub const DEFAULT_PORT: u16 = 5780;

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub genius: GeniusConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Lyrics provider (Genius) settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeniusConfig {
    /// Access token; `GENIUS_TOKEN` in the environment takes priority
    #[serde(default)]
    pub access_token: Option<String>,

    /// API base URL (overridable for testing against a local fake)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeniusConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Word-cloud rendering settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    /// Canvas width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Canvas height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Background colour: `#rrggbb`, `#rrggbbaa` or a basic colour name
    #[serde(default = "default_background")]
    pub background: String,

    /// Maximum number of words placed on the canvas
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Smallest font size in pixels before a word is dropped
    #[serde(default = "default_min_font_size")]
    pub min_font_size: f32,

    /// Largest font size in pixels (defaults to the canvas height)
    #[serde(default)]
    pub max_font_size: Option<f32>,

    /// 0.0 sizes words by rank only, 1.0 by frequency only
    #[serde(default = "default_relative_scaling")]
    pub relative_scaling: f32,

    /// Probability that a word is laid out horizontally
    #[serde(default = "default_prefer_horizontal")]
    pub prefer_horizontal: f32,

    /// RNG seed for placement and colours (random per run when absent)
    #[serde(default)]
    pub seed: Option<u64>,

    /// TrueType/OpenType font file; platform font directories are searched when absent
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// Words ignored in addition to the built-in English stopwords
    #[serde(default)]
    pub extra_stopwords: Vec<String>,

    #[serde(default)]
    pub frame: FrameConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            background: default_background(),
            max_words: default_max_words(),
            min_font_size: default_min_font_size(),
            max_font_size: None,
            relative_scaling: default_relative_scaling(),
            prefer_horizontal: default_prefer_horizontal(),
            seed: None,
            font_path: None,
            extra_stopwords: Vec::new(),
            frame: FrameConfig::default(),
        }
    }
}

/// Display frame the canvas is presented in
///
/// Sized in display units (15 × 7 by default) at `pixels_per_unit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameConfig {
    #[serde(default = "default_frame_width_units")]
    pub width_units: f32,

    #[serde(default = "default_frame_height_units")]
    pub height_units: f32,

    #[serde(default = "default_pixels_per_unit")]
    pub pixels_per_unit: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width_units: default_frame_width_units(),
            height_units: default_frame_height_units(),
            pixels_per_unit: default_pixels_per_unit(),
        }
    }
}

impl FrameConfig {
    /// Frame size in pixels (never zero)
    pub fn pixel_size(&self) -> (u32, u32) {
        let ppu = self.pixels_per_unit.max(1) as f32;
        let width = (self.width_units * ppu).round().max(1.0) as u32;
        let height = (self.height_units * ppu).round().max(1.0) as u32;
        (width, height)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    "https://api.genius.com".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    400
}

fn default_background() -> String {
    "white".to_string()
}

fn default_max_words() -> usize {
    200
}

fn default_min_font_size() -> f32 {
    4.0
}

fn default_relative_scaling() -> f32 {
    0.5
}

fn default_prefer_horizontal() -> f32 {
    0.9
}

fn default_frame_width_units() -> f32 {
    15.0
}

fn default_frame_height_units() -> f32 {
    7.0
}

fn default_pixels_per_unit() -> u32 {
    100
}

/// Resolve which config file to read
///
/// Returns `None` when no explicit path is given and the platform default
/// file does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lyricloud").join("config.toml"))
}

/// Load configuration from `path`, degrading to defaults when the file is absent
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} does not exist, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Parse configuration from TOML text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    let config: TomlConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &TomlConfig) -> Result<()> {
    let render = &config.render;
    if render.width == 0 || render.height == 0 {
        return Err(Error::Config(format!(
            "render canvas must be non-empty, got {}x{}",
            render.width, render.height
        )));
    }
    if render.max_words == 0 {
        return Err(Error::Config("render.max_words must be at least 1".to_string()));
    }
    if !(0.0..=1.0).contains(&render.relative_scaling) {
        return Err(Error::Config(format!(
            "render.relative_scaling must be within 0.0..=1.0, got {}",
            render.relative_scaling
        )));
    }
    if !(0.0..=1.0).contains(&render.prefer_horizontal) {
        return Err(Error::Config(format!(
            "render.prefer_horizontal must be within 0.0..=1.0, got {}",
            render.prefer_horizontal
        )));
    }
    if render.frame.width_units <= 0.0 || render.frame.height_units <= 0.0 {
        return Err(Error::Config("render.frame dimensions must be positive".to_string()));
    }
    if config.genius.timeout_secs == 0 {
        return Err(Error::Config("genius.timeout_secs must be at least 1".to_string()));
    }
    Ok(())
}
