//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.tabhop/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::engine::CAPACITY;
use crate::core::press::DOUBLE_PRESS_WINDOW;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TabhopConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HistoryConfig {
    pub capacity: Option<usize>,
    pub double_press_window_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub state_file: Option<String>,
    pub ephemeral: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_STATE_FILE: &str = "state.json";
pub const DEFAULT_LOG_FILE: &str = "tabhop.log";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub capacity: usize,
    pub double_press_window: Duration,
    /// `None` keeps history in memory only.
    pub state_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(&TabhopConfig::default(), &CliOverrides::default())
    }
}

/// Settings given on the command line. `None`/`false` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub state_file: Option<PathBuf>,
    pub ephemeral: bool,
    pub capacity: Option<usize>,
    pub double_press_window_ms: Option<u64>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.tabhop/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tabhop"))
}

/// Returns the path to `~/.tabhop/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `explicit` if given, else from `~/.tabhop/config.toml`.
///
/// A missing default file is generated (commented out) and defaults are
/// returned. A missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<TabhopConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(TabhopConfig::default());
            }
        },
    };

    if explicit.is_none() && !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(TabhopConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<TabhopConfig, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# tabhop configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [history]
# capacity = 20                  # tabs remembered
# double_press_window_ms = 300   # two presses closer than this are a double press

# [storage]
# state_file = "state.json"      # relative to ~/.tabhop/, or TABHOP_STATE_FILE
# ephemeral = false              # keep history in memory only

# [logging]
# file = "tabhop.log"            # relative to ~/.tabhop/, or TABHOP_LOG_FILE
# level = "info"                 # or TABHOP_LOG_LEVEL
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Relative paths live under `~/.tabhop/`.
fn under_config_dir(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        return path;
    }
    match config_dir() {
        Some(dir) => dir.join(path),
        None => path,
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &TabhopConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Capacity: CLI → config → default. Zero would forget every tab.
    let capacity = cli
        .capacity
        .or(config.history.capacity)
        .unwrap_or(CAPACITY)
        .max(1);

    let double_press_window = cli
        .double_press_window_ms
        .or(config.history.double_press_window_ms)
        .map(Duration::from_millis)
        .unwrap_or(DOUBLE_PRESS_WINDOW);

    // State file: ephemeral wins; then CLI → env → config → default
    let ephemeral = cli.ephemeral || config.storage.ephemeral.unwrap_or(false);
    let state_file = if ephemeral {
        None
    } else {
        cli.state_file.clone().or_else(|| {
            let configured = std::env::var("TABHOP_STATE_FILE")
                .ok()
                .or_else(|| config.storage.state_file.clone())
                .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
            Some(under_config_dir(&configured))
        })
    };

    // Log file: env → config → default
    let log_file = std::env::var("TABHOP_LOG_FILE")
        .ok()
        .or_else(|| config.logging.file.clone())
        .map(|file| under_config_dir(&file))
        .or_else(|| config_dir().map(|dir| dir.join(DEFAULT_LOG_FILE)));

    // Log level: env → config → default; unparseable values fall back
    let log_level = std::env::var("TABHOP_LOG_LEVEL")
        .ok()
        .or_else(|| config.logging.level.clone())
        .and_then(|level| match level.parse::<LevelFilter>() {
            Ok(level) => Some(level),
            Err(_) => {
                warn!("Unknown log level {:?}, using {}", level, DEFAULT_LOG_LEVEL);
                None
            }
        })
        .unwrap_or(DEFAULT_LOG_LEVEL);

    ResolvedConfig {
        capacity,
        double_press_window,
        state_file,
        log_file,
        log_level,
    }
}
