use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{Color, Size};

const APP_DIR: &str = "image-grip";
const APP_CONFIG_FILE: &str = "config.json";

const DEFAULT_MIN_SIZE: f64 = 50.0;
const DEFAULT_HANDLE_COLOR: &str = "#DB626C";
const DEFAULT_IMAGE_SELECTOR: &str = "img";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to read config: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be a positive finite number, got {value}")]
    InvalidMinimum { field: &'static str, value: f64 },
    #[error("handle color must be #rgb or #rrggbb, got {0:?}")]
    InvalidHandleColor(String),
    #[error("image selector must not be empty")]
    EmptySelector,
    #[error("ratio correction tolerance must be a non-negative finite number, got {0}")]
    InvalidTolerance(f64),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandlerMode {
    #[default]
    Resize,
    Crop,
}

/// Bounds the corrective re-layout after a ratio-locked resize. The rendered
/// size is re-read up to `max_passes` times; a pass only runs while the floored
/// rendered size differs from the intended one by more than `tolerance` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RatioCorrection {
    pub max_passes: u8,
    pub tolerance: f64,
}

impl Default for RatioCorrection {
    fn default() -> Self {
        Self {
            max_passes: 1,
            tolerance: 0.0,
        }
    }
}

/// Construction-time settings, immutable for the lifetime of a controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManipulationConfig {
    pub min_width: f64,
    pub min_height: f64,
    pub handle_color: String,
    pub force_preserve_ratio: bool,
    pub image_selector: String,
    pub mode: HandlerMode,
    pub ratio_correction: RatioCorrection,
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_SIZE,
            min_height: DEFAULT_MIN_SIZE,
            handle_color: DEFAULT_HANDLE_COLOR.to_string(),
            force_preserve_ratio: false,
            image_selector: DEFAULT_IMAGE_SELECTOR.to_string(),
            mode: HandlerMode::Resize,
            ratio_correction: RatioCorrection::default(),
        }
    }
}

impl ManipulationConfig {
    pub fn with_mode(mut self, mode: HandlerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn min_size(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [("min_width", self.min_width), ("min_height", self.min_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidMinimum { field, value });
            }
        }
        if Color::from_hex(&self.handle_color).is_none() {
            return Err(ConfigError::InvalidHandleColor(self.handle_color.clone()));
        }
        if self.image_selector.trim().is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        let tolerance = self.ratio_correction.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        Ok(())
    }
}

/// Loads `config.json` from the user config directory, falling back to the
/// defaults when it is absent, unreadable, unparsable or invalid.
pub fn load_config() -> ManipulationConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> ManipulationConfig {
    let path = match config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(path) => path,
        Err(_) => return ManipulationConfig::default(),
    };
    if !path.exists() {
        return ManipulationConfig::default();
    }
    match read_config(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to load config.json; using defaults");
            ManipulationConfig::default()
        }
    }
}

pub fn read_config(path: &Path) -> ConfigResult<ManipulationConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> ConfigResult<ManipulationConfig> {
    let config: ManipulationConfig = serde_json::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> ConfigResult<PathBuf> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(xdg_config_home: Option<&Path>, home: Option<&Path>) -> ConfigResult<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
