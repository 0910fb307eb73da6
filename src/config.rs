use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at a JSON file overriding [`InputConfig`] defaults.
pub const CONFIG_ENV_VAR: &str = "XRCONTROLLER_CONFIG";

/// Parameters of an adaptive low-pass filter, see [`crate::filter`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Cutoff frequency (Hz) used when the signal is at rest.
    pub min_cutoff: f32,
    /// How much the cutoff grows with the estimated speed.
    pub beta: f32,
    /// Cutoff frequency (Hz) of the speed estimate itself.
    pub d_cutoff: f32,
}

impl FilterParams {
    pub const fn new(min_cutoff: f32, beta: f32, d_cutoff: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
        }
    }
}

/// Distances are in meters, between the thumb tip and the index tip.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    /// Below this smoothed distance the fingers are considered pinching.
    pub threshold: f32,
    /// A pinch is only released once the smoothed distance rises above this.
    pub release_threshold: f32,
    /// Distance at which the pinch factor starts growing from 0.
    pub start: f32,
    /// Weight of the newest sample in the exponential smoothing of the distance.
    pub smoothing: f32,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.019,
            release_threshold: 0.025,
            start: 0.055,
            smoothing: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Value above which a button without a click component counts as clicked.
    pub click_threshold: f32,
    /// Same as `click_threshold`, for the single profile legacy driver.
    pub legacy_click_threshold: f32,
    /// Height added to tracked positions in standalone mode.
    pub average_height: f32,
    /// Smoothing of joint derived aim positions. `None` disables filtering.
    pub hand_filter: Option<FilterParams>,
    /// Smoothing of the eye gaze orientation.
    pub gaze_filter: FilterParams,
    pub pinch: PinchConfig,
    /// Use the pinch reported by the runtime aim extension instead of measuring joints.
    pub trust_runtime_pinch: bool,
    /// Use the system gesture flag of the runtime aim extension instead of measuring joints.
    pub trust_runtime_system_gesture: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            click_threshold: 0.91,
            legacy_click_threshold: 0.95,
            average_height: 1.7,
            hand_filter: Some(FilterParams::new(0.25, 1.0, 1.0)),
            gaze_filter: FilterParams::new(0.5, 0.25, 1.0),
            pinch: PinchConfig::default(),
            trust_runtime_pinch: true,
            trust_runtime_system_gesture: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl InputConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| ConfigError::Json {
            path: path.to_owned(),
            source,
        })
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults if it's unset or unusable.
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };

        match Self::from_file(Path::new(&path)) {
            Ok(config) => {
                info!("loaded input config from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                warn!("{e}, using default input config");
                Self::default()
            }
        }
    }
}
