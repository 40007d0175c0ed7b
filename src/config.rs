//! Display settings read from `rtlayers.toml`.

use iced::Color;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "RTLAYERS_CONFIG";
const CONFIG_FILE: &str = "rtlayers.toml";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct IsoDoseLevel {
    /// Percent of the prescribed dose.
    pub level: f64,
    pub color: [u8; 3],
}

impl IsoDoseLevel {
    pub fn color(&self) -> Color {
        let [r, g, b] = self.color;
        Color::from_rgb8(r, g, b)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RtDisplayConfig {
    pub structure_thickness: f32,
    pub isodose_thickness: f32,
    /// Used as plane tolerance when an image has no SliceThickness.
    pub plane_tolerance_mm: f64,
    /// Opacity of filled RT graphics.
    pub fill_alpha: f32,
    pub isodose_levels: Vec<IsoDoseLevel>,
}

impl Default for RtDisplayConfig {
    fn default() -> Self {
        let iso = |level, color| IsoDoseLevel { level, color };
        Self {
            structure_thickness: 1.0,
            isodose_thickness: 1.0,
            plane_tolerance_mm: 0.5,
            fill_alpha: 0.35,
            isodose_levels: vec![
                iso(105.0, [255, 0, 255]),
                iso(100.0, [255, 0, 0]),
                iso(95.0, [255, 128, 0]),
                iso(90.0, [255, 255, 0]),
                iso(80.0, [0, 255, 0]),
                iso(50.0, [0, 255, 255]),
                iso(30.0, [0, 0, 255]),
            ],
        }
    }
}

impl RtDisplayConfig {
    /// Reads the config file, falling back to defaults when it is missing
    /// or malformed.
    pub fn load() -> Self {
        Self::load_from_file(&Self::config_path())
    }

    pub fn load_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => {
                    log::info!("Loaded display settings from {}", path.display());
                    config
                }
                Err(err) => {
                    log::warn!("{}: {err}, using default settings", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No settings file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(content).map_err(|err| format!("invalid settings ({err})"))?;
        if !(0.0..=1.0).contains(&config.fill_alpha) {
            return Err(format!("fill_alpha {} is outside 0..=1", config.fill_alpha));
        }
        if config.plane_tolerance_mm < 0.0 {
            return Err(String::from("plane_tolerance_mm must not be negative"));
        }
        Ok(config)
    }

    /// `$RTLAYERS_CONFIG`, else `rtlayers.toml` next to the executable.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE)
    }
}
