use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color::{ColorMode, Rgba};
use crate::controls;
use crate::display::DrawMode;
use crate::visualizer::{Circle, VisualizationState};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub circle: CircleConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Logical circle the chords are computed on. The renderer scales it to fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            center_x: 600.0,
            center_y: 400.0,
            radius: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub num_points: usize,
    pub multiplier: f64,
    pub multiplier_increment: f64,
    pub interval_ms: u64,
    pub start_paused: bool,
    pub color_mode: ColorMode,
    pub draw_mode: DrawMode,
    /// Seed for random colours; omit for a different sequence every run
    pub seed: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            num_points: 10,
            multiplier: 2.0,
            multiplier_increment: 0.1,
            interval_ms: 1,
            start_paused: true,
            color_mode: ColorMode::Random,
            draw_mode: DrawMode::Revolution,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub fps: u32,
    pub outline_color: RgbColor,
    pub line_color: RgbColor,
    pub show_status: bool,
    /// Listen for commands on the control socket
    pub ipc: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            // dark salmon
            outline_color: RgbColor {
                r: 233,
                g: 150,
                b: 122,
            },
            line_color: RgbColor {
                r: 255,
                g: 255,
                b: 255,
            },
            show_status: true,
            ipc: true,
        }
    }
}

/// RGB color representation for configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Parse from hex string like "#FF0000" or "FF0000"
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_rgba(self) -> Rgba {
        Rgba::from_rgb8(self.r, self.g, self.b)
    }

    pub fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

/// Sweep parameters written back by the "save settings" action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedSweep {
    pub num_points: usize,
    pub multiplier: f64,
    pub multiplier_increment: f64,
    pub interval_ms: u64,
    pub color_mode: ColorMode,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        config.sweep.multiplier_increment =
            controls::clamp_increment(config.sweep.multiplier_increment);
        config.sweep.interval_ms = controls::clamp_interval(config.sweep.interval_ms);
        config.validate()?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/timestable/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("timestable").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists
    /// Returns None if file doesn't exist, logs warning on parse errors
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("{:#}; using defaults", e);
                    None
                }
            }
        } else {
            None
        }
    }

    /// Initialize default config file at XDG path, returns the path
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, Self::generate_config_template())?;

        Ok(path)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=controls::POINTS_MAX).contains(&self.sweep.num_points) {
            bail!("sweep.num_points must be between 1 and {}", controls::POINTS_MAX);
        }
        if !(self.sweep.multiplier.is_finite()
            && self.sweep.multiplier.abs() <= controls::MULTIPLIER_LIMIT)
        {
            bail!(
                "sweep.multiplier must be a number within ±{}",
                controls::MULTIPLIER_LIMIT
            );
        }
        if !(controls::INCREMENT_MIN..=controls::INCREMENT_MAX)
            .contains(&self.sweep.multiplier_increment)
        {
            bail!(
                "sweep.multiplier_increment must be between {} and {}",
                controls::INCREMENT_MIN,
                controls::INCREMENT_MAX
            );
        }
        if !(self.circle.radius.is_finite() && self.circle.radius > 0.0) {
            bail!("circle.radius must be a positive number");
        }
        if self.display.fps == 0 {
            bail!("display.fps must be at least 1");
        }
        Ok(())
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.circle.center_x, self.circle.center_y, self.circle.radius)
    }

    pub fn initial_state(&self) -> VisualizationState {
        VisualizationState {
            num_points: self.sweep.num_points,
            multiplier: self.sweep.multiplier,
            multiplier_increment: self.sweep.multiplier_increment,
            current_point: 0,
            draw_color: self.display.line_color.to_rgba(),
            paused: self.sweep.start_paused,
            interval_millis: self.sweep.interval_ms,
        }
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r#"# Times Tables Configuration
# This file is auto-generated. Edit as needed.

[circle]
# Logical circle the chords are computed on (scaled to fit the terminal)
center_x = 600.0
center_y = 400.0
radius = 200.0

[sweep]
# Points evenly spaced around the circle
num_points = 10
# Starting times table (fractions allowed)
multiplier = 2.0
# Added to the multiplier after every full revolution
multiplier_increment = 0.1
# Minimum delay between redraws in milliseconds (0-1000)
interval_ms = 1
# Start paused; press space to run
start_paused = true
# Colour after each revolution: "fixed", "random", "cycle"
color_mode = "random"
# "revolution" draws a whole table per tick, "chord" one line per tick
draw_mode = "revolution"
# Seed for reproducible random colours
# seed = 42

[display]
# Frames per second of the terminal loop
fps = 60
# Circle outline colour
outline_color = { r = 233, g = 150, b = 122 }
# Colour of the first revolution's chords
line_color = { r = 255, g = 255, b = 255 }
# Show the key/status line
show_status = true
# Accept commands on the control socket (timestable --send ...)
ipc = true
"#
        .to_string()
    }

    /// Merge CLI arguments into config (CLI takes priority)
    pub(crate) fn merge_args(&mut self, args: &crate::Args) {
        if let Some(points) = args.points {
            self.sweep.num_points = points;
        }
        if let Some(multiplier) = args.multiplier {
            self.sweep.multiplier = multiplier;
        }
        if let Some(increment) = args.increment {
            self.sweep.multiplier_increment = controls::clamp_increment(increment);
        }
        if let Some(interval) = args.interval {
            self.sweep.interval_ms = controls::clamp_interval(interval);
        }
        if let Some(mode) = args.color_mode {
            self.sweep.color_mode = mode;
        }
        if let Some(mode) = args.draw_mode {
            self.sweep.draw_mode = mode;
        }
        if args.seed.is_some() {
            self.sweep.seed = args.seed;
        }
        if args.run {
            self.sweep.start_paused = false;
        }
        if args.no_ipc {
            self.display.ipc = false;
        }
        if let Some(ref color) = args.line_color {
            if let Some(parsed) = RgbColor::from_hex(color) {
                self.display.line_color = parsed;
            } else {
                tracing::warn!("Ignoring invalid line colour '{}'", color);
            }
        }
    }
}

/// Rewrite the `[sweep]` values in an existing TOML document, keeping
/// comments and unrelated keys intact.
pub fn apply_saved_sweep(content: &str, saved: &SavedSweep) -> Result<String> {
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .context("Failed to parse config for save")?;

    if !doc.contains_key("sweep") {
        doc["sweep"] = toml_edit::table();
    }
    doc["sweep"]["num_points"] = toml_edit::value(saved.num_points as i64);
    doc["sweep"]["multiplier"] = toml_edit::value(saved.multiplier);
    doc["sweep"]["multiplier_increment"] = toml_edit::value(saved.multiplier_increment);
    doc["sweep"]["interval_ms"] = toml_edit::value(saved.interval_ms as i64);
    doc["sweep"]["color_mode"] = toml_edit::value(saved.color_mode.name());

    Ok(doc.to_string())
}

/// Save sweep parameters to `path`, creating it from the template if needed.
pub fn save_sweep_settings(path: &Path, saved: &SavedSweep) -> Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Config::generate_config_template())
            .with_context(|| format!("Failed to create config file at {}", path.display()))?;
        tracing::info!("Created config file at {}", path.display());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let updated = apply_saved_sweep(&content, saved)?;
    std::fs::write(path, updated)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}
