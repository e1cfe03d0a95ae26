//! Machine settings
//!
//! Tuning, layout, sequencing pace and the asset manifest, loaded from JSON.
//! Every field has a default so partial files work.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::TextureInfo;
use crate::audio::SoundDef;
use crate::consts::*;
use crate::scene::Rect;
use crate::sim::Easing;

/// Settings load/validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Spin pacing presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpinPace {
    #[default]
    Normal,
    Turbo,
}

impl SpinPace {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinPace::Normal => "Normal",
            SpinPace::Turbo => "Turbo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(SpinPace::Normal),
            "turbo" | "fast" => Some(SpinPace::Turbo),
            _ => None,
        }
    }

    /// Multiplier applied to the normal sequence timing
    pub fn time_scale(&self) -> f32 {
        match self {
            SpinPace::Normal => 1.0,
            SpinPace::Turbo => 0.5,
        }
    }
}

/// Start/stop sequencing delays (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinTiming {
    /// Delay between consecutive reel starts
    pub start_interval_ms: f32,
    /// Dwell at full speed before the first stop
    pub hold_ms: f32,
    /// Delay between consecutive reel stops
    pub stop_interval_ms: f32,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self::from_pace(SpinPace::Normal)
    }
}

impl SpinTiming {
    pub fn from_pace(pace: SpinPace) -> Self {
        Self {
            start_interval_ms: START_INTERVAL_MS,
            hold_ms: HOLD_MS,
            stop_interval_ms: STOP_INTERVAL_MS,
        }
        .scaled(pace.time_scale())
    }

    /// Scale every delay by `factor` (< 1.0 = faster)
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            start_interval_ms: self.start_interval_ms * factor,
            hold_ms: self.hold_ms * factor,
            stop_interval_ms: self.stop_interval_ms * factor,
        }
    }
}

/// Reel motion constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelTuning {
    /// Speed while spinning (pixels per frame, sign picks the direction)
    pub spin_speed: f32,
    /// Per-frame speed multiplier while decelerating
    pub slowdown_rate: f32,
    pub stop_threshold: f32,
    pub stop_floor: f32,
    pub settle_epsilon: f32,
    /// Glide to the grid (seconds)
    pub settle_duration: f32,
    pub settle_easing: Easing,
    /// Bounce after the glide (seconds)
    pub bounce_duration: f32,
    pub bounce_easing: Easing,
    /// Glide past the grid line by this fraction of a cell, then bounce back
    pub bounce_overshoot: f32,
}

impl Default for ReelTuning {
    fn default() -> Self {
        Self {
            spin_speed: SPIN_SPEED,
            slowdown_rate: SLOWDOWN_RATE,
            stop_threshold: STOP_THRESHOLD,
            stop_floor: STOP_FLOOR,
            settle_epsilon: SETTLE_EPSILON,
            settle_duration: SETTLE_DURATION,
            settle_easing: Easing::CubicOut,
            bounce_duration: BOUNCE_DURATION,
            bounce_easing: Easing::BackOut,
            bounce_overshoot: 0.0,
        }
    }
}

/// Machine geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineLayout {
    pub reel_count: usize,
    pub symbols_per_reel: usize,
    pub symbol_size: f32,
    pub reel_spacing: f32,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Default for MachineLayout {
    fn default() -> Self {
        Self {
            reel_count: REEL_COUNT,
            symbols_per_reel: SYMBOLS_PER_REEL,
            symbol_size: SYMBOL_SIZE,
            reel_spacing: REEL_SPACING,
            screen_width: 1280.0,
            screen_height: 960.0,
        }
    }
}

impl MachineLayout {
    /// Width of one reel's visible window
    pub fn reel_width(&self) -> f32 {
        self.symbol_size * self.symbols_per_reel as f32
    }

    /// Height of all reels stacked, spacing included
    pub fn reels_height(&self) -> f32 {
        let gaps = self.reel_count.saturating_sub(1) as f32;
        self.symbol_size * self.reel_count as f32 + self.reel_spacing * gaps
    }

    /// Machine container position, centered on screen
    pub fn machine_position(&self) -> Vec2 {
        Vec2::new(
            self.screen_width / 2.0 - self.reel_width() / 2.0,
            self.screen_height / 2.0 - self.reels_height() / 2.0 - 30.0,
        )
    }

    /// Offset of the reels container inside the machine
    pub fn reels_offset(&self) -> Vec2 {
        Vec2::new(self.symbol_size, 0.0)
    }

    /// Position of reel `index` inside the reels container
    pub fn reel_position(&self, index: usize) -> Vec2 {
        Vec2::new(
            0.0,
            index as f32 * (self.symbol_size + self.reel_spacing) + self.symbol_size / 2.0,
        )
    }

    /// Backdrop behind the reels (machine space)
    pub fn backdrop(&self) -> Rect {
        Rect::new(0.0, 0.0, self.reel_width(), self.reels_height()).inflate(20.0)
    }

    /// Clip window over the reels (reels-container space)
    pub fn mask(&self) -> Rect {
        Rect::new(
            -self.symbol_size,
            0.0,
            self.reel_width(),
            self.reels_height(),
        )
    }
}

/// A symbol type: texture name plus vertical fine-tune
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    pub name: String,
    #[serde(default)]
    pub offset: f32,
}

impl SymbolDef {
    pub fn new(name: impl Into<String>, offset: f32) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

/// Default symbol table
pub fn default_symbols() -> Vec<SymbolDef> {
    vec![
        SymbolDef::new("symbol1.png", 0.0),
        SymbolDef::new("symbol2.png", 0.0),
        SymbolDef::new("symbol3.png", 15.0),
        SymbolDef::new("symbol4.png", 15.0),
        SymbolDef::new("symbol5.png", 0.0),
    ]
}

fn default_textures() -> Vec<TextureInfo> {
    default_symbols()
        .into_iter()
        .map(|def| TextureInfo {
            name: def.name,
            width: 256,
            height: 256,
        })
        .collect()
}

fn default_sounds() -> Vec<SoundDef> {
    [
        ("Reel spin", "assets/sounds/Reel spin.webm"),
        ("win", "assets/sounds/win.webm"),
    ]
    .into_iter()
    .map(|(alias, url)| SoundDef {
        alias: alias.to_string(),
        url: url.to_string(),
    })
    .collect()
}

/// Complete machine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sequencing preset; sequence timing is derived from it unless overridden
    pub pace: SpinPace,
    /// Explicit sequence timing, replacing the pace preset's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<SpinTiming>,
    pub layout: MachineLayout,
    pub tuning: ReelTuning,

    // === Assets ===
    pub symbols: Vec<SymbolDef>,
    pub textures: Vec<TextureInfo>,
    pub sounds: Vec<SoundDef>,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Outcome ===
    /// Chance the placeholder win check reports a win
    pub win_probability: f64,
    /// Run seed for reproducible strips and outcomes
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pace: SpinPace::Normal,
            timing: None,
            layout: MachineLayout::default(),
            tuning: ReelTuning::default(),

            symbols: default_symbols(),
            textures: default_textures(),
            sounds: default_sounds(),

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            win_probability: WIN_PROBABILITY,
            seed: 0,
        }
    }
}

impl Settings {
    /// Create settings from a pace preset
    pub fn from_pace(pace: SpinPace) -> Self {
        let mut settings = Self::default();
        settings.apply_pace(pace);
        settings
    }

    /// Apply a pace preset (drops any timing override)
    pub fn apply_pace(&mut self, pace: SpinPace) {
        self.pace = pace;
        self.timing = None;
    }

    /// Sequence timing in effect: the override if set, else the pace preset's
    pub fn timing(&self) -> SpinTiming {
        self.timing.unwrap_or_else(|| SpinTiming::from_pace(self.pace))
    }

    /// Check values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        let tuning = &self.tuning;
        if layout.reel_count == 0 {
            return Err(ConfigError::Invalid("reel_count must be at least 1".into()));
        }
        if layout.symbols_per_reel == 0 {
            return Err(ConfigError::Invalid(
                "symbols_per_reel must be at least 1".into(),
            ));
        }
        if layout.symbol_size <= 0.0 {
            return Err(ConfigError::Invalid("symbol_size must be positive".into()));
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("symbol table is empty".into()));
        }
        if tuning.spin_speed == 0.0 || !tuning.spin_speed.is_finite() {
            return Err(ConfigError::Invalid("spin_speed must be non-zero".into()));
        }
        if !(tuning.slowdown_rate > 0.0 && tuning.slowdown_rate < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "slowdown_rate must be in (0, 1), got {}",
                tuning.slowdown_rate
            )));
        }
        if tuning.stop_floor <= 0.0 || tuning.settle_epsilon <= 0.0 {
            return Err(ConfigError::Invalid(
                "stop_floor and settle_epsilon must be positive".into(),
            ));
        }
        if tuning.settle_duration < 0.0 || tuning.bounce_duration < 0.0 {
            return Err(ConfigError::Invalid("durations must not be negative".into()));
        }
        let timing = self.timing();
        if timing.start_interval_ms < 0.0 || timing.hold_ms < 0.0 || timing.stop_interval_ms < 0.0
        {
            return Err(ConfigError::Invalid("spin delays must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.win_probability) {
            return Err(ConfigError::Invalid(
                "win_probability must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
