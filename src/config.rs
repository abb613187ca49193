//! Game configuration: screen geometry, tick rate, category table, spawn cadence.
//!
//! Built once at startup (defaults, then an optional TOML file, then CLI overrides),
//! validated, and passed by reference into the game state. Nothing mutates it afterwards.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the category table; the sidebar legend and colour cycle assume a short list.
pub const MAX_CATEGORIES: usize = 16;

/// One waste category and where its bin sits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategorySpec {
    pub label: String,
    /// Horizontal centre of this category's bin, logical units.
    pub bin_x: f32,
}

impl CategorySpec {
    pub fn new(label: impl Into<String>, bin_x: f32) -> Self {
        Self {
            label: label.into(),
            bin_x,
        }
    }
}

/// Index into the configured category table. Items and bins match when their categories are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(u8);

impl Category {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How long each sound cue plays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CueDurations {
    pub success_ms: u64,
    pub error_ms: u64,
    pub fatal_ms: u64,
}

impl Default for CueDurations {
    fn default() -> Self {
        Self {
            success_ms: 250,
            error_ms: 300,
            fatal_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    /// Simulation ticks per second.
    pub fps: u32,
    pub categories: Vec<CategorySpec>,
    /// Ticks between spawns at the start of a session.
    pub initial_interval: u32,
    /// Floor for the spawn interval.
    pub min_interval: u32,
    /// Logical units an item falls per tick.
    pub fall_speed: f32,
    /// Horizontal spawn position; `None` means the screen centre.
    pub spawn_x: Option<f32>,
    pub spawn_y: f32,
    pub bin_y: f32,
    pub bin_width: f32,
    pub bin_height: f32,
    pub item_width: f32,
    pub item_height: f32,
    pub sounds: CueDurations,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 626.0,
            screen_height: 417.0,
            fps: 50,
            categories: vec![
                CategorySpec::new("Food", 106.0),
                CategorySpec::new("Bottle", 313.0),
                CategorySpec::new("Paper", 521.0),
            ],
            initial_interval: 60,
            min_interval: 30,
            fall_speed: 2.0,
            spawn_x: None,
            spawn_y: 0.0,
            bin_y: 350.0,
            bin_width: 90.0,
            bin_height: 100.0,
            item_width: 40.0,
            item_height: 40.0,
            sounds: CueDurations::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("screen dimensions must be positive (got {width}x{height})")]
    ScreenSize { width: f32, height: f32 },
    #[error("fps must be at least 1")]
    ZeroFps,
    #[error("at least one category is required")]
    NoCategories,
    #[error("too many categories: {0} (max {MAX_CATEGORIES})")]
    TooManyCategories(usize),
    #[error("category {0} has an empty label")]
    EmptyLabel(usize),
    #[error("min_interval must be at least 1")]
    ZeroMinInterval,
    #[error("initial_interval ({initial}) is below min_interval ({min})")]
    IntervalBelowFloor { initial: u32, min: u32 },
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    #[error("{0} must be a finite number")]
    NonFinite(String),
}

impl GameConfig {
    /// Read a TOML file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reject values the simulation cannot run with. Called once after all layers are merged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.screen_width) || !positive(self.screen_height) {
            return Err(ConfigError::ScreenSize {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        if self.categories.len() > MAX_CATEGORIES {
            return Err(ConfigError::TooManyCategories(self.categories.len()));
        }
        if let Some(i) = self.categories.iter().position(|c| c.label.trim().is_empty()) {
            return Err(ConfigError::EmptyLabel(i));
        }
        if self.min_interval == 0 {
            return Err(ConfigError::ZeroMinInterval);
        }
        if self.initial_interval < self.min_interval {
            return Err(ConfigError::IntervalBelowFloor {
                initial: self.initial_interval,
                min: self.min_interval,
            });
        }
        let positions = [("spawn_y", self.spawn_y), ("bin_y", self.bin_y)]
            .into_iter()
            .chain(self.spawn_x.map(|x| ("spawn_x", x)));
        for (name, value) in positions {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name.to_string()));
            }
        }
        if let Some(i) = self.categories.iter().position(|c| !c.bin_x.is_finite()) {
            return Err(ConfigError::NonFinite(format!("categories[{i}].bin_x")));
        }
        let sizes = [
            ("fall_speed", self.fall_speed),
            ("bin_width", self.bin_width),
            ("bin_height", self.bin_height),
            ("item_width", self.item_width),
            ("item_height", self.item_height),
        ];
        for (name, value) in sizes {
            if !positive(value) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        Ok(())
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// All categories in table order.
    pub fn all_categories(&self) -> impl Iterator<Item = Category> + '_ {
        (0..self.categories.len()).map(|i| Category::new(i as u8))
    }

    pub fn label(&self, category: Category) -> &str {
        self.categories
            .get(category.index())
            .map(|c| c.label.as_str())
            .unwrap_or("?")
    }

    pub fn spawn_x(&self) -> f32 {
        self.spawn_x.unwrap_or(self.screen_width / 2.0)
    }

    /// Whole ticks needed to cover `d`, rounded up.
    pub fn ticks_for(&self, d: Duration) -> u32 {
        let ticks = (d.as_millis() * u128::from(self.fps)).div_ceil(1000);
        ticks.min(u128::from(u32::MAX)) as u32
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Strictly positive and finite; NaN fails.
fn positive(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}
