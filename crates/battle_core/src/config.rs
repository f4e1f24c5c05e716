//! Simulation configuration.
//!
//! Defaults reproduce the classic battleground: a 1000x700 field, 300
//! agents, two heroes and one special character. Configs can be loaded
//! from RON so batch runs and the headless runner share one format.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Highest supported hero count (one per [`HeroKind`](crate::components::HeroKind)).
pub const MAX_HEROES: u8 = 2;

/// Play-field dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Field width.
    pub width: f32,
    /// Field height.
    pub height: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
        }
    }
}

/// Conversion from wall-clock time to simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Upper bound on a single wall-clock delta, in milliseconds.
    pub max_frame_ms: f32,
    /// Milliseconds that make up one frame unit at speed 1.
    pub frame_ms_baseline: f32,
    /// User-selected speed multiplier.
    pub speed: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_frame_ms: 40.0,
            frame_ms_baseline: 16.0,
            speed: 1.0,
        }
    }
}

/// Optional custom images for the special agents.
///
/// Pure presentation data: the engine carries these paths for the
/// rendering collaborator and never reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Image for the first hero.
    pub superman_image: Option<String>,
    /// Image for the second hero.
    pub batman_image: Option<String>,
    /// Image for the special character.
    pub walter_image: Option<String>,
}

/// Full simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Field dimensions.
    pub field: FieldConfig,
    /// Number of agents created on reset.
    pub population: u32,
    /// Number of heroes (0..=2).
    pub hero_count: u8,
    /// Fraction of normal agents given a melee weapon instead of a ranged one.
    pub melee_fraction: f32,
    /// Wall-clock to frame-unit conversion.
    pub timing: TimingConfig,
    /// Presentation-only asset overrides.
    pub assets: AssetConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            population: 300,
            hero_count: MAX_HEROES,
            melee_fraction: 0.0,
            timing: TimingConfig::default(),
            assets: AssetConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load a configuration from a RON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Parse a configuration from a RON string and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: SimConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the population size.
    #[must_use]
    pub fn with_population(mut self, population: u32) -> Self {
        self.population = population;
        self
    }

    /// Builder method to set the hero count.
    #[must_use]
    pub fn with_heroes(mut self, hero_count: u8) -> Self {
        self.hero_count = hero_count;
        self
    }

    /// Builder method to set the field size.
    #[must_use]
    pub fn with_field(mut self, width: f32, height: f32) -> Self {
        self.field = FieldConfig { width, height };
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        fn positive(field: &'static str, value: f32) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }

        positive("field.width", self.field.width)?;
        positive("field.height", self.field.height)?;
        positive("timing.max_frame_ms", self.timing.max_frame_ms)?;
        positive("timing.frame_ms_baseline", self.timing.frame_ms_baseline)?;
        positive("timing.speed", self.timing.speed)?;

        if self.hero_count > MAX_HEROES {
            return Err(SimError::InvalidConfig {
                field: "hero_count",
                reason: format!("must be at most {MAX_HEROES}, got {}", self.hero_count),
            });
        }

        if !(0.0..=1.0).contains(&self.melee_fraction) {
            return Err(SimError::InvalidConfig {
                field: "melee_fraction",
                reason: format!("must be within [0, 1], got {}", self.melee_fraction),
            });
        }

        Ok(())
    }
}
