use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Area threshold used with Canny edge binarization.
pub const EDGE_AREA_THRESHOLD: f64 = 1000.0;
/// Area threshold used with adaptive binarization, whose contours hug the card more loosely.
pub const ADAPTIVE_AREA_THRESHOLD: f64 = 6000.0;
/// Upper bound on `max_cards`; the preview stacks one slot per card
pub const MAX_CARDS: usize = 64;
/// Upper bound on either side of a rectified card
pub const MAX_CARD_SIDE: u32 = 4096;

/// How a smoothed luminance frame is turned into a binary map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreprocessMode {
    /// Canny gradient edges with hysteresis thresholds
    Edges { low: f32, high: f32 },
    /// Inverted Gaussian-weighted local threshold
    Adaptive { block_size: u32, offset: f64 },
}

impl PreprocessMode {
    pub fn edges() -> Self {
        Self::Edges {
            low: 75.0,
            high: 200.0,
        }
    }

    pub fn adaptive() -> Self {
        Self::Adaptive {
            block_size: 11,
            offset: 2.0,
        }
    }

    /// Default minimum card area for this mode
    pub fn default_area_threshold(&self) -> f64 {
        match self {
            Self::Edges { .. } => EDGE_AREA_THRESHOLD,
            Self::Adaptive { .. } => ADAPTIVE_AREA_THRESHOLD,
        }
    }
}

impl Default for PreprocessMode {
    fn default() -> Self {
        Self::edges()
    }
}

/// Tunables for the card detection pipeline.
///
/// Every field has a default, so a JSON file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Candidates must enclose strictly more than this many square pixels
    pub area_threshold: f64,
    /// Width of each rectified card
    pub card_width: u32,
    /// Height of each rectified card
    pub card_height: u32,
    /// Maximum number of rectified cards produced per frame
    pub max_cards: usize,
    pub mode: PreprocessMode,
    /// Side of the square Gaussian smoothing kernel
    pub blur_kernel: u32,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter
    pub epsilon_factor: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::for_mode(PreprocessMode::default())
    }
}

impl DetectorConfig {
    /// Defaults for the given mode, including its area threshold
    pub fn for_mode(mode: PreprocessMode) -> Self {
        Self {
            area_threshold: mode.default_area_threshold(),
            card_width: 250,
            card_height: 350,
            max_cards: 3,
            mode,
            blur_kernel: 5,
            epsilon_factor: 0.02,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    pub fn card_size(&self) -> (u32, u32) {
        (self.card_width, self.card_height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(ConfigError::BlurKernel(self.blur_kernel));
        }

        match self.mode {
            PreprocessMode::Edges { low, high } => {
                if !(low >= 0.0 && low <= high) {
                    return Err(ConfigError::CannyThresholds { low, high });
                }
            }
            PreprocessMode::Adaptive { block_size, offset } => {
                if block_size < 3 || block_size % 2 == 0 {
                    return Err(ConfigError::BlockSize(block_size));
                }
                if !offset.is_finite() {
                    return Err(ConfigError::AdaptiveOffset(offset));
                }
            }
        }

        if !self.epsilon_factor.is_finite() || self.epsilon_factor <= 0.0 {
            return Err(ConfigError::EpsilonFactor(self.epsilon_factor));
        }
        if !self.area_threshold.is_finite() || self.area_threshold < 0.0 {
            return Err(ConfigError::AreaThreshold(self.area_threshold));
        }
        let side_ok = |side: u32| (1..=MAX_CARD_SIDE).contains(&side);
        if !side_ok(self.card_width) || !side_ok(self.card_height) {
            return Err(ConfigError::CardSize {
                width: self.card_width,
                height: self.card_height,
                max: MAX_CARD_SIDE,
            });
        }
        if self.max_cards == 0 {
            return Err(ConfigError::NoPreviewSlots);
        }
        if self.max_cards > MAX_CARDS {
            return Err(ConfigError::TooManyCards {
                got: self.max_cards,
                max: MAX_CARDS,
            });
        }

        Ok(())
    }
}
