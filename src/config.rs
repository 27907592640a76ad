//! Layout and comparison configuration
//!
//! Both structs deserialize with `#[serde(default)]`, so a JSON document only needs the
//! fields it overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How staves are broken
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowMode {
    /// Break exactly where the source has LineEnd events
    Manuscript,
    /// Ignore source line ends and break by group count
    AutoFlow,
}

impl Default for FlowMode {
    fn default() -> Self {
        FlowMode::Manuscript
    }
}

/// Configuration for the staff layout engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Available width of one staff
    pub staff_width: f32,

    /// X of the first group on every staff
    pub left_margin: f32,

    /// Padding floor; content wider than the staff overflows instead of compressing further
    pub min_padding: f32,

    /// Padding ceiling for sparse staves
    pub max_padding: f32,

    /// Padding used for unjustified staves (last staff, incipits)
    pub default_padding: f32,

    pub flow: FlowMode,

    /// Soft group count threshold for AutoFlow breaking
    pub groups_per_staff: usize,

    /// Display clefs and signatures in their modern form
    pub use_modern_clefs: bool,

    /// Justify the last staff of a voice like every other staff
    pub justify_last_staff: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            staff_width: 600.0,
            left_margin: 0.0,
            min_padding: 2.0,
            max_padding: 40.0,
            default_padding: 10.0,
            flow: FlowMode::Manuscript,
            groups_per_staff: 24,
            use_modern_clefs: false,
            justify_last_staff: false,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.staff_width.is_nan() || self.staff_width <= 0.0 {
            return Err(ConfigError::StaffWidth(self.staff_width));
        }
        if self.min_padding.is_nan() || self.max_padding.is_nan() || self.min_padding > self.max_padding {
            return Err(ConfigError::PaddingRange {
                min: self.min_padding,
                max: self.max_padding,
            });
        }
        if self.groups_per_staff == 0 {
            return Err(ConfigError::GroupsPerStaff);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!("loaded layout config: {:?}", config);
        Ok(config)
    }

    /// `(low, high)` padding bounds, ordered even when the config is not.
    /// A NaN bound is ignored.
    pub fn padding_bounds(&self) -> (f32, f32) {
        let low = self.min_padding.min(self.max_padding);
        let high = self.max_padding.max(self.min_padding);
        (low, high)
    }

    /// Keep `padding` inside [`padding_bounds`](Self::padding_bounds); never panics
    pub fn clamp_padding(&self, padding: f32) -> f32 {
        let (low, high) = self.padding_bounds();
        padding.max(low).min(high)
    }

    /// Default padding kept inside the configured clamp range
    pub fn clamped_default_padding(&self) -> f32 {
        self.clamp_padding(self.default_padding)
    }
}

/// Options for the variant comparator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Ignore rhythm mismatches at onsets that are whole multiples of three minims.
    /// Approximates sesquialtera/tripla rescaling; it can hide real differences.
    pub skip_triple_positions: bool,

    /// Compare principal clefs by their modern form
    pub use_modern_clefs: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            skip_triple_positions: true,
            use_modern_clefs: false,
        }
    }
}
