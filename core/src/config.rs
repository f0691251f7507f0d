//! Workspace configuration.

use serde::{Deserialize, Serialize};

/// Closed interval test values are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRange {
    pub low: f64,
    pub high: f64,
}

impl SampleRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Ranges for the per-variable test point.
///
/// Angle-like variables feed inverse trigonometric functions, so both their
/// value and uncertainty are kept inside a narrow band around zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub value: SampleRange,
    pub uncertainty: SampleRange,
    pub angle_value: SampleRange,
    pub angle_uncertainty: SampleRange,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            value: SampleRange::new(0.0, 100.0),
            uncertainty: SampleRange::new(0.0, 1.0),
            angle_value: SampleRange::new(-0.5, 0.5),
            angle_uncertainty: SampleRange::new(-0.5, 0.5),
        }
    }
}

impl SamplingConfig {
    /// (value range, uncertainty range) for a variable
    pub fn ranges(&self, angle_like: bool) -> (SampleRange, SampleRange) {
        if angle_like {
            (self.angle_value, self.angle_uncertainty)
        } else {
            (self.value, self.uncertainty)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Seed for the default test-value sampler
    pub seed: u64,
    pub sampling: SamplingConfig,
    /// Simplify equations before deriving bounds
    pub simplify: bool,
    /// Rounding applied to evaluated rows
    pub decimal_places: u32,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            sampling: SamplingConfig::default(),
            simplify: true,
            decimal_places: 6,
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: WorkspaceConfig = serde_json::from_str(r#"{ "seed": 42 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert!(config.simplify);
        assert_eq!(config.decimal_places, 6);
        assert_eq!(config.sampling, SamplingConfig::default());
    }

    #[test]
    fn test_angle_ranges() {
        let sampling = SamplingConfig::default();
        let (value, uncertainty) = sampling.ranges(true);
        assert!(value.contains(0.25) && !value.contains(2.0));
        assert!(uncertainty.contains(-0.5));

        let (value, uncertainty) = sampling.ranges(false);
        assert!(value.contains(75.0));
        assert!(!uncertainty.contains(1.5));
    }
}
