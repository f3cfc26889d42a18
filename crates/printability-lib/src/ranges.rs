//! Parameter range registry
//!
//! Single source of truth for the plausible range, step and default of each
//! user-facing input. Purely descriptive: inference never consults it, but
//! boundary layers use it to render controls and reject out-of-range input.

use crate::error::{PredictionError, RangeError};
use crate::models::PrintParameters;
use serde::{Deserialize, Serialize};

/// Range metadata for one input parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step,
            default,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, key: &'static str) -> Result<(), RangeError> {
        let values = [self.min, self.max, self.step, self.default];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RangeError::NonFinite { key });
        }
        if self.min > self.max {
            return Err(RangeError::Inverted {
                key,
                min: self.min,
                max: self.max,
            });
        }
        if !self.contains(self.default) {
            return Err(RangeError::DefaultOutOfRange {
                key,
                default: self.default,
                min: self.min,
                max: self.max,
            });
        }
        if self.step <= 0.0 {
            return Err(RangeError::NonPositiveStep { key });
        }
        Ok(())
    }
}

/// Ranges for the six user-facing parameters.
///
/// Every construction path (including deserialization) checks
/// `min <= default <= max` and a positive step for each entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRegistry")]
pub struct ParameterRangeRegistry {
    silk: ParameterRange,
    gelatin: ParameterRange,
    needle: ParameterRange,
    height: ParameterRange,
    pressure: ParameterRange,
    temp: ParameterRange,
}

/// Unchecked wire form of the registry
#[derive(Deserialize)]
struct RawRegistry {
    silk: ParameterRange,
    gelatin: ParameterRange,
    needle: ParameterRange,
    height: ParameterRange,
    pressure: ParameterRange,
    temp: ParameterRange,
}

impl TryFrom<RawRegistry> for ParameterRangeRegistry {
    type Error = RangeError;

    fn try_from(raw: RawRegistry) -> Result<Self, Self::Error> {
        Self::new(
            raw.silk,
            raw.gelatin,
            raw.needle,
            raw.height,
            raw.pressure,
            raw.temp,
        )
    }
}

impl ParameterRangeRegistry {
    /// Silk fibroin content (% w/v)
    pub const SILK: ParameterRange = ParameterRange::new(2.0, 10.0, 0.1, 4.0);
    /// Gelatin content (% w/v)
    pub const GELATIN: ParameterRange = ParameterRange::new(10.0, 20.0, 0.1, 15.0);
    /// Needle gauge
    pub const NEEDLE: ParameterRange = ParameterRange::new(10.0, 35.0, 1.0, 22.0);
    /// Layer height (mm)
    pub const HEIGHT: ParameterRange = ParameterRange::new(0.01, 0.5, 0.01, 0.1);
    /// Extrusion pressure (psi)
    pub const PRESSURE: ParameterRange = ParameterRange::new(1.0, 15.0, 0.1, 6.0);
    /// Print temperature (°C)
    pub const TEMP: ParameterRange = ParameterRange::new(15.0, 40.0, 0.5, 25.0);

    /// Build a registry, rejecting any entry that violates min <= default <= max
    pub fn new(
        silk: ParameterRange,
        gelatin: ParameterRange,
        needle: ParameterRange,
        height: ParameterRange,
        pressure: ParameterRange,
        temp: ParameterRange,
    ) -> Result<Self, RangeError> {
        let registry = Self {
            silk,
            gelatin,
            needle,
            height,
            pressure,
            temp,
        };
        for (key, range) in registry.entries() {
            range.validate(key)?;
        }
        Ok(registry)
    }

    /// Entries keyed by their input-surface names
    pub fn entries(&self) -> [(&'static str, &ParameterRange); 6] {
        [
            ("silk", &self.silk),
            ("gelatin", &self.gelatin),
            ("needle", &self.needle),
            ("height", &self.height),
            ("pressure", &self.pressure),
            ("temp", &self.temp),
        ]
    }

    pub fn silk(&self) -> &ParameterRange {
        &self.silk
    }

    pub fn gelatin(&self) -> &ParameterRange {
        &self.gelatin
    }

    pub fn needle(&self) -> &ParameterRange {
        &self.needle
    }

    pub fn height(&self) -> &ParameterRange {
        &self.height
    }

    pub fn pressure(&self) -> &ParameterRange {
        &self.pressure
    }

    pub fn temp(&self) -> &ParameterRange {
        &self.temp
    }

    pub fn get(&self, key: &str) -> Option<&ParameterRange> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, range)| range)
    }

    /// Parameters at every entry's default
    pub fn defaults(&self, crosslinker: bool) -> PrintParameters {
        PrintParameters {
            silk_pct: self.silk.default,
            gelatin_pct: self.gelatin.default,
            crosslinker,
            needle_gauge: self.needle.default as i32,
            layer_height_mm: self.height.default,
            pressure_psi: self.pressure.default,
            temp_c: self.temp.default,
        }
    }

    /// Reject the first non-finite or out-of-range parameter
    pub fn validate(&self, params: &PrintParameters) -> Result<(), PredictionError> {
        let checks = [
            ("silk", params.silk_pct, &self.silk),
            ("gelatin", params.gelatin_pct, &self.gelatin),
            ("needle", f64::from(params.needle_gauge), &self.needle),
            ("height", params.layer_height_mm, &self.height),
            ("pressure", params.pressure_psi, &self.pressure),
            ("temp", params.temp_c, &self.temp),
        ];
        for (key, value, range) in checks {
            if !value.is_finite() {
                return Err(PredictionError::InvalidInput(format!(
                    "{key} must be a number"
                )));
            }
            if !range.contains(value) {
                return Err(PredictionError::InvalidInput(format!(
                    "{key} = {value} is outside the allowed range [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

impl Default for ParameterRangeRegistry {
    fn default() -> Self {
        Self {
            silk: Self::SILK,
            gelatin: Self::GELATIN,
            needle: Self::NEEDLE,
            height: Self::HEIGHT,
            pressure: Self::PRESSURE,
            temp: Self::TEMP,
        }
    }
}
