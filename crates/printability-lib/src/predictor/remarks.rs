//! Remark generation for predictions
//!
//! Turns the classifier verdict and probability into an actionable remark.
//! Printable verdicts are graded by confidence; non-printable verdicts are
//! checked against known physical failure modes (under-pressure extrusion,
//! over-thick layers) before falling back to a formulation remark.

use crate::models::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability above which a printable verdict is rated excellent
pub const EXCELLENT_PROBABILITY: f64 = 0.90;

/// Probability above which a printable verdict is rated stable
pub const STABLE_PROBABILITY: f64 = 0.75;

/// Minimum pressure for reliable extrusion (psi)
pub const MIN_EXTRUSION_PSI: f64 = 3.0;

/// Maximum layer height before resolution suffers (mm)
pub const MAX_LAYER_HEIGHT_MM: f64 = 0.2;

/// Thresholds for the remark decision table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemarkConfig {
    pub excellent_probability: f64,
    pub stable_probability: f64,
    pub min_extrusion_psi: f64,
    pub max_layer_height_mm: f64,
}

impl Default for RemarkConfig {
    fn default() -> Self {
        Self {
            excellent_probability: EXCELLENT_PROBABILITY,
            stable_probability: STABLE_PROBABILITY,
            min_extrusion_psi: MIN_EXTRUSION_PSI,
            max_layer_height_mm: MAX_LAYER_HEIGHT_MM,
        }
    }
}

/// Diagnostic remark attached to a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remark {
    ExcellentStacking,
    StableGeometry,
    NeedsOptimization,
    PressureTooLow,
    LayerTooThick,
    LacksCohesion,
}

impl Remark {
    pub fn message(&self) -> &'static str {
        match self {
            Remark::ExcellentStacking => "Excellent stacking with high resolution.",
            Remark::StableGeometry => "Stable geometry and decent print fidelity.",
            Remark::NeedsOptimization => "Likely printable but may need optimization.",
            Remark::PressureTooLow => "Pressure too low for proper extrusion.",
            Remark::LayerTooThick => "Layer height too thick; may affect resolution.",
            Remark::LacksCohesion => "Formulation lacks required cohesion.",
        }
    }
}

impl fmt::Display for Remark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Deterministic rule table over (verdict, probability, features)
#[derive(Debug, Clone, Default)]
pub struct RemarkEngine {
    config: RemarkConfig,
}

impl RemarkEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RemarkConfig) -> Self {
        Self { config }
    }

    /// First matching rule wins; all comparisons are strict
    pub fn explain(&self, verdict: bool, probability: f64, features: &FeatureVector) -> Remark {
        if verdict {
            if probability > self.config.excellent_probability {
                Remark::ExcellentStacking
            } else if probability > self.config.stable_probability {
                Remark::StableGeometry
            } else {
                Remark::NeedsOptimization
            }
        } else if features.pressure_psi < self.config.min_extrusion_psi {
            Remark::PressureTooLow
        } else if features.layer_height_mm > self.config.max_layer_height_mm {
            Remark::LayerTooThick
        } else {
            Remark::LacksCohesion
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pressure_psi: f64, layer_height_mm: f64) -> FeatureVector {
        FeatureVector {
            silk_pct: 5.0,
            gelatin_pct: 15.0,
            crosslinker: 1,
            needle_gauge: 22,
            layer_height_mm,
            pressure_psi,
            temp_c: 25.0,
        }
    }

    #[test]
    fn test_printable_grades() {
        let engine = RemarkEngine::new();
        let f = features(6.0, 0.1);
        assert_eq!(engine.explain(true, 0.95, &f), Remark::ExcellentStacking);
        assert_eq!(engine.explain(true, 0.80, &f), Remark::StableGeometry);
        assert_eq!(engine.explain(true, 0.60, &f), Remark::NeedsOptimization);
    }

    #[test]
    fn test_probability_boundaries_are_strict() {
        let engine = RemarkEngine::new();
        let f = features(6.0, 0.1);
        assert_eq!(engine.explain(true, 0.90, &f), Remark::StableGeometry);
        assert_eq!(engine.explain(true, 0.75, &f), Remark::NeedsOptimization);
    }

    #[test]
    fn test_not_printable_failure_modes() {
        let engine = RemarkEngine::new();
        assert_eq!(engine.explain(false, 0.2, &features(2.0, 0.5)), Remark::PressureTooLow);
        assert_eq!(engine.explain(false, 0.2, &features(5.0, 0.3)), Remark::LayerTooThick);
        assert_eq!(engine.explain(false, 0.2, &features(5.0, 0.1)), Remark::LacksCohesion);
    }

    #[test]
    fn test_failure_mode_boundaries() {
        let engine = RemarkEngine::new();
        assert_eq!(engine.explain(false, 0.4, &features(3.0, 0.2)), Remark::LacksCohesion);
    }

    #[test]
    fn test_not_printable_ignores_probability() {
        let engine = RemarkEngine::new();
        let f = features(5.0, 0.1);
        assert_eq!(engine.explain(false, 0.99, &f), engine.explain(false, 0.01, &f));
    }

    #[test]
    fn test_deterministic() {
        let engine = RemarkEngine::new();
        let f = features(4.0, 0.25);
        let first = engine.explain(false, 0.3, &f);
        for _ in 0..10 {
            assert_eq!(engine.explain(false, 0.3, &f), first);
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Remark::ExcellentStacking.to_string(),
            "Excellent stacking with high resolution."
        );
        assert_eq!(
            Remark::LayerTooThick.message(),
            "Layer height too thick; may affect resolution."
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = RemarkEngine::with_config(RemarkConfig {
            min_extrusion_psi: 5.0,
            ..RemarkConfig::default()
        });
        assert_eq!(engine.explain(false, 0.2, &features(4.0, 0.1)), Remark::PressureTooLow);
    }
}
