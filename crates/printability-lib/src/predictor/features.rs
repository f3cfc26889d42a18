//! Feature extraction from raw experimental records
//!
//! Turns a heterogeneous spreadsheet row into the fixed seven-field
//! [`FeatureVector`]. Cell-level noise is absorbed by the cleaner; a
//! composition string that does not parse rejects the whole record because
//! silk and gelatin content carry the core signal.

use super::cleaner::clean_numeric;
use crate::models::{columns, CellValue, FeatureVector, RawRecord};
use regex::Regex;
use std::sync::OnceLock;

/// kPa to psi conversion factor used for every pressure reading
pub const KPA_TO_PSI: f64 = 0.145038;

/// Needle gauge assumed when the cell is unreadable
pub const DEFAULT_NEEDLE_GAUGE: f64 = 22.0;

static COMPOSITION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn composition_pattern() -> &'static Regex {
    COMPOSITION_PATTERN.get_or_init(|| {
        Regex::new(r"Silk (\d+)%, Gelatin (\d+)%").expect("composition regex must compile")
    })
}

/// Convert an extrusion pressure from kPa to psi
pub fn kpa_to_psi(kpa: f64) -> f64 {
    kpa * KPA_TO_PSI
}

/// Parse "Silk <N>%, Gelatin <N>%" into (silk, gelatin) percentages
pub fn parse_composition(text: &str) -> Option<(f64, f64)> {
    let caps = composition_pattern().captures(text)?;
    let silk = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let gelatin = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some((silk, gelatin))
}

/// Crosslinker is present unless the cell reads "None" or is blank
pub fn crosslinker_flag(value: Option<&CellValue>) -> u8 {
    let text = value.and_then(CellValue::as_text).unwrap_or_default();
    match text.trim() {
        "None" | "" => 0,
        _ => 1,
    }
}

/// Extracts model features from raw dataset records
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Build a feature vector, or `None` if the composition cannot be parsed
    pub fn extract(&self, record: &RawRecord) -> Option<FeatureVector> {
        let composition = record.get(columns::COMPOSITION)?.as_text()?;
        let (silk_pct, gelatin_pct) = parse_composition(&composition)?;

        let needle_gauge =
            clean_numeric(record.get(columns::GAUGE), DEFAULT_NEEDLE_GAUGE).trunc() as i32;

        Some(FeatureVector {
            silk_pct,
            gelatin_pct,
            crosslinker: crosslinker_flag(record.get(columns::CROSSLINKER)),
            needle_gauge,
            layer_height_mm: clean_numeric(record.get(columns::LAYER_HEIGHT), 0.0),
            pressure_psi: kpa_to_psi(clean_numeric(record.get(columns::PRESSURE_KPA), 0.0)),
            temp_c: clean_numeric(record.get(columns::TEMPERATURE), 0.0),
        })
    }

    /// Extract every parsable record, returning the vectors with their source
    /// indices and the number of rejected records
    pub fn extract_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a RawRecord>,
    ) -> (Vec<(usize, FeatureVector)>, usize) {
        let mut kept = Vec::new();
        let mut dropped = 0;
        for (idx, record) in records.into_iter().enumerate() {
            match self.extract(record) {
                Some(features) => kept.push((idx, features)),
                None => dropped += 1,
            }
        }
        (kept, dropped)
    }
}
