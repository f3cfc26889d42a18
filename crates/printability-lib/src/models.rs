//! Core data models for the printability predictor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical feature order shared by training and inference
pub const FEATURE_NAMES: [&str; 7] = [
    "Silk_%",
    "Gelatin_%",
    "Crosslinker",
    "Needle_Gauge",
    "LH_mm",
    "Pressure_psi",
    "Temp_C",
];

/// Number of model input features
pub const NUM_FEATURES: usize = FEATURE_NAMES.len();

/// Column labels found in the experimental dataset
pub mod columns {
    pub const COMPOSITION: &str = "Composition";
    pub const CROSSLINKER: &str = "Crosslinker";
    pub const GAUGE: &str = "Gauge";
    pub const LAYER_HEIGHT: &str = "LH (mm)";
    pub const PRESSURE_KPA: &str = "Pressure (kPa)";
    pub const TEMPERATURE: &str = "TG (°C)";
    pub const PRINTABLE: &str = "Printable";
}

/// A single cell as found in the source data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Interpret a CSV field: blank fields are missing, everything else is text
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(field.to_string())
        }
    }

    /// True for empty cells and NaN numbers
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(n) => n.is_nan(),
            CellValue::Text(_) => false,
        }
    }

    /// String form of the cell, `None` when missing
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) if n.is_nan() => None,
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Raw experimental record: column label to cell value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    cells: BTreeMap<String, CellValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Binary printability outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    NotPrintable,
    Printable,
}

impl Label {
    /// Fold a raw label into {0, 1}.
    ///
    /// Only an exact "Yes" (surrounding whitespace ignored) counts as
    /// printable. "No", "-", blanks, absent cells, other casings and anything
    /// unrecognized are treated as not printable.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("Yes") => Label::Printable,
            _ => Label::NotPrintable,
        }
    }

    pub fn from_cell(cell: Option<&CellValue>) -> Self {
        Self::from_raw(cell.and_then(CellValue::as_text).as_deref())
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Label::NotPrintable => 0,
            Label::Printable => 1,
        }
    }

    pub fn is_printable(self) -> bool {
        self == Label::Printable
    }
}

/// Feature vector for model training and inference, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Silk_%")]
    pub silk_pct: f64,
    #[serde(rename = "Gelatin_%")]
    pub gelatin_pct: f64,
    #[serde(rename = "Crosslinker")]
    pub crosslinker: u8,
    #[serde(rename = "Needle_Gauge")]
    pub needle_gauge: i32,
    #[serde(rename = "LH_mm")]
    pub layer_height_mm: f64,
    #[serde(rename = "Pressure_psi")]
    pub pressure_psi: f64,
    #[serde(rename = "Temp_C")]
    pub temp_c: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.silk_pct,
            self.gelatin_pct,
            f64::from(self.crosslinker),
            f64::from(self.needle_gauge),
            self.layer_height_mm,
            self.pressure_psi,
            self.temp_c,
        ]
    }

    /// Look up a single feature by its schema name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.to_array()[idx])
    }

    /// Named values, keyed by schema name
    pub fn to_named(&self) -> BTreeMap<String, f64> {
        FEATURE_NAMES
            .iter()
            .zip(self.to_array())
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

/// Primitive inference inputs as supplied by a boundary layer.
///
/// Pressure is already in psi here; only training data arrives in kPa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintParameters {
    pub silk_pct: f64,
    pub gelatin_pct: f64,
    pub crosslinker: bool,
    pub needle_gauge: i32,
    pub layer_height_mm: f64,
    pub pressure_psi: f64,
    pub temp_c: f64,
}

impl From<PrintParameters> for FeatureVector {
    fn from(p: PrintParameters) -> Self {
        FeatureVector {
            silk_pct: p.silk_pct,
            gelatin_pct: p.gelatin_pct,
            crosslinker: u8::from(p.crosslinker),
            needle_gauge: p.needle_gauge,
            layer_height_mm: p.layer_height_mm,
            pressure_psi: p.pressure_psi,
            temp_c: p.temp_c,
        }
    }
}

/// Explained prediction, derived per request and never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub verdict: bool,
    pub probability: f64,
    pub remark: String,
}

impl PredictionResult {
    /// "Printable: YES" / "Printable: NO"
    pub fn verdict_label(&self) -> String {
        format!("Printable: {}", if self.verdict { "YES" } else { "NO" })
    }

    /// "Probability: 87%"
    pub fn probability_label(&self) -> String {
        format!("Probability: {}", format_probability(self.probability))
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.verdict_label(),
            self.probability_label(),
            self.remark
        )
    }
}

/// Format a probability as a whole percentage
pub fn format_probability(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}
