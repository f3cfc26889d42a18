//! Raw cell normalization
//!
//! Experimental sheets use dash glyphs both as stray minus signs and as a
//! "no data" marker. Cleaning is permissive: anything that cannot be read
//! as a number degrades to the caller's default instead of failing the row.

use crate::models::CellValue;

/// Dash glyphs stripped before parsing: en dash, em dash, minus sign
pub const DASH_GLYPHS: [char; 3] = ['\u{2013}', '\u{2014}', '\u{2212}'];

/// Convert a raw cell into a float, falling back to `default`
pub fn clean_numeric(value: Option<&CellValue>, default: f64) -> f64 {
    match value {
        None | Some(CellValue::Empty) => default,
        Some(CellValue::Number(n)) if n.is_finite() => *n,
        Some(CellValue::Number(_)) => default,
        Some(CellValue::Text(s)) => clean_numeric_str(s, default),
    }
}

/// String variant of [`clean_numeric`]
pub fn clean_numeric_str(raw: &str, default: f64) -> f64 {
    let cleaned: String = raw.chars().filter(|c| !DASH_GLYPHS.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return default;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => default,
    }
}
