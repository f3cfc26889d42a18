//! Read-only inspection commands: parameter ranges and feature importance

use anyhow::{Context, Result};
use printability_lib::training::FeatureImportance;
use printability_lib::{ArtifactStore, ParameterRangeRegistry};
use std::path::Path;
use tabled::Tabled;

use crate::output::{format_value, print_json, print_table, OutputFormat};

/// Width of the importance bar at a score of 1.0
const BAR_WIDTH: f64 = 40.0;

/// Row for the ranges table
#[derive(Tabled)]
struct RangeRow {
    #[tabled(rename = "Parameter")]
    parameter: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Default")]
    default: String,
}

/// Row for the importance table
#[derive(Tabled)]
pub struct ImportanceRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Importance")]
    importance: String,
    #[tabled(rename = "")]
    bar: String,
}

impl ImportanceRow {
    pub fn from_ranking(ranking: &[FeatureImportance]) -> Vec<Self> {
        ranking
            .iter()
            .enumerate()
            .map(|(idx, entry)| ImportanceRow {
                rank: idx + 1,
                feature: entry.feature.clone(),
                importance: format!("{:.3}", entry.importance),
                bar: "█".repeat((entry.importance * BAR_WIDTH).round() as usize),
            })
            .collect()
    }
}

/// Show the parameter range registry
pub fn show_ranges(format: OutputFormat) -> Result<()> {
    let registry = ParameterRangeRegistry::default();

    match format {
        OutputFormat::Json => print_json(&registry)?,
        OutputFormat::Table => {
            let rows: Vec<RangeRow> = registry
                .entries()
                .into_iter()
                .map(|(key, range)| RangeRow {
                    parameter: key.to_string(),
                    min: format_value(range.min),
                    max: format_value(range.max),
                    step: format_value(range.step),
                    default: format_value(range.default),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show the importance ranking saved with the model
pub fn show_importance(model_dir: &Path, format: OutputFormat) -> Result<()> {
    let ranking = ArtifactStore::new(model_dir)
        .load_importances()
        .with_context(|| {
            format!(
                "Failed to read feature importance from {}; run `bioprint train` first",
                model_dir.display()
            )
        })?;

    match format {
        OutputFormat::Json => print_json(&ranking)?,
        OutputFormat::Table => print_table(&ImportanceRow::from_ranking(&ranking)),
    }

    Ok(())
}
