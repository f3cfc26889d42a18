//! Model training command

use anyhow::{Context, Result};
use printability_lib::training::{load_csv, FeatureImportance, TrainingSummary};
use printability_lib::{ArtifactStore, ModelTrainer, StructuredLogger};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::commands::inspect::ImportanceRow;
use crate::output::{
    format_value, print_info, print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for the dataset statistics table
#[derive(Tabled)]
struct FeatureStatsRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Max")]
    max: String,
}

#[derive(Serialize)]
struct TrainReport<'a> {
    model_version: &'a str,
    model_dir: String,
    summary: &'a TrainingSummary,
    importances: &'a [FeatureImportance],
}

/// Train on a CSV export and save the artifact into `model_dir`
pub fn train(data: &Path, model_dir: &Path, format: OutputFormat) -> Result<()> {
    let records = load_csv(data)
        .with_context(|| format!("Failed to read dataset {}", data.display()))?;

    let outcome = ModelTrainer::new()
        .train_records(&records)
        .context("Training failed")?;

    let store = ArtifactStore::new(model_dir);
    store
        .save(&outcome.artifact)
        .with_context(|| format!("Failed to save model to {}", model_dir.display()))?;

    let model_version = outcome.artifact.model_version();
    StructuredLogger::new("bioprint").log_training(&outcome.summary, model_version);

    match format {
        OutputFormat::Json => {
            print_json(&TrainReport {
                model_version,
                model_dir: model_dir.display().to_string(),
                summary: &outcome.summary,
                importances: &outcome.importances,
            })?;
        }
        OutputFormat::Table => {
            let summary = &outcome.summary;
            print_success(&format!(
                "Trained model {} saved to {}",
                model_version,
                model_dir.display()
            ));
            print_info(&format!(
                "{} samples, {} printable ({:.0}%)",
                summary.total_samples,
                summary.printable_samples,
                summary.printable_share * 100.0
            ));
            if summary.dropped_records > 0 {
                print_warning(&format!(
                    "{} records dropped: composition could not be parsed",
                    summary.dropped_records
                ));
            }

            println!();
            let rows: Vec<FeatureStatsRow> = summary
                .feature_stats
                .iter()
                .map(|s| FeatureStatsRow {
                    feature: s.feature.clone(),
                    min: format_value(s.min),
                    mean: format_value(s.mean),
                    max: format_value(s.max),
                })
                .collect();
            print_table(&rows);

            println!();
            print_info("Feature importance");
            print_table(&ImportanceRow::from_ranking(&outcome.importances));
        }
    }

    Ok(())
}
