//! Single-formulation prediction command

use anyhow::{Context, Result};
use clap::Args;
use printability_lib::{ParameterRangeRegistry, PredictionService, PrintParameters};
use serde::Serialize;
use std::path::Path;

use crate::output::{color_probability, color_verdict, print_json, OutputFormat};

/// Formulation and print settings; unset values take the registry default
#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Silk fibroin content (% w/v)
    #[arg(long)]
    pub silk: Option<f64>,

    /// Gelatin content (% w/v)
    #[arg(long)]
    pub gelatin: Option<f64>,

    /// Crosslinker present
    #[arg(long)]
    pub crosslinker: bool,

    /// Needle gauge
    #[arg(long)]
    pub needle: Option<i32>,

    /// Layer height (mm)
    #[arg(long)]
    pub height: Option<f64>,

    /// Extrusion pressure (psi)
    #[arg(long)]
    pub pressure: Option<f64>,

    /// Print temperature (°C)
    #[arg(long)]
    pub temp: Option<f64>,
}

impl PredictArgs {
    /// Fill unset values from the registry defaults
    pub fn resolve(&self, registry: &ParameterRangeRegistry) -> PrintParameters {
        let defaults = registry.defaults(self.crosslinker);
        PrintParameters {
            silk_pct: self.silk.unwrap_or(defaults.silk_pct),
            gelatin_pct: self.gelatin.unwrap_or(defaults.gelatin_pct),
            crosslinker: self.crosslinker,
            needle_gauge: self.needle.unwrap_or(defaults.needle_gauge),
            layer_height_mm: self.height.unwrap_or(defaults.layer_height_mm),
            pressure_psi: self.pressure.unwrap_or(defaults.pressure_psi),
            temp_c: self.temp.unwrap_or(defaults.temp_c),
        }
    }
}

#[derive(Serialize)]
struct PredictReport<'a> {
    prediction: String,
    probability: String,
    remarks: &'a str,
    printable: bool,
    probability_value: f64,
    model_version: &'a str,
    inputs: &'a PrintParameters,
}

/// Validate inputs, load the model and print the explained prediction
pub fn predict(args: &PredictArgs, model_dir: &Path, format: OutputFormat) -> Result<()> {
    let registry = ParameterRangeRegistry::default();
    let params = args.resolve(&registry);
    registry.validate(&params).context("Invalid input")?;

    let service = PredictionService::load(model_dir).with_context(|| {
        format!(
            "Failed to load model from {}; run `bioprint train` first",
            model_dir.display()
        )
    })?;
    let result = service.evaluate(&params).context("Prediction failed")?;

    match format {
        OutputFormat::Json => {
            print_json(&PredictReport {
                prediction: result.verdict_label(),
                probability: result.probability_label(),
                remarks: &result.remark,
                printable: result.verdict,
                probability_value: result.probability,
                model_version: service.artifact().model_version(),
                inputs: &params,
            })?;
        }
        OutputFormat::Table => {
            println!("{}", color_verdict(result.verdict, &result.verdict_label()));
            println!("Probability: {}", color_probability(result.probability));
            println!("Remarks: {}", result.remark);
        }
    }

    Ok(())
}
