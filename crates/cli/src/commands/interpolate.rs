//! `msim interpolate`: upsample a JSON-lines dataset

use crate::output::{color_score, print_info, print_success, print_warning, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sim_lib::interpolation::{interpolate_by_server_concurrent, validate_quality};
use sim_lib::sink::{read_json_lines, write_json_lines};
use sim_lib::{InterpolationOptions, MetricRecord, Resolution};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Args)]
pub struct InterpolateArgs {
    /// JSON-lines file of raw 10-minute records
    #[arg(long, short)]
    pub input: PathBuf,

    /// Destination file (JSON lines on stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Target resolution in minutes: 1, 2 or 5
    #[arg(long, default_value_t = 5)]
    pub resolution: u32,

    /// Relative noise amplitude, 0 to 1
    #[arg(long, default_value_t = 0.02)]
    pub noise_level: f64,

    /// Pull toward the segment midpoint, 0 to 1
    #[arg(long, default_value_t = 0.1)]
    pub smoothing_factor: f64,

    /// Emit only synthetic points
    #[arg(long)]
    pub no_preserve: bool,

    /// Random seed for the noise generators
    #[arg(long, env = "MSIM_SEED")]
    pub seed: Option<u64>,
}

impl InterpolateArgs {
    pub fn options(&self) -> Result<InterpolationOptions> {
        let options = InterpolationOptions {
            resolution: Resolution::try_from(self.resolution)?,
            noise_level: self.noise_level,
            smoothing_factor: self.smoothing_factor,
            preserve_original: !self.no_preserve,
        };
        options.validate()?;
        Ok(options)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InterpolateSummary {
    input_records: usize,
    output_records: usize,
    pairs_interpolated: usize,
    pairs_skipped: usize,
    quality_score: u32,
    is_valid: bool,
}

pub async fn run(
    args: &InterpolateArgs,
    default_seed: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let options = args.options()?;
    let original: Vec<MetricRecord> = read_json_lines(&args.input).await?;
    let seed = args
        .seed
        .or(default_seed)
        .unwrap_or_else(rand::random);
    info!(
        input = %args.input.display(),
        records = original.len(),
        resolution = options.resolution.minutes(),
        seed,
        "Interpolating dataset"
    );

    let outcome = interpolate_by_server_concurrent(&original, &options, seed).await?;

    let Some(path) = &args.output else {
        for record in &outcome.records {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    };

    write_json_lines(path, &outcome.records)
        .await
        .with_context(|| format!("Failed to store interpolated records in {}", path.display()))?;
    info!(path = %path.display(), records = outcome.records.len(), "Stored interpolated records");
    let report = validate_quality(&original, &outcome.records);

    match format {
        OutputFormat::Json => {
            let summary = InterpolateSummary {
                input_records: original.len(),
                output_records: outcome.records.len(),
                pairs_interpolated: outcome.pairs_interpolated,
                pairs_skipped: outcome.pairs_skipped,
                quality_score: report.quality_score,
                is_valid: report.is_valid,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => {
            print_success(&format!(
                "Interpolated {} records into {} at {}-minute resolution",
                original.len(),
                outcome.records.len(),
                options.resolution.minutes()
            ));
            if outcome.pairs_skipped > 0 {
                print_warning(&format!(
                    "{} pairs skipped (irregular gaps or server boundaries)",
                    outcome.pairs_skipped
                ));
            }
            print_info(&format!(
                "Quality {} (seed {})",
                color_score(report.quality_score),
                seed
            ));
        }
    }
    Ok(())
}
