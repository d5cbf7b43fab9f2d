//! `msim schedule`: preview the failure schedule without synthesizing records

use super::SimulationArgs;
use crate::output::{color_pattern, print_info, print_rows, OutputFormat};
use anyhow::Result;
use serde::Serialize;
use sim_lib::synthesizer::timestamp_at;
use sim_lib::FailureEvent;
use tabled::Tabled;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Points")]
    points: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Cascade")]
    cascade: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SchedulePreview<'a> {
    seed: u64,
    horizon_points: usize,
    servers: Vec<&'a str>,
    events: &'a [FailureEvent],
}

pub fn run(args: &SimulationArgs, default_seed: Option<u64>, format: OutputFormat) -> Result<()> {
    let mut simulation = args.builder(default_seed).build()?;
    let plan = simulation.plan()?;
    let start = simulation.start_time();
    let interval = simulation.config().interval_minutes;

    let rows: Vec<EventRow> = plan
        .schedule
        .iter()
        .map(|e| EventRow {
            start: timestamp_at(start, e.start_index, interval)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            pattern: color_pattern(e.pattern),
            origin: e.origin_server_id.clone(),
            points: format!("{}..{}", e.start_index, e.end_index()),
            severity: format!("{:.2}", e.severity),
            cascade: if e.cascade_targets.is_empty() {
                "-".to_string()
            } else {
                e.cascade_targets
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        })
        .collect();

    let preview = SchedulePreview {
        seed: simulation.seed(),
        horizon_points: simulation.config().horizon_points,
        servers: plan.roster.iter().map(|s| s.id.as_str()).collect(),
        events: &plan.schedule,
    };
    print_rows(rows, &preview, format)?;

    if format == OutputFormat::Table {
        print_info(&format!(
            "{} events across {} servers, seed {}",
            plan.schedule.len(),
            plan.roster.len(),
            simulation.seed()
        ));
    }
    Ok(())
}
