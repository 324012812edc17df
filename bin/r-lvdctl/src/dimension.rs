//! ---
//! lvd_section: "05-networking-external-interfaces"
//! lvd_subsection: "binary"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Control CLI for dimensioning low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use r_lvd_calc_engine::{
    analyze_schedule,
    io::{load_circuit_from_file, load_schedule_from_file},
    CalculationMemorial, CircuitOutcome, Dimensioner, DimensioningResult, DimensioningSummary,
    EngineOptions,
};
use r_lvd_common::{LookupPolicy, ReportFormat};
use r_lvd_logging::{log_system_event, SystemEventOutcome};

use crate::Session;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Exact,
    NextTabulated,
}

impl From<PolicyArg> for LookupPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Exact => LookupPolicy::Exact,
            PolicyArg::NextTabulated => LookupPolicy::NextTabulated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ReportFormat::Csv,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Args)]
pub struct DimensionArgs {
    /// Circuit schedule (YAML or JSON).
    #[arg(value_name = "SCHEDULE")]
    schedule: PathBuf,
    /// Report directory (overrides `[reports].output_dir`).
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,
    /// Report formats to write (overrides `[reports].formats`).
    #[arg(long = "format", value_enum)]
    formats: Vec<FormatArg>,
    /// Table lookup policy (overrides `[engine].lookup_policy`).
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Skip report export and print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct ExplainArgs {
    /// Single circuit (YAML or JSON).
    #[arg(value_name = "CIRCUIT")]
    circuit: PathBuf,
    /// Table lookup policy (overrides `[engine].lookup_policy`).
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Print the memorial as JSON.
    #[arg(long)]
    json: bool,
}

fn engine_options(session: &Session, policy: Option<PolicyArg>) -> EngineOptions {
    let mut options = EngineOptions::from(&session.config.engine);
    if let Some(policy) = policy {
        options.lookup_policy = policy.into();
    }
    options
}

pub fn run(session: &Session, args: DimensionArgs) -> Result<()> {
    let schedule = load_schedule_from_file(&args.schedule)
        .with_context(|| format!("failed to read schedule {}", args.schedule.display()))?;
    let dimensioner = Dimensioner::new(&session.tables, engine_options(session, args.policy));
    let summary = analyze_schedule(&schedule, &dimensioner)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary);

    let output_dir = args
        .output
        .unwrap_or_else(|| session.config.reports.output_dir.clone());
    let formats: Vec<ReportFormat> = if args.formats.is_empty() {
        session.config.reports.formats.clone()
    } else {
        args.formats.into_iter().map(ReportFormat::from).collect()
    };
    match summary.exporter().export(&output_dir, &formats) {
        Ok(()) => {
            log_system_event(
                None,
                "reports.export",
                &format!("reports written to {}", output_dir.display()),
                SystemEventOutcome::Success,
            );
            println!("reports written to {}", output_dir.display());
            Ok(())
        }
        Err(err) => {
            log_system_event(
                None,
                "reports.export",
                &err.to_string(),
                SystemEventOutcome::Fault,
            );
            Err(err).with_context(|| {
                format!("failed to export reports to {}", output_dir.display())
            })
        }
    }
}

pub fn explain(session: &Session, args: ExplainArgs) -> Result<()> {
    let input = load_circuit_from_file(&args.circuit)
        .with_context(|| format!("failed to read circuit {}", args.circuit.display()))?;
    let dimensioner = Dimensioner::new(&session.tables, engine_options(session, args.policy));
    let result = dimensioner.dimension(&input)?;
    let memorial = CalculationMemorial::build(&input, &result);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&memorial)?);
    } else {
        print!("{}", memorial);
    }
    Ok(())
}

fn print_summary(summary: &DimensioningSummary) {
    if let Some(name) = &summary.schedule {
        println!("schedule: {}", name);
    }
    println!("tables:   {}", summary.tables_version);
    for outcome in &summary.outcomes {
        match outcome {
            CircuitOutcome::Dimensioned { result } => println!("{}", summary_line(result)),
            CircuitOutcome::Rejected {
                origin,
                destination,
                issues,
            } => {
                let reasons: Vec<String> = issues.iter().map(ToString::to_string).collect();
                println!("{} -> {}: rejected ({})", origin, destination, reasons.join("; "));
            }
        }
    }
    println!(
        "{} circuit(s), {} rejected, {} flagged",
        summary.outcomes.len(),
        summary.rejected(),
        summary.flagged()
    );
}

fn summary_line(result: &DimensioningResult) -> String {
    let tube = result
        .tube_diameter_mm
        .map_or_else(|| "-".to_owned(), |d| format!("Ø{}", d));
    let mut line = format!(
        "{} -> {}: {} {}/{}/{} mm², In {} A, Ib {:.2} A, ΔU {:.2}%, {}",
        result.origin,
        result.destination,
        result.cable_designation,
        result.phase_section_mm2,
        result.neutral_section_mm2,
        result.earth_section_mm2,
        result.protection_rating_a,
        result.design_current_a,
        result.voltage_drop_percent,
        tube
    );
    if !result.conditions.is_empty() {
        let codes: Vec<&str> = result.conditions.iter().map(|c| c.code()).collect();
        line.push_str(&format!(" [{}]", codes.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_lvd_calc_engine::{dimension_circuit, model::CircuitInput};

    #[test]
    fn summary_line_lists_sections_and_conditions() {
        let input: CircuitInput = serde_json::from_value(serde_json::json!({
            "origin": "P100", "destination": "Q.G.E.",
            "apparent_power_kva": 62.0, "power_factor": 0.9, "voltage": 400,
            "phase": "three", "insulation": "pvc", "material": "copper",
            "installation_method": "B1", "usage": "other", "length_m": 13
        }))
        .unwrap();
        let line = summary_line(&dimension_circuit(&input).unwrap());
        assert!(line.starts_with("P100 -> Q.G.E.: H07V-R 50/25/25 mm², In 100 A"));
        assert!(line.ends_with("[coordination_violation]"));
    }

    #[test]
    fn policy_argument_overrides_config() {
        let session = Session {
            config: Default::default(),
            tables: std::borrow::Cow::Borrowed(r_lvd_calc_engine::TableRepository::builtin()),
        };
        assert_eq!(engine_options(&session, None).lookup_policy, LookupPolicy::Exact);
        assert_eq!(
            engine_options(&session, Some(PolicyArg::NextTabulated)).lookup_policy,
            LookupPolicy::NextTabulated
        );
    }
}
