//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! RTIEBT dimensioning engine for low-voltage circuits.
//!
//! [`Dimensioner::dimension`] turns a [`CircuitInput`] into a
//! [`DimensioningResult`]: design current, correction factors, phase section
//! (ampacity search followed by voltage-drop escalation), protection rating,
//! neutral and earth sections, and conduit diameter. The computation is a pure
//! function of the input, the [`TableRepository`] and the [`EngineOptions`].

pub mod api;
pub mod conditions;
pub mod conductor;
pub mod current;
pub mod derating;
pub mod derived;
pub mod dimensioning;
pub mod errors;
pub mod io;
pub mod memorial;
pub mod model;
pub mod protection;
pub mod reports;
pub mod tables;
pub mod voltage_drop;

#[cfg(test)]
mod test_support;

use chrono::{DateTime, Utc};
use r_lvd_logging::{lvd_error, lvd_info, LogContext};
use serde::{Deserialize, Serialize};

use crate::{io::CircuitSchedule, model::ConfigurationIssue, reports::ReportExporter};

pub use conditions::DimensioningCondition;
pub use dimensioning::{dimension_circuit, Dimensioner, DimensioningResult, EngineOptions};
pub use errors::{CalcEngineError, Result};
pub use memorial::CalculationMemorial;
pub use model::{CircuitInput, Vocabulary};
pub use tables::TableRepository;

/// Per-circuit outcome of a schedule run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CircuitOutcome {
    Dimensioned {
        result: DimensioningResult,
    },
    Rejected {
        origin: String,
        destination: String,
        issues: Vec<ConfigurationIssue>,
    },
}

impl CircuitOutcome {
    pub fn result(&self) -> Option<&DimensioningResult> {
        match self {
            CircuitOutcome::Dimensioned { result } => Some(result),
            CircuitOutcome::Rejected { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensioningSummary {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub schedule: Option<String>,
    pub tables_version: String,
    pub outcomes: Vec<CircuitOutcome>,
}

impl DimensioningSummary {
    pub fn exporter(&self) -> ReportExporter<'_> {
        ReportExporter::new(self)
    }

    pub fn results(&self) -> impl Iterator<Item = &DimensioningResult> {
        self.outcomes.iter().filter_map(CircuitOutcome::result)
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.results().count()
    }

    /// Dimensioned circuits carrying at least one condition.
    pub fn flagged(&self) -> usize {
        self.results().filter(|r| !r.conditions.is_empty()).count()
    }
}

/// Dimension every circuit of a schedule. Invalid circuits are reported as
/// [`CircuitOutcome::Rejected`]; table data errors abort the run.
pub fn analyze_schedule(
    schedule: &CircuitSchedule,
    dimensioner: &Dimensioner<'_>,
) -> Result<DimensioningSummary> {
    let policy = dimensioner.options().lookup_policy;
    let ctx = LogContext::new().with_policy(policy.as_str());
    lvd_info!(
        context = ctx,
        "Dimensioning schedule of {} circuits...",
        schedule.circuits.len()
    );

    let circuits = schedule
        .resolved_circuits(dimensioner.tables())
        .map_err(|err| {
            lvd_error!(context = ctx, "Schedule rejected: {}", err);
            err
        })?;

    let mut outcomes = Vec::with_capacity(circuits.len());
    for (input, outcome) in circuits.iter().zip(dimensioner.dimension_all(circuits.iter())) {
        outcomes.push(match outcome {
            Ok(result) => CircuitOutcome::Dimensioned { result },
            Err(CalcEngineError::InvalidConfiguration(issues)) => CircuitOutcome::Rejected {
                origin: input.origin.clone(),
                destination: input.destination.clone(),
                issues,
            },
            Err(err) => {
                lvd_error!(context = ctx, "Schedule aborted: {}", err);
                return Err(err);
            }
        });
    }

    let summary = DimensioningSummary {
        timestamp: Utc::now(),
        schedule: schedule.name.clone(),
        tables_version: dimensioner.tables().version.clone(),
        outcomes,
    };
    lvd_info!(
        context = ctx,
        "Schedule dimensioned: {} dimensioned, {} rejected, {} flagged",
        summary.outcomes.len() - summary.rejected(),
        summary.rejected(),
        summary.flagged()
    );
    Ok(summary)
}

/// Dimension a schedule and, when `output_dir` is given, export every report
/// format into it.
pub fn analyze_schedule_with_options(
    schedule: &CircuitSchedule,
    dimensioner: &Dimensioner<'_>,
    output_dir: Option<&std::path::Path>,
) -> Result<DimensioningSummary> {
    let summary = analyze_schedule(schedule, dimensioner)?;
    if let Some(output_dir) = output_dir {
        summary.exporter().export_all(output_dir)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pvc_input, sample_input};

    #[test]
    fn schedule_pipeline() {
        let mut rejected = sample_input();
        rejected.length_m = 0.0;
        let schedule = CircuitSchedule {
            name: Some("test-1".into()),
            ..CircuitSchedule::new(vec![pvc_input(), rejected, sample_input()])
        };
        let summary = analyze_schedule(&schedule, &Dimensioner::default()).unwrap();
        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.rejected(), 1);
        assert_eq!(summary.flagged(), 0);
        assert_eq!(summary.schedule.as_deref(), Some("test-1"));
        assert!(matches!(
            &summary.outcomes[1],
            CircuitOutcome::Rejected { issues, .. } if issues.len() == 1
        ));
    }

    #[test]
    fn dwelling_schedule_applies_simultaneity() {
        let schedule = CircuitSchedule {
            installations: Some(12),
            ..CircuitSchedule::new(vec![pvc_input()])
        };
        let summary = analyze_schedule(&schedule, &Dimensioner::default()).unwrap();
        let result = summary.results().next().unwrap();
        // 27.6 kVA × 0.56
        assert!((result.design_current_a - 39.837 * 0.56).abs() < 1e-3);

        let schedule = CircuitSchedule {
            installations: Some(0),
            ..schedule
        };
        let err = analyze_schedule(&schedule, &Dimensioner::default()).unwrap_err();
        assert_eq!(err.issues().len(), 1);
    }
}
