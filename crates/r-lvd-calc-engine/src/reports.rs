//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use std::{fs, path::Path};

use r_lvd_common::ReportFormat;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{dimensioning::DimensioningResult, errors::Result, DimensioningSummary};

const CSV_FILE: &str = "dimensioning.csv";
const JSON_FILE: &str = "dimensioning.json";

/// One line of the circuit schedule report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "Apparent Power (kVA)")]
    pub apparent_power_kva: f64,
    #[serde(rename = "Reference Voltage (V)")]
    pub voltage: f64,
    #[serde(rename = "Design Current Ib (A)")]
    pub design_current_a: f64,
    #[serde(rename = "Cable Type")]
    pub cable_label: String,
    #[serde(rename = "Phase Section (mm2)")]
    pub phase_section_mm2: f64,
    #[serde(rename = "Neutral Section (mm2)")]
    pub neutral_section_mm2: f64,
    #[serde(rename = "Base Ampacity Iz (A)")]
    pub phase_ampacity_a: f64,
    #[serde(rename = "Corrected Ampacity Iz' (A)")]
    pub corrected_ampacity_a: f64,
    #[serde(rename = "Correction Factor")]
    pub correction_factor: f64,
    #[serde(rename = "Length (m)")]
    pub length_m: f64,
    #[serde(rename = "Voltage Drop (%)")]
    pub voltage_drop_percent: f64,
    #[serde(rename = "1.45 Iz' (A)")]
    pub thermal_check_a: f64,
    #[serde(rename = "Protection Criterion")]
    pub criterion: String,
    #[serde(rename = "Protection In (A)")]
    pub protection_rating_a: u32,
    #[serde(rename = "Conditions")]
    pub conditions: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<&DimensioningResult> for ReportRow {
    fn from(result: &DimensioningResult) -> Self {
        Self {
            origin: result.origin.clone(),
            destination: result.destination.clone(),
            apparent_power_kva: result.apparent_power_kva,
            voltage: result.voltage,
            design_current_a: round2(result.design_current_a),
            cable_label: result.cable_label.clone(),
            phase_section_mm2: result.phase_section_mm2,
            neutral_section_mm2: result.neutral_section_mm2,
            phase_ampacity_a: round2(result.phase_ampacity_a),
            corrected_ampacity_a: round2(result.corrected_ampacity_a),
            correction_factor: round2(result.correction.combined),
            length_m: result.length_m,
            voltage_drop_percent: round2(result.voltage_drop_percent),
            thermal_check_a: round2(result.thermal_check_a),
            criterion: result.phase_criterion.clone(),
            protection_rating_a: result.protection_rating_a,
            conditions: result
                .conditions
                .iter()
                .map(|c| c.code())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[derive(Debug)]
pub struct ReportExporter<'a> {
    summary: &'a DimensioningSummary,
}

impl<'a> ReportExporter<'a> {
    pub fn new(summary: &'a DimensioningSummary) -> Self {
        Self { summary }
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.summary.results().map(ReportRow::from).collect()
    }

    /// Write the requested formats into `output_dir`, creating it if needed.
    pub fn export(&self, output_dir: &Path, formats: &[ReportFormat]) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let rows = self.rows();
        if formats.contains(&ReportFormat::Csv) {
            write_csv(output_dir.join(CSV_FILE), &rows)?;
        }
        if formats.contains(&ReportFormat::Json) {
            let timestamp = self.summary.timestamp.to_rfc3339();
            let envelope = ReportEnvelope {
                timestamp: &timestamp,
                tables_version: &self.summary.tables_version,
                schema: schedule_schema(),
                data: self.summary,
            };
            write_json(output_dir.join(JSON_FILE), &envelope)?;
        }

        info!("Reports exported to {}", output_dir.display());
        Ok(())
    }

    pub fn export_all(&self, output_dir: &Path) -> Result<()> {
        self.export(output_dir, &[ReportFormat::Csv, ReportFormat::Json])
    }
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    timestamp: &'a str,
    tables_version: &'a str,
    schema: serde_json::Value,
    data: &'a T,
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn write_csv(path: impl AsRef<Path>, rows: &[ReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn schedule_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "DimensioningSummary",
        "type": "object",
        "properties": {
            "timestamp": {"type": "string", "format": "date-time"},
            "tables_version": {"type": "string"},
            "outcomes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "status": {"enum": ["dimensioned", "rejected"]},
                        "result": {
                            "type": "object",
                            "properties": {
                                "origin": {"type": "string"},
                                "destination": {"type": "string"},
                                "design_current_a": {"type": "number"},
                                "phase_section_mm2": {"type": "number"},
                                "neutral_section_mm2": {"type": "number"},
                                "earth_section_mm2": {"type": "number"},
                                "protection_rating_a": {"type": "integer"},
                                "voltage_drop_percent": {"type": "number"},
                                "tube_diameter_mm": {"type": ["integer", "null"]},
                                "table": {"type": "string"},
                                "conditions": {"type": "array"}
                            },
                            "required": [
                                "origin",
                                "destination",
                                "design_current_a",
                                "phase_section_mm2",
                                "protection_rating_a"
                            ]
                        },
                        "issues": {"type": "array"}
                    },
                    "required": ["status"]
                }
            }
        },
        "required": ["timestamp", "tables_version", "outcomes"]
    })
}
