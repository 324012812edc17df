//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Calculation memorial: a step-by-step justification of one result, citing
//! the RTIEBT sections and tables each figure comes from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    dimensioning::DimensioningResult,
    model::CircuitInput,
    tables::THERMAL_CHECK_MULTIPLIER,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorialStep {
    pub title: String,
    pub reference: String,
    pub formula: String,
    pub outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationMemorial {
    pub origin: String,
    pub destination: String,
    pub tables_version: String,
    pub steps: Vec<MemorialStep>,
    pub findings: Vec<String>,
}

fn step(title: &str, reference: &str, formula: String, outcome: String) -> MemorialStep {
    MemorialStep {
        title: title.to_owned(),
        reference: reference.to_owned(),
        formula,
        outcome,
    }
}

impl CalculationMemorial {
    pub fn build(input: &CircuitInput, result: &DimensioningResult) -> Self {
        let phases = if input.phase.is_three_phase() {
            "√3 × "
        } else {
            ""
        };
        let mut steps = vec![
            step(
                "Design current",
                "Secção 523, Quadro 803A",
                format!(
                    "Ib = {} kVA × {} × 1000 / ({}{} V)",
                    input.apparent_power_kva, input.simultaneity_factor, phases, input.voltage
                ),
                format!("Ib = {:.2} A", result.design_current_a),
            ),
            step(
                "Temperature factor",
                "Quadros 52-D1/52-D2",
                format!(
                    "{} at {} °C",
                    input.insulation.label(),
                    input.ambient_temperature_c
                ),
                format!("K1 = {:.2}", result.correction.k1),
            ),
            step(
                "Grouping factor",
                "Quadro 52-E1",
                format!("{} grouped circuit(s)", input.grouping_count),
                format!("K2 = {:.2}", result.correction.k2),
            ),
            step(
                "Harmonic factor",
                "Secção 523.5",
                if input.has_harmonics {
                    "harmonic content present".to_owned()
                } else {
                    "no significant harmonic content".to_owned()
                },
                format!("Kh = {:.2}", result.correction.kh),
            ),
            step(
                "Correction factor",
                "Secção 523",
                "FC = K1 × K2 × Kh".to_owned(),
                format!("FC = {:.3}", result.correction.combined),
            ),
            step(
                "Phase section by ampacity",
                &format!("Quadro {}", result.table),
                format!(
                    "smallest S with Iz × FC ≥ {:.2} A ({})",
                    result.design_current_a,
                    input.installation_method.label()
                ),
                format!("S = {} mm²", result.ampacity_section_mm2),
            ),
            step(
                "Voltage drop",
                "Secção 525",
                format!(
                    "ΔU = b (ρ1 L/S cos φ + λ L sin φ) Ib, L = {} m, cos φ = {}",
                    input.length_m, input.power_factor
                ),
                format!(
                    "ΔU = {:.2} V ({:.2}% of {}% allowed) at {} mm²",
                    result.voltage_drop_v,
                    result.voltage_drop_percent,
                    result.max_voltage_drop_percent,
                    result.phase_section_mm2
                ),
            ),
        ];
        if result.was_escalated() {
            steps.push(step(
                "Section escalation",
                "Secção 525",
                format!("{} mm² exceeds the drop limit", result.ampacity_section_mm2),
                format!("S = {} mm²", result.phase_section_mm2),
            ));
        }
        steps.extend([
            step(
                "Overload protection",
                "Secção 433.2",
                "Ib ≤ In ≤ Iz'".to_owned(),
                format!(
                    "In = {} A ({})",
                    result.protection_rating_a, result.phase_criterion
                ),
            ),
            step(
                "Conventional tripping current",
                "Secção 433.2",
                format!("I2 ≤ {} × Iz'", THERMAL_CHECK_MULTIPLIER),
                format!("{:.1} A", result.thermal_check_a),
            ),
            step(
                "Neutral and protective conductors",
                "Secções 524 e 543",
                format!("phase {} mm²", result.phase_section_mm2),
                format!(
                    "N = {} mm², PE = {} mm²",
                    result.neutral_section_mm2, result.earth_section_mm2
                ),
            ),
            step(
                "Conduit",
                "Quadro 803C",
                format!(
                    "{} conductors of {} mm²",
                    input.phase.conduit_conductor_count(),
                    result.phase_section_mm2
                ),
                match result.tube_diameter_mm {
                    Some(diameter) => format!("Ø {} mm", diameter),
                    None => "unresolved".to_owned(),
                },
            ),
        ]);

        Self {
            origin: result.origin.clone(),
            destination: result.destination.clone(),
            tables_version: result.tables_version.clone(),
            steps,
            findings: result.conditions.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CalculationMemorial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit {} -> {} (tables {})",
            self.origin, self.destination, self.tables_version
        )?;
        for (idx, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {} [{}]", idx + 1, step.title, step.reference)?;
            writeln!(f, "    {}", step.formula)?;
            writeln!(f, "    => {}", step.outcome)?;
        }
        if !self.findings.is_empty() {
            writeln!(f, "Findings:")?;
            for finding in &self.findings {
                writeln!(f, "  - {}", finding)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensioning::dimension_circuit;
    use crate::test_support::pvc_input;

    #[test]
    fn memorial_cites_each_step() {
        let input = pvc_input();
        let result = dimension_circuit(&input).unwrap();
        let memorial = CalculationMemorial::build(&input, &result);
        let text = memorial.render_text();
        assert!(text.contains("Quadro 803A"));
        assert!(text.contains("52-E1"));
        assert!(text.contains("433.2"));
        assert!(text.contains("Ib = 39.84 A"));
        assert!(memorial.findings.is_empty());
        assert!(!memorial.steps.iter().any(|s| s.title == "Section escalation"));
    }

    #[test]
    fn escalation_and_findings_are_listed() {
        let mut input = pvc_input();
        input.apparent_power_kva = 6.9;
        input.length_m = 500.0;
        input.grouping_count = 10;
        let result = dimension_circuit(&input).unwrap();
        let memorial = CalculationMemorial::build(&input, &result);
        assert!(memorial.steps.iter().any(|s| s.title == "Section escalation"));
        assert_eq!(memorial.findings.len(), 1);
    }
}
