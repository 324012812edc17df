//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Result aggregation: the full dimensioning pipeline for one circuit.
//!
//! Order of operations: design current and correction factors, ampacity
//! search, voltage-drop escalation, then protection, derived conductors and
//! conduit on the final section.

use r_lvd_common::LookupPolicy;
use r_lvd_logging::{lvd_debug, lvd_warn, LogContext};
use serde::{Deserialize, Serialize};

use crate::{
    conditions::DimensioningCondition,
    conductor::{select_by_ampacity, AmpacityRating},
    current::design_current,
    derating::{correction_factors, CorrectionFactors},
    derived::{earth_section, neutral_section, tube_diameter},
    errors::{CalcEngineError, Result},
    model::{AmpacityTableId, CircuitInput, ConfigurationIssue},
    protection::{coordination_criterion, select_protection},
    tables::{TableRepository, THERMAL_CHECK_MULTIPLIER},
    voltage_drop::{escalate_for_voltage_drop, DropModel},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default)]
    pub lookup_policy: LookupPolicy,
}

impl From<&r_lvd_common::EngineConfig> for EngineOptions {
    fn from(config: &r_lvd_common::EngineConfig) -> Self {
        Self {
            lookup_policy: config.lookup_policy,
        }
    }
}

/// Fully justified sizing of one circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensioningResult {
    pub origin: String,
    pub destination: String,
    pub apparent_power_kva: f64,
    pub voltage: f64,
    pub length_m: f64,
    pub design_current_a: f64,
    pub correction: CorrectionFactors,
    /// Section chosen by ampacity alone, before voltage-drop escalation.
    pub ampacity_section_mm2: f64,
    pub phase_section_mm2: f64,
    pub neutral_section_mm2: f64,
    pub earth_section_mm2: f64,
    pub base_ampacity_a: f64,
    /// Usable phase ampacity (izFase).
    pub phase_ampacity_a: f64,
    /// Usable neutral ampacity (izNeutro).
    pub neutral_ampacity_a: f64,
    /// izFase × FC (Iz').
    pub corrected_ampacity_a: f64,
    /// 1.45 × Iz'.
    pub thermal_check_a: f64,
    pub protection_rating_a: u32,
    pub phase_criterion: String,
    pub neutral_criterion: String,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub max_voltage_drop_percent: f64,
    pub tube_diameter_mm: Option<u32>,
    pub table: AmpacityTableId,
    pub tables_version: String,
    pub cable_designation: String,
    pub cable_label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<DimensioningCondition>,
}

impl DimensioningResult {
    pub fn is_compliant(&self) -> bool {
        !self.conditions.iter().any(|condition| {
            matches!(
                condition,
                DimensioningCondition::CapacityExceeded { .. }
                    | DimensioningCondition::CoordinationViolation { .. }
                    | DimensioningCondition::VoltageDropExceeded { .. }
            )
        })
    }

    pub fn was_escalated(&self) -> bool {
        self.phase_section_mm2 > self.ampacity_section_mm2
    }
}

/// Dimensioning engine bound to a table repository.
#[derive(Debug, Clone, Copy)]
pub struct Dimensioner<'a> {
    tables: &'a TableRepository,
    options: EngineOptions,
}

impl Default for Dimensioner<'static> {
    fn default() -> Self {
        Self::new(TableRepository::builtin(), EngineOptions::default())
    }
}

impl<'a> Dimensioner<'a> {
    pub fn new(tables: &'a TableRepository, options: EngineOptions) -> Self {
        Self { tables, options }
    }

    pub fn tables(&self) -> &'a TableRepository {
        self.tables
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Collect every reason the circuit cannot be dimensioned.
    pub fn check(&self, input: &CircuitInput) -> Vec<ConfigurationIssue> {
        let mut issues = input.validate();
        let table = input.installation_method.table_id();
        if self.tables.ampacity_table(table).is_none() {
            issues.push(ConfigurationIssue::UnmappedInstallationMethod {
                method: input.installation_method,
                table,
            });
        }
        issues
    }

    pub fn dimension(&self, input: &CircuitInput) -> Result<DimensioningResult> {
        let issues = self.check(input);
        if !issues.is_empty() {
            return Err(CalcEngineError::InvalidConfiguration(issues));
        }

        let table_id = input.installation_method.table_id();
        let table = self.tables.ampacity_table(table_id).ok_or_else(|| {
            CalcEngineError::InvalidConfiguration(vec![
                ConfigurationIssue::UnmappedInstallationMethod {
                    method: input.installation_method,
                    table: table_id,
                },
            ])
        })?;
        let table_label = table_id.to_string();
        let ctx = LogContext::new()
            .with_circuit(&input.origin, &input.destination)
            .with_table(&table_label)
            .with_policy(self.options.lookup_policy.as_str());

        let mut conditions = Vec::new();

        let ib = design_current(input);
        let derating = correction_factors(input, self.tables, self.options.lookup_policy);
        conditions.extend(
            derating
                .misses
                .into_iter()
                .map(DimensioningCondition::TableLookupMiss),
        );
        let fc = derating.factors.combined;
        lvd_debug!(context = ctx, "design current {:.2} A, FC {:.3}", ib, fc);

        let rating = AmpacityRating::new(table, input, fc)?;
        let by_ampacity = select_by_ampacity(&rating, ib).into_value();

        let model = DropModel::new(input, ib);
        let sized = escalate_for_voltage_drop(&rating, &model, by_ampacity);
        if !sized.is_qualified() {
            let final_size = sized.value();
            conditions.push(DimensioningCondition::VoltageDropExceeded {
                section_mm2: final_size.candidate.section_mm2,
                drop_percent: final_size.drop.percent,
                max_percent: final_size.drop.max_percent,
            });
        }
        let sized = sized.into_value();
        let phase = sized.candidate;

        if !phase.carries(ib) {
            conditions.push(DimensioningCondition::CapacityExceeded {
                section_mm2: phase.section_mm2,
                design_current_a: ib,
                corrected_ampacity_a: phase.corrected_ampacity_a,
            });
        }

        let protection = select_protection(
            &self.tables.breaker_ratings_a,
            ib,
            phase.corrected_ampacity_a,
        )?;
        if !protection.coordinated {
            conditions.push(DimensioningCondition::CoordinationViolation {
                design_current_a: ib,
                rating_a: protection.rating_a,
                corrected_ampacity_a: phase.corrected_ampacity_a,
            });
        }

        // The neutral shares the circuit's table, so it is rounded up onto
        // the sections that table lists; the phase section bounds it.
        let neutral = rating
            .round_up(neutral_section(
                self.tables,
                phase.section_mm2,
                input.phase,
                input.has_harmonics,
            ))
            .unwrap_or(phase);
        let earth_mm2 = earth_section(self.tables, phase.section_mm2);

        let conductors = input.phase.conduit_conductor_count();
        let tube_diameter_mm = tube_diameter(self.tables, phase.section_mm2, conductors);
        if tube_diameter_mm.is_none() {
            conditions.push(DimensioningCondition::TubeDiameterUnresolved {
                section_mm2: phase.section_mm2,
                conductors,
            });
        }

        for condition in &conditions {
            lvd_warn!(context = ctx, "{}: {}", condition.code(), condition);
        }
        lvd_debug!(
            context = ctx,
            "dimensioned {} mm² (ampacity {} mm²), In {} A",
            phase.section_mm2,
            by_ampacity.section_mm2,
            protection.rating_a
        );

        let cable_designation = cable_designation(input);
        Ok(DimensioningResult {
            origin: input.origin.clone(),
            destination: input.destination.clone(),
            apparent_power_kva: input.apparent_power_kva,
            voltage: input.voltage,
            length_m: input.length_m,
            design_current_a: ib,
            correction: derating.factors,
            ampacity_section_mm2: by_ampacity.section_mm2,
            phase_section_mm2: phase.section_mm2,
            neutral_section_mm2: neutral.section_mm2,
            earth_section_mm2: earth_mm2,
            base_ampacity_a: phase.base_ampacity_a,
            phase_ampacity_a: phase.usable_ampacity_a,
            neutral_ampacity_a: neutral.usable_ampacity_a,
            corrected_ampacity_a: phase.corrected_ampacity_a,
            thermal_check_a: THERMAL_CHECK_MULTIPLIER * phase.corrected_ampacity_a,
            protection_rating_a: protection.rating_a,
            phase_criterion: coordination_criterion(
                ib,
                protection.rating_a,
                phase.corrected_ampacity_a,
            ),
            neutral_criterion: coordination_criterion(
                ib,
                protection.rating_a,
                neutral.usable_ampacity_a * fc,
            ),
            voltage_drop_v: sized.drop.volts,
            voltage_drop_percent: sized.drop.percent,
            max_voltage_drop_percent: sized.drop.max_percent,
            tube_diameter_mm,
            table: table_id,
            tables_version: self.tables.version.clone(),
            cable_label: format!(
                "{} {}",
                cable_designation,
                if input.phase.is_three_phase() {
                    "three-phase"
                } else {
                    "single-phase"
                }
            ),
            cable_designation,
            conditions,
        })
    }

    /// Dimension every circuit independently; failures do not stop the batch.
    pub fn dimension_all<'i, I>(&self, inputs: I) -> Vec<Result<DimensioningResult>>
    where
        I: IntoIterator<Item = &'i CircuitInput>,
    {
        inputs.into_iter().map(|input| self.dimension(input)).collect()
    }
}

/// Dimension one circuit with the built-in tables and default options.
pub fn dimension_circuit(input: &CircuitInput) -> Result<DimensioningResult> {
    Dimensioner::default().dimension(input)
}

/// Commercial designation, e.g. `XV-R` or `H07V-AL`.
pub fn cable_designation(input: &CircuitInput) -> String {
    format!(
        "{}{}",
        input.insulation.designation_prefix(),
        input.material.designation_suffix()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConductorMaterial, InstallationMethod};
    use crate::test_support::{pvc_input, sample_input};

    #[test]
    fn reference_feeder() {
        let result = dimension_circuit(&pvc_input()).unwrap();
        assert!((result.design_current_a - 39.837).abs() < 1e-3);
        assert_eq!(result.phase_section_mm2, 16.0);
        assert_eq!(result.neutral_section_mm2, 16.0);
        assert_eq!(result.earth_section_mm2, 16.0);
        assert_eq!(result.protection_rating_a, 40);
        assert_eq!(result.tube_diameter_mm, Some(50));
        assert_eq!(result.table, AmpacityTableId::C3);
        assert_eq!(result.cable_designation, "H07V-R");
        assert_eq!(result.cable_label, "H07V-R three-phase");
        assert!((result.thermal_check_a - 1.45 * 52.0).abs() < 1e-9);
        assert!(result.conditions.is_empty());
        assert!(result.is_compliant());
    }

    #[test]
    fn xlpe_designation() {
        let mut input = sample_input();
        input.material = ConductorMaterial::Aluminum;
        let result = dimension_circuit(&input).unwrap();
        assert_eq!(result.cable_designation, "XV-AL");
        assert_eq!(result.tables_version, TableRepository::builtin().version);
    }

    #[test]
    fn invalid_input_lists_every_issue() {
        let mut input = sample_input();
        input.voltage = 0.0;
        input.length_m = 0.0;
        let err = dimension_circuit(&input).unwrap_err();
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn missing_table_is_a_configuration_issue() {
        let mut tables = TableRepository::builtin().clone();
        tables.ampacity.retain(|t| t.id != AmpacityTableId::C4);
        let mut input = sample_input();
        input.installation_method = InstallationMethod::D;
        let err = Dimensioner::new(&tables, EngineOptions::default())
            .dimension(&input)
            .unwrap_err();
        assert!(matches!(
            err.issues(),
            [ConfigurationIssue::UnmappedInstallationMethod { .. }]
        ));
    }

    #[test]
    fn oversized_load_reports_capacity_and_coordination() {
        let mut input = pvc_input();
        input.apparent_power_kva = 400.0;
        let result = dimension_circuit(&input).unwrap();
        assert_eq!(result.phase_section_mm2, 300.0);
        assert_eq!(result.protection_rating_a, 630);
        let codes: Vec<_> = result.conditions.iter().map(|c| c.code()).collect();
        assert!(codes.contains(&"capacity_exceeded"));
        assert!(codes.contains(&"coordination_violation"));
        assert!(!result.is_compliant());
    }

    #[test]
    fn unresolved_tube_is_a_condition() {
        let mut tables = TableRepository::builtin().clone();
        tables.conduits.retain(|c| c.section_mm2 != 16.0);
        let result = Dimensioner::new(&tables, EngineOptions::default())
            .dimension(&pvc_input())
            .unwrap();
        assert_eq!(result.tube_diameter_mm, None);
        assert!(matches!(
            result.conditions.as_slice(),
            [DimensioningCondition::TubeDiameterUnresolved { conductors: 5, .. }]
        ));
        assert!(result.is_compliant());
    }

    #[test]
    fn lookup_miss_is_attached() {
        let mut input = pvc_input();
        input.ambient_temperature_c = 33;
        let result = dimension_circuit(&input).unwrap();
        assert_eq!(result.correction.k1, 1.0);
        assert_eq!(result.conditions.len(), 1);
        assert_eq!(result.conditions[0].code(), "table_lookup_miss");
    }

    #[test]
    fn method_f_neutral_stays_on_table_catalog() {
        let mut input = pvc_input();
        input.installation_method = InstallationMethod::F;
        let result = dimension_circuit(&input).unwrap();
        assert_eq!(result.table, AmpacityTableId::C11);
        assert_eq!(result.phase_section_mm2, 25.0);
        assert_eq!(result.neutral_section_mm2, 25.0);
        assert_eq!(result.neutral_ampacity_a, 110.0);
        assert_eq!(result.earth_section_mm2, 16.0);
        assert_eq!(result.neutral_criterion, "39.84 A ≤ 40 A ≤ 110.0 A");
    }

    #[test]
    fn batch_keeps_failures_in_place() {
        let good = pvc_input();
        let mut bad = pvc_input();
        bad.power_factor = 2.0;
        let outcomes = Dimensioner::default().dimension_all([&good, &bad, &good]);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok());
    }
}
