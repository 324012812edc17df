//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "test"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use std::fs;

use r_lvd_calc_engine::{
    analyze_schedule_with_options,
    dimension_circuit,
    io::CircuitSchedule,
    model::{
        CircuitInput, ConductorMaterial, InstallationMethod, InsulationClass, PhaseConfiguration,
        UsageCategory,
    },
    tables::TableRepository,
    CircuitOutcome, Dimensioner, DimensioningCondition, EngineOptions,
};
use r_lvd_common::LookupPolicy;
use tempfile::tempdir;

fn feeder(apparent_power_kva: f64) -> CircuitInput {
    CircuitInput {
        origin: "P100".into(),
        destination: "Q.G.E.".into(),
        apparent_power_kva,
        simultaneity_factor: 1.0,
        power_factor: 0.9,
        voltage: 400.0,
        phase: PhaseConfiguration::Three,
        insulation: InsulationClass::Pvc,
        material: ConductorMaterial::Copper,
        installation_method: InstallationMethod::B1,
        usage: UsageCategory::Other,
        length_m: 13.0,
        ambient_temperature_c: 30,
        grouping_count: 1,
        has_harmonics: false,
    }
}

fn final_circuit() -> CircuitInput {
    CircuitInput {
        origin: "Q.G.E.".into(),
        destination: "Sockets".into(),
        apparent_power_kva: 4.6,
        simultaneity_factor: 1.0,
        power_factor: 0.95,
        voltage: 230.0,
        phase: PhaseConfiguration::Single,
        insulation: InsulationClass::Pvc,
        material: ConductorMaterial::Copper,
        installation_method: InstallationMethod::B1,
        usage: UsageCategory::Other,
        length_m: 20.0,
        ambient_temperature_c: 30,
        grouping_count: 1,
        has_harmonics: false,
    }
}

#[test]
fn three_phase_supply_feeder() {
    let result = dimension_circuit(&feeder(27.6)).unwrap();
    assert!((result.design_current_a - 39.84).abs() < 0.01);
    assert_eq!(result.phase_section_mm2, 16.0);
    assert_eq!(result.protection_rating_a, 40);
    assert!(result.is_compliant());
}

#[test]
fn single_phase_final_circuit() {
    let result = dimension_circuit(&final_circuit()).unwrap();
    assert!((result.design_current_a - 20.0).abs() < 1e-12);
    // 2.5 mm²: 17.5 A × 1.15 = 20.125 A
    assert_eq!(result.phase_section_mm2, 2.5);
    assert_eq!(result.protection_rating_a, 20);
    assert_eq!(result.neutral_section_mm2, 2.5);
    assert_eq!(result.tube_diameter_mm, Some(20));
    assert_eq!(result.cable_label, "H07V-R single-phase");
}

#[test]
fn reference_conditions_give_unit_correction() {
    let result = dimension_circuit(&feeder(27.6)).unwrap();
    assert_eq!(result.correction.k1, 1.0);
    assert_eq!(result.correction.k2, 1.0);
    assert_eq!(result.correction.kh, 1.0);
    assert_eq!(result.correction.combined, 1.0);
}

#[test]
fn grouping_raises_section() {
    let alone = dimension_circuit(&feeder(27.6)).unwrap();
    let mut input = feeder(27.6);
    input.grouping_count = 5;
    let grouped = dimension_circuit(&input).unwrap();
    assert!((grouped.correction.combined - 0.60).abs() < 1e-12);
    assert!(grouped.phase_section_mm2 > alone.phase_section_mm2);
    assert_eq!(grouped.phase_section_mm2, 25.0);
}

#[test]
fn long_feeder_escalates_for_voltage_drop() {
    let mut input = feeder(6.9);
    input.length_m = 500.0;
    let result = dimension_circuit(&input).unwrap();
    assert_eq!(result.ampacity_section_mm2, 1.5);
    assert_eq!(result.phase_section_mm2, 10.0);
    assert!(result.was_escalated());
    assert!(result.voltage_drop_percent <= 5.0);
    assert!((result.voltage_drop_percent - 4.44).abs() < 0.01);
    // protection is chosen on the escalated section
    assert_eq!(result.protection_rating_a, 10);
    assert!(result.conditions.is_empty());
}

#[test]
fn unreachable_drop_limit_is_flagged() {
    let mut input = feeder(6.9);
    input.length_m = 20_000.0;
    let result = dimension_circuit(&input).unwrap();
    assert_eq!(result.phase_section_mm2, 300.0);
    assert!(result.voltage_drop_percent > result.max_voltage_drop_percent);
    assert!(matches!(
        result.conditions.as_slice(),
        [DimensioningCondition::VoltageDropExceeded { section_mm2, .. }] if *section_mm2 == 300.0
    ));
    assert!(!result.is_compliant());
}

#[test]
fn method_f_feeder_reports_tabulated_neutral() {
    let mut input = feeder(27.6);
    input.installation_method = InstallationMethod::F;
    let result = dimension_circuit(&input).unwrap();
    assert_eq!(result.phase_section_mm2, 25.0);
    assert_eq!(result.neutral_section_mm2, 25.0);
    assert_eq!(result.neutral_ampacity_a, result.phase_ampacity_a);
    assert_eq!(result.protection_rating_a, 40);
}

#[test]
fn reduced_neutral_on_fifty() {
    let result = dimension_circuit(&feeder(62.0)).unwrap();
    assert_eq!(result.phase_section_mm2, 50.0);
    assert_eq!(result.neutral_section_mm2, 25.0);
    assert_eq!(result.earth_section_mm2, 25.0);
    // no rating fits 89.5 A ≤ In ≤ 99 A
    assert_eq!(result.protection_rating_a, 100);
    assert!(matches!(
        result.conditions.as_slice(),
        [DimensioningCondition::CoordinationViolation { rating_a: 100, .. }]
    ));
}

#[test]
fn harmonics_keep_full_neutral() {
    let mut input = feeder(62.0);
    input.has_harmonics = true;
    let result = dimension_circuit(&input).unwrap();
    assert_eq!(result.neutral_section_mm2, result.phase_section_mm2);
    assert!((result.correction.kh - 0.86).abs() < 1e-12);
}

#[test]
fn section_is_monotonic_in_power() {
    let mut previous = 0.0;
    let mut kva = 1.0;
    while kva <= 300.0 {
        let result = dimension_circuit(&feeder(kva)).unwrap();
        assert!(
            result.phase_section_mm2 >= previous,
            "{} kVA gave {} mm² after {} mm²",
            kva,
            result.phase_section_mm2,
            previous
        );
        previous = result.phase_section_mm2;
        kva += 2.5;
    }
}

#[test]
fn results_hold_invariants_across_options() {
    let tables = TableRepository::builtin();
    let methods = [
        InstallationMethod::A1,
        InstallationMethod::C,
        InstallationMethod::D,
        InstallationMethod::E,
        InstallationMethod::F,
    ];
    for method in methods {
        for material in [ConductorMaterial::Copper, ConductorMaterial::Aluminum] {
            for kva in [1.15, 13.8, 41.4, 120.0] {
                let mut input = feeder(kva);
                input.installation_method = method;
                input.material = material;
                input.length_m = 80.0;
                let result = dimension_circuit(&input).unwrap();
                assert!(tables.breaker_ratings_a.contains(&result.protection_rating_a));
                assert!(tables.sections_mm2.contains(&result.phase_section_mm2));
                assert!(result.neutral_section_mm2 <= result.phase_section_mm2);
                assert!(result.earth_section_mm2 <= result.phase_section_mm2);
                assert!(result.phase_section_mm2 >= result.ampacity_section_mm2);
                let coordinated = !result
                    .conditions
                    .iter()
                    .any(|c| matches!(c, DimensioningCondition::CoordinationViolation { .. }));
                if coordinated {
                    let rating = f64::from(result.protection_rating_a);
                    assert!(rating >= result.design_current_a);
                    assert!(rating <= result.corrected_ampacity_a);
                }
            }
        }
    }
}

#[test]
fn identical_inputs_serialize_identically() {
    let mut input = feeder(41.4);
    input.ambient_temperature_c = 37;
    let first = serde_json::to_string(&dimension_circuit(&input).unwrap()).unwrap();
    let second = serde_json::to_string(&dimension_circuit(&input).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn next_tabulated_policy_is_more_conservative() {
    let mut input = feeder(27.6);
    input.ambient_temperature_c = 42;
    let tables = TableRepository::builtin();
    let exact = Dimensioner::new(tables, EngineOptions::default())
        .dimension(&input)
        .unwrap();
    let next = Dimensioner::new(
        tables,
        EngineOptions {
            lookup_policy: LookupPolicy::NextTabulated,
        },
    )
    .dimension(&input)
    .unwrap();
    assert_eq!(exact.correction.k1, 1.0);
    assert_eq!(next.correction.k1, 0.79);
    assert!(next.phase_section_mm2 >= exact.phase_section_mm2);
    assert_eq!(next.conditions.len(), 1);
}

#[test]
fn schedule_exports_reports() {
    let dir = tempdir().unwrap();
    let mut rejected = final_circuit();
    rejected.voltage = -230.0;
    let schedule = CircuitSchedule {
        name: Some("integration-test".into()),
        ..CircuitSchedule::new(vec![feeder(27.6), final_circuit(), rejected])
    };

    let summary =
        analyze_schedule_with_options(&schedule, &Dimensioner::default(), Some(dir.path()))
            .unwrap();
    assert_eq!(summary.rejected(), 1);
    assert!(matches!(summary.outcomes[2], CircuitOutcome::Rejected { .. }));

    let csv = fs::read_to_string(dir.path().join("dimensioning.csv")).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Design Current Ib (A)"));
    assert!(lines[1].starts_with("P100,Q.G.E.,27.6,400.0,39.84"));

    let json = fs::read_to_string(dir.path().join("dimensioning.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["tables_version"], TableRepository::builtin().version);
    assert_eq!(value["data"]["outcomes"][2]["status"], "rejected");
    assert_eq!(
        value["data"]["outcomes"][0]["result"]["phase_section_mm2"],
        16.0
    );
}
