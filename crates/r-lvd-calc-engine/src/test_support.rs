//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "test"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Shared fixtures for unit tests.

use crate::model::{
    CircuitInput, ConductorMaterial, InstallationMethod, InsulationClass, PhaseConfiguration,
    UsageCategory,
};

/// 27.6 kVA three-phase feeder from a P100 supply to the main board.
pub fn sample_input() -> CircuitInput {
    CircuitInput {
        origin: "P100".to_owned(),
        destination: "Q.G.E.".to_owned(),
        apparent_power_kva: 27.6,
        simultaneity_factor: 1.0,
        power_factor: 0.9,
        voltage: 400.0,
        phase: PhaseConfiguration::Three,
        insulation: InsulationClass::Xlpe,
        material: ConductorMaterial::Copper,
        installation_method: InstallationMethod::B1,
        usage: UsageCategory::Other,
        length_m: 13.0,
        ambient_temperature_c: 30,
        grouping_count: 1,
        has_harmonics: false,
    }
}

/// Same circuit with PVC insulation, so base table values apply unscaled.
pub fn pvc_input() -> CircuitInput {
    CircuitInput {
        insulation: InsulationClass::Pvc,
        ..sample_input()
    }
}
