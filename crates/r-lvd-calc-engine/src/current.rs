//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Design current (Secção 523, Quadro 803A).

use crate::model::{CircuitInput, PhaseConfiguration};

/// Service current Ib in amperes for an effective apparent power.
pub fn design_current_for(
    effective_power_kva: f64,
    voltage: f64,
    phase: PhaseConfiguration,
) -> f64 {
    let volt_amperes = effective_power_kva * 1000.0;
    match phase {
        PhaseConfiguration::Three => volt_amperes / (3f64.sqrt() * voltage),
        PhaseConfiguration::Single => volt_amperes / voltage,
    }
}

/// Service current Ib of a validated circuit.
pub fn design_current(input: &CircuitInput) -> f64 {
    design_current_for(input.effective_power_kva(), input.voltage, input.phase)
}
