//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Voltage drop by the impedance method and section escalation.
//!
//! ΔU = b (ρ1 L/S cos φ + λ L sin φ) Ib, referred to the phase-to-neutral
//! voltage for three-phase circuits and to the supply voltage otherwise.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    conductor::{AmpacityRating, SearchOutcome, SectionCandidate},
    model::CircuitInput,
    tables::LINE_REACTANCE_OHM_PER_M,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageDrop {
    pub volts: f64,
    pub percent: f64,
    pub max_percent: f64,
}

impl VoltageDrop {
    pub fn within_limit(&self) -> bool {
        self.percent <= self.max_percent
    }
}

/// Section-independent terms of the drop formula for one circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropModel {
    coefficient: f64,
    resistivity: f64,
    cos_phi: f64,
    sin_phi: f64,
    length_m: f64,
    design_current_a: f64,
    reference_voltage: f64,
    max_percent: f64,
}

impl DropModel {
    pub fn new(input: &CircuitInput, design_current_a: f64) -> Self {
        let cos_phi = input.power_factor;
        Self {
            coefficient: input.phase.drop_coefficient(),
            resistivity: input.material.resistivity(),
            cos_phi,
            sin_phi: (1.0 - cos_phi * cos_phi).max(0.0).sqrt(),
            length_m: input.length_m,
            design_current_a,
            reference_voltage: input.phase.reference_voltage(input.voltage),
            max_percent: input.usage.max_voltage_drop_percent(),
        }
    }

    pub fn max_percent(&self) -> f64 {
        self.max_percent
    }

    pub fn reference_voltage(&self) -> f64 {
        self.reference_voltage
    }

    pub fn at(&self, section_mm2: f64) -> VoltageDrop {
        let resistive = self.resistivity * (self.length_m / section_mm2) * self.cos_phi;
        let reactive = LINE_REACTANCE_OHM_PER_M * self.length_m * self.sin_phi;
        let volts = self.coefficient * (resistive + reactive) * self.design_current_a;
        VoltageDrop {
            volts,
            percent: volts / self.reference_voltage * 100.0,
            max_percent: self.max_percent,
        }
    }
}

/// A section together with the drop it produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedSection {
    pub candidate: SectionCandidate,
    pub drop: VoltageDrop,
}

/// Starting from the ampacity-qualified section, adopt the first section
/// whose drop respects the limit. Sections are never reduced.
pub fn escalate_for_voltage_drop(
    rating: &AmpacityRating<'_>,
    model: &DropModel,
    start: SectionCandidate,
) -> SearchOutcome<SizedSection> {
    let initial = SizedSection {
        candidate: start,
        drop: model.at(start.section_mm2),
    };
    if initial.drop.within_limit() {
        return SearchOutcome::Qualified(initial);
    }

    let mut last = initial;
    for candidate in rating.candidates_from(start.section_mm2) {
        let sized = SizedSection {
            candidate,
            drop: model.at(candidate.section_mm2),
        };
        debug!(
            section_mm2 = candidate.section_mm2,
            drop_percent = sized.drop.percent,
            max_percent = sized.drop.max_percent,
            "voltage drop escalation step"
        );
        if sized.drop.within_limit() {
            return SearchOutcome::Qualified(sized);
        }
        last = sized;
    }
    SearchOutcome::Exhausted(last)
}
