//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Ampacity-driven section search.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::{CalcEngineError, Result},
    model::CircuitInput,
    tables::{same_section, AmpacityTable, SectionAmpacity},
};

/// Result of a bounded ascending search over the section catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome<T> {
    /// The first entry satisfying the constraint.
    Qualified(T),
    /// Nothing qualified; carries the largest entry examined.
    Exhausted(T),
}

impl<T> SearchOutcome<T> {
    pub fn is_qualified(&self) -> bool {
        matches!(self, SearchOutcome::Qualified(_))
    }

    pub fn value(&self) -> &T {
        match self {
            SearchOutcome::Qualified(value) | SearchOutcome::Exhausted(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            SearchOutcome::Qualified(value) | SearchOutcome::Exhausted(value) => value,
        }
    }
}

/// Ampacity figures of one catalog section for a given circuit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionCandidate {
    pub section_mm2: f64,
    /// Tabulated value (Cu, PVC, three loaded conductors).
    pub base_ampacity_a: f64,
    /// Base × material × insulation × loaded-conductor factors (izFase).
    pub usable_ampacity_a: f64,
    /// Usable × FC (Iz').
    pub corrected_ampacity_a: f64,
}

impl SectionCandidate {
    pub fn carries(&self, design_current_a: f64) -> bool {
        self.corrected_ampacity_a >= design_current_a
    }
}

/// Ampacity table bound to a circuit's multipliers and correction factor.
///
/// The circuit's catalog is the set of sections tabulated in its table, so
/// methods tabulated only from 25 mm² never consider smaller sections.
#[derive(Debug, Clone, Copy)]
pub struct AmpacityRating<'a> {
    table: &'a AmpacityTable,
    largest: SectionAmpacity,
    multiplier: f64,
    correction: f64,
}

impl<'a> AmpacityRating<'a> {
    pub fn new(table: &'a AmpacityTable, input: &CircuitInput, correction: f64) -> Result<Self> {
        let Some(&largest) = table.entries.last() else {
            return Err(CalcEngineError::TableData(format!(
                "ampacity table {} is empty",
                table.id
            )));
        };
        let multiplier = input.material.ampacity_factor()
            * input.insulation.ampacity_factor()
            * input.phase.loaded_conductor_factor();
        Ok(Self {
            table,
            largest,
            multiplier,
            correction,
        })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Figures for a tabulated section; `None` when the table skips it.
    pub fn candidate(&self, section_mm2: f64) -> Option<SectionCandidate> {
        self.table
            .base_ampacity(section_mm2)
            .map(|base| self.rate(section_mm2, base))
    }

    /// Candidates from `start_mm2` upwards, ascending.
    pub fn candidates_from(&self, start_mm2: f64) -> impl Iterator<Item = SectionCandidate> + '_ {
        self.table
            .entries
            .iter()
            .filter(move |e| e.section_mm2 > start_mm2 || same_section(e.section_mm2, start_mm2))
            .map(move |e| self.rate(e.section_mm2, e.ampacity_a))
    }

    /// Smallest tabulated section not below `section_mm2`.
    pub fn round_up(&self, section_mm2: f64) -> Option<SectionCandidate> {
        self.candidates_from(section_mm2).next()
    }

    pub fn largest(&self) -> SectionCandidate {
        self.rate(self.largest.section_mm2, self.largest.ampacity_a)
    }

    fn rate(&self, section_mm2: f64, base_ampacity_a: f64) -> SectionCandidate {
        let usable_ampacity_a = base_ampacity_a * self.multiplier;
        SectionCandidate {
            section_mm2,
            base_ampacity_a,
            usable_ampacity_a,
            corrected_ampacity_a: usable_ampacity_a * self.correction,
        }
    }
}

/// Smallest section whose corrected ampacity covers the design current.
pub fn select_by_ampacity(
    rating: &AmpacityRating<'_>,
    design_current_a: f64,
) -> SearchOutcome<SectionCandidate> {
    for candidate in rating.candidates_from(0.0) {
        debug!(
            section_mm2 = candidate.section_mm2,
            corrected_ampacity_a = candidate.corrected_ampacity_a,
            design_current_a,
            "ampacity search step"
        );
        if candidate.carries(design_current_a) {
            return SearchOutcome::Qualified(candidate);
        }
    }
    SearchOutcome::Exhausted(rating.largest())
}
