//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Non-fatal findings attached to a dimensioning result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Derating table consulted for a correction factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeratingTable {
    /// Quadros 52-D1/52-D2, keyed by ambient temperature.
    Temperature,
    /// Quadro 52-E1, keyed by number of grouped circuits.
    Grouping,
}

impl DeratingTable {
    pub fn reference(&self) -> &'static str {
        match self {
            DeratingTable::Temperature => "52-D1/52-D2",
            DeratingTable::Grouping => "52-E1",
        }
    }
}

/// A derating key that had no exact entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupMiss {
    pub table: DeratingTable,
    pub requested_key: i64,
    /// Tabulated key used instead, if any.
    pub applied_key: Option<i64>,
    pub applied_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum DimensioningCondition {
    /// Even the final section does not carry the design current.
    CapacityExceeded {
        section_mm2: f64,
        design_current_a: f64,
        corrected_ampacity_a: f64,
    },
    /// No standard rating satisfies Ib ≤ In ≤ Iz'.
    CoordinationViolation {
        design_current_a: f64,
        rating_a: u32,
        corrected_ampacity_a: f64,
    },
    /// The largest section still exceeds the voltage-drop limit.
    VoltageDropExceeded {
        section_mm2: f64,
        drop_percent: f64,
        max_percent: f64,
    },
    TableLookupMiss(LookupMiss),
    /// The conduit table has no entry for the final section.
    TubeDiameterUnresolved { section_mm2: f64, conductors: u32 },
}

impl DimensioningCondition {
    pub fn code(&self) -> &'static str {
        match self {
            DimensioningCondition::CapacityExceeded { .. } => "capacity_exceeded",
            DimensioningCondition::CoordinationViolation { .. } => "coordination_violation",
            DimensioningCondition::VoltageDropExceeded { .. } => "voltage_drop_exceeded",
            DimensioningCondition::TableLookupMiss(_) => "table_lookup_miss",
            DimensioningCondition::TubeDiameterUnresolved { .. } => "tube_diameter_unresolved",
        }
    }
}

impl fmt::Display for DimensioningCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensioningCondition::CapacityExceeded {
                section_mm2,
                design_current_a,
                corrected_ampacity_a,
            } => write!(
                f,
                "{} mm² carries {:.1} A, below the design current of {:.2} A",
                section_mm2, corrected_ampacity_a, design_current_a
            ),
            DimensioningCondition::CoordinationViolation {
                design_current_a,
                rating_a,
                corrected_ampacity_a,
            } => write!(
                f,
                "{} A breaker does not satisfy {:.2} A ≤ In ≤ {:.1} A",
                rating_a, design_current_a, corrected_ampacity_a
            ),
            DimensioningCondition::VoltageDropExceeded {
                section_mm2,
                drop_percent,
                max_percent,
            } => write!(
                f,
                "voltage drop {:.2}% at {} mm² exceeds the {:.0}% limit",
                drop_percent, section_mm2, max_percent
            ),
            DimensioningCondition::TableLookupMiss(miss) => match miss.applied_key {
                Some(key) => write!(
                    f,
                    "no entry for {} in Quadro {}; used {} (factor {:.2})",
                    miss.requested_key,
                    miss.table.reference(),
                    key,
                    miss.applied_factor
                ),
                None => write!(
                    f,
                    "no entry for {} in Quadro {}; factor {:.2} assumed",
                    miss.requested_key,
                    miss.table.reference(),
                    miss.applied_factor
                ),
            },
            DimensioningCondition::TubeDiameterUnresolved {
                section_mm2,
                conductors,
            } => write!(
                f,
                "no conduit diameter for {} x {} mm²",
                conductors, section_mm2
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_serialize_with_tag() {
        let condition = DimensioningCondition::TubeDiameterUnresolved {
            section_mm2: 400.0,
            conductors: 5,
        };
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value["condition"], "tube_diameter_unresolved");
        assert_eq!(value["conductors"], 5);
        assert_eq!(condition.code(), "tube_diameter_unresolved");
    }

    #[test]
    fn lookup_miss_round_trips() {
        let condition = DimensioningCondition::TableLookupMiss(LookupMiss {
            table: DeratingTable::Grouping,
            requested_key: 10,
            applied_key: Some(12),
            applied_factor: 0.45,
        });
        let json = serde_json::to_string(&condition).unwrap();
        let decoded: DimensioningCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, condition);
        assert!(condition.to_string().contains("52-E1"));
    }
}
