//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Neutral and protective-earth conductor sizing, and conduit diameter.

use crate::{model::PhaseConfiguration, tables::TableRepository};

/// Reduced section for conductors allowed to be smaller than the phase:
/// unchanged up to 16 mm², 16 mm² up to 35 mm², half above, on the catalog.
fn reduced_section(tables: &TableRepository, phase_mm2: f64) -> f64 {
    let reduced = if phase_mm2 <= 16.0 {
        phase_mm2
    } else if phase_mm2 <= 35.0 {
        16.0
    } else {
        tables.round_up_section(phase_mm2 / 2.0).unwrap_or(phase_mm2)
    };
    reduced.min(phase_mm2)
}

/// Harmonic currents add up in the neutral, so harmonics keep it at full size.
pub fn neutral_section(
    tables: &TableRepository,
    phase_mm2: f64,
    phase: PhaseConfiguration,
    has_harmonics: bool,
) -> f64 {
    if !phase.is_three_phase() || has_harmonics {
        return phase_mm2;
    }
    reduced_section(tables, phase_mm2)
}

pub fn earth_section(tables: &TableRepository, phase_mm2: f64) -> f64 {
    reduced_section(tables, phase_mm2)
}

/// Conduit diameter in mm, falling back to the five-conductor column.
pub fn tube_diameter(tables: &TableRepository, section_mm2: f64, conductors: u32) -> Option<u32> {
    tables
        .conduit_diameter(section_mm2, conductors)
        .or_else(|| tables.conduit_diameter(section_mm2, 5))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> &'static TableRepository {
        TableRepository::builtin()
    }

    #[test]
    fn neutral_reduction_table() {
        let cases = [
            (10.0, 10.0),
            (16.0, 16.0),
            (25.0, 16.0),
            (35.0, 16.0),
            (50.0, 25.0),
            (70.0, 35.0),
            (95.0, 50.0),
            (120.0, 70.0),
            (150.0, 95.0),
            (185.0, 95.0),
            (240.0, 120.0),
            (300.0, 150.0),
        ];
        for (phase, neutral) in cases {
            assert_eq!(
                neutral_section(tables(), phase, PhaseConfiguration::Three, false),
                neutral,
                "phase {phase}"
            );
        }
    }

    #[test]
    fn full_neutral_for_single_phase_and_harmonics() {
        assert_eq!(neutral_section(tables(), 50.0, PhaseConfiguration::Single, false), 50.0);
        assert_eq!(neutral_section(tables(), 50.0, PhaseConfiguration::Three, true), 50.0);
    }

    #[test]
    fn earth_sizing() {
        assert_eq!(earth_section(tables(), 6.0), 6.0);
        assert_eq!(earth_section(tables(), 25.0), 16.0);
        assert_eq!(earth_section(tables(), 50.0), 25.0);
        assert_eq!(earth_section(tables(), 95.0), 50.0);
    }

    #[test]
    fn derived_never_exceed_phase() {
        for &section in &tables().sections_mm2 {
            assert!(earth_section(tables(), section) <= section);
            assert!(
                neutral_section(tables(), section, PhaseConfiguration::Three, false) <= section
            );
        }
    }

    #[test]
    fn tube_lookup_with_fallback() {
        assert_eq!(tube_diameter(tables(), 16.0, 5), Some(50));
        assert_eq!(tube_diameter(tables(), 2.5, 3), Some(20));
        assert_eq!(tube_diameter(tables(), 2.5, 4), Some(25));
        assert_eq!(tube_diameter(tables(), 400.0, 5), None);
    }
}
