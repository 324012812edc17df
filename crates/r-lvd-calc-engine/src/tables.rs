//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Normative table repository.
//!
//! | Data                         | Source (RTIEBT)        |
//! |------------------------------|------------------------|
//! | Base ampacity, methods A1–C  | Quadro 52-C3           |
//! | Base ampacity, method D      | Quadro 52-C4           |
//! | Base ampacity, method E      | Quadro 52-C10          |
//! | Base ampacity, method F      | Quadro 52-C11          |
//! | Ambient temperature factors  | Quadros 52-D1 / 52-D2  |
//! | Grouping factors             | Quadro 52-E1           |
//! | Conduit diameters            | Quadro 803C            |
//! | Dwelling simultaneity        | Quadro 803A            |
//!
//! Base ampacities are tabulated for copper, PVC insulation and three loaded
//! conductors; the other combinations apply the multipliers below.
//!
//! The built-in repository is constructed once per process and never mutated.
//! Alternative repositories (e.g. a newer edition of the code) can be loaded
//! from YAML/JSON through [`crate::io::load_table_repository`]; every result
//! records the [`TableRepository::version`] it was computed with.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{CalcEngineError, Result},
    model::{AmpacityTableId, InsulationClass},
};

pub const ALUMINUM_AMPACITY_FACTOR: f64 = 0.77;
pub const XLPE_AMPACITY_FACTOR: f64 = 1.28;
pub const SINGLE_PHASE_CONDUCTOR_FACTOR: f64 = 1.15;
pub const HARMONIC_DERATING_FACTOR: f64 = 0.86;
/// Ω·mm²/m
pub const COPPER_RESISTIVITY: f64 = 0.0225;
/// Ω·mm²/m
pub const ALUMINUM_RESISTIVITY: f64 = 0.036;
/// Linear reactance λ, Ω/m.
pub const LINE_REACTANCE_OHM_PER_M: f64 = 0.000_08;
pub const LIGHTING_MAX_DROP_PERCENT: f64 = 3.0;
pub const OTHER_MAX_DROP_PERCENT: f64 = 5.0;
/// Conventional tripping current of breakers relative to Iz (I2 ≤ 1.45 Iz).
pub const THERMAL_CHECK_MULTIPLIER: f64 = 1.45;

pub const BUILTIN_TABLES_VERSION: &str = "rtiebt-2006.1";

const SECTION_EPSILON: f64 = 1e-6;

static BUILTIN: Lazy<TableRepository> = Lazy::new(TableRepository::rtiebt);

/// Two cross-sections denote the same catalog entry.
pub fn same_section(a: f64, b: f64) -> bool {
    (a - b).abs() < SECTION_EPSILON
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionAmpacity {
    pub section_mm2: f64,
    pub ampacity_a: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmpacityTable {
    pub id: AmpacityTableId,
    pub entries: Vec<SectionAmpacity>,
}

impl AmpacityTable {
    /// Tabulated ampacity for an exact catalog section.
    pub fn base_ampacity(&self, section_mm2: f64) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| same_section(entry.section_mm2, section_mm2))
            .map(|entry| entry.ampacity_a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureFactor {
    pub temperature_c: i32,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureFactorTable {
    pub insulation: InsulationClass,
    pub entries: Vec<TemperatureFactor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupingFactor {
    pub circuits: u32,
    pub factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConduitDiameter {
    pub conductors: u32,
    pub diameter_mm: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConduitEntry {
    pub section_mm2: f64,
    pub diameters: Vec<ConduitDiameter>,
}

/// Simultaneity factor for a band of dwellings fed by one supply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimultaneityBand {
    pub min_installations: u32,
    /// Inclusive; `None` for the open-ended last band.
    #[serde(default)]
    pub max_installations: Option<u32>,
    pub factor: f64,
}

impl SimultaneityBand {
    fn contains(&self, installations: u32) -> bool {
        installations >= self.min_installations
            && self.max_installations.map_or(true, |max| installations <= max)
    }

    pub fn label(&self) -> String {
        match self.max_installations {
            Some(max) if max == self.min_installations => format!("{}", max),
            Some(max) => format!("{} to {}", self.min_installations, max),
            None => format!(">= {}", self.min_installations),
        }
    }
}

/// Immutable normative data consulted by every dimensioning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRepository {
    pub version: String,
    pub sections_mm2: Vec<f64>,
    pub breaker_ratings_a: Vec<u32>,
    pub ampacity: Vec<AmpacityTable>,
    pub temperature_factors: Vec<TemperatureFactorTable>,
    pub grouping_factors: Vec<GroupingFactor>,
    pub conduits: Vec<ConduitEntry>,
    #[serde(default)]
    pub apparent_power_steps_kva: Vec<f64>,
    #[serde(default)]
    pub simultaneity_bands: Vec<SimultaneityBand>,
}

impl TableRepository {
    /// Process-wide built-in repository.
    pub fn builtin() -> &'static TableRepository {
        &BUILTIN
    }

    pub fn ampacity_table(&self, id: AmpacityTableId) -> Option<&AmpacityTable> {
        self.ampacity.iter().find(|table| table.id == id)
    }

    pub fn temperature_table(
        &self,
        insulation: InsulationClass,
    ) -> Option<&TemperatureFactorTable> {
        self.temperature_factors
            .iter()
            .find(|table| table.insulation == insulation)
    }

    /// Exact-key temperature factor.
    pub fn temperature_factor(
        &self,
        insulation: InsulationClass,
        temperature_c: i32,
    ) -> Option<f64> {
        self.temperature_table(insulation)?
            .entries
            .iter()
            .find(|entry| entry.temperature_c == temperature_c)
            .map(|entry| entry.factor)
    }

    /// Exact-key grouping factor.
    pub fn grouping_factor(&self, circuits: u32) -> Option<f64> {
        self.grouping_factors
            .iter()
            .find(|entry| entry.circuits == circuits)
            .map(|entry| entry.factor)
    }

    /// Tabulated conduit diameter for an exact section and conductor count.
    pub fn conduit_diameter(&self, section_mm2: f64, conductors: u32) -> Option<u32> {
        self.conduit_entry(section_mm2)?
            .diameters
            .iter()
            .find(|d| d.conductors == conductors)
            .map(|d| d.diameter_mm)
    }

    pub fn conduit_entry(&self, section_mm2: f64) -> Option<&ConduitEntry> {
        self.conduits
            .iter()
            .find(|entry| same_section(entry.section_mm2, section_mm2))
    }

    /// Smallest catalog section not below `value_mm2`.
    pub fn round_up_section(&self, value_mm2: f64) -> Option<f64> {
        self.sections_mm2
            .iter()
            .copied()
            .find(|&section| section >= value_mm2 - SECTION_EPSILON)
    }

    pub fn largest_section(&self) -> Option<f64> {
        self.sections_mm2.last().copied()
    }

    /// Quadro 803A factor for `installations` dwellings on the same supply.
    pub fn simultaneity_for_installations(&self, installations: u32) -> Option<f64> {
        self.simultaneity_bands
            .iter()
            .find(|band| band.contains(installations))
            .map(|band| band.factor)
    }

    /// Structural checks every repository must pass before use.
    ///
    /// In particular each ampacity table must strictly increase with section,
    /// which is what makes the first qualifying section the minimal one and
    /// keeps voltage-drop escalation from undoing the ampacity constraint.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(table_error("repository version must not be empty"));
        }
        ensure_strictly_ascending(&self.sections_mm2, "standard sections")?;
        if self.sections_mm2.first().map_or(true, |&s| s <= 0.0) {
            return Err(table_error("standard sections must be non-empty and positive"));
        }
        let ratings: Vec<f64> = self.breaker_ratings_a.iter().map(|&r| f64::from(r)).collect();
        ensure_strictly_ascending(&ratings, "breaker ratings")?;
        if self.breaker_ratings_a.first().map_or(true, |&r| r == 0) {
            return Err(table_error("breaker ratings must be non-empty and positive"));
        }

        for (idx, table) in self.ampacity.iter().enumerate() {
            if self.ampacity[..idx].iter().any(|other| other.id == table.id) {
                return Err(table_error(format!("ampacity table {} is defined twice", table.id)));
            }
            if table.entries.is_empty() {
                return Err(table_error(format!("ampacity table {} is empty", table.id)));
            }
            for entry in &table.entries {
                if !self.is_catalog_section(entry.section_mm2) {
                    return Err(table_error(format!(
                        "ampacity table {} lists non-standard section {} mm²",
                        table.id, entry.section_mm2
                    )));
                }
            }
            let sections: Vec<f64> = table.entries.iter().map(|e| e.section_mm2).collect();
            ensure_strictly_ascending(&sections, &format!("sections of table {}", table.id))?;
            let ampacities: Vec<f64> = table.entries.iter().map(|e| e.ampacity_a).collect();
            ensure_strictly_ascending(&ampacities, &format!("ampacities of table {}", table.id))?;
            if ampacities[0] <= 0.0 {
                return Err(table_error(format!("table {} has non-positive ampacity", table.id)));
            }
        }

        for table in &self.temperature_factors {
            let temps: Vec<f64> = table
                .entries
                .iter()
                .map(|e| f64::from(e.temperature_c))
                .collect();
            ensure_strictly_ascending(&temps, &format!("{:?} temperature keys", table.insulation))?;
            if table.entries.iter().any(|e| e.factor <= 0.0) {
                return Err(table_error("temperature factors must be positive"));
            }
        }

        let counts: Vec<f64> = self
            .grouping_factors
            .iter()
            .map(|e| f64::from(e.circuits))
            .collect();
        ensure_strictly_ascending(&counts, "grouping counts")?;
        if self.grouping_factors.iter().any(|e| e.factor <= 0.0) {
            return Err(table_error("grouping factors must be positive"));
        }

        for entry in &self.conduits {
            if !self.is_catalog_section(entry.section_mm2) {
                return Err(table_error(format!(
                    "conduit table lists non-standard section {} mm²",
                    entry.section_mm2
                )));
            }
        }
        Ok(())
    }

    fn is_catalog_section(&self, section_mm2: f64) -> bool {
        self.sections_mm2
            .iter()
            .any(|&s| same_section(s, section_mm2))
    }

    fn rtiebt() -> Self {
        fn ampacity(id: AmpacityTableId, rows: &[(f64, f64)]) -> AmpacityTable {
            AmpacityTable {
                id,
                entries: rows
                    .iter()
                    .map(|&(section_mm2, ampacity_a)| SectionAmpacity {
                        section_mm2,
                        ampacity_a,
                    })
                    .collect(),
            }
        }

        fn temperatures(
            insulation: InsulationClass,
            rows: &[(i32, f64)],
        ) -> TemperatureFactorTable {
            TemperatureFactorTable {
                insulation,
                entries: rows
                    .iter()
                    .map(|&(temperature_c, factor)| TemperatureFactor {
                        temperature_c,
                        factor,
                    })
                    .collect(),
            }
        }

        let conduits = [
            (1.5, 16, 20),
            (2.5, 20, 25),
            (4.0, 25, 32),
            (6.0, 25, 32),
            (10.0, 32, 40),
            (16.0, 40, 50),
            (25.0, 50, 63),
            (35.0, 50, 63),
            (50.0, 63, 75),
            (70.0, 75, 90),
            (95.0, 90, 110),
            (120.0, 90, 110),
            (150.0, 110, 125),
            (185.0, 110, 125),
            (240.0, 125, 140),
            (300.0, 140, 160),
        ]
        .iter()
        .map(|&(section_mm2, three, five)| ConduitEntry {
            section_mm2,
            diameters: vec![
                ConduitDiameter {
                    conductors: 3,
                    diameter_mm: three,
                },
                ConduitDiameter {
                    conductors: 5,
                    diameter_mm: five,
                },
            ],
        })
        .collect();

        let simultaneity_bands = [
            (1, Some(1), 1.00),
            (2, Some(4), 1.00),
            (5, Some(9), 0.75),
            (10, Some(14), 0.56),
            (15, Some(19), 0.48),
            (20, Some(24), 0.43),
            (25, Some(29), 0.40),
            (30, Some(34), 0.38),
            (35, Some(39), 0.37),
            (40, Some(49), 0.36),
            (50, None, 0.34),
        ]
        .iter()
        .map(|&(min_installations, max_installations, factor)| SimultaneityBand {
            min_installations,
            max_installations,
            factor,
        })
        .collect();

        Self {
            version: BUILTIN_TABLES_VERSION.to_owned(),
            sections_mm2: vec![
                1.5, 2.5, 4.0, 6.0, 10.0, 16.0, 25.0, 35.0, 50.0, 70.0, 95.0, 120.0, 150.0, 185.0,
                240.0, 300.0,
            ],
            breaker_ratings_a: vec![
                6, 10, 16, 20, 25, 32, 40, 50, 63, 80, 100, 125, 160, 200, 250, 315, 400, 500, 630,
            ],
            ampacity: vec![
                ampacity(
                    AmpacityTableId::C3,
                    &[
                        (1.5, 13.0),
                        (2.5, 17.5),
                        (4.0, 23.0),
                        (6.0, 29.0),
                        (10.0, 39.0),
                        (16.0, 52.0),
                        (25.0, 68.0),
                        (35.0, 83.0),
                        (50.0, 99.0),
                        (70.0, 125.0),
                        (95.0, 150.0),
                        (120.0, 172.0),
                        (150.0, 196.0),
                        (185.0, 223.0),
                        (240.0, 261.0),
                        (300.0, 298.0),
                    ],
                ),
                ampacity(
                    AmpacityTableId::C4,
                    &[
                        (1.5, 22.0),
                        (2.5, 29.0),
                        (4.0, 38.0),
                        (6.0, 47.0),
                        (10.0, 63.0),
                        (16.0, 82.0),
                        (25.0, 104.0),
                        (35.0, 125.0),
                        (50.0, 150.0),
                        (70.0, 188.0),
                        (95.0, 226.0),
                        (120.0, 258.0),
                        (150.0, 292.0),
                        (185.0, 330.0),
                        (240.0, 383.0),
                        (300.0, 435.0),
                    ],
                ),
                ampacity(
                    AmpacityTableId::C10,
                    &[
                        (1.5, 18.5),
                        (2.5, 25.0),
                        (4.0, 34.0),
                        (6.0, 43.0),
                        (10.0, 60.0),
                        (16.0, 80.0),
                        (25.0, 101.0),
                        (35.0, 126.0),
                        (50.0, 153.0),
                        (70.0, 196.0),
                        (95.0, 238.0),
                        (120.0, 276.0),
                        (150.0, 319.0),
                        (185.0, 364.0),
                        (240.0, 430.0),
                        (300.0, 497.0),
                    ],
                ),
                // Single-core cables in free air are only tabulated from 25 mm².
                ampacity(
                    AmpacityTableId::C11,
                    &[
                        (25.0, 110.0),
                        (35.0, 137.0),
                        (50.0, 167.0),
                        (70.0, 216.0),
                        (95.0, 264.0),
                        (120.0, 308.0),
                        (150.0, 356.0),
                        (185.0, 409.0),
                        (240.0, 485.0),
                        (300.0, 561.0),
                    ],
                ),
            ],
            temperature_factors: vec![
                temperatures(
                    InsulationClass::Pvc,
                    &[
                        (10, 1.22),
                        (15, 1.17),
                        (20, 1.12),
                        (25, 1.06),
                        (30, 1.00),
                        (35, 0.94),
                        (40, 0.87),
                        (45, 0.79),
                        (50, 0.71),
                        (55, 0.61),
                        (60, 0.50),
                    ],
                ),
                temperatures(
                    InsulationClass::Xlpe,
                    &[
                        (10, 1.15),
                        (15, 1.12),
                        (20, 1.08),
                        (25, 1.04),
                        (30, 1.00),
                        (35, 0.96),
                        (40, 0.91),
                        (45, 0.87),
                        (50, 0.82),
                        (55, 0.76),
                        (60, 0.71),
                        (65, 0.65),
                        (70, 0.58),
                        (75, 0.50),
                        (80, 0.41),
                    ],
                ),
            ],
            grouping_factors: [
                (1, 1.00),
                (2, 0.80),
                (3, 0.70),
                (4, 0.65),
                (5, 0.60),
                (6, 0.57),
                (7, 0.54),
                (8, 0.52),
                (9, 0.50),
                (12, 0.45),
                (16, 0.41),
            ]
            .iter()
            .map(|&(circuits, factor)| GroupingFactor { circuits, factor })
            .collect(),
            conduits,
            apparent_power_steps_kva: vec![
                1.15, 2.3, 3.45, 4.6, 5.75, 6.9, 10.35, 13.8, 17.25, 20.7, 27.6, 34.5, 41.4,
            ],
            simultaneity_bands,
        }
    }
}

fn table_error(message: impl Into<String>) -> CalcEngineError {
    CalcEngineError::TableData(message.into())
}

fn ensure_strictly_ascending(values: &[f64], what: &str) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(table_error(format!("{} contain non-finite values", what)));
    }
    if values.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(table_error(format!("{} must be strictly ascending", what)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn builtin_repository_is_consistent() {
        TableRepository::builtin().validate().unwrap();
    }

    #[test]
    fn every_table_id_has_data() {
        let tables = TableRepository::builtin();
        for id in AmpacityTableId::iter() {
            assert!(tables.ampacity_table(id).is_some(), "missing {id}");
        }
    }

    #[test]
    fn exact_lookups() {
        let tables = TableRepository::builtin();
        assert_eq!(tables.temperature_factor(InsulationClass::Pvc, 30), Some(1.0));
        assert_eq!(tables.temperature_factor(InsulationClass::Xlpe, 45), Some(0.87));
        assert_eq!(tables.temperature_factor(InsulationClass::Pvc, 65), None);
        assert_eq!(tables.grouping_factor(5), Some(0.60));
        assert_eq!(tables.grouping_factor(10), None);
        let c3 = tables.ampacity_table(AmpacityTableId::C3).unwrap();
        assert_eq!(c3.base_ampacity(2.5), Some(17.5));
        let c11 = tables.ampacity_table(AmpacityTableId::C11).unwrap();
        assert_eq!(c11.base_ampacity(16.0), None);
    }

    #[test]
    fn round_up_to_catalog() {
        let tables = TableRepository::builtin();
        assert_eq!(tables.round_up_section(47.5), Some(50.0));
        assert_eq!(tables.round_up_section(16.0), Some(16.0));
        assert_eq!(tables.round_up_section(0.5), Some(1.5));
        assert_eq!(tables.round_up_section(400.0), None);
    }

    #[test]
    fn conduit_lookup() {
        let tables = TableRepository::builtin();
        assert_eq!(tables.conduit_diameter(16.0, 5), Some(50));
        assert_eq!(tables.conduit_diameter(16.0, 3), Some(40));
        assert_eq!(tables.conduit_diameter(16.0, 4), None);
    }

    #[test]
    fn simultaneity_bands() {
        let tables = TableRepository::builtin();
        assert_eq!(tables.simultaneity_for_installations(1), Some(1.0));
        assert_eq!(tables.simultaneity_for_installations(7), Some(0.75));
        assert_eq!(tables.simultaneity_for_installations(49), Some(0.36));
        assert_eq!(tables.simultaneity_for_installations(120), Some(0.34));
        assert_eq!(tables.simultaneity_for_installations(0), None);
        assert_eq!(tables.simultaneity_bands[1].label(), "2 to 4");
        assert_eq!(tables.simultaneity_bands[10].label(), ">= 50");
    }

    #[test]
    fn non_monotonic_ampacity_is_rejected() {
        let mut tables = TableRepository::builtin().clone();
        tables.ampacity[0].entries[3].ampacity_a = 10.0;
        let err = tables.validate().unwrap_err();
        assert!(err.to_string().contains("52-C3"));
    }

    #[test]
    fn unknown_section_is_rejected() {
        let mut tables = TableRepository::builtin().clone();
        tables.conduits[0].section_mm2 = 3.0;
        assert!(tables.validate().is_err());
    }
}
