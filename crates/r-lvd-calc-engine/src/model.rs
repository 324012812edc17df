//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Circuit description and the closed vocabulary of installation options.
//!
//! Every enumerated option carries its normative parameters (table id,
//! multipliers, limits) directly, so the engine never inspects display labels.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

use crate::tables::{
    ALUMINUM_AMPACITY_FACTOR, ALUMINUM_RESISTIVITY, COPPER_RESISTIVITY, LIGHTING_MAX_DROP_PERCENT,
    OTHER_MAX_DROP_PERCENT, SINGLE_PHASE_CONDUCTOR_FACTOR, XLPE_AMPACITY_FACTOR,
};

fn default_simultaneity() -> f64 {
    1.0
}

fn default_ambient_temperature() -> i32 {
    30
}

fn default_grouping_count() -> u32 {
    1
}

/// Electrical and installation parameters of a single circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitInput {
    pub origin: String,
    pub destination: String,
    pub apparent_power_kva: f64,
    #[serde(default = "default_simultaneity")]
    pub simultaneity_factor: f64,
    pub power_factor: f64,
    pub voltage: f64,
    pub phase: PhaseConfiguration,
    pub insulation: InsulationClass,
    pub material: ConductorMaterial,
    pub installation_method: InstallationMethod,
    pub usage: UsageCategory,
    pub length_m: f64,
    #[serde(default = "default_ambient_temperature")]
    pub ambient_temperature_c: i32,
    #[serde(default = "default_grouping_count")]
    pub grouping_count: u32,
    #[serde(default)]
    pub has_harmonics: bool,
}

impl CircuitInput {
    /// Effective apparent power after diversity, in kVA.
    pub fn effective_power_kva(&self) -> f64 {
        self.apparent_power_kva * self.simultaneity_factor
    }

    /// Physical validity checks that do not depend on table data.
    pub fn validate(&self) -> Vec<ConfigurationIssue> {
        let mut issues = Vec::new();
        if !self.voltage.is_finite() || self.voltage <= 0.0 {
            issues.push(ConfigurationIssue::NonPositiveVoltage(self.voltage));
        }
        if !self.length_m.is_finite() || self.length_m <= 0.0 {
            issues.push(ConfigurationIssue::NonPositiveLength(self.length_m));
        }
        if !self.apparent_power_kva.is_finite() || self.apparent_power_kva <= 0.0 {
            issues.push(ConfigurationIssue::NonPositivePower(self.apparent_power_kva));
        }
        if !self.simultaneity_factor.is_finite()
            || self.simultaneity_factor <= 0.0
            || self.simultaneity_factor > 1.0
        {
            issues.push(ConfigurationIssue::SimultaneityOutOfRange(
                self.simultaneity_factor,
            ));
        }
        if !(0.0..=1.0).contains(&self.power_factor) {
            issues.push(ConfigurationIssue::PowerFactorOutOfRange(self.power_factor));
        }
        if self.grouping_count == 0 {
            issues.push(ConfigurationIssue::ZeroGroupingCount);
        }
        issues
    }
}

/// A single reason why a [`CircuitInput`] cannot be dimensioned.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "issue", content = "value", rename_all = "snake_case")]
pub enum ConfigurationIssue {
    #[error("voltage must be positive (got {0} V)")]
    NonPositiveVoltage(f64),
    #[error("length must be positive (got {0} m)")]
    NonPositiveLength(f64),
    #[error("apparent power must be positive (got {0} kVA)")]
    NonPositivePower(f64),
    #[error("simultaneity factor must lie in (0, 1] (got {0})")]
    SimultaneityOutOfRange(f64),
    #[error("power factor must lie in [0, 1] (got {0})")]
    PowerFactorOutOfRange(f64),
    #[error("grouping count must be at least 1")]
    ZeroGroupingCount,
    #[error("no simultaneity band covers {0} installations")]
    UnresolvedInstallations(u32),
    #[error("installation method {method} maps to table {table}, which the repository does not provide")]
    UnmappedInstallationMethod {
        method: InstallationMethod,
        table: AmpacityTableId,
    },
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PhaseConfiguration {
    Single,
    Three,
}

impl PhaseConfiguration {
    pub fn label(&self) -> &'static str {
        match self {
            PhaseConfiguration::Single => "Single-phase (230 V)",
            PhaseConfiguration::Three => "Three-phase (400 V)",
        }
    }

    pub fn is_three_phase(&self) -> bool {
        matches!(self, PhaseConfiguration::Three)
    }

    /// Two loaded conductors carry more current than three under the same table.
    pub fn loaded_conductor_factor(&self) -> f64 {
        match self {
            PhaseConfiguration::Single => SINGLE_PHASE_CONDUCTOR_FACTOR,
            PhaseConfiguration::Three => 1.0,
        }
    }

    /// Coefficient `b` of the voltage-drop formula.
    pub fn drop_coefficient(&self) -> f64 {
        match self {
            PhaseConfiguration::Single => 2.0,
            PhaseConfiguration::Three => 1.0,
        }
    }

    /// Voltage the percentage drop is referred to.
    pub fn reference_voltage(&self, voltage: f64) -> f64 {
        match self {
            PhaseConfiguration::Single => voltage,
            PhaseConfiguration::Three => voltage / 3f64.sqrt(),
        }
    }

    /// Conductors drawn through the conduit (phases, neutral and earth).
    pub fn conduit_conductor_count(&self) -> u32 {
        match self {
            PhaseConfiguration::Single => 3,
            PhaseConfiguration::Three => 5,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InsulationClass {
    /// Thermoplastic, 70 °C.
    Pvc,
    /// Thermosetting (XLPE/EPR), 90 °C.
    Xlpe,
}

impl InsulationClass {
    pub fn label(&self) -> &'static str {
        match self {
            InsulationClass::Pvc => "PVC (70 °C)",
            InsulationClass::Xlpe => "XLPE/EPR (90 °C)",
        }
    }

    /// Multiplier over the PVC-based ampacity tables.
    pub fn ampacity_factor(&self) -> f64 {
        match self {
            InsulationClass::Pvc => 1.0,
            InsulationClass::Xlpe => XLPE_AMPACITY_FACTOR,
        }
    }

    pub fn designation_prefix(&self) -> &'static str {
        match self {
            InsulationClass::Pvc => "H07V",
            InsulationClass::Xlpe => "XV",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConductorMaterial {
    Copper,
    Aluminum,
}

impl ConductorMaterial {
    pub fn label(&self) -> &'static str {
        match self {
            ConductorMaterial::Copper => "Copper (Cu)",
            ConductorMaterial::Aluminum => "Aluminum (Al)",
        }
    }

    /// Multiplier over the copper-based ampacity tables.
    pub fn ampacity_factor(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => 1.0,
            ConductorMaterial::Aluminum => ALUMINUM_AMPACITY_FACTOR,
        }
    }

    /// Resistivity ρ1 in Ω·mm²/m at operating temperature.
    pub fn resistivity(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => COPPER_RESISTIVITY,
            ConductorMaterial::Aluminum => ALUMINUM_RESISTIVITY,
        }
    }

    pub fn designation_suffix(&self) -> &'static str {
        match self {
            ConductorMaterial::Copper => "-R",
            ConductorMaterial::Aluminum => "-AL",
        }
    }
}

/// Reference installation methods.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
pub enum InstallationMethod {
    A1,
    A2,
    B1,
    B2,
    C,
    D,
    E,
    F,
}

impl InstallationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            InstallationMethod::A1 => "A1 - Insulated conductors in conduit in a thermally insulating wall",
            InstallationMethod::A2 => "A2 - Multicore cable in conduit in a thermally insulating wall",
            InstallationMethod::B1 => "B1 - Insulated conductors in conduit on or in a masonry wall",
            InstallationMethod::B2 => "B2 - Multicore cable in conduit on or in a masonry wall",
            InstallationMethod::C => "C - Cables fixed directly on a wall",
            InstallationMethod::D => "D - Cables in buried ducts",
            InstallationMethod::E => "E - Multicore cable in free air",
            InstallationMethod::F => "F - Single-core cables in free air",
        }
    }

    /// Base ampacity table that governs the method.
    pub fn table_id(&self) -> AmpacityTableId {
        match self {
            InstallationMethod::A1
            | InstallationMethod::A2
            | InstallationMethod::B1
            | InstallationMethod::B2
            | InstallationMethod::C => AmpacityTableId::C3,
            InstallationMethod::D => AmpacityTableId::C4,
            InstallationMethod::E => AmpacityTableId::C10,
            InstallationMethod::F => AmpacityTableId::C11,
        }
    }
}

impl std::fmt::Display for InstallationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Identifier of a base ampacity table (Quadro 52-C*).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    AsRefStr,
)]
pub enum AmpacityTableId {
    #[serde(rename = "52-C3")]
    #[strum(serialize = "52-C3")]
    C3,
    #[serde(rename = "52-C4")]
    #[strum(serialize = "52-C4")]
    C4,
    #[serde(rename = "52-C10")]
    #[strum(serialize = "52-C10")]
    C10,
    #[serde(rename = "52-C11")]
    #[strum(serialize = "52-C11")]
    C11,
}

impl std::fmt::Display for AmpacityTableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UsageCategory {
    Lighting,
    Other,
}

impl UsageCategory {
    pub fn label(&self) -> &'static str {
        match self {
            UsageCategory::Lighting => "Lighting (max. 3 %)",
            UsageCategory::Other => "Other uses (max. 5 %)",
        }
    }

    pub fn max_voltage_drop_percent(&self) -> f64 {
        match self {
            UsageCategory::Lighting => LIGHTING_MAX_DROP_PERCENT,
            UsageCategory::Other => OTHER_MAX_DROP_PERCENT,
        }
    }
}

/// One presentable option of an enumerated input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyOption {
    pub code: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// Every enumerated option value presented to users and rendered in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub phase_configurations: Vec<VocabularyOption>,
    pub insulation_classes: Vec<VocabularyOption>,
    pub conductor_materials: Vec<VocabularyOption>,
    pub installation_methods: Vec<VocabularyOption>,
    pub usage_categories: Vec<VocabularyOption>,
}

impl Vocabulary {
    pub fn build() -> Self {
        fn options<T, F>(label: F) -> Vec<VocabularyOption>
        where
            T: IntoEnumIterator + AsRef<str>,
            F: Fn(&T) -> &'static str,
        {
            T::iter()
                .map(|value| VocabularyOption {
                    code: value.as_ref().to_owned(),
                    label: label(&value).to_owned(),
                    table: None,
                })
                .collect()
        }

        Self {
            phase_configurations: options::<PhaseConfiguration, _>(PhaseConfiguration::label),
            insulation_classes: options::<InsulationClass, _>(InsulationClass::label),
            conductor_materials: options::<ConductorMaterial, _>(ConductorMaterial::label),
            installation_methods: InstallationMethod::iter()
                .map(|method| VocabularyOption {
                    code: method.as_ref().to_owned(),
                    label: method.label().to_owned(),
                    table: Some(method.table_id().to_string()),
                })
                .collect(),
            usage_categories: options::<UsageCategory, _>(UsageCategory::label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_input;

    #[test]
    fn valid_input_has_no_issues() {
        assert!(sample_input().validate().is_empty());
    }

    #[test]
    fn every_physical_violation_is_listed() {
        let mut input = sample_input();
        input.voltage = 0.0;
        input.length_m = -2.0;
        input.power_factor = 1.2;
        input.simultaneity_factor = 0.0;
        input.grouping_count = 0;
        let issues = input.validate();
        assert_eq!(issues.len(), 5);
        assert!(issues.contains(&ConfigurationIssue::NonPositiveVoltage(0.0)));
        assert!(issues.contains(&ConfigurationIssue::ZeroGroupingCount));
    }

    #[test]
    fn nan_power_factor_is_rejected() {
        let mut input = sample_input();
        input.power_factor = f64::NAN;
        assert_eq!(input.validate().len(), 1);
    }

    #[test]
    fn methods_map_to_tables() {
        assert_eq!(InstallationMethod::B1.table_id(), AmpacityTableId::C3);
        assert_eq!(InstallationMethod::C.table_id(), AmpacityTableId::C3);
        assert_eq!(InstallationMethod::D.table_id(), AmpacityTableId::C4);
        assert_eq!(InstallationMethod::F.table_id().to_string(), "52-C11");
    }

    #[test]
    fn codes_parse_and_deserialize_identically() {
        let parsed: InsulationClass = "xlpe".parse().unwrap();
        let decoded: InsulationClass = serde_json::from_str("\"xlpe\"").unwrap();
        assert_eq!(parsed, decoded);
        let table: AmpacityTableId = serde_json::from_str("\"52-C4\"").unwrap();
        assert_eq!(table, "52-C4".parse().unwrap());
    }

    #[test]
    fn input_defaults_apply_when_omitted() {
        let raw = r#"{
            "origin": "QGE", "destination": "QP1",
            "apparent_power_kva": 4.6, "power_factor": 0.95, "voltage": 230,
            "phase": "single", "insulation": "pvc", "material": "copper",
            "installation_method": "B1", "usage": "lighting", "length_m": 20
        }"#;
        let input: CircuitInput = serde_json::from_str(raw).unwrap();
        assert_eq!(input.simultaneity_factor, 1.0);
        assert_eq!(input.ambient_temperature_c, 30);
        assert_eq!(input.grouping_count, 1);
        assert!(!input.has_harmonics);
    }

    #[test]
    fn vocabulary_lists_every_option() {
        let vocab = Vocabulary::build();
        assert_eq!(vocab.installation_methods.len(), 8);
        assert_eq!(vocab.phase_configurations.len(), 2);
        let d = vocab
            .installation_methods
            .iter()
            .find(|o| o.code == "D")
            .unwrap();
        assert_eq!(d.table.as_deref(), Some("52-C4"));
    }
}
