//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use std::{borrow::Cow, fs, path::Path};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

use crate::{
    errors::{CalcEngineError, Result},
    model::{CircuitInput, ConfigurationIssue},
    tables::TableRepository,
};

/// A named list of circuits dimensioned together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSchedule {
    #[serde(default)]
    pub name: Option<String>,
    /// Dwellings served together; sets every circuit's simultaneity factor
    /// from Quadro 803A.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installations: Option<u32>,
    pub circuits: Vec<CircuitInput>,
}

impl CircuitSchedule {
    pub fn new(circuits: Vec<CircuitInput>) -> Self {
        Self {
            name: None,
            installations: None,
            circuits,
        }
    }

    /// Circuits as dimensioned, with the dwelling simultaneity applied.
    pub fn resolved_circuits(&self, tables: &TableRepository) -> Result<Cow<'_, [CircuitInput]>> {
        let Some(installations) = self.installations else {
            return Ok(Cow::Borrowed(&self.circuits));
        };
        let factor = tables
            .simultaneity_for_installations(installations)
            .ok_or_else(|| {
                CalcEngineError::InvalidConfiguration(vec![
                    ConfigurationIssue::UnresolvedInstallations(installations),
                ])
            })?;
        Ok(Cow::Owned(
            self.circuits
                .iter()
                .map(|circuit| CircuitInput {
                    simultaneity_factor: factor,
                    ..circuit.clone()
                })
                .collect(),
        ))
    }
}

fn parse_document<T: DeserializeOwned>(data: &str) -> Result<T> {
    let value = if data.trim_start().starts_with('{') || data.trim_start().starts_with('[') {
        serde_json::from_str(data)?
    } else {
        serde_yaml::from_str(data).map_err(CalcEngineError::YamlSerializationFailed)?
    };
    Ok(value)
}

/// Load a schedule from YAML or JSON. A bare list of circuits is accepted too.
pub fn load_schedule_from_file(path: impl AsRef<Path>) -> Result<CircuitSchedule> {
    let data = fs::read_to_string(path)?;
    parse_schedule(&data)
}

pub fn parse_schedule(data: &str) -> Result<CircuitSchedule> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScheduleDocument {
        Named(CircuitSchedule),
        Bare(Vec<CircuitInput>),
    }

    let schedule = match parse_document::<ScheduleDocument>(data)? {
        ScheduleDocument::Named(schedule) => schedule,
        ScheduleDocument::Bare(circuits) => CircuitSchedule::new(circuits),
    };
    Ok(schedule)
}

pub fn load_circuit_from_file(path: impl AsRef<Path>) -> Result<CircuitInput> {
    let data = fs::read_to_string(path)?;
    parse_document(&data)
}

/// Load and validate a table repository from YAML or JSON.
pub fn load_table_repository(path: impl AsRef<Path>) -> Result<TableRepository> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let tables: TableRepository = parse_document(&data)?;
    tables.validate()?;
    info!(
        version = %tables.version,
        "Loaded table repository from {}",
        path.display()
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn yaml_schedule() {
        let schedule = parse_schedule(
            r#"
name: dwelling
circuits:
  - origin: Q.E.
    destination: lighting
    apparent_power_kva: 1.15
    power_factor: 1.0
    voltage: 230
    phase: single
    insulation: pvc
    material: copper
    installation_method: B1
    usage: lighting
    length_m: 18
"#,
        )
        .unwrap();
        assert_eq!(schedule.name.as_deref(), Some("dwelling"));
        assert_eq!(schedule.circuits.len(), 1);
    }

    #[test]
    fn bare_json_list() {
        let raw = serde_json::to_string(&vec![crate::test_support::sample_input()]).unwrap();
        let schedule = parse_schedule(&raw).unwrap();
        assert!(schedule.name.is_none());
        assert_eq!(schedule.circuits[0].origin, "P100");
    }

    #[test]
    fn dwelling_count_sets_simultaneity() {
        let mut schedule = CircuitSchedule::new(vec![crate::test_support::sample_input()]);
        let tables = TableRepository::builtin();
        assert!(matches!(schedule.resolved_circuits(tables).unwrap(), Cow::Borrowed(_)));

        schedule.installations = Some(7);
        let circuits = schedule.resolved_circuits(tables).unwrap();
        assert_eq!(circuits[0].simultaneity_factor, 0.75);
        assert_eq!(schedule.circuits[0].simultaneity_factor, 1.0);

        schedule.installations = Some(0);
        let err = schedule.resolved_circuits(tables).unwrap_err();
        assert_eq!(err.issues(), [ConfigurationIssue::UnresolvedInstallations(0)]);
    }

    #[test]
    fn repository_round_trip_through_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let yaml = serde_yaml::to_string(TableRepository::builtin()).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let tables = load_table_repository(file.path()).unwrap();
        assert_eq!(&tables, TableRepository::builtin());
    }

    #[test]
    fn invalid_repository_is_rejected() {
        let mut tables = TableRepository::builtin().clone();
        tables.breaker_ratings_a.reverse();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&tables).unwrap().as_bytes()).unwrap();
        assert!(matches!(
            load_table_repository(file.path()),
            Err(CalcEngineError::TableData(_))
        ));
    }
}
