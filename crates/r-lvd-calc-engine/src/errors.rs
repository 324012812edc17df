//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use thiserror::Error;

use crate::model::ConfigurationIssue;

pub type Result<T> = std::result::Result<T, CalcEngineError>;

#[derive(Debug, Error)]
pub enum CalcEngineError {
    #[error("invalid circuit configuration: {}", format_issues(.0))]
    InvalidConfiguration(Vec<ConfigurationIssue>),
    #[error("inconsistent normative table data: {0}")]
    TableData(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
    #[error("csv export error: {0}")]
    CsvExportFailed(#[from] csv::Error),
}

impl CalcEngineError {
    /// Issues carried by an [`CalcEngineError::InvalidConfiguration`], empty otherwise.
    pub fn issues(&self) -> &[ConfigurationIssue] {
        match self {
            CalcEngineError::InvalidConfiguration(issues) => issues,
            _ => &[],
        }
    }
}

fn format_issues(issues: &[ConfigurationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
