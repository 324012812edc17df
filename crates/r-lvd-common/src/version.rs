//! ---
//! lvd_section: "01-core-functionality"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Shared primitives and utilities for the dimensioning workspace."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// Build metadata reported by `r-lvdctl -V`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    pub semver: String,
    pub package: String,
    pub profile: String,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            semver: env!("CARGO_PKG_VERSION").to_owned(),
            package: env!("CARGO_PKG_NAME").to_owned(),
            profile: if cfg!(debug_assertions) {
                "debug".to_owned()
            } else {
                "release".to_owned()
            },
        }
    }

    /// Multi-line description; `tables_version` names the normative data in use.
    pub fn extended(&self, tables_version: &str) -> String {
        format!(
            "r-lvd {}\nprofile: {}\nnormative tables: {}",
            self.semver, self.profile, tables_version
        )
    }
}
