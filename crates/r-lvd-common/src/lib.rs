//! ---
//! lvd_section: "01-core-functionality"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Shared primitives and utilities for the dimensioning workspace."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Core shared primitives for the R-LVD workspace.
//! This crate exposes configuration loading, logging bootstrap, and
//! version metadata utilities consumed by the engine and the CLI.

pub mod config;
pub mod logging;
pub mod version;

pub use config::{
    ApiConfig, AppConfig, EngineConfig, LoadedAppConfig, LoggingConfig, LookupPolicy,
    ReportConfig, ReportFormat,
};
pub use logging::{init_tracing, LogFormat};
pub use version::VersionInfo;
