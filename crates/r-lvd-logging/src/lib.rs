//! ---
//! lvd_section: "03-logging"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Structured logging adapters and sinks."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Structured logging helpers shared by the dimensioning engine and the CLI.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;

/// Initialize a baseline tracing subscriber suitable for development.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Origin label of the circuit being dimensioned.
    pub origin: Option<&'a str>,
    /// Destination label of the circuit being dimensioned.
    pub destination: Option<&'a str>,
    /// Normative ampacity table used for the circuit.
    pub table: Option<&'a str>,
    /// Table lookup policy in effect.
    pub policy: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the circuit's origin and destination labels.
    pub fn with_circuit(mut self, origin: &'a str, destination: &'a str) -> Self {
        self.origin = Some(origin);
        self.destination = Some(destination);
        self
    }

    /// Attach the ampacity table identifier.
    pub fn with_table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Attach the lookup policy descriptor.
    pub fn with_policy(mut self, policy: &'a str) -> Self {
        self.policy = Some(policy);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized system event with a success/fault outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let default_ctx = LogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    match outcome {
        SystemEventOutcome::Success => tracing::event!(
            Level::INFO,
            event = %event,
            outcome = outcome.as_str(),
            origin = ctx.origin.unwrap_or(""),
            destination = ctx.destination.unwrap_or(""),
            table = ctx.table.unwrap_or(""),
            message = %message
        ),
        SystemEventOutcome::Fault => tracing::event!(
            Level::ERROR,
            event = %event,
            outcome = outcome.as_str(),
            origin = ctx.origin.unwrap_or(""),
            destination = ctx.destination.unwrap_or(""),
            table = ctx.table.unwrap_or(""),
            message = %message
        ),
    }
}
