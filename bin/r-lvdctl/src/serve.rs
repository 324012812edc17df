//! ---
//! lvd_section: "05-networking-external-interfaces"
//! lvd_subsection: "binary"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Control CLI for dimensioning low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use r_lvd_calc_engine::api::{router, ApiState};
use r_lvd_logging::{log_system_event, SystemEventOutcome};
use tracing::info;

use crate::Session;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides `[api].listen`).
    #[arg(long, value_name = "ADDR", env = "R_LVD_LISTEN")]
    listen: Option<SocketAddr>,
}

pub fn run(session: Session, args: ServeArgs) -> Result<()> {
    let listen = args.listen.unwrap_or(session.config.api.listen);
    let state = ApiState {
        tables: Arc::new(session.tables.into_owned()),
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(serve(listen, state))
}

async fn serve(listen: SocketAddr, state: ApiState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {}", listen))?;
    log_system_event(
        None,
        "api.start",
        &format!("listening on {}", listen),
        SystemEventOutcome::Success,
    );
    info!(tables = %state.tables.version, "dimensioning API ready");

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    match result {
        Ok(()) => {
            log_system_event(None, "api.stop", "shutdown complete", SystemEventOutcome::Success);
            Ok(())
        }
        Err(err) => {
            log_system_event(None, "api.stop", &err.to_string(), SystemEventOutcome::Fault);
            Err(err).context("API server failed")
        }
    }
}
