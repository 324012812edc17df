//! ---
//! lvd_section: "05-networking-external-interfaces"
//! lvd_subsection: "binary"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Control CLI for dimensioning low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use r_lvd_calc_engine::{io::load_table_repository, TableRepository};
use r_lvd_common::{init_tracing, AppConfig, VersionInfo};
use r_lvd_logging as logging;
use tracing::{debug, warn};

mod dimension;
mod serve;
mod vocab;

const CONFIG_CANDIDATES: &[&str] = &["r-lvd.toml", "configs/r-lvd.toml"];

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "R-LVD low-voltage circuit dimensioning utility",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print extended version information and exit"
    )]
    version: bool,
    /// Configuration file (defaults to R_LVD_CONFIG, then ./r-lvd.toml, then ./configs/r-lvd.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dimension every circuit of a schedule and export reports.
    Dimension(dimension::DimensionArgs),
    /// Print the calculation memorial of a single circuit.
    Explain(dimension::ExplainArgs),
    /// List the accepted option codes and standard values.
    Vocab(vocab::VocabArgs),
    /// Serve the dimensioning REST API.
    Serve(serve::ServeArgs),
}

/// Configuration and normative data shared by every subcommand.
pub struct Session {
    pub config: AppConfig,
    pub tables: Cow<'static, TableRepository>,
}

impl Session {
    fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let (config, source) = match explicit {
            Some(path) => (AppConfig::from_path(&path)?, Some(path)),
            None => {
                let loaded = AppConfig::load_with_source(CONFIG_CANDIDATES)?;
                (loaded.config, loaded.source)
            }
        };

        if let Err(err) = init_tracing("r-lvdctl", &config.logging) {
            logging::init();
            warn!("file logging unavailable, falling back to stderr: {err:#}");
        }
        match &source {
            Some(path) => debug!("configuration loaded from {}", path.display()),
            None => debug!("no configuration file found, using defaults"),
        }

        let tables = match &config.engine.tables {
            Some(path) => Cow::Owned(load_table_repository(path).with_context(|| {
                format!("failed to load table repository {}", path.display())
            })?),
            None => Cow::Borrowed(TableRepository::builtin()),
        };
        Ok(Self { config, tables })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let session = Session::load(cli.config)?;
    if cli.version {
        println!("{}", VersionInfo::current().extended(&session.tables.version));
        return Ok(());
    }
    match cli.command {
        Some(Commands::Dimension(args)) => dimension::run(&session, args)?,
        Some(Commands::Explain(args)) => dimension::explain(&session, args)?,
        Some(Commands::Vocab(args)) => vocab::run(&session, args)?,
        Some(Commands::Serve(args)) => serve::run(session, args)?,
        None => {
            println!("{}", VersionInfo::current().extended(&session.tables.version));
            println!("run `r-lvdctl --help` for usage");
        }
    }
    Ok(())
}
