use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "guia_core=info,guia_tui=info,reqwest=warn,hyper=warn";

pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("guia-ffm").join("logs"))
}

/// Log to a daily file; the terminal belongs to the TUI.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
/// `RUST_LOG` overrides the default filter.
pub fn init() -> Result<WorkerGuard> {
    let dir = log_dir()?;
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, "guia.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
