//! File logging. The terminal belongs to the UI, so log output is piped into
//! a file instead of stderr.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Start logging into `path`, appending. `RUST_LOG` overrides `default_level`.
pub fn init(path: &Path, default_level: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("Could not open log file {}: {}", path.display(), e))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| eyre!("Logger already initialized: {}", e))?;

    log::info!("lscan {} started", env!("CARGO_PKG_VERSION"));
    Ok(path.to_path_buf())
}
