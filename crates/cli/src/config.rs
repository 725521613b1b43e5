//! Config file resolution: `--config`, else the per-user config file when it
//! exists, else built-in defaults.

use std::path::{Path, PathBuf};

use framefix_recon::{FramefixConfig, ReconError};

use crate::CliError;

/// `<config dir>/framefix/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("framefix").join("config.toml"))
}

pub fn load(explicit: Option<&Path>) -> Result<FramefixConfig, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match user_config_path().filter(|p| p.is_file()) {
            Some(path) => path,
            None => {
                log::debug!("no config file, using defaults");
                return Ok(FramefixConfig::default());
            }
        },
    };

    let text = std::fs::read_to_string(&path).map_err(|e| ReconError::UnreadableFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let config = FramefixConfig::from_toml(&text)
        .map_err(|e| CliError::from(e).with_hint(format!("in {}", path.display())))?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}
