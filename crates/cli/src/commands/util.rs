use std::path::Path;

use anyhow::{Context, Result};
use pinpoint_core::host::{HostDialect, HostSession, PipeSession, ScriptedSession};
use pinpoint_core::{PinpointConfig, SignatureCatalog};

use crate::{absolute_path, FAKE_HOST_ENV};

/// Load the run configuration, or defaults when no file is given.
pub fn load_config(path: Option<&str>) -> Result<PinpointConfig> {
    match path {
        Some(p) => {
            let abs = absolute_path(p)?;
            PinpointConfig::from_path(&abs)
                .with_context(|| format!("Failed to load config at {}", abs.display()))
        }
        None => Ok(PinpointConfig::default()),
    }
}

/// Catalog from `--catalog`, else from the config, else the built-in one.
pub fn load_catalog(flag: Option<&str>, config: &PinpointConfig) -> Result<SignatureCatalog> {
    match flag {
        Some(p) => {
            let abs = absolute_path(p)?;
            SignatureCatalog::from_path(&abs)
                .with_context(|| format!("Failed to load signature catalog at {}", abs.display()))
        }
        None => config.load_catalog().context("Failed to load signature catalog"),
    }
}

/// Pick the host dialect: `--host` flag first, then config.
pub fn select_dialect(flag: Option<&str>, config: &PinpointConfig) -> Result<HostDialect> {
    match flag {
        Some(name) => name.parse::<HostDialect>().map_err(anyhow::Error::msg),
        None => Ok(config.host.dialect),
    }
}

/// Open a host session on `binary`.
///
/// When `PINPOINT_FAKE_HOST` is set, the named transcript is replayed instead,
/// which lets the CLI be exercised without radare2 or rizin installed.
pub fn open_session(
    dialect: HostDialect,
    host_path: Option<&Path>,
    binary: &Path,
) -> Result<Box<dyn HostSession>> {
    if let Some(script) = std::env::var_os(FAKE_HOST_ENV) {
        let session = ScriptedSession::from_path(Path::new(&script)).with_context(|| {
            format!("Failed to read {FAKE_HOST_ENV} transcript {}", Path::new(&script).display())
        })?;
        log::debug!("replaying host transcript from {}", Path::new(&script).display());
        return Ok(Box::new(session));
    }
    let program = pinpoint_core::host::pipe::resolve_program(dialect, host_path)
        .with_context(|| format!("Could not find {dialect}. Install it or pass --host-path"))?;
    let session = PipeSession::spawn(&program, dialect, binary)
        .with_context(|| format!("Failed to start {} on {}", program.display(), binary.display()))?;
    Ok(Box::new(session))
}
