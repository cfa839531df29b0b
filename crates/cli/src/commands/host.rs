use anyhow::{Context, Result};
use pinpoint_core::host::pipe::{resolve_program, version_string};
use pinpoint_core::host::HostVersion;
use serde::Serialize;

use crate::absolute_path;
use crate::commands::{load_config, select_dialect};

#[derive(Debug, Serialize)]
pub struct HostInfo {
    pub dialect: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

/// Report which analysis host would be used and its version.
pub fn host_info_command(
    host: Option<&str>,
    host_path: Option<&str>,
    config: Option<&str>,
    json: bool,
) -> Result<HostInfo> {
    let config = load_config(config)?;
    let dialect = select_dialect(host, &config)?;
    let explicit = host_path.map(absolute_path).transpose()?.or(config.host.path);
    let program = resolve_program(dialect, explicit.as_deref())
        .with_context(|| format!("Could not find {dialect}. Install it or pass --host-path"))?;

    let banner = match version_string(&program) {
        Ok(b) => Some(b),
        Err(e) => {
            log::warn!("could not query {} version: {e}", program.display());
            None
        }
    };
    let info = HostInfo {
        dialect: dialect.to_string(),
        path: program.display().to_string(),
        version: banner.as_deref().and_then(HostVersion::parse).map(|v| v.to_string()),
        banner: banner.and_then(|b| b.lines().next().map(str::to_string)),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Found {} at {}", info.dialect, info.path);
        println!("  Version: {}", info.version.as_deref().unwrap_or("-"));
    }
    Ok(info)
}
