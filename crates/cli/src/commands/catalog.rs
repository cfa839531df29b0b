use anyhow::Result;
use pinpoint_core::model::Architecture;
use serde::Serialize;

use crate::commands::{load_catalog, load_config};

#[derive(Debug, Serialize)]
pub struct SignatureInfo {
    pub architecture: Architecture,
    pub label: String,
    pub pattern: String,
    pub encoding: String,
    pub fixed_bytes: usize,
    pub len: usize,
}

/// List catalog signatures in search order.
pub fn list_catalog_command(
    catalog: Option<&str>,
    config: Option<&str>,
    arch: Option<&str>,
    json: bool,
) -> Result<Vec<SignatureInfo>> {
    let config = load_config(config)?;
    let catalog = load_catalog(catalog, &config)?;
    let filter = arch.map(|a| a.parse::<Architecture>().map_err(anyhow::Error::msg)).transpose()?;

    let mut entries = Vec::new();
    for architecture in catalog.architectures().filter(|a| filter.map_or(true, |f| f == *a)) {
        for (index, pattern) in catalog.lookup(architecture)?.iter().enumerate() {
            entries.push(SignatureInfo {
                architecture,
                label: format!("{architecture}#{index}"),
                pattern: pattern.to_string(),
                encoding: pattern.host_encoding(),
                fixed_bytes: pattern.fixed_bytes(),
                len: pattern.len(),
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(entries);
    }

    if entries.is_empty() {
        println!("Signatures: (none)");
        return Ok(entries);
    }
    println!("Signatures ({}):", entries.len());
    for entry in &entries {
        println!(
            "- {} [{}/{} fixed]: {}",
            entry.label, entry.fixed_bytes, entry.len, entry.pattern
        );
    }
    Ok(entries)
}
