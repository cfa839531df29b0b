use anyhow::{anyhow, Result};
use chrono::Utc;
use colored::Colorize;
use pinpoint_core::host::{AnalysisLevel, HostSession};
use pinpoint_core::services::{Orchestrator, ResolutionReport};
use serde::Serialize;

use crate::commands::{load_catalog, load_config, open_session, select_dialect};
use crate::{absolute_path, sha256_file};

/// Inputs to `pinpoint resolve`, independent of the argument parser.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub binary: String,
    pub host: Option<String>,
    pub host_path: Option<String>,
    pub config: Option<String>,
    pub catalog: Option<String>,
    pub analysis: Option<String>,
    pub json: bool,
}

/// Report plus run metadata, as printed by `--json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRecord {
    pub binary: String,
    pub binary_sha256: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_version: Option<String>,
    pub started_at: String,
    pub finished_at: String,
    #[serde(flatten)]
    pub report: ResolutionReport,
}

/// Locate the certificate-verification routine in a binary.
///
/// A miss is not an error: the record comes back with `found: false` and the
/// reason. Only unusable inputs (missing binary, bad config or catalog, host
/// not startable) return `Err`.
pub fn resolve_command(opts: &ResolveOptions) -> Result<ResolveRecord> {
    let binary = absolute_path(&opts.binary)?;
    if !binary.is_file() {
        return Err(anyhow!("Binary file does not exist: {}", binary.display()));
    }

    let config = load_config(opts.config.as_deref())?;
    let dialect = select_dialect(opts.host.as_deref(), &config)?;
    let catalog = load_catalog(opts.catalog.as_deref(), &config)?;
    let mut setup = config.session_setup();
    if dialect != config.host.dialect && config.options.is_empty() {
        setup.options = dialect.default_options();
    }
    if let Some(level) = opts.analysis.as_deref() {
        setup.analysis = level.parse::<AnalysisLevel>().map_err(anyhow::Error::msg)?;
    }
    let host_path = opts.host_path.as_deref().map(absolute_path).transpose()?.or(config.host.path);

    let binary_sha256 = sha256_file(&binary)?;
    let started_at = Utc::now().to_rfc3339();
    let session = open_session(dialect, host_path.as_deref(), &binary)?;
    let host_version = session.version().map(|v| v.to_string());
    let host = session.dialect().to_string();

    let mut orchestrator = Orchestrator::new(session, catalog).with_setup(setup);
    let report = orchestrator.run();
    let finished_at = Utc::now().to_rfc3339();

    let record = ResolveRecord {
        binary: binary.display().to_string(),
        binary_sha256,
        host,
        host_version,
        started_at,
        finished_at,
        report,
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_report(&record.report);
    }
    Ok(record)
}

fn print_report(report: &ResolutionReport) {
    let arch = report.architecture.map(|a| a.to_string()).unwrap_or_else(|| "unknown".into());
    match (report.found, report.address, report.function_id.as_ref()) {
        (true, Some(address), Some(function)) => {
            println!(
                "{} {}",
                "ssl_verify_peer_cert found at:".green(),
                format!("{address:#x}").blue()
            );
            println!("  Function: {function}");
            println!("  Architecture: {arch}");
            if let Some(pattern) = &report.pattern {
                println!("  Pattern: {pattern}");
            }
            if report.forced_function {
                println!("  {}", "(function defined at the match by pinpoint)".yellow());
            }
        }
        _ => {
            println!("{}", "ssl_verify_peer_cert not found.".red());
            println!("  Architecture: {arch}");
            if let Some(reason) = &report.failure {
                println!("  Reason: {}", reason.yellow());
            }
        }
    }
}
