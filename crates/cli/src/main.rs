use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::WriteStyle;
use log::LevelFilter;
use pinpoint::commands::{host_info_command, list_catalog_command, resolve_command, ResolveOptions};

/// Locate BoringSSL's certificate verification routine in native libraries.
///
/// This CLI is a thin wrapper around `pinpoint-core` (exposed in code as
/// `pinpoint_core`). Signature search and function resolution run inside a
/// radare2 or rizin session.
#[derive(Parser, Debug)]
#[command(name = "pinpoint", version, about = "Signature-driven function locator", long_about = None)]
struct Cli {
    /// Enables debug logs (host commands included).
    #[arg(long, short, global = true)]
    debug: bool,

    /// Forces colored output.
    #[arg(long, short, global = true)]
    force_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the verification routine and resolve its containing function.
    ///
    /// Exits successfully whether or not the routine is found; the outcome is
    /// in the printed report.
    Resolve {
        /// Path to the native library (e.g. libflutter.so).
        #[arg(long)]
        binary: String,

        /// Analysis host to drive: r2 or rizin.
        #[arg(long)]
        host: Option<String>,

        /// Explicit path to the host executable.
        #[arg(long)]
        host_path: Option<String>,

        /// Run configuration file (.json or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Signature catalog file replacing the built-in one (.json or YAML).
        #[arg(long)]
        catalog: Option<String>,

        /// Automatic analysis depth before searching: aac, aaa or aaaa.
        #[arg(long)]
        analysis: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List signatures in the order they are tried.
    Catalog {
        /// Signature catalog file to list instead of the built-in one.
        #[arg(long)]
        catalog: Option<String>,

        /// Run configuration file (.json or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Only list one architecture (arm64, arm32, x86_64).
        #[arg(long)]
        arch: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show which analysis host would be used.
    HostInfo {
        /// Analysis host: r2 or rizin.
        #[arg(long)]
        host: Option<String>,

        /// Explicit path to the host executable.
        #[arg(long)]
        host_path: Option<String>,

        /// Run configuration file (.json or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Info };
    let write_style = if cli.force_color { WriteStyle::Always } else { WriteStyle::Auto };
    env_logger::builder().filter_level(level).write_style(write_style).init();
    if cli.force_color {
        colored::control::set_override(true);
    }

    match cli.command {
        Command::Resolve { binary, host, host_path, config, catalog, analysis, json } => {
            resolve_command(&ResolveOptions {
                binary,
                host,
                host_path,
                config,
                catalog,
                analysis,
                json,
            })?;
        }
        Command::Catalog { catalog, config, arch, json } => {
            list_catalog_command(catalog.as_deref(), config.as_deref(), arch.as_deref(), json)?;
        }
        Command::HostInfo { host, host_path, config, json } => {
            host_info_command(host.as_deref(), host_path.as_deref(), config.as_deref(), json)?;
        }
    }

    Ok(())
}
