//! Analysis host plumbing.
//!
//! The pipeline never talks to radare2/rizin directly. Stages build typed
//! [`HostRequest`] values, a [`HostDialect`] renders them into command text,
//! and a [`HostSession`] executes that text and hands back raw output. Parsing
//! of raw output lives in [`response`].

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod pipe;
pub mod response;
pub mod scripted;

pub use pipe::PipeSession;
pub use scripted::ScriptedSession;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("Host executable not found: {0}")]
    MissingHost(String),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("host I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("host session closed")]
    Closed,
    #[error("host command '{command}' failed: {message}")]
    Command { command: String, message: String },
    #[error("malformed host response to '{command}': {message}")]
    Malformed { command: String, message: String },
}

/// One stateful, blocking request/response channel to an analysis host.
///
/// Implementations must preserve state between calls: options set and
/// analysis performed by earlier commands stay in effect for later ones.
pub trait HostSession {
    /// Execute one raw command and return everything the host printed for it.
    fn cmd(&mut self, command: &str) -> Result<String, HostError>;

    /// Version of the host program, if it could be determined.
    fn version(&self) -> Option<HostVersion> {
        None
    }

    /// Dialect used to render requests for this session.
    fn dialect(&self) -> HostDialect {
        HostDialect::Radare2
    }
}

impl<S: HostSession + ?Sized> HostSession for Box<S> {
    fn cmd(&mut self, command: &str) -> Result<String, HostError> {
        (**self).cmd(command)
    }

    fn version(&self) -> Option<HostVersion> {
        (**self).version()
    }

    fn dialect(&self) -> HostDialect {
        (**self).dialect()
    }
}

/// Command flavor spoken by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostDialect {
    #[default]
    #[serde(alias = "r2")]
    Radare2,
    #[serde(alias = "rz")]
    Rizin,
}

impl HostDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostDialect::Radare2 => "radare2",
            HostDialect::Rizin => "rizin",
        }
    }

    /// Executable name looked up on `PATH`.
    pub fn program_name(&self) -> &'static str {
        match (self, cfg!(windows)) {
            (HostDialect::Radare2, false) => "r2",
            (HostDialect::Radare2, true) => "radare2.exe",
            (HostDialect::Rizin, false) => "rizin",
            (HostDialect::Rizin, true) => "rizin.exe",
        }
    }

    /// Environment variable that overrides the executable path.
    pub fn env_var(&self) -> &'static str {
        match self {
            HostDialect::Radare2 => "R2_BIN",
            HostDialect::Rizin => "RIZIN_BIN",
        }
    }

    /// Options applied before analysis when the configuration does not name any.
    pub fn default_options(&self) -> Vec<HostOption> {
        let mut options = Vec::new();
        if *self == HostDialect::Radare2 {
            options.push(HostOption::new("log.quiet", "true"));
        }
        options.push(HostOption::new("scr.color", "0"));
        options.push(HostOption::new("search.in", "io.maps.x"));
        options
    }

    /// Metadata queries to try, most preferred first.
    ///
    /// radare2 up to 5.9.5 still served the `bins` listing from `iA`; newer
    /// releases moved it to `ia`.
    pub fn metadata_queries(&self, version: Option<HostVersion>) -> Vec<MetadataQuery> {
        match self {
            HostDialect::Rizin => vec![MetadataQuery::Info, MetadataQuery::ArchList],
            HostDialect::Radare2 => {
                let legacy = version.is_some_and(|v| v <= HostVersion::new(5, 9, 5));
                if legacy {
                    vec![MetadataQuery::ArchList, MetadataQuery::Archives, MetadataQuery::Info]
                } else {
                    vec![MetadataQuery::Archives, MetadataQuery::ArchList, MetadataQuery::Info]
                }
            }
        }
    }

    pub fn render(&self, request: &HostRequest) -> String {
        match request {
            HostRequest::SetOption(opt) => format!("e {}={}", opt.name, opt.value),
            HostRequest::AutoAnalysis(level) => level.command().to_string(),
            HostRequest::BinaryInfo(query) => query.command().to_string(),
            HostRequest::SearchMasked(encoding) => format!("/x {encoding}"),
            HostRequest::FunctionAt(address) => match self {
                HostDialect::Radare2 => format!("afl. @ {address:#x}"),
                HostDialect::Rizin => format!("afi. @ {address:#x}"),
            },
            HostRequest::CreateFunction(address) => format!("af @ {address:#x}"),
        }
    }
}

impl fmt::Display for HostDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r2" | "radare2" => Ok(HostDialect::Radare2),
            "rz" | "rizin" => Ok(HostDialect::Rizin),
            other => Err(format!("unknown host '{other}' (expected r2 or rizin)")),
        }
    }
}

/// `major.minor.patch` of the host program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl HostVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Pull the first dotted version out of `-v` output such as
    /// `radare2 5.9.4 32471 @ linux-x86-64` or `rizin 0.7.3-git @ ...`.
    pub fn parse(text: &str) -> Option<Self> {
        text.split_whitespace().find_map(|token| {
            let core = token.split('-').next()?;
            if !core.contains('.') || !core.starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }
            let mut parts = core.split('.').map(|p| p.parse::<u32>());
            let major = parts.next()?.ok()?;
            let minor = parts.next()?.ok()?;
            let patch = match parts.next() {
                Some(p) => p.ok()?,
                None => 0,
            };
            Some(HostVersion::new(major, minor, patch))
        })
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// `e name=value` host option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOption {
    pub name: String,
    pub value: String,
}

impl HostOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

impl FromStr for HostOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(HostOption::new(name.trim(), value.trim()))
            }
            _ => Err(format!("expected name=value, got '{s}'")),
        }
    }
}

/// Depth of the automatic analysis pass run during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisLevel {
    /// `aac`: analyze function calls only.
    #[serde(rename = "aac")]
    Calls,
    /// `aaa`: full automatic analysis.
    #[default]
    #[serde(rename = "aaa")]
    Full,
    /// `aaaa`: experimental deeper pass.
    #[serde(rename = "aaaa")]
    Deep,
}

impl AnalysisLevel {
    pub fn command(&self) -> &'static str {
        match self {
            AnalysisLevel::Calls => "aac",
            AnalysisLevel::Full => "aaa",
            AnalysisLevel::Deep => "aaaa",
        }
    }
}

impl FromStr for AnalysisLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "aac" | "calls" => Ok(AnalysisLevel::Calls),
            "aaa" | "full" => Ok(AnalysisLevel::Full),
            "aaaa" | "deep" => Ok(AnalysisLevel::Deep),
            other => Err(format!("unknown analysis level '{other}' (expected aac, aaa or aaaa)")),
        }
    }
}

/// Host query that reports the loaded binary's instruction set and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataQuery {
    /// `iaj`: `{"bins":[{"arch":..,"bits":..}]}`.
    Archives,
    /// `iAj`: same shape, older radare2 releases.
    ArchList,
    /// `ij`: `{"bin":{"arch":..,"bits":..}}`.
    Info,
}

impl MetadataQuery {
    pub fn command(&self) -> &'static str {
        match self {
            MetadataQuery::Archives => "iaj",
            MetadataQuery::ArchList => "iAj",
            MetadataQuery::Info => "ij",
        }
    }
}

/// Typed host capability request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    SetOption(HostOption),
    AutoAnalysis(AnalysisLevel),
    BinaryInfo(MetadataQuery),
    /// Masked byte search; payload is the `bytes:mask` hex encoding.
    SearchMasked(String),
    FunctionAt(u64),
    CreateFunction(u64),
}

/// Render `request` for the session's dialect, log it, and run it.
pub fn send<S: HostSession + ?Sized>(
    session: &mut S,
    request: &HostRequest,
) -> Result<String, HostError> {
    let command = session.dialect().render(request);
    log::debug!("host <- {command}");
    let output = session.cmd(&command)?;
    log::trace!("host -> {} bytes", output.len());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_radare2_version_banner() {
        let v = HostVersion::parse("radare2 5.9.4 32471 @ linux-x86-64\ncommit: abc").unwrap();
        assert_eq!(v, HostVersion::new(5, 9, 4));
    }

    #[test]
    fn parses_rizin_version_with_suffix() {
        let v = HostVersion::parse("rizin 0.7.3-git @ linux-x86-64").unwrap();
        assert_eq!(v, HostVersion::new(0, 7, 3));
    }

    #[test]
    fn version_parse_rejects_text_without_numbers() {
        assert!(HostVersion::parse("no version here").is_none());
    }

    #[test]
    fn legacy_radare2_prefers_arch_list_query() {
        let q = HostDialect::Radare2.metadata_queries(Some(HostVersion::new(5, 9, 5)));
        assert_eq!(q[0], MetadataQuery::ArchList);
        let q = HostDialect::Radare2.metadata_queries(Some(HostVersion::new(5, 9, 6)));
        assert_eq!(q[0], MetadataQuery::Archives);
        let q = HostDialect::Radare2.metadata_queries(None);
        assert_eq!(q[0], MetadataQuery::Archives);
    }

    #[test]
    fn dialects_render_function_lookup_differently() {
        let req = HostRequest::FunctionAt(0x4000);
        assert_eq!(HostDialect::Radare2.render(&req), "afl. @ 0x4000");
        assert_eq!(HostDialect::Rizin.render(&req), "afi. @ 0x4000");
        assert_eq!(HostDialect::Rizin.render(&HostRequest::CreateFunction(0x10)), "af @ 0x10");
    }

    #[test]
    fn host_option_parses_name_value() {
        let opt: HostOption = "search.in = io.maps.x".parse().unwrap();
        assert_eq!(opt, HostOption::new("search.in", "io.maps.x"));
        assert!("novalue".parse::<HostOption>().is_err());
    }
}
