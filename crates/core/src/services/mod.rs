//! The signature-resolution pipeline.
//!
//! Every stage takes the host session explicitly; none of them hold on to it.

use thiserror::Error;

use crate::host::HostError;
use crate::model::Architecture;

pub mod arch;
pub mod matcher;
pub mod orchestrator;
pub mod resolver;

pub use arch::{classify, ArchitectureDetector, HostQueryProvider, MetadataProvider};
pub use matcher::{MaskedPatternMatcher, PatternHit};
pub use orchestrator::{Orchestrator, ResolutionReport, SessionSetup};
pub use resolver::FunctionResolver;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),
    #[error("Could not detect the binary's architecture")]
    ArchitectureDetectionFailed,
    #[error("No patterns for architecture: {0}")]
    NoPatternsForArchitecture(Architecture),
    #[error("No signature matched")]
    NoMatchFound,
    #[error("No function contains {0:#x}")]
    FunctionResolutionFailed(u64),
    #[error("Analysis host error: {0}")]
    Host(#[from] HostError),
}
