//! pinpoint-core
//!
//! Locates a known function inside a native library by its compiled prologue.
//!
//! The crate detects the binary's architecture through an analysis host
//! (radare2 or rizin), searches the host for curated masked byte signatures,
//! and resolves the first hit to its containing function. All host traffic
//! goes through a [`host::HostSession`], so the pipeline runs unchanged
//! against a live process or a scripted transcript.

pub mod config;
pub mod host;
pub mod model;
pub mod services;
pub mod signatures;

pub use config::PinpointConfig;
pub use host::{HostDialect, HostSession, PipeSession, ScriptedSession};
pub use model::{Architecture, FunctionId, FunctionInfo, MatchResult};
pub use services::{Orchestrator, ResolutionReport, ResolveError};
pub use signatures::{MaskedPattern, SignatureCatalog};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
