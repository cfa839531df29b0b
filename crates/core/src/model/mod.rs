//! Core data model shared by the detector, matcher, and resolver.
//!
//! These types carry no behavior beyond formatting; the pipeline stages in
//! `services` produce and consume them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Logical architecture tag used to select a signature list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "arm32")]
    Arm32,
    #[serde(rename = "x86_64")]
    X86_64,
}

impl Architecture {
    pub const ALL: [Architecture; 3] = [Architecture::Arm64, Architecture::Arm32, Architecture::X86_64];

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Arm64 => "arm64",
            Architecture::Arm32 => "arm32",
            Architecture::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    /// Accepts the tag strings plus the short names used by older catalogs
    /// (`arm` for 32-bit ARM, `x86` for x86_64).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "arm32" | "arm" | "armv7" => Ok(Architecture::Arm32),
            "x86_64" | "x86-64" | "x86" | "amd64" => Ok(Architecture::X86_64),
            other => Err(format!("unknown architecture tag '{other}'")),
        }
    }
}

/// Instruction-set name and bit width as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMetadata {
    pub isa: String,
    pub bits: u32,
}

impl BinaryMetadata {
    pub fn new(isa: impl Into<String>, bits: u32) -> Self {
        Self { isa: isa.into(), bits }
    }
}

/// Absolute virtual address where a pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchResult {
    pub address: u64,
}

impl MatchResult {
    pub fn new(address: u64) -> Self {
        Self { address }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.address)
    }
}

/// Identifier of a resolved function: either its start address or a host symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionId {
    Address(u64),
    Symbol(String),
}

impl FunctionId {
    /// Interpret a host token. `0x`-prefixed hex becomes an address, anything else a symbol.
    pub fn from_token(token: &str) -> Self {
        match token.strip_prefix("0x").and_then(|hex| u64::from_str_radix(hex, 16).ok()) {
            Some(address) => FunctionId::Address(address),
            None => FunctionId::Symbol(token.to_string()),
        }
    }

    pub fn address(&self) -> Option<u64> {
        match self {
            FunctionId::Address(a) => Some(*a),
            FunctionId::Symbol(_) => None,
        }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionId::Address(a) => write!(f, "{a:#x}"),
            FunctionId::Symbol(s) => f.write_str(s),
        }
    }
}

impl Serialize for FunctionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Function containing a matched address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub id: FunctionId,
    /// True when the host had no function there and one was created at the match.
    pub forced: bool,
}

impl FunctionInfo {
    pub fn discovered(id: FunctionId) -> Self {
        Self { id, forced: false }
    }

    pub fn forced_at(address: u64) -> Self {
        Self { id: FunctionId::Address(address), forced: true }
    }
}
