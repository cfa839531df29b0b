//! Masked byte signatures.
//!
//! A signature is written the way reversers trade them: space-separated byte
//! tokens of two characters, each a hex digit or `.` for "any nibble". The
//! arm64 prologue `F. 0F 1C F8` therefore matches `stp x29, x30, [sp, #-0x10]!`
//! regardless of which callee-saved register pair the compiler picked.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Architecture;

pub mod catalog;

pub use catalog::SignatureCatalog;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid pattern token '{token}' at position {position}")]
    InvalidToken { token: String, position: usize },
    #[error("pattern is empty")]
    EmptyPattern,
    #[error("catalog lists no patterns for {0}")]
    EmptyList(Architecture),
    #[error("unknown architecture '{0}' in catalog")]
    UnknownArchitecture(String),
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// One byte matcher: `byte & mask == value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternToken {
    value: u8,
    mask: u8,
}

impl PatternToken {
    pub const ANY: PatternToken = PatternToken { value: 0, mask: 0 };

    pub const fn exact(value: u8) -> Self {
        Self { value, mask: 0xFF }
    }

    /// Bits outside `mask` are cleared from `value`.
    pub const fn masked(value: u8, mask: u8) -> Self {
        Self { value: value & mask, mask }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn is_exact(&self) -> bool {
        self.mask == 0xFF
    }

    pub fn matches(&self, byte: u8) -> bool {
        byte & self.mask == self.value
    }

    fn parse(token: &str, position: usize) -> Result<Self, SignatureError> {
        let invalid = || SignatureError::InvalidToken { token: token.to_string(), position };
        let mut chars = token.chars();
        let (hi, lo) = match (chars.next(), chars.next(), chars.next()) {
            (Some(hi), Some(lo), None) => (hi, lo),
            _ => return Err(invalid()),
        };
        let (hi_val, hi_mask) = parse_nibble(hi).ok_or_else(invalid)?;
        let (lo_val, lo_mask) = parse_nibble(lo).ok_or_else(invalid)?;
        Ok(Self::masked((hi_val << 4) | lo_val, (hi_mask << 4) | lo_mask))
    }
}

fn parse_nibble(c: char) -> Option<(u8, u8)> {
    match c {
        '.' | '?' => Some((0, 0)),
        _ => c.to_digit(16).map(|d| (d as u8, 0x0F)),
    }
}

impl fmt::Display for PatternToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nibble = |value: u8, fixed: bool| {
            if fixed {
                char::from_digit(value as u32, 16).map(|c| c.to_ascii_uppercase()).unwrap_or('.')
            } else {
                '.'
            }
        };
        write!(
            f,
            "{}{}",
            nibble(self.value >> 4, self.mask & 0xF0 == 0xF0),
            nibble(self.value & 0x0F, self.mask & 0x0F == 0x0F)
        )
    }
}

/// Ordered, nonempty sequence of [`PatternToken`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaskedPattern {
    tokens: Vec<PatternToken>,
}

impl MaskedPattern {
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        let tokens = text
            .split_whitespace()
            .enumerate()
            .map(|(i, tok)| PatternToken::parse(tok, i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_tokens(tokens)
    }

    pub fn from_tokens(tokens: Vec<PatternToken>) -> Result<Self, SignatureError> {
        if tokens.is_empty() {
            return Err(SignatureError::EmptyPattern);
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Number of fully fixed bytes; a rough specificity measure for logs.
    pub fn fixed_bytes(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_exact()).count()
    }

    /// Whether the pattern matches `haystack` starting at `offset`.
    pub fn matches_at(&self, haystack: &[u8], offset: usize) -> bool {
        haystack
            .get(offset..)
            .filter(|rest| rest.len() >= self.tokens.len())
            .is_some_and(|rest| self.tokens.iter().zip(rest).all(|(t, &b)| t.matches(b)))
    }

    /// All match positions in `haystack`, reported as `base + offset`.
    pub fn scan(&self, haystack: &[u8], base: u64) -> Vec<u64> {
        if haystack.len() < self.tokens.len() {
            return Vec::new();
        }
        (0..=haystack.len() - self.tokens.len())
            .filter(|&offset| self.matches_at(haystack, offset))
            .map(|offset| base + offset as u64)
            .collect()
    }

    /// `bytes:mask` hex form accepted by the hosts' `/x` search.
    pub fn host_encoding(&self) -> String {
        let mut bytes = String::with_capacity(self.tokens.len() * 2);
        let mut mask = String::with_capacity(self.tokens.len() * 2);
        for t in &self.tokens {
            bytes.push_str(&format!("{:02x}", t.value));
            mask.push_str(&format!("{:02x}", t.mask));
        }
        format!("{bytes}:{mask}")
    }
}

impl fmt::Display for MaskedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl FromStr for MaskedPattern {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MaskedPattern {
    type Error = SignatureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MaskedPattern> for String {
    fn from(pattern: MaskedPattern) -> Self {
        pattern.to_string()
    }
}
