use std::collections::HashSet;

use crate::host::response::parse_search_hits;
use crate::host::{send, HostError, HostRequest, HostSession};
use crate::model::MatchResult;
use crate::signatures::MaskedPattern;

/// First pattern (by catalog position) that produced hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternHit {
    pub index: usize,
    pub first: MatchResult,
    pub total: usize,
}

/// Runs masked searches through the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskedPatternMatcher;

impl MaskedPatternMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Distinct hit addresses for `pattern`, in the order the host printed them.
    pub fn search(
        &self,
        session: &mut dyn HostSession,
        pattern: &MaskedPattern,
    ) -> Result<Vec<MatchResult>, HostError> {
        let body = send(session, &HostRequest::SearchMasked(pattern.host_encoding()))?;
        let mut seen = HashSet::new();
        Ok(parse_search_hits(&body)
            .into_iter()
            .filter(|addr| seen.insert(*addr))
            .map(MatchResult::new)
            .collect())
    }

    /// Search `patterns` in order and stop at the first one with any hit.
    pub fn first_hit(
        &self,
        session: &mut dyn HostSession,
        patterns: &[MaskedPattern],
    ) -> Result<Option<PatternHit>, HostError> {
        for (index, pattern) in patterns.iter().enumerate() {
            let hits = self.search(session, pattern)?;
            log::debug!("pattern #{index} ({} fixed bytes): {} hit(s)", pattern.fixed_bytes(), hits.len());
            if let Some(first) = hits.first() {
                return Ok(Some(PatternHit { index, first: *first, total: hits.len() }));
            }
        }
        Ok(None)
    }
}
