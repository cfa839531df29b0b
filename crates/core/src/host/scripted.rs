use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::host::{HostDialect, HostError, HostSession, HostVersion};

/// Canned host transcript: exact command text mapped to the output it prints.
///
/// Commands without an entry print nothing, like a host command that found
/// nothing. Commands listed in `failures` fail at the transport level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostScript {
    #[serde(default)]
    pub dialect: HostDialect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub responses: BTreeMap<String, String>,
    #[serde(default)]
    pub failures: BTreeSet<String>,
}

/// Host session that replays a [`HostScript`] and records every command it receives.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSession {
    script: HostScript,
    history: Vec<String>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_script(script: HostScript) -> Self {
        Self { script, history: Vec::new() }
    }

    /// Load a JSON transcript from disk.
    pub fn from_path(path: &Path) -> Result<Self, HostError> {
        let body = fs::read_to_string(path)?;
        let script: HostScript =
            serde_json::from_str(&body).map_err(|e| HostError::Malformed {
                command: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::from_script(script))
    }

    pub fn with_dialect(mut self, dialect: HostDialect) -> Self {
        self.script.dialect = dialect;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.script.version = Some(version.into());
        self
    }

    pub fn respond(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.script.responses.insert(command.into(), output.into());
        self
    }

    pub fn fail(mut self, command: impl Into<String>) -> Self {
        self.script.failures.insert(command.into());
        self
    }

    /// Commands received so far, in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn count(&self, command: &str) -> usize {
        self.history.iter().filter(|c| c.as_str() == command).count()
    }

    pub fn received(&self, command: &str) -> bool {
        self.count(command) > 0
    }
}

impl HostSession for ScriptedSession {
    fn cmd(&mut self, command: &str) -> Result<String, HostError> {
        self.history.push(command.to_string());
        if self.script.failures.contains(command) {
            return Err(HostError::Command {
                command: command.to_string(),
                message: "scripted failure".into(),
            });
        }
        Ok(self.script.responses.get(command).cloned().unwrap_or_default())
    }

    fn version(&self) -> Option<HostVersion> {
        self.script.version.as_deref().and_then(HostVersion::parse)
    }

    fn dialect(&self) -> HostDialect {
        self.script.dialect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_responses_and_records_history() {
        let mut session = ScriptedSession::new().respond("ij", "{}").fail("iaj");
        assert_eq!(session.cmd("ij").unwrap(), "{}");
        assert_eq!(session.cmd("aaa").unwrap(), "");
        assert!(session.cmd("iaj").is_err());
        assert_eq!(session.history(), ["ij", "aaa", "iaj"]);
        assert_eq!(session.count("ij"), 1);
    }

    #[test]
    fn loads_transcript_from_json() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("host.json");
        std::fs::write(
            &path,
            r#"{"dialect":"rizin","version":"rizin 0.7.3","responses":{"ij":"{}"},"failures":["iAj"]}"#,
        )
        .unwrap();
        let mut session = ScriptedSession::from_path(&path).unwrap();
        assert_eq!(session.dialect(), HostDialect::Rizin);
        assert_eq!(session.version(), Some(HostVersion::new(0, 7, 3)));
        assert!(session.cmd("iAj").is_err());
    }
}
