use serde::{Deserialize, Serialize};

use crate::host::{send, AnalysisLevel, HostDialect, HostOption, HostRequest, HostSession};
use crate::model::{Architecture, FunctionId};
use crate::services::{
    ArchitectureDetector, FunctionResolver, MaskedPatternMatcher, ResolveError,
};
use crate::signatures::SignatureCatalog;

/// Host preparation performed once before any search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSetup {
    pub options: Vec<HostOption>,
    pub analysis: AnalysisLevel,
}

impl SessionSetup {
    pub fn for_dialect(dialect: HostDialect) -> Self {
        Self { options: dialect.default_options(), analysis: AnalysisLevel::default() }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_id: Option<FunctionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Architecture>,
    /// Catalog label of the pattern that hit, e.g. `arm64#1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub forced_function: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Sequences setup, detection, lookup, search and resolution over one session.
pub struct Orchestrator<S: HostSession> {
    session: S,
    catalog: SignatureCatalog,
    setup: SessionSetup,
    detector: Option<ArchitectureDetector>,
    prepared: bool,
}

impl<S: HostSession> Orchestrator<S> {
    pub fn new(session: S, catalog: SignatureCatalog) -> Self {
        let setup = SessionSetup::for_dialect(session.dialect());
        Self { session, catalog, setup, detector: None, prepared: false }
    }

    pub fn with_setup(mut self, setup: SessionSetup) -> Self {
        self.setup = setup;
        self
    }

    pub fn with_detector(mut self, detector: ArchitectureDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Run the whole pipeline. Failures end up in the report, never as `Err`.
    pub fn run(&mut self) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        match self.locate(&mut report) {
            Ok(()) => {
                if let (Some(addr), Some(id)) = (report.address, report.function_id.as_ref()) {
                    log::info!("ssl_verify_peer_cert found at {addr:#x} in function {id}");
                }
            }
            Err(e) => {
                log::warn!("{e}");
                report.found = false;
                report.address = None;
                report.function_id = None;
                report.forced_function = false;
                report.failure = Some(e.to_string());
            }
        }
        report
    }

    fn prepare(&mut self) -> Result<(), ResolveError> {
        if self.prepared {
            return Ok(());
        }
        for option in &self.setup.options {
            send(&mut self.session, &HostRequest::SetOption(option.clone()))?;
        }
        log::info!("Analyzing function calls...");
        send(&mut self.session, &HostRequest::AutoAnalysis(self.setup.analysis))?;
        self.prepared = true;
        Ok(())
    }

    fn locate(&mut self, report: &mut ResolutionReport) -> Result<(), ResolveError> {
        self.prepare()?;

        let arch = match &self.detector {
            Some(detector) => detector.detect(&mut self.session)?,
            None => ArchitectureDetector::for_session(&self.session).detect(&mut self.session)?,
        };
        report.architecture = Some(arch);
        log::info!("Detected architecture: {arch}");

        let patterns = self.catalog.lookup(arch)?;
        log::info!("Searching for offset...");
        let hit = MaskedPatternMatcher::new()
            .first_hit(&mut self.session, patterns)?
            .ok_or(ResolveError::NoMatchFound)?;
        let address = hit.first.address;
        report.pattern = Some(format!("{arch}#{}", hit.index));
        report.address = Some(address);
        if hit.total > 1 {
            log::warn!("{arch}#{} matched {} places; using {}", hit.index, hit.total, hit.first);
        }

        // A match that cannot be resolved ends the run; later patterns are not tried.
        let info = FunctionResolver::new(arch)
            .resolve(&mut self.session, address)?
            .ok_or(ResolveError::FunctionResolutionFailed(address))?;
        report.found = true;
        report.forced_function = info.forced;
        report.function_id = Some(info.id);
        Ok(())
    }
}
