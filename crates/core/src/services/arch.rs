use crate::host::response::parse_metadata;
use crate::host::{send, HostError, HostRequest, HostSession, MetadataQuery};
use crate::model::{Architecture, BinaryMetadata};
use crate::services::ResolveError;

/// One way of asking the host what it loaded.
pub trait MetadataProvider {
    fn name(&self) -> &str;
    fn fetch(&self, session: &mut dyn HostSession) -> Result<BinaryMetadata, HostError>;
}

/// Provider backed by a single JSON info command.
#[derive(Debug, Clone, Copy)]
pub struct HostQueryProvider {
    query: MetadataQuery,
}

impl HostQueryProvider {
    pub fn new(query: MetadataQuery) -> Self {
        Self { query }
    }
}

impl MetadataProvider for HostQueryProvider {
    fn name(&self) -> &str {
        self.query.command()
    }

    fn fetch(&self, session: &mut dyn HostSession) -> Result<BinaryMetadata, HostError> {
        let body = send(session, &HostRequest::BinaryInfo(self.query))?;
        parse_metadata(self.query, &body)
    }
}

/// Map host `(isa, bits)` onto a supported architecture.
///
/// radare2 reports 16 bits for ARM objects whose entry point is Thumb code, so
/// 16 is accepted alongside 32 for arm32.
pub fn classify(meta: &BinaryMetadata) -> Result<Architecture, ResolveError> {
    match (meta.isa.to_ascii_lowercase().as_str(), meta.bits) {
        ("arm", 64) => Ok(Architecture::Arm64),
        ("arm", 32) | ("arm", 16) => Ok(Architecture::Arm32),
        ("x86", 64) => Ok(Architecture::X86_64),
        _ => Err(ResolveError::UnsupportedArchitecture(meta.isa.clone())),
    }
}

/// Tries metadata providers in order until one answers.
pub struct ArchitectureDetector {
    providers: Vec<Box<dyn MetadataProvider>>,
}

impl ArchitectureDetector {
    pub fn new(providers: Vec<Box<dyn MetadataProvider>>) -> Self {
        Self { providers }
    }

    /// Providers suited to the session's dialect and version.
    pub fn for_session(session: &dyn HostSession) -> Self {
        let providers = session
            .dialect()
            .metadata_queries(session.version())
            .into_iter()
            .map(|q| Box::new(HostQueryProvider::new(q)) as Box<dyn MetadataProvider>)
            .collect();
        Self::new(providers)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// The first provider that returns well-formed metadata decides; an
    /// unsupported answer is not retried with later providers.
    pub fn detect(&self, session: &mut dyn HostSession) -> Result<Architecture, ResolveError> {
        for provider in &self.providers {
            match provider.fetch(session) {
                Ok(meta) => {
                    log::debug!("{} reported {} / {} bits", provider.name(), meta.isa, meta.bits);
                    return classify(&meta);
                }
                Err(e) => log::debug!("{} failed: {e}", provider.name()),
            }
        }
        Err(ResolveError::ArchitectureDetectionFailed)
    }
}
