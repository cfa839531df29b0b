use crate::host::response::parse_function_listing;
use crate::host::{send, HostError, HostRequest, HostSession};
use crate::model::{Architecture, FunctionInfo};

/// Maps a matched address to the function that contains it.
#[derive(Debug, Clone, Copy)]
pub struct FunctionResolver {
    arch: Architecture,
}

impl FunctionResolver {
    pub fn new(arch: Architecture) -> Self {
        Self { arch }
    }

    /// x86_64 code is analyzed less reliably by the hosts, so a miss there is
    /// answered by defining a function at the match itself.
    pub fn forces_creation(&self) -> bool {
        self.arch == Architecture::X86_64
    }

    pub fn resolve(
        &self,
        session: &mut dyn HostSession,
        address: u64,
    ) -> Result<Option<FunctionInfo>, HostError> {
        let body = send(session, &HostRequest::FunctionAt(address))?;
        if let Some(id) = parse_function_listing(&body) {
            return Ok(Some(FunctionInfo::discovered(id)));
        }
        if !self.forces_creation() {
            log::debug!("no function at {address:#x} and {} does not force creation", self.arch);
            return Ok(None);
        }
        log::info!("No function at {address:#x}; defining one there");
        send(session, &HostRequest::CreateFunction(address))?;
        Ok(Some(FunctionInfo::forced_at(address)))
    }
}
