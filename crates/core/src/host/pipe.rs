use std::env;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::host::{HostDialect, HostError, HostSession, HostVersion};

/// Live radare2/rizin process driven over stdin/stdout.
///
/// The host is started with `-q0`: it prints a NUL byte once the binary is
/// loaded and another after the output of every command it reads from stdin.
pub struct PipeSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    dialect: HostDialect,
    version: Option<HostVersion>,
    program: PathBuf,
}

impl PipeSession {
    pub fn spawn(program: &Path, dialect: HostDialect, binary: &Path) -> Result<Self, HostError> {
        if !binary.is_file() {
            return Err(HostError::MissingBinary(binary.to_path_buf()));
        }
        let version = version_string(program).ok().as_deref().and_then(HostVersion::parse);

        let mut child = Command::new(program)
            .args(["-2", "-q0"])
            .arg(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| HostError::Spawn {
                program: program.display().to_string(),
                source,
            })?;
        let stdin = child.stdin.take().ok_or(HostError::Closed)?;
        let stdout = child.stdout.take().ok_or(HostError::Closed)?;

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            dialect,
            version,
            program: program.to_path_buf(),
        };
        // Banner emitted once the file is opened.
        session.read_reply()?;
        log::debug!(
            "spawned {} ({}) on {}",
            session.program.display(),
            session.version.map(|v| v.to_string()).unwrap_or_else(|| "unknown version".into()),
            binary.display()
        );
        Ok(session)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn read_reply(&mut self) -> Result<String, HostError> {
        let mut buf = Vec::new();
        let n = self.stdout.read_until(0, &mut buf)?;
        if n == 0 {
            return Err(HostError::Closed);
        }
        if buf.last() == Some(&0) {
            buf.pop();
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl HostSession for PipeSession {
    fn cmd(&mut self, command: &str) -> Result<String, HostError> {
        if command.contains('\n') {
            return Err(HostError::Command {
                command: command.to_string(),
                message: "embedded newline".into(),
            });
        }
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        self.read_reply()
    }

    fn version(&self) -> Option<HostVersion> {
        self.version
    }

    fn dialect(&self) -> HostDialect {
        self.dialect
    }
}

impl Drop for PipeSession {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "q!");
        let _ = self.stdin.flush();
        if self.child.wait().is_err() {
            let _ = self.child.kill();
        }
    }
}

/// Locate the host executable: explicit path, then the dialect's environment
/// variable (`R2_BIN` / `RIZIN_BIN`), then `PATH`.
pub fn resolve_program(dialect: HostDialect, explicit: Option<&Path>) -> Result<PathBuf, HostError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(HostError::MissingHost(path.display().to_string()))
        };
    }
    if let Some(path) = env::var_os(dialect.env_var()).map(PathBuf::from) {
        return Ok(path);
    }
    find_in_path(dialect.program_name())
        .ok_or_else(|| HostError::MissingHost(dialect.program_name().to_string()))
}

fn find_in_path(executable: &str) -> Option<PathBuf> {
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths).map(|p| p.join(executable)).find(|candidate| candidate.is_file())
    })
}

/// Output of `<host> -v`, trimmed.
pub fn version_string(program: &Path) -> Result<String, HostError> {
    let output = Command::new(program).arg("-v").output().map_err(|source| HostError::Spawn {
        program: program.display().to_string(),
        source,
    })?;
    if !output.status.success() {
        return Err(HostError::Command {
            command: format!("{} -v", program.display()),
            message: format!("exited with {}", output.status),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        Err(HostError::Command {
            command: format!("{} -v", program.display()),
            message: "produced no output".into(),
        })
    } else {
        Ok(stdout)
    }
}
