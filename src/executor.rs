use crate::command::{ArgVector, ExitCode, OpenMode, Redirect, Stream};
use crate::stats::{ExecutionKind, SessionStats};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Exit code reported when the program could not be found.
pub const EXIT_NOT_FOUND: ExitCode = 127;
/// Exit code reported when the program exists but could not be started.
pub const EXIT_NOT_EXECUTABLE: ExitCode = 126;

#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Only reachable through a hand-built [`ArgVector`]; `parse_line` never yields an
    /// empty command.
    #[error("no command given")]
    EmptyCommand,
    #[error("cannot open '{path}' for redirection: {source}")]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A program launched as a child process, optionally with one output stream redirected.
pub struct ExternalCommand {
    argv: ArgVector,
    redirect: Option<Redirect>,
}

impl ExternalCommand {
    pub fn new(argv: ArgVector, redirect: Option<Redirect>) -> Self {
        Self { argv, redirect }
    }

    /// Run the command to completion and return its exit code.
    ///
    /// Exactly one counter in `stats` is incremented, before anything else happens, so
    /// the count covers attempts that later fail to open their target or to start.
    /// A program that cannot be started is reported on stderr and yields
    /// [`EXIT_NOT_FOUND`] or [`EXIT_NOT_EXECUTABLE`], as a shell would.
    pub fn execute(self, stats: &SessionStats) -> Result<ExitCode, ExecutionError> {
        let program = self.argv.program().ok_or(ExecutionError::EmptyCommand)?;
        stats.record(ExecutionKind::of(self.redirect.as_ref()));

        let mut cmd = Command::new(program);
        cmd.args(self.argv.args());
        if let Some(redirect) = &self.redirect {
            let target = open_target(redirect)?;
            match redirect.stream {
                Stream::Stdout => cmd.stdout(Stdio::from(target)),
                Stream::Stderr => cmd.stderr(Stdio::from(target)),
            };
        }

        log::debug!("spawning {:?} (redirect: {:?})", self.argv, self.redirect);
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::warn!("spawn of '{}' failed: {}", program, e);
                eprintln!("[ERROR] cannot execute '{}': {}", program, e);
                return Ok(spawn_failure_code(&e));
            }
        };

        let exit_status = child.wait().map_err(|source| ExecutionError::Wait {
            program: program.to_string(),
            source,
        })?;
        let code = status_code(exit_status);
        log::debug!("'{}' finished with status {}", program, code);
        Ok(code)
    }
}

fn open_target(redirect: &Redirect) -> Result<File, ExecutionError> {
    let mut options = OpenOptions::new();
    match redirect.mode {
        OpenMode::Truncate => options.write(true).create(true).truncate(true),
        OpenMode::Append => options.append(true).create(true),
    };
    options
        .open(&redirect.path)
        .map_err(|source| ExecutionError::Redirect {
            path: redirect.path.clone(),
            source,
        })
}

fn spawn_failure_code(error: &io::Error) -> ExitCode {
    match error.kind() {
        io::ErrorKind::NotFound => EXIT_NOT_FOUND,
        _ => EXIT_NOT_EXECUTABLE,
    }
}

/// Offset added to the signal number of a child killed by a signal.
const SIGNAL_EXIT_BASE: ExitCode = 128;

#[cfg(unix)]
fn status_code(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| SIGNAL_EXIT_BASE + signal))
        .unwrap_or(EXIT_NOT_EXECUTABLE)
}

#[cfg(not(unix))]
fn status_code(status: ExitStatus) -> ExitCode {
    status.code().unwrap_or(EXIT_NOT_EXECUTABLE)
}
