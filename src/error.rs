use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end the shell.
///
/// Problems with a single command line are not here; they live in
/// [`crate::parser::ParsingError`] and [`crate::executor::ExecutionError`] and are
/// reported without stopping the session.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("argument --max is incompatible with argument --file")]
    ConflictingModes,
    #[error("invalid value '{0}' for -m/--max: must be a positive integer")]
    InvalidMax(i64),
    #[error("cannot open file {}: {source}", .path.display())]
    ScriptOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("can't create '{}': {source}", .path.display())]
    SignalFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("can't create '{}': {source}", .path.display())]
    StatusReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to install signal handlers: {0}")]
    SignalInstall(#[source] io::Error),
    #[error("input read error: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
