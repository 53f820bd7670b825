//! A minimal interactive command interpreter.
//!
//! Each input line is split into a program with its arguments and at most one output
//! redirection (`>`, `>>`, `2>`, `2>>`), then run as a child process. Input comes from
//! the terminal, from the terminal with a cap on the number of commands, or from a
//! script file; see [`session::SessionMode`].
//!
//! The shell counts its executions in [`stats::SessionStats`]. A background
//! [`signals::Reporter`] shares those counters and reacts to `SIGINT`, `SIGUSR1` and
//! `SIGUSR2` by terminating, printing a heartbeat, or writing a status report.

pub mod cli;
pub mod command;
pub mod error;
pub mod executor;
pub mod parser;
pub mod session;
pub mod signals;
pub mod stats;

pub use error::ShellError;
pub use session::{Session, SessionEnd, SessionMode};
pub use stats::SessionStats;
