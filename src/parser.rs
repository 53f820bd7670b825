//! Turns one input line into a command and an optional redirection.
//!
//! The grammar is deliberately tiny:
//!
//! ```text
//! <program> [arg]* [ (">" | ">>" | "2>" | "2>>") <path> ]
//! ```
//!
//! There is no quoting or expansion. Lines containing any of `" ' * ? |` are
//! rejected outright, and the literal line `bye` ends the session.

use crate::command::{ArgVector, MAX_ARGS, Redirect};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Keyword that ends a session.
pub const EXIT_KEYWORD: &str = "bye";

/// Longest line, in bytes, the parser accepts.
pub const MAX_LINE_LEN: usize = 1000;

static UNSUPPORTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'*?|]"#).expect("unsupported-character pattern is valid"));

/// Outcome of parsing a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// The line was the exit keyword.
    Exit,
    /// The line contains characters this shell does not support. Holds the line as typed.
    Rejected(String),
    /// Nothing but spaces.
    Blank,
    /// A command to execute.
    Command {
        argv: ArgVector,
        redirect: Option<Redirect>,
    },
}

/// Errors that make a single line unusable. None of them are fatal for the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("command line is longer than {} bytes", MAX_LINE_LEN)]
    LineTooLong,
    #[error("too many arguments (at most {} allowed)", MAX_ARGS)]
    TooManyArguments,
    #[error("missing file name after '{0}'")]
    MissingRedirectTarget(String),
}

/// Strip a single trailing line terminator, if any.
pub fn strip_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Parse one line of input.
///
/// The keyword and the unsupported-character checks look at the whole line before it
/// is tokenized. Once a redirect operator and its target are found, scanning stops and
/// whatever follows the target is dropped.
pub fn parse_line(line: &str) -> Result<ParsedLine, ParsingError> {
    let line = strip_newline(line);

    if line == EXIT_KEYWORD {
        return Ok(ParsedLine::Exit);
    }
    if UNSUPPORTED.is_match(line) {
        return Ok(ParsedLine::Rejected(line.to_string()));
    }
    if line.len() > MAX_LINE_LEN {
        return Err(ParsingError::LineTooLong);
    }

    let mut tokens = line.split(' ').filter(|token| !token.is_empty());
    let Some(program) = tokens.next() else {
        return Ok(ParsedLine::Blank);
    };

    let mut argv = ArgVector::new();
    argv.push(program).map_err(|_| ParsingError::TooManyArguments)?;

    let mut redirect = None;
    while let Some(token) = tokens.next() {
        if let Some((mode, stream)) = Redirect::operator(token) {
            let target = tokens
                .next()
                .ok_or_else(|| ParsingError::MissingRedirectTarget(token.to_string()))?;
            redirect = Some(Redirect::new(mode, target, stream));

            let dropped: Vec<&str> = tokens.by_ref().collect();
            if !dropped.is_empty() {
                log::debug!("ignoring tokens after redirect target: {:?}", dropped);
            }
            break;
        }
        argv.push(token).map_err(|_| ParsingError::TooManyArguments)?;
    }

    Ok(ParsedLine::Command { argv, redirect })
}
