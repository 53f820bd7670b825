use std::fmt;
use std::path::PathBuf;

/// Status of a finished command as the session records it.
///
/// The child's own exit code when it exited normally, `128 + n` when signal `n` killed it,
/// 127 when the program was not found and 126 when it could not be started.
pub type ExitCode = i32;

/// Maximum number of tokens (program name included) a single command may carry.
pub const MAX_ARGS: usize = 63;

/// How a redirect target is opened before the child writes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file or cut it to zero length (`>` and `2>`).
    Truncate,
    /// Create the file or write after its current end (`>>` and `2>>`).
    Append,
}

/// Standard stream of the child that a redirect replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Parsed redirection: where one of the child's output streams should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub mode: OpenMode,
    pub path: PathBuf,
    pub stream: Stream,
}

impl Redirect {
    pub fn new(mode: OpenMode, path: impl Into<PathBuf>, stream: Stream) -> Self {
        Self {
            mode,
            path: path.into(),
            stream,
        }
    }

    /// Map a redirect operator token to its open mode and stream.
    ///
    /// Operators are matched in the order `2>>`, `2>`, `>>`, `>`; the match is on the
    /// whole token, so `foo>` is an ordinary argument.
    pub fn operator(token: &str) -> Option<(OpenMode, Stream)> {
        match token {
            "2>>" => Some((OpenMode::Append, Stream::Stderr)),
            "2>" => Some((OpenMode::Truncate, Stream::Stderr)),
            ">>" => Some((OpenMode::Append, Stream::Stdout)),
            ">" => Some((OpenMode::Truncate, Stream::Stdout)),
            _ => None,
        }
    }
}

/// Returned by [`ArgVector::push`] when the vector is already full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded;

/// Program name followed by its arguments, bounded to [`MAX_ARGS`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgVector {
    args: Vec<String>,
}

impl ArgVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, arg: impl Into<String>) -> Result<(), CapacityExceeded> {
        if self.args.len() >= MAX_ARGS {
            return Err(CapacityExceeded);
        }
        self.args.push(arg.into());
        Ok(())
    }

    /// The program to run, or `None` for an empty vector.
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Everything after the program name.
    pub fn args(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }
}

impl TryFrom<Vec<String>> for ArgVector {
    type Error = CapacityExceeded;

    fn try_from(args: Vec<String>) -> Result<Self, Self::Error> {
        if args.len() > MAX_ARGS {
            return Err(CapacityExceeded);
        }
        Ok(Self { args })
    }
}

impl fmt::Display for ArgVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_mapping() {
        assert_eq!(
            Redirect::operator("2>>"),
            Some((OpenMode::Append, Stream::Stderr))
        );
        assert_eq!(
            Redirect::operator("2>"),
            Some((OpenMode::Truncate, Stream::Stderr))
        );
        assert_eq!(
            Redirect::operator(">>"),
            Some((OpenMode::Append, Stream::Stdout))
        );
        assert_eq!(
            Redirect::operator(">"),
            Some((OpenMode::Truncate, Stream::Stdout))
        );
        assert_eq!(Redirect::operator("out>"), None);
        assert_eq!(Redirect::operator("1>"), None);
    }

    #[test]
    fn test_arg_vector_is_bounded() {
        let mut argv = ArgVector::new();
        for i in 0..MAX_ARGS {
            argv.push(i.to_string()).unwrap();
        }
        assert_eq!(argv.len(), MAX_ARGS);
        assert_eq!(argv.push("one-too-many"), Err(CapacityExceeded));
        assert_eq!(argv.len(), MAX_ARGS);
    }

    #[test]
    fn test_program_and_args() {
        let argv = ArgVector::try_from(vec!["ls".to_string(), "-la".to_string()]).unwrap();
        assert_eq!(argv.program(), Some("ls"));
        assert_eq!(argv.args(), &["-la".to_string()]);
        assert_eq!(argv.to_string(), "ls -la");

        let empty = ArgVector::new();
        assert_eq!(empty.program(), None);
        assert!(empty.args().is_empty());
    }
}
