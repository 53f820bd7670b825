use crate::error::ShellError;
use crate::executor::ExternalCommand;
use crate::parser::{self, ParsedLine};
use crate::stats::SessionStats;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Text shown before every interactive read.
pub const PROMPT: &str = "nanoShell$ ";

/// How the session decides when to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// Read from the terminal until `bye` or end of input.
    Interactive,
    /// Like [`SessionMode::Interactive`], but stop after this many commands.
    Bounded(NonZeroU32),
    /// Run the commands of a script file.
    Script(PathBuf),
}

/// Whether the loop should keep going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

/// Why a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Bye,
    Eof,
    CeilingReached,
    /// The line editor caught Ctrl-C.
    Interrupted,
}

/// Result of asking a [`LineReader`] for input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line, without its terminator.
    Line(String),
    Eof,
    Interrupted,
}

/// Source of interactive input.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome>;
}

/// Terminal input through `rustyline`, with in-memory history.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self, ShellError> {
        let editor = DefaultEditor::new().map_err(|e| ShellError::Read(io::Error::other(e)))?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(err) => Err(io::Error::other(err)),
        }
    }
}

/// Plain buffered input: writes the prompt to `prompt_out`, then reads one line.
///
/// Used when standard input is not a terminal.
pub struct PromptReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> PromptReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineReader for PromptReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        write!(self.prompt_out, "{}", prompt)?;
        self.prompt_out.flush()?;
        match read_lossy_line(&mut self.input)? {
            Some(line) => Ok(ReadOutcome::Line(line)),
            None => Ok(ReadOutcome::Eof),
        }
    }
}

/// Read one line as bytes and decode it, replacing invalid UTF-8 with U+FFFD.
///
/// Returns `None` at end of input. The line terminator is stripped.
fn read_lossy_line<B: BufRead>(input: &mut B) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(parser::strip_newline(&line).to_string()))
}

/// The read–parse–execute loop.
///
/// Notices go to `out`; child processes inherit the real standard streams.
pub struct Session<W: Write> {
    stats: Arc<SessionStats>,
    out: W,
    last_status: Option<i32>,
}

impl Session<io::Stdout> {
    pub fn with_stdout(stats: Arc<SessionStats>) -> Self {
        Self::new(stats, io::stdout())
    }
}

impl<W: Write> Session<W> {
    pub fn new(stats: Arc<SessionStats>, out: W) -> Self {
        Self {
            stats,
            out,
            last_status: None,
        }
    }

    /// Exit code of the most recently executed command.
    pub fn last_status(&self) -> Option<i32> {
        self.last_status
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the session in `mode`, reading interactive input from `reader`.
    pub fn run<R: LineReader>(
        &mut self,
        mode: &SessionMode,
        reader: &mut R,
    ) -> Result<SessionEnd, ShellError> {
        match mode {
            SessionMode::Interactive => self.run_interactive(reader, None),
            SessionMode::Bounded(max) => self.run_interactive(reader, Some(*max)),
            SessionMode::Script(path) => self.run_script(path),
        }
    }

    /// Prompt and execute until `bye`, end of input, or `limit` commands.
    ///
    /// Empty lines re-prompt without counting against `limit`.
    pub fn run_interactive<R: LineReader>(
        &mut self,
        reader: &mut R,
        limit: Option<NonZeroU32>,
    ) -> Result<SessionEnd, ShellError> {
        let mut remaining = limit.map(NonZeroU32::get);
        loop {
            if remaining == Some(0) {
                writeln!(
                    self.out,
                    "[INFO] max command number reached. Terminating nanoShell"
                )?;
                return Ok(SessionEnd::CeilingReached);
            }

            let line = match reader.read_line(PROMPT).map_err(ShellError::Read)? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Eof => return Ok(SessionEnd::Eof),
                ReadOutcome::Interrupted => return Ok(SessionEnd::Interrupted),
            };
            if line.is_empty() {
                continue;
            }

            if let Some(count) = remaining.as_mut() {
                *count -= 1;
            }
            if self.step(&line)? == Step::Stop {
                return Ok(SessionEnd::Bye);
            }
        }
    }

    pub fn run_script(&mut self, path: &Path) -> Result<SessionEnd, ShellError> {
        let file = File::open(path).map_err(|source| ShellError::ScriptOpen {
            path: path.to_path_buf(),
            source,
        })?;
        self.run_script_from(BufReader::new(file))
    }

    /// Execute every non-comment line of `script`, tracing each one with its index.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than ending the script.
    pub fn run_script_from<B: BufRead>(&mut self, mut script: B) -> Result<SessionEnd, ShellError> {
        let mut index = 1;
        while let Some(line) = read_lossy_line(&mut script).map_err(ShellError::Read)? {
            if line.starts_with('#') {
                continue;
            }
            writeln!(self.out, "[command #{}]: {}", index, line)?;
            index += 1;
            if self.step(&line)? == Step::Stop {
                return Ok(SessionEnd::Bye);
            }
        }
        Ok(SessionEnd::Eof)
    }

    /// Parse and execute a single line.
    ///
    /// Per-command problems are reported on the session output and never stop the loop;
    /// only `bye` does.
    pub fn step(&mut self, line: &str) -> Result<Step, ShellError> {
        let (argv, redirect) = match parser::parse_line(line) {
            Ok(ParsedLine::Exit) => {
                writeln!(
                    self.out,
                    "\n[INFO] bye command detected. Terminating nanoShell"
                )?;
                return Ok(Step::Stop);
            }
            Ok(ParsedLine::Rejected(line)) => {
                writeln!(self.out, "\n[ERROR] Wrong request '{}'", line)?;
                return Ok(Step::Continue);
            }
            Ok(ParsedLine::Blank) => return Ok(Step::Continue),
            Ok(ParsedLine::Command { argv, redirect }) => (argv, redirect),
            Err(e) => {
                writeln!(self.out, "[ERROR] {}", e)?;
                return Ok(Step::Continue);
            }
        };

        self.out.flush()?;
        match ExternalCommand::new(argv, redirect).execute(&self.stats) {
            Ok(code) => self.last_status = Some(code),
            Err(e) => {
                log::debug!("execution failed: {:?}", e);
                writeln!(self.out, "[ERROR] {}", e)?;
            }
        }
        Ok(Step::Continue)
    }
}
