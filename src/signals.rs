//! Out-of-band reporting driven by process signals.
//!
//! | Signal    | Action                                               |
//! |-----------|------------------------------------------------------|
//! | `SIGINT`  | print a notice and exit with status 1                |
//! | `SIGUSR1` | print the launch time and a fresh prompt             |
//! | `SIGUSR2` | write the execution counters to a timestamped file   |
//!
//! Signals are not handled in interrupt context. `signal-hook` forwards them to a
//! dedicated thread, which is the only place these actions run; it shares nothing with
//! the session loop except [`SessionStats`].

use crate::error::ShellError;
use crate::session::PROMPT;
use crate::stats::{SessionStats, Snapshot};
use chrono::{DateTime, Local};
use signal_hook::consts::signal::{SIGINT, SIGUSR1, SIGUSR2};
use signal_hook::iterator::{Handle, Signals};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// File written by `--signalfile`.
pub const SIGNAL_FILE_NAME: &str = "signals.txt";

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Directory that receives the status reports.
    pub report_dir: PathBuf,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("."),
        }
    }
}

/// Background thread reacting to `SIGINT`, `SIGUSR1` and `SIGUSR2`.
///
/// Dropping the reporter stops the thread and waits for it.
pub struct Reporter {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Reporter {
    pub fn spawn(stats: Arc<SessionStats>, config: ReporterConfig) -> Result<Self, ShellError> {
        Self::spawn_with_output(stats, config, io::stdout())
    }

    /// Like [`Reporter::spawn`], but heartbeats are written to `out`.
    pub fn spawn_with_output<W>(
        stats: Arc<SessionStats>,
        config: ReporterConfig,
        mut out: W,
    ) -> Result<Self, ShellError>
    where
        W: Write + Send + 'static,
    {
        let mut signals =
            Signals::new([SIGINT, SIGUSR1, SIGUSR2]).map_err(ShellError::SignalInstall)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("signal-reporter".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    handle_signal(signal, &stats, &config, &mut out);
                }
            })
            .map_err(ShellError::SignalInstall)?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn handle_signal<W: Write>(
    signal: i32,
    stats: &SessionStats,
    config: &ReporterConfig,
    out: &mut W,
) {
    log::debug!("received signal {}", signal);
    match signal {
        SIGINT => {
            announce_termination(signal);
            process::exit(1);
        }
        SIGUSR1 => {
            if let Err(e) = write_heartbeat(out, stats.launch_time()) {
                log::warn!("heartbeat failed: {}", e);
            }
        }
        SIGUSR2 => {
            let path = status_report_path(&config.report_dir, Local::now());
            match write_status_report(&path, stats.snapshot()) {
                Ok(()) => log::info!("status report written to {}", path.display()),
                Err(e) => {
                    log::error!("{}", e);
                    eprintln!("\nCan't create '{}'!", path.display());
                    process::exit(1);
                }
            }
        }
        other => log::debug!("ignoring signal {}", other),
    }
}

/// Notice printed when the shell is told to terminate.
pub fn announce_termination(signal: i32) {
    println!("\nSignal SIGINT received from: {} - terminating.", signal);
}

/// Print the launch time followed by a new prompt, flushing immediately.
pub fn write_heartbeat<W: Write>(out: &mut W, launch_time: &str) -> io::Result<()> {
    write!(out, "\n{}\n{}", launch_time, PROMPT)?;
    out.flush()
}

/// Report path for a snapshot taken at `now`, e.g.
/// `nanoShell_status_2026.10.17_09h30.05.txt`.
pub fn status_report_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    dir.join(now.format("nanoShell_status_%Y.%m.%d_%Hh%M.%S.txt").to_string())
}

pub fn write_status_report(path: &Path, snapshot: Snapshot) -> Result<(), ShellError> {
    let write = || -> io::Result<()> {
        let mut file = File::create(path)?;
        write!(
            file,
            "\n{} executions of applications\n\
             {} executions with STDOUT redir\n\
             {} execution with STDERR redir\n",
            snapshot.plain, snapshot.stdout_redirects, snapshot.stderr_redirects
        )?;
        file.flush()
    };
    write().map_err(|source| ShellError::StatusReport {
        path: path.to_path_buf(),
        source,
    })
}

/// Record `pid` once per signal so an external controller knows what to send where.
pub fn write_signal_file(path: &Path, pid: u32) -> Result<(), ShellError> {
    let write = || -> io::Result<()> {
        let mut file = File::create(path)?;
        for name in ["SIGINT", "SIGUSR1", "SIGUSR2"] {
            writeln!(file, "Kill - {} {}", name, pid)?;
        }
        file.flush()
    };
    write().map_err(|source| ShellError::SignalFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ExecutionKind;
    use chrono::TimeZone;
    use std::fs;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_heartbeat_prints_launch_time_then_prompt() {
        let mut out = Vec::new();
        write_heartbeat(&mut out, "2026-10-17T09:30:05+01:00").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n2026-10-17T09:30:05+01:00\nnanoShell$ "
        );
    }

    #[test]
    fn test_status_report_name() {
        let now = Local.with_ymd_and_hms(2026, 10, 17, 9, 30, 5).unwrap();
        let path = status_report_path(Path::new("reports"), now);
        assert_eq!(
            path,
            Path::new("reports").join("nanoShell_status_2026.10.17_09h30.05.txt")
        );
    }

    #[test]
    fn test_status_report_lists_counters_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        let snapshot = Snapshot {
            plain: 4,
            stdout_redirects: 2,
            stderr_redirects: 1,
        };
        write_status_report(&path, snapshot).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "\n4 executions of applications\n\
             2 executions with STDOUT redir\n\
             1 execution with STDERR redir\n"
        );
    }

    #[test]
    fn test_status_report_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("status.txt");
        let err = write_status_report(&path, Snapshot::default()).unwrap_err();
        assert!(matches!(err, ShellError::StatusReport { .. }));
    }

    #[test]
    fn test_signal_file_names_pid_per_signal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SIGNAL_FILE_NAME);
        write_signal_file(&path, 4242).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Kill - SIGINT 4242\nKill - SIGUSR1 4242\nKill - SIGUSR2 4242\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_snapshot_signal_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let stats = Arc::new(SessionStats::new());
        stats.record(ExecutionKind::Plain);
        stats.record(ExecutionKind::Plain);
        stats.record(ExecutionKind::StdoutRedirect);

        let reporter = Reporter::spawn(
            Arc::clone(&stats),
            ReporterConfig {
                report_dir: dir.path().to_path_buf(),
            },
        )
        .unwrap();
        signal_hook::low_level::raise(SIGUSR2).unwrap();

        let expected = "\n2 executions of applications\n\
                        1 executions with STDOUT redir\n\
                        0 execution with STDERR redir\n";
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut found = None;
        while found.is_none() && Instant::now() < deadline {
            for entry in fs::read_dir(dir.path()).unwrap() {
                let path = entry.unwrap().path();
                let contents = fs::read_to_string(&path).unwrap_or_default();
                if contents == expected {
                    found = Some(path);
                }
            }
            thread::sleep(Duration::from_millis(20));
        }
        drop(reporter);

        let path = found.expect("status report was not written");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("nanoShell_status_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    #[cfg(unix)]
    fn test_heartbeat_signal_prints_launch_time() {
        let dir = tempfile::tempdir().unwrap();
        let stats = Arc::new(SessionStats::new());
        let expected = format!("\n{}\n{}", stats.launch_time(), PROMPT);
        let out = SharedBuf::default();

        let reporter = Reporter::spawn_with_output(
            Arc::clone(&stats),
            ReporterConfig {
                report_dir: dir.path().to_path_buf(),
            },
            out.clone(),
        )
        .unwrap();
        signal_hook::low_level::raise(SIGUSR1).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !out.contents().contains(&expected) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        drop(reporter);

        assert!(
            out.contents().starts_with(&expected),
            "unexpected heartbeat output: {:?}",
            out.contents()
        );
    }
}
