use crate::command::{Redirect, Stream};
use chrono::{DateTime, Local, SecondsFormat};
use std::sync::atomic::{AtomicU64, Ordering};

/// Which counter a single execution is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    Plain,
    StdoutRedirect,
    StderrRedirect,
}

impl ExecutionKind {
    pub fn of(redirect: Option<&Redirect>) -> Self {
        match redirect.map(|r| r.stream) {
            Some(Stream::Stderr) => ExecutionKind::StderrRedirect,
            Some(Stream::Stdout) => ExecutionKind::StdoutRedirect,
            None => ExecutionKind::Plain,
        }
    }
}

/// Counter values observed at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub plain: u64,
    pub stdout_redirects: u64,
    pub stderr_redirects: u64,
}

/// State shared between the session loop and the signal reporter.
///
/// The loop is the only writer of the counters; the reporter reads them at arbitrary
/// times. Each counter is an atomic, so a snapshot never sees a torn value, but the three
/// loads are independent of each other.
#[derive(Debug)]
pub struct SessionStats {
    plain: AtomicU64,
    stdout_redirects: AtomicU64,
    stderr_redirects: AtomicU64,
    launched_at: String,
}

impl SessionStats {
    /// Start a fresh set of counters stamped with the current local time.
    pub fn new() -> Self {
        Self::started_at(Local::now())
    }

    pub fn started_at(when: DateTime<Local>) -> Self {
        Self {
            plain: AtomicU64::new(0),
            stdout_redirects: AtomicU64::new(0),
            stderr_redirects: AtomicU64::new(0),
            launched_at: when.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }

    pub fn record(&self, kind: ExecutionKind) {
        let counter = match kind {
            ExecutionKind::Plain => &self.plain,
            ExecutionKind::StdoutRedirect => &self.stdout_redirects,
            ExecutionKind::StderrRedirect => &self.stderr_redirects,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            plain: self.plain.load(Ordering::Relaxed),
            stdout_redirects: self.stdout_redirects.load(Ordering::Relaxed),
            stderr_redirects: self.stderr_redirects.load(Ordering::Relaxed),
        }
    }

    /// Launch time as printed by the heartbeat, e.g. `2026-10-17T09:30:00+01:00`.
    pub fn launch_time(&self) -> &str {
        &self.launched_at
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::OpenMode;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_kind_follows_redirect_stream() {
        let out = Redirect::new(OpenMode::Truncate, "out.txt", Stream::Stdout);
        let err = Redirect::new(OpenMode::Append, "err.txt", Stream::Stderr);
        assert_eq!(ExecutionKind::of(None), ExecutionKind::Plain);
        assert_eq!(ExecutionKind::of(Some(&out)), ExecutionKind::StdoutRedirect);
        assert_eq!(ExecutionKind::of(Some(&err)), ExecutionKind::StderrRedirect);
    }

    #[test]
    fn test_record_touches_one_counter() {
        let stats = SessionStats::new();
        stats.record(ExecutionKind::Plain);
        stats.record(ExecutionKind::Plain);
        stats.record(ExecutionKind::StderrRedirect);
        assert_eq!(
            stats.snapshot(),
            Snapshot {
                plain: 2,
                stdout_redirects: 0,
                stderr_redirects: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let stats = Arc::new(SessionStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record(ExecutionKind::StdoutRedirect);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.snapshot().stdout_redirects, 4000);
    }

    #[test]
    fn test_launch_time_format() {
        let when = Local.with_ymd_and_hms(2026, 10, 17, 9, 30, 5).unwrap();
        let stats = SessionStats::started_at(when);
        assert!(stats.launch_time().starts_with("2026-10-17T09:30:05"));
        // numeric offset, never "Z"
        let offset = &stats.launch_time()["2026-10-17T09:30:05".len()..];
        assert_eq!(offset.len(), "+01:00".len());
    }
}
