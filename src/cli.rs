use crate::error::ShellError;
use crate::session::SessionMode;
use crate::signals::ReporterConfig;
use argh::FromArgs;
use std::num::NonZeroU32;
use std::path::PathBuf;

#[derive(FromArgs, Debug)]
/// A minimal command interpreter with signal-driven status reports.
///
/// Send SIGUSR1 to print the launch time and SIGUSR2 to write the execution counters
/// to a timestamped file.
pub struct Args {
    /// stop after this many commands; cannot be combined with --file
    #[argh(option, short = 'm')]
    pub max: Option<i64>,

    /// run the commands of this script file instead of reading the terminal
    #[argh(option, short = 'f')]
    pub file: Option<PathBuf>,

    /// write signals.txt with this process id at startup
    #[argh(switch, short = 's')]
    pub signalfile: bool,

    /// directory that receives status reports (default: current directory)
    #[argh(option, default = "PathBuf::from(\".\")")]
    pub report_dir: PathBuf,
}

/// Validated startup settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: SessionMode,
    pub signal_file: bool,
    pub reporter: ReporterConfig,
}

impl Args {
    pub fn into_config(self) -> Result<Config, ShellError> {
        let mode = match (self.max, self.file) {
            (Some(_), Some(_)) => return Err(ShellError::ConflictingModes),
            (Some(max), None) => {
                let max = u32::try_from(max)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or(ShellError::InvalidMax(max))?;
                SessionMode::Bounded(max)
            }
            (None, Some(path)) => SessionMode::Script(path),
            (None, None) => SessionMode::Interactive,
        };
        Ok(Config {
            mode,
            signal_file: self.signalfile,
            reporter: ReporterConfig {
                report_dir: self.report_dir,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ShellError> {
        Args::from_args(&["nanoshell"], args)
            .expect("arguments should parse")
            .into_config()
    }

    #[test]
    fn test_defaults_to_interactive() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.mode, SessionMode::Interactive);
        assert!(!config.signal_file);
        assert_eq!(config.reporter.report_dir, PathBuf::from("."));
    }

    #[test]
    fn test_bounded_mode() {
        let config = parse(&["-m", "3"]).unwrap();
        assert_eq!(config.mode, SessionMode::Bounded(NonZeroU32::new(3).unwrap()));
    }

    #[test]
    fn test_script_mode_with_signal_file() {
        let config = parse(&["--file", "cmds.txt", "-s", "--report-dir", "/tmp"]).unwrap();
        assert_eq!(config.mode, SessionMode::Script(PathBuf::from("cmds.txt")));
        assert!(config.signal_file);
        assert_eq!(config.reporter.report_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_max_and_file_conflict() {
        let err = parse(&["-m", "2", "-f", "cmds.txt"]).unwrap_err();
        assert!(matches!(err, ShellError::ConflictingModes));
    }

    #[test]
    fn test_non_positive_max() {
        assert!(matches!(
            parse(&["-m", "0"]).unwrap_err(),
            ShellError::InvalidMax(0)
        ));
        let negative = Args {
            max: Some(-4),
            file: None,
            signalfile: false,
            report_dir: PathBuf::from("."),
        };
        assert!(matches!(
            negative.into_config().unwrap_err(),
            ShellError::InvalidMax(-4)
        ));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Args::from_args(&["nanoshell"], &["--verbose"]).is_err());
    }
}
