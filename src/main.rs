use anyhow::Result;
use nanoshell::cli::{Args, Config};
use nanoshell::session::{EditorReader, PromptReader, Session, SessionEnd, SessionMode};
use nanoshell::signals::{self, Reporter, SIGNAL_FILE_NAME};
use nanoshell::SessionStats;
use signal_hook::consts::signal::SIGINT;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    env_logger::init();

    let args: Args = argh::from_env();
    match run(args) {
        Ok(SessionEnd::Interrupted) => {
            signals::announce_termination(SIGINT);
            ExitCode::FAILURE
        }
        Ok(end) => {
            log::debug!("session finished: {:?}", end);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<SessionEnd> {
    let Config {
        mode,
        signal_file,
        reporter,
    } = args.into_config()?;
    let stats = Arc::new(SessionStats::new());

    if signal_file {
        signals::write_signal_file(Path::new(SIGNAL_FILE_NAME), std::process::id())?;
        println!("[INFO] created file '{}'", SIGNAL_FILE_NAME);
    }

    let _reporter = Reporter::spawn(Arc::clone(&stats), reporter)?;
    let mut session = Session::with_stdout(stats);
    let end = match &mode {
        SessionMode::Script(path) => session.run_script(path)?,
        _ if io::stdin().is_terminal() => session.run(&mode, &mut EditorReader::new()?)?,
        _ => session.run(&mode, &mut PromptReader::new(io::stdin().lock(), io::stdout()))?,
    };
    Ok(end)
}
