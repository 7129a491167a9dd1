//! oxsel entrypoint: a headless driver for the selection engine.
//!
//! Opens one file, runs a command script against it and prints the cursor
//! set. Commands come from `--script`, then each `-c`, or from stdin when
//! neither is given and stdin is not a terminal.
use anyhow::{Context, Result};
use clap::Parser;
use core_actions::{Action, CommandParser, ParsedCommand, dispatch};
use core_state::{Session, Settings};
use core_text::Buffer;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Instant;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod fixture;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxsel", version, about = "Selection engine script driver")]
struct Args {
    /// File to open (UTF-8 text).
    pub path: PathBuf,
    /// Configuration file path (overrides discovery of `oxsel.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// File with one command per line.
    #[arg(long = "script")]
    pub script: Option<PathBuf>,
    /// Command to run after the script; repeatable.
    #[arg(short = 'c', long = "command")]
    pub commands: Vec<String>,
    /// TOML file of canned language-server locations.
    #[arg(long = "lsp-fixture")]
    pub lsp_fixture: Option<PathBuf>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("oxsel.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "oxsel.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn load_session(args: &Args) -> Result<Session> {
    let config = core_config::load_from(args.config.clone())?;
    let settings = Settings::from_config(&config);
    let buffer = Buffer::from_path(&args.path)?;
    info!(
        target: "runtime.startup",
        buffer = buffer.name(),
        bytes = buffer.len_bytes(),
        config = config.source.as_ref().map(|p| p.display().to_string()).as_deref(),
        "session_opened"
    );
    let mut session = Session::new(buffer, settings);
    if let Some(path) = args.lsp_fixture.as_deref() {
        session.set_lsp_client(Box::new(fixture::load(path)?));
    }
    Ok(session)
}

fn script_lines(args: &Args) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    if let Some(path) = args.script.as_ref() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        lines.extend(content.lines().map(str::to_string));
    }
    lines.extend(args.commands.iter().cloned());
    if args.script.is_none() && args.commands.is_empty() && !std::io::stdin().is_terminal() {
        for line in std::io::stdin().lock().lines() {
            lines.push(line?);
        }
    }
    Ok(lines)
}

/// Counters reported at shutdown.
#[derive(Debug, Default, PartialEq, Eq)]
struct ScriptReport {
    commands: usize,
    unknown: usize,
}

/// One line per cursor: primary marker, index, extent and the selected text.
fn print_cursors<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let primary = session.cursors().primary_id();
    for (idx, cursor) in session.cursors().iter().enumerate() {
        let range = cursor.selection.range();
        let marker = if cursor.id == primary { '*' } else { ' ' };
        let text = session.buffer().slice_bytes(range.start, range.end);
        write!(out, "{marker}{idx} {}..{} {text:?}", range.start, range.end)?;
        if let Some(info) = cursor.selection.info.as_ref() {
            match (info.title.as_deref(), info.message.as_deref()) {
                (Some(title), Some(message)) => write!(out, " [{title}: {message}]")?,
                (Some(note), None) | (None, Some(note)) => write!(out, " [{note}]")?,
                (None, None) => {}
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn run_script<W: Write>(session: &mut Session, lines: &[String], out: &mut W) -> Result<ScriptReport> {
    let mut report = ScriptReport::default();
    let mut printed_last = false;
    for line in lines {
        let parsed = CommandParser::parse(line);
        if parsed == ParsedCommand::Empty {
            continue;
        }
        report.commands += 1;
        printed_last = false;
        match parsed {
            ParsedCommand::Empty => {}
            ParsedCommand::Print => {
                print_cursors(session, out)?;
                printed_last = true;
            }
            ParsedCommand::Open(path) => match session.open_path(&path) {
                Ok(id) => {
                    let result = dispatch(Action::SwitchBuffer(id), session)?;
                    if let Some(status) = result.status {
                        writeln!(out, "status: {status}")?;
                    }
                }
                Err(e) => {
                    warn!(target: "runtime", path = %path.display(), error = %e, "open_failed");
                    writeln!(out, "status: cannot open {}: {e}", path.display())?;
                }
            },
            ParsedCommand::Unknown(raw) => {
                report.unknown += 1;
                warn!(target: "runtime", "unknown_command");
                writeln!(out, "error: unknown command `{raw}`")?;
            }
            ParsedCommand::Action(action) => {
                let result = dispatch(action, session)?;
                if let Some(status) = result.status {
                    writeln!(out, "status: {status}")?;
                }
            }
        }
        for outcome in session.poll_queries(Instant::now())? {
            if let Some(notice) = outcome.notice {
                writeln!(out, "status: {notice}")?;
            }
        }
    }
    if !printed_last {
        print_cursors(session, out)?;
    }
    Ok(report)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let mut session = load_session(&args)?;
    let lines = script_lines(&args)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = run_script(&mut session, &lines, &mut out)?;
    out.flush()?;
    info!(
        target: "runtime",
        commands = report.commands,
        unknown = report.unknown,
        mode = session.mode().kind.name(),
        "shutdown"
    );
    Ok(())
}
