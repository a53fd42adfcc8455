use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver};

use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod config;
mod config_io;
mod controller;
mod engine;
mod events;
mod history;
mod markdown;
mod openai;
mod prompt;
mod prompts;
mod runner;
mod session;
mod theme;
mod tui;
mod ui;

use config::ConfigStore;
use controller::{EXIT_FAILURE, Effect, SessionController};
use engine::EventSender;
use events::{SessionEvent, drain_events_limited, next_terminal_event};
use openai::OpenAiEngineFactory;
use session::{LaunchInput, PromptMode};
use theme::{THEME_FILE_NAME, Theme};
use tui::Tui;

const MAX_WORKER_EVENTS_PER_LOOP: usize = 128;
const LOG_DIR_NAME: &str = "log";
const LOG_FILE_NAME: &str = "termpal.log";

/// Ask for shell commands or chat with an AI assistant from the terminal.
///
/// Without INPUT (and without piped stdin) an interactive session starts.
#[derive(Debug, Parser)]
#[command(name = "termpal", version)]
struct Cli {
    /// Generate a shell command (exec mode).
    #[arg(short = 'e', long = "exec", conflicts_with = "chat")]
    exec: bool,

    /// Chat with the assistant (chat mode).
    #[arg(short = 'c', long = "chat")]
    chat: bool,

    /// Log at info level instead of warn.
    #[arg(long)]
    debug: bool,

    /// Initial query; runs once and exits.
    #[arg(value_name = "INPUT", trailing_var_arg = true)]
    input: Vec<String>,
}

impl Cli {
    fn prompt_mode(&self) -> PromptMode {
        if self.exec {
            PromptMode::Exec
        } else if self.chat {
            PromptMode::Chat
        } else {
            PromptMode::Default
        }
    }

    fn joined_input(&self) -> String {
        self.input.join(" ").trim().to_string()
    }
}

fn main() -> io::Result<ExitCode> {
    let cli = Cli::parse();
    let app_dir = match config_io::app_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("termpal: cannot locate home directory: {err}");
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };
    let _log_guard = match init_logging(&app_dir, cli.debug) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("termpal: logging disabled: {err}");
            None
        }
    };

    let pipe = read_piped_stdin()?;
    let launch = LaunchInput::new(cli.prompt_mode(), cli.joined_input(), pipe);
    info!(run_mode = ?launch.run_mode, prompt_mode = ?launch.prompt_mode, "starting");
    let store = match ConfigStore::from_home() {
        Ok(store) => store,
        Err(err) => {
            eprintln!("termpal: {err}");
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };
    let theme = Theme::load_or_default(app_dir.join(THEME_FILE_NAME));

    let code = run_app(launch, store, theme)?;
    info!(code, "exiting");
    Ok(ExitCode::from(code))
}

fn init_logging(app_dir: &Path, debug: bool) -> io::Result<WorkerGuard> {
    let log_path = app_dir.join(LOG_DIR_NAME).join(LOG_FILE_NAME);
    let log_file = config_io::open_private_append(&log_path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let default_filter = if debug { "termpal=info" } else { "termpal=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_filter(env_filter);
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}

/// Piped stdin becomes context for every request. Keyboard input still
/// works because the terminal is read through the controlling tty.
fn read_piped_stdin() -> io::Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut pipe = String::new();
    stdin.read_to_string(&mut pipe)?;
    Ok(pipe)
}

fn run_app(launch: LaunchInput, store: ConfigStore, theme: Theme) -> io::Result<u8> {
    let (event_tx, event_rx) = mpsc::channel();
    let mut controller = SessionController::new(
        launch,
        store,
        Box::new(OpenAiEngineFactory),
        event_tx.clone(),
    );
    let mut tui = Tui::init(theme)?;
    let result = drive(&mut controller, &mut tui, &event_tx, &event_rx);
    let restored = tui.restore();
    let code = result?;
    restored?;
    Ok(code)
}

fn drive(
    controller: &mut SessionController,
    tui: &mut Tui,
    event_tx: &EventSender,
    event_rx: &Receiver<SessionEvent>,
) -> io::Result<u8> {
    if let Some(code) = apply_effects(controller.start(), tui, event_tx)? {
        return Ok(code);
    }
    loop {
        tui.draw(controller.view())?;

        if let Some(event) = next_terminal_event()? {
            if let Some(code) = apply_effects(controller.handle(event), tui, event_tx)? {
                return Ok(code);
            }
        }

        for event in drain_events_limited(event_rx, MAX_WORKER_EVENTS_PER_LOOP) {
            if let Some(code) = apply_effects(controller.handle(event), tui, event_tx)? {
                return Ok(code);
            }
            tui.draw(controller.view())?;
        }
    }
}

/// Applies effects in order and returns the exit code once one asks to quit.
fn apply_effects(
    effects: Vec<Effect>,
    tui: &mut Tui,
    event_tx: &EventSender,
) -> io::Result<Option<u8>> {
    for effect in effects {
        match effect {
            Effect::Print(printable) => tui.print(&printable)?,
            Effect::ClearScreen => tui.clear_screen()?,
            Effect::Run(request) => {
                let output = tui.suspend(|| runner::run(&request))?;
                let _ = event_tx.send(SessionEvent::RunFinished(output));
            }
            Effect::Quit(code) => return Ok(Some(code)),
        }
    }
    Ok(None)
}
