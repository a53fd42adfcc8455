use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigStore};
use crate::engine::{ChatChunk, Engine, EngineError, EngineFactory, EventSender, ExecOutput};
use crate::events::{KeyAction, SessionEvent};
use crate::history::InputHistory;
use crate::prompt::Prompt;
use crate::runner::{RunKind, RunOutput, RunRequest};
use crate::session::{LaunchInput, Phase, PromptMode, Session};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INTERRUPTED: u8 = 130;

/// Something to put in the terminal scrollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Printable {
    /// The submitted prompt line.
    Echo(String),
    /// Markdown answer text.
    Content(String),
    /// A generated command awaiting confirmation.
    Command { command: String, explanation: String },
    Help,
    Success(String),
    Warning(String),
    Error(String),
}

/// Work the terminal driver performs on the controller's behalf, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Print(Printable),
    ClearScreen,
    Run(RunRequest),
    Quit(u8),
}

/// What the live viewport shows right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View<'a> {
    Error(&'a str),
    Configuring(&'a Prompt),
    Prompt(&'a Prompt),
    Streaming(&'a str),
    Spinner(u64),
    Blank,
}

pub struct SessionController {
    session: Session,
    history: InputHistory,
    prompt: Prompt,
    store: ConfigStore,
    config: Option<Config>,
    engine: Option<Box<dyn Engine>>,
    factory: Box<dyn EngineFactory>,
    events: EventSender,
    ticks: u64,
}

impl SessionController {
    pub fn new(
        input: LaunchInput,
        store: ConfigStore,
        factory: Box<dyn EngineFactory>,
        events: EventSender,
    ) -> Self {
        let prompt = Prompt::new(input.prompt_mode);
        Self {
            session: Session::new(input),
            history: InputHistory::new(),
            prompt,
            store,
            config: None,
            engine: None,
            factory,
            events,
            ticks: 0,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    #[cfg(test)]
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    #[cfg(test)]
    pub fn engine(&self) -> Option<&dyn Engine> {
        self.engine.as_deref()
    }

    /// Loads the config and either starts the session or asks for an API key.
    pub fn start(&mut self) -> Vec<Effect> {
        match self.store.load() {
            Ok(config) => self.begin(config, false),
            Err(err) if err.is_not_found() => {
                info!(path = %self.store.path().display(), "no configuration, starting bootstrap");
                self.prompt = Prompt::new(PromptMode::Config);
                self.set_phase(Phase::Configuring);
                Vec::new()
            }
            Err(err) => self.fatal(err.to_string()),
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        if self.session.last_error.is_some() {
            return Vec::new();
        }
        match event {
            SessionEvent::Key(KeyAction::Quit) => {
                info!(phase = self.session.phase.as_str(), "interrupted");
                let code = if self.session.is_cli() {
                    EXIT_INTERRUPTED
                } else {
                    EXIT_OK
                };
                vec![Effect::Quit(code)]
            }
            SessionEvent::Key(action) => self.handle_key(action),
            SessionEvent::Resize { width, height } => {
                debug!(width, height, "terminal resized");
                Vec::new()
            }
            SessionEvent::Tick => {
                self.ticks = self.ticks.wrapping_add(1);
                Vec::new()
            }
            SessionEvent::Exec(output) => {
                if !self.expect_phase(Phase::Querying, "exec output") {
                    return Vec::new();
                }
                self.on_exec_output(output)
            }
            SessionEvent::ChatChunk(chunk) => {
                if !self.expect_phase(Phase::Querying, "chat chunk") {
                    return Vec::new();
                }
                self.on_chat_chunk(chunk)
            }
            SessionEvent::EngineFailed(err) => {
                if !self.expect_phase(Phase::Querying, "engine error") {
                    return Vec::new();
                }
                self.on_engine_error(err)
            }
            SessionEvent::RunFinished(output) => {
                if !self.expect_phase(Phase::Executing, "run output") {
                    return Vec::new();
                }
                self.on_run_finished(output)
            }
        }
    }

    pub fn view(&self) -> View<'_> {
        if let Some(err) = self.session.last_error.as_deref() {
            return View::Error(err);
        }
        match self.session.phase {
            Phase::Configuring => View::Configuring(&self.prompt),
            Phase::Idle => View::Prompt(&self.prompt),
            Phase::Querying if self.session.prompt_mode == PromptMode::Chat => {
                View::Streaming(&self.session.output_buffer)
            }
            Phase::Querying => View::Spinner(self.ticks),
            Phase::Confirming | Phase::Executing => View::Blank,
        }
    }

    fn handle_key(&mut self, action: KeyAction) -> Vec<Effect> {
        match self.session.phase {
            Phase::Configuring => self.handle_configuring_key(action),
            Phase::Idle => self.handle_idle_key(action),
            Phase::Confirming => self.handle_confirming_key(action),
            Phase::Querying | Phase::Executing => {
                if action == KeyAction::ClearScreen && !self.session.phase.is_busy() {
                    return vec![Effect::ClearScreen];
                }
                Vec::new()
            }
        }
    }

    fn handle_configuring_key(&mut self, action: KeyAction) -> Vec<Effect> {
        match action {
            KeyAction::Enter => self.finish_config(),
            KeyAction::ClearScreen => vec![Effect::ClearScreen],
            KeyAction::Reset => self.reset_session(),
            other => {
                self.edit_prompt(other);
                Vec::new()
            }
        }
    }

    fn handle_idle_key(&mut self, action: KeyAction) -> Vec<Effect> {
        match action {
            KeyAction::Enter => self.submit(),
            KeyAction::Tab => {
                self.toggle_mode();
                Vec::new()
            }
            KeyAction::Up => {
                if let Some(entry) = self.history.previous() {
                    self.prompt.set_value(&entry);
                }
                Vec::new()
            }
            KeyAction::Down => {
                if let Some(entry) = self.history.next() {
                    self.prompt.set_value(&entry);
                }
                Vec::new()
            }
            KeyAction::Help => vec![Effect::Print(Printable::Help)],
            KeyAction::ClearScreen => vec![Effect::ClearScreen],
            KeyAction::Reset => self.reset_session(),
            KeyAction::Settings => self.edit_settings(),
            other => {
                self.edit_prompt(other);
                Vec::new()
            }
        }
    }

    fn reset_session(&mut self) -> Vec<Effect> {
        info!(phase = self.session.phase.as_str(), "session reset");
        self.history.reset();
        if let Some(engine) = self.engine.as_mut() {
            engine.reset();
        }
        self.prompt.clear();
        vec![Effect::ClearScreen]
    }

    fn handle_confirming_key(&mut self, action: KeyAction) -> Vec<Effect> {
        match action {
            KeyAction::Enter
            | KeyAction::Tab
            | KeyAction::Up
            | KeyAction::Down
            | KeyAction::Help
            | KeyAction::ClearScreen
            | KeyAction::Reset
            | KeyAction::Settings
            | KeyAction::Quit => Vec::new(),
            KeyAction::Char(c) if c.eq_ignore_ascii_case(&'y') => self.confirm(),
            _ => self.cancel(),
        }
    }

    fn edit_prompt(&mut self, action: KeyAction) {
        match action {
            KeyAction::Char(c) => self.prompt.input_char(c),
            KeyAction::Backspace => self.prompt.backspace(),
            KeyAction::Left => self.prompt.move_cursor_left(),
            KeyAction::Right => self.prompt.move_cursor_right(),
            _ => return,
        }
        self.prompt.focus();
    }

    fn finish_config(&mut self) -> Vec<Effect> {
        let key = self.prompt.value().trim().to_string();
        if key.is_empty() {
            return Vec::new();
        }
        match self.store.write_api_key(&key) {
            Ok(config) => {
                info!(path = %self.store.path().display(), "configuration written");
                self.begin(config, true)
            }
            Err(err) => self.fatal(err.to_string()),
        }
    }

    /// Builds the engine for `config` and continues with whatever the launch
    /// asked for: the help screen in a REPL or the initial query in a CLI run.
    fn begin(&mut self, config: Config, announce: bool) -> Vec<Effect> {
        if self.session.prompt_mode == PromptMode::Default {
            self.session.prompt_mode = PromptMode::from_config_value(&config.user.default_prompt_mode);
        }
        if let Err(err) = self.install_engine(&config) {
            return self.fatal(err.to_string());
        }
        self.config = Some(config);
        self.prompt = Prompt::new(self.session.prompt_mode);
        self.session.pending_command = None;
        self.session.output_buffer.clear();

        let mut effects = Vec::new();
        if self.session.is_cli() {
            if announce {
                effects.push(success("[settings ok]"));
            }
            let query = self.session.args_input().to_string();
            effects.extend(self.dispatch(&query));
        } else {
            effects.push(Effect::ClearScreen);
            if announce {
                effects.push(success("[settings ok]"));
            }
            effects.push(Effect::Print(Printable::Help));
            self.set_phase(Phase::Idle);
        }
        effects
    }

    fn install_engine(&mut self, config: &Config) -> Result<(), EngineError> {
        let mode = self.session.prompt_mode.engine_mode();
        let mut engine = self.factory.build(mode, config)?;
        let pipe = self.session.pipe_input();
        if !pipe.trim().is_empty() {
            engine.set_pipe(pipe);
        }
        info!(?mode, "engine ready");
        self.engine = Some(engine);
        Ok(())
    }

    fn submit(&mut self) -> Vec<Effect> {
        let input = self.prompt.value().to_string();
        if input.trim().is_empty() {
            return Vec::new();
        }
        let echo = self.prompt.as_echo();
        self.history.add(input.clone());
        self.prompt.clear();
        let mut effects = vec![Effect::Print(Printable::Echo(echo))];
        effects.extend(self.dispatch(&input));
        effects
    }

    fn dispatch(&mut self, input: &str) -> Vec<Effect> {
        let Some(engine) = self.engine.as_mut() else {
            return self.fatal("engine is not initialised".to_string());
        };
        self.session.output_buffer.clear();
        self.session.pending_command = None;
        self.prompt.blur();
        if self.session.prompt_mode == PromptMode::Chat {
            engine.start_chat_stream(input);
            engine.await_chat_chunk(self.events.clone());
        } else {
            engine.request_exec(input, self.events.clone());
        }
        self.set_phase(Phase::Querying);
        Vec::new()
    }

    fn toggle_mode(&mut self) {
        let mode = self.session.prompt_mode.toggled();
        self.session.prompt_mode = mode;
        self.prompt.set_mode(mode);
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.set_mode(mode.engine_mode());
        engine.reset();
        info!(?mode, engine_mode = ?engine.mode(), "prompt mode toggled");
    }

    fn edit_settings(&mut self) -> Vec<Effect> {
        let Some(config) = self.config.as_ref() else {
            return Vec::new();
        };
        let request = RunRequest::EditSettings {
            editor: config.system.editor.clone(),
            config_file: config.system.config_file.clone(),
        };
        self.session.output_buffer.clear();
        self.session.pending_command = None;
        self.prompt.blur();
        self.set_phase(Phase::Executing);
        vec![Effect::Run(request)]
    }

    fn on_exec_output(&mut self, output: ExecOutput) -> Vec<Effect> {
        if output.is_executable() {
            info!(command = %output.command, "command proposed");
            self.session.pending_command = Some(output.command.clone());
            self.prompt.blur();
            self.set_phase(Phase::Confirming);
            return vec![Effect::Print(Printable::Command {
                command: output.command,
                explanation: output.explanation,
            })];
        }
        let effects = vec![Effect::Print(Printable::Content(output.explanation))];
        self.finish_turn(effects, EXIT_OK)
    }

    fn on_chat_chunk(&mut self, chunk: ChatChunk) -> Vec<Effect> {
        self.session.output_buffer.push_str(&chunk.content);
        if !chunk.last {
            if let Some(engine) = self.engine.as_mut() {
                engine.await_chat_chunk(self.events.clone());
            }
            return Vec::new();
        }
        let answer = std::mem::take(&mut self.session.output_buffer);
        let mut effects = Vec::new();
        if !answer.trim().is_empty() {
            effects.push(Effect::Print(Printable::Content(answer)));
        }
        self.finish_turn(effects, EXIT_OK)
    }

    fn on_engine_error(&mut self, err: EngineError) -> Vec<Effect> {
        warn!(%err, "completion failed");
        self.session.pending_command = None;
        let partial = std::mem::take(&mut self.session.output_buffer);
        let mut effects = Vec::new();
        if self.session.prompt_mode == PromptMode::Chat && !partial.trim().is_empty() {
            effects.push(Effect::Print(Printable::Content(partial)));
        }
        effects.push(Effect::Print(Printable::Error(format!("[error] {err}"))));
        self.finish_turn(effects, EXIT_FAILURE)
    }

    fn confirm(&mut self) -> Vec<Effect> {
        let Some(command) = self.session.pending_command.take() else {
            return self.cancel();
        };
        self.session.output_buffer.clear();
        self.prompt.clear();
        self.set_phase(Phase::Executing);
        vec![Effect::Run(RunRequest::Command(command))]
    }

    fn cancel(&mut self) -> Vec<Effect> {
        info!("execution declined");
        self.session.pending_command = None;
        self.session.output_buffer.clear();
        self.prompt.clear();
        let effects = vec![Effect::Print(Printable::Warning("[cancel]".to_string()))];
        self.finish_turn(effects, EXIT_OK)
    }

    fn on_run_finished(&mut self, output: RunOutput) -> Vec<Effect> {
        self.session.pending_command = None;
        let output = if output.kind == RunKind::Settings && !output.has_error() {
            self.reload_settings()
        } else {
            output
        };
        let (effect, code) = if output.has_error() {
            (Effect::Print(Printable::Error(output.error_message())), EXIT_FAILURE)
        } else {
            (success(output.success_message()), EXIT_OK)
        };
        self.finish_turn(vec![effect], code)
    }

    fn reload_settings(&mut self) -> RunOutput {
        let config = match self.store.load() {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "settings reload failed");
                return RunOutput::failure(RunKind::Settings, err.to_string());
            }
        };
        if let Err(err) = self.install_engine(&config) {
            warn!(%err, "engine rebuild failed");
            return RunOutput::failure(RunKind::Settings, err.to_string());
        }
        self.config = Some(config);
        RunOutput::success(RunKind::Settings)
    }

    /// Ends a query/confirm/run turn: a CLI run exits, a REPL returns to an
    /// empty focused prompt.
    fn finish_turn(&mut self, mut effects: Vec<Effect>, code: u8) -> Vec<Effect> {
        if self.session.is_cli() {
            effects.push(Effect::Quit(code));
            return effects;
        }
        self.prompt.focus();
        self.set_phase(Phase::Idle);
        effects
    }

    fn fatal(&mut self, message: String) -> Vec<Effect> {
        error!(%message, "fatal session error");
        let effects = vec![
            Effect::Print(Printable::Error(format!("[error] {message}"))),
            Effect::Quit(EXIT_FAILURE),
        ];
        self.session.last_error = Some(message);
        effects
    }

    fn expect_phase(&self, expected: Phase, what: &str) -> bool {
        if self.session.phase == expected {
            return true;
        }
        warn!(
            phase = self.session.phase.as_str(),
            expected = expected.as_str(),
            "ignoring stale {what}"
        );
        false
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.session.phase != phase {
            info!(from = self.session.phase.as_str(), to = phase.as_str(), "phase change");
        }
        self.session.phase = phase;
    }
}

fn success(message: &str) -> Effect {
    Effect::Print(Printable::Success(message.to_string()))
}

#[cfg(test)]
#[path = "../tests/unit/controller_tests.rs"]
mod tests;
