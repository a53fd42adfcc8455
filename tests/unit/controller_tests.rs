use super::*;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::EngineMode;

const CONFIG_WITH_KEY: &str = "[ai]\napi_key = \"sk-test\"\n";

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("termpal-controller-{prefix}-{nanos}"));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    fn config_path(&self) -> PathBuf {
        self.path.join("config.toml")
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

type CallLog = Arc<Mutex<Vec<String>>>;

struct FakeEngine {
    mode: EngineMode,
    calls: CallLog,
}

impl FakeEngine {
    fn record(&self, call: String) {
        self.calls.lock().expect("call log").push(call);
    }
}

impl Engine for FakeEngine {
    fn mode(&self) -> EngineMode {
        self.mode
    }

    fn set_mode(&mut self, mode: EngineMode) {
        self.mode = mode;
        self.record(format!("set_mode:{mode:?}"));
    }

    fn set_pipe(&mut self, pipe: &str) {
        self.record(format!("pipe:{pipe}"));
    }

    fn reset(&mut self) {
        self.record("reset".to_string());
    }

    fn request_exec(&mut self, input: &str, _events: EventSender) {
        self.record(format!("exec:{input}"));
    }

    fn start_chat_stream(&mut self, input: &str) {
        self.record(format!("stream:{input}"));
    }

    fn await_chat_chunk(&mut self, _events: EventSender) {
        self.record("await".to_string());
    }
}

struct FakeFactory {
    calls: CallLog,
    fail: bool,
}

impl EngineFactory for FakeFactory {
    fn build(&self, mode: EngineMode, _config: &Config) -> Result<Box<dyn Engine>, EngineError> {
        if self.fail {
            return Err(EngineError::MissingApiKey);
        }
        self.calls
            .lock()
            .expect("call log")
            .push(format!("build:{mode:?}"));
        Ok(Box::new(FakeEngine {
            mode,
            calls: self.calls.clone(),
        }))
    }
}

struct Harness {
    controller: SessionController,
    calls: CallLog,
    dir: TempDirGuard,
    _rx: Receiver<SessionEvent>,
}

impl Harness {
    fn new(name: &str, mode: PromptMode, args: &str, pipe: &str, config: Option<&str>) -> Self {
        Self::with_factory(name, mode, args, pipe, config, false)
    }

    fn with_factory(
        name: &str,
        mode: PromptMode,
        args: &str,
        pipe: &str,
        config: Option<&str>,
        fail: bool,
    ) -> Self {
        let dir = TempDirGuard::new(name);
        if let Some(text) = config {
            std::fs::write(dir.config_path(), text).expect("write config");
        }
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();
        let controller = SessionController::new(
            LaunchInput::new(mode, args.to_string(), pipe.to_string()),
            ConfigStore::at(dir.config_path()),
            Box::new(FakeFactory {
                calls: calls.clone(),
                fail,
            }),
            tx,
        );
        Self {
            controller,
            calls,
            dir,
            _rx: rx,
        }
    }

    fn repl(name: &str) -> Self {
        let mut harness = Self::new(name, PromptMode::Exec, "", "", Some(CONFIG_WITH_KEY));
        harness.controller.start();
        harness
    }

    fn key(&mut self, action: KeyAction) -> Vec<Effect> {
        self.controller.handle(SessionEvent::Key(action))
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.key(KeyAction::Char(c));
        }
    }

    fn submit(&mut self, text: &str) -> Vec<Effect> {
        self.type_text(text);
        self.key(KeyAction::Enter)
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log").clone()
    }

    fn phase(&self) -> Phase {
        self.controller.session().phase
    }

    fn assert_pending_only_while_confirming(&self) {
        let session = self.controller.session();
        assert_eq!(
            session.pending_command().is_some(),
            session.phase == Phase::Confirming,
            "pending command in phase {}",
            session.phase.as_str()
        );
    }
}

fn exec_output(command: &str, explanation: &str, executable: bool) -> SessionEvent {
    SessionEvent::Exec(ExecOutput {
        command: command.to_string(),
        explanation: explanation.to_string(),
        executable,
    })
}

fn chunk(content: &str, last: bool) -> SessionEvent {
    SessionEvent::ChatChunk(ChatChunk {
        content: content.to_string(),
        last,
    })
}

fn has_quit(effects: &[Effect]) -> Option<u8> {
    effects.iter().find_map(|effect| match effect {
        Effect::Quit(code) => Some(*code),
        _ => None,
    })
}

#[test]
fn repl_start_clears_screen_and_shows_help() {
    let mut harness = Harness::new("repl-start", PromptMode::Default, "", "", Some(CONFIG_WITH_KEY));
    let effects = harness.controller.start();
    assert_eq!(
        effects,
        vec![Effect::ClearScreen, Effect::Print(Printable::Help)]
    );
    assert_eq!(harness.phase(), Phase::Idle);
    assert_eq!(harness.controller.session().prompt_mode, PromptMode::Exec);
    assert_eq!(harness.calls(), vec!["build:Exec"]);
    assert!(matches!(harness.controller.view(), View::Prompt(_)));
}

#[test]
fn default_mode_resolves_from_config() {
    let mut harness = Harness::new(
        "default-chat",
        PromptMode::Default,
        "",
        "",
        Some("[ai]\napi_key = \"sk\"\n[user]\ndefault_prompt_mode = \"chat\"\n"),
    );
    harness.controller.start();
    assert_eq!(harness.controller.session().prompt_mode, PromptMode::Chat);
    assert_eq!(harness.controller.prompt().mode(), PromptMode::Chat);
    assert_eq!(harness.calls(), vec!["build:Chat"]);
}

#[test]
fn scenario_exec_command_waits_for_confirmation() {
    let mut harness = Harness::repl("scenario-a");
    let effects = harness.submit("list files");
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Echo("exec > list files".to_string()))]
    );
    assert_eq!(harness.phase(), Phase::Querying);
    assert!(harness.calls().contains(&"exec:list files".to_string()));
    assert!(matches!(harness.controller.view(), View::Spinner(_)));

    let effects = harness
        .controller
        .handle(exec_output("ls -la", "lists files", true));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Command {
            command: "ls -la".to_string(),
            explanation: "lists files".to_string(),
        })]
    );
    assert_eq!(harness.phase(), Phase::Confirming);
    assert_eq!(harness.controller.session().pending_command(), Some("ls -la"));
    assert!(!harness.controller.prompt().is_focused());
    harness.assert_pending_only_while_confirming();
}

#[test]
fn scenario_declined_confirmation_returns_to_idle() {
    let mut harness = Harness::repl("scenario-b");
    harness.submit("list files");
    harness
        .controller
        .handle(exec_output("ls -la", "lists files", true));

    let effects = harness.key(KeyAction::Char('n'));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Warning("[cancel]".to_string()))]
    );
    assert_eq!(harness.phase(), Phase::Idle);
    assert_eq!(harness.controller.prompt().value(), "");
    assert!(harness.controller.prompt().is_focused());
    harness.assert_pending_only_while_confirming();
}

#[test]
fn scenario_confirmed_command_runs_and_reports_ok() {
    let mut harness = Harness::repl("scenario-c");
    harness.submit("list files");
    harness
        .controller
        .handle(exec_output("ls -la", "lists files", true));

    let effects = harness.key(KeyAction::Char('y'));
    assert_eq!(
        effects,
        vec![Effect::Run(RunRequest::Command("ls -la".to_string()))]
    );
    assert_eq!(harness.phase(), Phase::Executing);
    harness.assert_pending_only_while_confirming();

    let effects = harness
        .controller
        .handle(SessionEvent::RunFinished(RunOutput::success(RunKind::Command)));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Success("[ok]".to_string()))]
    );
    assert_eq!(harness.phase(), Phase::Idle);
    harness.assert_pending_only_while_confirming();
}

#[test]
fn uppercase_y_confirms_and_other_answers_cancel() {
    let mut harness = Harness::repl("confirm-case");
    harness.submit("q");
    harness.controller.handle(exec_output("pwd", "where", true));
    let effects = harness.key(KeyAction::Char('Y'));
    assert!(matches!(effects.as_slice(), [Effect::Run(_)]));

    let mut harness = Harness::repl("confirm-other");
    harness.submit("q");
    harness.controller.handle(exec_output("pwd", "where", true));
    let effects = harness.key(KeyAction::Other("esc".to_string()));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Warning("[cancel]".to_string()))]
    );
}

#[test]
fn navigation_keys_while_confirming_are_ignored() {
    let mut harness = Harness::repl("confirm-nav");
    harness.submit("q");
    harness.controller.handle(exec_output("pwd", "where", true));
    for action in [KeyAction::Enter, KeyAction::Tab, KeyAction::Up, KeyAction::Settings] {
        assert!(harness.key(action).is_empty());
        assert_eq!(harness.phase(), Phase::Confirming);
    }
    assert!(harness.key(KeyAction::ClearScreen).is_empty());
}

#[test]
fn failed_run_reports_error() {
    let mut harness = Harness::repl("run-error");
    harness.submit("q");
    harness.controller.handle(exec_output("false", "fails", true));
    harness.key(KeyAction::Char('y'));
    let effects = harness.controller.handle(SessionEvent::RunFinished(RunOutput::failure(
        RunKind::Command,
        "exited with exit status: 1",
    )));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Error(
            "[error] exited with exit status: 1".to_string()
        ))]
    );
    assert_eq!(harness.phase(), Phase::Idle);
}

#[test]
fn non_executable_output_prints_explanation() {
    let mut harness = Harness::repl("not-exec");
    harness.submit("what is a pipe");
    let effects = harness
        .controller
        .handle(exec_output("", "A pipe connects processes.", false));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Content(
            "A pipe connects processes.".to_string()
        ))]
    );
    assert_eq!(harness.phase(), Phase::Idle);
    harness.assert_pending_only_while_confirming();
}

#[test]
fn scenario_cli_chat_streams_then_exits() {
    let mut harness = Harness::new(
        "scenario-d",
        PromptMode::Default,
        "hello",
        "",
        Some("[ai]\napi_key = \"sk\"\n[user]\ndefault_prompt_mode = \"chat\"\n"),
    );
    let effects = harness.controller.start();
    assert!(effects.is_empty());
    assert_eq!(harness.phase(), Phase::Querying);
    assert_eq!(harness.calls(), vec!["build:Chat", "stream:hello", "await"]);

    assert!(harness.controller.handle(chunk("Hel", false)).is_empty());
    assert_eq!(harness.controller.view(), View::Streaming("Hel"));
    assert!(harness.controller.handle(chunk("lo!", false)).is_empty());
    let effects = harness.controller.handle(chunk("", true));
    assert_eq!(
        effects,
        vec![
            Effect::Print(Printable::Content("Hello!".to_string())),
            Effect::Quit(EXIT_OK),
        ]
    );
    let awaits = harness
        .calls()
        .iter()
        .filter(|call| call.as_str() == "await")
        .count();
    assert_eq!(awaits, 3);
    assert!(harness.controller.session().output_buffer.is_empty());
}

#[test]
fn scenario_reset_clears_history() {
    let mut harness = Harness::repl("scenario-e");
    for input in ["one", "two", "three"] {
        harness.submit(input);
        harness
            .controller
            .handle(exec_output("", "answer", false));
    }
    assert_eq!(harness.controller.history().len(), 3);
    harness.type_text("draft");

    let effects = harness.key(KeyAction::Reset);
    assert_eq!(effects, vec![Effect::ClearScreen]);
    assert_eq!(harness.controller.history().len(), 0);
    assert_eq!(harness.controller.prompt().value(), "");
    assert!(harness.calls().contains(&"reset".to_string()));

    harness.key(KeyAction::Up);
    assert_eq!(harness.controller.prompt().value(), "");
}

#[test]
fn up_recalls_history_newest_first_and_down_returns_to_empty() {
    let mut harness = Harness::repl("history");
    for input in ["first", "second"] {
        harness.submit(input);
        harness
            .controller
            .handle(exec_output("", "answer", false));
    }
    harness.key(KeyAction::Up);
    assert_eq!(harness.controller.prompt().value(), "second");
    harness.key(KeyAction::Up);
    assert_eq!(harness.controller.prompt().value(), "first");
    harness.key(KeyAction::Up);
    assert_eq!(harness.controller.prompt().value(), "first");
    harness.key(KeyAction::Down);
    assert_eq!(harness.controller.prompt().value(), "second");
    harness.key(KeyAction::Down);
    assert_eq!(harness.controller.prompt().value(), "");
}

#[test]
fn tab_toggles_mode_and_resets_engine() {
    let mut harness = Harness::repl("tab");
    assert!(harness.key(KeyAction::Tab).is_empty());
    assert_eq!(harness.controller.session().prompt_mode, PromptMode::Chat);
    assert_eq!(harness.controller.prompt().prefix(), "chat > ");
    assert_eq!(
        harness.controller.engine().map(|engine| engine.mode()),
        Some(EngineMode::Chat)
    );
    let calls = harness.calls();
    assert_eq!(&calls[calls.len() - 2..], ["set_mode:Chat", "reset"]);

    harness.key(KeyAction::Tab);
    assert_eq!(harness.controller.session().prompt_mode, PromptMode::Exec);
}

#[test]
fn tab_during_querying_is_a_noop() {
    let mut harness = Harness::repl("tab-busy");
    harness.submit("list files");
    let before = harness.calls();
    assert!(harness.key(KeyAction::Tab).is_empty());
    assert_eq!(harness.controller.session().prompt_mode, PromptMode::Exec);
    assert_eq!(harness.phase(), Phase::Querying);
    assert_eq!(harness.calls(), before);
}

#[test]
fn clear_screen_is_blocked_while_busy() {
    let mut harness = Harness::repl("clear");
    assert_eq!(harness.key(KeyAction::ClearScreen), vec![Effect::ClearScreen]);
    harness.submit("q");
    assert!(harness.key(KeyAction::ClearScreen).is_empty());
}

#[test]
fn help_prints_only_when_idle() {
    let mut harness = Harness::repl("help");
    assert_eq!(
        harness.key(KeyAction::Help),
        vec![Effect::Print(Printable::Help)]
    );
    harness.submit("q");
    assert!(harness.key(KeyAction::Help).is_empty());
}

#[test]
fn empty_input_is_not_submitted() {
    let mut harness = Harness::repl("empty");
    harness.type_text("   ");
    assert!(harness.key(KeyAction::Enter).is_empty());
    assert_eq!(harness.phase(), Phase::Idle);
    assert!(harness.controller.history().is_empty());
}

#[test]
fn stale_results_are_ignored() {
    let mut harness = Harness::repl("stale");
    assert!(harness
        .controller
        .handle(exec_output("rm -rf /", "nope", true))
        .is_empty());
    assert!(harness.controller.handle(chunk("late", true)).is_empty());
    assert!(harness
        .controller
        .handle(SessionEvent::RunFinished(RunOutput::success(RunKind::Command)))
        .is_empty());
    assert_eq!(harness.phase(), Phase::Idle);
    harness.assert_pending_only_while_confirming();
}

#[test]
fn engine_error_returns_repl_to_idle() {
    let mut harness = Harness::repl("engine-error");
    harness.submit("q");
    let effects = harness
        .controller
        .handle(SessionEvent::EngineFailed(EngineError::StreamClosed));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Error(
            "[error] stream ended before completion".to_string()
        ))]
    );
    assert_eq!(harness.phase(), Phase::Idle);
    assert!(harness.controller.session().last_error.is_none());
}

#[test]
fn engine_error_in_cli_exits_with_failure() {
    let mut harness = Harness::new("cli-error", PromptMode::Exec, "list", "", Some(CONFIG_WITH_KEY));
    harness.controller.start();
    let effects = harness.controller.handle(SessionEvent::EngineFailed(EngineError::Status {
        status: 401,
        body: "unauthorized".to_string(),
    }));
    assert_eq!(has_quit(&effects), Some(EXIT_FAILURE));
}

#[test]
fn failed_chat_stream_keeps_the_streamed_part() {
    let mut harness = Harness::repl("chat-partial");
    harness.key(KeyAction::Tab);
    harness.submit("hi");
    assert!(harness.controller.handle(chunk("partial answer", false)).is_empty());

    let effects = harness
        .controller
        .handle(SessionEvent::EngineFailed(EngineError::StreamClosed));
    assert_eq!(
        effects,
        vec![
            Effect::Print(Printable::Content("partial answer".to_string())),
            Effect::Print(Printable::Error(
                "[error] stream ended before completion".to_string()
            )),
        ]
    );
    assert_eq!(harness.phase(), Phase::Idle);
    assert!(harness.controller.session().output_buffer.is_empty());
}

#[test]
fn chat_failure_before_any_text_prints_only_the_error() {
    let mut harness = Harness::repl("chat-empty-fail");
    harness.key(KeyAction::Tab);
    harness.submit("hi");
    let effects = harness
        .controller
        .handle(SessionEvent::EngineFailed(EngineError::StreamClosed));
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::Print(Printable::Error(_))));
}

#[test]
fn cli_decline_exits_cleanly() {
    let mut harness = Harness::new("cli-decline", PromptMode::Exec, "list", "", Some(CONFIG_WITH_KEY));
    harness.controller.start();
    assert_eq!(harness.calls(), vec!["build:Exec", "exec:list"]);
    harness.controller.handle(exec_output("ls", "list", true));
    let effects = harness.key(KeyAction::Char('n'));
    assert_eq!(
        effects,
        vec![
            Effect::Print(Printable::Warning("[cancel]".to_string())),
            Effect::Quit(EXIT_OK),
        ]
    );
}

#[test]
fn ctrl_c_exit_code_depends_on_run_mode() {
    let mut repl = Harness::repl("ctrl-c-repl");
    assert_eq!(repl.key(KeyAction::Quit), vec![Effect::Quit(EXIT_OK)]);

    let mut cli = Harness::new("ctrl-c-cli", PromptMode::Exec, "list", "", Some(CONFIG_WITH_KEY));
    cli.controller.start();
    assert_eq!(cli.key(KeyAction::Quit), vec![Effect::Quit(EXIT_INTERRUPTED)]);
}

#[test]
fn pipe_input_reaches_engine() {
    let mut harness = Harness::new(
        "pipe",
        PromptMode::Exec,
        "",
        "error log\n",
        Some(CONFIG_WITH_KEY),
    );
    assert!(harness.controller.session().is_cli());
    harness.controller.start();
    assert_eq!(
        harness.calls(),
        vec!["build:Exec", "pipe:error log\n", "exec:"]
    );
}

#[test]
fn missing_config_starts_bootstrap_with_masked_prompt() {
    let mut harness = Harness::new("bootstrap", PromptMode::Default, "", "", None);
    assert!(harness.controller.start().is_empty());
    assert_eq!(harness.phase(), Phase::Configuring);
    harness.type_text("sk-abc");
    match harness.controller.view() {
        View::Configuring(prompt) => assert_eq!(prompt.display_value(), "******"),
        other => panic!("unexpected view {other:?}"),
    }

    let effects = harness.key(KeyAction::Enter);
    assert_eq!(
        effects,
        vec![
            Effect::ClearScreen,
            Effect::Print(Printable::Success("[settings ok]".to_string())),
            Effect::Print(Printable::Help),
        ]
    );
    assert_eq!(harness.phase(), Phase::Idle);
    let written = std::fs::read_to_string(harness.dir.config_path()).expect("config written");
    assert!(written.contains("sk-abc"));
}

#[test]
fn empty_bootstrap_key_is_rejected() {
    let mut harness = Harness::new("bootstrap-empty", PromptMode::Default, "", "", None);
    harness.controller.start();
    harness.type_text("  ");
    assert!(harness.key(KeyAction::Enter).is_empty());
    assert_eq!(harness.phase(), Phase::Configuring);
    assert!(!harness.dir.config_path().exists());
}

#[test]
fn reset_while_configuring_clears_the_key_prompt() {
    let mut harness = Harness::new("bootstrap-reset", PromptMode::Default, "", "", None);
    harness.controller.start();
    harness.type_text("sk-abc");
    assert_eq!(harness.key(KeyAction::Reset), vec![Effect::ClearScreen]);
    assert_eq!(harness.phase(), Phase::Configuring);
    assert_eq!(harness.controller.prompt().value(), "");
    assert_eq!(harness.controller.prompt().mode(), PromptMode::Config);
    assert!(harness.controller.history().is_empty());
}

#[test]
fn cli_bootstrap_continues_with_initial_query() {
    let mut harness = Harness::new("bootstrap-cli", PromptMode::Exec, "disk usage", "", None);
    harness.controller.start();
    harness.submit("sk-cli");
    assert_eq!(harness.phase(), Phase::Querying);
    assert!(harness.calls().contains(&"exec:disk usage".to_string()));
}

#[test]
fn broken_config_is_fatal() {
    let mut harness = Harness::new("broken", PromptMode::Default, "", "", Some("[ai\n"));
    let effects = harness.controller.start();
    assert_eq!(has_quit(&effects), Some(EXIT_FAILURE));
    assert!(harness.controller.session().last_error.is_some());
    assert!(matches!(harness.controller.view(), View::Error(_)));
    assert!(harness.key(KeyAction::Enter).is_empty());
}

#[test]
fn engine_construction_failure_is_fatal() {
    let mut harness = Harness::with_factory(
        "engine-fail",
        PromptMode::Default,
        "",
        "",
        Some(CONFIG_WITH_KEY),
        true,
    );
    let effects = harness.controller.start();
    assert_eq!(has_quit(&effects), Some(EXIT_FAILURE));
    assert!(matches!(harness.controller.view(), View::Error(_)));
}

#[test]
fn settings_edit_reloads_config_and_rebuilds_engine() {
    let mut harness = Harness::repl("settings");
    harness.key(KeyAction::Tab);
    let effects = harness.key(KeyAction::Settings);
    match effects.as_slice() {
        [Effect::Run(RunRequest::EditSettings { config_file, .. })] => {
            assert_eq!(config_file, &harness.dir.config_path());
        }
        other => panic!("unexpected effects {other:?}"),
    }
    assert_eq!(harness.phase(), Phase::Executing);
    assert_eq!(harness.controller.view(), View::Blank);

    let effects = harness
        .controller
        .handle(SessionEvent::RunFinished(RunOutput::success(RunKind::Settings)));
    assert_eq!(
        effects,
        vec![Effect::Print(Printable::Success("[settings ok]".to_string()))]
    );
    assert_eq!(harness.calls().last().map(String::as_str), Some("build:Chat"));
    assert_eq!(harness.phase(), Phase::Idle);
}

#[test]
fn settings_reload_failure_is_reported_not_fatal() {
    let mut harness = Harness::repl("settings-broken");
    harness.key(KeyAction::Settings);
    std::fs::write(harness.dir.config_path(), "[ai\n").expect("break config");
    let effects = harness
        .controller
        .handle(SessionEvent::RunFinished(RunOutput::success(RunKind::Settings)));
    match effects.as_slice() {
        [Effect::Print(Printable::Error(message))] => {
            assert!(message.starts_with("[settings error]"));
        }
        other => panic!("unexpected effects {other:?}"),
    }
    assert_eq!(harness.phase(), Phase::Idle);
    assert!(harness.controller.session().last_error.is_none());
}

#[test]
fn spinner_advances_on_tick() {
    let mut harness = Harness::repl("tick");
    harness.submit("q");
    let View::Spinner(before) = harness.controller.view() else {
        panic!("expected spinner");
    };
    harness.controller.handle(SessionEvent::Tick);
    assert_eq!(harness.controller.view(), View::Spinner(before + 1));
}
