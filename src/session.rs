use crate::engine::EngineMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Repl,
    Cli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Chat,
    Exec,
    Config,
    Default,
}

impl PromptMode {
    /// Parses the `default_prompt_mode` config value. Anything unknown falls
    /// back to exec, which is also the shipped default.
    pub fn from_config_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat" => Self::Chat,
            _ => Self::Exec,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Chat => Self::Exec,
            _ => Self::Chat,
        }
    }

    pub fn engine_mode(self) -> EngineMode {
        match self {
            Self::Chat => EngineMode::Chat,
            _ => EngineMode::Exec,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Configuring,
    Querying,
    Confirming,
    Executing,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Querying => "querying",
            Self::Confirming => "confirming",
            Self::Executing => "executing",
        }
    }

    /// Ctrl-L and friends are blocked while a request or decision is open.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Querying | Self::Confirming)
    }
}

/// What the process was started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchInput {
    pub run_mode: RunMode,
    pub prompt_mode: PromptMode,
    pub args: String,
    pub pipe: String,
}

impl LaunchInput {
    pub fn new(prompt_mode: PromptMode, args: String, pipe: String) -> Self {
        let run_mode = if args.trim().is_empty() && pipe.trim().is_empty() {
            RunMode::Repl
        } else {
            RunMode::Cli
        };
        Self {
            run_mode,
            prompt_mode,
            args,
            pipe,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    run_mode: RunMode,
    pub prompt_mode: PromptMode,
    pub phase: Phase,
    pub pending_command: Option<String>,
    pub output_buffer: String,
    pub last_error: Option<String>,
    args_input: String,
    pipe_input: String,
}

impl Session {
    pub fn new(input: LaunchInput) -> Self {
        Self {
            run_mode: input.run_mode,
            prompt_mode: input.prompt_mode,
            phase: Phase::Idle,
            pending_command: None,
            output_buffer: String::new(),
            last_error: None,
            args_input: input.args,
            pipe_input: input.pipe,
        }
    }

    pub fn is_cli(&self) -> bool {
        self.run_mode == RunMode::Cli
    }

    pub fn args_input(&self) -> &str {
        &self.args_input
    }

    pub fn pipe_input(&self) -> &str {
        &self.pipe_input
    }

    #[cfg(test)]
    pub fn pending_command(&self) -> Option<&str> {
        self.pending_command.as_deref()
    }
}
