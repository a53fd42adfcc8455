use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;
use tracing::{info, warn};

/// Foreground work that needs the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunRequest {
    Command(String),
    EditSettings { editor: String, config_file: PathBuf },
}

impl RunRequest {
    pub fn kind(&self) -> RunKind {
        match self {
            Self::Command(_) => RunKind::Command,
            Self::EditSettings { .. } => RunKind::Settings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Command,
    Settings,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no editor configured")]
    MissingEditor,
    #[error("cannot parse editor command `{0}`")]
    EditorSyntax(String),
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("exited with {0}")]
    Exit(ExitStatus),
}

/// How a foreground run ended, with the messages shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub kind: RunKind,
    pub error: Option<String>,
}

impl RunOutput {
    pub fn success(kind: RunKind) -> Self {
        Self { kind, error: None }
    }

    pub fn failure(kind: RunKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: Some(error.into()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn success_message(&self) -> &'static str {
        match self.kind {
            RunKind::Command => "[ok]",
            RunKind::Settings => "[settings ok]",
        }
    }

    pub fn error_message(&self) -> String {
        let tag = match self.kind {
            RunKind::Command => "[error]",
            RunKind::Settings => "[settings error]",
        };
        match self.error.as_deref() {
            Some(detail) if !detail.trim().is_empty() => format!("{tag} {detail}"),
            _ => tag.to_string(),
        }
    }
}

pub fn prepare_interactive_command(command_line: &str) -> Command {
    let mut command = Command::new("bash");
    command.arg("-c").arg(command_line);
    command
}

/// The editor value may carry its own flags (`code --wait`); the config path
/// is always passed as the final argument.
pub fn prepare_edit_settings_command(editor: &str, config_file: &Path) -> Result<Command, RunError> {
    let editor = editor.trim();
    if editor.is_empty() {
        return Err(RunError::MissingEditor);
    }
    let parts = shlex::split(editor).ok_or_else(|| RunError::EditorSyntax(editor.to_string()))?;
    let Some((program, args)) = parts.split_first() else {
        return Err(RunError::MissingEditor);
    };
    let mut command = Command::new(program);
    command.args(args).arg(config_file);
    Ok(command)
}

/// Runs the request in the foreground with inherited stdio. Callers must
/// have released the terminal first.
pub fn run(request: &RunRequest) -> RunOutput {
    let kind = request.kind();
    let result = match request {
        RunRequest::Command(command_line) => {
            info!(command = %command_line, "running confirmed command");
            let mut stdout = io::stdout();
            let _ = writeln!(stdout);
            let _ = stdout.flush();
            let result = execute(prepare_interactive_command(command_line), "bash");
            let _ = writeln!(stdout);
            let _ = stdout.flush();
            result
        }
        RunRequest::EditSettings {
            editor,
            config_file,
        } => {
            info!(%editor, path = %config_file.display(), "opening settings editor");
            prepare_edit_settings_command(editor, config_file)
                .and_then(|command| execute(command, editor))
        }
    };
    match result {
        Ok(()) => RunOutput::success(kind),
        Err(err) => {
            warn!(%err, ?kind, "foreground run failed");
            RunOutput::failure(kind, err.to_string())
        }
    }
}

fn execute(mut command: Command, program: &str) -> Result<(), RunError> {
    let status = command.status().map_err(|source| RunError::Spawn {
        program: program.to_string(),
        source,
    })?;
    info!(code = ?status.code(), "foreground run exited");
    if status.success() {
        Ok(())
    } else {
        Err(RunError::Exit(status))
    }
}
