pub(crate) mod chat;
pub(crate) mod exec;

pub(crate) use chat::build_chat_system_prompt;
pub(crate) use exec::build_exec_system_prompt;

/// Attaches piped stdin to a user message so every request carries it.
pub(crate) fn build_user_message(input: &str, pipe: &str) -> String {
    let pipe = pipe.trim();
    if pipe.is_empty() {
        return input.to_string();
    }
    format!("{input}\n\nContext from piped input:\n```\n{pipe}\n```")
}

fn preferences_block(preferences: &str) -> String {
    let preferences = preferences.trim();
    if preferences.is_empty() {
        String::new()
    } else {
        format!("\nUser preferences (follow them unless they conflict with the rules above):\n{preferences}\n")
    }
}
