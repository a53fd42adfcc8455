use crate::config::SystemConfig;

use super::preferences_block;

pub(crate) fn build_chat_system_prompt(system: &SystemConfig, preferences: &str) -> String {
    let os_name = &system.os_name;
    let shell = &system.shell;
    let username = &system.username;
    let mut prompt = format!(
        "You are a helpful terminal assistant for {username} on {os_name} using {shell}.\n\
         Rules:\n\
         - Answer concisely in markdown; the answer is rendered in a terminal.\n\
         - Put commands and code in fenced code blocks.\n\
         - Prefer commands that work on {os_name} with {shell}.\n"
    );
    prompt.push_str(&preferences_block(preferences));
    prompt
}
