use ratatui::text::Span;

use crate::session::PromptMode;

const MASK_CHAR: char = '*';

/// Single-line input with a mode-specific prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    mode: PromptMode,
    value: String,
    cursor: usize,
    focused: bool,
}

impl Prompt {
    pub fn new(mode: PromptMode) -> Self {
        Self {
            mode,
            value: String::new(),
            cursor: 0,
            focused: true,
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PromptMode) {
        self.mode = mode;
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn input_char(&mut self, c: char) {
        let byte_idx = char_to_byte_idx(&self.value, self.cursor);
        self.value.insert(byte_idx, c);
        self.cursor = self.cursor.saturating_add(1);
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = char_to_byte_idx(&self.value, self.cursor - 1);
        let end = char_to_byte_idx(&self.value, self.cursor);
        self.value.drain(start..end);
        self.cursor -= 1;
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let char_len = self.value.chars().count();
        self.cursor = (self.cursor + 1).min(char_len);
    }

    pub fn prefix(&self) -> &'static str {
        match self.mode {
            PromptMode::Chat => "chat > ",
            PromptMode::Config => "api key > ",
            PromptMode::Exec | PromptMode::Default => "exec > ",
        }
    }

    /// What the terminal shows; the API key never appears in clear.
    pub fn display_value(&self) -> String {
        if self.mode == PromptMode::Config {
            MASK_CHAR.to_string().repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// The submitted line as echoed into scrollback.
    pub fn as_echo(&self) -> String {
        format!("{}{}", self.prefix(), self.display_value())
    }

    /// Display column of the cursor, counting the prefix.
    pub fn cursor_column(&self) -> u16 {
        let before: String = self.display_value().chars().take(self.cursor).collect();
        let width = Span::raw(self.prefix()).width() + Span::raw(before).width();
        u16::try_from(width).unwrap_or(u16::MAX)
    }
}

fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(s.len())
}
