/// Submitted inputs, oldest first, plus a recall cursor.
///
/// The cursor ranges over `0..=len`; `len` is the implicit empty slot that
/// means "not recalling anything".
#[derive(Debug, Clone, Default)]
pub struct InputHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl InputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, input: impl Into<String>) {
        self.entries.push(input.into());
        self.cursor = self.entries.len();
    }

    pub fn previous(&mut self) -> Option<String> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn next(&mut self) -> Option<String> {
        let len = self.entries.len();
        if self.cursor + 1 < len {
            self.cursor += 1;
            return self.entries.get(self.cursor).cloned();
        }
        if self.cursor + 1 == len {
            self.cursor = len;
            return Some(String::new());
        }
        None
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
