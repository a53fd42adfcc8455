use std::io::{self, Stdout};
use std::panic;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::{TerminalOptions, Viewport};

use crate::controller::{Printable, View};
use crate::theme::Theme;
use crate::ui::{VIEWPORT_HEIGHT, printable_text, render, wrapped_height};

type InlineTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Inline terminal: a small live viewport at the bottom, with everything
/// printed going into the normal scrollback above it.
pub struct Tui {
    terminal: InlineTerminal,
    theme: Theme,
}

/// Leaves raw mode for as long as it lives.
struct CookedModeGuard;

impl CookedModeGuard {
    fn enter() -> io::Result<Self> {
        disable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for CookedModeGuard {
    fn drop(&mut self) {
        let _ = enable_raw_mode();
    }
}

fn new_terminal() -> io::Result<InlineTerminal> {
    Terminal::with_options(
        CrosstermBackend::new(io::stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(VIEWPORT_HEIGHT),
        },
    )
}

fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), crossterm::cursor::Show);
        original_hook(panic_info);
    }));
}

impl Tui {
    pub fn init(theme: Theme) -> io::Result<Self> {
        install_panic_hook();
        enable_raw_mode()?;
        let terminal = match new_terminal() {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                return Err(err);
            }
        };
        Ok(Self { terminal, theme })
    }

    pub fn draw(&mut self, view: View<'_>) -> io::Result<()> {
        let theme = &self.theme;
        self.terminal.draw(|frame| render(frame, view, theme))?;
        Ok(())
    }

    pub fn print(&mut self, printable: &Printable) -> io::Result<()> {
        let text = printable_text(printable, &self.theme);
        let width = self.terminal.size()?.width.max(1);
        let height = wrapped_height(&text, width);
        if height == 0 {
            return Ok(());
        }
        self.terminal.insert_before(height, |buf| {
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .render(buf.area, buf);
        })
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        self.terminal = new_terminal()?;
        Ok(())
    }

    /// Hands the terminal to a foreground process. Raw mode is restored on
    /// every exit path of `run`, then the viewport is rebuilt below whatever
    /// the process printed.
    pub fn suspend<T>(&mut self, run: impl FnOnce() -> T) -> io::Result<T> {
        self.terminal.clear()?;
        self.terminal.show_cursor()?;
        let output = {
            let _guard = CookedModeGuard::enter()?;
            run()
        };
        self.terminal = new_terminal()?;
        Ok(output)
    }

    pub fn restore(&mut self) -> io::Result<()> {
        self.terminal.clear()?;
        self.terminal.show_cursor()?;
        disable_raw_mode()
    }
}
