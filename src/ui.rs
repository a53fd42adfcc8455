use ratatui::prelude::*;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

use crate::controller::{Printable, View};
use crate::markdown::render_markdown;
use crate::prompt::Prompt;
use crate::theme::Theme;

/// Height of the live area kept below the scrollback.
pub const VIEWPORT_HEIGHT: u16 = 8;

const SPINNER_FRAMES: [&str; 6] = ["[   ]", "[.  ]", "[.. ]", "[...]", "[ ..]", "[  .]"];

const CONFIG_MESSAGE: &str = "**Welcome to termpal.**\n\n\
No configuration was found. Enter an API key for your OpenAI-compatible \
backend and a config file will be created for you (edit it later with `ctrl+s`).";

const HELP_MARKDOWN: &str = "**termpal** turns plain language into shell commands or answers.\n\n\
- `enter` submit the prompt\n\
- `tab` switch between exec and chat mode (starts a new conversation)\n\
- `↑` / `↓` browse input history\n\
- `ctrl+h` show this help\n\
- `ctrl+l` clear the screen\n\
- `ctrl+r` clear history and conversation\n\
- `ctrl+s` edit settings\n\
- `ctrl+c` quit\n\n\
In exec mode a proposed command runs only after you answer `y`.";

pub fn render(frame: &mut Frame, view: View<'_>, theme: &Theme) {
    let area = frame.area();
    match view {
        View::Error(message) => {
            let paragraph = Paragraph::new(Line::styled(
                format!("[error] {message}"),
                Style::default().fg(theme.error_fg),
            ))
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        View::Configuring(prompt) => {
            let [message_area, prompt_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
            let message = Paragraph::new(render_markdown(CONFIG_MESSAGE)).wrap(Wrap { trim: false });
            frame.render_widget(message, message_area);
            render_prompt(frame, prompt_area, prompt, theme);
        }
        View::Prompt(prompt) => {
            let [prompt_area, _] =
                Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);
            render_prompt(frame, prompt_area, prompt, theme);
        }
        View::Streaming(buffer) => {
            let paragraph = Paragraph::new(render_markdown(buffer)).wrap(Wrap { trim: false });
            let total = u16::try_from(paragraph.line_count(area.width)).unwrap_or(u16::MAX);
            let offset = total.saturating_sub(area.height);
            frame.render_widget(paragraph.scroll((offset, 0)), area);
        }
        View::Spinner(ticks) => {
            let line = Line::from(vec![
                Span::styled(spinner_frame(ticks), Style::default().fg(theme.spinner_fg)),
                Span::styled(" thinking", Style::default().fg(theme.muted_fg)),
            ]);
            frame.render_widget(Paragraph::new(line), area);
        }
        View::Blank => {}
    }
}

fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt, theme: &Theme) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let line = Line::from(vec![
        Span::styled(
            prompt.prefix(),
            Style::default()
                .fg(theme.prompt_fg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(prompt.display_value(), Style::default().fg(theme.text_fg)),
    ]);
    let cursor = prompt.cursor_column();
    let scroll = cursor.saturating_sub(area.width.saturating_sub(1));
    frame.render_widget(Paragraph::new(line).scroll((0, scroll)), area);
    if prompt.is_focused() {
        frame.set_cursor_position(Position::new(area.x + cursor - scroll, area.y));
    }
}

fn spinner_frame(ticks: u64) -> &'static str {
    SPINNER_FRAMES[((ticks / 6) as usize) % SPINNER_FRAMES.len()]
}

/// Styled text for a scrollback entry.
pub fn printable_text(printable: &Printable, theme: &Theme) -> Text<'static> {
    match printable {
        Printable::Echo(line) => Text::from(Line::styled(
            line.clone(),
            Style::default().fg(theme.muted_fg),
        )),
        Printable::Content(markdown) => {
            let mut text = render_markdown(markdown);
            text.lines.push(Line::default());
            text
        }
        Printable::Command {
            command,
            explanation,
        } => {
            let mut lines = vec![
                Line::default(),
                Line::styled(
                    format!("  {command}"),
                    Style::default()
                        .fg(theme.command_fg)
                        .add_modifier(Modifier::BOLD),
                ),
            ];
            if !explanation.trim().is_empty() {
                lines.push(Line::styled(
                    format!("  {}", explanation.trim()),
                    Style::default().fg(theme.muted_fg),
                ));
            }
            lines.push(Line::default());
            lines.push(Line::styled(
                "  confirm execution? [y/N]",
                Style::default().fg(theme.text_fg),
            ));
            Text::from(lines)
        }
        Printable::Help => {
            let mut text = render_markdown(HELP_MARKDOWN);
            text.lines.push(Line::default());
            text
        }
        Printable::Success(message) => framed(message, theme.success_fg),
        Printable::Warning(message) => framed(message, theme.warning_fg),
        Printable::Error(message) => framed(message, theme.error_fg),
    }
}

fn framed(message: &str, color: Color) -> Text<'static> {
    Text::from(vec![
        Line::default(),
        Line::styled(message.to_string(), Style::default().fg(color)),
        Line::default(),
    ])
}

/// Rows `text` occupies when wrapped to `width`.
pub fn wrapped_height(text: &Text<'static>, width: u16) -> u16 {
    let count = Paragraph::new(text.clone())
        .wrap(Wrap { trim: false })
        .line_count(width.max(1));
    u16::try_from(count).unwrap_or(u16::MAX)
}
