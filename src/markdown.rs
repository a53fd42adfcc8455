//! Renders markdown through `tui-markdown`, which speaks `ratatui-core`
//! types, into the `ratatui` types the rest of the UI draws with.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

pub fn render_markdown(markdown: &str) -> Text<'static> {
    let rendered = tui_markdown::from_str(markdown);
    let lines: Vec<Line<'static>> = rendered.lines.into_iter().map(convert_line).collect();
    Text::from(lines).style(convert_style(rendered.style))
}

fn convert_line(line: ratatui_core::text::Line<'_>) -> Line<'static> {
    let spans: Vec<Span<'static>> = line
        .spans
        .into_iter()
        .map(|span| Span::styled(span.content.into_owned(), convert_style(span.style)))
        .collect();
    Line::from(spans).style(convert_style(line.style))
}

fn convert_style(style: ratatui_core::style::Style) -> Style {
    let mut converted = Style::default();
    if let Some(fg) = style.fg {
        converted = converted.fg(convert_color(fg));
    }
    if let Some(bg) = style.bg {
        converted = converted.bg(convert_color(bg));
    }
    converted
        .add_modifier(Modifier::from_bits_truncate(style.add_modifier.bits()))
        .remove_modifier(Modifier::from_bits_truncate(style.sub_modifier.bits()))
}

#[allow(unreachable_patterns)]
fn convert_color(color: ratatui_core::style::Color) -> Color {
    use ratatui_core::style::Color as Core;
    match color {
        Core::Reset => Color::Reset,
        Core::Black => Color::Black,
        Core::Red => Color::Red,
        Core::Green => Color::Green,
        Core::Yellow => Color::Yellow,
        Core::Blue => Color::Blue,
        Core::Magenta => Color::Magenta,
        Core::Cyan => Color::Cyan,
        Core::Gray => Color::Gray,
        Core::DarkGray => Color::DarkGray,
        Core::LightRed => Color::LightRed,
        Core::LightGreen => Color::LightGreen,
        Core::LightYellow => Color::LightYellow,
        Core::LightBlue => Color::LightBlue,
        Core::LightMagenta => Color::LightMagenta,
        Core::LightCyan => Color::LightCyan,
        Core::White => Color::White,
        Core::Rgb(r, g, b) => Color::Rgb(r, g, b),
        Core::Indexed(index) => Color::Indexed(index),
        _ => Color::Reset,
    }
}
