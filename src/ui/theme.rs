use ratatui::style::{Color, Modifier, Style};
use rust_decimal::Decimal;

pub(crate) const HEADER_BG: Color = Color::Rgb(30, 30, 46);
pub(crate) const HEADER_FG: Color = Color::Rgb(205, 214, 244);
pub(crate) const ACCENT: Color = Color::Rgb(137, 180, 250);
pub(crate) const GREEN: Color = Color::Rgb(166, 227, 161);
pub(crate) const RED: Color = Color::Rgb(243, 139, 168);
pub(crate) const YELLOW: Color = Color::Rgb(249, 226, 175);
pub(crate) const MAUVE: Color = Color::Rgb(203, 166, 247);
pub(crate) const PEACH: Color = Color::Rgb(250, 179, 135);
pub(crate) const TEAL: Color = Color::Rgb(148, 226, 213);
pub(crate) const SURFACE: Color = Color::Rgb(49, 50, 68);
pub(crate) const TEXT: Color = Color::Rgb(205, 214, 244);
pub(crate) const TEXT_DIM: Color = Color::Rgb(127, 132, 156);
pub(crate) const OVERLAY: Color = Color::Rgb(69, 71, 90);
pub(crate) const COMMAND_BG: Color = Color::Rgb(24, 24, 37);

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(HEADER_FG)
        .bg(HEADER_BG)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn selected_style() -> Style {
    Style::default().fg(HEADER_BG).bg(ACCENT)
}

/// The cell under the editor cursor.
pub(crate) fn cursor_style() -> Style {
    Style::default()
        .fg(HEADER_BG)
        .bg(YELLOW)
        .add_modifier(Modifier::BOLD)
}

/// Draft cells that differ from what was loaded.
pub(crate) fn edited_style() -> Style {
    Style::default().fg(PEACH).add_modifier(Modifier::ITALIC)
}

pub(crate) fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub(crate) fn dim_style() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub(crate) fn title_style() -> Style {
    Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD)
}

pub(crate) fn alt_row_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub(crate) fn command_bar_style() -> Style {
    Style::default().fg(TEXT).bg(COMMAND_BG)
}

pub(crate) fn status_bar_style() -> Style {
    Style::default().fg(TEXT_DIM).bg(SURFACE)
}

/// Spending deltas: over budget is red, at or under is green.
pub(crate) fn delta_style(delta: Decimal) -> Style {
    if delta > Decimal::ZERO {
        Style::default().fg(RED)
    } else {
        Style::default().fg(GREEN)
    }
}

/// Gauge colour for how much of a limit is used up.
pub(crate) fn usage_color(ratio: f64) -> Color {
    if ratio > 0.9 {
        RED
    } else if ratio > 0.7 {
        YELLOW
    } else {
        GREEN
    }
}

/// Gauge colour for progress towards a goal.
pub(crate) fn progress_color(ratio: f64) -> Color {
    if ratio >= 1.0 {
        GREEN
    } else if ratio >= 0.5 {
        TEAL
    } else {
        YELLOW
    }
}
