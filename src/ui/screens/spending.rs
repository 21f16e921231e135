use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::Decimal;

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_delta, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let entries = app.filtered_spending();
    let total: Decimal = entries.iter().map(|e| e.amount).sum();

    let category = app.spending_category.as_deref().unwrap_or("All categories");
    let filters = Paragraph::new(Line::from(vec![
        Span::styled(" Dates ", theme::dim_style()),
        Span::styled(app.spending_range.to_string(), theme::normal_style()),
        Span::styled("   Category ", theme::dim_style()),
        Span::styled(category.to_string(), theme::normal_style()),
        Span::styled("   Total ", theme::dim_style()),
        Span::styled(
            format_amount(total),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ({} entr{})", entries.len(), if entries.len() == 1 { "y" } else { "ies" }),
            theme::dim_style(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(" Filters (:from :to :cat :month) ", theme::title_style())),
    );
    f.render_widget(filters, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(chunks[1]);

    render_entries(f, body[0], app);
    render_deltas(f, body[1], app);
}

fn render_entries(f: &mut Frame, area: Rect, app: &App) {
    let entries = app.filtered_spending();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(" Daily Spending ", theme::title_style()));

    if entries.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No spending in this range", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Log some with :add <category> <amount> [memo]",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let memo_width = (area.width as usize).saturating_sub(2 + 11 + 21 + 13).max(4);
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .skip(app.spending_scroll)
        .take(area.height.saturating_sub(2) as usize)
        .map(|(i, entry)| {
            let style = if i == app.spending_index {
                theme::selected_style()
            } else if i % 2 == 0 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", entry.date.format("%Y-%m-%d")), style),
                Span::styled(format!("{:<20} ", truncate(&entry.category, 20)), style),
                Span::styled(format!("{:>12} ", format_amount(entry.amount)), style),
                Span::styled(truncate(&entry.memo, memo_width), style),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn render_deltas(f: &mut Frame, area: Rect, app: &App) {
    let deltas = app.spending_deltas();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(" vs Temporary Budget ", theme::title_style()));

    let mut lines = vec![Line::from(Span::styled(
        format!("{:<18}{:>11}{:>11}{:>12}", "Category", "Spent", "Budget", "Delta"),
        theme::header_style(),
    ))];
    lines.extend(deltas.iter().map(|d| {
        let name_style = if d.known {
            theme::normal_style()
        } else {
            theme::dim_style().add_modifier(Modifier::ITALIC)
        };
        Line::from(vec![
            Span::styled(format!("{:<18}", truncate(&d.category, 17)), name_style),
            Span::styled(format!("{:>11}", format_amount(d.actual)), theme::normal_style()),
            Span::styled(format!("{:>11}", format_amount(d.budget)), theme::dim_style()),
            Span::styled(format!("{:>12}", format_delta(d.delta)), theme::delta_style(d.delta)),
        ])
    }));

    f.render_widget(Paragraph::new(lines).block(block), area);
}
