use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::Decimal;

use crate::ui::app::{App, TARGET_COLUMN};
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.draft.is_empty() {
        render_empty(f, area);
        return;
    }

    if app.conflicts.is_empty() {
        render_table(f, area, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length((app.conflicts.len() as u16 + 2).min(10)),
        ])
        .split(area);
    render_table(f, chunks[0], app);
    render_conflicts(f, chunks[1], app);
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let scenario = app.scenario;
    let mut header: Vec<Cell> = vec![Cell::from("Category")];
    header.extend(
        scenario
            .check_columns()
            .iter()
            .map(|c| Cell::from(format!("{c:>12}"))),
    );
    header.push(Cell::from(format!("{:>12}", "Total")));
    header.push(Cell::from(format!("{:>14}", "Monthly_Target")));

    // Header, totals row and borders
    let page = area.height.saturating_sub(4) as usize;
    let rows: Vec<Row> = app
        .draft
        .iter()
        .enumerate()
        .skip(app.budget_scroll)
        .take(page)
        .map(|(i, row)| {
            let base = app.draft_base.get(i);
            let selected = i == app.budget_index;
            let row_style = if selected {
                theme::alt_row_style().add_modifier(Modifier::BOLD)
            } else {
                theme::normal_style()
            };

            let cell_style = |column: usize, changed: bool| {
                if selected && column == app.budget_column {
                    theme::cursor_style()
                } else if changed {
                    theme::edited_style()
                } else {
                    row_style
                }
            };

            let mut cells = vec![Cell::from(truncate(&row.category, 22)).style(row_style)];
            for (col, value) in row.checks(scenario).iter().enumerate() {
                let changed = base.is_some_and(|b| b.checks(scenario)[col] != *value);
                cells.push(
                    Cell::from(format!("{:>12}", format_amount(*value)))
                        .style(cell_style(col, changed)),
                );
            }
            cells.push(
                Cell::from(format!("{:>12}", format_amount(row.total(scenario))))
                    .style(row_style.fg(theme::ACCENT)),
            );
            let target = row
                .monthly_target
                .map(format_amount)
                .unwrap_or_else(|| "-".into());
            let changed = base.is_some_and(|b| b.monthly_target != row.monthly_target);
            cells.push(
                Cell::from(format!("{target:>14}")).style(cell_style(TARGET_COLUMN, changed)),
            );
            Row::new(cells)
        })
        .collect();

    let mut totals: Vec<Cell> = vec![Cell::from("Total")];
    for col in 0..4 {
        let sum: Decimal = app.draft.iter().map(|r| r.checks(scenario)[col]).sum();
        totals.push(Cell::from(format!("{:>12}", format_amount(sum))));
    }
    let grand: Decimal = app.draft.iter().map(|r| r.total(scenario)).sum();
    totals.push(Cell::from(format!("{:>12}", format_amount(grand))));
    totals.push(Cell::from(""));

    let mut all_rows = rows;
    all_rows.push(Row::new(totals).style(theme::header_style()));

    let mut widths = vec![Constraint::Min(16)];
    widths.extend([Constraint::Length(12); 5]);
    widths.push(Constraint::Length(14));

    let dirty = app.dirty_cells();
    let title = if dirty > 0 {
        format!(" {} · {dirty} unsaved ", scenario.long_name())
    } else {
        format!(" {} ", scenario.long_name())
    };

    let table = Table::new(all_rows, widths)
        .header(Row::new(header).style(theme::header_style()))
        .column_spacing(1)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if dirty > 0 {
                    theme::PEACH
                } else {
                    theme::OVERLAY
                }))
                .title(Span::styled(title, theme::title_style())),
        );
    f.render_widget(table, area);
}

fn render_conflicts(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app
        .conflicts
        .iter()
        .map(|c| Line::from(Span::styled(format!(" {c}"), Style::default().fg(theme::RED))))
        .collect();
    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::RED))
            .title(Span::styled(
                " Changed elsewhere (nothing saved) ",
                Style::default().fg(theme::RED).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(list, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("No budget categories yet", theme::dim_style())),
        Line::from(""),
        Line::from(Span::styled(
            "Use :add-category <name> to add one",
            theme::dim_style(),
        )),
    ])
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(" Budgets ", theme::title_style())),
    );
    f.render_widget(msg, area);
}
