use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::finance::{goal_vs_actual, percent_of, Bucket, EmergencyProgress, RentalImpact};
use crate::models::verse_at;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_delta, format_pct, progress_bar, ratio, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Verse
            Constraint::Length(5), // KPI cards
            Constraint::Min(10),   // Body
        ])
        .split(area);

    render_verse(f, chunks[0], app);
    render_cards(f, chunks[1], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(chunks[2]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(6)])
        .split(body[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(9),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(body[1]);

    render_goals(f, left[0], app);
    render_month_actuals(f, left[1], app);
    render_settings(f, right[0], app);
    render_rental_gauge(f, right[1], app);
    render_emergency_gauge(f, right[2], app);
}

fn titled(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(format!(" {title} "), theme::title_style()))
}

fn render_verse(f: &mut Frame, area: Rect, app: &App) {
    let verse = verse_at(app.settings.verse_index);
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("\u{201c}{}\u{201d}", verse.text),
            Style::default()
                .fg(theme::MAUVE)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::from(Span::styled(format!("  {}", verse.reference), theme::dim_style())),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(theme::OVERLAY)),
    );
    f.render_widget(text, area);
}

fn render_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(area);

    let income = app.settings.monthly_income;
    let rollup = app.rollup();
    let share = |amount: Decimal| {
        if income.is_zero() {
            String::from("of income: n/a")
        } else {
            format!("{} of income", format_pct(percent_of(amount, income)))
        }
    };

    render_card(
        f,
        cards[0],
        "Income",
        income,
        theme::GREEN,
        format!("budgeted {}", format_amount(rollup.total())),
    );
    render_card(
        f,
        cards[1],
        "Tithe",
        rollup.tithe,
        theme::MAUVE,
        share(rollup.tithe),
    );
    render_card(
        f,
        cards[2],
        "Rental Reserve",
        rollup.rental_reserve,
        theme::PEACH,
        share(rollup.rental_reserve),
    );
    render_card(
        f,
        cards[3],
        "Savings",
        rollup.savings,
        theme::TEAL,
        share(rollup.savings),
    );
    render_card(
        f,
        cards[4],
        "Living",
        rollup.living,
        theme::ACCENT,
        share(rollup.living),
    );
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    amount: Decimal,
    color: Color,
    subtitle: String,
) {
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            format_amount(amount),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(titled(title));
    f.render_widget(text, area);
}

fn render_goals(f: &mut Frame, area: Rect, app: &App) {
    let goals = goal_vs_actual(app.settings.monthly_income, app.settings.mode, &app.rollup());
    let lines: Vec<Line> = goals
        .iter()
        .map(|g| {
            let r = ratio(g.actual, g.goal);
            // Living above its goal is overspending; the other buckets should reach theirs
            let delta_style = match g.bucket {
                Bucket::Living => theme::delta_style(g.delta),
                _ => theme::delta_style(-g.delta),
            };
            Line::from(vec![
                Span::styled(format!("{:<10}", g.bucket.as_str()), theme::normal_style()),
                Span::styled(
                    format!("{:>12} ", format_amount(g.goal)),
                    theme::dim_style(),
                ),
                Span::styled(
                    format!("{:>12} ", format_amount(g.actual)),
                    theme::normal_style(),
                ),
                Span::styled(progress_bar(r, 12), Style::default().fg(theme::progress_color(r))),
                Span::styled(
                    format!(" {:>12}", format_delta(g.delta)),
                    delta_style,
                ),
            ])
        })
        .collect();

    let title = format!("70/10/10/10 Goal vs Budget ({})", app.settings.mode);
    f.render_widget(Paragraph::new(lines).block(titled(&title)), area);
}

fn render_month_actuals(f: &mut Frame, area: Rect, app: &App) {
    let actuals = app.month_actuals();
    let title = format!("Spent This Month ({})", app.today.format("%B %Y"));

    if actuals.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "Nothing logged this month. Add spending with :add",
            theme::dim_style(),
        )))
        .centered()
        .block(titled(&title));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = actuals
        .iter()
        .take(12)
        .map(|(name, amt)| {
            Bar::default()
                .value(amt.round().to_u64().unwrap_or(0))
                .label(Line::from(truncate(name, 10)))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(titled(&title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(Style::default().fg(theme::TEXT));
    f.render_widget(chart, area);
}

fn render_settings(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.settings;
    let row = |label: &str, value: String, hint: &str| {
        Line::from(vec![
            Span::styled(format!(" {label:<20}"), theme::dim_style()),
            Span::styled(format!("{value:<14}"), theme::normal_style()),
            Span::styled(hint.to_string(), Style::default().fg(theme::OVERLAY)),
        ])
    };

    let lines = vec![
        row("Monthly income", format_amount(s.monthly_income), ":income"),
        row("Rental cost", format_amount(s.rental_monthly), ":rental"),
        row("Tithe", format_pct(s.tithe_pct), ":set Tithe_Pct"),
        row("Savings", format_pct(s.savings_pct), ":set Savings_Pct"),
        row(
            "Emergency target",
            format!("{} months", s.emergency_target_months.normalize()),
            ":emergency-months",
        ),
        row("Emergency fund", format_amount(s.emergency_current), ":emergency"),
        row("Mode", s.mode.long_name().to_string(), "m / :mode"),
    ];
    f.render_widget(Paragraph::new(lines).block(titled("Settings")), area);
}

fn render_rental_gauge(f: &mut Frame, area: Rect, app: &App) {
    let impact = RentalImpact::new(app.settings.monthly_income, app.settings.rental_monthly);
    let label = format!(
        "{} of income · {} left",
        format_pct(impact.pct_of_income),
        format_amount(impact.income_after_rental)
    );
    let gauge = Gauge::default()
        .block(titled("Rental Impact"))
        .gauge_style(
            Style::default()
                .fg(theme::usage_color(impact.ratio))
                .bg(theme::SURFACE),
        )
        .ratio(impact.ratio)
        .label(Span::styled(label, Style::default().fg(theme::TEXT)));
    f.render_widget(gauge, area);
}

fn render_emergency_gauge(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.settings;
    let progress = EmergencyProgress::new(
        s.emergency_target_months,
        app.rollup().living,
        s.emergency_current,
    );
    let label = format!(
        "{} of {}",
        format_amount(progress.current),
        format_amount(progress.target)
    );
    let gauge = Gauge::default()
        .block(titled("Emergency Fund"))
        .gauge_style(
            Style::default()
                .fg(theme::progress_color(progress.ratio))
                .bg(theme::SURFACE),
        )
        .ratio(progress.ratio)
        .label(Span::styled(label, Style::default().fg(theme::TEXT)));
    f.render_widget(gauge, area);
}
