use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::app::{App, PendingAction, Screen};
use super::util::{format_amount, parse_entry, parse_input_date};
use crate::config::{normalize_sheet_id, AppConfig, Backend};
use crate::finance::{parse_input_amount, DateRange};
use crate::models::{BudgetRow, Scenario, SettingKey, VERSES};
use crate::workbook::{SaveOutcome, Workbook};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Workbook) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit StewardTUI", cmd_quit, r);
    register_command!("quit", "Quit StewardTUI", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("sp", "Go to Daily Spending", cmd_spending, r);
    register_command!("spending", "Go to Daily Spending", cmd_spending, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("r", "Reload the current screen", cmd_refresh, r);
    register_command!("refresh", "Reload the current screen", cmd_refresh, r);

    // Dashboard settings
    register_command!(
        "income",
        "Set monthly income (e.g. :income 6000)",
        cmd_income,
        r
    );
    register_command!(
        "rental",
        "Set monthly rental cost (e.g. :rental 2500)",
        cmd_rental,
        r
    );
    register_command!(
        "emergency",
        "Set emergency fund balance (e.g. :emergency 4200)",
        cmd_emergency,
        r
    );
    register_command!(
        "emergency-months",
        "Set emergency fund target in months (e.g. :emergency-months 6)",
        cmd_emergency_months,
        r
    );
    register_command!(
        "mode",
        "Set dashboard mode (e.g. :mode post-rental, :mode toggle)",
        cmd_mode,
        r
    );
    register_command!("verse", "Show the next verse", cmd_verse, r);
    register_command!(
        "set",
        "Set any dashboard value (e.g. :set Tithe_Pct 10)",
        cmd_set,
        r
    );

    // Budget editor
    register_command!(
        "scenario",
        "Switch editor scenario (e.g. :scenario temporary)",
        cmd_scenario,
        r
    );
    register_command!("w", "Save budget edits", cmd_save, r);
    register_command!("save", "Save budget edits", cmd_save, r);
    register_command!("discard", "Discard budget edits", cmd_discard, r);
    register_command!(
        "add-category",
        "Add a budget category (e.g. :add-category Gifts)",
        cmd_add_category,
        r
    );

    // Daily spending
    register_command!(
        "add",
        "Log spending (e.g. :add 2024-01-15 Food 12.50 lunch)",
        cmd_add,
        r
    );
    register_command!(
        "from",
        "Filter from date (e.g. :from 2024-01-01, :from clear)",
        cmd_from,
        r
    );
    register_command!(
        "to",
        "Filter to date (e.g. :to 2024-01-31, :to clear)",
        cmd_to,
        r
    );
    register_command!(
        "cat",
        "Filter by category (e.g. :cat Food, :cat clear)",
        cmd_category_filter,
        r
    );
    register_command!(
        "month",
        "Show a whole month (e.g. :month 2024-01)",
        cmd_month,
        r
    );
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "clear-filters",
        "Month to date, all categories",
        cmd_clear_filters,
        r
    );
    register_command!(
        "export",
        "Export filtered spending to CSV (e.g. :export ~/spending.csv)",
        cmd_export,
        r
    );

    register_command!(
        "sheet",
        "Switch spreadsheet (e.g. :sheet <id or URL>)",
        cmd_sheet,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if cmd_name.is_empty() {
        return Ok(());
    }

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, wb)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ── Navigation ───────────────────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    if app.is_dirty() {
        let n = app.dirty_cells();
        app.confirm(
            PendingAction::QuitWithDraft,
            format!("Quit and lose {n} unsaved budget edit{}?", plural(n)),
        );
    } else {
        app.running = false;
    }
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh_dashboard(wb)
}

fn cmd_budgets(_args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    app.screen = Screen::Budgets;
    app.refresh_budgets(wb)
}

fn cmd_spending(_args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    app.screen = Screen::Spending;
    app.refresh_spending(wb)
}

fn cmd_help(_args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_refresh(_args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    app.refresh_current(wb)?;
    app.set_status(format!("Reloaded {}", app.screen));
    Ok(())
}

// ── Dashboard settings ───────────────────────────────────────

/// Parse a non-negative amount argument, reporting problems in the status bar.
fn amount_arg(args: &str, usage: &str, app: &mut App) -> Option<Decimal> {
    if args.is_empty() {
        app.set_status(usage.to_string());
        return None;
    }
    match parse_input_amount(args) {
        Ok(v) => Some(v),
        Err(msg) => {
            app.set_status(msg);
            None
        }
    }
}

fn save_setting(
    app: &mut App,
    wb: &mut Workbook,
    key: SettingKey,
    value: &str,
) -> anyhow::Result<()> {
    wb.set_setting(key, value)?;
    app.settings = wb.settings()?;
    Ok(())
}

fn cmd_income(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let Some(v) = amount_arg(args, "Usage: :income <amount>", app) else {
        return Ok(());
    };
    save_setting(app, wb, SettingKey::MonthlyIncome, &v.to_string())?;
    app.set_status(format!("Monthly income: {}", format_amount(v)));
    Ok(())
}

fn cmd_rental(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let Some(v) = amount_arg(args, "Usage: :rental <amount>", app) else {
        return Ok(());
    };
    save_setting(app, wb, SettingKey::RentalMonthly, &v.to_string())?;
    app.set_status(format!("Rental cost: {}", format_amount(v)));
    Ok(())
}

fn cmd_emergency(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let Some(v) = amount_arg(args, "Usage: :emergency <balance>", app) else {
        return Ok(());
    };
    save_setting(app, wb, SettingKey::EmergencyCurrent, &v.to_string())?;
    app.set_status(format!("Emergency fund: {}", format_amount(v)));
    Ok(())
}

fn cmd_emergency_months(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let Some(v) = amount_arg(args, "Usage: :emergency-months <months>", app) else {
        return Ok(());
    };
    save_setting(app, wb, SettingKey::EmergencyTargetMonths, &v.to_string())?;
    app.set_status(format!("Emergency target: {v} months"));
    Ok(())
}

fn cmd_mode(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let mode = match args.to_lowercase().as_str() {
        "" | "toggle" => app.settings.mode.toggle(),
        other => Scenario::parse(other),
    };
    save_setting(app, wb, SettingKey::Mode, mode.as_str())?;
    app.set_status(format!("Mode: {}", mode.long_name()));
    Ok(())
}

fn cmd_verse(_args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let next = (app.settings.verse_index % VERSES.len() + 1) % VERSES.len();
    save_setting(app, wb, SettingKey::VerseIndex, &next.to_string())?;
    Ok(())
}

fn cmd_set(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let keys: Vec<&str> = SettingKey::all().iter().map(|k| k.as_str()).collect();
    let Some((key, value)) = args.split_once(' ') else {
        app.set_status(format!("Usage: :set <key> <value>. Keys: {}", keys.join(", ")));
        return Ok(());
    };
    let Some(key) = SettingKey::parse(key) else {
        app.set_status(format!("Unknown key: {key}. Keys: {}", keys.join(", ")));
        return Ok(());
    };
    let value = value.trim();
    let stored = match key {
        SettingKey::Mode => Scenario::parse(value).as_str().to_string(),
        _ => match parse_input_amount(value) {
            Ok(v) => v.to_string(),
            Err(msg) => {
                app.set_status(format!("{key}: {msg}"));
                return Ok(());
            }
        },
    };
    save_setting(app, wb, key, &stored)?;
    app.set_status(format!("{key} = {stored}"));
    Ok(())
}

// ── Budget editor ────────────────────────────────────────────

fn cmd_scenario(args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    let next = match args.to_lowercase().as_str() {
        "" | "toggle" => app.scenario.toggle(),
        other => Scenario::parse(other),
    };
    if next == app.scenario {
        app.set_status(format!("Editing {}", next.long_name()));
        return Ok(());
    }
    if app.is_dirty() {
        app.set_status("Save (w) or discard (u) edits first");
        return Ok(());
    }
    app.scenario = next;
    app.set_status(format!("Editing {}", next.long_name()));
    Ok(())
}

fn cmd_save(_args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    if !app.is_dirty() {
        app.set_status("No budget edits to save");
        return Ok(());
    }
    match wb.save_budgets(app.scenario, &app.draft_base, &app.draft)? {
        SaveOutcome::Saved { cells } => {
            app.budgets = wb.budgets()?;
            app.reset_draft();
            app.set_status(format!("Saved {cells} cell{}", plural(cells)));
        }
        SaveOutcome::Conflicts(conflicts) => {
            let n = conflicts.len();
            app.conflicts = conflicts;
            app.confirm(
                PendingAction::ReloadBudgets,
                format!(
                    "{n} cell{} changed elsewhere. Nothing saved. Discard edits and reload?",
                    plural(n)
                ),
            );
        }
    }
    Ok(())
}

fn cmd_discard(_args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    if !app.is_dirty() {
        app.set_status("No budget edits to discard");
        return Ok(());
    }
    let n = app.dirty_cells();
    app.confirm(
        PendingAction::DiscardDraft,
        format!("Discard {n} unsaved budget edit{}?", plural(n)),
    );
    Ok(())
}

fn cmd_add_category(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :add-category <name>");
        return Ok(());
    }
    wb.add_category(args)?;
    app.refresh_budgets(wb)?;
    if let Some(i) = app
        .draft
        .iter()
        .position(|r| r.category.eq_ignore_ascii_case(args))
    {
        app.budget_index = i;
    }
    app.set_status(format!("Added category: {args}"));
    Ok(())
}

// ── Daily spending ───────────────────────────────────────────

fn cmd_add(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    let mut entry = match parse_entry(args, app.today) {
        Ok(e) => e,
        Err(msg) => {
            app.set_status(msg);
            return Ok(());
        }
    };
    let known = match BudgetRow::find(&app.budgets, &entry.category) {
        Some(row) => {
            entry.category = row.category.clone();
            true
        }
        None => false,
    };

    wb.append_spending(&entry)?;
    app.refresh_spending(wb)?;

    let msg = format!(
        "Logged {} to {} on {}",
        format_amount(entry.amount),
        entry.category,
        entry.date.format("%Y-%m-%d")
    );
    if known {
        app.set_status(msg);
    } else {
        app.set_status(format!("{msg} (not a budget category)"));
    }
    Ok(())
}

/// `clear` drops a date bound, anything else must parse as a date.
fn date_bound(args: &str, app: &mut App) -> Option<Option<NaiveDate>> {
    if args.eq_ignore_ascii_case("clear") {
        return Some(None);
    }
    match parse_input_date(args, app.today) {
        Some(d) => Some(Some(d)),
        None => {
            app.set_status(format!("Invalid date: {args}. Use YYYY-MM-DD"));
            None
        }
    }
}

fn cmd_from(args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    if let Some(start) = date_bound(args, app) {
        app.spending_range.start = start;
        filters_changed(app);
    }
    Ok(())
}

fn cmd_to(args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    if let Some(end) = date_bound(args, app) {
        app.spending_range.end = end;
        filters_changed(app);
    }
    Ok(())
}

fn cmd_category_filter(args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :cat <category> or :cat clear");
        return Ok(());
    }
    let category = if args.eq_ignore_ascii_case("clear") {
        None
    } else {
        Some(
            BudgetRow::find(&app.budgets, args)
                .map(|r| r.category.clone())
                .unwrap_or_else(|| args.to_string()),
        )
    };
    app.spending_category = category;
    filters_changed(app);
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    if args.is_empty() {
        app.spending_range = DateRange::month_to_date(app.today);
        filters_changed(app);
        return Ok(());
    }

    // Accept "2024-01" or a bare month number in the current year
    let month = if args.len() <= 2 {
        format!("{}-{args:0>2}", app.today.format("%Y"))
    } else {
        args.to_string()
    };
    match NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d") {
        Ok(first) => {
            app.spending_range = DateRange::month_of(first);
            filters_changed(app);
        }
        Err(_) => app.set_status("Invalid month format. Use YYYY-MM (e.g. 2024-01)"),
    }
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    app.spending_range = app.spending_range.shift_months(1, app.today);
    filters_changed(app);
    Ok(())
}

fn cmd_prev_month(_args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    app.spending_range = app.spending_range.shift_months(-1, app.today);
    filters_changed(app);
    Ok(())
}

fn cmd_clear_filters(_args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    app.spending_range = DateRange::month_to_date(app.today);
    app.spending_category = None;
    filters_changed(app);
    Ok(())
}

fn filters_changed(app: &mut App) {
    app.screen = Screen::Spending;
    app.spending_index = 0;
    app.spending_scroll = 0;
    let shown = app.filtered_spending().len();
    let category = app.spending_category.as_deref().unwrap_or("all categories");
    app.set_status(format!(
        "{} · {category} · {shown} entr{}",
        app.spending_range,
        if shown == 1 { "y" } else { "ies" }
    ));
}

fn cmd_export(args: &str, app: &mut App, _wb: &mut Workbook) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        crate::export::default_export_path(&app.spending_range)
    } else {
        crate::export::shellexpand(args)
    };
    let entries = app.filtered_spending();
    let count = crate::export::export_spending(&path, &entries)?;
    app.set_status(format!("Exported {count} entries to {}", path.display()));
    Ok(())
}

// ── Spreadsheet ──────────────────────────────────────────────

fn cmd_sheet(args: &str, app: &mut App, wb: &mut Workbook) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(format!("Using {}. Usage: :sheet <id or URL>", app.source));
        return Ok(());
    }
    if app.is_dirty() {
        app.set_status("Save (w) or discard (u) edits first");
        return Ok(());
    }

    let config = AppConfig {
        sheet_id: Some(normalize_sheet_id(args)),
        backend: Backend::Google,
        ..app.config.clone()
    };
    *wb = crate::run::ready(&config)?;

    app.config = config;
    app.source = wb.describe();
    app.refresh_all(wb)?;
    tracing::info!(source = %app.source, "switched spreadsheet");
    app.set_status(format!("Switched to {}", app.source));
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
