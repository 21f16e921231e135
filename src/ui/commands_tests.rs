#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use super::app::{App, InputMode, PendingAction, Screen, TARGET_COLUMN};
use super::commands::handle_command;
use crate::config::{AppConfig, Backend};
use crate::finance::DateRange;
use crate::models::{BudgetRow, Scenario, SettingKey, VERSES};
use crate::store::{A1Range, LocalWorkbook, SheetStore};
use crate::workbook::{Workbook, BUDGETS};

fn config() -> AppConfig {
    AppConfig {
        sheet_id: None,
        backend: Backend::Local,
        credentials_path: PathBuf::from("service_account.json"),
        token_cache_path: PathBuf::from("token.json"),
        local_path: PathBuf::from("workbook.db"),
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> (App, Workbook) {
    let mut wb = Workbook::new(Box::new(LocalWorkbook::open_in_memory().unwrap()));
    wb.init().unwrap();
    let mut app = App::new(config(), wb.describe());
    app.today = day(2024, 3, 9);
    app.spending_range = DateRange::month_to_date(app.today);
    app.refresh_all(&mut wb).unwrap();
    (app, wb)
}

/// App and workbook on a file, plus a second handle on the same file.
fn setup_shared() -> (TempDir, App, Workbook, LocalWorkbook) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.db");
    let mut wb = Workbook::new(Box::new(LocalWorkbook::open(&path).unwrap()));
    wb.init().unwrap();
    let mut app = App::new(config(), wb.describe());
    app.refresh_all(&mut wb).unwrap();
    let other = LocalWorkbook::open(&path).unwrap();
    (dir, app, wb, other)
}

fn select(app: &mut App, category: &str, column: usize) {
    app.budget_index = app
        .draft
        .iter()
        .position(|r| r.category == category)
        .unwrap();
    app.budget_column = column;
}

// ── Registry ──────────────────────────────────────────────────

#[test]
fn test_unknown_command_suggests() {
    let (mut app, mut wb) = setup();
    handle_command("incme 5", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "Unknown command: :incme. Did you mean :income?");
}

#[test]
fn test_screen_commands() {
    let (mut app, mut wb) = setup();
    handle_command("sp", &mut app, &mut wb).unwrap();
    assert_eq!(app.screen, Screen::Spending);
    handle_command("budgets", &mut app, &mut wb).unwrap();
    assert_eq!(app.screen, Screen::Budgets);
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn test_income_saved_immediately() {
    let (mut app, mut wb) = setup();
    handle_command("income $6,000", &mut app, &mut wb).unwrap();
    assert_eq!(app.settings.monthly_income, dec!(6000));
    assert_eq!(wb.settings().unwrap().monthly_income, dec!(6000));
}

#[test]
fn test_setting_rejects_negative() {
    let (mut app, mut wb) = setup();
    handle_command("rental -5", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "Amount must be zero or more");
    assert_eq!(wb.settings().unwrap().rental_monthly, dec!(2500));
}

#[test]
fn test_mode_toggle_and_verse() {
    let (mut app, mut wb) = setup();
    handle_command("mode", &mut app, &mut wb).unwrap();
    assert_eq!(wb.settings().unwrap().mode, Scenario::PostRental);
    handle_command("verse", &mut app, &mut wb).unwrap();
    handle_command("verse", &mut app, &mut wb).unwrap();
    assert_eq!(wb.settings().unwrap().verse_index, 2);
}

#[test]
fn test_verse_wraps_from_any_stored_index() {
    let (mut app, mut wb) = setup();
    wb.set_setting(SettingKey::VerseIndex, &usize::MAX.to_string())
        .unwrap();
    app.refresh_all(&mut wb).unwrap();
    assert_eq!(app.settings.verse_index, usize::MAX);

    handle_command("verse", &mut app, &mut wb).unwrap();
    let expected = (usize::MAX % VERSES.len() + 1) % VERSES.len();
    assert_eq!(wb.settings().unwrap().verse_index, expected);
}

#[test]
fn test_amounts_above_limit_rejected() {
    let (mut app, mut wb) = setup();
    handle_command("income 1e27", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "Amount must be at most 1000000000000");
    assert_eq!(wb.settings().unwrap().monthly_income, Decimal::ZERO);

    handle_command("set Emergency_Current 2000000000000", &mut app, &mut wb).unwrap();
    assert!(app.status_message.starts_with("Emergency_Current: Amount must be at most"));

    handle_command("add Food 5000000000000", &mut app, &mut wb).unwrap();
    assert!(wb.spending().unwrap().is_empty());
}

#[test]
fn test_set_by_key() {
    let (mut app, mut wb) = setup();
    handle_command("set Tithe_Pct 12", &mut app, &mut wb).unwrap();
    assert_eq!(wb.settings().unwrap().tithe_pct, dec!(12));
    handle_command("set Bogus 1", &mut app, &mut wb).unwrap();
    assert!(app.status_message.starts_with("Unknown key: Bogus"));
    assert_eq!(
        app.settings.value_of(SettingKey::TithePct),
        wb.settings().unwrap().value_of(SettingKey::TithePct)
    );
}

// ── Budget editor ─────────────────────────────────────────────

#[test]
fn test_edit_then_save() {
    let (mut app, mut wb) = setup();
    select(&mut app, "Food", 1);
    assert!(app.set_selected_cell(Some(dec!(150))));
    select(&mut app, "Food", TARGET_COLUMN);
    assert!(app.set_selected_cell(Some(dec!(600))));
    assert_eq!(app.dirty_cells(), 2);

    handle_command("w", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "Saved 2 cells");
    assert!(!app.is_dirty());

    let food = BudgetRow::find(&wb.budgets().unwrap(), "Food").unwrap().clone();
    assert_eq!(food.temporary[1], dec!(150));
    assert_eq!(food.monthly_target, Some(dec!(600)));
}

#[test]
fn test_save_without_edits() {
    let (mut app, mut wb) = setup();
    handle_command("save", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "No budget edits to save");
}

#[test]
fn test_scenario_switch_refused_while_dirty() {
    let (mut app, mut wb) = setup();
    select(&mut app, "Food", 0);
    app.set_selected_cell(Some(dec!(10)));
    handle_command("scenario post-rental", &mut app, &mut wb).unwrap();
    assert_eq!(app.scenario, Scenario::Temporary);
    assert_eq!(app.status_message, "Save (w) or discard (u) edits first");

    app.reset_draft();
    handle_command("scenario post-rental", &mut app, &mut wb).unwrap();
    assert_eq!(app.scenario, Scenario::PostRental);
}

#[test]
fn test_conflicting_save_asks_to_reload() {
    let (_dir, mut app, mut wb, mut other) = setup_shared();
    select(&mut app, "Food", 1);
    app.set_selected_cell(Some(dec!(150)));

    // Food is sheet row 4; Check2_Temp is column 2
    other
        .update(&A1Range::cell(BUDGETS, 4, 2), &[vec!["75".to_string()]])
        .unwrap();

    handle_command("w", &mut app, &mut wb).unwrap();
    assert_eq!(app.input_mode, InputMode::Confirm);
    assert_eq!(app.pending_action, Some(PendingAction::ReloadBudgets));
    assert_eq!(app.conflicts.len(), 1);
    assert_eq!(app.conflicts[0].to_string(), "Food Check2_Temp: was 0, now 75");
    assert!(app.is_dirty());

    let food = BudgetRow::find(&wb.budgets().unwrap(), "Food").unwrap().clone();
    assert_eq!(food.temporary[1], dec!(75));
}

#[test]
fn test_add_category_keeps_draft() {
    let (mut app, mut wb) = setup();
    select(&mut app, "Food", 0);
    app.set_selected_cell(Some(dec!(20)));
    handle_command("add-category Gifts", &mut app, &mut wb).unwrap();
    assert!(app.is_dirty());
    assert_eq!(app.draft.last().unwrap().category, "Gifts");
    assert_eq!(app.draft[app.budget_index].category, "Gifts");

    handle_command("add-category gifts", &mut app, &mut wb).unwrap_err();
}

#[test]
fn test_discard_and_quit_confirm() {
    let (mut app, mut wb) = setup();
    handle_command("q", &mut app, &mut wb).unwrap();
    assert!(!app.running);

    let (mut app, mut wb) = setup();
    select(&mut app, "Food", 0);
    app.set_selected_cell(Some(dec!(20)));
    handle_command("q", &mut app, &mut wb).unwrap();
    assert!(app.running);
    assert_eq!(app.pending_action, Some(PendingAction::QuitWithDraft));

    handle_command("discard", &mut app, &mut wb).unwrap();
    assert_eq!(app.pending_action, Some(PendingAction::DiscardDraft));
}

// ── Daily spending ────────────────────────────────────────────

#[test]
fn test_add_uses_sheet_category_name() {
    let (mut app, mut wb) = setup();
    handle_command("add 2024-03-02 food 12.50 tacos", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "Logged $12.50 to Food on 2024-03-02");

    let logged = wb.spending().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].category, "Food");
    assert_eq!(logged[0].memo, "tacos");
    assert_eq!(app.filtered_spending().len(), 1);
}

#[test]
fn test_add_unknown_category_warns() {
    let (mut app, mut wb) = setup();
    handle_command("add Pets 30", &mut app, &mut wb).unwrap();
    assert!(app.status_message.ends_with("(not a budget category)"));
    assert_eq!(wb.spending().unwrap()[0].date, app.today);
}

#[test]
fn test_add_rejects_negative() {
    let (mut app, mut wb) = setup();
    handle_command("add Food -3", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "Amount must be zero or more");
    assert!(wb.spending().unwrap().is_empty());
}

#[test]
fn test_filter_commands() {
    let (mut app, mut wb) = setup();
    handle_command("add 2024-02-10 Food 5", &mut app, &mut wb).unwrap();
    handle_command("add 2024-03-01 Food 7", &mut app, &mut wb).unwrap();
    handle_command("add 2024-03-02 Debt 9", &mut app, &mut wb).unwrap();
    assert_eq!(app.filtered_spending().len(), 2);

    handle_command("prev-month", &mut app, &mut wb).unwrap();
    assert_eq!(app.spending_range, DateRange::new(Some(day(2024, 2, 1)), Some(day(2024, 2, 29))));
    assert_eq!(app.filtered_spending().len(), 1);

    handle_command("from clear", &mut app, &mut wb).unwrap();
    handle_command("to clear", &mut app, &mut wb).unwrap();
    handle_command("cat food", &mut app, &mut wb).unwrap();
    assert_eq!(app.spending_category.as_deref(), Some("Food"));
    let amounts: Vec<_> = app.filtered_spending().iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![dec!(7), dec!(5)]);

    handle_command("clear-filters", &mut app, &mut wb).unwrap();
    assert_eq!(app.spending_range, DateRange::month_to_date(app.today));
    assert_eq!(app.spending_category, None);
}

#[test]
fn test_export_filtered() {
    let (mut app, mut wb) = setup();
    handle_command("add 2024-03-01 Food 7", &mut app, &mut wb).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    handle_command(&format!("export {}", path.display()), &mut app, &mut wb).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Date,Category,Amount,Memo"));
    assert!(text.contains("2024-03-01,Food,7,"));
}

#[test]
fn test_sheet_refused_while_dirty() {
    let (mut app, mut wb) = setup();
    select(&mut app, "Food", 0);
    app.set_selected_cell(Some(dec!(20)));
    handle_command("sheet abc", &mut app, &mut wb).unwrap();
    assert_eq!(app.status_message, "Save (w) or discard (u) edits first");
    assert_eq!(app.config.backend, Backend::Local);
}
