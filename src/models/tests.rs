#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

// ── Scenario ──────────────────────────────────────────────────

#[test]
fn test_scenario_parse() {
    assert_eq!(Scenario::parse("Temporary"), Scenario::Temporary);
    assert_eq!(Scenario::parse("temporary"), Scenario::Temporary);
    assert_eq!(Scenario::parse("Post-Rental"), Scenario::PostRental);
    assert_eq!(Scenario::parse("post"), Scenario::PostRental);
    assert_eq!(Scenario::parse(" POST RENTAL "), Scenario::PostRental);
    assert_eq!(Scenario::parse("garbage"), Scenario::Temporary);
}

#[test]
fn test_scenario_as_str_parses_back() {
    for s in Scenario::all() {
        assert_eq!(Scenario::parse(s.as_str()), *s, "failed for {s}");
    }
}

#[test]
fn test_scenario_toggle() {
    assert_eq!(Scenario::Temporary.toggle(), Scenario::PostRental);
    assert_eq!(Scenario::PostRental.toggle(), Scenario::Temporary);
}

#[test]
fn test_scenario_check_columns() {
    assert_eq!(Scenario::Temporary.check_columns()[0], "Check1_Temp");
    assert_eq!(Scenario::PostRental.check_columns()[3], "Check4_Post");
}

// ── BudgetRow ─────────────────────────────────────────────────

#[test]
fn test_budget_row_new_is_zeroed() {
    let row = BudgetRow::new("Food".into());
    assert_eq!(row.total(Scenario::Temporary), Decimal::ZERO);
    assert_eq!(row.total(Scenario::PostRental), Decimal::ZERO);
    assert!(row.monthly_target.is_none());
}

#[test]
fn test_budget_row_total_sums_four_checks() {
    let mut row = BudgetRow::new("Food".into());
    row.temporary = [dec!(100.10), dec!(200.20), dec!(50), dec!(0.05)];
    row.post_rental = [dec!(1), dec!(2), dec!(3), dec!(4)];
    assert_eq!(row.total(Scenario::Temporary), dec!(350.35));
    assert_eq!(row.total(Scenario::PostRental), dec!(10));
}

#[test]
fn test_budget_row_checks_mut_targets_scenario() {
    let mut row = BudgetRow::new("Debt".into());
    row.checks_mut(Scenario::PostRental)[2] = dec!(75);
    assert_eq!(row.post_rental[2], dec!(75));
    assert_eq!(row.temporary[2], Decimal::ZERO);
}

#[test]
fn test_budget_row_find_case_insensitive() {
    let rows = vec![BudgetRow::new("Food".into()), BudgetRow::new("Child".into())];
    assert_eq!(BudgetRow::find(&rows, "food").unwrap().category, "Food");
    assert_eq!(BudgetRow::find(&rows, " CHILD ").unwrap().category, "Child");
    assert!(BudgetRow::find(&rows, "Travel").is_none());
}

#[test]
fn test_default_categories_start_with_rollup_buckets() {
    assert_eq!(DEFAULT_CATEGORIES[0], TITHE);
    assert_eq!(DEFAULT_CATEGORIES[1], RENTAL_RESERVE);
    assert_eq!(DEFAULT_CATEGORIES[2], SAVINGS);
    assert_eq!(DEFAULT_CATEGORIES.len(), 10);
}

// ── SpendingEntry ─────────────────────────────────────────────

#[test]
fn test_spending_entry_cells() {
    let entry = SpendingEntry::new(
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        "Food".into(),
        dec!(12.50),
        "groceries".into(),
    );
    assert_eq!(entry.to_cells(), vec!["2024-03-09", "Food", "12.50", "groceries"]);
}

// ── DashboardSettings ─────────────────────────────────────────

#[test]
fn test_settings_defaults_match_seed() {
    let s = DashboardSettings::default();
    assert_eq!(s.monthly_income, Decimal::ZERO);
    assert_eq!(s.rental_monthly, dec!(2500));
    assert_eq!(s.tithe_pct, dec!(10));
    assert_eq!(s.mode, Scenario::Temporary);
    assert_eq!(s.verse_index, 0);
}

#[test]
fn test_settings_from_pairs() {
    let s = DashboardSettings::from_pairs([
        ("Monthly_Income", "$5,200.00"),
        ("Rental_Monthly", "1800"),
        ("Mode", "Post-Rental"),
        ("Verse_Index", "3"),
        ("Unrelated", "ignored"),
    ]);
    assert_eq!(s.monthly_income, dec!(5200.00));
    assert_eq!(s.rental_monthly, dec!(1800));
    assert_eq!(s.mode, Scenario::PostRental);
    assert_eq!(s.verse_index, 3);
    // Missing keys keep defaults
    assert_eq!(s.savings_pct, dec!(10));
}

#[test]
fn test_settings_repeated_key_keeps_first_row() {
    let s = DashboardSettings::from_pairs([
        ("Monthly_Income", "5000"),
        ("Mode", "Post-Rental"),
        ("Monthly_Income", "1000"),
    ]);
    assert_eq!(s.monthly_income, dec!(5000));
    assert_eq!(s.mode, Scenario::PostRental);
}

#[test]
fn test_settings_bad_verse_index_reads_zero() {
    let s = DashboardSettings::from_pairs([("Verse_Index", "-4")]);
    assert_eq!(s.verse_index, 0);
    let s = DashboardSettings::from_pairs([("Verse_Index", "2.0")]);
    assert_eq!(s.verse_index, 2);
}

#[test]
fn test_settings_seed_rows_cover_every_key() {
    let rows = DashboardSettings::seed_rows();
    assert_eq!(rows.len(), SettingKey::all().len());
    assert!(rows.contains(&vec!["Mode".to_string(), "Temporary".to_string()]));
    assert!(rows.contains(&vec!["Rental_Monthly".to_string(), "2500".to_string()]));
}

#[test]
fn test_setting_key_parse() {
    for k in SettingKey::all() {
        assert_eq!(SettingKey::parse(k.as_str()), Some(*k));
    }
    assert_eq!(SettingKey::parse("Nope"), None);
}

// ── Verses ────────────────────────────────────────────────────

#[test]
fn test_verse_at_wraps() {
    assert_eq!(verse_at(0), &VERSES[0]);
    assert_eq!(verse_at(VERSES.len()), &VERSES[0]);
    assert_eq!(verse_at(VERSES.len() + 1).reference, VERSES[1].reference);
}

#[test]
fn test_parse_date_formats() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(parse_date("2024-03-09"), Some(d));
    assert_eq!(parse_date(" 3/9/2024 "), Some(d));
    assert_eq!(parse_date("2024/03/09"), Some(d));
    assert_eq!(parse_date("2024-13-01"), None);
    assert_eq!(parse_date("today"), None);
}
