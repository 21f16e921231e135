use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::config::AppConfig;
use crate::finance::{self, goal_vs_actual, DateRange, EmergencyProgress, RentalImpact, Rollup};
use crate::models::{verse_at, BudgetRow, Scenario};
use crate::ui::util::{format_amount, format_delta, format_pct, parse_entry, parse_input_date};
use crate::workbook::Workbook;

/// Handle `help` and `version`, which need neither configuration nor a
/// workbook. Returns false for every other command.
pub(crate) fn as_builtin(args: &[String]) -> bool {
    match args.first().map(String::as_str) {
        Some("--help" | "-h" | "help") => {
            print_usage();
            true
        }
        Some("--version" | "-V" | "version") => {
            println!("stewardtui {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => false,
    }
}

pub(crate) fn as_cli(args: &[String], config: &AppConfig) -> Result<()> {
    if as_builtin(args) {
        return Ok(());
    }
    match args[0].as_str() {
        "init" => cli_init(config),
        "summary" | "s" => cli_summary(&args[1..], &mut super::ready(config)?),
        "add" => cli_add(&args[1..], &mut super::ready(config)?),
        "spending" => cli_spending(&args[1..], &mut super::ready(config)?),
        "export" => cli_export(&args[1..], &mut super::ready(config)?),
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("StewardTUI: 70/10/10/10 budgeting over a shared spreadsheet");
    println!();
    println!("Usage: stewardtui [--sheet <id>] [--local] [--config <path>] [command]");
    println!();
    println!("Commands:");
    println!("  (none)                        Launch interactive TUI");
    println!("  init                          Create and seed the worksheets");
    println!("  summary [--mode <name>]       Print the dashboard figures");
    println!("  add [date] <category> <amount> [memo]");
    println!("                                Log a spending entry (date defaults to today)");
    println!("  spending                      List spending, newest first");
    println!("    --from <date> --to <date>   Date range (default: this month to date)");
    println!("    --category <name>           Only one category");
    println!("    --month <YYYY-MM>           A whole month");
    println!("  export [path|-]               Export spending to CSV (same filters)");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Options:");
    println!("  --sheet <id or URL>           Spreadsheet to use (or STEWARD_SHEET_ID)");
    println!("  --local                       Use the local workbook instead of Google Sheets");
    println!("  --config <path>               Config file (default: config.toml in the config dir)");
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn cli_init(config: &AppConfig) -> Result<()> {
    let mut wb = super::open_workbook(config)?;
    let report = wb.init()?;
    if report.is_noop() {
        println!("{} is already set up", wb.describe());
        return Ok(());
    }
    for title in &report.created {
        println!("Created worksheet {title}");
    }
    for title in &report.seeded {
        println!("Seeded {title}");
    }
    Ok(())
}

fn cli_summary(args: &[String], wb: &mut Workbook) -> Result<()> {
    let settings = wb.settings()?;
    let budgets = wb.budgets()?;
    let spending = wb.spending()?;
    let today = Local::now().date_naive();

    let mode = flag(args, "--mode").map_or(settings.mode, Scenario::parse);
    let income = settings.monthly_income;
    let rollup = Rollup::from_budgets(&budgets, mode);
    let verse = verse_at(settings.verse_index);

    println!("StewardTUI: {}", mode.long_name());
    println!("{}", "─".repeat(56));
    println!("  \u{201c}{}\u{201d} {}", verse.text, verse.reference);
    println!();
    println!("  Income:          {:>14}", format_amount(income));
    println!("  Tithe:           {:>14}", format_amount(rollup.tithe));
    println!("  Rental Reserve:  {:>14}", format_amount(rollup.rental_reserve));
    println!("  Savings:         {:>14}", format_amount(rollup.savings));
    println!("  Living:          {:>14}", format_amount(rollup.living));

    println!();
    println!("70/10/10/10 Goal vs Budget:");
    for g in goal_vs_actual(income, mode, &rollup) {
        println!(
            "  {:<10} goal {:>12}  budget {:>12}  {:>12}",
            g.bucket.as_str(),
            format_amount(g.goal),
            format_amount(g.actual),
            format_delta(g.delta)
        );
    }

    println!();
    println!("Budget by Category ({mode}):");
    for (name, total) in finance::scenario_totals(&budgets, mode) {
        println!("  {name:<24} {:>12}", format_amount(total));
    }

    let rental = RentalImpact::new(income, settings.rental_monthly);
    let emergency = EmergencyProgress::new(
        settings.emergency_target_months,
        rollup.living,
        settings.emergency_current,
    );
    println!();
    println!(
        "  Rental:     {} is {} of income, {} left",
        format_amount(settings.rental_monthly),
        format_pct(rental.pct_of_income),
        format_amount(rental.income_after_rental)
    );
    println!(
        "  Emergency:  {} of {} ({:.0}%)",
        format_amount(emergency.current),
        format_amount(emergency.target),
        emergency.ratio * 100.0
    );

    let range = DateRange::month_to_date(today);
    let actuals = finance::spending_by_category(spending.iter().filter(|e| range.contains(e.date)));
    if !actuals.is_empty() {
        println!();
        println!("Spent This Month:");
        for (name, amount) in &actuals {
            println!("  {name:<24} {:>12}", format_amount(*amount));
        }
    }

    Ok(())
}

fn cli_add(args: &[String], wb: &mut Workbook) -> Result<()> {
    let today = Local::now().date_naive();
    let mut entry = parse_entry(&args.join(" "), today).map_err(anyhow::Error::msg)?;

    let budgets = wb.budgets()?;
    match BudgetRow::find(&budgets, &entry.category) {
        Some(row) => entry.category = row.category.clone(),
        None => eprintln!("Warning: '{}' is not a budget category", entry.category),
    }

    wb.append_spending(&entry)?;
    println!(
        "Logged {} to {} on {}",
        format_amount(entry.amount),
        entry.category,
        entry.date.format("%Y-%m-%d")
    );
    Ok(())
}

/// Date range and category from `--from/--to/--month/--category`.
fn filters(args: &[String], today: NaiveDate) -> Result<(DateRange, Option<String>)> {
    let date = |name: &str| -> Result<Option<NaiveDate>> {
        flag(args, name)
            .map(|s| {
                parse_input_date(s, today).with_context(|| format!("Invalid date for {name}: {s}"))
            })
            .transpose()
    };

    let range = match flag(args, "--month") {
        Some(month) => {
            let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
                .with_context(|| format!("Invalid month: {month}. Use YYYY-MM"))?;
            DateRange::month_of(first)
        }
        None => {
            let (from, to) = (date("--from")?, date("--to")?);
            if from.is_none() && to.is_none() {
                DateRange::month_to_date(today)
            } else {
                DateRange::new(from, to)
            }
        }
    };
    Ok((range, flag(args, "--category").map(str::to_string)))
}

fn cli_spending(args: &[String], wb: &mut Workbook) -> Result<()> {
    let today = Local::now().date_naive();
    let (range, category) = filters(args, today)?;
    let all = wb.spending()?;
    let budgets = wb.budgets()?;

    let mut entries = finance::filter_spending(&all, &range, category.as_deref());
    finance::sort_newest_first(&mut entries);

    println!("Spending {range}");
    println!("{}", "─".repeat(64));
    if entries.is_empty() {
        println!("  No entries");
        return Ok(());
    }
    for e in &entries {
        println!(
            "  {} {:<22} {:>12}  {}",
            e.date.format("%Y-%m-%d"),
            e.category,
            format_amount(e.amount),
            e.memo
        );
    }

    println!();
    println!("vs Temporary Budget:");
    for d in finance::actual_vs_budget(entries.iter().copied(), &budgets, Scenario::Temporary) {
        println!(
            "  {:<22} {:>12} {:>12} {:>12}{}",
            d.category,
            format_amount(d.actual),
            format_amount(d.budget),
            format_delta(d.delta),
            if d.known { "" } else { "  (not budgeted)" }
        );
    }
    Ok(())
}

fn cli_export(args: &[String], wb: &mut Workbook) -> Result<()> {
    let today = Local::now().date_naive();
    let (range, category) = filters(args, today)?;
    let all = wb.spending()?;
    let mut entries = finance::filter_spending(&all, &range, category.as_deref());
    finance::sort_newest_first(&mut entries);

    match positional(args).first().copied() {
        Some("-") => {
            crate::export::write_spending(std::io::stdout().lock(), &entries)?;
        }
        target => {
            let path = target
                .map(crate::export::shellexpand)
                .unwrap_or_else(|| crate::export::default_export_path(&range));
            let count = crate::export::export_spending(&path, &entries)?;
            if count == 0 {
                println!("No spending in {range}");
            } else {
                println!("Exported {count} entries to {}", path.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn args(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builtins_only_help_and_version() {
        assert!(as_builtin(&args(&["help"])));
        assert!(as_builtin(&args(&["-V"])));
        assert!(!as_builtin(&args(&["summary"])));
        assert!(!as_builtin(&[]));
    }

    #[test]
    fn test_positional_skips_flag_values() {
        let a = args(&["--from", "2024-01-01", "out.csv", "--category", "Food"]);
        assert_eq!(positional(&a), vec!["out.csv"]);
    }

    #[test]
    fn test_filters_default_month_to_date() {
        let (range, cat) = filters(&[], day(2024, 3, 9)).unwrap();
        assert_eq!(range, DateRange::month_to_date(day(2024, 3, 9)));
        assert_eq!(cat, None);
    }

    #[test]
    fn test_filters_open_bound() {
        let (range, cat) =
            filters(&args(&["--from", "2024-01-15", "--category", "Food"]), day(2024, 3, 9))
                .unwrap();
        assert_eq!(range, DateRange::new(Some(day(2024, 1, 15)), None));
        assert_eq!(cat.as_deref(), Some("Food"));
    }

    #[test]
    fn test_filters_month() {
        let (range, _) = filters(&args(&["--month", "2024-02"]), day(2024, 3, 9)).unwrap();
        assert_eq!(range, DateRange::new(Some(day(2024, 2, 1)), Some(day(2024, 2, 29))));
        assert!(filters(&args(&["--month", "Feb"]), day(2024, 3, 9)).is_err());
        assert!(filters(&args(&["--to", "whenever"]), day(2024, 3, 9)).is_err());
    }
}
