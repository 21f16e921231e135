use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;

use crate::finance::parse_amount;
use crate::models::*;
use crate::store::{A1Range, SheetStore};

pub(crate) const BUDGETS: &str = "Budgets";
pub(crate) const DAILY_SPENDING: &str = "Daily_Spending";
pub(crate) const DASHBOARD_DATA: &str = "Dashboard_Data";

const CATEGORY: &str = "Category";
const MONTHLY_TARGET: &str = "Monthly_Target";

const BUDGET_HEADERS: &[&str] = &[
    CATEGORY,
    "Check1_Temp",
    "Check2_Temp",
    "Check3_Temp",
    "Check4_Temp",
    "Check1_Post",
    "Check2_Post",
    "Check3_Post",
    "Check4_Post",
    MONTHLY_TARGET,
];
const SPENDING_HEADERS: &[&str] = &["Date", "Category", "Amount", "Memo"];
const DASHBOARD_HEADERS: &[&str] = &["Key", "Value"];

/// What `init` had to do to bring the spreadsheet into shape.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct InitReport {
    pub(crate) created: Vec<&'static str>,
    pub(crate) seeded: Vec<&'static str>,
}

impl InitReport {
    pub(crate) fn is_noop(&self) -> bool {
        self.created.is_empty() && self.seeded.is_empty()
    }
}

/// A budget cell that changed remotely since the editor loaded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Conflict {
    pub(crate) category: String,
    pub(crate) column: &'static str,
    pub(crate) base: String,
    /// `None` when the category row no longer exists remotely.
    pub(crate) remote: Option<String>,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.remote {
            Some(remote) => write!(
                f,
                "{} {}: was {}, now {}",
                self.category,
                self.column,
                display_cell(&self.base),
                display_cell(remote)
            ),
            None => write!(f, "{}: no longer in {BUDGETS}", self.category),
        }
    }
}

fn display_cell(v: &str) -> &str {
    if v.is_empty() {
        "(blank)"
    } else {
        v
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    Saved { cells: usize },
    Conflicts(Vec<Conflict>),
}

/// Typed access to the three worksheets, over any `SheetStore`.
pub(crate) struct Workbook {
    store: Box<dyn SheetStore>,
}

impl Workbook {
    pub(crate) fn new(store: Box<dyn SheetStore>) -> Self {
        Self { store }
    }

    pub(crate) fn describe(&self) -> String {
        self.store.describe()
    }

    /// Open or create the worksheets, make sure every header is present and
    /// seed sheets that have no data rows.
    pub(crate) fn init(&mut self) -> Result<InitReport> {
        let mut report = InitReport::default();
        let titles = self
            .store
            .worksheet_titles()
            .context("Failed to list worksheets")?;

        for &(title, headers) in &[
            (BUDGETS, BUDGET_HEADERS),
            (DAILY_SPENDING, SPENDING_HEADERS),
            (DASHBOARD_DATA, DASHBOARD_HEADERS),
        ] {
            if !titles.iter().any(|t| t == title) {
                self.store
                    .add_worksheet(title, headers.len())
                    .with_context(|| format!("Failed to create worksheet {title}"))?;
                tracing::info!(title, "created worksheet");
                report.created.push(title);
            }
            self.ensure_headers(title, headers)?;
        }

        if self.data_rows(BUDGETS)? == 0 {
            let (header, _) = self.read_table(BUDGETS)?;
            let columns = BudgetColumns::locate(&header)?;
            let rows: Vec<Vec<String>> = DEFAULT_CATEGORIES
                .iter()
                .map(|c| columns.cells(&BudgetRow::new(c.to_string())))
                .collect();
            let range = A1Range::block(BUDGETS, 1, 0, rows.len(), columns.width);
            self.store.update(&range, &rows)?;
            report.seeded.push(BUDGETS);
        }

        if self.data_rows(DASHBOARD_DATA)? == 0 {
            let rows = DashboardSettings::seed_rows();
            let range = A1Range::block(DASHBOARD_DATA, 1, 0, rows.len(), 2);
            self.store.update(&range, &rows)?;
            report.seeded.push(DASHBOARD_DATA);
        }

        if !report.seeded.is_empty() {
            tracing::info!(sheets = ?report.seeded, "seeded empty worksheets");
        }
        Ok(report)
    }

    fn ensure_headers(&mut self, title: &str, headers: &[&str]) -> Result<()> {
        let values = self.store.get_all_values(title)?;
        let existing: Vec<String> = values.into_iter().next().unwrap_or_default();
        let width = existing.iter().rposition(|h| !h.trim().is_empty()).map_or(0, |i| i + 1);
        let missing: Vec<String> = headers
            .iter()
            .filter(|h| column_of(&existing, h).is_none())
            .map(|h| h.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        tracing::info!(title, ?missing, "adding missing header columns");
        let range = A1Range::block(title, 0, width, 1, missing.len());
        self.store.update(&range, &[missing])?;
        Ok(())
    }

    fn data_rows(&mut self, title: &str) -> Result<usize> {
        let values = self.store.get_all_values(title)?;
        Ok(values
            .iter()
            .skip(1)
            .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
            .count())
    }

    /// Header row plus data rows; errors when the sheet has no header.
    fn read_table(&mut self, title: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut values = self
            .store
            .get_all_values(title)
            .with_context(|| format!("Failed to read {title}"))?;
        if values.is_empty() {
            bail!("{title} has no header row; run init first");
        }
        let header = values.remove(0);
        Ok((header, values))
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn budgets(&mut self) -> Result<Vec<BudgetRow>> {
        let (header, rows) = self.read_table(BUDGETS)?;
        let columns = BudgetColumns::locate(&header)?;
        Ok(rows
            .iter()
            .filter_map(|r| columns.parse_row(r))
            .collect())
    }

    /// Append a zeroed budget row for `name`.
    pub(crate) fn add_category(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Category name cannot be empty");
        }
        if BudgetRow::find(&self.budgets()?, name).is_some() {
            bail!("Category '{name}' already exists");
        }
        let (header, _) = self.read_table(BUDGETS)?;
        let columns = BudgetColumns::locate(&header)?;
        self.store
            .append_row(BUDGETS, &columns.cells(&BudgetRow::new(name.to_string())))?;
        tracing::info!(category = name, "added budget category");
        Ok(())
    }

    /// Write the cells of `scenario` (and `Monthly_Target`) that differ
    /// between `base` and `edited`. The sheet is re-read first; if any of
    /// those cells changed remotely since `base` was loaded, nothing is
    /// written and the conflicts are returned.
    pub(crate) fn save_budgets(
        &mut self,
        scenario: Scenario,
        base: &[BudgetRow],
        edited: &[BudgetRow],
    ) -> Result<SaveOutcome> {
        let (header, rows) = self.read_table(BUDGETS)?;
        let columns = BudgetColumns::locate(&header)?;

        let mut remote: Vec<(usize, BudgetRow)> = Vec::new();
        for (i, r) in rows.iter().enumerate() {
            if let Some(parsed) = columns.parse_row(r) {
                remote.push((i + 1, parsed));
            }
        }

        let mut conflicts = Vec::new();
        let mut updates = Vec::new();

        for mine in edited {
            let original = BudgetRow::find(base, &mine.category)
                .cloned()
                .unwrap_or_else(|| BudgetRow::new(mine.category.clone()));
            let changes = changed_cells(scenario, &original, mine);
            if changes.is_empty() {
                continue;
            }

            let lower = mine.category.trim().to_lowercase();
            let Some((sheet_row, theirs)) = remote
                .iter()
                .find(|(_, r)| r.category.to_lowercase() == lower)
            else {
                conflicts.push(Conflict {
                    category: mine.category.clone(),
                    column: CATEGORY,
                    base: String::new(),
                    remote: None,
                });
                continue;
            };

            for cell in changes {
                let remote_value = cell.value(scenario, theirs);
                if remote_value != cell.base && remote_value != cell.mine {
                    conflicts.push(Conflict {
                        category: mine.category.clone(),
                        column: cell.column(scenario),
                        base: format_cell(cell.base),
                        remote: Some(format_cell(remote_value)),
                    });
                    continue;
                }
                let Some(col) = columns.index_of(scenario, cell.field) else {
                    bail!("{BUDGETS} is missing the {MONTHLY_TARGET} column");
                };
                updates.push((
                    A1Range::cell(BUDGETS, *sheet_row, col),
                    vec![vec![format_cell(cell.mine)]],
                ));
            }
        }

        if !conflicts.is_empty() {
            tracing::warn!(count = conflicts.len(), "budget save rejected by remote changes");
            return Ok(SaveOutcome::Conflicts(conflicts));
        }

        self.store
            .batch_update(&updates)
            .context("Failed to save budgets")?;
        tracing::info!(cells = updates.len(), %scenario, "saved budgets");
        Ok(SaveOutcome::Saved {
            cells: updates.len(),
        })
    }

    // ── Daily spending ────────────────────────────────────────

    /// Every parseable entry in sheet order. Rows with a bad date or no
    /// category are skipped.
    pub(crate) fn spending(&mut self) -> Result<Vec<SpendingEntry>> {
        let (header, rows) = self.read_table(DAILY_SPENDING)?;
        let col = |name: &str| {
            column_of(&header, name)
                .with_context(|| format!("{DAILY_SPENDING} is missing the {name} column"))
        };
        let (date_col, cat_col, amount_col) = (col("Date")?, col("Category")?, col("Amount")?);
        let memo_col = column_of(&header, "Memo");

        let mut entries = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let raw_date = cell(row, Some(date_col));
            let category = cell(row, Some(cat_col)).trim();
            let Some(date) = parse_date(raw_date) else {
                tracing::warn!(row = i + 2, date = raw_date, "skipping spending row with bad date");
                continue;
            };
            if category.is_empty() {
                tracing::warn!(row = i + 2, "skipping spending row without category");
                continue;
            }
            entries.push(SpendingEntry::new(
                date,
                category.to_string(),
                parse_amount(cell(row, Some(amount_col))),
                cell(row, memo_col).to_string(),
            ));
        }
        Ok(entries)
    }

    pub(crate) fn append_spending(&mut self, entry: &SpendingEntry) -> Result<()> {
        if entry.amount < Decimal::ZERO {
            bail!("Amount must be zero or more");
        }
        if entry.category.trim().is_empty() {
            bail!("Category is required");
        }
        let (header, _) = self.read_table(DAILY_SPENDING)?;
        let mut row = vec![String::new(); header.len()];
        for (name, value) in SPENDING_HEADERS.iter().zip(entry.to_cells()) {
            let col = column_of(&header, name)
                .with_context(|| format!("{DAILY_SPENDING} is missing the {name} column"))?;
            row[col] = value;
        }
        self.store
            .append_row(DAILY_SPENDING, &row)
            .context("Failed to append spending entry")?;
        tracing::info!(date = %entry.date, category = %entry.category, amount = %entry.amount, "logged spending");
        Ok(())
    }

    // ── Dashboard settings ────────────────────────────────────

    pub(crate) fn settings(&mut self) -> Result<DashboardSettings> {
        let (_, rows) = self.read_table(DASHBOARD_DATA)?;
        Ok(DashboardSettings::from_pairs(
            rows.iter().map(|r| (cell(r, Some(0)), cell(r, Some(1)))),
        ))
    }

    /// Update the row holding `key`, appending one if the key is absent.
    /// Rows are found by key, never by position.
    pub(crate) fn set_setting(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let (_, rows) = self.read_table(DASHBOARD_DATA)?;
        let found = rows
            .iter()
            .position(|r| cell(r, Some(0)).trim() == key.as_str());
        match found {
            Some(i) => self
                .store
                .update(&A1Range::cell(DASHBOARD_DATA, i + 1, 1), &[vec![value.to_string()]])?,
            None => self
                .store
                .append_row(DASHBOARD_DATA, &[key.as_str().to_string(), value.to_string()])?,
        }
        tracing::info!(%key, value, "updated setting");
        Ok(())
    }
}

// ── Cell helpers ──────────────────────────────────────────────

fn column_of(header: &[String], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn cell(row: &[String], col: Option<usize>) -> &str {
    col.and_then(|c| row.get(c)).map_or("", String::as_str)
}

fn format_cell(v: Option<Decimal>) -> String {
    v.map(|d| d.normalize().to_string()).unwrap_or_default()
}

/// Column positions in the Budgets header, located by name.
struct BudgetColumns {
    category: usize,
    temporary: [usize; 4],
    post_rental: [usize; 4],
    monthly_target: Option<usize>,
    width: usize,
}

impl BudgetColumns {
    fn locate(header: &[String]) -> Result<Self> {
        let required = |name: &str| {
            column_of(header, name)
                .with_context(|| format!("{BUDGETS} is missing the {name} column"))
        };
        let checks = |scenario: Scenario| -> Result<[usize; 4]> {
            let names = scenario.check_columns();
            Ok([
                required(names[0])?,
                required(names[1])?,
                required(names[2])?,
                required(names[3])?,
            ])
        };
        Ok(Self {
            category: required(CATEGORY)?,
            temporary: checks(Scenario::Temporary)?,
            post_rental: checks(Scenario::PostRental)?,
            monthly_target: column_of(header, MONTHLY_TARGET),
            width: header.len(),
        })
    }

    fn parse_row(&self, row: &[String]) -> Option<BudgetRow> {
        let category = cell(row, Some(self.category)).trim();
        if category.is_empty() {
            return None;
        }
        let mut budget = BudgetRow::new(category.to_string());
        for (dst, col) in budget.temporary.iter_mut().zip(self.temporary) {
            *dst = parse_amount(cell(row, Some(col)));
        }
        for (dst, col) in budget.post_rental.iter_mut().zip(self.post_rental) {
            *dst = parse_amount(cell(row, Some(col)));
        }
        let target = cell(row, self.monthly_target).trim();
        budget.monthly_target = (!target.is_empty()).then(|| parse_amount(target));
        Some(budget)
    }

    /// Cells for a new row laid out in this header's column order.
    fn cells(&self, row: &BudgetRow) -> Vec<String> {
        let mut cells = vec![String::new(); self.width];
        cells[self.category] = row.category.clone();
        for (col, v) in self.temporary.iter().zip(row.temporary) {
            cells[*col] = v.to_string();
        }
        for (col, v) in self.post_rental.iter().zip(row.post_rental) {
            cells[*col] = v.to_string();
        }
        if let Some(col) = self.monthly_target {
            cells[col] = format_cell(row.monthly_target);
        }
        cells
    }

    fn index_of(&self, scenario: Scenario, field: BudgetField) -> Option<usize> {
        match field {
            BudgetField::Check(i) => Some(match scenario {
                Scenario::Temporary => self.temporary[i],
                Scenario::PostRental => self.post_rental[i],
            }),
            BudgetField::Target => self.monthly_target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BudgetField {
    Check(usize),
    Target,
}

struct CellChange {
    field: BudgetField,
    base: Option<Decimal>,
    mine: Option<Decimal>,
}

impl CellChange {
    fn value(&self, scenario: Scenario, row: &BudgetRow) -> Option<Decimal> {
        match self.field {
            BudgetField::Check(i) => Some(row.checks(scenario)[i]),
            BudgetField::Target => row.monthly_target,
        }
    }

    fn column(&self, scenario: Scenario) -> &'static str {
        match self.field {
            BudgetField::Check(i) => scenario.check_columns()[i],
            BudgetField::Target => MONTHLY_TARGET,
        }
    }
}

fn changed_cells(scenario: Scenario, base: &BudgetRow, mine: &BudgetRow) -> Vec<CellChange> {
    let mut changes: Vec<CellChange> = (0..4)
        .filter(|&i| base.checks(scenario)[i] != mine.checks(scenario)[i])
        .map(|i| CellChange {
            field: BudgetField::Check(i),
            base: Some(base.checks(scenario)[i]),
            mine: Some(mine.checks(scenario)[i]),
        })
        .collect();
    if base.monthly_target != mine.monthly_target {
        changes.push(CellChange {
            field: BudgetField::Target,
            base: base.monthly_target,
            mine: mine.monthly_target,
        });
    }
    changes
}
