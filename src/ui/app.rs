use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::config::AppConfig;
use crate::finance::{self, CategoryDelta, DateRange, Rollup};
use crate::models::*;
use crate::workbook::{Conflict, Workbook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Budgets,
    Spending,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Budgets, Self::Spending]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Budgets => write!(f, "Budgets"),
            Self::Spending => write!(f, "Daily Spending"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingAction {
    DiscardDraft,
    QuitWithDraft,
    /// Drop the draft and reload after a rejected save.
    ReloadBudgets,
}

/// Columns of the budget editor: four checks, then the monthly target.
pub(crate) const BUDGET_COLUMNS: usize = 5;
pub(crate) const TARGET_COLUMN: usize = 4;

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) today: NaiveDate,
    pub(crate) config: AppConfig,
    pub(crate) source: String,

    // Dashboard
    pub(crate) settings: DashboardSettings,
    pub(crate) budgets: Vec<BudgetRow>,

    // Budget editor
    pub(crate) scenario: Scenario,
    pub(crate) draft_base: Vec<BudgetRow>,
    pub(crate) draft: Vec<BudgetRow>,
    pub(crate) budget_index: usize,
    pub(crate) budget_scroll: usize,
    pub(crate) budget_column: usize,
    pub(crate) conflicts: Vec<Conflict>,

    // Daily spending
    pub(crate) spending: Vec<SpendingEntry>,
    pub(crate) spending_range: DateRange,
    pub(crate) spending_category: Option<String>,
    pub(crate) spending_index: usize,
    pub(crate) spending_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Visible rows for scroll calculations
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(config: AppConfig, source: String) -> Self {
        let today = Local::now().date_naive();
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            today,
            config,
            source,

            settings: DashboardSettings::default(),
            budgets: Vec::new(),

            scenario: Scenario::Temporary,
            draft_base: Vec::new(),
            draft: Vec::new(),
            budget_index: 0,
            budget_scroll: 0,
            budget_column: 0,
            conflicts: Vec::new(),

            spending: Vec::new(),
            spending_range: DateRange::month_to_date(today),
            spending_category: None,
            spending_index: 0,
            spending_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    // ── Refresh ───────────────────────────────────────────────

    pub(crate) fn refresh_dashboard(&mut self, wb: &mut Workbook) -> Result<()> {
        self.settings = wb.settings()?;
        self.load_budgets(wb.budgets()?);
        self.spending = wb.spending()?;
        Ok(())
    }

    pub(crate) fn refresh_budgets(&mut self, wb: &mut Workbook) -> Result<()> {
        self.load_budgets(wb.budgets()?);
        Ok(())
    }

    pub(crate) fn refresh_spending(&mut self, wb: &mut Workbook) -> Result<()> {
        self.spending = wb.spending()?;
        self.load_budgets(wb.budgets()?);
        self.clamp_spending_cursor();
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, wb: &mut Workbook) -> Result<()> {
        self.refresh_dashboard(wb)?;
        self.scenario = self.settings.mode;
        self.clamp_spending_cursor();
        Ok(())
    }

    pub(crate) fn refresh_current(&mut self, wb: &mut Workbook) -> Result<()> {
        match self.screen {
            Screen::Dashboard => self.refresh_dashboard(wb),
            Screen::Budgets => self.refresh_budgets(wb),
            Screen::Spending => self.refresh_spending(wb),
        }
    }

    /// Take freshly read budget rows. An unsaved draft is kept as is, along
    /// with the rows it was based on, so a later save can detect conflicts.
    /// Categories added since the draft was started are appended to it.
    fn load_budgets(&mut self, rows: Vec<BudgetRow>) {
        if self.is_dirty() {
            for row in &rows {
                if BudgetRow::find(&self.draft_base, &row.category).is_none() {
                    self.draft_base.push(row.clone());
                    self.draft.push(row.clone());
                }
            }
        } else {
            self.draft_base = rows.clone();
            self.draft = rows.clone();
            self.conflicts.clear();
        }
        self.budgets = rows;
        if self.budget_index >= self.draft.len() {
            self.budget_index = self.draft.len().saturating_sub(1);
        }
    }

    /// Throw away the draft and adopt the last rows read.
    pub(crate) fn reset_draft(&mut self) {
        self.draft_base = self.budgets.clone();
        self.draft = self.budgets.clone();
        self.conflicts.clear();
        if self.budget_index >= self.draft.len() {
            self.budget_index = self.draft.len().saturating_sub(1);
        }
    }

    // ── Budget editor ─────────────────────────────────────────

    pub(crate) fn is_dirty(&self) -> bool {
        self.draft != self.draft_base
    }

    /// Number of cells that differ from the loaded rows, for the title bar.
    pub(crate) fn dirty_cells(&self) -> usize {
        self.draft
            .iter()
            .zip(&self.draft_base)
            .map(|(d, b)| {
                let checks = Scenario::all()
                    .iter()
                    .map(|s| {
                        d.checks(*s)
                            .iter()
                            .zip(b.checks(*s))
                            .filter(|(x, y)| x != y)
                            .count()
                    })
                    .sum::<usize>();
                checks + usize::from(d.monthly_target != b.monthly_target)
            })
            .sum()
    }

    /// Current value of the selected editor cell, as typed into the editor.
    pub(crate) fn selected_cell_text(&self) -> Option<String> {
        let row = self.draft.get(self.budget_index)?;
        Some(if self.budget_column == TARGET_COLUMN {
            row.monthly_target.map(|t| t.to_string()).unwrap_or_default()
        } else {
            row.checks(self.scenario)[self.budget_column].to_string()
        })
    }

    /// Write `value` into the selected draft cell. `None` clears the target.
    pub(crate) fn set_selected_cell(&mut self, value: Option<Decimal>) -> bool {
        let (column, scenario) = (self.budget_column, self.scenario);
        let Some(row) = self.draft.get_mut(self.budget_index) else {
            return false;
        };
        if column == TARGET_COLUMN {
            row.monthly_target = value;
        } else {
            row.checks_mut(scenario)[column] = value.unwrap_or(Decimal::ZERO);
        }
        true
    }

    // ── Derived figures ───────────────────────────────────────

    /// Budget rollup for the dashboard's active mode.
    pub(crate) fn rollup(&self) -> Rollup {
        Rollup::from_budgets(&self.budgets, self.settings.mode)
    }

    /// This month's spending so far, by category.
    pub(crate) fn month_actuals(&self) -> Vec<(String, Decimal)> {
        let range = DateRange::month_to_date(self.today);
        finance::spending_by_category(self.spending.iter().filter(|e| range.contains(e.date)))
    }

    /// Entries matching the spending filters, newest first.
    pub(crate) fn filtered_spending(&self) -> Vec<&SpendingEntry> {
        let mut entries = finance::filter_spending(
            &self.spending,
            &self.spending_range,
            self.spending_category.as_deref(),
        );
        finance::sort_newest_first(&mut entries);
        entries
    }

    /// Filtered spending against the Temporary budget.
    pub(crate) fn spending_deltas(&self) -> Vec<CategoryDelta> {
        finance::actual_vs_budget(self.filtered_spending(), &self.budgets, Scenario::Temporary)
    }

    pub(crate) fn clamp_spending_cursor(&mut self) {
        let len = self.filtered_spending().len();
        if self.spending_index >= len {
            self.spending_index = len.saturating_sub(1);
        }
        if self.spending_scroll > self.spending_index {
            self.spending_scroll = self.spending_index;
        }
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    pub(crate) fn confirm(&mut self, action: PendingAction, message: impl Into<String>) {
        self.confirm_message = message.into();
        self.pending_action = Some(action);
        self.input_mode = InputMode::Confirm;
    }
}
