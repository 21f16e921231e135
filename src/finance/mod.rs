//! Budget arithmetic: totals, the 70/10/10/10 rule, rental impact and
//! actual-vs-budget comparisons. Everything here is pure and recomputed on
//! every refresh.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::models::{BudgetRow, Scenario, SpendingEntry, RENTAL_RESERVE, SAVINGS, TITHE};

/// Parse a spreadsheet cell as money. Currency symbols, thousands separators
/// and surrounding whitespace are ignored, `(12.50)` reads as `-12.50`, and
/// anything unparseable reads as zero.
pub(crate) fn parse_amount(raw: &str) -> Decimal {
    try_parse_amount(raw).unwrap_or(Decimal::ZERO)
}

/// Largest amount accepted from the keyboard: a trillion.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Validate a typed amount: a number from zero to `MAX_AMOUNT`.
pub(crate) fn parse_input_amount(raw: &str) -> Result<Decimal, String> {
    match try_parse_amount(raw) {
        Some(v) if v < Decimal::ZERO => Err("Amount must be zero or more".into()),
        Some(v) if v > MAX_AMOUNT => Err(format!("Amount must be at most {MAX_AMOUNT}")),
        Some(v) => Ok(v),
        None => Err(format!("Invalid amount: {raw}")),
    }
}

/// `part` as a percentage of `whole`; zero when `whole` is zero, saturating
/// when the quotient does not fit.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .map(|r| r.saturating_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(if part.is_sign_negative() == whole.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        })
}

/// Like `parse_amount`, but `None` for input that is not a number.
pub(crate) fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let (negative, body) = match cleaned
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    let value = Decimal::from_str(body)
        .or_else(|_| Decimal::from_scientific(body))
        .ok()?;
    Some(if negative { -value } else { value })
}

// ── 70/10/10/10 ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bucket {
    Tithe,
    Offerings,
    Savings,
    Living,
}

impl Bucket {
    pub(crate) fn all() -> &'static [Bucket] {
        &[Self::Tithe, Self::Offerings, Self::Savings, Self::Living]
    }

    /// Share of the total, in percent.
    pub(crate) fn pct(&self) -> Decimal {
        match self {
            Self::Tithe | Self::Offerings | Self::Savings => Decimal::TEN,
            Self::Living => Decimal::new(70, 0),
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Tithe => "Tithe",
            Self::Offerings => "Offerings",
            Self::Savings => "Savings",
            Self::Living => "Living",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A total split by the 70/10/10/10 rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Allocation {
    pub(crate) tithe: Decimal,
    pub(crate) offerings: Decimal,
    pub(crate) savings: Decimal,
    pub(crate) living: Decimal,
}

impl Allocation {
    /// Split `total` (rounded to cents) into the four buckets. Shares are in
    /// whole cents, each within one cent of its exact proportion, and they sum
    /// to the rounded total. Leftover cents go to the largest remainders.
    pub(crate) fn split(total: Decimal) -> Self {
        let hundred = Decimal::ONE_HUNDRED;
        // Too large to count in cents: plain proportions are already exact
        // to far more than a cent.
        let Some(cents) = total.checked_mul(hundred).map(|c| c.round()) else {
            let share = |b: Bucket| total / hundred * b.pct();
            return Self {
                tithe: share(Bucket::Tithe),
                offerings: share(Bucket::Offerings),
                savings: share(Bucket::Savings),
                living: share(Bucket::Living),
            };
        };
        let exact: Vec<Decimal> = Bucket::all()
            .iter()
            .map(|b| cents / hundred * b.pct())
            .collect();
        let mut shares: Vec<Decimal> = exact.iter().map(|e| e.floor()).collect();
        let assigned: Decimal = shares.iter().copied().sum();
        let leftover = (cents - assigned).to_usize().unwrap_or(0);

        let mut order: Vec<usize> = (0..exact.len()).collect();
        order.sort_by(|&a, &b| (exact[b] - shares[b]).cmp(&(exact[a] - shares[a])));
        for &idx in order.iter().take(leftover) {
            shares[idx] += Decimal::ONE;
        }

        Self {
            tithe: shares[0] / hundred,
            offerings: shares[1] / hundred,
            savings: shares[2] / hundred,
            living: shares[3] / hundred,
        }
    }

    pub(crate) fn get(&self, bucket: Bucket) -> Decimal {
        match bucket {
            Bucket::Tithe => self.tithe,
            Bucket::Offerings => self.offerings,
            Bucket::Savings => self.savings,
            Bucket::Living => self.living,
        }
    }

    #[cfg(test)]
    pub(crate) fn total(&self) -> Decimal {
        self.tithe + self.offerings + self.savings + self.living
    }
}

// ── Budget totals ─────────────────────────────────────────────

/// Monthly budget per category for one scenario, in sheet order.
pub(crate) fn scenario_totals(rows: &[BudgetRow], scenario: Scenario) -> Vec<(String, Decimal)> {
    rows.iter()
        .map(|r| (r.category.clone(), r.total(scenario)))
        .collect()
}

/// Budget totals grouped into the dashboard's headline buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Rollup {
    pub(crate) tithe: Decimal,
    pub(crate) rental_reserve: Decimal,
    pub(crate) savings: Decimal,
    pub(crate) living: Decimal,
}

impl Rollup {
    pub(crate) fn from_budgets(rows: &[BudgetRow], scenario: Scenario) -> Self {
        let mut rollup = Self::default();
        for row in rows {
            let total = row.total(scenario);
            let bucket = match row.category.as_str() {
                TITHE => &mut rollup.tithe,
                RENTAL_RESERVE => &mut rollup.rental_reserve,
                SAVINGS => &mut rollup.savings,
                _ => &mut rollup.living,
            };
            *bucket = bucket.saturating_add(total);
        }
        rollup
    }

    pub(crate) fn total(&self) -> Decimal {
        [self.rental_reserve, self.savings, self.living]
            .into_iter()
            .fold(self.tithe, Decimal::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GoalLine {
    pub(crate) bucket: Bucket,
    pub(crate) goal: Decimal,
    pub(crate) actual: Decimal,
    pub(crate) delta: Decimal,
}

/// Compare the 70/10/10/10 split of monthly income with budgeted amounts.
/// Offerings are not budgeted during the vacancy period.
pub(crate) fn goal_vs_actual(income: Decimal, mode: Scenario, rollup: &Rollup) -> Vec<GoalLine> {
    let goal = Allocation::split(income);
    Bucket::all()
        .iter()
        .map(|&bucket| {
            let actual = match bucket {
                Bucket::Tithe => rollup.tithe,
                Bucket::Offerings => match mode {
                    Scenario::Temporary => Decimal::ZERO,
                    Scenario::PostRental => goal.offerings,
                },
                Bucket::Savings => rollup.savings,
                Bucket::Living => rollup.living,
            };
            let goal = goal.get(bucket);
            GoalLine {
                bucket,
                goal,
                actual,
                delta: actual.saturating_sub(goal),
            }
        })
        .collect()
}

// ── Rental impact / emergency fund ────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RentalImpact {
    /// Rental cost as a percentage of income; zero when there is no income.
    pub(crate) pct_of_income: Decimal,
    /// `pct_of_income / 100` clamped to `[0, 1]`, for gauges.
    pub(crate) ratio: f64,
    pub(crate) income_after_rental: Decimal,
}

impl RentalImpact {
    pub(crate) fn new(income: Decimal, rental: Decimal) -> Self {
        let pct_of_income = percent_of(rental, income);
        Self {
            pct_of_income,
            ratio: clamp_ratio(pct_of_income / Decimal::ONE_HUNDRED),
            income_after_rental: income.saturating_sub(rental),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EmergencyProgress {
    pub(crate) target: Decimal,
    pub(crate) current: Decimal,
    pub(crate) ratio: f64,
}

impl EmergencyProgress {
    /// Target is `months` of the monthly living budget.
    pub(crate) fn new(months: Decimal, monthly_living: Decimal, current: Decimal) -> Self {
        let target = months.saturating_mul(monthly_living);
        let ratio = if target > Decimal::ZERO {
            current.checked_div(target).map_or(1.0, clamp_ratio)
        } else {
            0.0
        };
        Self {
            target,
            current,
            ratio,
        }
    }
}

fn clamp_ratio(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0).clamp(0.0, 1.0)
}

// ── Spending ──────────────────────────────────────────────────

/// Inclusive date range; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DateRange {
    pub(crate) start: Option<NaiveDate>,
    pub(crate) end: Option<NaiveDate>,
}

impl DateRange {
    pub(crate) fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// First of `today`'s month through `today`.
    pub(crate) fn month_to_date(today: NaiveDate) -> Self {
        Self::new(today.with_day(1), Some(today))
    }

    /// The whole calendar month containing `date`.
    pub(crate) fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1);
        let end = start
            .and_then(|s| s.checked_add_months(chrono::Months::new(1)))
            .and_then(|next| next.pred_opt());
        Self::new(start, end)
    }

    /// The whole month `delta` months away from this range's start month.
    /// An open start is taken as `today`.
    pub(crate) fn shift_months(&self, delta: i32, today: NaiveDate) -> Self {
        let anchor = self.start.unwrap_or(today).with_day(1).unwrap_or(today);
        let moved = if delta >= 0 {
            anchor.checked_add_months(chrono::Months::new(delta.unsigned_abs()))
        } else {
            anchor.checked_sub_months(chrono::Months::new(delta.unsigned_abs()))
        };
        Self::month_of(moved.unwrap_or(anchor))
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "…".into())
        };
        write!(f, "{} → {}", fmt(self.start), fmt(self.end))
    }
}

/// Entries inside `range` (inclusive) and, when given, in `category`
/// (case-insensitive). Input order is preserved.
pub(crate) fn filter_spending<'a>(
    entries: &'a [SpendingEntry],
    range: &DateRange,
    category: Option<&str>,
) -> Vec<&'a SpendingEntry> {
    let category = category.map(|c| c.trim().to_lowercase());
    entries
        .iter()
        .filter(|e| range.contains(e.date))
        .filter(|e| {
            category
                .as_deref()
                .map_or(true, |c| e.category.to_lowercase() == c)
        })
        .collect()
}

/// Newest first; entries on the same date keep log order.
pub(crate) fn sort_newest_first(entries: &mut [&SpendingEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Total spent per category, largest first. Categories differing only in
/// case are one category, named as first seen.
pub(crate) fn spending_by_category<'a>(
    entries: impl IntoIterator<Item = &'a SpendingEntry>,
) -> Vec<(String, Decimal)> {
    let mut totals: BTreeMap<String, (String, Decimal)> = BTreeMap::new();
    for entry in entries {
        let (_, total) = totals
            .entry(entry.category.trim().to_lowercase())
            .or_insert_with(|| (entry.category.trim().to_string(), Decimal::ZERO));
        *total = total.saturating_add(entry.amount);
    }
    let mut out: Vec<(String, Decimal)> = totals.into_values().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryDelta {
    pub(crate) category: String,
    pub(crate) actual: Decimal,
    pub(crate) budget: Decimal,
    /// `actual - budget`; positive means over budget.
    pub(crate) delta: Decimal,
    /// False when the category has no row in the budget table.
    pub(crate) known: bool,
}

/// Actual spending against the scenario budget for every category that has
/// spending, sorted by category name.
pub(crate) fn actual_vs_budget<'a>(
    entries: impl IntoIterator<Item = &'a SpendingEntry>,
    budgets: &[BudgetRow],
    scenario: Scenario,
) -> Vec<CategoryDelta> {
    let mut out: Vec<CategoryDelta> = spending_by_category(entries)
        .into_iter()
        .map(|(category, actual)| {
            let row = BudgetRow::find(budgets, &category);
            let budget = row.map(|r| r.total(scenario)).unwrap_or(Decimal::ZERO);
            CategoryDelta {
                known: row.is_some(),
                delta: actual.saturating_sub(budget),
                category: row.map_or(category, |r| r.category.clone()),
                actual,
                budget,
            }
        })
        .collect();
    out.sort_by(|a, b| a.category.cmp(&b.category));
    out
}
