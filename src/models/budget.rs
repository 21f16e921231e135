use rust_decimal::Decimal;

use super::Scenario;

pub(crate) const TITHE: &str = "Tithe";
pub(crate) const RENTAL_RESERVE: &str = "Rental Reserve";
pub(crate) const SAVINGS: &str = "Savings (Emergency)";

/// Categories seeded into an empty Budgets sheet, in display order.
pub(crate) const DEFAULT_CATEGORIES: &[&str] = &[
    TITHE,
    RENTAL_RESERVE,
    SAVINGS,
    "Food",
    "Transportation",
    "Insurance/Health",
    "Child",
    "Debt",
    "Clothing/Personal",
    "Subscriptions/Misc",
];

/// One row of the Budgets sheet. The category name is the row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetRow {
    pub(crate) category: String,
    pub(crate) temporary: [Decimal; 4],
    pub(crate) post_rental: [Decimal; 4],
    pub(crate) monthly_target: Option<Decimal>,
}

impl BudgetRow {
    pub(crate) fn new(category: String) -> Self {
        Self {
            category,
            temporary: [Decimal::ZERO; 4],
            post_rental: [Decimal::ZERO; 4],
            monthly_target: None,
        }
    }

    pub(crate) fn checks(&self, scenario: Scenario) -> &[Decimal; 4] {
        match scenario {
            Scenario::Temporary => &self.temporary,
            Scenario::PostRental => &self.post_rental,
        }
    }

    pub(crate) fn checks_mut(&mut self, scenario: Scenario) -> &mut [Decimal; 4] {
        match scenario {
            Scenario::Temporary => &mut self.temporary,
            Scenario::PostRental => &mut self.post_rental,
        }
    }

    /// Monthly budget for this category: the sum of the four checks.
    pub(crate) fn total(&self, scenario: Scenario) -> Decimal {
        self.checks(scenario)
            .iter()
            .copied()
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Find a row by category name (case-insensitive).
    pub(crate) fn find<'a>(rows: &'a [BudgetRow], category: &str) -> Option<&'a BudgetRow> {
        let lower = category.trim().to_lowercase();
        rows.iter().find(|r| r.category.to_lowercase() == lower)
    }
}
