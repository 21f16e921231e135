mod budget;
mod scenario;
mod settings;
mod spending;
mod verse;

pub(crate) use budget::{BudgetRow, DEFAULT_CATEGORIES, RENTAL_RESERVE, SAVINGS, TITHE};
pub(crate) use scenario::Scenario;
pub(crate) use settings::{DashboardSettings, SettingKey};
pub(crate) use spending::{parse_date, SpendingEntry};
pub(crate) use verse::{verse_at, VERSES};

#[cfg(test)]
mod tests;
