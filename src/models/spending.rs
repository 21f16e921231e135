use chrono::NaiveDate;
use rust_decimal::Decimal;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Dates as typed or as the sheet renders them: ISO first, then US style.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

/// One line of the Daily_Spending log. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpendingEntry {
    pub(crate) date: NaiveDate,
    pub(crate) category: String,
    pub(crate) amount: Decimal,
    pub(crate) memo: String,
}

impl SpendingEntry {
    pub(crate) fn new(date: NaiveDate, category: String, amount: Decimal, memo: String) -> Self {
        Self {
            date,
            category,
            amount,
            memo,
        }
    }

    /// Cells in `Date, Category, Amount, Memo` order.
    pub(crate) fn to_cells(&self) -> Vec<String> {
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.category.clone(),
            self.amount.to_string(),
            self.memo.clone(),
        ]
    }
}
