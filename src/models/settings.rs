use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::Scenario;
use crate::finance::parse_amount;

/// Keys of the `Dashboard_Data` key/value sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingKey {
    MonthlyIncome,
    RentalMonthly,
    TithePct,
    SavingsPct,
    EmergencyTargetMonths,
    EmergencyCurrent,
    Mode,
    VerseIndex,
}

impl SettingKey {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::MonthlyIncome => "Monthly_Income",
            Self::RentalMonthly => "Rental_Monthly",
            Self::TithePct => "Tithe_Pct",
            Self::SavingsPct => "Savings_Pct",
            Self::EmergencyTargetMonths => "Emergency_Target_Months",
            Self::EmergencyCurrent => "Emergency_Current",
            Self::Mode => "Mode",
            Self::VerseIndex => "Verse_Index",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s.trim())
    }

    pub(crate) fn all() -> &'static [SettingKey] {
        &[
            Self::MonthlyIncome,
            Self::RentalMonthly,
            Self::TithePct,
            Self::SavingsPct,
            Self::EmergencyTargetMonths,
            Self::EmergencyCurrent,
            Self::Mode,
            Self::VerseIndex,
        ]
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DashboardSettings {
    pub(crate) monthly_income: Decimal,
    pub(crate) rental_monthly: Decimal,
    pub(crate) tithe_pct: Decimal,
    pub(crate) savings_pct: Decimal,
    pub(crate) emergency_target_months: Decimal,
    pub(crate) emergency_current: Decimal,
    pub(crate) mode: Scenario,
    pub(crate) verse_index: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            monthly_income: Decimal::ZERO,
            rental_monthly: Decimal::new(2500, 0),
            tithe_pct: Decimal::TEN,
            savings_pct: Decimal::TEN,
            emergency_target_months: Decimal::new(3, 0),
            emergency_current: Decimal::ZERO,
            mode: Scenario::Temporary,
            verse_index: 0,
        }
    }
}

impl DashboardSettings {
    /// Build settings from `(Key, Value)` rows. Unknown keys are ignored,
    /// missing keys keep their seed defaults and a repeated key keeps its
    /// first row, the one `set_setting` writes.
    pub(crate) fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut settings = Self::default();
        let mut seen: Vec<SettingKey> = Vec::new();
        for (key, value) in pairs {
            let Some(key) = SettingKey::parse(key) else {
                continue;
            };
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            match key {
                SettingKey::MonthlyIncome => settings.monthly_income = parse_amount(value),
                SettingKey::RentalMonthly => settings.rental_monthly = parse_amount(value),
                SettingKey::TithePct => settings.tithe_pct = parse_amount(value),
                SettingKey::SavingsPct => settings.savings_pct = parse_amount(value),
                SettingKey::EmergencyTargetMonths => {
                    settings.emergency_target_months = parse_amount(value)
                }
                SettingKey::EmergencyCurrent => settings.emergency_current = parse_amount(value),
                SettingKey::Mode => settings.mode = Scenario::parse(value),
                SettingKey::VerseIndex => {
                    settings.verse_index = parse_amount(value).trunc().to_usize().unwrap_or(0)
                }
            }
        }
        settings
    }

    /// The cell value stored for `key`.
    pub(crate) fn value_of(&self, key: SettingKey) -> String {
        match key {
            SettingKey::MonthlyIncome => self.monthly_income.to_string(),
            SettingKey::RentalMonthly => self.rental_monthly.to_string(),
            SettingKey::TithePct => self.tithe_pct.to_string(),
            SettingKey::SavingsPct => self.savings_pct.to_string(),
            SettingKey::EmergencyTargetMonths => self.emergency_target_months.to_string(),
            SettingKey::EmergencyCurrent => self.emergency_current.to_string(),
            SettingKey::Mode => self.mode.as_str().to_string(),
            SettingKey::VerseIndex => self.verse_index.to_string(),
        }
    }

    /// Rows written into an empty `Dashboard_Data` sheet.
    pub(crate) fn seed_rows() -> Vec<Vec<String>> {
        let defaults = Self::default();
        SettingKey::all()
            .iter()
            .map(|k| vec![k.as_str().to_string(), defaults.value_of(*k)])
            .collect()
    }
}
