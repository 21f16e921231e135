/// Budgeting scenario: the vacancy period or stable rental income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Scenario {
    #[default]
    Temporary,
    PostRental,
}

impl Scenario {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Temporary => "Temporary",
            Self::PostRental => "Post-Rental",
        }
    }

    /// Lenient parse used for sheet values and command arguments.
    /// Unknown values fall back to `Temporary`, matching how the sheet is seeded.
    pub(crate) fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "post-rental" | "post rental" | "postrental" | "post" | "normal" => Self::PostRental,
            _ => Self::Temporary,
        }
    }

    pub(crate) fn all() -> &'static [Scenario] {
        &[Self::Temporary, Self::PostRental]
    }

    pub(crate) fn toggle(&self) -> Self {
        match self {
            Self::Temporary => Self::PostRental,
            Self::PostRental => Self::Temporary,
        }
    }

    /// Budget sheet headers holding this scenario's four checks.
    pub(crate) fn check_columns(&self) -> [&'static str; 4] {
        match self {
            Self::Temporary => ["Check1_Temp", "Check2_Temp", "Check3_Temp", "Check4_Temp"],
            Self::PostRental => ["Check1_Post", "Check2_Post", "Check3_Post", "Check4_Post"],
        }
    }

    pub(crate) fn long_name(&self) -> &'static str {
        match self {
            Self::Temporary => "Temporary (Vacancy)",
            Self::PostRental => "Post-Rental (Normal)",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
