use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::finance::{parse_input_amount, try_parse_amount};
use crate::models::{parse_date, SpendingEntry};

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val.abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Signed amount for deltas: `+$12.00` over, `-$3.50` under.
pub(crate) fn format_delta(val: Decimal) -> String {
    if val > Decimal::ZERO {
        format!("+{}", format_amount(val))
    } else {
        format_amount(val)
    }
}

/// Percentage with one decimal place, e.g. `33.3%`.
pub(crate) fn format_pct(val: Decimal) -> String {
    format!("{:.1}%", val.round_dp(1))
}

/// Ratio in `[0, 1]` for gauges, clamped; zero when `whole` is not positive.
pub(crate) fn ratio(part: Decimal, whole: Decimal) -> f64 {
    if whole <= Decimal::ZERO {
        return 0.0;
    }
    part.checked_div(whole)
        .map_or(1.0, |r| r.to_f64().unwrap_or(0.0))
        .clamp(0.0, 1.0)
}

/// Text progress bar, e.g. `[████░░░░]`.
pub(crate) fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// A date typed by the user: `today`, `yesterday` or any date the sheet
/// accepts.
pub(crate) fn parse_input_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s.trim().to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "yesterday" => today.pred_opt(),
        other => parse_date(other),
    }
}

/// Parse `[date] <category...> <amount> [memo...]`. The date defaults to
/// `today`; the category is everything up to the first number.
pub(crate) fn parse_entry(args: &str, today: NaiveDate) -> Result<SpendingEntry, String> {
    const USAGE: &str = "Usage: add [YYYY-MM-DD] <category> <amount> [memo]";
    let mut tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(USAGE.into());
    }

    let date = match parse_input_date(tokens[0], today) {
        Some(d) => {
            tokens.remove(0);
            d
        }
        None => today,
    };

    let Some(amount_at) = tokens
        .iter()
        .skip(1)
        .position(|t| try_parse_amount(t).is_some())
        .map(|i| i + 1)
    else {
        return Err(USAGE.into());
    };
    let amount = parse_input_amount(tokens[amount_at])?;

    Ok(SpendingEntry::new(
        date,
        tokens[..amount_at].join(" "),
        amount,
        tokens[amount_at + 1..].join(" "),
    ))
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// The result is guaranteed to be at most `max` characters (counting "…" as one).
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// Move a list cursor down by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_down(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if *index + 1 < len {
        *index += 1;
        if *index >= *scroll + page {
            *scroll = index.saturating_sub(page - 1);
        }
    }
}

/// Move a list cursor up by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_up(index: &mut usize, scroll: &mut usize) {
    *index = index.saturating_sub(1);
    if *index < *scroll {
        *scroll = *index;
    }
}

/// Jump cursor to the top of a list.
pub(crate) fn scroll_to_top(index: &mut usize, scroll: &mut usize) {
    *index = 0;
    *scroll = 0;
}

/// Jump cursor to the bottom of a list.
pub(crate) fn scroll_to_bottom(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if len > 0 {
        *index = len - 1;
        *scroll = index.saturating_sub(page.saturating_sub(1));
    }
}
