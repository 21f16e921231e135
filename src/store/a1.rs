use regex::Regex;
use std::sync::LazyLock;

use super::{StoreError, StoreResult};

#[allow(clippy::expect_used)]
static A1_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:'((?:[^']|'')+)'|([^'!][^!]*))!([A-Za-z]+)([0-9]+)(?::([A-Za-z]+)([0-9]+))?$")
        .expect("A1 pattern is valid")
});

/// Zero-based cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CellRef {
    pub(crate) row: usize,
    pub(crate) col: usize,
}

impl CellRef {
    pub(crate) fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row + 1)
    }
}

/// A rectangular range on one worksheet, e.g. `'Budgets'!B2:E11`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct A1Range {
    pub(crate) sheet: String,
    pub(crate) start: CellRef,
    pub(crate) end: Option<CellRef>,
}

impl A1Range {
    pub(crate) fn cell(sheet: &str, row: usize, col: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            start: CellRef::new(row, col),
            end: None,
        }
    }

    /// `height` x `width` cells with the top-left corner at `(row, col)`.
    pub(crate) fn block(sheet: &str, row: usize, col: usize, height: usize, width: usize) -> Self {
        let start = CellRef::new(row, col);
        let end = CellRef::new(
            row + height.saturating_sub(1),
            col + width.saturating_sub(1),
        );
        Self {
            sheet: sheet.to_string(),
            start,
            end: (end != start).then_some(end),
        }
    }

    pub(crate) fn parse(s: &str) -> StoreResult<Self> {
        let caps = A1_PATTERN
            .captures(s.trim())
            .ok_or_else(|| StoreError::InvalidRange(s.to_string()))?;

        let sheet = match (caps.get(1), caps.get(2)) {
            (Some(quoted), _) => quoted.as_str().replace("''", "'"),
            (None, Some(bare)) => bare.as_str().to_string(),
            (None, None) => return Err(StoreError::InvalidRange(s.to_string())),
        };

        let cell = |col: Option<regex::Match>, row: Option<regex::Match>| -> StoreResult<Option<CellRef>> {
            match (col, row) {
                (Some(col), Some(row)) => {
                    let col = column_index(col.as_str())
                        .ok_or_else(|| StoreError::InvalidRange(s.to_string()))?;
                    let row: usize = row
                        .as_str()
                        .parse()
                        .map_err(|_| StoreError::InvalidRange(s.to_string()))?;
                    if row == 0 {
                        return Err(StoreError::InvalidRange(s.to_string()));
                    }
                    Ok(Some(CellRef::new(row - 1, col)))
                }
                _ => Ok(None),
            }
        };

        let start = cell(caps.get(3), caps.get(4))?
            .ok_or_else(|| StoreError::InvalidRange(s.to_string()))?;
        let end = cell(caps.get(5), caps.get(6))?;
        if let Some(end) = end {
            if end.row < start.row || end.col < start.col {
                return Err(StoreError::InvalidRange(s.to_string()));
            }
        }

        Ok(Self { sheet, start, end })
    }

    /// Number of rows and columns covered.
    pub(crate) fn dimensions(&self) -> (usize, usize) {
        let end = self.end.unwrap_or(self.start);
        (end.row - self.start.row + 1, end.col - self.start.col + 1)
    }

    /// True when `rows` fits inside this range. A single-cell range accepts
    /// any shape, matching how the Sheets API anchors writes at one cell.
    pub(crate) fn fits(&self, rows: &[Vec<String>]) -> bool {
        if self.end.is_none() {
            return true;
        }
        let (height, width) = self.dimensions();
        rows.len() <= height && rows.iter().all(|r| r.len() <= width)
    }
}

impl std::fmt::Display for A1Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'!{}", self.sheet.replace('\'', "''"), self.start)?;
        if let Some(end) = self.end {
            write!(f, ":{end}")?;
        }
        Ok(())
    }
}

/// Zero-based column index to letters: 0 → `A`, 26 → `AA`.
pub(crate) fn column_letters(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Column letters to a zero-based index: `A` → 0, `AA` → 26.
pub(crate) fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let v = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(v)?;
    }
    Some(n - 1)
}
