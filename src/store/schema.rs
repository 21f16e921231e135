pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS worksheets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL UNIQUE,
    col_count   INTEGER NOT NULL DEFAULT 26,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cells (
    worksheet_id  INTEGER NOT NULL REFERENCES worksheets(id) ON DELETE CASCADE,
    row_idx       INTEGER NOT NULL,
    col_idx       INTEGER NOT NULL,
    value         TEXT NOT NULL,
    PRIMARY KEY (worksheet_id, row_idx, col_idx)
);

CREATE INDEX IF NOT EXISTS idx_cells_row ON cells(worksheet_id, row_idx);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
