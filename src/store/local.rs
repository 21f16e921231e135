use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::schema;
use super::{A1Range, SheetStore, StoreError, StoreResult};

/// A spreadsheet kept in a local SQLite file, one row per non-empty cell.
/// Behaves like the remote store so the app can run offline.
pub(crate) struct LocalWorkbook {
    conn: Connection,
    path: Option<PathBuf>,
}

impl LocalWorkbook {
    pub(crate) fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let mut wb = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        wb.migrate()?;
        tracing::debug!(path = %path.display(), "opened local workbook");
        Ok(wb)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut wb = Self { conn, path: None };
        wb.migrate()?;
        Ok(wb)
    }

    fn migrate(&mut self) -> StoreResult<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn worksheet_id(&self, title: &str) -> StoreResult<i64> {
        self.conn
            .query_row(
                "SELECT id FROM worksheets WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::MissingSheet(title.to_string()))
    }

    fn write_cells(
        tx: &rusqlite::Transaction<'_>,
        sheet_id: i64,
        range: &A1Range,
        rows: &[Vec<String>],
    ) -> StoreResult<()> {
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let row_idx = (range.start.row + r) as i64;
                let col_idx = (range.start.col + c) as i64;
                if value.is_empty() {
                    tx.execute(
                        "DELETE FROM cells WHERE worksheet_id = ?1 AND row_idx = ?2 AND col_idx = ?3",
                        params![sheet_id, row_idx, col_idx],
                    )?;
                } else {
                    tx.execute(
                        "INSERT OR REPLACE INTO cells (worksheet_id, row_idx, col_idx, value)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![sheet_id, row_idx, col_idx, value],
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl SheetStore for LocalWorkbook {
    fn describe(&self) -> String {
        match &self.path {
            Some(p) => format!("local workbook {}", p.display()),
            None => "in-memory workbook".to_string(),
        }
    }

    fn worksheet_titles(&mut self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title FROM worksheets ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }

    fn add_worksheet(&mut self, title: &str, cols: usize) -> StoreResult<()> {
        if self.worksheet_id(title).is_ok() {
            return Err(StoreError::DuplicateSheet(title.to_string()));
        }
        self.conn.execute(
            "INSERT INTO worksheets (title, col_count, created_at) VALUES (?1, ?2, ?3)",
            params![title, cols as i64, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn get_all_values(&mut self, title: &str) -> StoreResult<Vec<Vec<String>>> {
        let sheet_id = self.worksheet_id(title)?;
        let mut stmt = self.conn.prepare(
            "SELECT row_idx, col_idx, value FROM cells
             WHERE worksheet_id = ?1
             ORDER BY row_idx, col_idx",
        )?;
        let cells = stmt.query_map(params![sheet_id], |row| {
            Ok((
                row.get::<_, i64>(0)? as usize,
                row.get::<_, i64>(1)? as usize,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut grid: Vec<Vec<String>> = Vec::new();
        for cell in cells {
            let (r, c, value) = cell?;
            if grid.len() <= r {
                grid.resize_with(r + 1, Vec::new);
            }
            let row = &mut grid[r];
            if row.len() <= c {
                row.resize(c + 1, String::new());
            }
            row[c] = value;
        }
        Ok(grid)
    }

    fn update(&mut self, range: &A1Range, rows: &[Vec<String>]) -> StoreResult<()> {
        if !range.fits(rows) {
            return Err(StoreError::InvalidRange(format!(
                "{range} is smaller than the {} row(s) written",
                rows.len()
            )));
        }
        let sheet_id = self.worksheet_id(&range.sheet)?;
        let tx = self.conn.transaction()?;
        Self::write_cells(&tx, sheet_id, range, rows)?;
        tx.commit()?;
        Ok(())
    }

    fn batch_update(&mut self, updates: &[(A1Range, Vec<Vec<String>>)]) -> StoreResult<()> {
        let mut resolved = Vec::with_capacity(updates.len());
        for (range, rows) in updates {
            if !range.fits(rows) {
                return Err(StoreError::InvalidRange(range.to_string()));
            }
            resolved.push((self.worksheet_id(&range.sheet)?, range, rows));
        }
        let tx = self.conn.transaction()?;
        for (sheet_id, range, rows) in resolved {
            Self::write_cells(&tx, sheet_id, range, rows)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn append_row(&mut self, title: &str, row: &[String]) -> StoreResult<()> {
        let sheet_id = self.worksheet_id(title)?;
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(row_idx) + 1, 0) FROM cells WHERE worksheet_id = ?1",
            params![sheet_id],
            |r| r.get(0),
        )?;
        let range = A1Range::cell(title, next as usize, 0);
        let tx = self.conn.transaction()?;
        Self::write_cells(&tx, sheet_id, &range, &[row.to_vec()])?;
        tx.commit()?;
        Ok(())
    }
}
