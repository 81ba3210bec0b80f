use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use duckdb::{Connection, OptionalExt, Row, params};

use crate::codes::{CodeSummary, Payments, ProcedureCode};
use crate::error::StoreError;
use crate::store::{CodeRepository, SearchQuery};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS procedure_codes (
      code VARCHAR PRIMARY KEY,
      description VARCHAR NOT NULL,
      category VARCHAR NOT NULL,
      payment_ipps DOUBLE NOT NULL,
      payment_hopd DOUBLE NOT NULL,
      payment_asc DOUBLE NOT NULL,
      payment_obl DOUBLE NOT NULL,
      drg VARCHAR,
      apc VARCHAR
    )
"#;

/// DuckDB-backed code store. The connection is not `Sync`, so it sits behind a mutex.
pub struct DuckDbCodeRepository {
    conn: Mutex<Connection>,
}

impl DuckDbCodeRepository {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLE_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Replaces the whole record set in one transaction. Used by seeding only.
    pub fn replace_all(&self, records: &[ProcedureCode]) -> Result<usize, StoreError> {
        let mut seen = std::collections::HashSet::new();
        for record in records {
            record.validate()?;
            if !seen.insert(record.code()) {
                return Err(StoreError::DuplicateCode(record.code().to_string()));
            }
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        // Recreated rather than emptied: the primary key index would reject re-inserted codes.
        tx.execute("DROP TABLE IF EXISTS procedure_codes", [])?;
        tx.execute_batch(CREATE_TABLE_SQL)?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO procedure_codes
                  (code, description, category, payment_ipps, payment_hopd, payment_asc, payment_obl, drg, apc)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            )?;
            for r in records {
                let p = r.payments();
                stmt.execute(params![
                    r.code(),
                    r.description(),
                    r.category(),
                    p.ipps,
                    p.hopd,
                    p.asc,
                    p.obl,
                    r.drg(),
                    r.apc(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT COUNT(*)::BIGINT FROM procedure_codes")?;
        let v: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(v.max(0) as u64)
    }
}

impl CodeRepository for DuckDbCodeRepository {
    fn list(&self) -> Result<Vec<CodeSummary>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT code, description, category FROM procedure_codes ORDER BY code ASC",
        )?;
        let rows = stmt.query_map([], summary_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn get_by_code(&self, code: &str) -> Result<Option<ProcedureCode>, StoreError> {
        let sql = r#"
            SELECT
              code,
              description,
              category,
              payment_ipps,
              payment_hopd,
              payment_asc,
              payment_obl,
              drg,
              apc
            FROM procedure_codes
            WHERE code = ?
            LIMIT 1
        "#;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let record = stmt
            .query_row([code], |row| {
                let mut rec = ProcedureCode::new(
                    row.get::<usize, String>(0)?,
                    row.get::<usize, String>(1)?,
                    row.get::<usize, String>(2)?,
                    Payments::new(
                        row.get::<usize, f64>(3)?,
                        row.get::<usize, f64>(4)?,
                        row.get::<usize, f64>(5)?,
                        row.get::<usize, f64>(6)?,
                    ),
                );
                if let Some(drg) = row.get::<usize, Option<String>>(7)? {
                    rec = rec.with_drg(drg);
                }
                if let Some(apc) = row.get::<usize, Option<String>>(8)? {
                    rec = rec.with_apc(apc);
                }
                Ok(rec)
            })
            .optional()?;
        Ok(record)
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<CodeSummary>, StoreError> {
        // contains() is literal; LIKE would treat % and _ in the query as wildcards.
        let sql = r#"
            SELECT code, description, category
            FROM procedure_codes
            WHERE contains(lower(code), lower(?::VARCHAR))
               OR contains(lower(description), lower(?::VARCHAR))
            ORDER BY code ASC
        "#;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let q = query.as_str();
        let rows = stmt.query_map(params![q, q], summary_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

fn summary_from_row(row: &Row<'_>) -> duckdb::Result<CodeSummary> {
    Ok(CodeSummary {
        code: row.get(0)?,
        description: row.get(1)?,
        category: row.get(2)?,
    })
}
