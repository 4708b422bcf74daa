//! Query execution with classified failures.

use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::render;
use crate::types::{QueryOutcome, Result, ResultSet};

fn collect_rows(conn: &Connection, sql: &str) -> Result<ResultSet> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut raw = stmt.query([])?;
    while let Some(row) = raw.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(render::render_value(row.get_ref(index)?));
        }
        rows.push(values);
    }

    Ok(ResultSet { columns, rows })
}

/// Execute `sql` against the database and classify any engine failure.
///
/// The statement runs verbatim; a malformed statement surfaces as
/// `QueryOutcome::Failed`, never as a panic. A fresh connection is opened
/// per call and dropped before returning on both paths.
pub fn run_query(db_path: &Path, sql: &str) -> QueryOutcome {
    info!(path = %db_path.display(), "connecting to database");

    let conn = match Connection::open(db_path) {
        Ok(conn) => conn,
        Err(error) => return QueryOutcome::Failed(format!("Error executing query: {}", error)),
    };

    match collect_rows(&conn, sql) {
        Ok(set) => QueryOutcome::Rows(set),
        Err(error) => QueryOutcome::Failed(format!("Error executing query: {}", error)),
    }
}

/// Execute `sql` and print either the formatted result or the failure text.
pub fn execute_and_display(db_path: &Path, sql: &str) -> QueryOutcome {
    let outcome = run_query(db_path, sql);

    match &outcome {
        QueryOutcome::Rows(set) => {
            println!("Query executed successfully. Found {} rows.", set.rows.len());
            println!();
            println!("Results:");
            println!("{}", render::format_table(set));
        }
        QueryOutcome::Failed(message) => println!("{}", message),
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_db(dir: &Path) -> std::path::PathBuf {
        let db = dir.join("exec.db");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT, stock INTEGER);
             INSERT INTO products VALUES (1, 'Widget', 5), (2, 'Gadget', 12);",
        )
        .unwrap();
        db
    }

    #[test]
    fn select_returns_named_columns_in_order() {
        let dir = tempdir().unwrap();
        let db = seeded_db(dir.path());

        match run_query(&db, "SELECT name, stock FROM products ORDER BY stock DESC") {
            QueryOutcome::Rows(set) => {
                assert_eq!(set.columns, vec!["name", "stock"]);
                assert_eq!(set.rows[0], vec!["Gadget", "12"]);
                assert_eq!(set.rows[1], vec!["Widget", "5"]);
            }
            QueryOutcome::Failed(message) => panic!("query failed: {}", message),
        }
    }

    #[test]
    fn invalid_statement_is_classified_not_raised() {
        let dir = tempdir().unwrap();
        let db = seeded_db(dir.path());

        let outcome = run_query(&db, "SELEKT oops FROM nowhere");
        assert!(matches!(outcome, QueryOutcome::Failed(_)));

        // The display stage prints the failure text without panicking.
        let outcome = execute_and_display(&db, "SELEKT oops FROM nowhere");
        assert!(!outcome.is_rows());
    }

    #[test]
    fn read_only_statements_are_idempotent() {
        let dir = tempdir().unwrap();
        let db = seeded_db(dir.path());

        let first = run_query(&db, "SELECT * FROM products ORDER BY id");
        let second = run_query(&db, "SELECT * FROM products ORDER BY id");
        assert_eq!(first, second);
    }
}
