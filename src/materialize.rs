//! Materialize a tabular dataset as a SQLite table and as a SQL script.
//!
//! The two paths are independent failure domains: the script can succeed
//! while the database load fails and vice versa. Both share one set of
//! inferred column types and both designate the first column PRIMARY KEY,
//! whether or not its values are unique.

use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::loader;
use crate::types::{ColumnType, Error, Result, TabularDataset};

/// Outcome of the two materialization paths, carried separately so one
/// failure does not mask the other.
#[derive(Debug)]
pub struct MaterializeReport {
    pub script: Result<()>,
    pub database: Result<()>,
}

impl MaterializeReport {
    /// True when both paths completed.
    pub fn all_ok(&self) -> bool {
        self.script.is_ok() && self.database.is_ok()
    }
}

/// Table name derived from the source file's base name, without extension.
pub fn table_name(csv_path: &Path) -> String {
    csv_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("data")
        .to_string()
}

/// Escape a value as a single-quoted SQL text literal.
fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn render_value(value: &str, column_type: ColumnType) -> String {
    if column_type.quotes_values() {
        quote_text(value)
    } else {
        value.to_string()
    }
}

/// Emit a plain-text script equivalent to the dataset: one CREATE TABLE
/// with column 0 PRIMARY KEY, then a single multi-row INSERT quoting text
/// values.
pub fn write_script(
    dataset: &TabularDataset,
    types: &[ColumnType],
    table: &str,
    script_path: &Path,
) -> Result<()> {
    if dataset.headers.is_empty() {
        return Err(Error::ScriptError("no header columns to emit".to_string()));
    }

    let mut out = String::new();
    out.push_str(&format!("CREATE TABLE IF NOT EXISTS {} (\n", table));
    for (index, (header, column_type)) in dataset.headers.iter().zip(types).enumerate() {
        out.push_str(&format!("    {} {}", header, column_type.sql_name()));
        if index == 0 {
            out.push_str(" PRIMARY KEY");
        }
        if index < dataset.headers.len() - 1 {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(");\n");

    if !dataset.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "INSERT INTO {} ({}) VALUES\n",
            table,
            dataset.headers.join(", ")
        ));
        let tuples: Vec<String> = dataset
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row
                    .iter()
                    .zip(types)
                    .map(|(value, column_type)| render_value(value, *column_type))
                    .collect();
                format!("({})", values.join(", "))
            })
            .collect();
        out.push_str(&tuples.join(",\n"));
        out.push_str(";\n");
    }

    fs::write(script_path, out)?;
    debug!(path = %script_path.display(), "script emitted");
    Ok(())
}

/// Bulk-load the dataset into the database, replacing any existing table of
/// the same name. Column order is preserved and every row is inserted
/// inside one transaction.
pub fn write_database(
    dataset: &TabularDataset,
    types: &[ColumnType],
    table: &str,
    db_path: &Path,
) -> Result<()> {
    let mut conn = Connection::open(db_path)?;
    let tx = conn.transaction()?;

    tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\";", table))?;

    let columns: Vec<String> = dataset
        .headers
        .iter()
        .zip(types)
        .enumerate()
        .map(|(index, (header, column_type))| {
            if index == 0 {
                format!("\"{}\" {} PRIMARY KEY", header, column_type.sql_name())
            } else {
                format!("\"{}\" {}", header, column_type.sql_name())
            }
        })
        .collect();
    tx.execute(
        &format!("CREATE TABLE \"{}\" ({})", table, columns.join(", ")),
        [],
    )?;

    {
        let placeholders = vec!["?"; dataset.width()].join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{}\" VALUES ({})",
            table, placeholders
        ))?;
        for row in &dataset.rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Run both materialization paths over one loaded dataset.
///
/// A missing source file fails before either path starts; everything after
/// that is reported per path.
pub fn materialize(
    csv_path: &Path,
    script_path: &Path,
    db_path: &Path,
    sample_depth: usize,
) -> Result<MaterializeReport> {
    let dataset = loader::load_csv(csv_path)?;
    let types = loader::infer_column_types(&dataset, sample_depth);
    let table = table_name(csv_path);
    info!(
        table = %table,
        rows = dataset.len(),
        columns = dataset.width(),
        "materializing dataset"
    );

    let script = write_script(&dataset, &types, &table, script_path);
    let database = write_database(&dataset, &types, &table, db_path);
    Ok(MaterializeReport { script, database })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;
    use std::fs;
    use tempfile::tempdir;

    fn products() -> TabularDataset {
        TabularDataset {
            headers: vec!["id".into(), "name".into(), "stock".into()],
            rows: vec![
                vec!["1".into(), "Widget".into(), "5".into()],
                vec!["2".into(), "Gadget".into(), "12".into()],
            ],
        }
    }

    const PRODUCT_TYPES: [ColumnType; 3] =
        [ColumnType::Integer, ColumnType::Text, ColumnType::Integer];

    #[test]
    fn script_declares_first_column_primary_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.sql");
        write_script(&products(), &PRODUCT_TYPES, "products", &path).unwrap();

        let script = fs::read_to_string(&path).unwrap();
        assert!(script.contains("CREATE TABLE IF NOT EXISTS products ("));
        assert!(script.contains("    id INTEGER PRIMARY KEY,"));
        assert!(script.contains("    name TEXT,"));
        assert!(script.contains("    stock INTEGER\n"));
        assert!(script.contains("INSERT INTO products (id, name, stock) VALUES"));
        assert!(script.contains("(1, 'Widget', 5),"));
        assert!(script.trim_end().ends_with("(2, 'Gadget', 12);"));
    }

    #[test]
    fn script_escapes_embedded_quotes() {
        let dataset = TabularDataset {
            headers: vec!["id".into(), "name".into()],
            rows: vec![vec!["1".into(), "O'Brien".into()]],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("people.sql");
        write_script(
            &dataset,
            &[ColumnType::Integer, ColumnType::Text],
            "people",
            &path,
        )
        .unwrap();

        let script = fs::read_to_string(&path).unwrap();
        assert!(script.contains("(1, 'O''Brien')"));
    }

    #[test]
    fn script_for_empty_dataset_has_no_insert() {
        let dataset = TabularDataset {
            headers: vec!["id".into(), "name".into()],
            rows: vec![],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.sql");
        write_script(&dataset, &[ColumnType::Text, ColumnType::Text], "empty", &path).unwrap();

        let script = fs::read_to_string(&path).unwrap();
        assert!(script.contains("CREATE TABLE IF NOT EXISTS empty ("));
        assert!(!script.contains("INSERT"));
    }

    #[test]
    fn database_load_replaces_existing_table() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("products.db");

        write_database(&products(), &PRODUCT_TYPES, "products", &db).unwrap();
        write_database(&products(), &PRODUCT_TYPES, "products", &db).unwrap();

        let conn = Connection::open(&db).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn table_name_strips_directory_and_extension() {
        assert_eq!(table_name(Path::new("./data/products_test_data.csv")), "products_test_data");
        assert_eq!(table_name(Path::new("orders.csv")), "orders");
    }
}
