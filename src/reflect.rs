//! Schema reflection over a materialized SQLite database.
//!
//! Two independent views of the same file: a structured description read
//! from the engine's introspection pragmas, and a textual blob (stored DDL
//! plus sample rows) used as model context. Both open the database
//! read-only and never mutate it.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::info;

use crate::render;
use crate::types::{Error, Result, ResultSet};

/// Dialect identifier reported for the file-backed engine.
pub const DIALECT: &str = "sqlite";

/// Filter keeping user tables only; the engine's bookkeeping tables all
/// carry the `sqlite_` prefix.
const USER_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

/// Column metadata as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
}

/// Foreign-key edge between two reflected tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// One reflected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Structured snapshot of every user table in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableInfo>,
}

impl SchemaDescription {
    /// Look up a reflected table by name.
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|table| table.name == name)
    }
}

fn open_read_only(db_path: &Path) -> Result<Connection> {
    if !db_path.is_file() {
        return Err(Error::FileNotFound(db_path.display().to_string()));
    }
    Ok(Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY,
    )?)
}

fn user_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(USER_TABLES_SQL)?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let columns = stmt
        .query_map([], |row| {
            // table_info rows: (cid, name, type, notnull, dflt_value, pk)
            let notnull: i64 = row.get(3)?;
            let pk: i64 = row.get(5)?;
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get(2)?,
                is_nullable: notnull == 0,
                is_primary_key: pk > 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn table_foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list(\"{}\")", table))?;
    let keys = stmt
        .query_map([], |row| {
            // foreign_key_list rows: (id, seq, table, from, to, on_update,
            // on_delete, match); `to` is NULL for an implicit primary-key
            // reference.
            let referenced_column: Option<String> = row.get(4)?;
            Ok(ForeignKeyInfo {
                column: row.get(3)?,
                referenced_table: row.get(2)?,
                referenced_column: referenced_column.unwrap_or_default(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(keys)
}

/// Build the structured schema description of every user table.
///
/// # Errors
///
/// Returns `Error::FileNotFound` before any query is attempted when the
/// path does not exist, or `Error::SqliteError` if introspection fails.
pub fn describe_database(db_path: &Path) -> Result<SchemaDescription> {
    let conn = open_read_only(db_path)?;

    let mut tables = Vec::new();
    for name in user_tables(&conn)? {
        let columns = table_columns(&conn, &name)?;
        let foreign_keys = table_foreign_keys(&conn, &name)?;
        tables.push(TableInfo {
            name,
            columns,
            foreign_keys,
        });
    }

    Ok(SchemaDescription { tables })
}

/// Build the connection URI reported alongside the textual schema, with
/// leading path-relative prefixes stripped.
pub fn database_uri(db_path: &str) -> String {
    let cleaned = db_path.trim_start_matches(['.', '/', '\\']);
    format!("sqlite:///{}", cleaned)
}

fn sample_table(conn: &Connection, table: &str, limit: usize) -> Result<ResultSet> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\" LIMIT {}", table, limit))?;
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

/// Render the dialect label and the textual schema used as model context:
/// each user table's stored DDL followed by a comment block with up to
/// `sample_rows` rows from the table.
pub fn render_schema(db_path: &Path, sample_rows: usize) -> Result<(String, String)> {
    info!(
        uri = %database_uri(&db_path.display().to_string()),
        "connecting to database for textual reflection"
    );
    let conn = open_read_only(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let entries = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let ddl: Option<String> = row.get(1)?;
            Ok((name, ddl.unwrap_or_default()))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut sections = Vec::with_capacity(entries.len());
    for (name, ddl) in entries {
        let mut section = ddl;
        if sample_rows > 0 {
            let sample = sample_table(&conn, &name, sample_rows)?;
            section.push_str(&format!(
                "\n\n/*\n{} rows from {} table:\n{}*/",
                sample.rows.len(),
                name,
                render::format_table(&sample)
            ));
        }
        sections.push(section);
    }

    Ok((DIALECT.to_string(), sections.join("\n\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_strips_path_relative_prefixes() {
        assert_eq!(
            database_uri("./data/products.db"),
            "sqlite:///data/products.db"
        );
        assert_eq!(database_uri("data/products.db"), "sqlite:///data/products.db");
        assert_eq!(database_uri(".\\data\\products.db"), "sqlite:///data\\products.db");
    }

    #[test]
    fn missing_file_fails_before_connecting() {
        let result = describe_database(Path::new("/nonexistent/void.db"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));

        let result = render_schema(Path::new("/nonexistent/void.db"), 2);
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
