//! Delimited-file loading and column type inference.

use std::path::Path;

use crate::types::{ColumnType, Error, Result, TabularDataset};

/// Read a UTF-8 delimited file into an in-memory dataset.
///
/// The first record is the header; every following record is a data row and
/// must match the header's width.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the path does not exist, or
/// `Error::CsvError` on malformed input.
pub fn load_csv(path: &Path) -> Result<TabularDataset> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(TabularDataset { headers, rows })
}

/// Infer per-column storage classes from a bounded sample of rows.
///
/// Both materialization paths share this one function. With `sample_depth`
/// of 1 only the first data row is inspected and rows 2..N cannot change
/// the result; deeper samples may widen a guess (Integer -> Real -> Text)
/// but never narrow it. A dataset with no data rows defaults every column
/// to Text.
pub fn infer_column_types(dataset: &TabularDataset, sample_depth: usize) -> Vec<ColumnType> {
    let width = dataset.width();
    if dataset.is_empty() {
        return vec![ColumnType::Text; width];
    }

    let mut types: Vec<ColumnType> = dataset.rows[0]
        .iter()
        .map(|value| ColumnType::classify(value))
        .collect();
    types.resize(width, ColumnType::Text);

    for row in dataset.rows.iter().take(sample_depth.max(1)).skip(1) {
        for (slot, value) in types.iter_mut().zip(row) {
            *slot = slot.widen(ColumnType::classify(value));
        }
    }

    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> TabularDataset {
        TabularDataset {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn load_csv_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_csv(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn load_csv_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.csv");
        fs::write(&path, "id,name,stock\n1,Widget,5\n2,Gadget,12\n").unwrap();

        let dataset = load_csv(&path).unwrap();
        assert_eq!(dataset.headers, vec!["id", "name", "stock"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[1], vec!["2", "Gadget", "12"]);
    }

    #[test]
    fn inference_uses_only_first_row_at_depth_one() {
        let shapes_match = dataset(&["id", "name"], &[&["1", "Widget"], &["2", "Gadget"]]);
        let shapes_drift = dataset(&["id", "name"], &[&["1", "Widget"], &["oops", "3.5"]]);

        let expected = vec![ColumnType::Integer, ColumnType::Text];
        assert_eq!(infer_column_types(&shapes_match, 1), expected);
        assert_eq!(infer_column_types(&shapes_drift, 1), expected);
    }

    #[test]
    fn deeper_sample_widens_but_never_narrows() {
        let data = dataset(
            &["a", "b"],
            &[&["1", "2.5"], &["3.5", "7"], &["x", "8"]],
        );

        assert_eq!(
            infer_column_types(&data, 2),
            vec![ColumnType::Real, ColumnType::Real]
        );
        assert_eq!(
            infer_column_types(&data, 3),
            vec![ColumnType::Text, ColumnType::Real]
        );
    }

    #[test]
    fn empty_dataset_defaults_to_text() {
        let data = dataset(&["a", "b", "c"], &[]);
        assert_eq!(infer_column_types(&data, 1), vec![ColumnType::Text; 3]);
    }
}
