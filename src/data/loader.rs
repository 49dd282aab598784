use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Pin lists
// ---------------------------------------------------------------------------

/// Parse a Pin list: floats separated by whitespace and/or commas.
pub fn parse_pin_values(text: &str, source: &str) -> Result<Vec<f64>> {
    let tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "No Pin values found in {source}"
        )));
    }

    tokens
        .iter()
        .map(|tok| {
            tok.parse::<f64>().map_err(|e| {
                PipelineError::parse(format!("Pin values in {source}"), format!("'{tok}': {e}"))
            })
        })
        .collect()
}

/// Read and parse a sidecar Pin file.
pub fn read_pin_file(path: &Path) -> Result<Vec<f64>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    parse_pin_values(&text, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// CSV tables
// ---------------------------------------------------------------------------

/// Read a CSV table into records after checking that `required` columns exist.
/// Extra columns are ignored.
pub fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema {
            table: path.display().to_string(),
            missing,
        });
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize().enumerate() {
        let record: T = result.map_err(|e| {
            PipelineError::parse(format!("{} row {row_no}", path.display()), e)
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write rows to a CSV file, replacing any existing file.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::StatsRecord;

    #[test]
    fn pins_split_on_commas_and_whitespace() {
        let pins = parse_pin_values("100, 200\n300.5\t,,400", "test").unwrap();
        assert_eq!(pins, vec![100.0, 200.0, 300.5, 400.0]);
    }

    #[test]
    fn empty_pin_list_is_rejected() {
        assert!(matches!(
            parse_pin_values(" ,\n ", "test"),
            Err(PipelineError::EmptyData(_))
        ));
    }

    #[test]
    fn bad_pin_token_is_a_parse_error() {
        assert!(matches!(
            parse_pin_values("100 abc", "test"),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn missing_pin_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_pin_file(&dir.path().join("case.pins")),
            Err(PipelineError::MissingInput(_))
        ));
    }

    #[test]
    fn table_schema_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        fs::write(&path, "dataset,mode\nA,1.0\n").unwrap();
        let err = read_table::<StatsRecord>(&path, &["dataset", "pin"]).unwrap_err();
        match err {
            PipelineError::Schema { missing, .. } => assert_eq!(missing, vec!["pin".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_stats_columns_default_to_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        fs::write(&path, "dataset,pin,extra\nA,100,x\nB,200.5,y\n").unwrap();
        let rows: Vec<StatsRecord> = read_table(&path, &["dataset", "pin"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].pin, 200.5);
        assert!(rows[0].mode.is_nan());
    }
}
