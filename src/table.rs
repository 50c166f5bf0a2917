// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Raw tabular input: decoding, CSV / JSON parsing and numeric coercion

use crate::error::{PipelineError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Supported on-disk layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text with a header row
    Csv,
    /// Array of JSON objects
    Json,
}

impl TableFormat {
    /// Pick the format from a file extension; anything but `.json` is CSV
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// An untyped table of string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    source: PathBuf,
}

impl Table {
    /// Read and parse a table file
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let text = decode(&bytes, path)?;
        let table = match TableFormat::from_path(path) {
            TableFormat::Csv => Self::from_csv_str(&text, path)?,
            TableFormat::Json => Self::from_json_str(&text, path)?,
        };
        debug!(
            "Read {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse delimited text; short rows are padded with empty cells
    pub fn from_csv_str(text: &str, source: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            source: source.to_path_buf(),
        })
    }

    /// Parse an array of JSON objects; columns appear in first-seen order
    pub fn from_json_str(text: &str, source: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(PipelineError::Format {
                path: source.to_path_buf(),
                reason: "expected a top-level array of records".into(),
            });
        };

        let mut headers: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut objects = Vec::with_capacity(items.len());

        for (position, item) in items.into_iter().enumerate() {
            let Value::Object(map) = item else {
                return Err(PipelineError::Format {
                    path: source.to_path_buf(),
                    reason: format!("element {position} is not an object"),
                });
            };
            for key in map.keys() {
                if !index.contains_key(key) {
                    index.insert(key.clone(), headers.len());
                    headers.push(key.clone());
                }
            }
            objects.push(map);
        }

        let rows = objects
            .into_iter()
            .map(|map| {
                let mut row = vec![String::new(); headers.len()];
                for (key, value) in map {
                    row[index[&key]] = cell_text(&value);
                }
                row
            })
            .collect();

        Ok(Self {
            headers,
            rows,
            source: source.to_path_buf(),
        })
    }

    /// Column names in file order
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// File this table came from
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of data rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first alias present as a column.
    ///
    /// Aliases are tried in order with an exact match, then again ignoring
    /// ASCII case and surrounding whitespace.
    #[must_use]
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias))
            .or_else(|| {
                aliases.iter().find_map(|alias| {
                    self.headers
                        .iter()
                        .position(|h| h.trim().eq_ignore_ascii_case(alias))
                })
            })
    }

    /// Trimmed cell text
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", |c| c.trim())
    }

    /// Numeric cell value via [`parse_metric`]
    #[must_use]
    pub fn number(&self, row: usize, column: usize) -> f64 {
        parse_metric(self.cell(row, column))
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Decode file bytes: UTF-8 first, then Latin-1.
///
/// Latin-1 maps every byte to a character, so the fallback only fails for
/// binary payloads (NUL bytes), which are rejected as undecodable.
pub fn decode(bytes: &[u8], path: &Path) -> Result<String> {
    if bytes.contains(&0) {
        return Err(PipelineError::Encoding {
            path: path.to_path_buf(),
        });
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string()),
        Err(e) => {
            warn!(
                "{} is not valid UTF-8 ({}); retrying as Latin-1",
                path.display(),
                e
            );
            Ok(bytes.iter().copied().map(char::from).collect())
        }
    }
}

/// Coerce a cell to a metric value; anything unparsable reads as zero.
///
/// Accepts integers, floats and `1,234`-style thousands separators.
#[must_use]
pub fn parse_metric(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0.0;
    }

    let parsed = text
        .parse::<f64>()
        .ok()
        .or_else(|| text.replace(',', "").parse::<f64>().ok());

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            trace!("Non-numeric metric value '{}' read as 0", text);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("test.csv")
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let text = decode("\u{feff}project_id\nä".as_bytes(), &path()).unwrap();
        assert_eq!(text, "project_id\nä");
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        // 0xE9 is 'é' in Latin-1 and invalid as a lone UTF-8 byte
        let text = decode(b"caf\xe9", &path()).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_decode_rejects_binary() {
        let err = decode(b"\x00\x01\x02", &path()).unwrap_err();
        assert!(matches!(err, PipelineError::Encoding { .. }));
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!(parse_metric("42"), 42.0);
        assert_eq!(parse_metric(" 3.5 "), 3.5);
        assert_eq!(parse_metric("1,234"), 1234.0);
        assert_eq!(parse_metric(""), 0.0);
        assert_eq!(parse_metric("n/a"), 0.0);
        assert_eq!(parse_metric("NaN"), 0.0);
        assert_eq!(parse_metric("inf"), 0.0);
    }

    #[test]
    fn test_csv_pads_short_rows() {
        let table = Table::from_csv_str("a,b,c\n1,2\n4,5,6\n", &path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.number(1, 2), 6.0);
    }

    #[test]
    fn test_json_union_of_keys() {
        let json = r#"[{"project_id": "a", "n": 3}, {"project_id": "b", "extra": null, "n": "7"}]"#;
        let table = Table::from_json_str(json, Path::new("x.json")).unwrap();

        // serde_json orders object keys, so columns follow key order per record
        assert_eq!(table.headers(), ["n", "project_id", "extra"]);
        assert_eq!(table.number(0, 0), 3.0);
        assert_eq!(table.number(1, 0), 7.0);
        assert_eq!(table.cell(0, 2), "");
    }

    #[test]
    fn test_json_requires_array() {
        let err = Table::from_json_str(r#"{"project_id": "a"}"#, Path::new("x.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Format { .. }));
    }

    #[test]
    fn test_find_column_prefers_alias_order_then_case() {
        let table = Table::from_csv_str("ProjectId,developers\nx,1\n", &path()).unwrap();
        assert_eq!(table.find_column(&["project_id", "ProjectId"]), Some(0));
        assert_eq!(table.find_column(&["PROJECT_ID", "projectid"]), Some(0));
        assert_eq!(table.find_column(&["missing"]), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a.JSON")), TableFormat::Json);
        assert_eq!(TableFormat::from_path(Path::new("a.csv")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("a")), TableFormat::Csv);
    }
}
