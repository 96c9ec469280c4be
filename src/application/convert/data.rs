//! Structured data codec: JSON, CSV, YAML, TOML and XLSX through one
//! `serde_json::Value` model.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use serde_json::{Map, Value};

use crate::domain::error::{AlfredError, Result};

const TOOL: &str = "data-codec";

fn fail(message: impl Into<String>) -> AlfredError {
    AlfredError::conversion(TOOL, message)
}

/// A header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn convert(input: &Path, source: &str, target: &str, output: &Path) -> Result<()> {
    let value = read_value(input, source)?;
    write_value(&value, target, output)
}

fn read_text(input: &Path) -> Result<String> {
    std::fs::read_to_string(input).map_err(|e| AlfredError::io(input, e))
}

pub fn read_value(input: &Path, source: &str) -> Result<Value> {
    match source {
        "json" => serde_json::from_str(&read_text(input)?).map_err(|e| fail(format!("invalid JSON: {e}"))),
        "yaml" => {
            let text = read_text(input)?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_yaml::from_str(&text).map_err(|e| fail(format!("invalid YAML: {e}")))
        }
        "toml" => toml::from_str(&read_text(input)?).map_err(|e| fail(format!("invalid TOML: {e}"))),
        "csv" => {
            let reader = csv::ReaderBuilder::new()
                .flexible(true)
                .from_path(input)
                .map_err(|e| fail(format!("cannot open CSV: {e}")))?;
            csv_to_value(reader)
        }
        "xlsx" => xlsx_to_value(input),
        other => Err(fail(format!("cannot read .{other}"))),
    }
}

pub fn write_value(value: &Value, target: &str, output: &Path) -> Result<()> {
    let write = |text: String| std::fs::write(output, text).map_err(|e| AlfredError::io(output, e));
    match target {
        "json" => write(
            serde_json::to_string_pretty(value).map_err(|e| fail(e.to_string()))? + "\n",
        ),
        "yaml" => write(serde_yaml::to_string(value).map_err(|e| fail(format!("cannot write YAML: {e}")))?),
        "toml" => write(to_toml(value)?),
        "csv" => {
            let table = tabulate(value)?;
            let mut writer = csv::Writer::from_path(output).map_err(|e| fail(e.to_string()))?;
            writer.write_record(&table.header).map_err(|e| fail(e.to_string()))?;
            for row in &table.rows {
                writer.write_record(row).map_err(|e| fail(e.to_string()))?;
            }
            writer.flush().map_err(|e| AlfredError::io(output, e))
        }
        "xlsx" => write_xlsx(&tabulate(value)?, output),
        other => Err(fail(format!("cannot write .{other}"))),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        // nested values as compact JSON
        _ => value.to_string(),
    }
}

/// Flattens a JSON value into rows.
///
/// An object is a single row; an array of objects uses the union of keys in
/// first-seen order; any other non-empty array becomes one `value` column.
pub fn tabulate(value: &Value) -> Result<Table> {
    let items: Vec<&Value> = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) if !items.is_empty() => items.iter().collect(),
        Value::Array(_) => return Err(fail("JSON array is empty; nothing to tabulate")),
        _ => return Err(fail("JSON must be a non-empty list or an object")),
    };

    if items.iter().all(|item| item.is_object()) {
        let mut header: Vec<String> = Vec::new();
        for item in &items {
            if let Value::Object(map) = item {
                for key in map.keys() {
                    if !header.contains(key) {
                        header.push(key.clone());
                    }
                }
            }
        }
        let rows: Vec<Vec<String>> = items
            .iter()
            .map(|item| {
                header
                    .iter()
                    .map(|key| item.get(key).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        return Ok(Table { header, rows });
    }

    Ok(Table {
        header: vec!["value".to_string()],
        rows: items.iter().map(|item| vec![cell_text(item)]).collect(),
    })
}

/// Rows keyed by header; every value is a string. Short rows are padded
/// with empty strings, rows longer than the header are rejected.
fn csv_to_value<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Value> {
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| fail(format!("invalid CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| fail(format!("invalid CSV row: {e}")))?;
        if record.len() > header.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(fail(format!(
                "CSV line {line} has {} fields but the header has {}",
                record.len(),
                header.len()
            )));
        }
        let mut row = Map::new();
        for (i, key) in header.iter().enumerate() {
            let cell = record.get(i).unwrap_or_default();
            row.insert(key.clone(), Value::String(cell.to_string()));
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

fn xlsx_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::String(String::new()),
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::String(other.to_string()),
    }
}

fn xlsx_to_value(input: &Path) -> Result<Value> {
    let mut workbook = open_workbook_auto(input).map_err(|e| fail(format!("cannot open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| fail("workbook has no sheets"))?
        .map_err(|e| fail(format!("cannot read first sheet: {e}")))?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(first) => first.iter().map(|c| c.to_string()).collect(),
        None => return Ok(Value::Array(Vec::new())),
    };

    let records = rows
        .map(|row| {
            let map: Map<String, Value> = header
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let cell = row.get(i).map(xlsx_cell).unwrap_or(Value::String(String::new()));
                    (key.clone(), cell)
                })
                .collect();
            Value::Object(map)
        })
        .collect();
    Ok(Value::Array(records))
}

fn write_xlsx(table: &Table, output: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| fail(e.to_string());

    for (col, name) in table.header.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| fail("too many columns for XLSX"))?;
        sheet.write_string(0, col, name).map_err(xlsx_err)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let r = u32::try_from(r + 1).map_err(|_| fail("too many rows for XLSX"))?;
        for (col, cell) in row.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| fail("too many columns for XLSX"))?;
            sheet.write_string(r, col, cell).map_err(xlsx_err)?;
        }
    }
    workbook.save(output).map_err(xlsx_err)
}

/// TOML documents must be tables, so other roots are wrapped.
fn to_toml(value: &Value) -> Result<String> {
    let root = match value {
        Value::Object(_) => value.clone(),
        Value::Array(_) => serde_json::json!({ "items": value }),
        Value::Null => return Err(fail("TOML cannot represent null")),
        _ => serde_json::json!({ "value": value }),
    };
    toml::to_string_pretty(&root).map_err(|e| fail(format!("cannot write TOML: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn roundtrip(dir: &TempDir, value: &Value, via: &str) -> Value {
        let path = dir.path().join(format!("data.{via}"));
        write_value(value, via, &path).unwrap();
        read_value(&path, via).unwrap()
    }

    #[test]
    fn test_json_csv_roundtrip_preserves_pairs() {
        let dir = TempDir::new().unwrap();
        let value = json!([
            {"name": "Ada", "city": "London"},
            {"name": "Grace", "city": "New York, NY"},
        ]);
        assert_eq!(roundtrip(&dir, &value, "csv"), value);
    }

    #[test]
    fn test_scalar_array_becomes_value_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_value(&json!([1, 2, "a"]), "csv", &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "value\n1\n2\na\n");
    }

    #[test]
    fn test_header_is_union_in_first_seen_order() {
        let table = tabulate(&json!([
            {"b": 1, "a": {"x": true}},
            {"c": null, "b": "two"},
        ]))
        .unwrap();
        assert_eq!(table.header, vec!["b", "a", "c"]);
        assert_eq!(table.rows[0], vec!["1", r#"{"x":true}"#, ""]);
        assert_eq!(table.rows[1], vec!["two", "", ""]);
    }

    #[test]
    fn test_single_object_is_one_row() {
        let table = tabulate(&json!({"k": "v"})).unwrap();
        assert_eq!(table.header, vec!["k"]);
        assert_eq!(table.rows, vec![vec!["v".to_string()]]);
    }

    #[test]
    fn test_empty_array_and_scalar_fail() {
        assert!(matches!(tabulate(&json!([])), Err(AlfredError::Conversion { .. })));
        assert!(matches!(tabulate(&json!(42)), Err(AlfredError::Conversion { .. })));
    }

    #[test]
    fn test_empty_csv_is_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();
        assert_eq!(read_value(&path, "csv").unwrap(), json!([]));
    }

    #[test]
    fn test_csv_row_wider_than_header_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.csv");
        std::fs::write(&path, "a,b\n1,2,3\n").unwrap();

        let err = read_value(&path, "csv").unwrap_err();
        assert!(matches!(err, AlfredError::Conversion { .. }));
        assert!(err.to_string().contains("line 2 has 3 fields"));
    }

    #[test]
    fn test_csv_short_row_is_padded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.csv");
        std::fs::write(&path, "a,b\n1\n").unwrap();
        assert_eq!(read_value(&path, "csv").unwrap(), json!([{"a": "1", "b": ""}]));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let value = json!({"name": "alfred", "tags": ["cli", "files"], "version": 2});
        assert_eq!(roundtrip(&dir, &value, "yaml"), value);
    }

    #[test]
    fn test_toml_wraps_arrays_and_rejects_null() {
        let text = to_toml(&json!([{"a": 1}])).unwrap();
        assert!(text.contains("[[items]]"));
        assert!(to_toml(&Value::Null).is_err());
        assert!(to_toml(&json!({"a": null})).is_err());
    }

    #[test]
    fn test_xlsx_roundtrip_through_first_sheet() {
        let dir = TempDir::new().unwrap();
        let value = json!([{"item": "tea", "qty": "3"}, {"item": "milk", "qty": "1"}]);
        assert_eq!(roundtrip(&dir, &value, "xlsx"), value);
    }

    #[test]
    fn test_invalid_json_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = convert(&path, "json", "csv", &dir.path().join("bad.csv")).unwrap_err();
        assert!(err.to_string().starts_with("data-codec failed: invalid JSON"));
    }
}
