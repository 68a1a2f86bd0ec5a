use crate::core::flatten::cell_text;
use crate::domain::model::{Record, PROFILE_URL_FIELD};
use crate::utils::error::{EtlError, Result};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Parses a CSV table with a header row. Every cell is kept as a string.
///
/// Short rows are padded with empty cells and surplus cells are dropped, so a
/// ragged line only affects its own row.
pub fn read_rows(data: &[u8]) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if !headers.iter().any(|h| h == PROFILE_URL_FIELD) {
        return Err(EtlError::MissingColumnError {
            column: PROFILE_URL_FIELD.to_string(),
        });
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() != headers.len() {
            tracing::warn!(
                "⚠️ Row {} has {} cells, expected {}",
                index + 1,
                record.len(),
                headers.len()
            );
        }
        let data: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                let cell = record.get(column).unwrap_or_default();
                (header.clone(), Value::String(cell.to_string()))
            })
            .collect();
        rows.push(Record::new(data));
    }

    tracing::debug!("Parsed {} rows with columns {:?}", rows.len(), headers);
    Ok(rows)
}

/// Union of all record keys, in first-seen order.
pub fn union_header(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut header = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if seen.insert(key.as_str()) {
                header.push(key.clone());
            }
        }
    }
    header
}

/// Writes records as CSV with every field quoted. Missing fields are empty.
/// No records produce an empty document.
pub fn write_rows(records: &[Record]) -> Result<Vec<u8>> {
    let header = union_header(records);
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    if !header.is_empty() {
        writer.write_record(&header)?;
    }

    for record in records {
        writer.write_record(header.iter().map(|key| {
            record
                .data
                .get(key)
                .map(cell_text)
                .unwrap_or_default()
        }))?;
    }

    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_read_rows_keeps_extra_columns() {
        let csv = "name,linkedinurl,team\nAda,https://linkedin.com/in/ada,R&D\nAlan,https://linkedin.com/in/alan,\n";
        let rows = read_rows(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].profile_url(), Some("https://linkedin.com/in/ada"));
        assert_eq!(rows[0].data["team"], json!("R&D"));
        assert_eq!(rows[1].data["team"], json!(""));
        let keys: Vec<&str> = rows[0].data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "linkedinurl", "team"]);
    }

    #[test]
    fn test_read_rows_pads_short_rows() {
        let csv = "name,linkedinurl,team\nAda,https://linkedin.com/in/ada,R&D\nAlan\nGrace,https://linkedin.com/in/grace,Navy,extra\n";
        let rows = read_rows(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].data["name"], json!("Alan"));
        assert_eq!(rows[1].data["linkedinurl"], json!(""));
        assert_eq!(rows[1].data["team"], json!(""));
        assert_eq!(rows[1].profile_url(), None);
        assert_eq!(rows[2].profile_url(), Some("https://linkedin.com/in/grace"));
        assert_eq!(rows[2].data.len(), 3);
    }

    #[test]
    fn test_read_rows_strips_bom() {
        let csv = "\u{feff}linkedinurl\nhttps://linkedin.com/in/ada\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].profile_url(), Some("https://linkedin.com/in/ada"));
    }

    #[test]
    fn test_read_rows_requires_url_column() {
        let err = read_rows("name\nAda\n".as_bytes()).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumnError { .. }));
    }

    #[test]
    fn test_read_rows_header_only() {
        let rows = read_rows("linkedinurl\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_write_rows_unions_disjoint_headers() {
        let records = vec![
            record(json!({"a": "1", "b": 2})),
            record(json!({"c": true, "a": null})),
        ];
        let output = String::from_utf8(write_rows(&records).unwrap()).unwrap();

        assert_eq!(
            output,
            "\"a\",\"b\",\"c\"\n\"1\",\"2\",\"\"\n\"\",\"\",\"true\"\n"
        );
    }

    #[test]
    fn test_write_rows_escapes_quotes() {
        let records = vec![record(json!({"title": "The \"Boss\", Inc"}))];
        let output = String::from_utf8(write_rows(&records).unwrap()).unwrap();
        assert_eq!(output, "\"title\"\n\"The \"\"Boss\"\", Inc\"\n");
    }

    #[test]
    fn test_write_no_records() {
        assert!(write_rows(&[]).unwrap().is_empty());
    }
}
