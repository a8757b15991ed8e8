// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Decoding of the spreadsheet query endpoint's JSON-in-JavaScript response.

use serde::Deserialize;
use serde_json::Value;
use valvecode_app::{LoadError, Row, Table};

/// `/*O_o*/\ngoogle.visualization.Query.setResponse(`
const ENVELOPE_PREFIX_LEN: usize = 47;
/// `);`
const ENVELOPE_SUFFIX_LEN: usize = 2;

pub fn strip_envelope(text: &str) -> Result<&str, LoadError> {
    let length = text.len();
    let end = length
        .checked_sub(ENVELOPE_SUFFIX_LEN)
        .filter(|end| *end >= ENVELOPE_PREFIX_LEN)
        .ok_or(LoadError::Framing { length })?;
    text.get(ENVELOPE_PREFIX_LEN..end)
        .ok_or(LoadError::Framing { length })
}

pub fn parse_table(text: &str) -> Result<Table, LoadError> {
    let payload = strip_envelope(text)?;
    let response: QueryResponse =
        serde_json::from_str(payload).map_err(|error| LoadError::Json(error.to_string()))?;

    if response.status.as_deref() == Some("error") {
        let message = response
            .errors
            .into_iter()
            .find_map(|error| error.detailed_message.or(error.message))
            .unwrap_or_else(|| "unknown error".to_owned());
        return Err(LoadError::Remote(message));
    }

    let table = response.table.ok_or(LoadError::MissingTable)?;
    let labels: Vec<Option<String>> = table
        .cols
        .iter()
        .map(|column| {
            column
                .label
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_owned)
        })
        .collect();

    let rows: Vec<Row> = table
        .rows
        .iter()
        .filter(|row| has_content(row))
        .map(|row| {
            let mut out = Row::new();
            for (index, label) in labels.iter().enumerate() {
                let Some(label) = label else {
                    continue;
                };
                let text = row
                    .c
                    .get(index)
                    .and_then(Option::as_ref)
                    .map(|cell| cell_text(&cell.v))
                    .unwrap_or_default();
                out.insert(label.clone(), &text);
            }
            out
        })
        .collect();

    let parsed = Table::from_screened(rows);
    tracing::debug!(
        columns = labels.iter().flatten().count(),
        source_rows = table.rows.len(),
        rows = parsed.len(),
        "decoded sheet table"
    );
    Ok(parsed)
}

/// A source row counts when any raw cell, labelled or not, holds text.
fn has_content(row: &QueryRow) -> bool {
    row.c
        .iter()
        .flatten()
        .any(|cell| !cell_text(&cell.v).trim().is_empty())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                integer.to_string()
            } else if let Some(unsigned) = number.as_u64() {
                unsigned.to_string()
            } else {
                let float = number.as_f64().unwrap_or_default();
                if float.fract() == 0.0 && float.abs() < 1e21 {
                    format!("{float:.0}")
                } else {
                    float.to_string()
                }
            }
        }
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<QueryError>,
    #[serde(default)]
    table: Option<QueryTable>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detailed_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryTable {
    cols: Vec<QueryColumn>,
    rows: Vec<QueryRow>,
}

#[derive(Debug, Deserialize)]
struct QueryColumn {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    c: Vec<Option<QueryCell>>,
}

#[derive(Debug, Deserialize)]
struct QueryCell {
    #[serde(default)]
    v: Value,
}

#[cfg(test)]
mod tests {
    use super::{cell_text, parse_table, strip_envelope};
    use serde_json::{Value, json};
    use valvecode_app::LoadError;

    const PREFIX: &str = "/*O_o*/\ngoogle.visualization.Query.setResponse(";

    fn framed(payload: &Value) -> String {
        format!("{PREFIX}{payload});")
    }

    #[test]
    fn strip_envelope_removes_fixed_prefix_and_suffix() -> Result<(), LoadError> {
        let text = format!("{PREFIX}{{\"a\":1}});");
        assert_eq!(strip_envelope(&text)?, "{\"a\":1}");
        assert_eq!(strip_envelope(&format!("{PREFIX});"))?, "");
        Ok(())
    }

    #[test]
    fn strip_envelope_rejects_short_text() {
        assert_eq!(
            strip_envelope("<html>"),
            Err(LoadError::Framing { length: 6 })
        );
        assert_eq!(strip_envelope(""), Err(LoadError::Framing { length: 0 }));
    }

    #[test]
    fn parse_table_maps_labels_to_cells() -> Result<(), LoadError> {
        let text = framed(&json!({
            "status": "ok",
            "table": {
                "cols": [{"label": " Valve "}, {"label": "Valve Code"}, {"label": ""}, {}],
                "rows": [
                    {"c": [{"v": " Gate "}, {"v": "GV"}, {"v": "ignored"}, {"v": "x"}]},
                    {"c": [{"v": "Ball"}]},
                ],
            },
        }));

        let table = parse_table(&text)?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].get("Valve"), "Gate");
        assert_eq!(table.rows()[0].get("Valve Code"), "GV");
        assert_eq!(table.rows()[0].columns().count(), 2);
        assert_eq!(table.rows()[1].get("Valve Code"), "");
        Ok(())
    }

    #[test]
    fn parse_table_drops_blank_rows_and_null_cells() -> Result<(), LoadError> {
        let text = framed(&json!({
            "table": {
                "cols": [{"label": "Valve"}, {"label": "Size"}],
                "rows": [
                    {"c": [null, {"v": null}]},
                    {"c": [{"v": "  "}, null]},
                    {"c": [null, {"v": "2in"}]},
                    {"c": []},
                ],
            },
        }));

        let table = parse_table(&text)?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("Size"), "2in");
        assert_eq!(table.rows()[0].get("Valve"), "");
        Ok(())
    }

    #[test]
    fn rows_with_text_only_in_unlabelled_columns_are_kept() -> Result<(), LoadError> {
        let text = framed(&json!({
            "table": {
                "cols": [{"label": "Valve"}, {"label": ""}, {}],
                "rows": [
                    {"c": [null, {"v": "note"}, null]},
                    {"c": [{"v": "Gate"}, null, null]},
                    {"c": [null, {"v": " "}, {"v": null}]},
                ],
            },
        }));

        let table = parse_table(&text)?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].get("Valve"), "");
        assert_eq!(table.rows()[1].get("Valve"), "Gate");
        Ok(())
    }

    #[test]
    fn duplicate_labels_keep_the_later_column() -> Result<(), LoadError> {
        let text = framed(&json!({
            "table": {
                "cols": [{"label": "Size"}, {"label": "Size"}],
                "rows": [{"c": [{"v": "first"}, {"v": "second"}]}],
            },
        }));
        let table = parse_table(&text)?;
        assert_eq!(table.rows()[0].get("Size"), "second");
        Ok(())
    }

    #[test]
    fn error_status_surfaces_detailed_message() {
        let text = framed(&json!({
            "status": "error",
            "errors": [{"message": "INVALID_QUERY", "detailed_message": "Invalid sheet Foo_MasterData"}],
        }));
        assert_eq!(
            parse_table(&text),
            Err(LoadError::Remote("Invalid sheet Foo_MasterData".to_owned()))
        );
    }

    #[test]
    fn missing_table_and_bad_json_are_load_errors() {
        let missing = framed(&json!({"status": "ok"}));
        assert_eq!(parse_table(&missing), Err(LoadError::MissingTable));

        let bad = format!("{PREFIX}{{not json);");
        assert!(matches!(parse_table(&bad), Err(LoadError::Json(_))));

        let wrong_shape = framed(&json!({"table": {"cols": "nope", "rows": []}}));
        assert!(matches!(parse_table(&wrong_shape), Err(LoadError::Json(_))));
    }

    #[test]
    fn scalar_cells_are_stringified() {
        assert_eq!(cell_text(&json!(2)), "2");
        assert_eq!(cell_text(&json!(2.0)), "2");
        assert_eq!(cell_text(&json!(2.5)), "2.5");
        assert_eq!(cell_text(&json!(-3)), "-3");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!("150#")), "150#");
    }
}
