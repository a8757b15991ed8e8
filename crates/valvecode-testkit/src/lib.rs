// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::PathBuf;
use valvecode_app::{FieldSchema, Row, Table};

pub const GVIZ_PREFIX: &str = "/*O_o*/\ngoogle.visualization.Query.setResponse(";
pub const GVIZ_SUFFIX: &str = ");";

/// Display/code column pairs in the default valve schema order.
pub const VALVE_COLUMNS: [&str; 22] = [
    "Valve",
    "Valve Code",
    "Valve Type",
    "Valve Type Code",
    "Size",
    "Size Code",
    "Class",
    "Class Code",
    "End Connection",
    "End Connection Code",
    "End Detail",
    "End Detail Code",
    "Shell/Bolting",
    "Shell/Bolting Code",
    "Trim",
    "Trim Code",
    "Gasket and Packing",
    "Gasket and Packing Code",
    "Operation",
    "Operation Code",
    "Special Testing",
    "Special Testing Code",
];

const VALVE_ROWS: [[&str; 22]; 3] = [
    [
        "Gate",
        "GA",
        "Bolted Bonnet",
        "B",
        "2\"",
        "02",
        "150#",
        "15",
        "Flanged",
        "F",
        "RF",
        "R",
        "A216 WCB/B7",
        "WB",
        "Trim 8",
        "T8",
        "Graphite",
        "G",
        "Handwheel",
        "HW",
        "None",
        "00",
    ],
    [
        "Gate",
        "GA",
        "Pressure Seal",
        "P",
        "4\"",
        "04",
        "300#",
        "30",
        "Butt Weld",
        "W",
        "BW End",
        "E",
        "A351 CF8M/B8M",
        "SS",
        "Trim 12",
        "TC",
        "PTFE",
        "P",
        "Gear",
        "GO",
        "NACE",
        "NC",
    ],
    [
        "Gate",
        "GX",
        "",
        "",
        "6\"",
        "06",
        "",
        "",
        "",
        "",
        "RTJ",
        "J",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
    ],
];

/// Picks that yield [`VALVE_FULL_CODE`] against [`valve_table`].
pub const VALVE_FULL_SELECTION: [(&str, &str); 11] = [
    ("Valve", "Gate"),
    ("Valve Type", "Bolted Bonnet"),
    ("Size", "2\""),
    ("Class", "150#"),
    ("End Connection", "Flanged"),
    ("End Detail", "RF"),
    ("Shell/Bolting", "A216 WCB/B7"),
    ("Trim", "Trim 8"),
    ("Gasket and Packing", "Graphite"),
    ("Operation", "Handwheel"),
    ("Special Testing", "None"),
];

pub const VALVE_FULL_CODE: &str = "GAB0215FRWBT8GHW00";

pub fn valve_schema() -> FieldSchema {
    FieldSchema::valve_default()
}

pub fn valve_rows() -> Vec<Row> {
    VALVE_ROWS
        .iter()
        .map(|cells| Row::from_pairs(VALVE_COLUMNS.iter().copied().zip(cells.iter().copied())))
        .collect()
}

pub fn valve_table() -> Table {
    Table::new(valve_rows())
}

/// Cell matrix for [`valve_gviz_body`]: the three valve rows plus one fully
/// blank row that loading must drop.
pub fn valve_cells() -> Vec<Vec<Value>> {
    let mut rows: Vec<Vec<Value>> = VALVE_ROWS
        .iter()
        .map(|cells| {
            cells
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::from(*cell)
                    }
                })
                .collect()
        })
        .collect();
    rows.push(vec![Value::Null; VALVE_COLUMNS.len()]);
    rows
}

pub fn valve_gviz_body() -> String {
    gviz_body(&VALVE_COLUMNS, &valve_cells())
}

/// Frames a table the way the sheet endpoint does. `Value::Null` cells become
/// `null` entries in the row's `c` array.
pub fn gviz_body(columns: &[&str], rows: &[Vec<Value>]) -> String {
    let cols: Vec<Value> = columns
        .iter()
        .enumerate()
        .map(|(index, label)| json!({ "id": column_id(index), "label": label, "type": "string" }))
        .collect();
    let rows: Vec<Value> = rows
        .iter()
        .map(|cells| {
            let cells: Vec<Value> = cells
                .iter()
                .map(|cell| match cell {
                    Value::Null => Value::Null,
                    other => json!({ "v": other }),
                })
                .collect();
            json!({ "c": cells })
        })
        .collect();

    frame(&json!({
        "version": "0.6",
        "reqId": "0",
        "status": "ok",
        "sig": "1650217231",
        "table": { "cols": cols, "rows": rows, "parsedNumHeaders": 1 },
    }))
}

pub fn gviz_error_body(message: &str) -> String {
    frame(&json!({
        "version": "0.6",
        "reqId": "0",
        "status": "error",
        "errors": [{
            "reason": "invalid_query",
            "message": "INVALID_QUERY",
            "detailed_message": message,
        }],
    }))
}

fn frame(payload: &Value) -> String {
    format!("{GVIZ_PREFIX}{payload}{GVIZ_SUFFIX}")
}

fn column_id(index: usize) -> String {
    let mut id = String::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        id.insert(0, char::from(b'A' + digit as u8));
        remaining = (remaining - 1) / 26;
    }
    id
}

pub fn temp_file(name: &str, content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(name);
    std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

const VALUE_STEMS: [&str; 8] = ["alpha", "Beta", "gamma", "Delta", "épsilon", "Zeta", "eta", "THETA"];

/// Seeded generator of master-data tables for property-style checks.
#[derive(Debug, Clone)]
pub struct ValveFaker {
    rng: DeterministicRng,
}

impl ValveFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    /// Rows drawn from a small value pool per field so duplicates and blanks
    /// are common. A display value always maps to the same code.
    pub fn table(&mut self, schema: &FieldSchema, rows: usize) -> Table {
        (0..rows)
            .map(|_| {
                let mut row = Row::new();
                for (field_index, field) in schema.fields().iter().enumerate() {
                    let pick = self.rng.int_n(VALUE_STEMS.len() + 2);
                    let Some(stem) = VALUE_STEMS.get(pick) else {
                        continue;
                    };
                    row.insert(field.key.clone(), &format!("{stem} {field_index}"));
                    row.insert(field.code_column.clone(), &format!("{pick}{field_index}"));
                }
                row
            })
            .collect()
    }

    pub fn filter(&mut self) -> String {
        let stem = VALUE_STEMS[self.rng.int_n(VALUE_STEMS.len())];
        let start = self.rng.int_n(stem.len().saturating_sub(1));
        stem.chars()
            .skip(start)
            .take(1 + self.rng.int_n(3))
            .collect::<String>()
            .to_uppercase()
    }

    pub fn index(&mut self, bound: usize) -> usize {
        self.rng.int_n(bound)
    }
}
