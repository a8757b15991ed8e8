// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FieldSchema, Selection, Table};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedCode {
    pub code: String,
    pub length: usize,
    pub expected_length: usize,
    pub valid: bool,
}

impl DerivedCode {
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn status_label(&self) -> String {
        if self.is_empty() {
            "Length = 0 (no code)".to_owned()
        } else if self.valid {
            format!("Length = {} (OK)", self.length)
        } else {
            format!(
                "Length = {} (expected {})",
                self.length, self.expected_length
            )
        }
    }
}

/// Concatenates, in schema order, the code column of the first row matching
/// each selected display value. Unselected fields and selections with no
/// matching row contribute nothing. Never fails.
pub fn derive_code(
    table: &Table,
    schema: &FieldSchema,
    selection: &Selection,
    expected_length: usize,
) -> DerivedCode {
    let code: String = schema
        .fields()
        .iter()
        .filter_map(|field| {
            let chosen = selection.get(&field.key)?;
            table
                .first_matching(&field.key, chosen)
                .map(|row| row.get(&field.code_column))
        })
        .collect();

    let length = code.chars().count();
    DerivedCode {
        valid: length == expected_length,
        code,
        length,
        expected_length,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub picked: usize,
    pub total: usize,
}

impl Progress {
    pub fn label(self) -> String {
        format!("{} / {} selected", self.picked, self.total)
    }
}

pub fn progress(schema: &FieldSchema, selection: &Selection) -> Progress {
    Progress {
        picked: schema
            .fields()
            .iter()
            .filter(|field| selection.contains(&field.key))
            .count(),
        total: schema.len(),
    }
}
