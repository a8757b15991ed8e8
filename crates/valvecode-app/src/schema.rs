// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_EXPECTED_CODE_LENGTH: usize = 18;

const VALVE_FIELDS: [(&str, &str); 11] = [
    ("Valve", "Valve Code"),
    ("Valve Type", "Valve Type Code"),
    ("Size", "Size Code"),
    ("Class", "Class Code"),
    ("End Connection", "End Connection Code"),
    ("End Detail", "End Detail Code"),
    ("Shell/Bolting", "Shell/Bolting Code"),
    ("Trim", "Trim Code"),
    ("Gasket and Packing", "Gasket and Packing Code"),
    ("Operation", "Operation Code"),
    ("Special Testing", "Special Testing Code"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub code_column: String,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, code_column: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code_column: code_column.into(),
        }
    }

    pub fn placeholder(&self) -> String {
        format!("Select {}…", self.key)
    }
}

/// Ordered field list. Order drives both presentation and code concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        if fields.is_empty() {
            bail!("field schema must list at least one field");
        }

        let mut seen = BTreeSet::new();
        for field in &fields {
            if field.key.trim().is_empty() {
                bail!("field key must not be empty");
            }
            if field.code_column.trim().is_empty() {
                bail!("field {:?} has an empty code column", field.key);
            }
            if !seen.insert(field.key.as_str()) {
                bail!("field key {:?} appears more than once", field.key);
            }
        }

        Ok(Self { fields })
    }

    pub fn valve_default() -> Self {
        Self {
            fields: VALVE_FIELDS
                .iter()
                .map(|(key, code)| FieldDescriptor::new(*key, *code))
                .collect(),
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.key == key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::valve_default()
    }
}
