// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One dataset record. Values are stored trimmed and an empty string means
/// the cell is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.insert(column, value.as_ref());
        }
        row
    }

    /// Sets a cell, replacing any earlier value for the same column.
    pub fn insert(&mut self, column: impl Into<String>, value: &str) {
        self.cells.insert(column.into(), value.trim().to_owned());
    }

    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map_or("", String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|value| value.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

/// Rows in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter().filter(|row| !row.is_blank()).collect(),
        }
    }

    /// Keeps every row. For loaders that already judged blankness on the
    /// raw source cells, including columns that never became labels.
    pub fn from_screened(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows.iter().map(move |row| row.get(column))
    }

    pub fn first_matching(&self, column: &str, value: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.get(column) == value)
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
