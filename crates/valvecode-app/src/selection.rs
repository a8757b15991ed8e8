// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::FieldSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field key to chosen display value. Cleared fields have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    entries: BTreeMap<String, String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pick. An empty value removes the entry instead of storing it.
    pub fn select(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.entries.remove(&key);
            return;
        }
        self.entries.insert(key, value);
    }

    /// Removes every entry at schema position `start` or later and returns the
    /// removed keys in schema order.
    pub fn clear_from(&mut self, schema: &FieldSchema, start: usize) -> Vec<String> {
        schema
            .fields()
            .iter()
            .skip(start)
            .filter_map(|field| {
                self.entries
                    .remove(&field.key)
                    .map(|_| field.key.clone())
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}
