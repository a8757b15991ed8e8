// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Why the master data could not be turned into a table. Every variant owns
/// its message so the error can travel across the load thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("cannot reach {url}: {message}")]
    Unreachable { url: String, message: String },
    #[error("sheet request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response of {length} bytes is too short to hold the query envelope")]
    Framing { length: usize },
    #[error("response is not valid JSON: {0}")]
    Json(String),
    #[error("response has no table; check the sheet tab name and sharing permissions")]
    MissingTable,
    #[error("sheet query failed: {0}")]
    Remote(String),
}

impl LoadError {
    /// The single message shown to the user when the load fails.
    pub fn user_message(&self) -> String {
        format!("Failed to load sheet ({self}). Check sheet id, tab name, and sharing permissions.")
    }
}
