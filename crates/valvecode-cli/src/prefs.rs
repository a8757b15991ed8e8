// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Read-only preferences shared with other valvecode front ends. Only the
//! selected valve category is consulted.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use valvecode_app::DEFAULT_CATEGORY;

const PREFS_FILE_NAME: &str = "prefs.toml";

#[derive(Debug, Default, Deserialize)]
struct Prefs {
    selected_valve: Option<String>,
}

pub fn default_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os("VALVECODE_PREFS_PATH") {
        return Ok(PathBuf::from(path));
    }
    Ok(crate::config::data_dir()?.join(PREFS_FILE_NAME))
}

/// Category stored under `selected_valve`, or `Gate_Valve` when the file or
/// key is missing or blank.
pub fn selected_category(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(DEFAULT_CATEGORY.to_owned());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("read preferences {}", path.display()))?;
    let prefs: Prefs = toml::from_str(&raw)
        .with_context(|| format!("parse preferences {}", path.display()))?;

    Ok(prefs
        .selected_valve
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()))
}
