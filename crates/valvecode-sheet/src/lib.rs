// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod gviz;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CACHE_CONTROL;
use std::time::Duration;
use url::Url;
use valvecode_app::{LoadError, Table};

pub const DEFAULT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";
pub const DEFAULT_SHEET_ID: &str = "1jvStP_Hoz-3Xu5t0Il1OjUoxkU9GZjDbjzMsRnL31gU";
pub const SHEET_NAME_SUFFIX: &str = "_MasterData";

const ERROR_BODY_LIMIT: usize = 200;

/// Tab holding the master data for a category, e.g. `Gate_Valve_MasterData`.
pub fn sheet_name(category: &str) -> String {
    format!("{category}{SHEET_NAME_SUFFIX}")
}

#[derive(Debug, Clone)]
pub struct SheetClient {
    endpoint: Url,
    http: HttpClient,
}

impl SheetClient {
    pub fn new(base_url: &str, sheet_id: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            bail!("sheet.base_url must not be empty");
        }
        let sheet_id = sheet_id.trim();
        if sheet_id.is_empty() {
            bail!("sheet.sheet_id must not be empty");
        }
        if sheet_id.contains('/') {
            bail!("sheet.sheet_id {sheet_id:?} must be a bare id, not a path or URL");
        }

        let endpoint = Url::parse(&format!("{base_url}/{sheet_id}/gviz/tq"))
            .with_context(|| format!("invalid sheet.base_url {base_url:?}"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { endpoint, http })
    }

    pub fn sheet_url(&self, category: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("tqx", "out:json")
            .append_pair("sheet", &sheet_name(category));
        url
    }

    pub fn fetch_text(&self, category: &str) -> Result<String, LoadError> {
        let url = self.sheet_url(category);
        tracing::info!(%url, category, "fetching master data");

        let response = self
            .http
            .get(url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .map_err(|error| unreachable(&url, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LoadError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        response.text().map_err(|error| unreachable(&url, &error))
    }

    pub fn load_table(&self, category: &str) -> Result<Table, LoadError> {
        let result = self
            .fetch_text(category)
            .and_then(|text| gviz::parse_table(&text));
        match &result {
            Ok(table) => tracing::info!(category, rows = table.len(), "master data loaded"),
            Err(error) => tracing::warn!(category, %error, "master data load failed"),
        }
        result
    }
}

fn unreachable(url: &Url, error: &reqwest::Error) -> LoadError {
    LoadError::Unreachable {
        url: url.to_string(),
        message: error.to_string(),
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_LIMIT {
        return trimmed.to_owned();
    }
    let mut out: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
    out.push('…');
    out
}
