// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use valvecode_app::{DEFAULT_EXPECTED_CODE_LENGTH, FieldDescriptor, FieldSchema};
use valvecode_sheet::{DEFAULT_BASE_URL, DEFAULT_SHEET_ID};

pub const APP_NAME: &str = "valvecode";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "valvecode.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub sheet: Sheet,
    #[serde(default)]
    pub code: Code,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            sheet: Sheet::default(),
            code: Code::default(),
            fields: Vec::new(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub base_url: Option<String>,
    pub sheet_id: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Sheet {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            sheet_id: Some(DEFAULT_SHEET_ID.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Code {
    pub expected_length: Option<i64>,
}

impl Default for Code {
    fn default() -> Self {
        Self {
            expected_length: Some(DEFAULT_EXPECTED_CODE_LENGTH as i64),
        }
    }
}

/// One `[[fields]]` entry: display column and the column holding its code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldEntry {
    pub key: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("VALVECODE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set VALVECODE_CONFIG_PATH to the config file")
        })?;

        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [sheet], [code], [[fields]], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.sheet.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "sheet.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(sheet_id) = &self.sheet.sheet_id
            && sheet_id.trim().is_empty()
        {
            bail!("sheet.sheet_id in {} must not be empty", path.display());
        }

        if let Some(length) = self.code.expected_length
            && length <= 0
        {
            bail!(
                "code.expected_length in {} must be positive, got {}",
                path.display(),
                length
            );
        }

        if !self.fields.is_empty() {
            self.schema()
                .with_context(|| format!("invalid [[fields]] in {}", path.display()))?;
        }

        Ok(())
    }

    pub fn sheet_base_url(&self) -> &str {
        self.sheet
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn sheet_id(&self) -> &str {
        self.sheet.sheet_id.as_deref().unwrap_or(DEFAULT_SHEET_ID)
    }

    pub fn sheet_timeout(&self) -> Result<Duration> {
        parse_duration(self.sheet.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn expected_length(&self) -> usize {
        self.code
            .expected_length
            .and_then(|length| usize::try_from(length).ok())
            .unwrap_or(DEFAULT_EXPECTED_CODE_LENGTH)
    }

    /// `[[fields]]` when present, else the eleven valve fields.
    pub fn schema(&self) -> Result<FieldSchema> {
        if self.fields.is_empty() {
            return Ok(FieldSchema::valve_default());
        }
        FieldSchema::new(
            self.fields
                .iter()
                .map(|entry| FieldDescriptor::new(entry.key.trim(), entry.code.trim()))
                .collect(),
        )
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join(LOG_FILE_NAME)),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# valvecode config\n# Place this file at: {}\n\nversion = 1\n\n[sheet]\nbase_url = \"{}\"\nsheet_id = \"{}\"\ntimeout = \"{}\"\n\n[code]\nexpected_length = {}\n\n# Optional. Replaces the default valve fields; order is code order.\n# [[fields]]\n# key = \"Valve\"\n# code = \"Valve Code\"\n\n[log]\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/valvecode/valvecode.log)\n# path = \"/absolute/path/to/valvecode.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_SHEET_ID,
            DEFAULT_TIMEOUT,
            DEFAULT_EXPECTED_CODE_LENGTH,
            DEFAULT_LOG_LEVEL,
        )
    }
}

/// Platform data directory for valvecode, e.g. `~/.local/share/valvecode`.
pub fn data_dir() -> Result<PathBuf> {
    let root = dirs::data_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].path in the config"))?;
    Ok(root.join(APP_NAME))
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use valvecode_app::FieldSchema;
    use valvecode_testkit::temp_file;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        temp_file("config.toml", content)
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.sheet_base_url(), "https://docs.google.com/spreadsheets/d");
        assert_eq!(config.sheet_timeout()?, Duration::from_secs(10));
        assert_eq!(config.expected_length(), 18);
        assert_eq!(config.schema()?, FieldSchema::valve_default());
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[sheet]\nsheet_id = \"abc\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[sheet], [code], [[fields]], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn v1_config_parses_all_sections() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[sheet]\nbase_url = \"http://127.0.0.1:9/sheets///\"\nsheet_id = \"abc\"\ntimeout = \"750ms\"\n[code]\nexpected_length = 4\n[[fields]]\nkey = \"Valve\"\ncode = \"Valve Code\"\n[[fields]]\nkey = \" Size \"\ncode = \"Size Code\"\n[log]\nlevel = \"debug\"\npath = \"/tmp/vc.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.sheet_base_url(), "http://127.0.0.1:9/sheets");
        assert_eq!(config.sheet_id(), "abc");
        assert_eq!(config.sheet_timeout()?, Duration::from_millis(750));
        assert_eq!(config.expected_length(), 4);
        let schema = config.schema()?;
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.position("Size"), Some(1));
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/vc.log"));
        Ok(())
    }

    #[test]
    fn duplicate_field_keys_are_rejected() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[[fields]]\nkey = \"Size\"\ncode = \"Size Code\"\n[[fields]]\nkey = \"Size\"\ncode = \"Other\"\n",
        )?;
        let error = Config::load(&path).expect_err("duplicate keys should fail");
        let message = format!("{error:#}");
        assert!(message.contains("invalid [[fields]]"), "{message}");
        assert!(message.contains("more than once"), "{message}");
        Ok(())
    }

    #[test]
    fn non_positive_values_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[code]\nexpected_length = 0\n")?;
        let error = Config::load(&path).expect_err("zero length should fail");
        assert!(error.to_string().contains("must be positive"));

        let (_temp, path) = write_config("version = 1\n[sheet]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));

        let (_temp, path) = write_config("version = 1\n[sheet]\nsheet_id = \"  \"\n")?;
        let error = Config::load(&path).expect_err("blank sheet id should fail");
        assert!(error.to_string().contains("must not be empty"));
        Ok(())
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[sheet]\nsheet_id = \"abc\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.sheet_id(), "abc");
        assert_eq!(config.sheet_base_url(), "https://docs.google.com/spreadsheets/d");
        assert_eq!(config.sheet_timeout()?, Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("VALVECODE_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("VALVECODE_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("VALVECODE_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("valvecode/config.toml"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn oversized_minute_duration_is_rejected() -> Result<()> {
        let error = parse_duration(&format!("{}m", u64::MAX)).expect_err("overflow should fail");
        assert!(error.to_string().contains("too large"));

        let (_temp, path) = write_config(&format!(
            "version = 1\n[sheet]\ntimeout = \"{}m\"\n",
            u64::MAX / 2
        ))?;
        let error = Config::load(&path).expect_err("oversized timeout should fail");
        assert!(error.to_string().contains("too large"));
        Ok(())
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        let message = error.to_string();
        assert!(
            message.contains("invalid duration") || message.contains("invalid timeout duration"),
            "unexpected message: {message}"
        );
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[sheet]"));
        assert!(example.contains("[code]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.expected_length(), 18);
        assert!(config.fields.is_empty());
        Ok(())
    }
}
