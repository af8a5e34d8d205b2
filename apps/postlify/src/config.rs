use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::ServiceOptions;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "postlify.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub default_user_id: i64,
    pub list_limit: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://dummyjson.com".into(),
            default_user_id: 1,
            list_limit: None,
            request_timeout_secs: None,
            log_filter: "warn".into(),
        }
    }
}

impl Settings {
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            base_url: self.base_url.clone(),
            list_limit: self.list_limit,
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if let Some(v) = file.default_user_id {
            self.default_user_id = v;
        }
        if let Some(v) = file.list_limit {
            self.list_limit = Some(v);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = Some(v);
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
    }

    /// Applies environment overrides. Returns a message for every value that
    /// was present but could not be parsed.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(v) = lookup("POSTLIFY_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("APP__BASE_URL") {
            self.base_url = v;
        }

        for key in ["POSTLIFY_USER_ID", "APP__USER_ID"] {
            if let Some(v) = lookup(key) {
                match v.trim().parse::<i64>() {
                    Ok(parsed) => self.default_user_id = parsed,
                    Err(_) => warnings.push(format!("ignoring {key}={v}: not an integer")),
                }
            }
        }

        if let Some(v) = lookup("POSTLIFY_LIST_LIMIT") {
            match v.trim().parse::<u32>() {
                Ok(parsed) => self.list_limit = Some(parsed),
                Err(_) => warnings.push(format!("ignoring POSTLIFY_LIST_LIMIT={v}: not a count")),
            }
        }

        if let Some(v) = lookup("POSTLIFY_TIMEOUT_SECS") {
            match v.trim().parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = Some(parsed),
                Err(_) => {
                    warnings.push(format!("ignoring POSTLIFY_TIMEOUT_SECS={v}: not seconds"))
                }
            }
        }

        if let Some(v) = lookup("POSTLIFY_LOG") {
            self.log_filter = v;
        }

        warnings
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    base_url: Option<String>,
    default_user_id: Option<i64>,
    list_limit: Option<u32>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

fn parse_file(raw: &str) -> anyhow::Result<FileSettings> {
    Ok(toml::from_str(raw)?)
}

/// Builds settings from defaults, the config file and the environment.
///
/// `postlify.toml` in the working directory is optional; a file named with
/// `--config` must exist. Tracing is not installed yet when this runs, so
/// problems with environment values are returned for the caller to log.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<(Settings, Vec<String>)> {
    let mut settings = Settings::default();
    let path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file = parse_file(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
            settings.apply_file(file);
        }
        Err(err) if err.kind() == ErrorKind::NotFound && explicit_path.is_none() => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    let warnings = settings.apply_env(|key| std::env::var(key).ok());
    Ok((settings, warnings))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
