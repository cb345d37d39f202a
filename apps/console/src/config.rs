use std::{collections::HashMap, fs, path::Path};

pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub identity_key: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000/api".into(),
            identity_key: "demo-user-id".into(),
            request_timeout_secs: None,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then `path` (flat keys), then environment variables.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_config(&mut settings, &file_cfg),
            Err(err) => tracing::warn!(path = %path.display(), %err, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = env("IDENTITY_KEY") {
        settings.identity_key = v;
    }
    if let Some(v) = env("APP__IDENTITY_KEY") {
        settings.identity_key = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Some(secs) = parse_timeout(&v) {
            settings.request_timeout_secs = Some(secs);
        }
    }

    settings
}

fn apply_file_config(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("backend_url").and_then(toml::Value::as_str) {
        settings.backend_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("identity_key").and_then(toml::Value::as_str) {
        settings.identity_key = v.to_string();
    }
    let timeout = file_cfg.get("request_timeout_secs").and_then(|v| match v {
        toml::Value::Integer(secs) => u64::try_from(*secs).ok().filter(|secs| *secs > 0),
        toml::Value::String(raw) => parse_timeout(raw),
        _ => None,
    });
    if timeout.is_some() {
        settings.request_timeout_secs = timeout;
    }
}

// Zero means "no timeout" and is treated as unset.
fn parse_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
