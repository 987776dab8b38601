use std::{fs, path::PathBuf, time::Duration};

use cinema_client::DEFAULT_BASE_URL;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "cinema.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub session_file: PathBuf,
    pub log_filter: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            session_file: default_session_file(),
            log_filter: "warn".into(),
            timeout_seconds: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }
}

/// Keys accepted in `cinema.toml`.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    session_file: Option<PathBuf>,
    log_filter: Option<String>,
    timeout_seconds: Option<u64>,
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("cinema").join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".cinema-session.json"))
}

/// Settings plus any problems found while reading them. The caller logs the
/// warnings once tracing is installed.
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub warnings: Vec<String>,
}

pub fn load_settings() -> LoadedSettings {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();
    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file(&mut settings, &raw, &mut warnings);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok(), &mut warnings);
    LoadedSettings { settings, warnings }
}

fn apply_file(settings: &mut Settings, raw: &str, warnings: &mut Vec<String>) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warnings.push(format!("ignoring unreadable {SETTINGS_FILE}: {err}"));
            return;
        }
    };
    if let Some(v) = file_cfg.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file_cfg.session_file {
        settings.session_file = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.timeout_seconds {
        settings.timeout_seconds = Some(v);
    }
}

fn apply_env(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<String>,
) {
    if let Some(v) = var("CINEMA_API_URL") {
        settings.base_url = v;
    }
    if let Some(v) = var("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = var("CINEMA_SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }
    if let Some(v) = var("APP__SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = var("APP__TIMEOUT_SECONDS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.timeout_seconds = Some(parsed),
            Err(_) => warnings.push(format!("APP__TIMEOUT_SECONDS is not a number: {v:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "http://localhost:8080/api");
        assert!(settings.session_file.ends_with("session.json"));
        assert_eq!(settings.timeout(), None);
    }

    #[test]
    fn file_then_env_override() {
        let mut settings = Settings::default();
        let mut warnings = Vec::new();
        apply_file(
            &mut settings,
            r#"
                base_url = "http://cinema.internal/api"
                timeout_seconds = 15
            "#,
            &mut warnings,
        );
        assert!(warnings.is_empty());
        assert_eq!(settings.base_url, "http://cinema.internal/api");
        assert_eq!(settings.timeout(), Some(Duration::from_secs(15)));

        apply_env(
            &mut settings,
            env(&[
                ("CINEMA_API_URL", "http://a/api"),
                ("APP__BASE_URL", "http://b/api"),
                ("APP__SESSION_FILE", "/tmp/s.json"),
                ("APP__TIMEOUT_SECONDS", "soon"),
            ]),
            &mut warnings,
        );
        assert_eq!(settings.base_url, "http://b/api");
        assert_eq!(settings.session_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(settings.timeout_seconds, Some(15));
        assert_eq!(warnings, vec![r#"APP__TIMEOUT_SECONDS is not a number: "soon""#]);
    }

    #[test]
    fn broken_file_is_ignored() {
        let mut settings = Settings::default();
        let mut warnings = Vec::new();
        apply_file(&mut settings, "base_url = [", &mut warnings);
        assert_eq!(settings, Settings::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("ignoring unreadable cinema.toml"));
    }
}
