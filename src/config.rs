use std::env;
use std::path::PathBuf;

/// Ten years; larger stall thresholds are clamped.
pub const MAX_STALL_HOURS: i64 = 24 * 365 * 10;

/// Which store backs the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    /// In-memory demo dataset, lost on restart.
    Mock,
}

/// Hosted generative-language endpoint used by the assistant.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub upload_dir: PathBuf,
    pub stall_hours: i64,
    pub llm: Option<LlmConfig>,
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Mock,
            database_url: None,
            bind_addr: "127.0.0.1:8080".to_string(),
            session_key: None,
            upload_dir: PathBuf::from("data/uploads"),
            stall_hours: 48,
            llm: None,
            admin_password: "admin123".to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let backend = match lookup("OPBOARD_BACKEND").as_deref().map(str::trim) {
            Some("mock") => Backend::Mock,
            Some("postgres") => Backend::Postgres,
            Some(other) => {
                log::warn!("Unknown OPBOARD_BACKEND '{other}', choosing by DATABASE_URL");
                if database_url.is_some() { Backend::Postgres } else { Backend::Mock }
            }
            None if database_url.is_some() => Backend::Postgres,
            None => Backend::Mock,
        };

        let stall_hours = lookup("OPBOARD_STALL_HOURS")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|h| *h > 0)
            .map(|h| {
                if h > MAX_STALL_HOURS {
                    log::warn!("OPBOARD_STALL_HOURS {h} is too large, using {MAX_STALL_HOURS}");
                }
                h.min(MAX_STALL_HOURS)
            })
            .unwrap_or(defaults.stall_hours);

        let llm = match (lookup("OPBOARD_LLM_URL"), lookup("OPBOARD_LLM_KEY")) {
            (Some(url), Some(api_key)) if !url.trim().is_empty() && !api_key.trim().is_empty() => {
                Some(LlmConfig { url: url.trim().to_string(), api_key: api_key.trim().to_string() })
            }
            _ => None,
        };

        Self {
            backend,
            database_url,
            bind_addr: lookup("OPBOARD_BIND").unwrap_or(defaults.bind_addr),
            session_key: lookup("SESSION_KEY"),
            upload_dir: lookup("OPBOARD_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            stall_hours,
            llm,
            admin_password: lookup("OPBOARD_ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_mock_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(cfg.backend, Backend::Mock);
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.stall_hours, 48);
        assert!(cfg.llm.is_none());
    }

    #[test]
    fn database_url_selects_postgres() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/op")]));
        assert_eq!(cfg.backend, Backend::Postgres);
    }

    #[test]
    fn explicit_mock_wins_over_database_url() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/op"),
            ("OPBOARD_BACKEND", "mock"),
        ]));
        assert_eq!(cfg.backend, Backend::Mock);
    }

    #[test]
    fn bad_stall_hours_fall_back() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("OPBOARD_STALL_HOURS", "-3")]));
        assert_eq!(cfg.stall_hours, 48);
        let cfg = AppConfig::from_lookup(lookup_from(&[("OPBOARD_STALL_HOURS", "12")]));
        assert_eq!(cfg.stall_hours, 12);
    }

    #[test]
    fn huge_stall_hours_are_clamped() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("OPBOARD_STALL_HOURS", "3000000000000")]));
        assert_eq!(cfg.stall_hours, MAX_STALL_HOURS);
    }

    #[test]
    fn llm_needs_both_url_and_key() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("OPBOARD_LLM_URL", "https://x")]));
        assert!(cfg.llm.is_none());
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("OPBOARD_LLM_URL", "https://x"),
            ("OPBOARD_LLM_KEY", "k"),
        ]));
        assert!(cfg.llm.is_some());
    }
}
