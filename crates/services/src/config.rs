use std::env;
use std::time::Duration;

use classroom_core::model::UserId;
use url::Url;

use crate::error::ConfigError;
use crate::session::{Role, Session};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DRAFTS_DB: &str = "sqlite://classroom-drafts.sqlite3";

/// Where and how to reach the classroom backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Always ends with `/` so relative endpoint paths join below it.
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Url` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Start-up configuration read from `CLASSROOM_*` variables.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub session: Session,
    pub drafts_db: String,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("CLASSROOM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let timeout_secs = match get("CLASSROOM_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid {
                    key: "CLASSROOM_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let api = ApiConfig::new(&base_url)?.with_timeout(Duration::from_secs(timeout_secs));

        let token = get("CLASSROOM_API_TOKEN").ok_or(ConfigError::Missing("CLASSROOM_API_TOKEN"))?;
        let role = match get("CLASSROOM_ROLE") {
            Some(raw) => raw.parse::<Role>().map_err(|reason| ConfigError::Invalid {
                key: "CLASSROOM_ROLE",
                value: raw.clone(),
                reason,
            })?,
            None => Role::Teacher,
        };
        let raw_user = get("CLASSROOM_USER_ID").ok_or(ConfigError::Missing("CLASSROOM_USER_ID"))?;
        let user_id = raw_user
            .parse::<UserId>()
            .map_err(|e| ConfigError::Invalid {
                key: "CLASSROOM_USER_ID",
                value: raw_user.clone(),
                reason: e.to_string(),
            })?;

        let drafts_db = get("CLASSROOM_DRAFTS_DB").unwrap_or_else(|| DEFAULT_DRAFTS_DB.into());

        Ok(Self {
            api,
            session: Session::new(token, role, user_id),
            drafts_db,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults_for_optional_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CLASSROOM_API_TOKEN", "abc"),
            ("CLASSROOM_USER_ID", "12"),
        ]))
        .unwrap();
        assert_eq!(config.api.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.api.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.session.role(), Role::Teacher);
        assert_eq!(config.session.user_id(), UserId::new(12));
        assert_eq!(config.drafts_db, DEFAULT_DRAFTS_DB);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = ApiConfig::new("https://lms.example.org/backend").unwrap();
        assert_eq!(config.base_url.as_str(), "https://lms.example.org/backend/");
        assert_eq!(
            config.base_url.join("api/questions/3").unwrap().as_str(),
            "https://lms.example.org/backend/api/questions/3"
        );
    }

    #[test]
    fn missing_token_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[("CLASSROOM_USER_ID", "1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLASSROOM_API_TOKEN")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("CLASSROOM_API_TOKEN", "abc"),
            ("CLASSROOM_USER_ID", "1"),
            ("CLASSROOM_ROLE", "principal"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CLASSROOM_ROLE", .. }));

        let err = AppConfig::from_lookup(lookup(&[
            ("CLASSROOM_API_TOKEN", "abc"),
            ("CLASSROOM_USER_ID", "not-a-number"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CLASSROOM_USER_ID", .. }));

        let err = AppConfig::from_lookup(lookup(&[
            ("CLASSROOM_API_TOKEN", "abc"),
            ("CLASSROOM_USER_ID", "1"),
            ("CLASSROOM_API_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Url(_)));
    }
}
