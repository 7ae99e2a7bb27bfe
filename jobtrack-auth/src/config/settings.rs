use crate::error::AuthError;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const OAUTH_SCOPES: &str = "openid email profile";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,

    #[serde(default)]
    pub google_client_id: String,

    #[serde(default = "default_redirect_uri")]
    pub google_redirect_uri: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_url() -> String {
    jobtrack_api::DEFAULT_BASE_URL.to_string()
}

fn default_userinfo_url() -> String {
    jobtrack_api::DEFAULT_USERINFO_URL.to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:5173/oauth/callback".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retry_base_delay_ms() -> u64 {
    1_000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            userinfo_url: default_userinfo_url(),
            google_client_id: String::new(),
            google_redirect_uri: default_redirect_uri(),
            timeout_ms: default_timeout_ms(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("JOBTRACK_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        Self::from_file(Path::new(&config_path))
    }

    /// Load from an optional TOML file, with `JOBTRACK_*` variables on top.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("JOBTRACK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("api_url", &self.api_url),
            ("userinfo_url", &self.userinfo_url),
        ] {
            if value.is_empty() {
                return Err(format!("{} is required", name));
            }
            if !value.starts_with("http") || Url::parse(value).is_err() {
                return Err(format!("{} must be a valid HTTP(S) URL", name));
            }
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Scheme, host and port of the API; credentials are stored per origin.
    pub fn origin(&self) -> Result<String, AuthError> {
        Ok(Url::parse(&self.api_url)?.origin().ascii_serialization())
    }

    /// Google consent page that hands an access token back to the redirect URI.
    pub fn authorization_url(&self) -> Result<Url, AuthError> {
        if self.google_client_id.is_empty() {
            return Err(AuthError::Configuration(
                "google_client_id is required to sign in".to_string(),
            ));
        }

        let url = Url::parse_with_params(
            AUTHORIZATION_ENDPOINT,
            &[
                ("client_id", self.google_client_id.as_str()),
                ("redirect_uri", self.google_redirect_uri.as_str()),
                ("response_type", "token"),
                ("scope", OAUTH_SCOPES),
            ],
        )?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.api_url, "http://localhost:8000/api");
        assert_eq!(settings.timeout(), Duration::from_millis(10_000));
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "api_url = \"https://jobs.example.com/api\"").unwrap();
        writeln!(file, "google_client_id = \"client-123\"").unwrap();
        writeln!(file, "timeout_ms = 2500").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.api_url, "https://jobs.example.com/api");
        assert_eq!(settings.google_client_id, "client-123");
        assert_eq!(settings.timeout(), Duration::from_millis(2500));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn environment_overrides_use_single_underscore_prefix() {
        std::env::set_var(
            "JOBTRACK_GOOGLE_REDIRECT_URI",
            "https://jobs.example.com/oauth/callback",
        );
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_file(&dir.path().join("absent.toml"));
        std::env::remove_var("JOBTRACK_GOOGLE_REDIRECT_URI");

        assert_eq!(
            settings.unwrap().google_redirect_uri,
            "https://jobs.example.com/oauth/callback"
        );
    }

    #[test]
    fn validate_rejects_bad_urls() {
        let settings = Settings {
            api_url: "localhost:8000".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            api_url: String::new(),
            ..Settings::default()
        };
        assert_eq!(settings.validate().unwrap_err(), "api_url is required");
    }

    #[test]
    fn origin_drops_the_path() {
        let settings = Settings {
            api_url: "https://jobs.example.com:8443/api".into(),
            ..Settings::default()
        };
        assert_eq!(settings.origin().unwrap(), "https://jobs.example.com:8443");
    }

    #[test]
    fn authorization_url_requires_client_id() {
        assert!(Settings::default().authorization_url().is_err());

        let settings = Settings {
            google_client_id: "client-123".into(),
            ..Settings::default()
        };
        let url = settings.authorization_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("client_id".into(), "client-123".into())));
        assert!(pairs.contains(&("response_type".into(), "token".into())));
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
    }
}
