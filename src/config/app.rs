use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReserveError, Result};

/// Runtime configuration for the reservation server
///
/// Built from defaults, then an optional JSON file, then environment
/// variables, then command line flags (applied in `main`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Address the server binds to
    pub bind_address: String,

    /// Listening port (HTTPS when TLS is configured, HTTP otherwise)
    pub http_port: u16,

    /// Path to certificate PEM file (cert + CA bundle)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,

    /// Path to private key PEM file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,

    /// Brand shown on the landing page and as the profile URL prefix
    pub site_name: String,

    /// How long the "Username Secured!" view stays up before the form resets
    pub success_display_ms: u64,

    /// Delay between verifying and redirecting back to the landing page
    pub verify_redirect_ms: u64,

    /// Upper bound on a single registry lookup or insert
    pub availability_timeout_ms: u64,

    /// Site key rendered in the captcha placeholder (never checked)
    pub captcha_site_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 3000,
            cert_path: None,
            key_path: None,
            site_name: "homicide.lol".to_string(),
            success_display_ms: 2500,
            verify_redirect_ms: 1000,
            availability_timeout_ms: 5000,
            captcha_site_key: "6942-4cf2-9150-77fc50b0e46a".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Config file '{}' not found, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ReserveError::ConfigLoad {
                    path: path.to_string(),
                    message: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| ReserveError::ConfigParse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override fields from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BIND_ADDRESS") {
            self.bind_address = v;
        }
        if let Some(port) = lookup("HTTP_PORT").and_then(|s| s.parse().ok()) {
            self.http_port = port;
        }
        if let Some(v) = lookup("TLS_CERT_PATH") {
            self.cert_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("TLS_KEY_PATH") {
            self.key_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SITE_NAME") {
            self.site_name = v;
        }
        if let Some(ms) = lookup("SUCCESS_DISPLAY_MS").and_then(|s| s.parse().ok()) {
            self.success_display_ms = ms;
        }
        if let Some(ms) = lookup("VERIFY_REDIRECT_MS").and_then(|s| s.parse().ok()) {
            self.verify_redirect_ms = ms;
        }
        if let Some(ms) = lookup("AVAILABILITY_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.availability_timeout_ms = ms;
        }
        if let Some(v) = lookup("CAPTCHA_SITE_KEY") {
            self.captcha_site_key = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.success_display_ms == 0 {
            return Err(ReserveError::ConfigValidation {
                message: "success_display_ms must be greater than zero".to_string(),
            });
        }
        if self.verify_redirect_ms == 0 {
            return Err(ReserveError::ConfigValidation {
                message: "verify_redirect_ms must be greater than zero".to_string(),
            });
        }
        if self.availability_timeout_ms == 0 {
            return Err(ReserveError::ConfigValidation {
                message: "availability_timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.cert_path.is_some() != self.key_path.is_some() {
            return Err(ReserveError::ConfigValidation {
                message: "TLS needs both cert_path and key_path".to_string(),
            });
        }
        Ok(())
    }

    pub fn tls_enabled(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    pub fn availability_timeout(&self) -> Duration {
        Duration::from_millis(self.availability_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_file() {
        let json = r#"{ "http_port": 8080, "site_name": "example.test" }"#;

        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.site_name, "example.test");
        assert_eq!(config.success_display_ms, 2500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("/nonexistent/handle-reserve.json").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_malformed_file() {
        let path = std::env::temp_dir().join(format!("handle-reserve-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ReserveError::ConfigParse { .. }));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HTTP_PORT", "9000"),
            ("SUCCESS_DISPLAY_MS", "100"),
            ("AVAILABILITY_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_with(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.success_display_ms, 100);
        assert_eq!(config.availability_timeout_ms, 5000);
    }

    #[test]
    fn test_validate_rejects_half_tls() {
        let config = AppConfig {
            cert_path: Some(PathBuf::from("certs/cert.pem")),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReserveError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = AppConfig {
            success_display_ms: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
