//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Default location of the trained model artifact.
pub const DEFAULT_MODEL_PATH: &str = "training/models/document_classifier.json";

/// Default Tesseract language set (Finnish + English).
pub const DEFAULT_OCR_LANGUAGES: &str = "fin+eng";

/// Service configuration, built from `DOCCLASS_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Trained model artifact; a missing file means rules-only.
    pub model_path: PathBuf,
    /// Tesseract `-l` argument.
    pub ocr_languages: String,
    /// Tesseract executable.
    pub tesseract_bin: String,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,
    /// Directory for rolling log files (stderr only when unset).
    pub log_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            tesseract_bin: "tesseract".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            cors_origins: vec!["*".to_string()],
            log_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// Unset or blank variables take their defaults; set but unparsable
    /// values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host = get("DOCCLASS_HOST").unwrap_or(defaults.host);
        let port = parse_var(&get, "DOCCLASS_PORT")?.unwrap_or(defaults.port);
        let model_path = get("DOCCLASS_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let ocr_languages = get("DOCCLASS_OCR_LANG").unwrap_or(defaults.ocr_languages);
        let tesseract_bin = get("DOCCLASS_TESSERACT_BIN").unwrap_or(defaults.tesseract_bin);

        let max_upload_bytes =
            parse_var(&get, "DOCCLASS_MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes);
        if max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DOCCLASS_MAX_UPLOAD_BYTES".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let cors_origins = match get("DOCCLASS_CORS_ORIGINS") {
            Some(raw) => {
                let origins: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if origins.is_empty() {
                    defaults.cors_origins
                } else {
                    origins
                }
            }
            None => defaults.cors_origins,
        };

        let log_dir = get("DOCCLASS_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            host,
            port,
            model_path,
            ocr_languages,
            tesseract_bin,
            max_upload_bytes,
            cors_origins,
            log_dir,
        })
    }

    /// `host:port` socket address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.ocr_languages, "fin+eng");
        assert!(config.allows_any_origin());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("DOCCLASS_HOST", "127.0.0.1"),
            ("DOCCLASS_PORT", "8081"),
            ("DOCCLASS_MODEL_PATH", "/srv/model.json"),
            ("DOCCLASS_OCR_LANG", "eng"),
            ("DOCCLASS_MAX_UPLOAD_BYTES", "2048"),
            ("DOCCLASS_CORS_ORIGINS", "http://localhost:8080, https://app.example.com"),
            ("DOCCLASS_LOG_DIR", "/var/log/docclass"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.ocr_languages, "eng");
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:8080", "https://app.example.com"]
        );
        assert!(!config.allows_any_origin());
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/docclass")));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config_from(&[("DOCCLASS_PORT", "eighty")]).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "DOCCLASS_PORT"),
        }
    }

    #[test]
    fn zero_upload_limit_is_an_error() {
        assert!(config_from(&[("DOCCLASS_MAX_UPLOAD_BYTES", "0")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("DOCCLASS_PORT", "  "), ("DOCCLASS_CORS_ORIGINS", " , ")])
            .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.cors_origins, vec!["*"]);
    }
}
