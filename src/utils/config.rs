use crate::layout::DEFAULT_LANGUAGE;
use crate::utils::errors::{L10nError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const ACCESS_KEY_ID_ENV: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ACCESS_KEY_SECRET_ENV: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub translation: TranslationDefaults,
    pub api: ApiConfig,
    pub patch: PatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationDefaults {
    pub source_lang: String,
    pub target_lang: String,
    /// Pause after every CSV row, in milliseconds.
    pub sleep_ms: u64,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub region_id: String,
    /// Empty means `https://mt.<region_id>.aliyuncs.com/`.
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub access_key_id: String,
    pub access_key_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub language: String,
    pub strategy: PatchStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStrategy {
    /// Re-escapes text and drops comments.
    Strict,
    /// Keeps comments and writes `&`, `<`, `>` unescaped.
    Preserve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for TranslationDefaults {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "zh".to_string(),
            sleep_ms: 500,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            region_id: "cn-hangzhou".to_string(),
            endpoint: String::new(),
            timeout_seconds: 30,
            access_key_id: String::new(),
            access_key_secret: String::new(),
        }
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            strategy: PatchStrategy::Preserve,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// Keeps the secret out of `{:?}` output.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("region_id", &self.region_id)
            .field("endpoint", &self.endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

impl ApiConfig {
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://mt.{}.aliyuncs.com/", self.region_id)
        } else {
            self.endpoint.clone()
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.access_key_id.is_empty() && !self.access_key_secret.is_empty()
    }
}

impl TranslationDefaults {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }
}

impl FromStr for PatchStrategy {
    type Err = L10nError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(PatchStrategy::Strict),
            "preserve" => Ok(PatchStrategy::Preserve),
            other => Err(L10nError::ConfigError(format!(
                "unknown patch strategy '{}', expected 'strict' or 'preserve'",
                other
            ))),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| L10nError::ConfigError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| L10nError::ConfigError(e.to_string()))
    }

    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load_from_file(p),
            _ => Ok(Self::default()),
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_credentials(
            std::env::var(ACCESS_KEY_ID_ENV).ok(),
            std::env::var(ACCESS_KEY_SECRET_ENV).ok(),
        );
    }

    fn apply_credentials(&mut self, key_id: Option<String>, secret: Option<String>) {
        if let Some(id) = key_id.filter(|v| !v.is_empty()) {
            self.api.access_key_id = id;
        }
        if let Some(secret) = secret.filter(|v| !v.is_empty()) {
            self.api.access_key_secret = secret;
        }
    }
}
