//! Configuration management for Lingua Server

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::ocr::PollPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub speech: SpeechConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// OCR service settings
///
/// Credentials stay optional here; a request that needs them and finds
/// them missing fails with a configuration error.
#[derive(Clone)]
pub struct OcrConfig {
    pub api_url: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub poll: PollPolicy,
}

#[derive(Clone)]
pub struct SpeechConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            ocr: OcrConfig {
                api_url: "https://api.mathpix.com".to_string(),
                app_id: None,
                app_key: None,
                poll: PollPolicy::default(),
            },
            speech: SpeechConfig {
                api_url: "https://api.elevenlabs.io".to_string(),
                api_key: None,
            },
            gemini: GeminiConfig {
                api_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-2.0-flash-001".to_string(),
                api_key: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_attempts: u32 = parse_or(
            &lookup,
            "OCR_POLL_MAX_ATTEMPTS",
            defaults.ocr.poll.max_attempts,
        )?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "OCR_POLL_MAX_ATTEMPTS",
                value: max_attempts.to_string(),
            });
        }
        let delay_ms = parse_or(
            &lookup,
            "OCR_POLL_DELAY_MS",
            defaults.ocr.poll.delay.as_millis() as u64,
        )?;

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "SERVER_PORT", defaults.server.port)?,
            },
            ocr: OcrConfig {
                api_url: lookup("MATHPIX_API_URL").unwrap_or(defaults.ocr.api_url),
                app_id: secret("APP_ID"),
                app_key: secret("APP_KEY"),
                poll: PollPolicy {
                    max_attempts,
                    delay: Duration::from_millis(delay_ms),
                },
            },
            speech: SpeechConfig {
                api_url: lookup("ELEVENLABS_API_URL").unwrap_or(defaults.speech.api_url),
                api_key: secret("ELEVENLABS_API_KEY"),
            },
            gemini: GeminiConfig {
                api_url: lookup("GEMINI_API_URL").unwrap_or(defaults.gemini.api_url),
                model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
                api_key: secret("GEMINI_API_KEY"),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn key_state(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "set"
    } else {
        "missing"
    }
}

// Keys never show up in logs, only whether they are set.
impl std::fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_url", &self.api_url)
            .field("app_id", &key_state(&self.app_id))
            .field("app_key", &key_state(&self.app_key))
            .field("poll", &self.poll)
            .finish()
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &key_state(&self.api_key))
            .finish()
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &key_state(&self.api_key))
            .finish()
    }
}
