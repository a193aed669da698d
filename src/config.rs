use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use crate::diagnosis::{ConfidenceFormula, Lexicon, ScoringPolicy};

/// Application-level constants
pub const APP_NAME: &str = "SymptomChecker";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

const ENV_HOST: &str = "SYMPTOM_CHECKER_HOST";
const ENV_PORT: &str = "SYMPTOM_CHECKER_PORT";
const ENV_PORT_FALLBACK: &str = "PORT";
const ENV_KNOWLEDGE: &str = "SYMPTOM_CHECKER_KNOWLEDGE";
const ENV_LEXICON: &str = "SYMPTOM_CHECKER_LEXICON";
const ENV_REMOTE_URL: &str = "SYMPTOM_CHECKER_REMOTE_URL";
const ENV_REMOTE_TIMEOUT: &str = "SYMPTOM_CHECKER_REMOTE_TIMEOUT_SECS";
const ENV_CONFIDENCE: &str = "SYMPTOM_CHECKER_CONFIDENCE";
const ENV_MIN_MATCHES_HIGH: &str = "SYMPTOM_CHECKER_MIN_MATCHES_HIGH";

/// `RUST_LOG` fallback.
pub fn default_log_filter() -> &'static str {
    "symptom_checker=info,tower_http=info"
}

/// ~/SymptomChecker/ on all platforms. `None` when there is no home directory.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Where an operator-supplied lexicon is picked up when none is configured.
pub fn default_lexicon_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("lexicon.json"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the token-variant lexicon comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexiconSource {
    /// Bundled table, extended by the default file when present.
    Default,
    File(PathBuf),
    Disabled,
}

impl LexiconSource {
    /// Never fails; see [`Lexicon::load_optional`].
    pub fn load(&self) -> Lexicon {
        match self {
            Self::Default => match default_lexicon_path().filter(|p| p.is_file()) {
                Some(path) => Lexicon::load_optional(&path),
                None => Lexicon::builtin(),
            },
            Self::File(path) => Lexicon::load_optional(path),
            Self::Disabled => Lexicon::unavailable(),
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    /// JSON knowledge base; the bundled one when `None`.
    pub knowledge_path: Option<PathBuf>,
    pub lexicon: LexiconSource,
    /// External classifier tried before the rule engine.
    pub remote_url: Option<String>,
    pub remote_timeout_secs: u64,
    pub scoring: ScoringPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            knowledge_path: None,
            lexicon: LexiconSource::Default,
            remote_url: None,
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Read from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(host) = get(ENV_HOST) {
            config.host = parse(ENV_HOST, &host)?;
        }
        if let Some(port) = get(ENV_PORT).or_else(|| get(ENV_PORT_FALLBACK)) {
            config.port = parse(ENV_PORT, &port)?;
        }
        config.knowledge_path = get(ENV_KNOWLEDGE).map(PathBuf::from);
        config.lexicon = match get(ENV_LEXICON) {
            None => LexiconSource::Default,
            Some(v) if v.eq_ignore_ascii_case("off") => LexiconSource::Disabled,
            Some(path) => LexiconSource::File(PathBuf::from(path)),
        };
        config.remote_url = get(ENV_REMOTE_URL);
        if let Some(timeout) = get(ENV_REMOTE_TIMEOUT) {
            config.remote_timeout_secs = parse(ENV_REMOTE_TIMEOUT, &timeout)?;
            if config.remote_timeout_secs == 0 {
                return Err(invalid(ENV_REMOTE_TIMEOUT, &timeout, "must be at least 1"));
            }
        }
        if let Some(formula) = get(ENV_CONFIDENCE) {
            config.scoring.confidence = match formula.to_ascii_lowercase().as_str() {
                "blended" => ConfidenceFormula::Blended,
                "proportion" => ConfidenceFormula::Proportion,
                _ => {
                    return Err(invalid(
                        ENV_CONFIDENCE,
                        &formula,
                        "expected blended or proportion",
                    ))
                }
            };
        }
        if let Some(min) = get(ENV_MIN_MATCHES_HIGH) {
            config.scoring.min_matches_high = parse(ENV_MIN_MATCHES_HIGH, &min)?;
            if config.scoring.min_matches_high == 0 {
                return Err(invalid(ENV_MIN_MATCHES_HIGH, &min, "must be at least 1"));
            }
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| invalid(key, value, &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
