use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const AI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const STORAGE_URL_ENV: &str = "APPS_SCRIPT_URL";
pub const ENVIRONMENT_ENV: &str = "NODE_ENV";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Timeout for {0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("Empty AI model name")]
    EmptyModel,

    #[error("Invalid storage URL {0}: {1}")]
    InvalidStorageUrl(String, url::ParseError),
}

/// Deployment mode. Development responses carry diagnostic details.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "development" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Intake service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for feedback submissions
    #[serde(default)]
    pub listener: Listener,
    /// Listener for health and readiness probes
    #[serde(default = "Listener::admin_default")]
    pub admin_listener: Listener,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            admin_listener: Listener::admin_default(),
            environment: Environment::default(),
            ai: AiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Validates the intake configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.ai.model.trim().is_empty() {
            return Err(ValidationError::EmptyModel);
        }
        if self.ai.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("ai"));
        }
        if self.storage.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("storage"));
        }

        Ok(())
    }

    /// Applies the environment variables the service recognizes on top of the
    /// file configuration. `lookup` is usually `std::env::var(..).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(AI_API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.ai.api_key = Some(api_key);
        }

        if let Some(raw) = lookup(STORAGE_URL_ENV).filter(|v| !v.is_empty()) {
            let url =
                Url::parse(&raw).map_err(|e| ValidationError::InvalidStorageUrl(raw.clone(), e))?;
            self.storage.url = Some(url);
        }

        if let Some(name) = lookup(ENVIRONMENT_ENV) {
            self.environment = Environment::from_name(&name);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl Listener {
    fn admin_default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }

    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Generative AI service used for sentiment enrichment
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiConfig {
    /// Without a key every enrichment attempt falls back immediately.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Url,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            api_key: None,
            model: "gemini-1.5-flash".into(),
            base_url: Url::parse("https://generativelanguage.googleapis.com")
                .expect("static URL is valid"),
            timeout_secs: 30,
        }
    }
}

/// Storage endpoint the feedback records are forwarded to
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Without a URL every submission fails to forward.
    pub url: Option<Url>,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            url: None,
            timeout_secs: 30,
        }
    }
}
