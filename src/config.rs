// Service configuration, read once at startup and injected into the handler state.

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("PORT must be a valid port number, got '{0}'")]
    InvalidPort(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUPABASE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: Url,
    pub service_role_key: String,
    /// Ask PostgREST to echo the inserted row back instead of an empty body.
    pub return_representation: bool,
}

impl SupabaseConfig {
    pub fn new(url: &str, service_role_key: impl Into<String>) -> Result<Self, ConfigError> {
        let service_role_key = service_role_key.into();
        if service_role_key.trim().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"));
        }

        Ok(Self {
            url: parse_base_url(url)?,
            service_role_key,
            return_representation: false,
        })
    }

    pub fn with_return_representation(mut self, enabled: bool) -> Self {
        self.return_representation = enabled;
        self
    }

    /// PostgREST endpoint for a table, e.g. `<base>/rest/v1/payments`.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url.as_str().trim_end_matches('/'), table)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::Missing("SUPABASE_URL"));
    }

    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        name: "SUPABASE_URL",
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            name: "SUPABASE_URL",
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// APP CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub supabase: SupabaseConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key = lookup("SUPABASE_SERVICE_ROLE_KEY")
            .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?;

        let return_representation = lookup("SUPABASE_RETURN_REPRESENTATION")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            supabase: SupabaseConfig::new(&url, key)?
                .with_return_representation(return_representation),
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
