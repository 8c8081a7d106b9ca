//! Process-wide configuration.
//!
//! Built once at startup by [`SynapseConfig::from_env`] and passed to
//! constructors. Nothing below the binary reads the environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Name of a language-model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(Error::Config(format!("Unknown AI provider: {}", other))),
        }
    }
}

/// Connection settings for one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub gen_model: String,
    pub embed_model: String,
    pub timeout_secs: u64,
}

impl ProviderSettings {
    pub fn gemini_defaults() -> Self {
        Self {
            base_url: defaults::GEMINI_URL.to_string(),
            api_key: None,
            gen_model: defaults::GEMINI_GEN_MODEL.to_string(),
            embed_model: defaults::GEMINI_EMBED_MODEL.to_string(),
            timeout_secs: defaults::PROVIDER_TIMEOUT_SECS,
        }
    }

    pub fn openai_defaults() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            gen_model: defaults::OPENAI_GEN_MODEL.to_string(),
            embed_model: defaults::OPENAI_EMBED_MODEL.to_string(),
            timeout_secs: defaults::PROVIDER_TIMEOUT_SECS,
        }
    }
}

/// External endpoints used by the metadata resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSettings {
    pub open_library_covers_url: String,
    pub open_library_search_url: String,
    pub image_source_url: String,
    pub user_agent: String,
    pub lookup_timeout_secs: u64,
    /// Page markup beyond this many bytes is not read.
    pub max_page_bytes: usize,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            open_library_covers_url: defaults::OPEN_LIBRARY_COVERS_URL.to_string(),
            open_library_search_url: defaults::OPEN_LIBRARY_SEARCH_URL.to_string(),
            image_source_url: defaults::IMAGE_SOURCE_URL.to_string(),
            user_agent: defaults::PAGE_USER_AGENT.to_string(),
            lookup_timeout_secs: defaults::METADATA_LOOKUP_TIMEOUT_SECS,
            max_page_bytes: defaults::PAGE_BODY_MAX_BYTES,
        }
    }
}

impl MetadataSettings {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

/// Immutable configuration for the whole process.
#[derive(Debug, Clone, PartialEq)]
pub struct SynapseConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub primary_provider: ProviderKind,
    pub fallback_provider: Option<ProviderKind>,
    pub gemini: ProviderSettings,
    pub openai: ProviderSettings,
    pub metadata: MetadataSettings,
    pub vector_collection: String,
    pub ingest_timeout_secs: u64,
    pub search_timeout_secs: u64,
    pub summary_fallback_chars: usize,
}

impl Default for SynapseConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            database_max_connections: defaults::DATABASE_MAX_CONNECTIONS,
            database_acquire_timeout_secs: defaults::DATABASE_ACQUIRE_TIMEOUT_SECS,
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            primary_provider: ProviderKind::Gemini,
            fallback_provider: None,
            gemini: ProviderSettings::gemini_defaults(),
            openai: ProviderSettings::openai_defaults(),
            metadata: MetadataSettings::default(),
            vector_collection: defaults::VECTOR_COLLECTION.to_string(),
            ingest_timeout_secs: defaults::INGEST_TIMEOUT_SECS,
            search_timeout_secs: defaults::SEARCH_TIMEOUT_SECS,
            summary_fallback_chars: defaults::SUMMARY_FALLBACK_CHARS,
        }
    }
}

impl SynapseConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(v) = get("DATABASE_MAX_CONNECTIONS") {
            config.database_max_connections = parse_number("DATABASE_MAX_CONNECTIONS", &v)?;
            if config.database_max_connections == 0 {
                return Err(Error::Config("DATABASE_MAX_CONNECTIONS must be at least 1".into()));
            }
        }
        if let Some(v) = get("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            config.database_acquire_timeout_secs =
                parse_number("DATABASE_ACQUIRE_TIMEOUT_SECS", &v)?;
        }
        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse_number("PORT", &port)?;
        }

        config.primary_provider = get("AI_PROVIDER")
            .as_deref()
            .unwrap_or(defaults::PRIMARY_PROVIDER)
            .parse()?;
        config.fallback_provider = get("AI_FALLBACK_PROVIDER")
            .map(|v| v.parse::<ProviderKind>())
            .transpose()?
            .filter(|kind| *kind != config.primary_provider);

        let provider_timeout = get("PROVIDER_TIMEOUT_SECS")
            .map(|v| parse_number("PROVIDER_TIMEOUT_SECS", &v))
            .transpose()?
            .unwrap_or(defaults::PROVIDER_TIMEOUT_SECS);

        apply_provider_env(&mut config.gemini, "GEMINI", &get, provider_timeout);
        apply_provider_env(&mut config.openai, "OPENAI", &get, provider_timeout);

        if let Some(collection) = get("VECTOR_COLLECTION") {
            config.vector_collection = collection;
        }
        if let Some(v) = get("INGEST_TIMEOUT_SECS") {
            config.ingest_timeout_secs = parse_number("INGEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SEARCH_TIMEOUT_SECS") {
            config.search_timeout_secs = parse_number("SEARCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("METADATA_LOOKUP_TIMEOUT_SECS") {
            config.metadata.lookup_timeout_secs =
                parse_number("METADATA_LOOKUP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SUMMARY_FALLBACK_CHARS") {
            config.summary_fallback_chars = parse_number("SUMMARY_FALLBACK_CHARS", &v)?;
        }
        if let Some(v) = get("OPEN_LIBRARY_COVERS_URL") {
            config.metadata.open_library_covers_url = v;
        }
        if let Some(v) = get("OPEN_LIBRARY_SEARCH_URL") {
            config.metadata.open_library_search_url = v;
        }
        if let Some(v) = get("IMAGE_SOURCE_URL") {
            config.metadata.image_source_url = v;
        }

        Ok(config)
    }

    /// Settings for the given backend.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAI => &self.openai,
        }
    }

    pub fn database_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }

    pub fn ingest_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn apply_provider_env<F>(settings: &mut ProviderSettings, prefix: &str, get: &F, timeout: u64)
where
    F: Fn(&str) -> Option<String>,
{
    settings.timeout_secs = timeout;
    settings.api_key = get(&format!("{}_API_KEY", prefix));
    if let Some(url) = get(&format!("{}_BASE_URL", prefix)) {
        settings.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(model) = get(&format!("{}_GEN_MODEL", prefix)) {
        settings.gen_model = model;
    }
    if let Some(model) = get(&format!("{}_EMBED_MODEL", prefix)) {
        settings.embed_model = model;
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<SynapseConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SynapseConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, SynapseConfig::default());
        assert_eq!(config.primary_provider, ProviderKind::Gemini);
        assert!(config.fallback_provider.is_none());
        assert_eq!(config.vector_collection, "synapse_items");
        assert_eq!(config.summary_fallback_chars, 200);
    }

    #[test]
    fn test_provider_selection() {
        let config = config_from(&[
            ("AI_PROVIDER", "OpenAI"),
            ("AI_FALLBACK_PROVIDER", "gemini"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(config.primary_provider, ProviderKind::OpenAI);
        assert_eq!(config.fallback_provider, Some(ProviderKind::Gemini));
        assert_eq!(
            config.provider(ProviderKind::OpenAI).api_key.as_deref(),
            Some("sk-test")
        );
    }

    #[test]
    fn test_fallback_same_as_primary_is_dropped() {
        let config = config_from(&[("AI_FALLBACK_PROVIDER", "gemini")]).unwrap();
        assert!(config.fallback_provider.is_none());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = config_from(&[("AI_PROVIDER", "claude")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_numeric_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("PROVIDER_TIMEOUT_SECS", "5"),
            ("SEARCH_TIMEOUT_SECS", "3"),
            ("METADATA_LOOKUP_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.gemini.timeout_secs, 5);
        assert_eq!(config.openai.timeout_secs, 5);
        assert_eq!(config.search_timeout(), Duration::from_secs(3));
        assert_eq!(config.metadata.lookup_timeout(), Duration::from_secs(2));
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_database_pool_settings() {
        let config = config_from(&[
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "4"),
        ])
        .unwrap();
        assert_eq!(config.database_max_connections, 25);
        assert_eq!(config.database_acquire_timeout(), Duration::from_secs(4));

        let err = config_from(&[("DATABASE_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = config_from(&[("GEMINI_BASE_URL", "http://localhost:9999/v1beta/")]).unwrap();
        assert_eq!(config.gemini.base_url, "http://localhost:9999/v1beta");
    }
}
