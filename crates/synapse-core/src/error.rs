//! Error types for synapse.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using synapse's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of failure reported by a language-model backend.
///
/// Orchestration logic dispatches on this value only; the accompanying
/// message is for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Rate limit or quota exhausted.
    QuotaExceeded,
    /// Credentials missing or rejected.
    AuthError,
    /// Backend unreachable, timed out, or returned a server error.
    Unavailable,
    /// Backend answered but the payload could not be used.
    Malformed,
}

impl ProviderErrorKind {
    /// Map an HTTP status code returned by a backend to an error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::AuthError,
            429 => Self::QuotaExceeded,
            500..=599 | 408 => Self::Unavailable,
            _ => Self::Malformed,
        }
    }

    /// Whether a call failing with this kind may be retried on a fallback backend.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::QuotaExceeded | Self::Unavailable)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaExceeded => write!(f, "quota_exceeded"),
            Self::AuthError => write!(f, "auth_error"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Malformed => write!(f, "malformed"),
        }
    }
}

/// A failed call to a language-model backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider} {kind}: {message}")]
pub struct ProviderError {
    /// Backend name ("gemini", "openai", "mock").
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// Build an error from a non-success HTTP response.
    pub fn from_status(provider: impl Into<String>, status: u16, body: &str) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::from_status(status),
            format!("HTTP {}: {}", status, body),
        )
    }

    /// Build an error from a transport failure (connect, timeout, body read).
    pub fn from_transport(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Unavailable,
            format!("Request failed: {}", err),
        )
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Malformed, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Coarse classification of failures used by the degradation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Quota/unavailable provider failure, eligible for fallback or degradation.
    TransientProvider,
    /// Input needed for retrieval could not be produced (embedding on create).
    FatalInput,
    /// One subsystem failed while an alternative path exists.
    PartialSubsystem,
    /// Both retrieval paths failed.
    DualSubsystem,
    /// Anything else (storage writes, config, invalid input, timeouts).
    Other,
}

/// Core error type for synapse operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Item not found
    #[error("Item not found: {0}")]
    ItemNotFound(uuid::Uuid),

    /// Language-model backend call failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Embedding generation failed during ingestion; nothing was persisted
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(ProviderError),

    /// Vector store write or query failed
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Page metadata lookup failed
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Both semantic and text retrieval failed
    #[error("Search unavailable: semantic={semantic}, text={text}")]
    SearchUnavailable { semantic: String, text: String },

    /// Request exceeded its timeout scope
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify this error for the degradation policy.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Provider(e) if e.is_transient() => ErrorClass::TransientProvider,
            Error::EmbeddingUnavailable(_) => ErrorClass::FatalInput,
            Error::VectorStore(_) | Error::Metadata(_) | Error::Request(_) => {
                ErrorClass::PartialSubsystem
            }
            Error::SearchUnavailable { .. } => ErrorClass::DualSubsystem,
            _ => ErrorClass::Other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
