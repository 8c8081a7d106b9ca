//! # synapse-core
//!
//! Core types, traits, and configuration for synapse.
//!
//! This crate provides the data model, the shared error type, the store and
//! backend traits, and the defaults every other synapse crate builds on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{MetadataSettings, ProviderKind, ProviderSettings, SynapseConfig};
pub use error::{Error, ErrorClass, ProviderError, ProviderErrorKind, Result};
pub use models::*;
pub use traits::*;
