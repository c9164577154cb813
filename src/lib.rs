//! Sumi-Harvest: an incremental media feed harvester
//!
//! This crate drives a rendered page session through category feed pages,
//! scrolling them the way a reader would, and records every newly discovered
//! media asset reference exactly once in an append-only history file.

pub mod asset;
pub mod config;
pub mod crawler;
pub mod output;
pub mod session;
pub mod state;
pub mod storage;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Page session error: {0}")]
    Session(#[from] SessionError),

    #[error("Invalid crawl phase transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by a page session (the rendering engine surface)
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch page session: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Query for '{selector}' failed: {message}")]
    Query { selector: String, message: String },

    #[error("Element read failed: {0}")]
    Element(String),

    #[error("Operation not supported by this session: {0}")]
    Unsupported(String),
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

// Re-export commonly used types
pub use asset::{resolve_identity, AssetReference, ContentIdentity};
pub use config::Config;
pub use crawler::{CategoryReport, Harvester, RunSummary};
pub use session::PageSession;
pub use state::{CrawlPhase, SeenSet, SessionSet, StopReason};
pub use storage::{CsvHistoryStore, HistoryRecord, HistoryStore};
