//! Clipper - A Rust CLI tool for managing short audio clips cut from online videos
//!
//! This library tracks each clip through its lifecycle (download, loudness normalization,
//! upload to object storage, publish to a shared remote catalog) and persists local
//! progress in a single JSON document.

pub mod catalog;
pub mod cli;
pub mod clip;
pub mod config;
pub mod extractors;
pub mod manager;
pub mod normalize;
pub mod output;
pub mod storage;
pub mod store;
pub mod utils;

pub use catalog::{CatalogBackend, CatalogClient, CatalogDocument, HttpCatalogBackend};
pub use cli::{Cli, Commands, OutputFormat};
pub use clip::{Clip, ClipStatus};
pub use config::Config;
pub use extractors::MediaExtractor;
pub use manager::ClipManager;
pub use normalize::Normalizer;
pub use storage::ObjectStorage;
pub use store::ClipStore;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ClipperError>;

/// Error types specific to the clipper
#[derive(thiserror::Error, Debug)]
pub enum ClipperError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unable to find clip #{0}")]
    NotFound(String),

    #[error("Catalog rejected the token: {0}")]
    Auth(String),

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Local clip store error: {0}")]
    Storage(String),

    #[error("External tool failed: {0:#}")]
    ExternalTool(#[source] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClipperError {
    fn from(e: reqwest::Error) -> Self {
        ClipperError::Remote(e.to_string())
    }
}
