//! Error types for renderer configuration and output.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `RenderError`.
pub type RenderResult<T> = Result<T, RenderError>;

/// Rejected renderer configuration. Always raised before any worker is launched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown tracer: {0}")]
    UnknownTracer(String),

    #[error("unknown sampler: {0}")]
    UnknownSampler(String),

    #[error("unknown tone map: {0}")]
    UnknownToneMap(String),

    #[error("samples per pixel must be at least 1")]
    InvalidSamplesPerPixel,

    #[error("tile size must be at least 1")]
    InvalidTileSize,

    #[error("tracer max depth must be at least 1")]
    InvalidMaxDepth,

    #[error("thread count must be at least 1")]
    InvalidThreadCount,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Primary error type for renderer operations.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
