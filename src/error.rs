use thiserror::Error;

/// Top-level error type for the panel kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to panel and triangle geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("{len} {what} strengths for {panels} panels")]
    StrengthCount {
        what: &'static str,
        len: usize,
        panels: usize,
    },
}

/// Errors related to kernel configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience type alias for results using [`KernelError`].
pub type Result<T> = std::result::Result<T, KernelError>;
