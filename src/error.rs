//! Error types for reactive-data
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;

/// Boxed error produced by concrete load implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the crate
#[derive(Debug, Snafu)]
pub enum Error {
    /// Position outside `[0, size)`
    #[snafu(display("Position {position} out of range, size {size}"))]
    OutOfRange { position: usize, size: usize },

    /// A filtered view was read while it had no registered data observers
    #[snafu(display("Not registered with inner data; register a data observer before reading"))]
    Unobserved,

    /// The filter index points past the end of its source
    #[snafu(display(
        "Index inconsistency: index entry at position {position} points to inner position {inner}, \
         but inner data size is {inner_size}. The inner data content may have changed without a \
         corresponding change notification."
    ))]
    IndexInconsistency {
        position: usize,
        inner: usize,
        inner_size: usize,
    },

    /// A load increment failed
    #[snafu(display("Load failed: {source}"))]
    Load { source: BoxError },

    /// The loader worker was interrupted
    #[snafu(display("Loading interrupted"))]
    Interrupted,

    /// Worker thread could not be spawned
    #[snafu(display("Failed to spawn loader worker: {source}"))]
    Spawn { source: std::io::Error },

    /// The shared async runtime could not be started
    #[snafu(display("Failed to start async runtime: {source}"))]
    Runtime { source: std::io::Error },

    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },
}

impl Error {
    /// Wrap an arbitrary load failure
    pub fn load(source: impl Into<BoxError>) -> Self {
        Error::Load {
            source: source.into(),
        }
    }

    /// Whether this error signals cancellation rather than failure
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;
