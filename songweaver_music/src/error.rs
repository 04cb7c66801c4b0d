// Errors at the crate boundary.
//
// The composition engine itself is total: lookups fall back to defaults and
// empty ranges yield `None`. Only loading configuration and writing MIDI can
// fail, and they report through `MusicError`.

use thiserror::Error;

/// Result type for config and export operations.
pub type MusicResult<T> = Result<T, MusicError>;

/// Errors from config loading and MIDI export.
#[derive(Debug, Error)]
pub enum MusicError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file was not valid JSON for `ComposerConfig`.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A config parsed but holds values the engine cannot use.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
