//! Error taxonomy for loading, remixing, and rendering.
//!
//! Two variants are advisory rather than hard failures: [`RemixError::EmptyScore`]
//! (the source had no measures to extract) and [`RemixError::EmptySelection`]
//! (nothing was selected for composition). Callers that drive a UI surface
//! these as hints instead of error text; see [`RemixError::is_advisory`].

use thiserror::Error;

/// All failure modes of the library. No operation retries internally, and no
/// failure path yields a partially constructed score.
#[derive(Debug, Error)]
pub enum RemixError {
    /// Reading the source file failed (missing file, permissions, I/O).
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The XML itself could not be parsed.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Parsed fine, but the root element is not `score-partwise`.
    #[error("unsupported root element '{0}': only 'score-partwise' is supported")]
    UnsupportedRoot(String),

    /// A compressed .mxl archive could not be opened or resolved.
    #[error("MXL archive error: {0}")]
    Archive(String),

    /// The source score contains no measures to extract fragments from.
    #[error("no measures found in source score")]
    EmptyScore,

    /// No fragments were selected (or none of the selected indices exist).
    #[error("no fragments selected for composition")]
    EmptySelection,

    /// The requested beat count is not a positive integer.
    #[error("invalid beat count {0}: must be 1 or greater")]
    InvalidBeatCount(i32),

    /// The engraver could not produce output for this score.
    #[error("render error: {0}")]
    Render(String),
}

impl RemixError {
    /// Whether this is an advisory empty-result condition rather than a
    /// hard failure.
    pub fn is_advisory(&self) -> bool {
        matches!(self, RemixError::EmptyScore | RemixError::EmptySelection)
    }
}
