//! Error types for score loading.
//!
//! Only the loading side (reading files, unpacking archives, parsing and
//! validating MusicXML) can fail. Layout never returns an error: incomplete
//! notation degrades the layout instead of aborting it.

use thiserror::Error;

/// Errors produced while reading a score.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be read.
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The document is XML but not a format we understand.
    #[error("Unsupported MusicXML format: {0}")]
    UnsupportedFormat(String),

    /// An enumerated value (clef sign, slur type, placement, ...) is not recognized.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The .mxl container is broken or has no score in it.
    #[error("MXL archive error: {0}")]
    Archive(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(what: &str, value: &str) -> Self {
        Error::InvalidData(format!("Invalid {what} {value}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
