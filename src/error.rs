/// Error types shared by the extraction and analysis pipeline.
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a page or locating reviews in it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("analysis cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
