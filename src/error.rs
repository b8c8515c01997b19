use thiserror::Error;

/// Failures talking to the site: the search endpoint or a fragment route.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type TerminalResult<T> = std::result::Result<T, TerminalError>;
