use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("authentication rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("keyword search for '{keyword}' failed after {attempts} attempt(s)")]
    Transport {
        keyword: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}
