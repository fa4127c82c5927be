use thiserror::Error;

/// Problems found while extracting a search response.
///
/// None of these abort extraction. They are collected alongside the
/// (possibly partial) record so callers can log or count them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no exact match in search response")]
    NoExactMatch,

    #[error("missing field {0}")]
    MissingField(String),

    #[error("field {path} is not {expected}")]
    UnexpectedType { path: String, expected: &'static str },

    #[error("incomplete classification block: missing {0}")]
    IncompleteClassifications(String),

    #[error("category chain truncated after {depth} levels: {reason}")]
    MalformedCategoryChain { depth: usize, reason: String },
}
