//! Error types shared across the registry and resolver

use thiserror::Error;

/// Errors returned by [`crate::registry::Registry`] operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An entry with the same normalized key is already being monitored
    #[error("host already tracked: {0}")]
    AlreadyTracked(String),

    /// A bulk-cancel pattern could not be compiled
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors produced while turning a user query into an address
///
/// Resolution failures are always reported per query so a single bad
/// hostname does not abort a batch.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("empty query")]
    Empty,

    #[error("lookup of `{query}` failed: {source}")]
    Lookup {
        query: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no addresses found for `{0}`")]
    NoAddress(String),
}

impl ResolveError {
    /// The query that failed to resolve
    pub fn query(&self) -> &str {
        match self {
            ResolveError::Empty => "",
            ResolveError::Lookup { query, .. } => query,
            ResolveError::NoAddress(query) => query,
        }
    }
}
