//! Turning user queries into tracking keys and addresses

use std::net::IpAddr;

use futures::future::join_all;
use tracing::{debug, instrument};

use crate::error::ResolveError;
use crate::registry::normalize_key;

/// A query that resolved to an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Query as typed by the user
    pub query: String,

    /// Normalized tracking key
    pub key: String,

    pub address: IpAddr,
}

/// Resolve a hostname or literal address
///
/// Literal addresses are used as-is. Hostnames go through the system
/// resolver and the first returned address wins.
#[instrument]
pub async fn resolve(query: &str) -> Result<ResolvedQuery, ResolveError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::Empty);
    }

    let address = match trimmed.parse::<IpAddr>() {
        Ok(address) => address,
        Err(_) => lookup(trimmed).await?,
    };

    debug!("resolved {trimmed} to {address}");

    Ok(ResolvedQuery {
        query: trimmed.to_string(),
        key: normalize_key(trimmed),
        address,
    })
}

async fn lookup(host: &str) -> Result<IpAddr, ResolveError> {
    let mut addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|source| ResolveError::Lookup {
            query: host.to_string(),
            source,
        })?;

    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ResolveError::NoAddress(host.to_string()))
}

/// Resolve every query independently, keeping input order
pub async fn resolve_all<S: AsRef<str>>(queries: &[S]) -> Vec<Result<ResolvedQuery, ResolveError>> {
    join_all(queries.iter().map(|query| resolve(query.as_ref()))).await
}
