//! Precedence between the authoritative store and the local cache.

use crate::domain::{models::DataSource, ports::outbound::RemoteError};

/// Outcome of reconciling a remote read with the cached copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub source: DataSource,
}

/// Pick the value to trust for a read.
///
/// A reachable store always wins, including when it has no value: a cached
/// copy never overrides a successful remote answer. Only an unreachable store
/// falls back to the cache. Any other remote error is returned unchanged.
pub fn reconcile<T>(
    remote: Result<Option<T>, RemoteError>,
    cached: Option<T>,
) -> Result<Resolved<T>, RemoteError> {
    match remote {
        Ok(value) => Ok(Resolved {
            value,
            source: DataSource::Remote,
        }),
        Err(RemoteError::Unavailable(_)) => {
            let source = if cached.is_some() {
                DataSource::Cache
            } else {
                DataSource::Unavailable
            };
            Ok(Resolved {
                value: cached,
                source,
            })
        }
        Err(err) => Err(err),
    }
}
