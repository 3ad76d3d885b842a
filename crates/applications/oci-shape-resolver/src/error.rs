//! Error types for shape resolution

use oci_shape_core::ShapeSourceError;
use std::time::Duration;
use thiserror::Error;

/// Resolver result type
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Errors that can occur while resolving an instance pool's shape
///
/// Every variant is terminal for the call; nothing is retried internally.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Fetching the instance configuration failed
    #[error(transparent)]
    RemoteLookup(#[from] ShapeSourceError),

    /// Instance configuration has no instance details
    #[error("instance configuration details for instance-pool {pool_id} have not been set")]
    MissingConfiguration { pool_id: String },

    /// Instance details are not of the compute kind
    #[error("(compute) instance configuration for instance-pool {pool_id} not found (got {kind})")]
    UnsupportedConfiguration { pool_id: String, kind: &'static str },

    /// No shape name could be determined
    #[error("shape information for instance-pool {pool_id} not found")]
    ShapeNotFound { pool_id: String },

    /// Listing the shape catalog failed (only with `CatalogErrorPolicy::Propagate`)
    #[error("listing shapes for instance-pool {pool_id} failed: {source}")]
    CatalogLookup {
        pool_id: String,
        #[source]
        source: ShapeSourceError,
    },

    /// A remote call exceeded the configured timeout
    #[error("{operation} for instance-pool {pool_id} timed out after {after:?}")]
    Timeout {
        pool_id: String,
        operation: &'static str,
        after: Duration,
    },
}

impl ResolverError {
    /// Pool the failure belongs to, when the error names one
    pub fn pool_id(&self) -> Option<&str> {
        match self {
            Self::RemoteLookup(_) => None,
            Self::MissingConfiguration { pool_id }
            | Self::UnsupportedConfiguration { pool_id, .. }
            | Self::ShapeNotFound { pool_id }
            | Self::CatalogLookup { pool_id, .. }
            | Self::Timeout { pool_id, .. } => Some(pool_id.as_str()),
        }
    }
}
