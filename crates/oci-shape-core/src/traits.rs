//! Remote shape source trait
//!
//! The resolver talks to the cloud through this interface ONLY, so it can be
//! exercised against canned configurations and catalogs.

use async_trait::async_trait;

use crate::error::ShapeSourceError;
use crate::types::{InstanceLaunchConfig, ShapeCatalogEntry};

/// Result type for remote shape source operations
pub type Result<T> = std::result::Result<T, ShapeSourceError>;

/// Fetches instance configurations and the fixed-shape catalog.
///
/// Implementations are plain pass-throughs: no retries, no interpretation.
#[async_trait]
pub trait RemoteShapeSource: Send + Sync {
    /// Get the instance configuration an instance pool launches from
    async fn get_instance_configuration(
        &self,
        instance_configuration_id: &str,
    ) -> Result<InstanceLaunchConfig>;

    /// List every shape available in a compartment
    async fn list_shapes(&self, compartment_id: &str) -> Result<Vec<ShapeCatalogEntry>>;
}
