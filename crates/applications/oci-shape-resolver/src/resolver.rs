//! Instance-pool shape resolution
//!
//! Turns an instance pool's configuration reference into a [`Shape`]:
//!
//! 1. **Flexible** shapes carry an explicit `shapeConfig` override in the
//!    launch details; CPU and memory come straight from it.
//! 2. **Fixed** shapes have no override and are looked up by name in the
//!    compartment's shape catalog.
//!
//! Resolved shapes are cached per pool for the lifetime of the resolver.
//! Failures are never cached, so the next call retries the remote lookup.

use crate::config::{CatalogErrorPolicy, ResolverConfig};
use crate::error::{ResolverError, Result};
use oci_shape_core::{
    InstanceDetails, InstanceLaunchConfig, InstancePoolRef, LaunchDetails, LaunchShapeConfig,
    RemoteShapeSource, Shape, ShapeCatalogEntry, ShapeSourceError, BYTES_PER_GIB,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const GET_INSTANCE_CONFIGURATION: &str = "GetInstanceConfiguration";
const LIST_SHAPES: &str = "ListShapes";

/// Resolves and caches instance-pool shapes
pub struct ShapeResolver {
    /// Remote source for configurations and the shape catalog
    source: Arc<dyn RemoteShapeSource>,

    config: ResolverConfig,

    /// Pool id -> resolved shape (insert-only)
    cache: RwLock<HashMap<String, Shape>>,
}

impl ShapeResolver {
    /// Create a resolver with default configuration
    pub fn new(source: Arc<dyn RemoteShapeSource>) -> Self {
        Self::with_config(source, ResolverConfig::default())
    }

    pub fn with_config(source: Arc<dyn RemoteShapeSource>, config: ResolverConfig) -> Self {
        Self {
            source,
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the shape of an instance pool
    ///
    /// Served from cache when the pool was resolved before. Otherwise fetches
    /// the pool's instance configuration and, for fixed shapes, the shape
    /// catalog of its compartment.
    pub async fn resolve(&self, pool: &InstancePoolRef) -> Result<Shape> {
        if let Some(shape) = self.cached_shape(&pool.id).await {
            debug!(pool_id = %pool.id, shape = %shape.name, "Shape cache hit");
            return Ok(shape);
        }

        debug!(pool_id = %pool.id, "Fetching shape configuration details for instance-pool");

        let instance_config = self
            .bounded(
                &pool.id,
                GET_INSTANCE_CONFIGURATION,
                self.source
                    .get_instance_configuration(&pool.instance_configuration_id),
            )
            .await??;

        let shape = self.shape_from_configuration(pool, &instance_config).await?;

        if shape.name.is_empty() {
            return Err(ResolverError::ShapeNotFound {
                pool_id: pool.id.clone(),
            });
        }

        // A concurrent resolution may have landed first; keep its entry.
        let mut cache = self.cache.write().await;
        let cached = cache.entry(pool.id.clone()).or_insert(shape).clone();

        info!(
            pool_id = %pool.id,
            shape = %cached.name,
            cpu = cached.cpu,
            gpu = cached.gpu,
            memory_in_bytes = cached.memory_in_bytes,
            "Resolved instance-pool shape"
        );

        Ok(cached)
    }

    /// Previously resolved shape for a pool, if any
    pub async fn cached_shape(&self, pool_id: &str) -> Option<Shape> {
        self.cache.read().await.get(pool_id).cloned()
    }

    /// Number of pools with a cached shape
    pub async fn cached_pools(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Configuration this resolver was built with
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    async fn shape_from_configuration(
        &self,
        pool: &InstancePoolRef,
        instance_config: &InstanceLaunchConfig,
    ) -> Result<Shape> {
        let details = match &instance_config.instance_details {
            None => {
                return Err(ResolverError::MissingConfiguration {
                    pool_id: pool.id.clone(),
                });
            }
            Some(InstanceDetails::Compute(details)) => details,
            Some(other) => {
                return Err(ResolverError::UnsupportedConfiguration {
                    pool_id: pool.id.clone(),
                    kind: other.kind(),
                });
            }
        };

        let launch = details.launch_details.clone().unwrap_or_default();

        match &launch.shape_config {
            Some(shape_config) => Ok(flexible_shape(&pool.id, &launch, shape_config)),
            None => {
                self.fixed_shape(pool, &instance_config.compartment_id, &launch)
                    .await
            }
        }
    }

    async fn fixed_shape(
        &self,
        pool: &InstancePoolRef,
        compartment_id: &str,
        launch: &LaunchDetails,
    ) -> Result<Shape> {
        let Some(wanted) = launch.shape.as_deref() else {
            debug!(pool_id = %pool.id, "Launch details carry no shape name");
            return Ok(Shape::default());
        };

        let catalog = self.list_catalog(pool, compartment_id).await?;
        Ok(match_catalog(&pool.id, wanted, &catalog))
    }

    /// List the compartment's catalog, applying the catalog error policy
    async fn list_catalog(
        &self,
        pool: &InstancePoolRef,
        compartment_id: &str,
    ) -> Result<Vec<ShapeCatalogEntry>> {
        let listed = match self
            .bounded(&pool.id, LIST_SHAPES, self.source.list_shapes(compartment_id))
            .await
        {
            Ok(listed) => listed,
            Err(ResolverError::Timeout { after, .. }) => Err(ShapeSourceError::network(format!(
                "{LIST_SHAPES} timed out after {after:?}"
            ))),
            Err(other) => return Err(other),
        };

        match (listed, self.config.catalog_error_policy) {
            (Ok(catalog), _) => Ok(catalog),
            (Err(source), CatalogErrorPolicy::TreatAsEmpty) => {
                warn!(
                    pool_id = %pool.id,
                    compartment_id = %compartment_id,
                    error = %source,
                    "Listing shapes failed, treating catalog as empty"
                );
                Ok(Vec::new())
            }
            (Err(source), CatalogErrorPolicy::Propagate) => Err(ResolverError::CatalogLookup {
                pool_id: pool.id.clone(),
                source,
            }),
        }
    }

    /// Run a remote call under the configured timeout
    async fn bounded<T>(
        &self,
        pool_id: &str,
        operation: &'static str,
        call: impl Future<Output = T>,
    ) -> Result<T> {
        let after = self.config.remote_call_timeout();
        tokio::time::timeout(after, call)
            .await
            .map_err(|_| ResolverError::Timeout {
                pool_id: pool_id.to_string(),
                operation,
                after,
            })
    }
}

/// Shape from a flexible override; OCPUs imply 1 GiB per OCPU unless memory is set
fn flexible_shape(pool_id: &str, launch: &LaunchDetails, shape_config: &LaunchShapeConfig) -> Shape {
    let mut shape = Shape {
        name: launch.shape.clone().unwrap_or_default(),
        ..Shape::default()
    };

    if let Some(ocpus) = non_negative(pool_id, "ocpus", shape_config.ocpus) {
        shape.cpu = ocpus;
        shape.memory_in_bytes = ocpus * BYTES_PER_GIB;
    }
    if let Some(gbs) = non_negative(pool_id, "memoryInGBs", shape_config.memory_in_gbs) {
        shape.memory_in_bytes = gbs * BYTES_PER_GIB;
    }

    shape
}

/// Scan the catalog for `wanted`; the last matching entry wins
fn match_catalog(pool_id: &str, wanted: &str, catalog: &[ShapeCatalogEntry]) -> Shape {
    let mut shape = Shape::default();

    for entry in catalog.iter().filter(|entry| entry.shape == wanted) {
        shape.name = entry.shape.clone();
        if let Some(ocpus) = non_negative(pool_id, "ocpus", entry.ocpus) {
            shape.cpu = ocpus;
        }
        if let Some(gbs) = non_negative(pool_id, "memoryInGBs", entry.memory_in_gbs) {
            shape.memory_in_bytes = gbs * BYTES_PER_GIB;
        }
        if let Some(gpus) = entry.gpus {
            match u32::try_from(gpus) {
                Ok(gpus) => shape.gpu = gpus,
                Err(_) => warn!(pool_id = %pool_id, gpus, "Ignoring out-of-range GPU count"),
            }
        }
    }

    shape
}

fn non_negative(pool_id: &str, resource: &'static str, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v < 0.0 => {
            warn!(pool_id = %pool_id, resource, value = v, "Ignoring negative resource value");
            None
        }
        other => other,
    }
}
