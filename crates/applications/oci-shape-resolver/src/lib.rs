//! # OCI Shape Resolver
//!
//! Resolves the resource shape (CPU, GPU, memory) of OCI instance pools so an
//! autoscaler can size node templates before any node exists.
//!
//! ## Architecture
//!
//! ```text
//! Autoscaler loop
//!   └── ShapeResolver::resolve(pool)
//!         ├── cache hit ──────────────────────────────► Shape
//!         └── miss
//!               ├── GetInstanceConfiguration
//!               ├── flexible (shapeConfig) ───────────► Shape
//!               └── fixed ── ListShapes(compartment) ─► Shape
//! ```
//!
//! The resolver only sees the cloud through [`RemoteShapeSource`];
//! [`OciComputeClient`] is the HTTP implementation.
//!
//! ## Failure Handling
//!
//! Every failure is returned to the caller and never cached. A failed
//! catalog listing is downgraded to an empty catalog unless
//! [`CatalogErrorPolicy::Propagate`] is configured.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod resolver;

// Resolution
pub use resolver::ShapeResolver;

// Configuration
pub use config::{
    CatalogErrorPolicy, OciClientConfig, ResolverConfig, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_REGION,
    DEFAULT_REMOTE_CALL_TIMEOUT_MS,
};

// Error handling
pub use error::{ResolverError, Result};

// Remote access
pub use client::OciComputeClient;
pub use oci_shape_core::{
    InstanceDetails, InstanceLaunchConfig, InstancePoolRef, RemoteShapeSource, Shape,
    ShapeCatalogEntry, ShapeSourceError, BYTES_PER_GIB,
};
