//! OCI Shape Core - Shared types and traits
//!
//! This crate defines the abstractions used by the shape resolver and by
//! whichever adapter talks to the compute management API:
//! - RemoteShapeSource trait (the two remote calls the resolver needs)
//! - Instance configuration, catalog and shape types
//! - Error types

pub mod error;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
