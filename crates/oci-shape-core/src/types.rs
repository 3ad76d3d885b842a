//! Core types shared across the shape resolver and its remote adapters

use serde::{Deserialize, Serialize};

/// Bytes in one gibibyte (OCI reports memory in GB meaning GiB)
pub const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Reference to an instance pool whose shape should be resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePoolRef {
    /// Instance pool OCID (cache key)
    pub id: String,

    /// OCID of the instance configuration the pool launches from
    pub instance_configuration_id: String,
}

impl InstancePoolRef {
    pub fn new(id: impl Into<String>, instance_configuration_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instance_configuration_id: instance_configuration_id.into(),
        }
    }
}

/// Instance configuration record as returned by the compute management API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceLaunchConfig {
    pub id: String,

    /// Compartment the configuration lives in; scopes the shape catalog lookup
    pub compartment_id: String,

    #[serde(default)]
    pub instance_details: Option<InstanceDetails>,
}

/// Kinds of instance details an instance configuration can carry
///
/// Tagged by the `instanceType` discriminator. Kinds this crate does not know
/// about deserialize to [`InstanceDetails::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instanceType")]
pub enum InstanceDetails {
    /// Plain compute instance launch
    #[serde(rename = "compute")]
    Compute(ComputeInstanceDetails),

    /// Multiple instance options (not resolvable to a single shape)
    #[serde(rename = "instance_options")]
    InstanceOptions,

    #[serde(other)]
    Unknown,
}

impl InstanceDetails {
    /// Discriminator as reported by the provider
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Compute(_) => "compute",
            Self::InstanceOptions => "instance_options",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeInstanceDetails {
    #[serde(default)]
    pub launch_details: Option<LaunchDetails>,
}

/// Launch parameters for instances created from the configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchDetails {
    /// Shape name (e.g., "VM.Standard.E4.Flex")
    #[serde(default)]
    pub shape: Option<String>,

    /// Per-instance override; present only for flexible shapes
    #[serde(default)]
    pub shape_config: Option<LaunchShapeConfig>,
}

impl LaunchDetails {
    /// Fixed shape, looked up in the catalog
    pub fn fixed(shape: impl Into<String>) -> Self {
        Self {
            shape: Some(shape.into()),
            shape_config: None,
        }
    }

    /// Flexible shape with an explicit resource override
    pub fn flexible(shape: impl Into<String>, shape_config: LaunchShapeConfig) -> Self {
        Self {
            shape: Some(shape.into()),
            shape_config: Some(shape_config),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchShapeConfig {
    #[serde(default)]
    pub ocpus: Option<f64>,

    #[serde(default, rename = "memoryInGBs")]
    pub memory_in_gbs: Option<f64>,
}

/// One row of the fixed-shape catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeCatalogEntry {
    pub shape: String,

    #[serde(default)]
    pub ocpus: Option<f64>,

    #[serde(default, rename = "memoryInGBs")]
    pub memory_in_gbs: Option<f64>,

    #[serde(default)]
    pub gpus: Option<i64>,
}

impl ShapeCatalogEntry {
    pub fn new(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            ocpus: None,
            memory_in_gbs: None,
            gpus: None,
        }
    }

    pub fn with_ocpus(mut self, ocpus: f64) -> Self {
        self.ocpus = Some(ocpus);
        self
    }

    pub fn with_memory_in_gbs(mut self, gbs: f64) -> Self {
        self.memory_in_gbs = Some(gbs);
        self
    }

    pub fn with_gpus(mut self, gpus: i64) -> Self {
        self.gpus = Some(gpus);
        self
    }
}

/// Resource attributes of a shape, used for constructing node templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Shape name; never empty once resolved
    pub name: String,

    /// CPU cores (OCPUs)
    pub cpu: f64,

    /// GPU count
    pub gpu: u32,

    /// Memory in bytes
    pub memory_in_bytes: f64,
}

impl Shape {
    /// Memory in GiB
    pub fn memory_in_gib(&self) -> f64 {
        self.memory_in_bytes / BYTES_PER_GIB
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (cpu={}, gpu={}, memory={}GiB)",
            self.name,
            self.cpu,
            self.gpu,
            self.memory_in_gib()
        )
    }
}
