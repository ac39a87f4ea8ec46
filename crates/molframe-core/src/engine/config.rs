use crate::core::math::boundary::DEFAULT_FAST_BOUNDARY_THRESHOLD;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// How explicit connectivity and geometric inference are combined when building bonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondPolicy {
    /// Index-pair bonds replace inference; coarse-grained models without explicit records get no
    /// bonds; all other models get explicit records followed by inference.
    #[default]
    Auto,
    /// Only explicit records, never geometric inference.
    ExplicitOnly,
    /// Explicit records followed by inference for every model.
    AlwaysInfer,
}

impl FromStr for BondPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "auto" => Ok(Self::Auto),
            "explicit-only" | "explicit" => Ok(Self::ExplicitOnly),
            "always-infer" | "infer" => Ok(Self::AlwaysInfer),
            other => Err(ConfigError::InvalidParameter {
                name: "bond-policy",
                reason: format!("unknown policy '{}'", other),
            }),
        }
    }
}

impl fmt::Display for BondPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::ExplicitOnly => "explicit-only",
            Self::AlwaysInfer => "always-infer",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondConfig {
    /// Pre-filter radius for neighbor candidates, in Å.
    pub max_radius: f64,
    pub policy: BondPolicy,
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            max_radius: 4.0,
            policy: BondPolicy::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConfig {
    /// Element count above which the approximate sphere is used.
    pub fast_threshold: usize,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            fast_threshold: DEFAULT_FAST_BOUNDARY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    /// Fixed grid cell edge in Å; derived from the element density when `None`.
    pub cell_size: Option<f64>,
    pub elements_per_cell: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            cell_size: None,
            elements_per_cell: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Number of intra-unit bond graphs retained per model.
    pub bond_cache_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bond_cache_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelConfig {
    pub bonds: BondConfig,
    pub boundary: BoundaryConfig,
    pub lookup: LookupConfig,
    pub cache: CacheConfig,
}

#[derive(Default)]
pub struct ModelConfigBuilder {
    bond_max_radius: Option<f64>,
    bond_policy: Option<BondPolicy>,
    fast_boundary_threshold: Option<usize>,
    lookup_cell_size: Option<f64>,
    lookup_elements_per_cell: Option<usize>,
    bond_cache_capacity: Option<usize>,
}

impl ModelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bond_max_radius(mut self, radius: f64) -> Self {
        self.bond_max_radius = Some(radius);
        self
    }
    pub fn bond_policy(mut self, policy: BondPolicy) -> Self {
        self.bond_policy = Some(policy);
        self
    }
    pub fn fast_boundary_threshold(mut self, threshold: usize) -> Self {
        self.fast_boundary_threshold = Some(threshold);
        self
    }
    pub fn lookup_cell_size(mut self, size: f64) -> Self {
        self.lookup_cell_size = Some(size);
        self
    }
    pub fn lookup_elements_per_cell(mut self, n: usize) -> Self {
        self.lookup_elements_per_cell = Some(n);
        self
    }
    pub fn bond_cache_capacity(mut self, capacity: usize) -> Self {
        self.bond_cache_capacity = Some(capacity);
        self
    }

    /// Builds the configuration; unset parameters keep their defaults.
    pub fn build(self) -> Result<ModelConfig, ConfigError> {
        let defaults = ModelConfig::default();

        let max_radius = self.bond_max_radius.unwrap_or(defaults.bonds.max_radius);
        if !(max_radius.is_finite() && max_radius > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bond_max_radius",
                reason: format!("must be a positive distance, got {}", max_radius),
            });
        }
        if let Some(size) = self.lookup_cell_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "lookup_cell_size",
                    reason: format!("must be a positive distance, got {}", size),
                });
            }
        }
        let elements_per_cell = self
            .lookup_elements_per_cell
            .unwrap_or(defaults.lookup.elements_per_cell);
        if elements_per_cell == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "lookup_elements_per_cell",
                reason: "must be at least 1".to_string(),
            });
        }
        let capacity = self
            .bond_cache_capacity
            .unwrap_or(defaults.cache.bond_cache_capacity);
        if capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "bond_cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ModelConfig {
            bonds: BondConfig {
                max_radius,
                policy: self.bond_policy.unwrap_or(defaults.bonds.policy),
            },
            boundary: BoundaryConfig {
                fast_threshold: self
                    .fast_boundary_threshold
                    .unwrap_or(defaults.boundary.fast_threshold),
            },
            lookup: LookupConfig {
                cell_size: self.lookup_cell_size,
                elements_per_cell,
            },
            cache: CacheConfig {
                bond_cache_capacity: capacity,
            },
        })
    }
}

/// Parameters of a crystal-contact search.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryMatesConfig {
    pub radius: f64,
    /// Unit-cell offsets searched in every direction.
    pub cell_range: i32,
    /// Operators processed between cancellation checks.
    pub chunk_size: usize,
}

#[derive(Default)]
pub struct SymmetryMatesConfigBuilder {
    radius: Option<f64>,
    cell_range: Option<i32>,
    chunk_size: Option<usize>,
}

impl SymmetryMatesConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
    pub fn cell_range(mut self, range: i32) -> Self {
        self.cell_range = Some(range);
        self
    }
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    pub fn build(self) -> Result<SymmetryMatesConfig, ConfigError> {
        let radius = self.radius.ok_or(ConfigError::MissingParameter("radius"))?;
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "radius",
                reason: format!("must be a non-negative distance, got {}", radius),
            });
        }
        Ok(SymmetryMatesConfig {
            radius,
            cell_range: self.cell_range.unwrap_or(3).max(0),
            chunk_size: self.chunk_size.unwrap_or(16).max(1),
        })
    }
}
