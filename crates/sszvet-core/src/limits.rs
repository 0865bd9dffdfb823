//! # Traversal Limits
//!
//! Ceilings that bound the work the engine does on adversarial input.
//! They are large enough never to trigger on an acyclic schema of
//! realistic size.

use serde::{Deserialize, Serialize};

/// Default ceiling on node visits per classification or structural call.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Default ceiling on reference-chain depth during cycle detection.
pub const DEFAULT_MAX_CYCLE_DEPTH: usize = 1000;

/// Highest value either ceiling may be configured to. Cycle search and
/// structural validation recurse once per level, so this also bounds stack
/// depth.
pub const MAX_CONFIGURED_LIMIT: usize = 4096;

/// Maximum number of entries in a progressive container's bitset.
pub const MAX_ACTIVE_FIELDS: usize = 256;

/// Configurable traversal ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationLimits {
    /// Structural validation: nesting depth allowed inside one definition.
    /// Size classification: node visits allowed beyond one per node of the
    /// catalog, so only revisits caused by a cycle draw on it.
    pub max_iterations: usize,
    /// Reference-chain depth allowed during cycle detection.
    pub max_cycle_depth: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_cycle_depth: DEFAULT_MAX_CYCLE_DEPTH,
        }
    }
}

impl ValidationLimits {
    /// Both ceilings capped at [`MAX_CONFIGURED_LIMIT`].
    pub fn clamped(self) -> Self {
        Self {
            max_iterations: self.max_iterations.min(MAX_CONFIGURED_LIMIT),
            max_cycle_depth: self.max_cycle_depth.min(MAX_CONFIGURED_LIMIT),
        }
    }

    /// True when [`ValidationLimits::clamped`] would change a value.
    pub fn exceeds_cap(&self) -> bool {
        self.clamped() != *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let limits = ValidationLimits::default();
        assert_eq!(limits.max_iterations, 1000);
        assert_eq!(limits.max_cycle_depth, 1000);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let limits: ValidationLimits = serde_json::from_str(r#"{"max_cycle_depth": 64}"#).unwrap();
        assert_eq!(limits.max_cycle_depth, 64);
        assert_eq!(limits.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn clamped_caps_oversized_ceilings() {
        let huge = ValidationLimits {
            max_iterations: usize::MAX,
            max_cycle_depth: 50_000,
        };
        assert!(huge.exceeds_cap());
        let capped = huge.clamped();
        assert_eq!(capped.max_iterations, MAX_CONFIGURED_LIMIT);
        assert_eq!(capped.max_cycle_depth, MAX_CONFIGURED_LIMIT);

        let defaults = ValidationLimits::default();
        assert!(!defaults.exceeds_cap());
        assert_eq!(defaults.clamped(), defaults);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(serde_json::from_str::<ValidationLimits>(r#"{"max_depth": 1}"#).is_err());
    }
}
