//! Common types used by both tree engines.

mod node_id;

pub use node_id::NodeId;

use crate::error::{Result, TreeError};
use serde::{Deserialize, Serialize};

/// Smallest order either engine accepts
pub const MIN_ORDER: usize = 2;

/// Default order (small enough that splits and merges show up in exports)
pub const DEFAULT_ORDER: usize = 3;

/// Tree configuration shared by the B-tree and B+tree engines
///
/// The same `order` value yields different node capacities per engine:
/// a B-tree node holds up to `2 * order - 1` keys, a B+tree node up to
/// `order - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    /// Branching parameter (called "degree" for the B-tree)
    pub order: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
        }
    }
}

impl TreeConfig {
    /// Create a config with the given order
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    /// Reject orders the engines cannot balance
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(TreeError::InvalidConfiguration {
                order: self.order,
                min: MIN_ORDER,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(TreeConfig::new(2).validate().is_ok());
        assert!(TreeConfig::default().validate().is_ok());
        assert!(matches!(
            TreeConfig::new(1).validate(),
            Err(TreeError::InvalidConfiguration { order: 1, min: 2 })
        ));
        assert!(TreeConfig::new(0).validate().is_err());
    }

    #[test]
    fn test_config_serde() {
        let config: TreeConfig = serde_json::from_str(r#"{"order":5}"#).unwrap();
        assert_eq!(config, TreeConfig::new(5));
        assert_eq!(serde_json::to_string(&config).unwrap(), r#"{"order":5}"#);
    }
}
