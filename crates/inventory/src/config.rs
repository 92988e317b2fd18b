//! Inventory configuration loaded from environment variables.

/// Ledger configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `LOW_STOCK_THRESHOLD` — stock level at or below which
///   `inventory:low_stock` fires (default: `5`)
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub low_stock_threshold: u32,
}

impl InventoryConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            low_stock_threshold: std::env::var("LOW_STOCK_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }

    /// Overrides the low-stock threshold.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        assert_eq!(InventoryConfig::default().low_stock_threshold, 5);
    }

    #[test]
    fn test_with_threshold() {
        let config = InventoryConfig::default().with_threshold(2);
        assert_eq!(config.low_stock_threshold, 2);
    }
}
