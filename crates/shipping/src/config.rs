//! Shipping configuration loaded from environment variables.

use std::time::Duration;

/// Saga timing configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SHIPPING_PROCESSING_DELAY_MS` — delay between order creation and
///   shipment (default: `2000`)
/// - `SHIPPING_DELIVERY_DELAY_MS` — delay between shipment and delivery
///   (default: `3000`)
/// - `SHIPPING_LEAD_TIME_DAYS` — estimated-delivery lead time stamped on
///   the shipment (default: `3`)
#[derive(Debug, Clone)]
pub struct ShippingConfig {
    pub processing_delay: Duration,
    pub delivery_delay: Duration,
    pub lead_time_days: i64,
}

impl ShippingConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let millis = |var: &str, default: u64| {
            std::env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            processing_delay: Duration::from_millis(millis("SHIPPING_PROCESSING_DELAY_MS", 2000)),
            delivery_delay: Duration::from_millis(millis("SHIPPING_DELIVERY_DELAY_MS", 3000)),
            lead_time_days: std::env::var("SHIPPING_LEAD_TIME_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Overrides both saga delays; used by tests to keep runs fast.
    pub fn with_delays(mut self, processing: Duration, delivery: Duration) -> Self {
        self.processing_delay = processing;
        self.delivery_delay = delivery;
        self
    }
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            processing_delay: Duration::from_millis(2000),
            delivery_delay: Duration::from_millis(3000),
            lead_time_days: 3,
        }
    }
}
