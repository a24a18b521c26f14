//! Sizing of the shop's buffers and tint pool.

use crate::error::ConfigError;
use crate::types::{NCOLOURS, PAINT_COMPLEXITY};

const ORDER_BUFFER_SIZE: usize = 10;
const SHIP_BUFFER_SIZE: usize = 10;

/// Capacities fixed when the shop opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShopConfig {
    /// Orders that may wait in the intake queue.
    pub order_capacity: usize,
    /// Finished orders that may wait for collection.
    pub ship_capacity: usize,
    /// Number of tints in the pool (ids `1..=tints`).
    pub tints: usize,
    /// Entries in each order's tint list.
    pub paint_complexity: usize,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            order_capacity: ORDER_BUFFER_SIZE,
            ship_capacity: SHIP_BUFFER_SIZE,
            tints: NCOLOURS,
            paint_complexity: PAINT_COMPLEXITY,
        }
    }
}

impl ShopConfig {
    pub fn with_tints(mut self, tints: usize) -> Self {
        self.tints = tints;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order_capacity == 0 {
            return Err(ConfigError::ZeroOrderCapacity);
        }
        if self.ship_capacity == 0 {
            return Err(ConfigError::ZeroShipCapacity);
        }
        if self.tints == 0 {
            return Err(ConfigError::NoTints);
        }
        if self.paint_complexity == 0 {
            return Err(ConfigError::ZeroComplexity);
        }
        Ok(())
    }
}
