//! The paint shop: intake queue, tint pool and return channel behind one
//! shared handle, plus the customer and staff operations over them.

use std::sync::Arc;

use log::{debug, error, info};

use crate::config::ShopConfig;
use crate::error::ShopError;
use crate::mixer::Mixer;
use crate::order_queue::OrderQueue;
use crate::ship_buffer::{ShipBuffer, Shipment};
use crate::shutdown::ShutdownLatch;
use crate::tints::{TintPool, TintSet};
use crate::types::{Order, StaffId};

pub struct PaintShop {
    config: ShopConfig,
    orders: OrderQueue,
    tints: TintPool,
    ship: ShipBuffer,
    shutdown: ShutdownLatch,
}

impl PaintShop {
    /// Allocate all shop state. Must run before any customer or staff thread.
    pub fn open(config: ShopConfig) -> Result<Self, ShopError> {
        config.validate()?;
        let shutdown = ShutdownLatch::new();
        info!(
            "[SHOP] open order_capacity={} ship_capacity={} tints={} complexity={}",
            config.order_capacity, config.ship_capacity, config.tints, config.paint_complexity
        );
        Ok(Self {
            config,
            orders: OrderQueue::new(config.order_capacity),
            tints: TintPool::new(config.tints),
            ship: ShipBuffer::new(config.ship_capacity, shutdown.clone()),
            shutdown,
        })
    }

    /// Tear the shop down once every thread has gone home.
    pub fn close(self) {
        debug_assert_eq!(self.orders.len(), 0, "orders left in the intake queue");
        debug_assert_eq!(self.ship.len(), 0, "orders left unclaimed in the ship buffer");
        debug_assert!(self.tints.held_tints().is_empty(), "tints still held at close");
        info!(
            "[SHOP] close queued={} unclaimed={} closed={}",
            self.orders.len(),
            self.ship.len(),
            self.shutdown.is_closed()
        );
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_closed()
    }

    /// Customer side: submit `order` and block until it comes back filled.
    pub fn order_paint(&self, order: &Arc<Order>) {
        debug!("[CUSTOMER] order {} submitted", order.id());
        self.orders.submit(Arc::clone(order));
        self.ship.await_and_claim(order);
        debug!("[CUSTOMER] order {} collected", order.id());
    }

    /// Staff side: wait for the next order.
    pub fn take_order(&self) -> Arc<Order> {
        self.orders.take()
    }

    /// Mix `order` while holding exactly the tints it asks for.
    pub fn fill_order(
        &self,
        order: &Order,
        mixer: &dyn Mixer,
        staff: StaffId,
    ) -> Result<(), ShopError> {
        let complexity = self.config.paint_complexity;
        if order.requested_tints().len() != complexity {
            return Err(ShopError::WrongComplexity {
                order: order.id(),
                len: order.requested_tints().len(),
                complexity,
            });
        }
        let set = TintSet::from_requested(order.requested_tints());
        if let Some(tint) = set.max().filter(|&tint| tint as usize > self.tints.tints()) {
            return Err(ShopError::UnknownTint {
                order: order.id(),
                tint,
                tints: self.tints.tints(),
            });
        }
        let lease = self.tints.lease(&set, staff);
        debug!("[STAFF] staff {staff} mixing order {} with {:?}", order.id(), set.as_slice());
        mixer.mix(order, lease.tints(), staff);
        Ok(())
    }

    /// Staff side: hand a processed order back towards its customer.
    pub fn serve_order(&self, order: Arc<Order>) -> Shipment {
        self.ship.deposit(order)
    }

    /// One pass of the staff loop: take, fill (unless go-home), serve.
    pub fn process_next(&self, mixer: &dyn Mixer, staff: StaffId) -> Arc<Order> {
        let order = self.take_order();
        if !order.is_go_home() {
            if let Err(err) = self.fill_order(&order, mixer, staff) {
                // Serve it anyway so the customer is not left waiting.
                error!("[STAFF] staff {staff} could not fill order: {err}");
            }
        }
        let shipment = self.serve_order(Arc::clone(&order));
        debug!("[STAFF] staff {staff} served order {} ({shipment:?})", order.id());
        order
    }

    /// Keep processing orders until this staff member takes a go-home order.
    /// Returns the number of regular orders handled.
    pub fn work_shift(&self, mixer: &dyn Mixer, staff: StaffId) -> usize {
        let mut served = 0;
        loop {
            let order = self.process_next(mixer, staff);
            if order.is_go_home() {
                debug!("[STAFF] staff {staff} going home after {served} orders");
                return served;
            }
            served += 1;
        }
    }
}
