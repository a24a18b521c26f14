//! Return channel: a fixed pool of finished orders that each customer
//! searches for its own order.

use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info, trace};
use std_semaphore::Semaphore;

use crate::shutdown::ShutdownLatch;
use crate::types::Order;

/// Outcome of handing a finished order to the return channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shipment {
    /// The order is waiting in a slot for its customer.
    Shipped,
    /// The shop was already closed; the order is never delivered.
    Dropped,
    /// This order was a go-home order and closed the shop.
    ClosedShop,
}

pub struct ShipBuffer {
    slots: Mutex<Vec<Option<Arc<Order>>>>,
    empty: Semaphore,
    full: Semaphore,
    shutdown: ShutdownLatch,
}

impl ShipBuffer {
    /// Empty channel with `capacity` slots, closed by `shutdown`.
    pub fn new(capacity: usize, shutdown: ShutdownLatch) -> Self {
        debug_assert!(capacity > 0, "ship buffer capacity must be > 0");
        Self {
            slots: Mutex::new(vec![None; capacity]),
            empty: Semaphore::new(capacity as isize),
            full: Semaphore::new(0),
            shutdown,
        }
    }

    /// Place a finished order where its customer can find it.
    ///
    /// Once the shop is closed nothing is placed, including orders that were
    /// already in flight.
    pub fn deposit(&self, order: Arc<Order>) -> Shipment {
        if self.shutdown.is_closed() {
            debug!("[SHIP] shop closed, dropping order {}", order.id());
            return Shipment::Dropped;
        }
        if order.is_go_home() {
            if self.shutdown.close() {
                info!("[SHUTDOWN] order {} closed the shop", order.id());
            }
            return Shipment::ClosedShop;
        }

        self.empty.acquire();
        {
            let mut slots = self.slots.lock().expect("ship buffer mutex poisoned");
            let free = slots
                .iter()
                .position(Option::is_none)
                .expect("ship buffer empty permit without a free slot");
            trace!("[SHIP] order {} -> slot {free}", order.id());
            slots[free] = Some(order);
        }
        self.full.release();
        Shipment::Shipped
    }

    /// Block until `order` has been shipped, then remove it from its slot.
    ///
    /// A go-home order is never shipped and returns immediately.
    pub fn await_and_claim(&self, order: &Arc<Order>) {
        if order.is_go_home() {
            return;
        }

        loop {
            self.full.acquire();
            let found = {
                let mut slots = self.slots.lock().expect("ship buffer mutex poisoned");
                match slots
                    .iter()
                    .position(|slot| slot.as_ref().is_some_and(|s| Arc::ptr_eq(s, order)))
                {
                    Some(index) => {
                        slots[index] = None;
                        trace!("[SHIP] slot {index} -> order {}", order.id());
                        true
                    }
                    None => false,
                }
            };
            if found {
                self.empty.release();
                return;
            }
            // Someone else's order; put the permit back for its owner.
            self.full.release();
            thread::yield_now();
        }
    }

    /// Orders shipped but not yet claimed.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().expect("ship buffer mutex poisoned");
        slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Barrier;
    use std::time::Duration;

    fn order(id: u64) -> Arc<Order> {
        Arc::new(Order::new(id, &[1, 2, 0]))
    }

    #[test]
    fn customer_claims_its_own_order_among_others() {
        let ship = Arc::new(ShipBuffer::new(4, ShutdownLatch::new()));
        let mine = order(1);
        let other = order(2);
        assert_eq!(ship.deposit(Arc::clone(&other)), Shipment::Shipped);
        assert_eq!(ship.deposit(Arc::clone(&mine)), Shipment::Shipped);

        ship.await_and_claim(&mine);
        assert_eq!(ship.len(), 1);
        ship.await_and_claim(&other);
        assert_eq!(ship.len(), 0);
    }

    #[test]
    fn identity_not_equality_decides_the_match() {
        let ship = Arc::new(ShipBuffer::new(2, ShutdownLatch::new()));
        let lookalike = order(1);
        let mine = order(1);
        ship.deposit(Arc::clone(&lookalike));

        let (tx, rx) = mpsc::channel();
        let ship_clone = Arc::clone(&ship);
        let mine_clone = Arc::clone(&mine);
        let handle = thread::spawn(move || {
            ship_clone.await_and_claim(&mine_clone);
            tx.send(()).expect("send");
        });

        // Same id and tints, different order: the customer keeps waiting.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        ship.deposit(Arc::clone(&mine));
        rx.recv_timeout(Duration::from_secs(1))
            .expect("customer never found its order");
        handle.join().expect("customer thread panicked");
        assert_eq!(ship.len(), 1);
        ship.await_and_claim(&lookalike);
    }

    #[test]
    fn concurrent_customers_each_get_their_own_order() {
        let ship = Arc::new(ShipBuffer::new(3, ShutdownLatch::new()));
        let customers = 8u64;
        let orders: Vec<_> = (0..customers).map(order).collect();
        let barrier = Arc::new(Barrier::new(customers as usize + 1));
        let (done_tx, done_rx) = mpsc::channel();

        let mut handles = Vec::new();
        for mine in &orders {
            let ship = Arc::clone(&ship);
            let barrier = Arc::clone(&barrier);
            let done_tx = done_tx.clone();
            let mine = Arc::clone(mine);
            handles.push(thread::spawn(move || {
                barrier.wait();
                ship.await_and_claim(&mine);
                done_tx.send(mine.id()).expect("done");
            }));
        }

        barrier.wait();
        // Deposit in reverse so customers must skip others' orders.
        for mine in orders.iter().rev() {
            assert_eq!(ship.deposit(Arc::clone(mine)), Shipment::Shipped);
        }

        let mut claimed = Vec::new();
        for _ in 0..customers {
            claimed.push(
                done_rx
                    .recv_timeout(Duration::from_secs(5))
                    .expect("customer stalled"),
            );
        }
        for handle in handles {
            handle.join().expect("customer thread panicked");
        }
        claimed.sort_unstable();
        assert_eq!(claimed, (0..customers).collect::<Vec<_>>());
        assert_eq!(ship.len(), 0);
    }

    #[test]
    fn go_home_order_closes_shop_and_later_deposits_are_dropped() {
        let latch = ShutdownLatch::new();
        let ship = ShipBuffer::new(2, latch.clone());
        let go_home = Arc::new(Order::go_home(100));

        assert_eq!(ship.deposit(Arc::clone(&go_home)), Shipment::ClosedShop);
        assert!(latch.is_closed());
        assert_eq!(ship.deposit(order(1)), Shipment::Dropped);
        assert_eq!(ship.deposit(Arc::new(Order::go_home(101))), Shipment::Dropped);
        assert_eq!(ship.len(), 0);

        // The go-home customer never waits on the channel.
        ship.await_and_claim(&go_home);
    }

    #[test]
    fn deposit_blocks_while_every_slot_is_taken() {
        let ship = Arc::new(ShipBuffer::new(1, ShutdownLatch::new()));
        let first = order(1);
        ship.deposit(Arc::clone(&first));

        let (tx, rx) = mpsc::channel();
        let ship_clone = Arc::clone(&ship);
        let second = order(2);
        let second_clone = Arc::clone(&second);
        let handle = thread::spawn(move || {
            tx.send(ship_clone.deposit(second_clone)).expect("send");
        });

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        ship.await_and_claim(&first);
        let shipped = rx
            .recv_timeout(Duration::from_secs(1))
            .expect("deposit never woke");
        assert_eq!(shipped, Shipment::Shipped);
        handle.join().expect("staff thread panicked");
        ship.await_and_claim(&second);
    }
}
