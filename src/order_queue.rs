//! Bounded FIFO intake queue between customers and staff.

use std::sync::{Arc, Mutex};

use log::trace;
use std_semaphore::Semaphore;

use crate::types::Order;

/// Circular buffer of submitted orders guarded by empty/full slot counters.
pub struct OrderQueue {
    ring: Mutex<OrderRing>,
    empty: Semaphore,
    full: Semaphore,
}

struct OrderRing {
    slots: Vec<Option<Arc<Order>>>,
    // slots[first] is the next free slot, slots[last] the oldest order.
    first: usize,
    last: usize,
    len: usize,
}

impl OrderQueue {
    /// Create an empty queue holding at most `capacity` orders.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "order queue capacity must be > 0");
        Self {
            ring: Mutex::new(OrderRing {
                slots: vec![None; capacity],
                first: 0,
                last: 0,
                len: 0,
            }),
            empty: Semaphore::new(capacity as isize),
            full: Semaphore::new(0),
        }
    }

    /// Hand an order to staff, blocking while the queue is full.
    pub fn submit(&self, order: Arc<Order>) {
        self.empty.acquire();
        {
            let mut ring = self.ring.lock().expect("order queue mutex poisoned");
            let capacity = ring.slots.len();
            let slot = ring.first;
            debug_assert!(ring.slots[slot].is_none(), "order queue overwrote a slot");
            trace!("[QUEUE] order {} -> slot {slot}", order.id());
            ring.slots[slot] = Some(order);
            ring.first = (slot + 1) % capacity;
            ring.len += 1;
        }
        self.full.release();
    }

    /// Block until an order is available and return the oldest one.
    pub fn take(&self) -> Arc<Order> {
        self.full.acquire();
        let order = {
            let mut ring = self.ring.lock().expect("order queue mutex poisoned");
            let capacity = ring.slots.len();
            let slot = ring.last;
            let order = ring.slots[slot]
                .take()
                .expect("order queue full permit without an order");
            ring.last = (slot + 1) % capacity;
            ring.len -= 1;
            trace!("[QUEUE] slot {slot} -> order {}", order.id());
            order
        };
        self.empty.release();
        order
    }

    /// Current number of queued orders.
    pub fn len(&self) -> usize {
        let ring = self.ring.lock().expect("order queue mutex poisoned");
        ring.len
    }
}
