//! Shared identifiers and the order model passed between customers and staff.

use std::sync::{Mutex, MutexGuard};

use smallvec::SmallVec;

/// Identifier for an order, used for diagnostics only.
pub type OrderId = u64;
/// Identifier for a staff thread.
pub type StaffId = u64;
/// Identifier for a tint in the pool; `NO_TINT` means "nothing requested".
pub type TintId = u32;

/// Sentinel entry in a requested tint list.
pub const NO_TINT: TintId = 0;
/// Default number of entries in an order's tint list.
pub const PAINT_COMPLEXITY: usize = 3;
/// Default size of the tint pool.
pub const NCOLOURS: usize = 10;

const TINT_NAMES: [&str; NCOLOURS] = [
    "blue", "green", "yellow", "magenta", "orange", "cyan", "black", "red", "white", "brown",
];

/// Display name of a tint, for logs and summaries.
pub fn tint_name(tint: TintId) -> String {
    match tint {
        NO_TINT => "none".to_string(),
        id if (id as usize) <= NCOLOURS => TINT_NAMES[id as usize - 1].to_string(),
        id => format!("tint-{id}"),
    }
}

/// Paint can carried by an order; filled in by the mixer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Can {
    /// Tints poured into the can, in pour order.
    pub contents: Vec<TintId>,
    /// Staff member that mixed the can.
    pub mixed_by: Option<StaffId>,
}

/// A customer's paint order.
///
/// Orders travel through the shop as `Arc<Order>`; a customer recognises its
/// own order by pointer identity, never by comparing fields.
#[derive(Debug)]
pub struct Order {
    id: OrderId,
    requested_tints: SmallVec<[TintId; PAINT_COMPLEXITY]>,
    go_home: bool,
    can: Mutex<Can>,
}

impl Order {
    /// Construct an order requesting `tints` (duplicates and `NO_TINT` allowed).
    pub fn new(id: OrderId, tints: &[TintId]) -> Self {
        Self {
            id,
            requested_tints: SmallVec::from_slice(tints),
            go_home: false,
            can: Mutex::new(Can::default()),
        }
    }

    /// Construct the sentinel order that sends the shop home.
    pub fn go_home(id: OrderId) -> Self {
        Self {
            id,
            requested_tints: SmallVec::new(),
            go_home: true,
            can: Mutex::new(Can::default()),
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn requested_tints(&self) -> &[TintId] {
        &self.requested_tints
    }

    pub fn is_go_home(&self) -> bool {
        self.go_home
    }

    /// Lock the can for the mixer or for the customer inspecting it.
    pub fn can(&self) -> MutexGuard<'_, Can> {
        self.can.lock().expect("order can mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_names_cover_default_pool() {
        assert_eq!(tint_name(1), "blue");
        assert_eq!(tint_name(10), "brown");
        assert_eq!(tint_name(NO_TINT), "none");
        assert_eq!(tint_name(12), "tint-12");
    }

    #[test]
    fn go_home_order_requests_nothing() {
        let order = Order::go_home(5);
        assert!(order.is_go_home());
        assert!(order.requested_tints().is_empty());
        assert_eq!(*order.can(), Can::default());
    }
}
