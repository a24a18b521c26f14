//! Exclusive tint pool with ordered, scoped multi-tint acquisition.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex};

use log::{error, trace};
use smallvec::SmallVec;

use crate::types::{NO_TINT, PAINT_COMPLEXITY, StaffId, TintId, tint_name};

/// Distinct requested tints in ascending id order.
///
/// Ascending id is the shop-wide lock order; every lease walks it front to back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TintSet(SmallVec<[TintId; PAINT_COMPLEXITY]>);

impl TintSet {
    /// Drop `NO_TINT` entries and duplicates, then sort.
    pub fn from_requested(requested: &[TintId]) -> Self {
        let mut tints: SmallVec<[TintId; PAINT_COMPLEXITY]> = requested
            .iter()
            .copied()
            .filter(|&tint| tint != NO_TINT)
            .collect();
        tints.sort_unstable();
        tints.dedup();
        Self(tints)
    }

    pub fn as_slice(&self) -> &[TintId] {
        &self.0
    }

    pub fn contains(&self, tint: TintId) -> bool {
        self.0.binary_search(&tint).is_ok()
    }

    /// Highest requested id, if any.
    pub fn max(&self) -> Option<TintId> {
        self.0.last().copied()
    }
}

pub struct TintPool {
    held: Mutex<HashMap<TintId, StaffId>>,
    available: Condvar,
    tints: usize,
}

impl TintPool {
    /// Pool of tints `1..=tints`, all free.
    pub fn new(tints: usize) -> Self {
        Self {
            held: Mutex::new(HashMap::with_capacity(tints)),
            available: Condvar::new(),
            tints,
        }
    }

    pub fn tints(&self) -> usize {
        self.tints
    }

    /// Lock every tint in `set`, lowest id first. Dropping the lease frees them.
    pub fn lease<'a>(&'a self, set: &TintSet, staff: StaffId) -> TintLease<'a> {
        debug_assert!(
            set.max().is_none_or(|tint| tint as usize <= self.tints),
            "tint out of range for pool of {}",
            self.tints
        );
        for &tint in set.as_slice() {
            self.acquire(tint, staff);
        }
        TintLease {
            pool: self,
            set: set.clone(),
            staff,
        }
    }

    fn acquire(&self, tint: TintId, staff: StaffId) {
        let mut guard = self.held.lock().expect("tint pool mutex poisoned");
        loop {
            if !guard.contains_key(&tint) {
                guard.insert(tint, staff);
                trace!("[TINT] staff {staff} holds {}", tint_name(tint));
                return;
            }
            guard = self.available.wait(guard).expect("condvar wait failed");
        }
    }

    fn release(&self, tint: TintId, staff: StaffId) -> bool {
        let mut guard = self.held.lock().expect("tint pool mutex poisoned");
        match guard.get(&tint) {
            Some(owner) if *owner == staff => {
                guard.remove(&tint);
                self.available.notify_all();
                trace!("[TINT] staff {staff} released {}", tint_name(tint));
                true
            }
            Some(owner) => {
                if !cfg!(debug_assertions) {
                    error!("[TINT] release by non-owner: tint={tint} staff={staff} owner={owner}");
                }
                debug_assert!(false, "tint release by non-owner: tint={tint} staff={staff}");
                false
            }
            None => {
                if !cfg!(debug_assertions) {
                    error!("[TINT] release of free tint: tint={tint}");
                }
                debug_assert!(false, "tint release of free tint: tint={tint}");
                false
            }
        }
    }

    /// Snapshot of which staff member holds each tint.
    pub fn held_tints(&self) -> HashMap<TintId, StaffId> {
        let guard = self.held.lock().expect("tint pool mutex poisoned");
        guard.clone()
    }
}

/// Exclusive hold on a set of tints, released on drop.
pub struct TintLease<'a> {
    pool: &'a TintPool,
    set: TintSet,
    staff: StaffId,
}

impl TintLease<'_> {
    pub fn tints(&self) -> &TintSet {
        &self.set
    }
}

impl Drop for TintLease<'_> {
    fn drop(&mut self) {
        for &tint in self.set.as_slice().iter().rev() {
            self.pool.release(tint, self.staff);
        }
    }
}
