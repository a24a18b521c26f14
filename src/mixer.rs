use std::thread;
use std::time::Duration;

use crate::tints::TintSet;
use crate::types::{NO_TINT, Order, StaffId};

/// Tints an order's can. Called with every tint in `held` already locked by
/// the caller; implementations must not touch the tint pool themselves.
pub trait Mixer: Send + Sync {
    fn mix(&self, order: &Order, held: &TintSet, staff: StaffId);
}

/// Pours each requested tint into the can and takes `work` to do it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaintMixer {
    pub work: Duration,
}

impl PaintMixer {
    pub fn new(work: Duration) -> Self {
        Self { work }
    }
}

impl Mixer for PaintMixer {
    fn mix(&self, order: &Order, held: &TintSet, staff: StaffId) {
        let mut can = order.can();
        for &tint in order.requested_tints() {
            if tint == NO_TINT {
                continue;
            }
            debug_assert!(held.contains(tint), "mixing tint {tint} without holding it");
            can.contents.push(tint);
        }
        can.mixed_by = Some(staff);
        drop(can);
        if !self.work.is_zero() {
            thread::sleep(self.work);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pours_every_requested_tint_including_repeats() {
        let order = Order::new(1, &[3, 0, 3]);
        let held = TintSet::from_requested(order.requested_tints());
        PaintMixer::default().mix(&order, &held, 2);
        let can = order.can();
        assert_eq!(can.contents, vec![3, 3]);
        assert_eq!(can.mixed_by, Some(2));
    }
}
