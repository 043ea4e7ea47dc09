//! Countdown timers shared with the interrupt context.
//!
//! The driver never measures time itself. The host owns a periodic
//! interrupt, paced at the same rate as [`Nina::tick`](crate::Nina::tick),
//! which decrements a small set of countdown slots. The driver only arms a
//! slot and later observes that it has run down.
//!
//! Every slot follows one value convention:
//!
//! - `0`: idle, nothing armed
//! - `1`: expired, waiting for the driver to consume the edge
//! - `> 1`: running
//!
//! The decrementing side must stop at `1`, otherwise the driver could miss
//! the expiry edge between two control cycles. [`AtomicCountdowns`] does
//! exactly that and is the implementation to reach for unless the host has
//! dedicated timer hardware to expose instead.

use core::sync::atomic::{AtomicU32, Ordering};

/// Identifies one countdown slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    /// Window for the startup banner after a module reset.
    Boot,
    /// Response deadline for the AT command in flight.
    Command,
    /// Hold time of the mode request line during a switch to command mode.
    SwitchHold,
    /// Response window after the mode request line is released.
    SwitchResponse,
}

const TIMER_COUNT: usize = 4;

impl TimerId {
    fn index(self) -> usize {
        match self {
            TimerId::Boot => 0,
            TimerId::Command => 1,
            TimerId::SwitchHold => 2,
            TimerId::SwitchResponse => 3,
        }
    }
}

/// Countdown slots armed by the driver and decremented out of band.
///
/// Methods take `&self` because implementations are shared with an
/// interrupt handler; every access must be a single atomic load or store.
pub trait Countdowns {
    /// Arms `id` to expire after `ticks - 1` decrements.
    fn arm(&self, id: TimerId, ticks: u32);

    /// Current value of `id`. `1` means expired, `0` means idle.
    fn get(&self, id: TimerId) -> u32;

    /// Returns the slot to idle, discarding any pending expiry.
    fn clear(&self, id: TimerId);
}

/// Atomic [`Countdowns`] implementation.
///
/// Call [`tick`](AtomicCountdowns::tick) from the host's periodic
/// interrupt; everything else happens on the main execution context.
pub struct AtomicCountdowns {
    slots: [AtomicU32; TIMER_COUNT],
}

impl AtomicCountdowns {
    pub const fn new() -> Self {
        Self {
            slots: [
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
            ],
        }
    }

    /// Decrements every running slot, stopping at the expired value.
    ///
    /// Uses a compare-exchange per slot so a slot re-armed by the main
    /// context between load and store keeps its fresh value.
    pub fn tick(&self) {
        for slot in &self.slots {
            let value = slot.load(Ordering::Relaxed);
            if value > 1 {
                let _ = slot.compare_exchange(
                    value,
                    value - 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                );
            }
        }
    }
}

impl Default for AtomicCountdowns {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdowns for AtomicCountdowns {
    fn arm(&self, id: TimerId, ticks: u32) {
        self.slots[id.index()].store(ticks, Ordering::Relaxed);
    }

    fn get(&self, id: TimerId) -> u32 {
        self.slots[id.index()].load(Ordering::Relaxed)
    }

    fn clear(&self, id: TimerId) {
        self.slots[id.index()].store(0, Ordering::Relaxed);
    }
}
