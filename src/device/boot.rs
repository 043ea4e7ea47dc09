//! Boot sequencer.
//!
//! After power-on or reset the module emits its startup banner once. Until
//! that banner shows up nothing else may run: an unanswered module is
//! rebooted with a bounded number of reset pulses before the driver gives
//! up for good.

use crate::commands::STARTUP_BANNER;
use crate::timers::{Countdowns, TimerId};
use crate::transport::Transport;

use super::{BOOT_TIMEOUT_TICKS, MAX_BOOT_ATTEMPTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BootEvent {
    None,
    /// The startup banner arrived inside the window.
    Booted,
    /// Every reboot attempt timed out.
    Fatal,
}

pub(crate) struct BootSequencer {
    booted: bool,
    attempts: u8,
}

impl BootSequencer {
    pub(crate) const fn new() -> Self {
        Self {
            booted: false,
            attempts: 0,
        }
    }

    pub(crate) fn is_booted(&self) -> bool {
        self.booted
    }

    /// Fresh boot state for a newly powered module; arms the banner window.
    pub(crate) fn restart<C: Countdowns>(&mut self, timers: &C) {
        self.booted = false;
        self.attempts = 0;
        timers.arm(TimerId::Boot, BOOT_TIMEOUT_TICKS);
    }

    pub(crate) fn reset(&mut self) {
        self.booted = false;
        self.attempts = 0;
    }

    pub(crate) fn drive<T: Transport, C: Countdowns>(
        &mut self,
        transport: &mut T,
        timers: &C,
    ) -> BootEvent {
        if timers.get(TimerId::Boot) == 1 {
            // No banner inside the window: reboot, or give up once the
            // attempt budget is spent.
            self.attempts += 1;
            if self.attempts >= MAX_BOOT_ATTEMPTS {
                timers.clear(TimerId::Boot);
                return BootEvent::Fatal;
            }
            timers.arm(TimerId::Boot, BOOT_TIMEOUT_TICKS);
            transport.pulse_reset();
        } else if transport.scan_receive_buffer(STARTUP_BANNER) {
            self.booted = true;
            timers.clear(TimerId::Boot);
            return BootEvent::Booted;
        }
        BootEvent::None
    }
}
