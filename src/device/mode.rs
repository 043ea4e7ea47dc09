//! Mode switch controller.
//!
//! The module's UART is either a transparent data pipe to the peer or an
//! AT command interpreter, and the two directions of the switch are
//! asymmetric. Entering command mode is a hardware handshake: assert the
//! mode request line for a hold window, release it, then expect an `OK`
//! inside a response window. Entering data mode is a plain `ATO1` command.
//!
//! Neither direction has a retry cap; a failed episode restarts itself
//! until the observed mode matches the target.

use crate::commands::RESUME_DATA_MODE;
use crate::timers::{Countdowns, TimerId};
use crate::transport::Transport;

use super::{
    send_at_command, CommandOutcome, OperatingMode, SWITCH_HOLD_TICKS, SWITCH_RESPONSE_TICKS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwitchEvent {
    None,
    /// The module acknowledged command mode; an interrupted batch may
    /// resume.
    EnteredCommandMode,
}

pub(crate) struct ModeSwitch {
    target: OperatingMode,
    starting: bool,
    in_progress: bool,
}

impl ModeSwitch {
    pub(crate) const fn new() -> Self {
        Self {
            target: OperatingMode::Data,
            starting: false,
            in_progress: false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.starting || self.in_progress
    }

    #[cfg(test)]
    pub(crate) fn target(&self) -> OperatingMode {
        self.target
    }

    pub(crate) fn reset(&mut self) {
        self.target = OperatingMode::Data;
        self.starting = false;
        self.in_progress = false;
    }

    /// Begins a new switch episode toward `target`.
    pub(crate) fn request(&mut self, target: OperatingMode) {
        self.target = target;
        self.starting = true;
    }

    pub(crate) fn drive<T: Transport, C: Countdowns>(
        &mut self,
        transport: &mut T,
        timers: &C,
        in_data_mode: &mut bool,
        outcome: &mut CommandOutcome,
        booted: bool,
    ) -> SwitchEvent {
        if *in_data_mode && self.target == OperatingMode::Command {
            if self.starting {
                transport.set_mode_request(true);
                self.starting = false;
                self.in_progress = true;
                *outcome = CommandOutcome::Pending;
                timers.arm(TimerId::SwitchHold, SWITCH_HOLD_TICKS);
                timers.arm(TimerId::SwitchResponse, SWITCH_RESPONSE_TICKS);
            } else if timers.get(TimerId::SwitchHold) == 1 {
                transport.set_mode_request(false);
                if timers.get(TimerId::SwitchResponse) == 1 {
                    timers.clear(TimerId::SwitchHold);
                    timers.clear(TimerId::SwitchResponse);
                    self.in_progress = false;
                    if *outcome == CommandOutcome::Ok {
                        *in_data_mode = false;
                        return SwitchEvent::EnteredCommandMode;
                    }
                    // No acknowledgement inside the response window; run
                    // the whole handshake again.
                    self.starting = true;
                }
            }
        } else if !*in_data_mode && self.target == OperatingMode::Data {
            if self.starting {
                self.starting = false;
                self.in_progress = true;
                send_at_command(transport, timers, booted, outcome, RESUME_DATA_MODE);
            } else {
                match *outcome {
                    CommandOutcome::Ok => {
                        // A stale deadline must not fire after a clean
                        // switch.
                        timers.clear(TimerId::Command);
                        self.in_progress = false;
                        *in_data_mode = true;
                    }
                    CommandOutcome::Error => {
                        send_at_command(transport, timers, booted, outcome, RESUME_DATA_MODE);
                    }
                    CommandOutcome::TimedOut => {
                        // Possibly already in data mode; restart and let
                        // the mode indicator line settle it.
                        self.starting = true;
                    }
                    CommandOutcome::Pending => {}
                }
            }
        } else {
            // Observed mode already matches the target.
            self.starting = false;
            self.in_progress = false;
        }
        SwitchEvent::None
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::FakeTransport;
    use super::*;
    use crate::timers::AtomicCountdowns;

    fn setup() -> (FakeTransport, AtomicCountdowns, CommandOutcome, ModeSwitch) {
        (
            FakeTransport::new(),
            AtomicCountdowns::new(),
            CommandOutcome::Pending,
            ModeSwitch::new(),
        )
    }

    #[test]
    fn switch_to_command_mode_holds_then_releases_line() {
        let (mut transport, timers, mut outcome, mut switch) = setup();
        let mut in_data_mode = true;
        switch.request(OperatingMode::Command);

        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert!(transport.mode_request_line);
        assert!(switch.is_active());
        assert_eq!(outcome, CommandOutcome::Pending);

        // Hold window still running: line stays asserted.
        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert!(transport.mode_request_line);

        timers.tick();
        outcome = CommandOutcome::Ok;
        assert_eq!(
            switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true),
            SwitchEvent::EnteredCommandMode
        );
        assert!(!transport.mode_request_line);
        assert!(!in_data_mode);
        assert!(!switch.is_active());
        assert_eq!(timers.get(TimerId::SwitchHold), 0);
        assert_eq!(timers.get(TimerId::SwitchResponse), 0);
    }

    #[test]
    fn silent_command_mode_switch_restarts() {
        let (mut transport, timers, mut outcome, mut switch) = setup();
        let mut in_data_mode = true;
        switch.request(OperatingMode::Command);

        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        timers.tick();
        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);

        // No OK observed: the episode restarts from the hold phase.
        assert!(in_data_mode);
        assert!(switch.is_active());
        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert!(transport.mode_request_line);
    }

    #[test]
    fn switch_to_data_mode_sends_resume_command() {
        let (mut transport, timers, mut outcome, mut switch) = setup();
        let mut in_data_mode = false;
        switch.request(OperatingMode::Data);

        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert_eq!(transport.sent, ["ATO1\r\n"]);
        assert!(timers.get(TimerId::Command) > 1);

        outcome = CommandOutcome::Ok;
        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert!(in_data_mode);
        assert!(!switch.is_active());
        // Success disarms the command deadline.
        assert_eq!(timers.get(TimerId::Command), 0);
    }

    #[test]
    fn rejected_resume_command_is_resent() {
        let (mut transport, timers, mut outcome, mut switch) = setup();
        let mut in_data_mode = false;
        switch.request(OperatingMode::Data);

        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        outcome = CommandOutcome::Error;
        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert_eq!(transport.sent, ["ATO1\r\n", "ATO1\r\n"]);
        assert!(!in_data_mode);
    }

    #[test]
    fn timed_out_resume_restarts_episode() {
        let (mut transport, timers, mut outcome, mut switch) = setup();
        let mut in_data_mode = false;
        switch.request(OperatingMode::Data);

        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        outcome = CommandOutcome::TimedOut;
        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert!(switch.is_active());

        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert_eq!(transport.sent, ["ATO1\r\n", "ATO1\r\n"]);
    }

    #[test]
    fn matching_mode_clears_episode() {
        let (mut transport, timers, mut outcome, mut switch) = setup();
        let mut in_data_mode = true;
        switch.request(OperatingMode::Data);

        switch.drive(&mut transport, &timers, &mut in_data_mode, &mut outcome, true);
        assert!(!switch.is_active());
        assert!(transport.sent.is_empty());
    }
}
