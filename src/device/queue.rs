//! Command queue executor.
//!
//! Holds one ordered batch of AT commands and drives it one command at a
//! time, advancing on `OK`, aborting on `ERROR` and resending on timeout.
//! The executor itself never touches the operating mode; it reports what
//! happened through [`QueueEvent`] and lets the driver request the
//! corrective switch.

use heapless::{String, Vec};

use crate::commands::MAX_COMMAND_LEN;
use crate::timers::Countdowns;
use crate::transport::Transport;

use super::{send_at_command, CommandOutcome};

/// Maximum number of commands in one batch.
pub const COMMAND_QUEUE_LEN: usize = 10;

/// Applied by the driver when a batch completes successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BatchCompletion {
    None,
    FinishInit,
    BtEnabled,
    BtDisabled,
    WifiDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueEvent {
    Idle,
    /// Every command was acknowledged; apply the completion action.
    Completed(BatchCompletion),
    /// The module rejected a command; the rest of the batch is dropped.
    Aborted,
    /// Ran while the module was observed in data mode; switch back first.
    WrongMode,
}

pub(crate) struct CommandQueue {
    slots: Vec<String<MAX_COMMAND_LEN>, COMMAND_QUEUE_LEN>,
    cursor: usize,
    active: bool,
    errored: bool,
    completion: BatchCompletion,
}

impl CommandQueue {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            active: false,
            errored: false,
            completion: BatchCompletion::None,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn has_errored(&self) -> bool {
        self.errored
    }

    pub(crate) fn reset(&mut self) {
        self.slots.clear();
        self.cursor = 0;
        self.active = false;
        self.errored = false;
        self.completion = BatchCompletion::None;
    }

    /// Stages a new batch, superseding any batch still in flight.
    ///
    /// A batch larger than [`COMMAND_QUEUE_LEN`], or containing a command
    /// longer than [`MAX_COMMAND_LEN`], marks the queue errored and stages
    /// nothing.
    pub(crate) fn prepare(&mut self, batch: &[&str], completion: BatchCompletion) {
        self.reset();
        if batch.len() > COMMAND_QUEUE_LEN {
            self.errored = true;
            return;
        }
        for command in batch {
            let mut slot: String<MAX_COMMAND_LEN> = String::new();
            if slot.push_str(command).is_err() {
                self.errored = true;
                return;
            }
            // Capacity checked above.
            let _ = self.slots.push(slot);
        }
        self.completion = completion;
        self.active = true;
    }

    /// Advances the batch by at most one command.
    pub(crate) fn drive<T: Transport, C: Countdowns>(
        &mut self,
        transport: &mut T,
        timers: &C,
        outcome: &mut CommandOutcome,
        in_data_mode: bool,
        booted: bool,
    ) -> QueueEvent {
        if self.errored || !self.active {
            return QueueEvent::Idle;
        }
        if self.slots.is_empty() {
            // Nothing to send; an empty batch completes right away.
            let completion = self.completion;
            self.reset();
            return QueueEvent::Completed(completion);
        }
        if in_data_mode {
            // Someone switched modes underneath us; get back to command
            // mode before sending anything.
            return QueueEvent::WrongMode;
        }
        if self.cursor == 0 {
            // Stale responses must not acknowledge the first command.
            transport.reset_receive_buffer();
            send_at_command(transport, timers, booted, outcome, &self.slots[0]);
            self.cursor = 1;
            return QueueEvent::Idle;
        }
        match *outcome {
            CommandOutcome::Ok => {
                if self.cursor < self.slots.len() {
                    send_at_command(transport, timers, booted, outcome, &self.slots[self.cursor]);
                    self.cursor += 1;
                    QueueEvent::Idle
                } else {
                    let completion = self.completion;
                    self.reset();
                    QueueEvent::Completed(completion)
                }
            }
            CommandOutcome::Error => {
                self.reset();
                QueueEvent::Aborted
            }
            CommandOutcome::TimedOut => {
                // Resend the command that went unanswered. There is no
                // attempt cap here; boot failure is the only bounded retry.
                self.cursor -= 1;
                send_at_command(transport, timers, booted, outcome, &self.slots[self.cursor]);
                self.cursor += 1;
                QueueEvent::Idle
            }
            CommandOutcome::Pending => QueueEvent::Idle,
        }
    }
}
