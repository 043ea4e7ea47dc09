//! NINA driver state machine.
//!
//! This module owns [`Nina`], the driver struct tying together the four
//! sub-machines that share the module's single UART and GPIO lines:
//!
//! - [`boot`]: waits for the startup banner, with bounded reboots
//! - [`queue`]: drives ordered AT command batches one command at a time
//! - [`mode`]: switches between command mode and transparent data mode
//! - [`message`]: relays one outbound payload once a peer is reachable
//!
//! Nothing here blocks beyond the synchronous UART write of a single short
//! command. All progress happens inside [`Nina::tick`], which the host
//! must call once per control cycle; request functions only stage work and
//! return immediately.

mod boot;
mod message;
mod mode;
mod queue;

pub use message::MAX_MESSAGE_LEN;
pub use queue::COMMAND_QUEUE_LEN;

use heapless::String;

use crate::commands::{self, ResponseKind, MAX_NAME_LEN};
use crate::error::{Error, FatalError};
use crate::timers::{Countdowns, TimerId};
use crate::transport::Transport;

use boot::{BootEvent, BootSequencer};
use message::MessageTransmitter;
use mode::{ModeSwitch, SwitchEvent};
use queue::{BatchCompletion, CommandQueue, QueueEvent};

/// Response deadline for a command once the module has booted, in timer
/// ticks.
pub(crate) const COMMAND_TIMEOUT_TICKS: u32 = 400;
/// Tighter deadline used while the module is still booting.
pub(crate) const COMMAND_TIMEOUT_EARLY_TICKS: u32 = 160;
/// Window for the startup banner after releasing reset.
pub(crate) const BOOT_TIMEOUT_TICKS: u32 = 5000;
/// Reboot attempts before the boot failure becomes fatal.
pub(crate) const MAX_BOOT_ATTEMPTS: u8 = 10;
/// Mode request line hold time during a switch to command mode.
pub(crate) const SWITCH_HOLD_TICKS: u32 = 2;
/// Response window after releasing the mode request line.
pub(crate) const SWITCH_RESPONSE_TICKS: u32 = 2;

/// Lifecycle of the radio.
///
/// Transitions run forward only; [`Error`](RadioStatus::Error) is terminal
/// and reached solely through boot-failure escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioStatus {
    Uninitialized,
    BtInitialized,
    Error,
}

/// Operating mode of the module's UART interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Input and output are relayed transparently to the connected peer.
    Data,
    /// Input is interpreted as AT commands.
    Command,
}

/// Result of the most recently dispatched AT command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum CommandOutcome {
    Pending,
    Ok,
    Error,
    TimedOut,
}

/// Clears the previous outcome, arms the response deadline and transmits
/// `command` synchronously.
pub(crate) fn send_at_command<T: Transport, C: Countdowns>(
    transport: &mut T,
    timers: &C,
    booted: bool,
    outcome: &mut CommandOutcome,
    command: &str,
) {
    *outcome = CommandOutcome::Pending;
    let deadline = if booted {
        COMMAND_TIMEOUT_TICKS
    } else {
        COMMAND_TIMEOUT_EARLY_TICKS
    };
    timers.arm(TimerId::Command, deadline);
    transport.send(command.as_bytes());
}

/// Driver for one NINA module.
///
/// Generic over the byte-level [`Transport`] and the ISR-fed [`Countdowns`]
/// collaborator. Construct it, call [`power_on`](Nina::power_on), then run
/// [`tick`](Nina::tick) once per control cycle.
pub struct Nina<T, C> {
    transport: T,
    timers: C,
    local_name: String<MAX_NAME_LEN>,
    status: RadioStatus,
    in_data_mode: bool,
    bt_enabled: bool,
    wifi_enabled: bool,
    init_requested: bool,
    outcome: CommandOutcome,
    boot: BootSequencer,
    queue: CommandQueue,
    mode: ModeSwitch,
    message: MessageTransmitter,
}

impl<T, C> Nina<T, C>
where
    T: Transport,
    C: Countdowns,
{
    /// Creates a new driver advertising `local_name` over Bluetooth.
    pub fn new(transport: T, timers: C, local_name: String<MAX_NAME_LEN>) -> Self {
        Self {
            transport,
            timers,
            local_name,
            status: RadioStatus::Uninitialized,
            in_data_mode: false,
            bt_enabled: false,
            // The module powers up with its station interface available.
            wifi_enabled: true,
            init_requested: false,
            outcome: CommandOutcome::Pending,
            boot: BootSequencer::new(),
            queue: CommandQueue::new(),
            mode: ModeSwitch::new(),
            message: MessageTransmitter::new(),
        }
    }

    /// Releases the wrapped transport and timers.
    pub fn release(self) -> (T, C) {
        (self.transport, self.timers)
    }

    /// Powers the module and arms the boot window.
    pub fn power_on(&mut self) {
        self.transport.power_on();
        self.boot.restart(&self.timers);
    }

    /// Cuts power and restores every flag to its power-on-reset default.
    pub fn power_off(&mut self) {
        self.transport.power_off();
        self.bt_enabled = false;
        self.wifi_enabled = true;
        self.init_requested = false;
        self.outcome = CommandOutcome::Pending;
        // Module default after a power cycle is command mode.
        self.in_data_mode = false;
        self.boot.reset();
        self.queue.reset();
        self.mode.reset();
        self.message.reset();
        self.timers.clear(TimerId::Boot);
        self.timers.clear(TimerId::Command);
        self.timers.clear(TimerId::SwitchHold);
        self.timers.clear(TimerId::SwitchResponse);
    }

    /// Advances whichever sub-machine is due this control cycle.
    ///
    /// Call at a fixed cadence from the host's periodic tick source.
    /// Returns `Err` exactly once, when boot retries are exhausted; after
    /// that the driver stays in [`RadioStatus::Error`] and every further
    /// tick is a no-op.
    pub fn tick(&mut self) -> Result<(), FatalError> {
        if self.status == RadioStatus::Error {
            return Ok(());
        }

        // Until the module has booted nothing else may run.
        if !self.boot.is_booted() {
            return match self.boot.drive(&mut self.transport, &self.timers) {
                BootEvent::Fatal => {
                    self.status = RadioStatus::Error;
                    Err(FatalError::BootAttemptsExhausted)
                }
                BootEvent::Booted => {
                    self.status = RadioStatus::BtInitialized;
                    Ok(())
                }
                BootEvent::None => Ok(()),
            };
        }

        if self.timers.get(TimerId::Command) == 1 {
            self.timers.clear(TimerId::Command);
            self.outcome = CommandOutcome::TimedOut;
        }

        // With no peer connected the mode indicator line is authoritative
        // (datasheet: the line is unambiguous exactly when disconnected).
        if !self.transport.is_peer_connected() {
            self.in_data_mode = self.transport.indicates_data_mode();
        }

        if !self.in_data_mode || self.mode.is_active() {
            match commands::classify_response(&self.transport) {
                ResponseKind::Ok => self.outcome = CommandOutcome::Ok,
                ResponseKind::Error => self.outcome = CommandOutcome::Error,
                // Peer tracking is not implemented; the connection status
                // line already tells the driver what it needs.
                ResponseKind::PeerConnected
                | ResponseKind::PeerDisconnected
                | ResponseKind::None => {}
            }
        } else if self.message.is_transmitting() && self.transport.is_peer_connected() {
            self.message.transmit_pending(&mut self.transport);
        }

        if self.mode.is_active() {
            self.drive_mode_switch();
        } else if self.queue.is_active() {
            self.drive_queue();
        } else if self.status == RadioStatus::Uninitialized && !self.init_requested {
            self.request_init();
        } else if !self.in_data_mode {
            // Idle default: transparent data mode.
            self.request_data_mode();
        }
        Ok(())
    }

    /* ----------------------------- features ----------------------------- */

    /// Queues the Bluetooth enable batch: connectable, generally
    /// discoverable, pairable, BLE off, role policy don't-care, and the
    /// advertised local name.
    ///
    /// Returns immediately; completion is observed via
    /// [`is_bluetooth_enabled`](Nina::is_bluetooth_enabled).
    pub fn enable_bluetooth(&mut self) -> Result<(), Error> {
        if self.bt_enabled {
            return Ok(());
        }
        let set_name = commands::set_local_name(&self.local_name);
        self.run_batch(
            &[
                commands::CONNECTABLE_ON,
                commands::DISCOVERABLE_GENERAL,
                commands::PAIRABLE_ON,
                commands::LOW_ENERGY_OFF,
                commands::ROLE_POLICY_ANY,
                set_name.as_str(),
            ],
            BatchCompletion::BtEnabled,
        )
    }

    /// Queues the Bluetooth disable batch: disconnect the peer, then turn
    /// off connectability and discoverability.
    pub fn disable_bluetooth(&mut self) -> Result<(), Error> {
        if !self.bt_enabled {
            return Ok(());
        }
        self.run_batch(
            &[
                commands::DISCONNECT_FIRST_PEER,
                commands::CONNECTABLE_OFF,
                commands::DISCOVERABLE_OFF,
            ],
            BatchCompletion::BtDisabled,
        )
    }

    /// Deactivates the WiFi station interface.
    pub fn disable_wifi(&mut self) -> Result<(), Error> {
        if !self.wifi_enabled {
            return Ok(());
        }
        self.run_batch(
            &[commands::WIFI_STATION_DEACTIVATE],
            BatchCompletion::WifiDisabled,
        )
    }

    /// Queues `payload` for transmission to the connected peer.
    ///
    /// Returns immediately; the driver switches to data mode if needed and
    /// transmits on a later tick. Poll
    /// [`last_transmission_ok`](Nina::last_transmission_ok) for completion.
    /// `override_in_flight` lets important payloads displace one that is
    /// still pending.
    pub fn send_message(&mut self, payload: &str, override_in_flight: bool) -> Result<(), Error> {
        let initialized = self.status == RadioStatus::BtInitialized;
        self.message.submit(payload, override_in_flight, initialized)?;
        self.request_data_mode();
        Ok(())
    }

    /// Relays `bytes` to the peer immediately, bypassing the pending
    /// message slot. Dropped unless a peer is connected and the module is
    /// in data mode.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        if self.in_data_mode && self.transport.is_peer_connected() {
            self.transport.send(bytes);
        }
    }

    /// Moves data received from the peer into `buf`, returning the byte
    /// count.
    pub fn read_received(&mut self, buf: &mut [u8]) -> usize {
        self.transport.drain_receive_buffer(buf)
    }

    /* ------------------------------ queries ------------------------------ */

    pub fn status(&self) -> RadioStatus {
        self.status
    }

    pub fn operating_mode(&self) -> OperatingMode {
        if self.in_data_mode {
            OperatingMode::Data
        } else {
            OperatingMode::Command
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.status == RadioStatus::BtInitialized
    }

    pub fn is_booted(&self) -> bool {
        self.boot.is_booted()
    }

    pub fn is_bluetooth_enabled(&self) -> bool {
        self.bt_enabled
    }

    pub fn is_transmitting(&self) -> bool {
        self.message.is_transmitting()
    }

    pub fn last_transmission_ok(&self) -> bool {
        self.message.last_transmission_ok()
    }

    pub fn is_peer_connected(&mut self) -> bool {
        self.transport.is_peer_connected()
    }

    pub fn is_powered(&self) -> bool {
        self.transport.is_powered()
    }

    /* ----------------------------- internals ----------------------------- */

    fn run_batch(&mut self, batch: &[&str], completion: BatchCompletion) -> Result<(), Error> {
        self.queue.prepare(batch, completion);
        if self.queue.has_errored() {
            return Err(Error::InvalidRequest);
        }
        // Dispatch the first command right away instead of waiting a tick.
        self.drive_queue();
        Ok(())
    }

    fn drive_queue(&mut self) {
        let event = self.queue.drive(
            &mut self.transport,
            &self.timers,
            &mut self.outcome,
            self.in_data_mode,
            self.boot.is_booted(),
        );
        match event {
            QueueEvent::Idle => {}
            QueueEvent::Completed(completion) => {
                self.request_data_mode();
                self.apply_completion(completion);
            }
            QueueEvent::Aborted => self.request_data_mode(),
            QueueEvent::WrongMode => self.request_command_mode(),
        }
    }

    fn drive_mode_switch(&mut self) {
        let event = self.mode.drive(
            &mut self.transport,
            &self.timers,
            &mut self.in_data_mode,
            &mut self.outcome,
            self.boot.is_booted(),
        );
        if event == SwitchEvent::EnteredCommandMode && self.queue.is_active() {
            // The switch interrupted a batch; pick it back up.
            self.drive_queue();
        }
    }

    fn apply_completion(&mut self, completion: BatchCompletion) {
        match completion {
            BatchCompletion::None => {}
            BatchCompletion::FinishInit => self.status = RadioStatus::BtInitialized,
            BatchCompletion::BtEnabled => self.bt_enabled = true,
            BatchCompletion::BtDisabled => self.bt_enabled = false,
            BatchCompletion::WifiDisabled => self.wifi_enabled = false,
        }
    }

    fn request_init(&mut self) {
        self.init_requested = true;
        let set_name = commands::set_local_name(&self.local_name);
        // The init batch is well inside capacity, so this cannot fail.
        let _ = self.run_batch(&[set_name.as_str()], BatchCompletion::FinishInit);
    }

    fn request_data_mode(&mut self) {
        // Data mode is meaningless without a peer on the other end.
        if !self.in_data_mode && self.transport.is_peer_connected() {
            self.mode.request(OperatingMode::Data);
        }
    }

    fn request_command_mode(&mut self) {
        if self.in_data_mode {
            self.mode.request(OperatingMode::Command);
        }
    }
}
