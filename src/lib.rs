#![no_std]
//! u-blox NINA Radio Module Driver
//!
//! This crate drives a UART-attached u-blox NINA Bluetooth/WiFi module
//! using the textual u-connect AT command protocol. It is built for hosts
//! without a multitasking kernel: all progress happens inside a periodic,
//! non-blocking tick function, and every application-facing request stages
//! work and returns immediately.
//!
//! # Features
//! - Boot supervision: startup banner detection with bounded reboot
//!   retries before a fatal escalation
//! - Ordered AT command batches with per-command timeout and retry
//! - The command-mode/data-mode switch protocol, including the timed
//!   GPIO handshake into command mode
//! - Single-slot outbound message relay to the connected peer
//! - Bluetooth enable/disable and WiFi deactivation batches
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: the [`Nina`] driver struct and its tick dispatcher
//!   - Arbitrates boot, mode switching, batch execution and message
//!     transmission over the one shared UART
//!   - Exposes the application-facing surface and status queries
//!
//! - [`transport`]: byte-level hardware access
//!   - The [`Transport`] trait the driver consumes
//!   - [`UartTransport`], a stock implementation over `embedded-io` and
//!     `embedded-hal` pins
//!
//! - [`timers`]: countdown slots decremented by the host's periodic
//!   interrupt, read by the driver through the [`Countdowns`] trait
//!
//! - [`commands`]: the fixed u-connect command strings and response
//!   delimiters
//!
//! # Usage
//! Operation follows a specific sequence:
//!
//! 1. Create a [`Nina`] instance from a transport and a countdown
//!    implementation
//! 2. Call [`Nina::power_on`] to start the module and arm the boot window
//! 3. Call [`Nina::tick`] once per control cycle, and
//!    [`AtomicCountdowns::tick`] from the matching periodic interrupt
//! 4. Once booted, request features ([`Nina::enable_bluetooth`]) or queue
//!    a payload ([`Nina::send_message`]) and poll the status queries
//!
//! # Important Notes
//! - [`Nina::tick`] never blocks; a cycle that cannot make progress
//!   simply returns
//! - Command transmission is synchronous at byte level and must stay
//!   short; everything above command granularity is asynchronous
//! - The mode indicator line is authoritative only while no peer is
//!   connected; the driver overrides its estimate from it accordingly
//! - A fatal boot failure is reported exactly once, after which the
//!   driver latches [`RadioStatus::Error`] and ignores further ticks
//!
//! # Example
//! ```no_run
//! use ublox_nina::{AtomicCountdowns, Nina, Transport};
//!
//! fn control_cycle<T: Transport>(radio: &mut Nina<T, AtomicCountdowns>) {
//!     if let Err(fatal) = radio.tick() {
//!         // Unrecoverable; hand off to the system fault handler.
//!         panic!("radio failed to boot: {:?}", fatal);
//!     }
//!     if radio.is_initialized() && !radio.is_transmitting() {
//!         let _ = radio.send_message("ready\r\n", false);
//!     }
//! }
//! ```

#[cfg(test)]
extern crate std;

pub mod commands;
pub mod device;
pub mod error;
pub mod timers;
pub mod transport;

pub use device::{Nina, OperatingMode, RadioStatus, COMMAND_QUEUE_LEN, MAX_MESSAGE_LEN};
pub use error::{Error, FatalError};
pub use timers::{AtomicCountdowns, Countdowns, TimerId};
pub use transport::{Transport, UartTransport};
