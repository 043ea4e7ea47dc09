//! Error types reported by the driver.
//!
//! Request functions reject bad requests synchronously with [`Error`];
//! everything else is self-correcting inside the state machine (observing
//! the wrong mode triggers a corrective switch, a timed-out command is
//! resent). The single condition the driver cannot work around on its own
//! is surfaced as [`FatalError`].

/// Synchronous rejection of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The radio has not completed Bluetooth initialization yet.
    NotInitialized,
    /// A message transmission is already pending and no override was
    /// requested.
    Busy,
    /// The payload does not fit the outbound message buffer.
    MessageTooLong,
    /// A command batch exceeded the queue capacity.
    InvalidRequest,
}

/// A condition the driver cannot recover from.
///
/// Returned once by [`Nina::tick`](crate::Nina::tick); the driver latches
/// [`RadioStatus::Error`](crate::RadioStatus::Error) and stops processing.
/// The surrounding system is expected to halt or reset the whole device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// The module never produced its startup banner across the maximum
    /// number of reboot attempts.
    BootAttemptsExhausted,
}
