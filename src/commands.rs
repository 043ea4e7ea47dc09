//! Fixed u-connect AT command strings and response delimiters.
//!
//! The driver speaks the AT protocol with hand-authored command strings
//! only; there is no general AT parser. Responses are detected by scanning
//! the receive buffer for the delimiters below, classified once per control
//! cycle by [`classify_response`].

use core::fmt::Write;

use heapless::String;

use crate::transport::Transport;

/// Longest command the queue can hold, terminator included.
pub const MAX_COMMAND_LEN: usize = 48;

/// Longest advertised local name accepted by the module.
pub const MAX_NAME_LEN: usize = 31;

/// Emitted once by the module after a hardware reset.
pub const STARTUP_BANNER: &str = "+STARTUP\r";
/// Final status line of a successful command.
pub const RESPONSE_OK: &str = "OK\r\n";
/// Final status line of a rejected command.
pub const RESPONSE_ERROR: &str = "ERROR\r\n";
/// Unsolicited event: a peer connected.
pub const EVENT_PEER_CONNECTED: &str = "+UUDPC:";
/// Unsolicited event: a peer disconnected.
pub const EVENT_PEER_DISCONNECTED: &str = "+UUDPD:";

/// Leaves command mode and resumes transparent data mode.
pub const RESUME_DATA_MODE: &str = "ATO1\r\n";

pub const CONNECTABLE_ON: &str = "AT+UBTCM=2\r\n";
pub const CONNECTABLE_OFF: &str = "AT+UBTCM=1\r\n";
pub const DISCOVERABLE_GENERAL: &str = "AT+UBTDM=3\r\n";
pub const DISCOVERABLE_OFF: &str = "AT+UBTDM=1\r\n";
pub const PAIRABLE_ON: &str = "AT+UBTPM=2\r\n";
pub const LOW_ENERGY_OFF: &str = "AT+UBTLE=0\r\n";
pub const ROLE_POLICY_ANY: &str = "AT+UBTMSP=1\r\n";
// TODO: query the peer list instead of assuming handle 1.
pub const DISCONNECT_FIRST_PEER: &str = "AT+UDCPC=1\r\n";
pub const WIFI_STATION_DEACTIVATE: &str = "AT+UWSCA=0,4\r\n";

/// Builds the set-local-name command for `name`.
///
/// [`MAX_COMMAND_LEN`] leaves room for the longest permitted name, so the
/// write cannot fail for a name within [`MAX_NAME_LEN`].
pub fn set_local_name(name: &str) -> String<MAX_COMMAND_LEN> {
    let mut command = String::new();
    let _ = write!(command, "AT+UBTLN={}\r\n", name);
    command
}

/// What the receive buffer currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ResponseKind {
    None,
    Ok,
    Error,
    PeerConnected,
    PeerDisconnected,
}

/// Classifies the receive buffer without consuming it.
///
/// An `ERROR` wins over an `OK` so a command rejection is never mistaken
/// for success when both lines sit in the buffer.
pub(crate) fn classify_response<T: Transport>(transport: &T) -> ResponseKind {
    if transport.scan_receive_buffer(RESPONSE_ERROR) {
        ResponseKind::Error
    } else if transport.scan_receive_buffer(RESPONSE_OK) {
        ResponseKind::Ok
    } else if transport.scan_receive_buffer(EVENT_PEER_CONNECTED) {
        ResponseKind::PeerConnected
    } else if transport.scan_receive_buffer(EVENT_PEER_DISCONNECTED) {
        ResponseKind::PeerDisconnected
    } else {
        ResponseKind::None
    }
}
