//! Outbound message transmitter.
//!
//! One payload slot, filled by the application and flushed by the tick
//! dispatcher once the module sits in data mode with a peer connected.
//! Completion is observed through the status queries, not a callback.

use heapless::String;

use crate::error::Error;
use crate::transport::Transport;

/// Longest message accepted by [`Nina::send_message`](crate::Nina::send_message).
pub const MAX_MESSAGE_LEN: usize = 128;

pub(crate) struct MessageTransmitter {
    payload: String<MAX_MESSAGE_LEN>,
    transmitting: bool,
    last_ok: bool,
}

impl MessageTransmitter {
    pub(crate) const fn new() -> Self {
        Self {
            payload: String::new(),
            transmitting: false,
            last_ok: false,
        }
    }

    pub(crate) fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    pub(crate) fn last_transmission_ok(&self) -> bool {
        self.last_ok
    }

    pub(crate) fn reset(&mut self) {
        self.payload.clear();
        self.transmitting = false;
        self.last_ok = false;
    }

    /// Stages `payload` for transmission on a later tick.
    ///
    /// Oversized payloads are rejected, never truncated.
    pub(crate) fn submit(
        &mut self,
        payload: &str,
        override_in_flight: bool,
        initialized: bool,
    ) -> Result<(), Error> {
        if !initialized {
            self.transmitting = false;
            return Err(Error::NotInitialized);
        }
        if self.transmitting && !override_in_flight {
            return Err(Error::Busy);
        }
        let mut staged: String<MAX_MESSAGE_LEN> = String::new();
        if staged.push_str(payload).is_err() {
            return Err(Error::MessageTooLong);
        }
        self.payload = staged;
        self.last_ok = false;
        self.transmitting = true;
        Ok(())
    }

    /// Relays the staged payload to the peer.
    ///
    /// The caller must have verified the module is in data mode with a
    /// peer connected.
    pub(crate) fn transmit_pending<T: Transport>(&mut self, transport: &mut T) {
        transport.send(self.payload.as_bytes());
        self.last_ok = true;
        self.transmitting = false;
        self.payload.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::FakeTransport;
    use super::*;

    #[test]
    fn submit_requires_initialization() {
        let mut message = MessageTransmitter::new();
        assert_eq!(
            message.submit("hello", false, false),
            Err(Error::NotInitialized)
        );
        assert!(!message.is_transmitting());
    }

    #[test]
    fn overlapping_submit_needs_override() {
        let mut message = MessageTransmitter::new();
        message.submit("first", false, true).unwrap();
        assert_eq!(message.submit("second", false, true), Err(Error::Busy));

        message.submit("urgent", true, true).unwrap();
        let mut transport = FakeTransport::new();
        message.transmit_pending(&mut transport);
        assert_eq!(transport.sent, ["urgent"]);
    }

    #[test]
    fn oversized_payload_is_rejected_intact() {
        let mut message = MessageTransmitter::new();
        message.submit("keep", false, true).unwrap();

        let too_long: std::string::String =
            core::iter::repeat('x').take(MAX_MESSAGE_LEN + 1).collect();
        assert_eq!(
            message.submit(&too_long, true, true),
            Err(Error::MessageTooLong)
        );

        // The staged payload survives the rejected request.
        let mut transport = FakeTransport::new();
        message.transmit_pending(&mut transport);
        assert_eq!(transport.sent, ["keep"]);
    }

    #[test]
    fn transmit_latches_success_and_clears_slot() {
        let mut message = MessageTransmitter::new();
        message.submit("hello", false, true).unwrap();
        assert!(message.is_transmitting());
        assert!(!message.last_transmission_ok());

        let mut transport = FakeTransport::new();
        message.transmit_pending(&mut transport);
        assert!(!message.is_transmitting());
        assert!(message.last_transmission_ok());
        assert_eq!(transport.sent, ["hello"]);
    }
}
