//! Byte-level transport to the module.
//!
//! Everything below command granularity lives behind the [`Transport`]
//! trait: UART bytes, the receive buffer, power sequencing and the
//! dedicated GPIO lines. [`UartTransport`] is the stock implementation over
//! `embedded-io` and `embedded-hal`; hosts with unusual wiring can
//! implement the trait directly.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::Write;
use heapless::Vec;

/// Capacity of the receive buffer in [`UartTransport`].
pub const RX_BUFFER_LEN: usize = 256;

/// Hardware access consumed by the driver.
pub trait Transport {
    /// Transmits `bytes` synchronously, returning once the hardware has
    /// accepted the last byte. Keep payloads short; this blocks the
    /// caller.
    fn send(&mut self, bytes: &[u8]);

    /// Non-destructive substring probe over the receive buffer.
    fn scan_receive_buffer(&self, delimiter: &str) -> bool;

    /// Moves buffered receive data into `buf` and resets the buffer.
    /// Returns the number of bytes copied.
    fn drain_receive_buffer(&mut self, buf: &mut [u8]) -> usize;

    /// Discards all buffered receive data.
    fn reset_receive_buffer(&mut self);

    fn power_on(&mut self);
    fn power_off(&mut self);
    fn is_powered(&self) -> bool;

    /// Pulses the module reset line low for its minimum pulse width.
    fn pulse_reset(&mut self);

    /// Drives the GPIO line that asks the module to enter command mode.
    fn set_mode_request(&mut self, asserted: bool);

    /// Level of the module's connection status line.
    fn is_peer_connected(&mut self) -> bool;

    /// Level of the module's mode indicator line. Authoritative only while
    /// no peer is connected.
    fn indicates_data_mode(&mut self) -> bool;
}

/// Stock [`Transport`] over a UART writer and discrete GPIO lines.
///
/// The receive side is fed by the host: collect incoming bytes in the UART
/// receive interrupt and hand them over with
/// [`push_received`](UartTransport::push_received) from the main context
/// before running the driver tick. Bytes beyond [`RX_BUFFER_LEN`] are
/// dropped.
///
/// Pin polarities follow the reference wiring: the power line is
/// active-low (low = supply on), reset is active-low, the mode request
/// line is asserted high.
pub struct UartTransport<W, RST, PWR, DSR, CONN, LED, D> {
    uart: W,
    reset: RST,
    power: PWR,
    mode_request: DSR,
    peer_status: CONN,
    mode_status: LED,
    delay: D,
    rx: Vec<u8, RX_BUFFER_LEN>,
    powered: bool,
}

impl<W, RST, PWR, DSR, CONN, LED, D> UartTransport<W, RST, PWR, DSR, CONN, LED, D>
where
    W: Write,
    RST: OutputPin,
    PWR: OutputPin,
    DSR: OutputPin,
    CONN: InputPin,
    LED: InputPin,
    D: DelayNs,
{
    pub fn new(
        uart: W,
        reset: RST,
        power: PWR,
        mode_request: DSR,
        peer_status: CONN,
        mode_status: LED,
        delay: D,
    ) -> Self {
        Self {
            uart,
            reset,
            power,
            mode_request,
            peer_status,
            mode_status,
            delay,
            rx: Vec::new(),
            powered: false,
        }
    }

    /// Appends bytes collected by the receive interrupt.
    pub fn push_received(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let _ = self.rx.push(byte);
        }
    }

    /// Releases the wrapped UART writer and pins.
    pub fn release(self) -> (W, RST, PWR, DSR, CONN, LED, D) {
        (
            self.uart,
            self.reset,
            self.power,
            self.mode_request,
            self.peer_status,
            self.mode_status,
            self.delay,
        )
    }
}

impl<W, RST, PWR, DSR, CONN, LED, D> Transport for UartTransport<W, RST, PWR, DSR, CONN, LED, D>
where
    W: Write,
    RST: OutputPin,
    PWR: OutputPin,
    DSR: OutputPin,
    CONN: InputPin,
    LED: InputPin,
    D: DelayNs,
{
    fn send(&mut self, bytes: &[u8]) {
        if !self.powered {
            return;
        }
        // A UART write failure leaves the command unanswered; the
        // per-command timeout turns that into a retry.
        if self.uart.write_all(bytes).is_ok() {
            let _ = self.uart.flush();
        }
    }

    fn scan_receive_buffer(&self, delimiter: &str) -> bool {
        let needle = delimiter.as_bytes();
        if needle.is_empty() || needle.len() > self.rx.len() {
            return false;
        }
        self.rx.windows(needle.len()).any(|window| window == needle)
    }

    fn drain_receive_buffer(&mut self, buf: &mut [u8]) -> usize {
        let count = self.rx.len().min(buf.len());
        buf[..count].copy_from_slice(&self.rx[..count]);
        self.rx.clear();
        count
    }

    fn reset_receive_buffer(&mut self) {
        self.rx.clear();
    }

    fn power_on(&mut self) {
        let _ = self.power.set_low();
        self.delay.delay_ms(1);
        let _ = self.reset.set_high();
        self.powered = true;
    }

    fn power_off(&mut self) {
        let _ = self.reset.set_low();
        self.delay.delay_ms(1);
        let _ = self.power.set_high();
        self.powered = false;
        self.rx.clear();
    }

    fn is_powered(&self) -> bool {
        self.powered
    }

    fn pulse_reset(&mut self) {
        let _ = self.reset.set_low();
        self.delay.delay_ms(1);
        let _ = self.reset.set_high();
    }

    fn set_mode_request(&mut self, asserted: bool) {
        if asserted {
            let _ = self.mode_request.set_high();
        } else {
            let _ = self.mode_request.set_low();
        }
    }

    fn is_peer_connected(&mut self) -> bool {
        self.peer_status.is_high().unwrap_or(false)
    }

    fn indicates_data_mode(&mut self) -> bool {
        self.mode_status.is_high().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;

    #[derive(Default)]
    struct LoggedUart {
        written: std::vec::Vec<u8>,
    }

    impl embedded_io::ErrorType for LoggedUart {
        type Error = Infallible;
    }

    impl Write for LoggedUart {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.high)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    type TestTransport =
        UartTransport<LoggedUart, FakePin, FakePin, FakePin, FakePin, FakePin, NoDelay>;

    fn transport() -> TestTransport {
        UartTransport::new(
            LoggedUart::default(),
            FakePin::default(),
            FakePin::default(),
            FakePin::default(),
            FakePin::default(),
            FakePin::default(),
            NoDelay,
        )
    }

    #[test]
    fn send_requires_power() {
        let mut t = transport();
        t.send(b"AT\r\n");
        assert!(t.uart.written.is_empty());

        t.power_on();
        t.send(b"AT\r\n");
        assert_eq!(t.uart.written, b"AT\r\n");
    }

    #[test]
    fn scan_finds_delimiter_without_consuming() {
        let mut t = transport();
        t.push_received(b"AT+UBTCM=2\r\nOK\r\n");
        assert!(t.scan_receive_buffer("OK\r\n"));
        assert!(t.scan_receive_buffer("OK\r\n"));
        assert!(!t.scan_receive_buffer("ERROR\r\n"));
    }

    #[test]
    fn drain_copies_and_clears() {
        let mut t = transport();
        t.push_received(b"hello");
        let mut buf = [0u8; 16];
        assert_eq!(t.drain_receive_buffer(&mut buf), 5);
        assert_eq!(&buf[..5], b"hello");
        assert!(!t.scan_receive_buffer("hello"));
    }

    #[test]
    fn power_sequencing_drives_pins() {
        let mut t = transport();
        t.power_on();
        assert!(t.is_powered());
        assert!(!t.power.high);
        assert!(t.reset.high);

        t.push_received(b"stale");
        t.power_off();
        assert!(!t.is_powered());
        assert!(t.power.high);
        assert!(!t.scan_receive_buffer("stale"));
    }

    #[test]
    fn mode_request_line_follows_assertion() {
        let mut t = transport();
        t.set_mode_request(true);
        assert!(t.mode_request.high);
        t.set_mode_request(false);
        assert!(!t.mode_request.high);
    }
}
