pub mod lcd;

use embedded_hal::delay::DelayNs;
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum BackpackError {
    #[error("no acknowledge from device at address {address:#04x}")]
    Nack { address: u8 },
    #[error("write outside of a bus transaction")]
    NoTransaction,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackpackError {
    fn from(err: std::io::Error) -> Self {
        BackpackError::Io(err.kind())
    }
}

pub type BackpackResult<T> = Result<T, BackpackError>;

/// A two-wire (I²C) bus master, as seen by the display driver.
///
/// The driver never implements the transport itself. Framing, clock stretching and arbitration are
/// the implementor's business. A transport that cannot detect failures should simply return `Ok(())`
/// from every method; the physical display has no way to acknowledge a command anyway.
pub trait I2cBus: Debug {
    /// Brings the bus peripheral up. Called once, from the driver constructor.
    fn start_up(&mut self);

    /// Starts a transaction addressed to the given 7-bit peer address.
    fn begin_transmission(&mut self, address: u8) -> BackpackResult<()>;

    /// Queues a single byte in the current transaction.
    fn write_byte(&mut self, byte: u8) -> BackpackResult<()>;

    /// Queues several bytes in the current transaction.
    fn write_bytes(&mut self, bytes: &[u8]) -> BackpackResult<()> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Ends the current transaction, putting it on the wire.
    fn end_transmission(&mut self) -> BackpackResult<()>;
}

/// [DelayNs] implementation using [std::thread::sleep].
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}
