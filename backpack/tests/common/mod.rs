#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use lcd_backpack::{BackpackError, BackpackResult, I2cBus};
use std::cell::RefCell;
use std::rc::Rc;

/// Something the mocks observed, in the order it happened.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Event {
    StartUp,
    Transaction { address: u8, bytes: Vec<u8> },
    DelayUs(u64),
}

/// Event timeline shared between [MockBus] and [MockDelay].
#[derive(Debug, Default, Clone)]
pub struct Timeline(Rc<RefCell<Vec<Event>>>);

impl Timeline {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Payloads of all transactions, ignoring delays.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Transaction { bytes, .. } => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Second byte of every command transaction.
    pub fn commands(&self) -> Vec<u8> {
        self.payloads()
            .into_iter()
            .filter(|bytes| bytes[0] == 0x00)
            .map(|bytes| bytes[1])
            .collect()
    }
}

/// Bus recording every finished transaction on a [Timeline].
#[derive(Debug, Default)]
pub struct MockBus {
    pub timeline: Timeline,
    open: Option<(u8, Vec<u8>)>,
    /// When set, every transaction to this address fails with a NACK.
    pub nack_address: Option<u8>,
    /// When set, the next written byte fails with a NACK, once.
    pub fail_next_write: bool,
    write_failed: bool,
    pub begins: usize,
    pub ends: usize,
}

impl MockBus {
    pub fn new(timeline: &Timeline) -> Self {
        MockBus {
            timeline: timeline.clone(),
            open: None,
            nack_address: None,
            fail_next_write: false,
            write_failed: false,
            begins: 0,
            ends: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

impl I2cBus for MockBus {
    fn start_up(&mut self) {
        self.timeline.push(Event::StartUp);
    }

    fn begin_transmission(&mut self, address: u8) -> BackpackResult<()> {
        self.begins += 1;
        self.open = Some((address, Vec::new()));
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> BackpackResult<()> {
        let (address, bytes) = self.open.as_mut().ok_or(BackpackError::NoTransaction)?;
        if self.fail_next_write {
            self.fail_next_write = false;
            self.write_failed = true;
            return Err(BackpackError::Nack { address: *address });
        }
        bytes.push(byte);
        Ok(())
    }

    fn end_transmission(&mut self) -> BackpackResult<()> {
        let (address, bytes) = self.open.take().ok_or(BackpackError::NoTransaction)?;
        self.ends += 1;
        if self.write_failed {
            // Nothing reached the device.
            self.write_failed = false;
            return Ok(());
        }
        if self.nack_address == Some(address) {
            return Err(BackpackError::Nack { address });
        }
        self.timeline.push(Event::Transaction { address, bytes });
        Ok(())
    }
}

/// Delay recording the requested duration on a [Timeline] instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub timeline: Timeline,
}

impl MockDelay {
    pub fn new(timeline: &Timeline) -> Self {
        MockDelay {
            timeline: timeline.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.timeline.push(Event::DelayUs((ns as u64).div_ceil(1000)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.timeline.push(Event::DelayUs(ms as u64 * 1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.timeline.push(Event::DelayUs(us as u64));
    }
}

pub fn command(byte: u8) -> Event {
    Event::Transaction {
        address: 0x27,
        bytes: vec![0x00, byte],
    }
}

pub fn data(byte: u8) -> Event {
    Event::Transaction {
        address: 0x27,
        bytes: vec![0x40, byte],
    }
}
