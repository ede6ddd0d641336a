use lcd_backpack::{BackpackError, BackpackResult, I2cBus};
use log::{debug, info};

/// Dry-run bus logging every transaction instead of putting it on a wire.
#[derive(Debug, Default)]
pub struct LogBus {
    open: Option<(u8, Vec<u8>)>,
    transactions: usize,
}

impl LogBus {
    pub fn transactions(&self) -> usize {
        self.transactions
    }
}

impl I2cBus for LogBus {
    fn start_up(&mut self) {
        info!("Log bus started");
    }

    fn begin_transmission(&mut self, address: u8) -> BackpackResult<()> {
        if self.open.is_some() {
            return Err(BackpackError::Other("transaction already open".to_string()));
        }
        self.open = Some((address, Vec::with_capacity(2)));
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> BackpackResult<()> {
        let (_, bytes) = self.open.as_mut().ok_or(BackpackError::NoTransaction)?;
        bytes.push(byte);
        Ok(())
    }

    fn end_transmission(&mut self) -> BackpackResult<()> {
        let (address, bytes) = self.open.take().ok_or(BackpackError::NoTransaction)?;
        debug!("[{:#04x}] {:02x?}", address, bytes);
        self.transactions += 1;
        Ok(())
    }
}
