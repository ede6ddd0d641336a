use crate::lcd::hd44780::driver::*;
use crate::{BackpackResult, I2cBus, ThreadDelay};
use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};
use std::fmt;
use std::fmt::Debug;

/// Minimum time after power rises above 2.7 V before the controller accepts commands is 40 ms.
/// The host usually boots well before the supply settles, so wait a little longer.
const POWER_ON_DELAY_MS: u32 = 50;
/// Busy period of the clear and return home commands.
const SLOW_COMMAND_DELAY_US: u32 = 2000;

/// Control byte prefix marking the following byte as display data (RS = 1).
const CONTROL_DATA: u8 = 0b01000000;
/// Control byte prefix marking the following byte as a controller command (RS = 0).
const CONTROL_COMMAND: u8 = 0b00000000;

/// Driver for an HD44780 controller behind an I²C backpack.
///
/// Every command or data byte travels as one bus transaction of two bytes: a control byte with
/// bit 6 telling the backpack whether to raise RS, followed by the raw HD44780 byte.
///
/// The controller registers are write-only from here, so the driver keeps mirrors of the
/// function set, display control and entry mode registers, and always re-sends the whole
/// register after changing a bit.
///
/// # Lifecycle
///
/// Construction only binds the bus and address, and starts the bus up. The display itself is
/// brought up by [DisplayController::configure], which has to be called separately once the bus
/// is usable. Note that resetting the host does not reset the display, so no state is assumed
/// until `configure` runs.
///
/// The register setters of [HD44780Driver] are callable on the controller too, but like
/// [DisplayController::send_raw_command] they go around the mirrors. Use the methods of the
/// controller itself to keep the mirrors in sync with the device.
#[derive(Debug)]
pub struct DisplayController<B: I2cBus, D: DelayNs = ThreadDelay> {
    bus: B,
    delay: D,
    address: u8,

    function_flags: u8,
    control_flags: u8,
    entry_mode_flags: u8,

    row_offsets: [u8; 4],
    lines: u8,
}

impl<B: I2cBus + Default> DisplayController<B, ThreadDelay> {
    /// Creates a driver on the default bus instance of `B`.
    ///
    /// `address` is the 7-bit I²C address of the backpack. `B::default()` must hand out a handle
    /// to the one process-wide default bus, not open a new bus, since every controller created
    /// this way calls it.
    pub fn new(address: u8) -> Self {
        Self::with_bus(B::default(), address)
    }
}

impl<B: I2cBus> DisplayController<B, ThreadDelay> {
    /// Creates a driver on the given bus instance, for hosts with more than one I²C port.
    pub fn with_bus(bus: B, address: u8) -> Self {
        Self::with_bus_and_delay(bus, ThreadDelay, address)
    }
}

impl<B: I2cBus, D: DelayNs + Debug> DisplayController<B, D> {
    /// Creates a driver on the given bus instance, using a custom delay provider.
    pub fn with_bus_and_delay(mut bus: B, delay: D, address: u8) -> Self {
        bus.start_up();

        DisplayController {
            bus,
            delay,
            address,
            function_flags: FontSize::Dots5x8.to_mask(),
            control_flags: 0,
            entry_mode_flags: 0,
            row_offsets: Self::compute_row_offsets(16),
            lines: 1,
        }
    }

    fn compute_row_offsets(columns: u8) -> [u8; 4] {
        // The second line always starts at 0x40. Lines 3 and 4 continue lines 1 and 2.
        [0x00, 0x40, columns, 0x40u8.wrapping_add(columns)]
    }

    /// Brings the display up. Has to be called at least once before using the display.
    ///
    /// Reprograms the function set, display control and entry mode registers from scratch, so
    /// calling it again with other parameters is fine. `columns` is only used for the row offsets
    /// of lines 3 and 4. The 5x10 font is only selected for single-line displays.
    ///
    /// Leaves the display on, cleared, with the cursor hidden and text flowing left to right.
    pub fn configure(&mut self, columns: u8, lines: u8, font: FontSize) -> BackpackResult<()> {
        debug!("Configuring display at {:#04x}: {}x{}, {:?}", self.address, columns, lines, font);

        let mut function_flags = 0;
        if lines > 1 {
            function_flags |= TWO_LINE;
            if font != FontSize::Dots5x8 {
                warn!("{:?} font is only available on single-line displays, ignoring", font);
            }
        } else {
            function_flags |= font.to_mask();
        }

        self.delay.delay_ms(POWER_ON_DELAY_MS);

        // Mirrors only change once the device has taken the matching command.
        self.function_set(function_flags)?;
        self.function_flags = function_flags;
        self.lines = lines;
        self.row_offsets = Self::compute_row_offsets(columns);

        self.set_display_control(DISPLAY_ON)?;
        self.control_flags = DISPLAY_ON;

        self.clear()?;

        let entry_mode_flags = TextDirection::LeftToRight.to_mask();
        self.set_entry_mode(entry_mode_flags)?;
        self.entry_mode_flags = entry_mode_flags;

        debug!("Display at {:#04x} configured", self.address);
        Ok(())
    }

    /// Clears the display and moves the cursor home. Blocks for the command's busy period.
    pub fn clear(&mut self) -> BackpackResult<()> {
        self.clear_display()?;
        self.delay.delay_us(SLOW_COMMAND_DELAY_US);
        Ok(())
    }

    /// Moves the cursor home and undoes display shifts. Blocks for the command's busy period.
    pub fn home(&mut self) -> BackpackResult<()> {
        self.return_home()?;
        self.delay.delay_us(SLOW_COMMAND_DELAY_US);
        Ok(())
    }

    /// Moves the cursor to the given cell.
    ///
    /// Rows past the configured line count are pulled back to the last line. The column is not
    /// checked against the display width.
    pub fn set_cursor(&mut self, column: u8, row: u8) -> BackpackResult<()> {
        let last_row = (self.row_offsets.len() as u8 - 1).min(self.lines.saturating_sub(1));
        let row = if row > last_row {
            warn!("Row {} out of range, using row {}", row, last_row);
            last_row
        } else {
            row
        };

        let address = column.wrapping_add(self.row_offsets[row as usize]);
        self.set_ddram_address(address)
    }

    /// Overrides the DDRAM base addresses of the four rows, e.g. for 16x4 modules.
    ///
    /// Reset by the next [Self::configure].
    pub fn set_row_offsets(&mut self, row_offsets: [u8; 4]) {
        self.row_offsets = row_offsets;
    }

    fn with_flag(flags: u8, flag: u8, on: bool) -> u8 {
        if on { flags | flag } else { flags & !flag }
    }

    fn update_display_control(&mut self, flag: u8, on: bool) -> BackpackResult<()> {
        let control_flags = Self::with_flag(self.control_flags, flag, on);
        self.set_display_control(control_flags)?;
        self.control_flags = control_flags;
        Ok(())
    }

    fn update_entry_mode(&mut self, flag: u8, on: bool) -> BackpackResult<()> {
        let entry_mode_flags = Self::with_flag(self.entry_mode_flags, flag, on);
        self.set_entry_mode(entry_mode_flags)?;
        self.entry_mode_flags = entry_mode_flags;
        Ok(())
    }

    /// Turns the display on. DDRAM content is kept while off.
    pub fn display_on(&mut self) -> BackpackResult<()> {
        self.update_display_control(DISPLAY_ON, true)
    }

    pub fn display_off(&mut self) -> BackpackResult<()> {
        self.update_display_control(DISPLAY_ON, false)
    }

    /// Shows the underline cursor.
    pub fn cursor_on(&mut self) -> BackpackResult<()> {
        self.update_display_control(CURSOR_ON, true)
    }

    pub fn cursor_off(&mut self) -> BackpackResult<()> {
        self.update_display_control(CURSOR_ON, false)
    }

    /// Turns on the blinking block cursor.
    pub fn blink_on(&mut self) -> BackpackResult<()> {
        self.update_display_control(BLINK_ON, true)
    }

    pub fn blink_off(&mut self) -> BackpackResult<()> {
        self.update_display_control(BLINK_ON, false)
    }

    /// Shifts the whole display one cell to the left, without changing DDRAM.
    pub fn scroll_left(&mut self) -> BackpackResult<()> {
        self.cursor_shift(true, ShiftDirection::Left)
    }

    /// Shifts the whole display one cell to the right, without changing DDRAM.
    pub fn scroll_right(&mut self) -> BackpackResult<()> {
        self.cursor_shift(true, ShiftDirection::Right)
    }

    /// Sets which way the cursor moves after each written character.
    pub fn set_text_direction(&mut self, direction: TextDirection) -> BackpackResult<()> {
        self.update_entry_mode(ENTRY_LEFT, direction == TextDirection::LeftToRight)
    }

    /// Turns shifting the display on every write on or off.
    ///
    /// With autoscroll on, text appears "right justified" to the cursor.
    pub fn set_autoscroll(&mut self, on: bool) -> BackpackResult<()> {
        self.update_entry_mode(ENTRY_SHIFT_INCREMENT, on)
    }

    pub fn left_to_right(&mut self) -> BackpackResult<()> {
        self.set_text_direction(TextDirection::LeftToRight)
    }

    pub fn right_to_left(&mut self) -> BackpackResult<()> {
        self.set_text_direction(TextDirection::RightToLeft)
    }

    pub fn autoscroll(&mut self) -> BackpackResult<()> {
        self.set_autoscroll(true)
    }

    pub fn no_autoscroll(&mut self) -> BackpackResult<()> {
        self.set_autoscroll(false)
    }

    /// Defines one of the 8 custom characters.
    ///
    /// Only the low 3 bits of `slot` are used. Each glyph row uses its low 5 bits, top row first.
    /// Leaves the controller addressing CGRAM, so move the cursor before writing text again.
    pub fn create_char(&mut self, slot: u8, glyph: &[u8; 8]) -> BackpackResult<()> {
        let wrapped = slot & 0b111;
        if wrapped != slot {
            warn!("Custom character slot {} out of range, using slot {}", slot, wrapped);
        }

        self.set_cgram_address(wrapped << 3)?;
        for &row in glyph {
            self.write(row)?;
        }
        Ok(())
    }

    /// Writes one byte at the current address: a character code, or a glyph row after
    /// [Self::create_char]. Always reports one byte written.
    pub fn write(&mut self, byte: u8) -> BackpackResult<usize> {
        self.send_data(byte)?;
        Ok(1)
    }

    /// Writes a string at the cursor. Characters outside ASCII are replaced with `?`.
    ///
    /// Returns the number of bytes written.
    pub fn print(&mut self, s: &str) -> BackpackResult<usize> {
        let mut written = 0;
        for c in s.chars() {
            if c.is_ascii() {
                written += self.write(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                written += self.write(b'?')?;
            }
        }
        Ok(written)
    }

    /// Sends an arbitrary command byte, bypassing the register mirrors.
    pub fn send_raw_command(&mut self, command: u8) -> BackpackResult<()> {
        self.send_command(command)
    }

    fn send(&mut self, value: u8, is_data: bool) -> BackpackResult<()> {
        trace!("Sending data: {:08b}, RS: {}", value, is_data);

        let control = if is_data { CONTROL_DATA } else { CONTROL_COMMAND };

        self.bus.begin_transmission(self.address)?;
        // Close the transaction even if a write failed, so the bus stays usable.
        let written = self.bus.write_bytes(&[control, value]);
        let ended = self.bus.end_transmission();
        written.and(ended)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn lines(&self) -> u8 {
        self.lines
    }

    pub fn row_offsets(&self) -> [u8; 4] {
        self.row_offsets
    }

    /// Mirror of the function set register, without the command bits.
    pub fn function_flags(&self) -> u8 {
        self.function_flags
    }

    /// Mirror of the display control register, without the command bits.
    pub fn control_flags(&self) -> u8 {
        self.control_flags
    }

    /// Mirror of the entry mode register, without the command bits.
    pub fn entry_mode_flags(&self) -> u8 {
        self.entry_mode_flags
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

impl<B: I2cBus, D: DelayNs + Debug> HD44780Driver for DisplayController<B, D> {
    fn send_command(&mut self, command: u8) -> BackpackResult<()> {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) -> BackpackResult<()> {
        self.send(data, true)
    }
}

impl<B: I2cBus, D: DelayNs + Debug> fmt::Write for DisplayController<B, D> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BackpackError;

    #[derive(Debug, Default)]
    struct ByteBus {
        transactions: Vec<(u8, Vec<u8>)>,
        open: Option<(u8, Vec<u8>)>,
        started: bool,
    }

    impl I2cBus for ByteBus {
        fn start_up(&mut self) {
            self.started = true;
        }

        fn begin_transmission(&mut self, address: u8) -> BackpackResult<()> {
            self.open = Some((address, Vec::new()));
            Ok(())
        }

        fn write_byte(&mut self, byte: u8) -> BackpackResult<()> {
            let (_, bytes) = self.open.as_mut().ok_or(BackpackError::NoTransaction)?;
            bytes.push(byte);
            Ok(())
        }

        fn end_transmission(&mut self) -> BackpackResult<()> {
            let transaction = self.open.take().ok_or(BackpackError::NoTransaction)?;
            self.transactions.push(transaction);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn controller() -> DisplayController<ByteBus, NoDelay> {
        DisplayController::with_bus_and_delay(ByteBus::default(), NoDelay, 0x27)
    }

    #[test]
    fn construction_starts_bus_without_device_io() {
        let lcd = controller();
        assert!(lcd.bus().started);
        assert!(lcd.bus().transactions.is_empty());
        assert_eq!(lcd.function_flags(), 0);
        assert_eq!(lcd.lines(), 1);
    }

    #[test]
    fn data_and_command_differ_only_in_bit_6() {
        let mut lcd = controller();
        lcd.send_command(0xA5).unwrap();
        lcd.send_data(0xA5).unwrap();

        let transactions = &lcd.bus().transactions;
        assert_eq!(transactions[0], (0x27, vec![0x00, 0xA5]));
        assert_eq!(transactions[1], (0x27, vec![0x40, 0xA5]));
        assert_eq!(transactions[0].1[0] ^ transactions[1].1[0], 0b01000000);
    }

    #[test]
    fn row_offsets_follow_column_count() {
        assert_eq!(
            DisplayController::<ByteBus, NoDelay>::compute_row_offsets(20),
            [0x00, 0x40, 0x14, 0x54]
        );
        assert_eq!(
            DisplayController::<ByteBus, NoDelay>::compute_row_offsets(16),
            [0x00, 0x40, 0x10, 0x50]
        );
    }

    #[test]
    fn fmt_write_prints_text() {
        use std::fmt::Write;

        let mut lcd = controller();
        write!(lcd, "{}", 42).unwrap();

        let payloads: Vec<_> = lcd.bus().transactions.iter().map(|(_, b)| b.clone()).collect();
        assert_eq!(payloads, vec![vec![0x40, b'4'], vec![0x40, b'2']]);
    }
}
