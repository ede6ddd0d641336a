//! HD44780 command encoding.
//!
//! See [HD44780Driver] for the command set, and [DisplayController] for the I²C backpack
//! implementation, which keeps local mirrors of the write-only controller registers.

mod backpack;

use crate::BackpackResult;
use std::fmt::Debug;
pub use backpack::*;

/// Clear display. Command: `00000001`.
pub const CMD_CLEAR_DISPLAY: u8 = 0b00000001;
/// Return home. Command: `0000001?`.
pub const CMD_RETURN_HOME: u8 = 0b00000010;
/// Entry mode set. Command: `000001IS`.
pub const CMD_ENTRY_MODE_SET: u8 = 0b00000100;
/// Display on/off control. Command: `00001DCB`.
pub const CMD_DISPLAY_CONTROL: u8 = 0b00001000;
/// Cursor or display shift. Command: `0001SR??`.
pub const CMD_CURSOR_SHIFT: u8 = 0b00010000;
/// Function set. Command: `001DNF??`.
pub const CMD_FUNCTION_SET: u8 = 0b00100000;
/// Set CGRAM address. Command: `01AAAAAA`.
pub const CMD_SET_CGRAM_ADDRESS: u8 = 0b01000000;
/// Set DDRAM address. Command: `1AAAAAAA`.
pub const CMD_SET_DDRAM_ADDRESS: u8 = 0b10000000;

// Entry mode flags
pub const ENTRY_LEFT: u8 = 0b00000010;
pub const ENTRY_SHIFT_INCREMENT: u8 = 0b00000001;

// Display control flags
pub const DISPLAY_ON: u8 = 0b00000100;
pub const CURSOR_ON: u8 = 0b00000010;
pub const BLINK_ON: u8 = 0b00000001;

// Cursor/display shift flags
pub const DISPLAY_MOVE: u8 = 0b00001000;
pub const MOVE_RIGHT: u8 = 0b00000100;

// Function set flags
pub const TWO_LINE: u8 = 0b00001000;
pub const FONT_5X10: u8 = 0b00000100;

/// Low-level interface of an HD44780 controller.
///
/// All commands are absolute: each one re-encodes the whole register it targets, so the caller
/// has to know the full register value. The controller cannot be read back through an I²C
/// backpack, which is why the implementations keep mirrors of the registers instead.
///
/// **⚠️ Calling [Self::set_entry_mode], [Self::set_display_control] or [Self::function_set]
/// directly bypasses those mirrors.** The next toggle on [DisplayController] re-sends the
/// mirrored value and undoes the change. Prefer the controller's own methods.
pub trait HD44780Driver: Debug {
    /// Clears the display and sets the cursor to the home position.
    ///
    /// Takes up to 1.52 ms on the controller side; callers must wait before the next command.
    fn clear_display(&mut self) -> BackpackResult<()> {
        self.send_command(CMD_CLEAR_DISPLAY)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    ///
    /// Same busy period as [Self::clear_display].
    fn return_home(&mut self) -> BackpackResult<()> {
        self.send_command(CMD_RETURN_HOME)
    }

    /// Sets the entry mode register.
    ///
    /// Command: `000001IS`.
    /// `I` is `1` for left-to-right (increment), `0` for right-to-left.
    /// `S` is `1` to shift the display on every write.
    fn set_entry_mode(&mut self, flags: u8) -> BackpackResult<()> {
        self.send_command(CMD_ENTRY_MODE_SET | (flags & 0b00000011))
    }

    /// Sets the display control register.
    ///
    /// Command: `00001DCB`.
    /// `D` turns the display on, `C` the underline cursor, `B` the cursor blinking.
    fn set_display_control(&mut self, flags: u8) -> BackpackResult<()> {
        self.send_command(CMD_DISPLAY_CONTROL | (flags & 0b00000111))
    }

    /// Moves the cursor or shifts the display by one cell, without touching DDRAM.
    ///
    /// Command: `0001SR??`.
    /// `S` is `1` for display shift, `0` for cursor move.
    /// `R` is `1` for right, `0` for left.
    fn cursor_shift(&mut self, display_shift: bool, direction: ShiftDirection) -> BackpackResult<()> {
        let mut command = CMD_CURSOR_SHIFT;
        if display_shift {
            command |= DISPLAY_MOVE;
        }
        command |= direction.to_mask();
        self.send_command(command)
    }

    /// Sets the function set register.
    ///
    /// Command: `001DNF??`.
    /// `D` is `1` for 8-bit interface, `N` is `1` for 2 lines, `F` is `1` for 5x10 font.
    fn function_set(&mut self, flags: u8) -> BackpackResult<()> {
        self.send_command(CMD_FUNCTION_SET | (flags & 0b00011100))
    }

    /// Sets the CGRAM address. Only the low 6 bits are used.
    fn set_cgram_address(&mut self, address: u8) -> BackpackResult<()> {
        self.send_command(CMD_SET_CGRAM_ADDRESS | (address & 0b00111111))
    }

    /// Sets the DDRAM address. Only the low 7 bits are used.
    fn set_ddram_address(&mut self, address: u8) -> BackpackResult<()> {
        self.send_command(CMD_SET_DDRAM_ADDRESS | (address & 0b01111111))
    }

    /// Sends a command byte to the controller (RS = 0).
    fn send_command(&mut self, command: u8) -> BackpackResult<()>;

    /// Sends a data byte to the controller (RS = 1), at the current DDRAM or CGRAM address.
    fn send_data(&mut self, data: u8) -> BackpackResult<()>;
}

/// Direction of a one-shot cursor or display shift.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShiftDirection {
    Left,
    Right,
}

impl ShiftDirection {
    pub fn to_mask(&self) -> u8 {
        match self {
            ShiftDirection::Left => 0,
            ShiftDirection::Right => MOVE_RIGHT,
        }
    }
}

/// Direction the cursor moves after each written character.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum TextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl TextDirection {
    pub fn to_mask(&self) -> u8 {
        match self {
            TextDirection::LeftToRight => ENTRY_LEFT,
            TextDirection::RightToLeft => 0,
        }
    }
}

/// Glyph font height.
///
/// The 5x10 font only exists on single-line configurations; it is ignored otherwise.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum FontSize {
    #[default]
    Dots5x8,
    Dots5x10,
}

impl FontSize {
    pub fn to_mask(&self) -> u8 {
        match self {
            FontSize::Dots5x8 => 0,
            FontSize::Dots5x10 => FONT_5X10,
        }
    }
}
