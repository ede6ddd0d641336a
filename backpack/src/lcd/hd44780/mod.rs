//! HD44780 LCD module.
//!
//! The controller itself is driven through the [driver::HD44780Driver] trait. The only
//! implementation in this crate is [driver::DisplayController], which talks to the controller
//! through an I²C backpack.

pub mod driver;
