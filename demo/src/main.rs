mod bus;
mod config;

use std::env::var;
use std::fmt::Write;
use std::thread::sleep;
use std::time::Duration;
use dotenv::dotenv;
use eyre::WrapErr;
use lcd_backpack::lcd::hd44780::driver::{DisplayController, TextDirection};
use log::{debug, info};
use crate::bus::LogBus;
use crate::config::{parse_address, DisplayConfig, DEFAULT_ADDRESS};

const HEART: [u8; 8] = [
    0b00000,
    0b01010,
    0b11111,
    0b11111,
    0b01110,
    0b00100,
    0b00000,
    0b00000,
];

const BELL: [u8; 8] = [
    0b00100,
    0b01110,
    0b01110,
    0b01110,
    0b11111,
    0b00000,
    0b00100,
    0b00000,
];

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    info!("LCD backpack demo starting...");

    let address = match var("BACKPACK_I2C_ADDRESS") {
        Ok(s) => parse_address(&s).wrap_err_with(|| format!("BACKPACK_I2C_ADDRESS={s}"))?,
        Err(_) => DEFAULT_ADDRESS,
    };
    let config = DisplayConfig::try_load().unwrap_or_default();

    info!("Display @ {:#04x}: {:?}", address, config);

    let mut lcd: DisplayController<LogBus> = DisplayController::new(address);

    // The bus is ready by now, so the display can be brought up.
    lcd.configure(config.columns, config.lines, config.font.into())
        .wrap_err("Failed to configure display")?;

    lcd.create_char(0, &HEART)?;
    lcd.create_char(1, &BELL)?;

    lcd.set_cursor(0, 0)?;
    lcd.print("Hello ")?;
    lcd.write(0)?;
    lcd.set_cursor(0, 1)?;
    write!(lcd, "{}x{} ", config.columns, config.lines)?;
    lcd.write(1)?;

    debug!("Cursor and blink");
    lcd.cursor_on()?;
    sleep(Duration::from_millis(500));
    lcd.blink_on()?;
    sleep(Duration::from_millis(500));
    lcd.cursor_off()?;
    lcd.blink_off()?;

    debug!("Scrolling");
    for _ in 0..config.columns {
        lcd.scroll_left()?;
        sleep(Duration::from_millis(100));
    }
    for _ in 0..config.columns {
        lcd.scroll_right()?;
        sleep(Duration::from_millis(100));
    }

    debug!("Right to left with autoscroll");
    lcd.clear()?;
    lcd.set_cursor(config.columns.saturating_sub(1), config.lines.saturating_sub(1))?;
    lcd.set_text_direction(TextDirection::RightToLeft)?;
    lcd.set_autoscroll(true)?;
    lcd.print("olleH")?;
    lcd.set_autoscroll(false)?;
    lcd.set_text_direction(TextDirection::LeftToRight)?;

    debug!("Blanking");
    lcd.display_off()?;
    sleep(Duration::from_millis(500));
    lcd.display_on()?;

    // Cursor shift left, a command the driver has no wrapper for.
    lcd.home()?;
    lcd.send_raw_command(0b00010000)?;

    info!("Done, {} transactions sent", lcd.bus().transactions());

    Ok(())
}
