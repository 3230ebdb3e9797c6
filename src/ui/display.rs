//! SSD1306 OLED display wrapper.

use blesim::config::DISPLAY_I2C_ADDR;
use blesim::error::Error;
use blesim::ui::status::DisplaySink;
use defmt::warn;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Baselines of the four text rows (FONT_6X10).
const ROWS: [i32; 4] = [10, 24, 38, 52];

/// A [`DisplaySink`] that draws on the OLED, or discards everything when
/// the panel did not come up.
pub struct OledSink<I2C> {
    display: Option<Display<I2C>>,
}

impl<I2C> OledSink<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the SSD1306 display and clear the screen.
    pub fn init(i2c: I2C) -> Result<Self, Error> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, DISPLAY_I2C_ADDR);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(|_| Error::Display)?;
        display.clear_buffer();
        display.flush().map_err(|_| Error::Display)?;
        Ok(Self {
            display: Some(display),
        })
    }

    /// A sink with no panel behind it.
    pub fn detached() -> Self {
        Self { display: None }
    }
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

impl<I2C> DisplaySink for OledSink<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn show(&mut self, lines: &[&str]) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        display.clear_buffer();
        for (line, y) in lines.iter().zip(ROWS) {
            let _ = Text::new(line, Point::new(0, y), text_style()).draw(display);
        }
        if display.flush().is_err() {
            warn!("display flush failed");
        }
    }
}
