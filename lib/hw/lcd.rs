use display_interface::{DisplayError, WriteOnlyDataCommand};
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics::prelude::{DrawTarget, Drawable, Point};
use embedded_graphics::text::{Baseline, Text};
use ili9341::{DisplaySize240x320, Ili9341, Orientation};
use stm32g0xx_hal::hal::blocking::delay::DelayMs;
use stm32g0xx_hal::hal::digital::v2::OutputPin;

use crate::hw::CharDisplay;

#[derive(Debug)]
pub struct IliError(pub DisplayError);

/// ILI9341 driven as a grid of fixed-size character cells.
pub struct IliLcd<I, R> {
    ili: Ili9341<I, R>,
    style: MonoTextStyle<'static, Rgb565>,
    cursor: Point,
}

impl<I, R> IliLcd<I, R>
where
    I: WriteOnlyDataCommand,
    R: OutputPin,
{
    pub fn new<D>(interface: I, reset: R, delay: &mut D) -> Result<Self, IliError>
    where
        D: DelayMs<u16>,
    {
        let ili = Ili9341::new(
            interface,
            reset,
            delay,
            Orientation::Landscape,
            DisplaySize240x320,
        )
        .map_err(IliError)?;
        // Opaque background so a new value wipes the digits underneath
        let style = MonoTextStyleBuilder::new()
            .font(&FONT_10X20)
            .text_color(Color::TEXT)
            .background_color(Color::BACKGROUND)
            .build();

        Ok(IliLcd {
            ili,
            style,
            cursor: Point::zero(),
        })
    }
}

impl<I, R> CharDisplay for IliLcd<I, R>
where
    I: WriteOnlyDataCommand,
    R: OutputPin,
{
    type Error = IliError;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.cursor = Point::zero();
        self.ili.clear(Color::BACKGROUND).map_err(IliError)
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error> {
        self.cursor = Point::new(col as i32 * Cell::WIDTH, row as i32 * Cell::HEIGHT);
        Ok(())
    }

    fn write_text(&mut self, text: &[u8]) -> Result<(), Self::Error> {
        let text = core::str::from_utf8(text)
            .map_err(|_| IliError(DisplayError::InvalidFormatError))?;
        self.cursor = Text::with_baseline(text, self.cursor, self.style, Baseline::Top)
            .draw(&mut self.ili)
            .map_err(IliError)?;
        Ok(())
    }
}

struct Cell;

impl Cell {
    const WIDTH: i32 = 10;
    const HEIGHT: i32 = 20;
}

struct Color;

impl Color {
    const BACKGROUND: Rgb565 = Rgb565::BLACK;
    const TEXT: Rgb565 = Rgb565::YELLOW;
}
