use core::fmt::Write;
use heapless::String;

use crate::error::{Error, Result};
use crate::hw::CharDisplay;
use crate::telemetry::Snapshot;

/// Two-line readout of speed and covered distance.
pub struct Dashboard<LCD> {
    lcd: LCD,
    last_speed: Option<u32>,
    last_distance: Option<u32>,
}

impl<LCD> Dashboard<LCD>
where
    LCD: CharDisplay,
{
    pub fn new(lcd: LCD) -> Result<Self> {
        let mut dashboard = Dashboard {
            lcd,
            last_speed: None,
            last_distance: None,
        };
        dashboard.init()?;
        Ok(dashboard)
    }

    /// Redraws the values that changed since the previous update.
    pub fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        if self.last_speed != Some(snapshot.speed) {
            self.draw_value(&Field::SPEED, snapshot.speed)?;
            self.last_speed = Some(snapshot.speed);
        }
        if self.last_distance != Some(snapshot.distance) {
            self.draw_value(&Field::DISTANCE, snapshot.distance)?;
            self.last_distance = Some(snapshot.distance);
        }
        Ok(())
    }

    pub fn lcd(&self) -> &LCD {
        &self.lcd
    }

    #[cfg(test)]
    pub(crate) fn lcd_mut(&mut self) -> &mut LCD {
        &mut self.lcd
    }

    fn draw_value(&mut self, field: &Field, value: u32) -> Result<()> {
        let mut buffer = String::<12>::new();
        write!(&mut buffer, "{:>width$}", value, width = field.width)
            .map_err(|_| Error::BufferWrite)?;
        self.lcd
            .set_cursor(field.row, field.value_col)
            .map_err(|_| Error::Display)?;
        self.lcd
            .write_text(buffer.as_bytes())
            .map_err(|_| Error::Display)
    }

    fn init(&mut self) -> Result<()> {
        self.lcd.clear().map_err(|_| Error::Display)?;
        for field in [&Field::SPEED, &Field::DISTANCE] {
            self.lcd.set_cursor(field.row, 0).map_err(|_| Error::Display)?;
            self.lcd
                .write_text(field.label.as_bytes())
                .map_err(|_| Error::Display)?;
        }
        Ok(())
    }
}

// Labels leave a gap of `width` cells at `value_col` for the number
struct Field {
    row: u8,
    label: &'static str,
    value_col: u8,
    width: usize,
}

impl Field {
    const SPEED: Field = Field {
        row: 1,
        label: "Speed:     m/s",
        value_col: 7,
        width: 3,
    };
    // Wide enough for u32::MAX
    const DISTANCE: Field = Field {
        row: 2,
        label: "Covered:            m",
        value_col: 9,
        width: 10,
    };
}
