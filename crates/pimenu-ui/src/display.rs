use anyhow::Result;

pub const LCD_COLUMNS: u8 = 16;
pub const LCD_ROWS: u8 = 2;

/// Character display primitives the screens draw with.
pub trait DisplaySink {
    fn clear(&mut self) -> Result<()>;
    fn set_cursor(&mut self, col: u8, row: u8) -> Result<()>;
    fn write(&mut self, text: &str) -> Result<()>;
    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;
    fn set_cursor_blink(&mut self, blink: bool) -> Result<()>;
    fn set_display_on(&mut self, on: bool) -> Result<()>;
    fn set_backlight(&mut self, on: bool) -> Result<()>;

    fn print_at(&mut self, col: u8, row: u8, text: &str) -> Result<()> {
        self.set_cursor(col, row)?;
        self.write(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    Clear,
    SetCursor(u8, u8),
    Write(String),
    CursorVisible(bool),
    CursorBlink(bool),
    DisplayOn(bool),
    Backlight(bool),
}

/// In-memory 16x2 character grid.
///
/// Used as the display on hosts without GPIO and by the tests, which inspect
/// both the visible text and the sequence of operations that produced it.
#[derive(Debug, Clone)]
pub struct MemoryDisplay {
    cells: [[char; LCD_COLUMNS as usize]; LCD_ROWS as usize],
    col: u8,
    row: u8,
    pub display_on: bool,
    pub backlight: bool,
    pub cursor_visible: bool,
    pub cursor_blink: bool,
    ops: Vec<DisplayOp>,
}

impl Default for MemoryDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self {
            cells: [[' '; LCD_COLUMNS as usize]; LCD_ROWS as usize],
            col: 0,
            row: 0,
            display_on: true,
            backlight: true,
            cursor_visible: false,
            cursor_blink: false,
            ops: Vec::new(),
        }
    }

    /// Full row contents, padded to the display width.
    pub fn row(&self, row: u8) -> String {
        self.cells
            .get(row as usize)
            .map(|cells| cells.iter().collect())
            .unwrap_or_default()
    }

    /// Row contents without trailing blanks.
    pub fn line(&self, row: u8) -> String {
        self.row(row).trim_end().to_string()
    }

    pub fn cursor(&self) -> (u8, u8) {
        (self.col, self.row)
    }

    pub fn ops(&self) -> &[DisplayOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DisplayOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == DisplayOp::Clear).count()
    }
}

impl DisplaySink for MemoryDisplay {
    fn clear(&mut self) -> Result<()> {
        self.cells = [[' '; LCD_COLUMNS as usize]; LCD_ROWS as usize];
        self.col = 0;
        self.row = 0;
        self.ops.push(DisplayOp::Clear);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<()> {
        self.col = col.min(LCD_COLUMNS);
        self.row = row.min(LCD_ROWS - 1);
        self.ops.push(DisplayOp::SetCursor(col, row));
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            if self.col >= LCD_COLUMNS {
                break;
            }
            self.cells[self.row as usize][self.col as usize] = ch;
            self.col += 1;
        }
        self.ops.push(DisplayOp::Write(text.to_string()));
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.cursor_visible = visible;
        self.ops.push(DisplayOp::CursorVisible(visible));
        Ok(())
    }

    fn set_cursor_blink(&mut self, blink: bool) -> Result<()> {
        self.cursor_blink = blink;
        self.ops.push(DisplayOp::CursorBlink(blink));
        Ok(())
    }

    fn set_display_on(&mut self, on: bool) -> Result<()> {
        self.display_on = on;
        self.ops.push(DisplayOp::DisplayOn(on));
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.backlight = on;
        self.ops.push(DisplayOp::Backlight(on));
        Ok(())
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use anyhow::{Context, Result};
    use linux_embedded_hal::{
        gpio_cdev::{Chip, LineRequestFlags},
        CdevPin, Delay,
    };

    use crate::config::{DisplayConfig, PinConfig};
    use crate::lcd::{Backlight, Hd44780, LcdPins};

    pub type Display = Hd44780<CdevPin, Delay>;

    fn output_pin(chip: &mut Chip, pin: u32, default: u8, consumer: &str) -> Result<CdevPin> {
        let handle = chip
            .get_line(pin)
            .with_context(|| format!("requesting GPIO line {pin}"))?
            .request(LineRequestFlags::OUTPUT, default, consumer)
            .with_context(|| format!("configuring GPIO line {pin} as output"))?;
        CdevPin::new(handle).with_context(|| format!("creating pin for line {pin}"))
    }

    pub fn open_display(pins: &PinConfig, config: &DisplayConfig) -> Result<Display> {
        let mut chip = Chip::new(&pins.chip).with_context(|| format!("opening {}", pins.chip))?;
        let rs = output_pin(&mut chip, pins.lcd_rs, 0, "pimenu-lcd-rs")?;
        let enable = output_pin(&mut chip, pins.lcd_enable, 0, "pimenu-lcd-en")?;
        let [d4, d5, d6, d7] = pins.lcd_data;
        let data = [
            output_pin(&mut chip, d4, 0, "pimenu-lcd-d4")?,
            output_pin(&mut chip, d5, 0, "pimenu-lcd-d5")?,
            output_pin(&mut chip, d6, 0, "pimenu-lcd-d6")?,
            output_pin(&mut chip, d7, 0, "pimenu-lcd-d7")?,
        ];
        // Start with the light on: drive the lit level straight away.
        let lit_level = if config.backlight_active_low { 0 } else { 1 };
        let backlight = Backlight {
            pin: output_pin(&mut chip, pins.backlight, lit_level, "pimenu-backlight")?,
            active_low: config.backlight_active_low,
        };
        Hd44780::new(LcdPins { rs, enable, data }, Some(backlight), Delay {})
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use anyhow::Result;

    use super::MemoryDisplay;
    use crate::config::{DisplayConfig, PinConfig};

    pub type Display = MemoryDisplay;

    pub fn open_display(_: &PinConfig, _: &DisplayConfig) -> Result<Display> {
        Ok(MemoryDisplay::new())
    }
}

pub use platform::{open_display, Display};
