//! HD44780 character LCD driven over a 4-bit parallel bus.

use anyhow::{anyhow, Result};
use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::display::{DisplaySink, LCD_COLUMNS, LCD_ROWS};

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_DDRAM: u8 = 0x80;

const ENTRY_LEFT: u8 = 0x02;
const DISPLAY_ON: u8 = 0x04;
const CURSOR_ON: u8 = 0x02;
const BLINK_ON: u8 = 0x01;
const TWO_LINE: u8 = 0x08;

const ROW_OFFSETS: [u8; LCD_ROWS as usize] = [0x00, 0x40];

pub struct LcdPins<P> {
    pub rs: P,
    pub enable: P,
    /// D4..D7, least significant bit first.
    pub data: [P; 4],
}

pub struct Backlight<P> {
    pub pin: P,
    pub active_low: bool,
}

pub struct Hd44780<P, D> {
    pins: LcdPins<P>,
    backlight: Option<Backlight<P>>,
    delay: D,
    control: u8,
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<()> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|err| anyhow!("GPIO write failed: {err:?}"))
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    pub fn new(pins: LcdPins<P>, backlight: Option<Backlight<P>>, delay: D) -> Result<Self> {
        let mut lcd = Self {
            pins,
            backlight,
            delay,
            control: 0,
        };
        lcd.init()?;
        Ok(lcd)
    }

    fn init(&mut self) -> Result<()> {
        self.delay.delay_ms(50);
        drive(&mut self.pins.rs, false)?;
        drive(&mut self.pins.enable, false)?;

        // Three 8-bit function sets, then switch the controller to 4-bit mode.
        self.write_nibble(0x03)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x03)?;
        self.delay.delay_us(4500);
        self.write_nibble(0x03)?;
        self.delay.delay_us(150);
        self.write_nibble(0x02)?;

        self.command(CMD_FUNCTION_SET | TWO_LINE)?;
        self.control = DISPLAY_ON;
        self.command(CMD_DISPLAY_CONTROL | self.control)?;
        self.clear()?;
        self.command(CMD_ENTRY_MODE | ENTRY_LEFT)
    }

    fn pulse_enable(&mut self) -> Result<()> {
        drive(&mut self.pins.enable, false)?;
        self.delay.delay_us(1);
        drive(&mut self.pins.enable, true)?;
        self.delay.delay_us(1);
        drive(&mut self.pins.enable, false)?;
        self.delay.delay_us(100);
        Ok(())
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<()> {
        for (bit, pin) in self.pins.data.iter_mut().enumerate() {
            drive(pin, (nibble >> bit) & 1 == 1)?;
        }
        self.pulse_enable()
    }

    fn send(&mut self, value: u8, is_data: bool) -> Result<()> {
        drive(&mut self.pins.rs, is_data)?;
        self.write_nibble(value >> 4)?;
        self.write_nibble(value & 0x0F)
    }

    fn command(&mut self, value: u8) -> Result<()> {
        self.send(value, false)
    }

    fn set_control_flag(&mut self, flag: u8, on: bool) -> Result<()> {
        if on {
            self.control |= flag;
        } else {
            self.control &= !flag;
        }
        self.command(CMD_DISPLAY_CONTROL | self.control)
    }
}

impl<P: OutputPin, D: DelayNs> DisplaySink for Hd44780<P, D> {
    fn clear(&mut self) -> Result<()> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_us(2000);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<()> {
        let row = row.min(LCD_ROWS - 1);
        let col = col.min(LCD_COLUMNS - 1);
        self.command(CMD_SET_DDRAM | (col + ROW_OFFSETS[row as usize]))
    }

    fn write(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.send(byte, true)?;
        }
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.set_control_flag(CURSOR_ON, visible)
    }

    fn set_cursor_blink(&mut self, blink: bool) -> Result<()> {
        self.set_control_flag(BLINK_ON, blink)
    }

    fn set_display_on(&mut self, on: bool) -> Result<()> {
        self.set_control_flag(DISPLAY_ON, on)
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        match self.backlight.as_mut() {
            Some(backlight) => drive(&mut backlight.pin, on != backlight.active_low),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    const RS: usize = 0;
    const EN: usize = 1;
    const BL: usize = 6;

    type Log = Rc<RefCell<Vec<(usize, bool)>>>;

    struct FakePin {
        id: usize,
        log: Log,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.id, false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.id, true));
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn fake_lcd(active_low: bool) -> (Hd44780<FakePin, NoDelay>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let pin = |id| FakePin {
            id,
            log: log.clone(),
        };
        let pins = LcdPins {
            rs: pin(RS),
            enable: pin(EN),
            data: [pin(2), pin(3), pin(4), pin(5)],
        };
        let backlight = Backlight {
            pin: pin(BL),
            active_low,
        };
        let lcd = Hd44780::new(pins, Some(backlight), NoDelay).unwrap();
        (lcd, log)
    }

    /// Replays the pin log, returning (rs, nibble) latched on each enable pulse.
    fn latched_nibbles(log: &Log) -> Vec<(bool, u8)> {
        let mut levels = [false; 7];
        let mut out = Vec::new();
        for &(id, high) in log.borrow().iter() {
            if id == EN && high && !levels[EN] {
                let nibble = (0..4).fold(0u8, |acc, bit| acc | ((levels[2 + bit] as u8) << bit));
                out.push((levels[RS], nibble));
            }
            levels[id] = high;
        }
        out
    }

    fn bytes(nibbles: &[(bool, u8)]) -> Vec<(bool, u8)> {
        nibbles
            .chunks(2)
            .map(|pair| (pair[0].0, (pair[0].1 << 4) | pair[1].1))
            .collect()
    }

    #[test]
    fn init_sequence_enters_four_bit_two_line_mode() {
        let (_lcd, log) = fake_lcd(true);
        let nibbles = latched_nibbles(&log);
        let startup: Vec<u8> = nibbles[..4].iter().map(|(_, n)| *n).collect();
        assert_eq!(startup, vec![0x03, 0x03, 0x03, 0x02]);
        assert_eq!(
            bytes(&nibbles[4..]),
            vec![
                (false, 0x28),
                (false, 0x0C),
                (false, 0x01),
                (false, 0x06)
            ]
        );
    }

    #[test]
    fn print_at_addresses_second_row_then_sends_data() {
        let (mut lcd, log) = fake_lcd(true);
        lcd.print_at(2, 1, "A").unwrap();
        let nibbles = latched_nibbles(&log);
        let tail = bytes(&nibbles[nibbles.len() - 4..]);
        assert_eq!(tail, vec![(false, 0xC2), (true, b'A')]);
    }

    #[test]
    fn cursor_and_blink_flags_accumulate() {
        let (mut lcd, log) = fake_lcd(true);
        lcd.set_cursor_visible(true).unwrap();
        lcd.set_cursor_blink(true).unwrap();
        lcd.set_display_on(false).unwrap();
        let nibbles = latched_nibbles(&log);
        let tail = bytes(&nibbles[nibbles.len() - 6..]);
        assert_eq!(tail, vec![(false, 0x0E), (false, 0x0F), (false, 0x0B)]);
    }

    #[test]
    fn backlight_honours_polarity() {
        let (mut lcd, log) = fake_lcd(true);
        lcd.set_backlight(true).unwrap();
        assert_eq!(log.borrow().last(), Some(&(BL, false)));
        lcd.set_backlight(false).unwrap();
        assert_eq!(log.borrow().last(), Some(&(BL, true)));

        let (mut lcd, log) = fake_lcd(false);
        lcd.set_backlight(true).unwrap();
        assert_eq!(log.borrow().last(), Some(&(BL, true)));
    }
}
