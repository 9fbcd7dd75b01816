use anyhow::Result;

use crate::config::PinConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Back,
    Select,
}

impl Button {
    /// Dispatch order within a single tick.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Back, Self::Select];

    fn slot(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Back => 2,
            Self::Select => 3,
        }
    }
}

/// Raw line levels sampled in one tick. Active-low: `true` means released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonLevels {
    pub up: bool,
    pub down: bool,
    pub back: bool,
    pub select: bool,
}

impl ButtonLevels {
    pub const RELEASED: Self = Self {
        up: true,
        down: true,
        back: true,
        select: true,
    };

    /// Levels with only `button` held down.
    pub fn pressed(button: Button) -> Self {
        let mut levels = Self::RELEASED;
        match button {
            Button::Up => levels.up = false,
            Button::Down => levels.down = false,
            Button::Back => levels.back = false,
            Button::Select => levels.select = false,
        }
        levels
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        let level = match button {
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Back => self.back,
            Button::Select => self.select,
        };
        !level
    }

}

impl Default for ButtonLevels {
    fn default() -> Self {
        Self::RELEASED
    }
}

pub trait InputSource {
    fn read(&mut self) -> Result<ButtonLevels>;
}

/// Turns level snapshots into press events.
///
/// A press fires on the released to pressed edge. Up and Down keep firing
/// every `repeat_ticks` ticks while held, so long menus can be scrolled
/// without re-pressing.
#[derive(Debug, Clone)]
pub struct PressTracker {
    previous: ButtonLevels,
    held_ticks: [u32; 4],
    repeat_ticks: Option<u32>,
}

impl PressTracker {
    pub fn new(repeat_ticks: Option<u32>) -> Self {
        Self {
            previous: ButtonLevels::RELEASED,
            held_ticks: [0; 4],
            repeat_ticks,
        }
    }

    pub fn update(&mut self, levels: ButtonLevels) -> Vec<Button> {
        let mut presses = Vec::new();
        for button in Button::ALL {
            let slot = button.slot();
            if !levels.is_pressed(button) {
                self.held_ticks[slot] = 0;
                continue;
            }
            if !self.previous.is_pressed(button) {
                self.held_ticks[slot] = 0;
                presses.push(button);
                continue;
            }
            self.held_ticks[slot] = self.held_ticks[slot].saturating_add(1);
            if let Some(every) = self.repeat_ticks {
                let repeats = matches!(button, Button::Up | Button::Down);
                if repeats && self.held_ticks[slot] % every == 0 {
                    presses.push(button);
                }
            }
        }
        self.previous = levels;
        presses
    }

    /// Records `levels` as already seen, so the press that woke the screen
    /// saver is not dispatched to the restored screen.
    pub fn reset(&mut self, levels: ButtonLevels) {
        self.previous = levels;
        self.held_ticks = [0; 4];
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::*;
    use anyhow::Context;
    use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};

    struct ButtonLine {
        kind: Button,
        handle: LineHandle,
    }

    impl ButtonLine {
        fn new(kind: Button, pin: u32, chip: &mut Chip) -> Result<Self> {
            let line = chip
                .get_line(pin)
                .with_context(|| format!("requesting GPIO line {}", pin))?;
            // Buttons pull the line to ground when pressed; 1 is the idle level.
            let handle = line
                .request(LineRequestFlags::INPUT, 1, "pimenu")
                .with_context(|| format!("configuring GPIO line {}", pin))?;
            Ok(Self { kind, handle })
        }

        fn level(&self) -> Result<bool> {
            Ok(self.handle.get_value()? != 0)
        }
    }

    pub struct ButtonPad {
        lines: Vec<ButtonLine>,
    }

    impl ButtonPad {
        pub fn new(pins: &PinConfig) -> Result<Self> {
            let mut chip =
                Chip::new(&pins.chip).with_context(|| format!("opening {}", pins.chip))?;
            let lines = vec![
                ButtonLine::new(Button::Up, pins.button_up, &mut chip)?,
                ButtonLine::new(Button::Down, pins.button_down, &mut chip)?,
                ButtonLine::new(Button::Back, pins.button_back, &mut chip)?,
                ButtonLine::new(Button::Select, pins.button_select, &mut chip)?,
            ];
            Ok(Self { lines })
        }
    }

    impl InputSource for ButtonPad {
        fn read(&mut self) -> Result<ButtonLevels> {
            let mut levels = ButtonLevels::RELEASED;
            for line in &self.lines {
                let level = line
                    .level()
                    .with_context(|| format!("reading {:?} button", line.kind))?;
                match line.kind {
                    Button::Up => levels.up = level,
                    Button::Down => levels.down = level,
                    Button::Back => levels.back = level,
                    Button::Select => levels.select = level,
                }
            }
            Ok(levels)
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::*;

    pub struct ButtonPad;

    impl ButtonPad {
        pub fn new(_: &PinConfig) -> Result<Self> {
            Ok(Self)
        }
    }

    impl InputSource for ButtonPad {
        fn read(&mut self) -> Result<ButtonLevels> {
            Ok(ButtonLevels::RELEASED)
        }
    }
}

pub use platform::ButtonPad;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_active_low() {
        let levels = ButtonLevels {
            up: false,
            down: true,
            back: true,
            select: true,
        };
        assert!(levels.is_pressed(Button::Up));
        assert!(!levels.is_pressed(Button::Down));
        assert!(Button::ALL
            .iter()
            .all(|b| !ButtonLevels::RELEASED.is_pressed(*b)));
    }

    #[test]
    fn press_fires_once_on_edge_without_repeat() {
        let mut tracker = PressTracker::new(None);
        let held = ButtonLevels::pressed(Button::Select);
        assert_eq!(tracker.update(held), vec![Button::Select]);
        assert!(tracker.update(held).is_empty());
        assert!(tracker.update(held).is_empty());
        assert!(tracker.update(ButtonLevels::RELEASED).is_empty());
        assert_eq!(tracker.update(held), vec![Button::Select]);
    }

    #[test]
    fn held_down_repeats_but_select_does_not() {
        let mut tracker = PressTracker::new(Some(2));
        let mut levels = ButtonLevels::pressed(Button::Down);
        levels.select = false;

        assert_eq!(tracker.update(levels), vec![Button::Down, Button::Select]);
        assert!(tracker.update(levels).is_empty());
        assert_eq!(tracker.update(levels), vec![Button::Down]);
        assert!(tracker.update(levels).is_empty());
        assert_eq!(tracker.update(levels), vec![Button::Down]);
    }

    #[test]
    fn simultaneous_presses_follow_dispatch_order() {
        let mut tracker = PressTracker::new(None);
        let levels = ButtonLevels {
            up: false,
            down: true,
            back: false,
            select: false,
        };
        assert_eq!(
            tracker.update(levels),
            vec![Button::Up, Button::Back, Button::Select]
        );
    }

    #[test]
    fn reset_treats_held_button_as_already_seen() {
        let mut tracker = PressTracker::new(None);
        let held = ButtonLevels::pressed(Button::Up);
        tracker.reset(held);
        assert!(tracker.update(held).is_empty());
        assert!(tracker.update(ButtonLevels::RELEASED).is_empty());
        assert_eq!(tracker.update(held), vec![Button::Up]);
    }
}
