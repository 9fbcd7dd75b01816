//! Status LED feedback.
//!
//! Blinks run on their own thread and are never joined; the LED shares no
//! state with the menu loop.

use std::time::Duration;

use anyhow::Result;

use crate::config::PinConfig;

/// Blink count used to signal that the menu has started.
pub const STARTUP_BLINKS: u32 = 5;
pub const STARTUP_BLINK_DELAY: Duration = Duration::from_millis(250);

#[cfg(target_os = "linux")]
mod platform {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};

    use crate::config::PinConfig;

    pub struct StatusLed {
        handle: Arc<LineHandle>,
    }

    impl StatusLed {
        pub fn new(pins: &PinConfig) -> Result<Self> {
            let mut chip =
                Chip::new(&pins.chip).with_context(|| format!("opening {}", pins.chip))?;
            let handle = chip
                .get_line(pins.status_led)
                .with_context(|| format!("requesting GPIO line {}", pins.status_led))?
                .request(LineRequestFlags::OUTPUT, 0, "pimenu-led")
                .with_context(|| format!("configuring GPIO line {} as output", pins.status_led))?;
            Ok(Self {
                handle: Arc::new(handle),
            })
        }

        pub fn blink(&self, count: u32, delay: Duration) {
            let handle = Arc::clone(&self.handle);
            let spawned = thread::Builder::new()
                .name("pimenu-led".into())
                .spawn(move || {
                    for _ in 0..count {
                        let toggled = handle
                            .set_value(1)
                            .and_then(|_| {
                                thread::sleep(delay);
                                handle.set_value(0)
                            });
                        if let Err(err) = toggled {
                            tracing::warn!("Status LED write failed: {err}");
                            return;
                        }
                        thread::sleep(delay);
                    }
                });
            if let Err(err) = spawned {
                tracing::warn!("Status LED thread failed to start: {err}");
            }
        }

        pub fn off(&self) -> Result<()> {
            self.handle
                .set_value(0)
                .context("driving status LED low")
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use std::time::Duration;

    use anyhow::Result;

    use crate::config::PinConfig;

    pub struct StatusLed;

    impl StatusLed {
        pub fn new(_: &PinConfig) -> Result<Self> {
            Ok(Self)
        }

        pub fn blink(&self, count: u32, _: Duration) {
            tracing::debug!("Status LED blink x{count} (no GPIO on this host)");
        }

        pub fn off(&self) -> Result<()> {
            Ok(())
        }
    }
}

pub use platform::StatusLed;

/// Opens the LED and blinks the startup pattern.
pub fn signal_startup(pins: &PinConfig) -> Result<StatusLed> {
    let led = StatusLed::new(pins)?;
    led.blink(STARTUP_BLINKS, STARTUP_BLINK_DELAY);
    Ok(led)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_pattern_is_five_quarter_second_blinks() {
        assert_eq!(STARTUP_BLINKS, 5);
        assert_eq!(STARTUP_BLINK_DELAY, Duration::from_millis(250));
        // Whole pattern finishes in under three seconds.
        assert!(STARTUP_BLINK_DELAY * 2 * STARTUP_BLINKS < Duration::from_secs(3));
    }
}
