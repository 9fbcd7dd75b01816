#![deny(unsafe_op_in_unsafe_fn)]

use anyhow::{Context, Result};
use tracing::{info, warn};

use pimenu_ui::app::{ExitReason, ScreenController};
use pimenu_ui::config::{resolve_root, MenuConfig};
use pimenu_ui::display::open_display;
use pimenu_ui::input::ButtonPad;
use pimenu_ui::led;
use pimenu_ui::shutdown::spawn_signal_watcher;
use pimenu_ui::system::{LinuxSystemInfo, ShellActions};

fn main() -> Result<()> {
    let root = resolve_root(None);
    let log_cfg = pimenu_logging::fs::read_config(&root);
    let _logging_guards = pimenu_logging::init("pimenu", &root, &log_cfg)?;
    if let Err(err) = pimenu_logging::run_retention(&root, &log_cfg) {
        warn!("Log retention failed: {:#}", err);
    }

    // Wrap the whole run in a component span for log identity
    let span = tracing::info_span!("pimenu", component = "pimenu");
    let _span_guard = span.enter();

    let config = MenuConfig::load(&root)?;
    let stop = spawn_signal_watcher()?;

    let display = open_display(&config.pins, &config.display).context("opening LCD")?;
    let buttons = ButtonPad::new(&config.pins).context("opening buttons")?;
    let status_led = match led::signal_startup(&config.pins) {
        Ok(led) => Some(led),
        Err(err) => {
            warn!("Status LED disabled: {:#}", err);
            None
        }
    };

    let mut controller = ScreenController::new(
        display,
        buttons,
        Box::new(LinuxSystemInfo),
        Box::new(ShellActions::new(config.network.wireless_interface.clone())),
        &config,
    );
    info!("pimenu ready");
    let reason = controller.run(&stop);
    match reason {
        ExitReason::Signal => {
            info!("Stopped by signal");
            if let Some(led) = &status_led {
                if let Err(err) = led.off() {
                    warn!("Failed to switch status LED off: {:#}", err);
                }
            }
        }
        other => info!("Exiting for {:?}", other),
    }
    Ok(())
}
