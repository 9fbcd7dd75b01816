mod controller;
mod screen;

pub use controller::{ScreenController, TickOutcome};
pub use screen::ScreenKind;

use crate::menu::SystemCommand;

/// Why the menu loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Restart,
    Reboot,
    Shutdown,
    Signal,
}

impl From<SystemCommand> for ExitReason {
    fn from(command: SystemCommand) -> Self {
        match command {
            SystemCommand::Restart => Self::Restart,
            SystemCommand::Reboot => Self::Reboot,
            SystemCommand::Shutdown => Self::Shutdown,
        }
    }
}
