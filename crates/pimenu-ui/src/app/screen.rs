use std::net::Ipv4Addr;

use anyhow::Result;
use pimenu_logging::targets::T_ACTIONS;
use tracing::{debug, info, warn};

use crate::display::DisplaySink;
use crate::editor::{EditOutcome, IpFieldEditor};
use crate::info::{InfoOutcome, InfoPage, InfoScreen};
use crate::input::Button;
use crate::menu::{self, MenuAction, MenuEntry, MenuId, SystemCommand};
use crate::navigator::MenuNavigator;
use crate::system::{netmask_to_prefix, SystemActionExecutor, SystemInfoProvider};
use crate::util::fit_line;

use super::ExitReason;

const DEFAULT_NETMASK: &str = "255.255.255.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Menu,
    Info,
    Editor,
}

/// What an editor's committed value is used for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum EditPurpose {
    Address { iface: String },
    Netmask { iface: String, address: Ipv4Addr },
}

pub(super) enum Screen {
    Menu {
        id: MenuId,
        entries: Vec<MenuEntry>,
        nav: MenuNavigator,
    },
    Info(InfoScreen),
    Editor {
        editor: IpFieldEditor,
        purpose: EditPurpose,
    },
}

pub(super) enum Transition {
    Stay,
    Push(Screen),
    Pop,
    Replace(Screen),
    Exit(ExitReason),
}

pub(super) struct ScreenContext<'a> {
    pub display: &'a mut dyn DisplaySink,
    pub info: &'a dyn SystemInfoProvider,
    pub actions: &'a dyn SystemActionExecutor,
    pub is_root: bool,
}

impl Screen {
    pub fn menu(
        id: MenuId,
        info: &dyn SystemInfoProvider,
        display: &mut dyn DisplaySink,
    ) -> Result<Self> {
        let entries = menu::entries(&id, info);
        let labels = entries.iter().map(|entry| entry.label.clone()).collect();
        let mut nav = MenuNavigator::new(labels);
        nav.initialize(display)?;
        Ok(Self::Menu { id, entries, nav })
    }

    fn pages(pages: Vec<InfoPage>, display: &mut dyn DisplaySink) -> Result<Self> {
        let mut screen = InfoScreen::new(pages);
        screen.initialize(display)?;
        Ok(Self::Info(screen))
    }

    fn message(title: &str, value: &str, display: &mut dyn DisplaySink) -> Result<Self> {
        let mut screen = InfoScreen::message(title, value);
        screen.initialize(display)?;
        Ok(Self::Info(screen))
    }

    fn editor(
        seed: &str,
        label: &str,
        purpose: EditPurpose,
        display: &mut dyn DisplaySink,
    ) -> Result<Self> {
        let is_netmask = matches!(purpose, EditPurpose::Netmask { .. });
        let editor = IpFieldEditor::begin(seed, label, is_netmask, display)?;
        Ok(Self::Editor { editor, purpose })
    }

    pub fn kind(&self) -> ScreenKind {
        match self {
            Self::Menu { .. } => ScreenKind::Menu,
            Self::Info(_) => ScreenKind::Info,
            Self::Editor { .. } => ScreenKind::Editor,
        }
    }

    pub fn menu_id(&self) -> Option<&MenuId> {
        match self {
            Self::Menu { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Initial full draw, used when returning to this screen and on wake.
    /// Menus and pagers restart from the top; editors keep their digits.
    pub fn draw_initial(&mut self, display: &mut dyn DisplaySink) -> Result<()> {
        match self {
            Self::Menu { nav, .. } => nav.initialize(display),
            Self::Info(screen) => screen.initialize(display),
            Self::Editor { editor, .. } => editor.redraw(display),
        }
    }

    pub fn handle(&mut self, button: Button, ctx: &mut ScreenContext<'_>) -> Result<Transition> {
        match self {
            Self::Menu { entries, nav, .. } => match button {
                Button::Up => {
                    nav.retreat(ctx.display)?;
                    Ok(Transition::Stay)
                }
                Button::Down => {
                    nav.advance(ctx.display)?;
                    Ok(Transition::Stay)
                }
                Button::Back if ctx.is_root => Ok(Transition::Stay),
                Button::Back => Ok(Transition::Pop),
                Button::Select => {
                    let Some((index, _)) = nav.current_selection() else {
                        return Ok(Transition::Stay);
                    };
                    let action = entries[index].action.clone();
                    select(action, ctx)
                }
            },
            Self::Info(screen) => match screen.handle(button, ctx.display)? {
                InfoOutcome::Stay => Ok(Transition::Stay),
                InfoOutcome::Close => Ok(Transition::Pop),
            },
            Self::Editor { editor, purpose } => match editor.handle(button, ctx.display)? {
                EditOutcome::Pending => Ok(Transition::Stay),
                EditOutcome::Cancelled => Ok(Transition::Pop),
                EditOutcome::Committed(value) => committed(purpose, &value, ctx),
            },
        }
    }
}

fn select(action: MenuAction, ctx: &mut ScreenContext<'_>) -> Result<Transition> {
    debug!("Menu action {action:?}");
    let screen = match action {
        MenuAction::Submenu(id) => Screen::menu(id, ctx.info, ctx.display)?,
        MenuAction::Info(kind) => Screen::pages(menu::info_pages(kind, ctx.info), ctx.display)?,
        MenuAction::InterfaceUp(name) => {
            ctx.actions.bring_interface_up(&name);
            Screen::message("Link up", &name, ctx.display)?
        }
        MenuAction::InterfaceDown(name) => {
            ctx.actions.bring_interface_down(&name);
            Screen::message("Link down", &name, ctx.display)?
        }
        MenuAction::Wireless(on) => {
            if on {
                ctx.actions.start_wireless();
            } else {
                ctx.actions.stop_wireless();
            }
            Screen::message("Wireless", if on { "On" } else { "Off" }, ctx.display)?
        }
        MenuAction::SetAddress(iface) => {
            let seed = ctx
                .info
                .interfaces()
                .into_iter()
                .find(|addr| addr.name == iface)
                .map(|addr| addr.address.to_string())
                .unwrap_or_default();
            Screen::editor(
                &seed,
                "IP Address",
                EditPurpose::Address { iface },
                ctx.display,
            )?
        }
        MenuAction::System(command) => return terminal(command, ctx),
        MenuAction::Inert => return Ok(Transition::Stay),
    };
    Ok(Transition::Push(screen))
}

fn committed(
    purpose: &EditPurpose,
    value: &str,
    ctx: &mut ScreenContext<'_>,
) -> Result<Transition> {
    match purpose {
        EditPurpose::Address { iface } => {
            let address: Ipv4Addr = value.parse()?;
            let seed = ctx
                .info
                .interfaces()
                .into_iter()
                .find(|addr| &addr.name == iface)
                .map(|addr| addr.netmask.to_string())
                .unwrap_or_else(|| DEFAULT_NETMASK.to_string());
            let purpose = EditPurpose::Netmask {
                iface: iface.clone(),
                address,
            };
            Ok(Transition::Replace(Screen::editor(
                &seed,
                "Netmask",
                purpose,
                ctx.display,
            )?))
        }
        EditPurpose::Netmask { iface, address } => {
            let netmask: Ipv4Addr = value.parse()?;
            if netmask_to_prefix(netmask).is_none() {
                return Ok(Transition::Replace(Screen::message(
                    "Invalid netmask",
                    value,
                    ctx.display,
                )?));
            }
            ctx.actions.set_address(iface, *address, netmask);
            Ok(Transition::Replace(Screen::message(
                "Address set",
                iface,
                ctx.display,
            )?))
        }
    }
}

/// Draws the final status line and starts the system action. The message
/// stays on the display after the loop exits. A failed draw does not stop
/// the action.
fn terminal(command: SystemCommand, ctx: &mut ScreenContext<'_>) -> Result<Transition> {
    let drawn = ctx
        .display
        .clear()
        .and_then(|()| ctx.display.print_at(0, 0, &fit_line(command.message())));
    if let Err(err) = drawn {
        warn!("Failed to draw {:?} message: {err:#}", command);
    }
    match command {
        SystemCommand::Restart => info!(target: T_ACTIONS, "restart requested"),
        SystemCommand::Reboot => ctx.actions.reboot(),
        SystemCommand::Shutdown => ctx.actions.shutdown(),
    }
    Ok(Transition::Exit(command.into()))
}
