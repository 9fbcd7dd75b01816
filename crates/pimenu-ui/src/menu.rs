use crate::info::InfoPage;
use crate::system::SystemInfoProvider;
use crate::util::format_bytes;

pub const PROGRAM_NAME: &str = "pimenu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuId {
    Main,
    Network,
    Interfaces,
    Interface(String),
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    Information,
    Diagnostics,
    About,
}

/// Actions that end the menu loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommand {
    Restart,
    Reboot,
    Shutdown,
}

impl SystemCommand {
    pub fn message(self) -> &'static str {
        match self {
            Self::Restart => "Restarting...",
            Self::Reboot => "Rebooting...",
            Self::Shutdown => "Shutting down...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Submenu(MenuId),
    Info(InfoKind),
    InterfaceUp(String),
    InterfaceDown(String),
    SetAddress(String),
    Wireless(bool),
    System(SystemCommand),
    /// Placeholder row with nothing behind it.
    Inert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub action: MenuAction,
}

impl MenuEntry {
    fn new(label: &str, action: MenuAction) -> Self {
        Self {
            label: label.to_string(),
            action,
        }
    }
}

/// Entries for a menu. Interface listings are read from the host each time
/// the menu is opened.
pub fn entries(menu: &MenuId, info: &dyn SystemInfoProvider) -> Vec<MenuEntry> {
    match menu {
        MenuId::Main => main_menu(),
        MenuId::Network => network_menu(),
        MenuId::Interfaces => interfaces_menu(info),
        MenuId::Interface(name) => interface_menu(name),
        MenuId::System => system_menu(),
    }
}

fn main_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry::new("Information", MenuAction::Info(InfoKind::Information)),
        MenuEntry::new("Network", MenuAction::Submenu(MenuId::Network)),
        MenuEntry::new("Diagnostics", MenuAction::Info(InfoKind::Diagnostics)),
        MenuEntry::new("System", MenuAction::Submenu(MenuId::System)),
        MenuEntry::new("About", MenuAction::Info(InfoKind::About)),
    ]
}

fn network_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry::new("Interfaces", MenuAction::Submenu(MenuId::Interfaces)),
        MenuEntry::new("Wireless On", MenuAction::Wireless(true)),
        MenuEntry::new("Wireless Off", MenuAction::Wireless(false)),
    ]
}

fn interfaces_menu(info: &dyn SystemInfoProvider) -> Vec<MenuEntry> {
    let names = info.interface_names();
    if names.is_empty() {
        return vec![MenuEntry::new("No interfaces", MenuAction::Inert)];
    }
    names
        .into_iter()
        .map(|name| MenuEntry {
            action: MenuAction::Submenu(MenuId::Interface(name.clone())),
            label: name,
        })
        .collect()
}

fn interface_menu(name: &str) -> Vec<MenuEntry> {
    vec![
        MenuEntry::new("Bring Up", MenuAction::InterfaceUp(name.to_string())),
        MenuEntry::new("Bring Down", MenuAction::InterfaceDown(name.to_string())),
        MenuEntry::new("Set Address", MenuAction::SetAddress(name.to_string())),
    ]
}

fn system_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry::new("Restart", MenuAction::System(SystemCommand::Restart)),
        MenuEntry::new("Reboot", MenuAction::System(SystemCommand::Reboot)),
        MenuEntry::new("Shutdown", MenuAction::System(SystemCommand::Shutdown)),
    ]
}

pub fn info_pages(kind: InfoKind, info: &dyn SystemInfoProvider) -> Vec<InfoPage> {
    match kind {
        InfoKind::Information => information_pages(info),
        InfoKind::Diagnostics => diagnostics_pages(info),
        InfoKind::About => vec![InfoPage::new(
            PROGRAM_NAME,
            format!("Version {}", env!("CARGO_PKG_VERSION")),
        )],
    }
}

fn information_pages(info: &dyn SystemInfoProvider) -> Vec<InfoPage> {
    let interfaces = info.interfaces();
    let mut pages: Vec<InfoPage> = interfaces
        .iter()
        .map(|iface| InfoPage::new(format!("{} IP", iface.name), iface.address.to_string()))
        .collect();
    pages.push(InfoPage::new(
        "Gateway",
        info.default_gateway()
            .map(|gw| gw.to_string())
            .unwrap_or_default(),
    ));
    pages.push(InfoPage::new("DNS", info.primary_dns().unwrap_or_default()));
    pages.extend(
        interfaces
            .iter()
            .map(|iface| InfoPage::new(format!("{} Mask", iface.name), iface.netmask.to_string())),
    );
    pages.push(InfoPage::new(
        "Free Memory",
        info.memory()
            .map(|mem| format!("{}/{}KB", mem.free_kb, mem.total_kb))
            .unwrap_or_default(),
    ));
    pages
}

fn diagnostics_pages(info: &dyn SystemInfoProvider) -> Vec<InfoPage> {
    let memory = info.memory();
    vec![
        InfoPage::new(
            "Free Memory",
            memory
                .map(|mem| format!("{} KB", mem.free_kb))
                .unwrap_or_default(),
        ),
        InfoPage::new(
            "Total Memory",
            memory
                .map(|mem| format!("{} KB", mem.total_kb))
                .unwrap_or_default(),
        ),
        InfoPage::new(
            "Free Disk",
            info.free_disk_bytes().map(format_bytes).unwrap_or_default(),
        ),
    ]
}
