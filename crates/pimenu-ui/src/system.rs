//! Host queries and privileged actions behind the menu.
//!
//! Every external command the menu runs lives in this module. Queries return
//! `None` or empty collections when a value cannot be read; actions are
//! spawned detached and reaped on a helper thread.

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{bail, Context, Result};
use pimenu_logging::targets::T_ACTIONS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub name: String,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub free_kb: u64,
}

pub trait SystemInfoProvider {
    /// Non-loopback interface names, whether or not they carry an address.
    fn interface_names(&self) -> Vec<String>;
    /// IPv4 address/netmask pairs, loopback excluded.
    fn interfaces(&self) -> Vec<InterfaceAddress>;
    fn default_gateway(&self) -> Option<Ipv4Addr>;
    fn primary_dns(&self) -> Option<String>;
    fn memory(&self) -> Option<MemoryInfo>;
    fn free_disk_bytes(&self) -> Option<u64>;
}

pub trait SystemActionExecutor {
    fn reboot(&self);
    fn shutdown(&self);
    fn bring_interface_up(&self, name: &str);
    fn bring_interface_down(&self, name: &str);
    fn start_wireless(&self);
    fn stop_wireless(&self);
    fn set_address(&self, name: &str, address: Ipv4Addr, netmask: Ipv4Addr);
}

const SYS_CLASS_NET: &str = "/sys/class/net";
const PROC_ROUTE: &str = "/proc/net/route";
const RESOLV_CONF: &str = "/etc/resolv.conf";
const PROC_MEMINFO: &str = "/proc/meminfo";
const RTF_GATEWAY: u32 = 0x2;

pub struct LinuxSystemInfo;

impl LinuxSystemInfo {
    fn query<T>(what: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!("{what} unavailable: {err:#}");
                None
            }
        }
    }

    fn ip_addr_output() -> Result<String> {
        let output = Command::new("ip")
            .args(["-o", "-4", "addr", "show"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .context("running ip addr show")?;
        if !output.status.success() {
            bail!("ip addr show exited with status {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn read_interface_names() -> Result<Vec<String>> {
        let entries = fs::read_dir(SYS_CLASS_NET).context("reading /sys/class/net")?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.context("iterating interfaces")?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name != "lo" {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SystemInfoProvider for LinuxSystemInfo {
    fn interface_names(&self) -> Vec<String> {
        Self::query("interface list", Self::read_interface_names()).unwrap_or_default()
    }

    fn interfaces(&self) -> Vec<InterfaceAddress> {
        Self::query("interface addresses", Self::ip_addr_output())
            .map(|out| parse_ip_addr(&out))
            .unwrap_or_default()
    }

    fn default_gateway(&self) -> Option<Ipv4Addr> {
        let contents = Self::query(
            "routing table",
            fs::read_to_string(PROC_ROUTE).context("reading /proc/net/route"),
        )?;
        parse_default_gateway(&contents)
    }

    fn primary_dns(&self) -> Option<String> {
        let contents = Self::query(
            "resolver config",
            fs::read_to_string(RESOLV_CONF).context("reading resolv.conf"),
        )?;
        parse_nameservers(&contents).into_iter().next()
    }

    fn memory(&self) -> Option<MemoryInfo> {
        let contents = Self::query(
            "memory info",
            fs::read_to_string(PROC_MEMINFO).context("reading /proc/meminfo"),
        )?;
        parse_meminfo(&contents)
    }

    fn free_disk_bytes(&self) -> Option<u64> {
        Self::query("disk usage", free_disk_bytes(Path::new("/")))
    }
}

/// Runs privileged actions as detached child processes.
pub struct ShellActions {
    wireless_interface: String,
}

impl ShellActions {
    pub fn new(wireless_interface: impl Into<String>) -> Self {
        Self {
            wireless_interface: wireless_interface.into(),
        }
    }

    fn launch(&self, description: &str, program: &str, args: &[&str]) {
        tracing::info!(target: T_ACTIONS, "{description}: {program} {}", args.join(" "));
        if let Err(err) = spawn_detached(program, args) {
            tracing::error!(target: T_ACTIONS, "{description} failed: {err:#}");
        }
    }

    fn launch_script(&self, description: &str, interface: &str, script: String) {
        if !is_valid_ifname(interface) {
            tracing::warn!(target: T_ACTIONS, "{description}: refusing interface name {interface:?}");
            return;
        }
        self.launch(description, "sh", &["-c", &script]);
    }
}

impl SystemActionExecutor for ShellActions {
    fn reboot(&self) {
        self.launch("reboot", "systemctl", &["reboot"]);
    }

    fn shutdown(&self) {
        self.launch("shutdown", "shutdown", &["-h", "now"]);
    }

    fn bring_interface_up(&self, name: &str) {
        self.launch("link up", "ip", &["link", "set", "dev", name, "up"]);
    }

    fn bring_interface_down(&self, name: &str) {
        self.launch("link down", "ip", &["link", "set", "dev", name, "down"]);
    }

    fn start_wireless(&self) {
        let iface = &self.wireless_interface;
        self.launch_script(
            "wireless on",
            iface,
            format!("rfkill unblock wifi && ip link set dev {iface} up"),
        );
    }

    fn stop_wireless(&self) {
        let iface = &self.wireless_interface;
        self.launch_script(
            "wireless off",
            iface,
            format!("ip link set dev {iface} down; rfkill block wifi"),
        );
    }

    fn set_address(&self, name: &str, address: Ipv4Addr, netmask: Ipv4Addr) {
        let Some(prefix) = netmask_to_prefix(netmask) else {
            tracing::warn!(target: T_ACTIONS, "set address on {name}: invalid netmask {netmask}");
            return;
        };
        self.launch_script(
            "set address",
            name,
            format!("ip addr flush dev {name} && ip addr add {address}/{prefix} dev {name}"),
        );
    }
}

/// Starts `program` without waiting for it and returns its pid. The child is
/// waited on from a named thread so finished actions do not linger as zombies.
fn spawn_detached(program: &str, args: &[&str]) -> Result<u32> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("launching {program}"))?;
    let pid = child.id();
    let label = program.to_string();
    thread::Builder::new()
        .name("pimenu-reaper".into())
        .spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::warn!(target: T_ACTIONS, "{label} (pid {pid}) exited with {status}");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(target: T_ACTIONS, "waiting on {label}: {err}"),
        })
        .context("starting reaper thread")?;
    Ok(pid)
}

fn is_valid_ifname(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 15
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Parses `ip -o -4 addr show`, one address per line.
pub fn parse_ip_addr(output: &str) -> Vec<InterfaceAddress> {
    let mut found = Vec::new();
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.nth(1) else {
            continue;
        };
        let name = name.trim_end_matches(':');
        let name = name.split('@').next().unwrap_or(name);
        if name == "lo" {
            continue;
        }
        let Some(cidr) = tokens.skip_while(|t| *t != "inet").nth(1) else {
            continue;
        };
        let Some((addr, prefix)) = cidr.split_once('/') else {
            continue;
        };
        let (Ok(address), Ok(prefix)) = (addr.parse::<Ipv4Addr>(), prefix.parse::<u8>()) else {
            continue;
        };
        let Some(netmask) = prefix_to_netmask(prefix) else {
            continue;
        };
        found.push(InterfaceAddress {
            name: name.to_string(),
            address,
            netmask,
        });
    }
    found
}

/// Default route gateway from `/proc/net/route`.
pub fn parse_default_gateway(contents: &str) -> Option<Ipv4Addr> {
    contents.lines().skip(1).find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || fields[1] != "00000000" {
            return None;
        }
        let flags = u32::from_str_radix(fields[3], 16).ok()?;
        if flags & RTF_GATEWAY == 0 {
            return None;
        }
        let raw = u32::from_str_radix(fields[2], 16).ok()?;
        Some(Ipv4Addr::from(raw.to_le_bytes()))
    })
}

pub fn parse_nameservers(contents: &str) -> Vec<String> {
    let mut servers = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("nameserver") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if let Some(server) = parts.get(1) {
                servers.push(server.to_string());
            }
        }
    }
    servers
}

pub fn parse_meminfo(contents: &str) -> Option<MemoryInfo> {
    let field = |key: &str| {
        contents.lines().find_map(|line| {
            let rest = line.strip_prefix(key)?.strip_prefix(':')?;
            rest.split_whitespace().next()?.parse::<u64>().ok()
        })
    };
    Some(MemoryInfo {
        total_kb: field("MemTotal")?,
        free_kb: field("MemFree")?,
    })
}

pub fn prefix_to_netmask(prefix: u8) -> Option<Ipv4Addr> {
    match prefix {
        0 => Some(Ipv4Addr::UNSPECIFIED),
        1..=32 => Some(Ipv4Addr::from(u32::MAX << (32 - u32::from(prefix)))),
        _ => None,
    }
}

/// Prefix length of a contiguous netmask.
pub fn netmask_to_prefix(netmask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(netmask);
    let ones = bits.leading_ones();
    if bits.count_ones() != ones {
        return None;
    }
    Some(ones as u8)
}

pub fn free_disk_bytes(path: &Path) -> Result<u64> {
    #[cfg(target_os = "linux")]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes()).context("invalid path")?;
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error())
                .with_context(|| format!("statvfs {}", path.display()));
        }
        return Ok(stat.f_bavail as u64 * stat.f_frsize as u64);
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = path;
        bail!("disk usage supported on Linux only")
    }
}
