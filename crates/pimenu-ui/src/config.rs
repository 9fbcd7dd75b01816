use std::{
    env, fs,
    io::Write,
    path::{Path, PathBuf},
    process,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "pimenu.json";
pub const DEFAULT_ROOT: &str = "/var/lib/pimenu";
pub const ROOT_ENV: &str = "PIMENU_ROOT";

/// Picks the state directory: explicit override, then `PIMENU_ROOT`, then the default.
pub fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    if let Some(root) = root {
        return root;
    }
    match env::var(ROOT_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => PathBuf::from(DEFAULT_ROOT),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuConfig {
    #[serde(default)]
    pub pins: PinConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl MenuConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            let default = MenuConfig::default();
            default.save(&path)?;
            return Ok(default);
        }

        let contents =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let mut config: MenuConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        if config.timing.normalize() {
            tracing::info!("Repaired timing settings in {}", path.display());
            config.save(&path)?;
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = path.to_path_buf();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(CONFIG_FILE);
        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_nanos())
            .unwrap_or(0);
        tmp.set_file_name(format!(".{filename}.tmp.{}.{}", process::id(), now_ns));

        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("creating temp config {}", tmp.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("writing temp config {}", tmp.display()))?;
        file.write_all(b"\n")
            .with_context(|| format!("writing newline to temp config {}", tmp.display()))?;
        file.sync_all()
            .with_context(|| format!("syncing temp config {}", tmp.display()))?;
        drop(file);

        fs::rename(&tmp, path).with_context(|| {
            format!(
                "renaming temp config {} -> {}",
                tmp.display(),
                path.display()
            )
        })?;
        Ok(())
    }
}

/// BCM line offsets on the GPIO character device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinConfig {
    #[serde(default = "PinConfig::default_chip")]
    pub chip: String,
    #[serde(default = "PinConfig::default_button_up")]
    pub button_up: u32,
    #[serde(default = "PinConfig::default_button_down")]
    pub button_down: u32,
    #[serde(default = "PinConfig::default_button_back")]
    pub button_back: u32,
    #[serde(default = "PinConfig::default_button_select")]
    pub button_select: u32,
    #[serde(default = "PinConfig::default_lcd_rs")]
    pub lcd_rs: u32,
    #[serde(default = "PinConfig::default_lcd_enable")]
    pub lcd_enable: u32,
    #[serde(default = "PinConfig::default_lcd_data")]
    pub lcd_data: [u32; 4],
    #[serde(default = "PinConfig::default_backlight")]
    pub backlight: u32,
    #[serde(default = "PinConfig::default_status_led")]
    pub status_led: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            chip: Self::default_chip(),
            button_up: Self::default_button_up(),
            button_down: Self::default_button_down(),
            button_back: Self::default_button_back(),
            button_select: Self::default_button_select(),
            lcd_rs: Self::default_lcd_rs(),
            lcd_enable: Self::default_lcd_enable(),
            lcd_data: Self::default_lcd_data(),
            backlight: Self::default_backlight(),
            status_led: Self::default_status_led(),
        }
    }
}

impl PinConfig {
    fn default_chip() -> String {
        "/dev/gpiochip0".to_string()
    }
    const fn default_button_up() -> u32 {
        14
    }
    const fn default_button_down() -> u32 {
        15
    }
    const fn default_button_back() -> u32 {
        8
    }
    const fn default_button_select() -> u32 {
        18
    }
    const fn default_lcd_rs() -> u32 {
        25
    }
    const fn default_lcd_enable() -> u32 {
        24
    }
    const fn default_lcd_data() -> [u32; 4] {
        [23, 17, 27, 22]
    }
    const fn default_backlight() -> u32 {
        7
    }
    const fn default_status_led() -> u32 {
        1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "TimingConfig::default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Hold-to-scroll period for Up/Down; 0 turns auto-repeat off.
    #[serde(default = "TimingConfig::default_repeat_interval_ms")]
    pub repeat_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Self::default_tick_interval_ms(),
            idle_timeout_secs: Self::default_idle_timeout_secs(),
            repeat_interval_ms: Self::default_repeat_interval_ms(),
        }
    }
}

impl TimingConfig {
    const fn default_tick_interval_ms() -> u64 {
        100
    }
    const fn default_idle_timeout_secs() -> u64 {
        600
    }
    const fn default_repeat_interval_ms() -> u64 {
        350
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Number of held ticks between repeated Up/Down presses, if enabled.
    pub fn repeat_ticks(&self) -> Option<u32> {
        if self.repeat_interval_ms == 0 || self.tick_interval_ms == 0 {
            return None;
        }
        let ticks = self.repeat_interval_ms.div_ceil(self.tick_interval_ms).max(1);
        Some(u32::try_from(ticks).unwrap_or(u32::MAX))
    }

    /// Returns true when a value had to be repaired.
    pub fn normalize(&mut self) -> bool {
        if self.tick_interval_ms == 0 {
            self.tick_interval_ms = Self::default_tick_interval_ms();
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayConfig {
    #[serde(default = "DisplayConfig::default_backlight_active_low")]
    pub backlight_active_low: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backlight_active_low: Self::default_backlight_active_low(),
        }
    }
}

impl DisplayConfig {
    const fn default_backlight_active_low() -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    #[serde(default = "NetworkConfig::default_wireless_interface")]
    pub wireless_interface: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wireless_interface: Self::default_wireless_interface(),
        }
    }
}

impl NetworkConfig {
    fn default_wireless_interface() -> String {
        "wlan0".to_string()
    }
}
