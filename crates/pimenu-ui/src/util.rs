//! Text helpers for the 16-column character display.

use crate::display::LCD_COLUMNS;

/// Truncates `value` to at most `max_len` characters.
pub fn fit_to_width(value: &str, max_len: usize) -> String {
    value.chars().take(max_len).collect()
}

/// Fits a line to the full display width.
pub fn fit_line(value: &str) -> String {
    fit_to_width(value, LCD_COLUMNS as usize)
}

/// Shorten a string for display by truncating the middle with ".."
pub fn shorten_for_display(value: &str, max_len: usize) -> String {
    let len = value.chars().count();
    if len <= max_len {
        return value.to_string();
    }
    if max_len <= 2 {
        return fit_to_width(value, max_len);
    }
    let keep = max_len - 2;
    let prefix = keep / 2;
    let suffix = keep - prefix;
    let start: String = value.chars().take(prefix).collect();
    let end: String = value.chars().skip(len - suffix).collect();
    format!("{start}..{end}")
}

/// Human readable byte count with one decimal, e.g. `3.2G`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_line_truncates_to_display_width() {
        assert_eq!(fit_line("Information"), "Information");
        assert_eq!(fit_line("0123456789abcdefXYZ"), "0123456789abcdef");
    }

    #[test]
    fn shorten_keeps_both_ends() {
        assert_eq!(shorten_for_display("enx00e04c680001", 10), "enx0..0001");
        assert_eq!(shorten_for_display("eth0", 10), "eth0");
        assert_eq!(shorten_for_display("abcdef", 2), "ab");
    }

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1536), "1.5K");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0G");
    }
}
