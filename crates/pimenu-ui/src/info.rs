//! Read-only pages: one title/value pair per screen.

use anyhow::Result;

use crate::display::DisplaySink;
use crate::input::Button;
use crate::util::{fit_line, shorten_for_display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPage {
    pub title: String,
    pub value: String,
}

impl InfoPage {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoOutcome {
    Stay,
    Close,
}

#[derive(Debug, Clone)]
pub struct InfoScreen {
    pages: Vec<InfoPage>,
    current: usize,
    dismiss_on_select: bool,
}

impl InfoScreen {
    pub fn new(pages: Vec<InfoPage>) -> Self {
        Self {
            pages,
            current: 0,
            dismiss_on_select: false,
        }
    }

    /// Single page closed by either Back or Select.
    pub fn message(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            pages: vec![InfoPage::new(title, value)],
            current: 0,
            dismiss_on_select: true,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn initialize(&mut self, display: &mut dyn DisplaySink) -> Result<()> {
        self.current = 0;
        self.draw(display)
    }

    pub fn draw(&self, display: &mut dyn DisplaySink) -> Result<()> {
        display.clear()?;
        if let Some(page) = self.pages.get(self.current) {
            display.print_at(0, 0, &fit_line(&page.title))?;
            display.print_at(0, 1, &shorten_for_display(&page.value, 16))?;
        }
        Ok(())
    }

    pub fn handle(&mut self, button: Button, display: &mut dyn DisplaySink) -> Result<InfoOutcome> {
        match button {
            Button::Down if self.current + 1 < self.pages.len() => {
                self.current += 1;
                self.draw(display)?;
            }
            Button::Up if self.current > 0 => {
                self.current -= 1;
                self.draw(display)?;
            }
            Button::Back => return Ok(InfoOutcome::Close),
            Button::Select if self.dismiss_on_select => return Ok(InfoOutcome::Close),
            _ => {}
        }
        Ok(InfoOutcome::Stay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemoryDisplay;

    fn screen() -> (InfoScreen, MemoryDisplay) {
        let mut screen = InfoScreen::new(vec![
            InfoPage::new("eth0 IP", "192.168.1.20"),
            InfoPage::new("Gateway", ""),
            InfoPage::new("DNS", "1.1.1.1"),
        ]);
        let mut display = MemoryDisplay::new();
        screen.initialize(&mut display).unwrap();
        (screen, display)
    }

    #[test]
    fn pages_forward_and_back_without_wrapping() {
        let (mut screen, mut display) = screen();
        assert_eq!(display.line(0), "eth0 IP");
        assert_eq!(display.line(1), "192.168.1.20");

        screen.handle(Button::Up, &mut display).unwrap();
        assert_eq!(screen.current(), 0);

        for _ in 0..5 {
            screen.handle(Button::Down, &mut display).unwrap();
        }
        assert_eq!(screen.current(), 2);
        assert_eq!(display.line(0), "DNS");
    }

    #[test]
    fn missing_value_leaves_blank_row() {
        let (mut screen, mut display) = screen();
        screen.handle(Button::Down, &mut display).unwrap();
        assert_eq!(display.line(0), "Gateway");
        assert_eq!(display.line(1), "");
    }

    #[test]
    fn select_only_dismisses_messages() {
        let (mut screen, mut display) = screen();
        assert_eq!(screen.handle(Button::Select, &mut display).unwrap(), InfoOutcome::Stay);
        assert_eq!(screen.handle(Button::Back, &mut display).unwrap(), InfoOutcome::Close);

        let mut message = InfoScreen::message("Address set", "eth0");
        message.initialize(&mut display).unwrap();
        assert_eq!(display.line(0), "Address set");
        assert_eq!(message.handle(Button::Select, &mut display).unwrap(), InfoOutcome::Close);
    }

    #[test]
    fn long_values_keep_both_ends() {
        let mut screen = InfoScreen::new(vec![InfoPage::new(
            "Host",
            "fe80::1234:5678:9abc:def0",
        )]);
        let mut display = MemoryDisplay::new();
        screen.initialize(&mut display).unwrap();
        assert_eq!(display.row(1).chars().count(), 16);
        assert!(display.line(1).starts_with("fe80::1"));
        assert!(display.line(1).ends_with("def0"));
    }
}
