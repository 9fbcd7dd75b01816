//! Octet-by-octet IPv4 entry driven by the four buttons.

use std::net::Ipv4Addr;

use anyhow::Result;

use crate::display::DisplaySink;
use crate::input::Button;
use crate::util::fit_line;

const FIELD_COUNT: usize = 4;
/// Each octet occupies three digits plus the separating dot.
const FIELD_WIDTH: u8 = 4;
const VALUE_ROW: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Pending,
    Committed(String),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct IpFieldEditor {
    label: String,
    octets: [u8; FIELD_COUNT],
    is_netmask: bool,
    active_field: usize,
    editing: bool,
}

impl IpFieldEditor {
    /// Draws the label and seed value and parks a blinking cursor on the first
    /// octet. Seeds that do not parse as IPv4 start from zero, and every
    /// seeded octet is clamped into its field's range.
    pub fn begin(
        seed: &str,
        label: &str,
        is_netmask: bool,
        display: &mut dyn DisplaySink,
    ) -> Result<Self> {
        let mut octets = seed
            .trim()
            .parse::<Ipv4Addr>()
            .map(|addr| addr.octets())
            .unwrap_or([0; FIELD_COUNT]);
        for (field, octet) in octets.iter_mut().enumerate() {
            let (min, max) = field_bounds(field, is_netmask);
            // Bounds are within 0..=255.
            *octet = i16::from(*octet).clamp(min, max) as u8;
        }
        let editor = Self {
            label: label.to_string(),
            octets,
            is_netmask,
            active_field: 0,
            editing: true,
        };
        editor.redraw(display)?;
        Ok(editor)
    }

    pub fn octets(&self) -> [u8; FIELD_COUNT] {
        self.octets
    }

    pub fn active_field(&self) -> usize {
        self.active_field
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn value(&self) -> String {
        Ipv4Addr::from(self.octets).to_string()
    }

    /// Full repaint, used on entry and when waking from the screen saver.
    pub fn redraw(&self, display: &mut dyn DisplaySink) -> Result<()> {
        display.clear()?;
        display.print_at(0, 0, &fit_line(&self.label))?;
        display.print_at(0, VALUE_ROW, &padded(&self.octets))?;
        display.set_cursor(field_column(self.active_field), VALUE_ROW)?;
        display.set_cursor_visible(true)?;
        display.set_cursor_blink(true)
    }

    pub fn handle(&mut self, button: Button, display: &mut dyn DisplaySink) -> Result<EditOutcome> {
        if !self.editing {
            return Ok(EditOutcome::Pending);
        }
        match button {
            Button::Up => {
                self.step(1);
                self.redraw_field(display)?;
            }
            Button::Down => {
                self.step(-1);
                self.redraw_field(display)?;
            }
            Button::Select => {
                if self.active_field == FIELD_COUNT - 1 {
                    self.finish(display)?;
                    return Ok(EditOutcome::Committed(self.value()));
                }
                self.active_field += 1;
                display.set_cursor(field_column(self.active_field), VALUE_ROW)?;
            }
            Button::Back => {
                if self.active_field == 0 {
                    self.octets[0] = 0;
                    self.finish(display)?;
                    return Ok(EditOutcome::Cancelled);
                }
                self.active_field -= 1;
                display.set_cursor(field_column(self.active_field), VALUE_ROW)?;
            }
        }
        Ok(EditOutcome::Pending)
    }

    fn step(&mut self, delta: i16) {
        let (min, max) = field_bounds(self.active_field, self.is_netmask);
        let next = i16::from(self.octets[self.active_field]) + delta;
        let wrapped = if next > max {
            min
        } else if next < min {
            max
        } else {
            next
        };
        // Bounds are within 0..=255.
        self.octets[self.active_field] = wrapped as u8;
    }

    fn redraw_field(&self, display: &mut dyn DisplaySink) -> Result<()> {
        let column = field_column(self.active_field);
        display.print_at(column, VALUE_ROW, &format!("{:03}", self.octets[self.active_field]))?;
        display.set_cursor(column, VALUE_ROW)
    }

    fn finish(&mut self, display: &mut dyn DisplaySink) -> Result<()> {
        self.editing = false;
        display.set_cursor_blink(false)?;
        display.set_cursor_visible(false)
    }
}

fn field_bounds(field: usize, is_netmask: bool) -> (i16, i16) {
    let min = if field == 0 && !is_netmask { 1 } else { 0 };
    let max = if is_netmask { 255 } else { 254 };
    (min, max)
}

fn field_column(field: usize) -> u8 {
    field as u8 * FIELD_WIDTH
}

fn padded(octets: &[u8; FIELD_COUNT]) -> String {
    octets
        .iter()
        .map(|octet| format!("{octet:03}"))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayOp, MemoryDisplay};

    fn editor(seed: &str, netmask: bool) -> (IpFieldEditor, MemoryDisplay) {
        let mut display = MemoryDisplay::new();
        let editor = IpFieldEditor::begin(seed, "IP Address", netmask, &mut display).unwrap();
        (editor, display)
    }

    fn press(editor: &mut IpFieldEditor, display: &mut MemoryDisplay, buttons: &[Button]) -> EditOutcome {
        let mut outcome = EditOutcome::Pending;
        for button in buttons {
            outcome = editor.handle(*button, display).unwrap();
        }
        outcome
    }

    #[test]
    fn begin_draws_label_padded_value_and_blinking_cursor() {
        let (editor, display) = editor("10.0.5.1", false);
        assert_eq!(display.line(0), "IP Address");
        assert_eq!(display.line(1), "010.000.005.001");
        assert_eq!(display.cursor(), (0, 1));
        assert!(display.cursor_visible);
        assert!(display.cursor_blink);
        assert!(editor.is_editing());
    }

    #[test]
    fn unparseable_seed_starts_from_lowest_address() {
        let (editor, display) = editor("", false);
        assert_eq!(editor.octets(), [1, 0, 0, 0]);
        assert_eq!(display.line(1), "001.000.000.000");
    }

    #[test]
    fn unparseable_netmask_seed_starts_from_zero() {
        let (editor, display) = editor("not an address", true);
        assert_eq!(editor.octets(), [0, 0, 0, 0]);
        assert_eq!(display.line(1), "000.000.000.000");
    }

    #[test]
    fn seed_octets_are_clamped_into_field_ranges() {
        let (mut editor, mut display) = editor("255.255.0.255", false);
        assert_eq!(editor.octets(), [254, 254, 0, 254]);
        assert_eq!(display.line(1), "254.254.000.254");
        let outcome = press(&mut editor, &mut display, &[Button::Select; 4]);
        assert_eq!(outcome, EditOutcome::Committed("254.254.0.254".into()));

        let (editor, _) = self::editor("0.0.0.0", false);
        assert_eq!(editor.octets(), [1, 0, 0, 0]);

        let (editor, _) = self::editor("255.255.255.255", true);
        assert_eq!(editor.octets(), [255, 255, 255, 255]);
    }

    #[test]
    fn first_octet_wraps_between_one_and_254() {
        let (mut editor, mut display) = editor("254.1.1.1", false);
        press(&mut editor, &mut display, &[Button::Up]);
        assert_eq!(editor.octets()[0], 1);
        press(&mut editor, &mut display, &[Button::Down]);
        assert_eq!(editor.octets()[0], 254);
        assert_eq!(display.line(1), "254.001.001.001");
    }

    #[test]
    fn other_octets_wrap_between_zero_and_254() {
        let (mut editor, mut display) = editor("1.254.0.1", false);
        press(&mut editor, &mut display, &[Button::Select, Button::Up]);
        assert_eq!(editor.octets()[1], 0);
        press(&mut editor, &mut display, &[Button::Select, Button::Down]);
        assert_eq!(editor.octets()[2], 254);
    }

    #[test]
    fn netmask_wraps_between_zero_and_255() {
        let (mut editor, mut display) = editor("255.255.255.0", true);
        press(&mut editor, &mut display, &[Button::Up]);
        assert_eq!(editor.octets()[0], 0);
        press(&mut editor, &mut display, &[Button::Down]);
        assert_eq!(editor.octets()[0], 255);
    }

    #[test]
    fn value_change_repaints_only_the_active_group() {
        let (mut editor, mut display) = editor("192.168.1.10", false);
        press(&mut editor, &mut display, &[Button::Select, Button::Select]);
        display.take_ops();
        press(&mut editor, &mut display, &[Button::Up]);
        assert_eq!(
            display.take_ops(),
            vec![
                DisplayOp::SetCursor(8, 1),
                DisplayOp::Write("002".into()),
                DisplayOp::SetCursor(8, 1),
            ]
        );
        assert_eq!(display.line(1), "192.168.002.010");
    }

    #[test]
    fn select_and_back_move_between_fixed_columns() {
        let (mut editor, mut display) = editor("1.2.3.4", false);
        for expected in [4, 8, 12] {
            press(&mut editor, &mut display, &[Button::Select]);
            assert_eq!(display.cursor(), (expected, 1));
        }
        for expected in [8, 4, 0] {
            press(&mut editor, &mut display, &[Button::Back]);
            assert_eq!(display.cursor(), (expected, 1));
        }
        assert_eq!(editor.active_field(), 0);
    }

    #[test]
    fn four_selects_commit_the_seed_unpadded() {
        let (mut editor, mut display) = editor("192.168.187.84", false);
        let outcome = press(&mut editor, &mut display, &[Button::Select; 4]);
        assert_eq!(outcome, EditOutcome::Committed("192.168.187.84".into()));
        assert!(!display.cursor_blink);
        assert!(!display.cursor_visible);
        assert!(!editor.is_editing());
    }

    #[test]
    fn commit_reflects_edits_without_padding() {
        let (mut editor, mut display) = editor("10.0.0.9", false);
        let outcome = press(
            &mut editor,
            &mut display,
            &[Button::Select, Button::Select, Button::Select, Button::Up, Button::Select],
        );
        assert_eq!(outcome, EditOutcome::Committed("10.0.0.10".into()));
    }

    #[test]
    fn back_from_first_field_cancels_and_zeroes_it() {
        let (mut editor, mut display) = editor("192.168.187.84", false);
        let outcome = press(
            &mut editor,
            &mut display,
            &[Button::Select, Button::Up, Button::Back, Button::Back],
        );
        assert_eq!(outcome, EditOutcome::Cancelled);
        assert_eq!(editor.octets(), [0, 169, 187, 84]);
        assert!(!display.cursor_blink);
        assert!(!display.cursor_visible);
    }

    #[test]
    fn input_after_finish_is_ignored() {
        let (mut editor, mut display) = editor("1.1.1.1", false);
        press(&mut editor, &mut display, &[Button::Back]);
        display.take_ops();
        assert_eq!(
            editor.handle(Button::Up, &mut display).unwrap(),
            EditOutcome::Pending
        );
        assert!(display.ops().is_empty());
    }
}
