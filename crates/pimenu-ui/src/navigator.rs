//! Two-row paginated list with a prompt glyph, the engine behind every menu.
//!
//! Items are shown two per page. The prompt sits in column 0 of the selected
//! row and labels start at column 2. Moving within a page only repaints the
//! prompt column; crossing a page boundary clears and repaints everything.

use anyhow::Result;

use crate::display::{DisplaySink, LCD_COLUMNS};
use crate::util::fit_to_width;

pub const VISIBLE_ROWS: usize = 2;
pub const PROMPT: &str = ">";
pub const LABEL_COLUMN: u8 = 2;

/// How much of the screen a move repainted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone)]
pub struct MenuNavigator {
    items: Vec<String>,
    current_index: usize,
    cursor_row: usize,
    current_page: usize,
}

impl MenuNavigator {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            current_index: 0,
            cursor_row: 0,
            current_page: 0,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(VISIBLE_ROWS)
    }

    pub fn current_selection(&self) -> Option<(usize, &str)> {
        self.items
            .get(self.current_index)
            .map(|label| (self.current_index, label.as_str()))
    }

    /// Resets to the first item and draws the first page.
    pub fn initialize(&mut self, display: &mut dyn DisplaySink) -> Result<()> {
        self.current_index = 0;
        self.cursor_row = 0;
        self.current_page = 0;
        self.draw_page(display)
    }

    pub fn advance(&mut self, display: &mut dyn DisplaySink) -> Result<Redraw> {
        if self.current_index + 1 >= self.items.len() {
            return Ok(Redraw::None);
        }
        if self.cursor_row == 0 {
            self.current_index += 1;
            self.cursor_row = 1;
            self.move_prompt(display, 0, 1)?;
            return Ok(Redraw::Partial);
        }
        self.current_index += 1;
        self.current_page += 1;
        self.cursor_row = 0;
        self.draw_page(display)?;
        Ok(Redraw::Full)
    }

    pub fn retreat(&mut self, display: &mut dyn DisplaySink) -> Result<Redraw> {
        if self.current_index == 0 {
            return Ok(Redraw::None);
        }
        if self.cursor_row == 1 {
            self.current_index -= 1;
            self.cursor_row = 0;
            self.move_prompt(display, 1, 0)?;
            return Ok(Redraw::Partial);
        }
        self.current_index -= 1;
        self.current_page -= 1;
        self.cursor_row = 1;
        self.draw_page(display)?;
        Ok(Redraw::Full)
    }

    fn move_prompt(&self, display: &mut dyn DisplaySink, from: u8, to: u8) -> Result<()> {
        display.print_at(0, from, " ")?;
        display.print_at(0, to, PROMPT)
    }

    fn draw_page(&self, display: &mut dyn DisplaySink) -> Result<()> {
        display.clear()?;
        if self.items.is_empty() {
            return Ok(());
        }
        let label_width = (LCD_COLUMNS - LABEL_COLUMN) as usize;
        let first = self.current_page * VISIBLE_ROWS;
        for (row, label) in self.items.iter().skip(first).take(VISIBLE_ROWS).enumerate() {
            display.print_at(LABEL_COLUMN, row as u8, &fit_to_width(label, label_width))?;
        }
        display.print_at(0, self.cursor_row as u8, PROMPT)
    }
}
