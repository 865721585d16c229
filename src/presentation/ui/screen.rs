//! Incremental terminal renderer.
//!
//! The screen is split into a scroll region holding the scrollback, one
//! divider row and the input row at the bottom. Appends while following draw
//! only the new rows; everything else goes through [`Screen::repaint`].

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType, ScrollUp},
};

use crate::application::services::format_log;
use crate::application::services::style::{DARKEN, RESET};
use crate::presentation::widgets::{InputEditor, PaneUpdate, Scrollback};

const RESERVED_ROWS: u16 = 2;
const RESET_SCROLL_REGION: &str = "\x1b[r";

fn set_scroll_region(rows: u16) -> String {
    format!("\x1b[1;{rows}r")
}

pub struct Screen<W: Write> {
    out: W,
    pane: Scrollback,
    input: InputEditor,
    width: u16,
    height: u16,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W, width: u16, height: u16, capacity: usize) -> Self {
        let width = width.max(1);
        let height = height.max(RESERVED_ROWS + 1);
        let view = usize::from(height - RESERVED_ROWS);
        Self {
            out,
            pane: Scrollback::new(capacity, usize::from(width), view),
            input: InputEditor::new(usize::from(width)),
            width,
            height,
        }
    }

    fn view_height(&self) -> u16 {
        self.height - RESERVED_ROWS
    }

    fn divider_row(&self) -> u16 {
        self.height - 2
    }

    fn input_row(&self) -> u16 {
        self.height - 1
    }

    #[must_use]
    pub const fn pane(&self) -> &Scrollback {
        &self.pane
    }

    #[must_use]
    pub const fn input(&self) -> &InputEditor {
        &self.input
    }

    /// Indents wrapped lines by the width of the message prefix.
    pub fn set_continuation_indent(&mut self, indent: usize) {
        self.pane.set_indent(indent);
    }

    /// Draws the empty layout.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn init(&mut self) -> io::Result<()> {
        let region = set_scroll_region(self.view_height());
        queue!(self.out, Clear(ClearType::All), Print(region))?;
        self.queue_divider()?;
        self.queue_input()?;
        self.out.flush()
    }

    /// Appends a formatted entry to the scrollback.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn append(&mut self, entry: impl Into<String>) -> io::Result<()> {
        match self.pane.push(entry) {
            PaneUpdate::None => Ok(()),
            PaneUpdate::Repaint => self.repaint(),
            PaneUpdate::Append {
                start_row,
                scroll,
                lines,
            } => {
                if scroll > 0 {
                    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
                    let bottom = self.view_height() - 1;
                    queue!(self.out, MoveTo(0, bottom), ScrollUp(scroll))?;
                }
                for (i, line) in lines.iter().enumerate() {
                    let row = u16::try_from(start_row + i).unwrap_or(u16::MAX);
                    queue!(
                        self.out,
                        MoveTo(0, row),
                        Print(line),
                        Clear(ClearType::UntilNewLine)
                    )?;
                }
                self.queue_input()?;
                self.out.flush()
            }
        }
    }

    /// Appends a client notice.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn log(&mut self, text: &str) -> io::Result<()> {
        self.append(format_log(text))
    }

    /// Redraws the whole scroll region from the scrollback.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn repaint(&mut self) -> io::Result<()> {
        let rows = self.view_height();
        let visible: Vec<String> = self.pane.visible().map(str::to_string).collect();
        for row in 0..rows {
            queue!(self.out, MoveTo(0, row))?;
            if let Some(line) = visible.get(usize::from(row)) {
                queue!(self.out, Print(line))?;
            }
            queue!(self.out, Clear(ClearType::UntilNewLine))?;
        }
        self.queue_input()?;
        self.out.flush()
    }

    /// Scrolls the view by `delta` rows, negative going back.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn scroll(&mut self, delta: isize) -> io::Result<()> {
        if self.pane.scroll(delta) {
            self.repaint()?;
        }
        Ok(())
    }

    /// Scrolls by whole viewports.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn scroll_pages(&mut self, pages: isize) -> io::Result<()> {
        let rows = isize::try_from(self.pane.height()).unwrap_or(isize::MAX);
        self.scroll(pages.saturating_mul(rows))
    }

    /// Adopts a new terminal size and redraws everything.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn resize(&mut self, width: u16, height: u16) -> io::Result<()> {
        self.width = width.max(1);
        self.height = height.max(RESERVED_ROWS + 1);
        let (columns, rows) = (usize::from(self.width), usize::from(self.view_height()));
        self.pane.resize(columns, rows);
        self.input.resize(usize::from(self.width));

        let region = set_scroll_region(self.view_height());
        queue!(
            self.out,
            Print(RESET_SCROLL_REGION),
            Clear(ClearType::All),
            Print(region)
        )?;
        self.queue_divider()?;
        self.repaint()
    }

    /// Applies an edit to the input line and redraws only that row.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn edit(&mut self, edit: impl FnOnce(&mut InputEditor)) -> io::Result<()> {
        edit(&mut self.input);
        self.queue_input()?;
        self.out.flush()
    }

    /// Takes the committed line out of the input editor.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn commit(&mut self) -> io::Result<String> {
        let line = self.input.commit();
        self.queue_input()?;
        self.out.flush()?;
        Ok(line)
    }

    /// Releases the scroll region and parks the cursor below the layout.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn finish(&mut self) -> io::Result<()> {
        let row = self.input_row();
        queue!(
            self.out,
            Print(RESET_SCROLL_REGION),
            MoveTo(0, row),
            Clear(ClearType::CurrentLine),
            Print("\r\n")
        )?;
        self.out.flush()
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn queue_divider(&mut self) -> io::Result<()> {
        let rule = format!("{DARKEN}{}{RESET}", "─".repeat(usize::from(self.width)));
        let row = self.divider_row();
        queue!(self.out, MoveTo(0, row), Print(rule))
    }

    fn queue_input(&mut self) -> io::Result<()> {
        let column = u16::try_from(self.input.cursor_column()).unwrap_or(u16::MAX);
        let row = self.input_row();
        let rendered = self.input.render();
        queue!(
            self.out,
            MoveTo(0, row),
            Print(rendered),
            MoveTo(column, row)
        )
    }
}
