//! Console rendering of the status table.
//!
//! The table is repainted in place: every iteration after the first moves
//! the cursor back up over the previous table before drawing. Rows without
//! a signal are greyed out.

use std::io::{self, Write};

use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use rigscan_common::error::{RigscanError, RigscanResult};

use crate::status::StatusRow;

/// Lines printed besides the device rows: three header lines, one footer
/// line, a blank line and the scanning indicator.
pub const FIXED_LINES: usize = 6;

const SPINNER: [char; 4] = ['|', '\\', '-', '/'];

/// Column titles and widths.
const COLUMNS: [(&str, usize); 7] = [
    ("#", 15),
    ("Device Name", 31),
    ("Can Input & Detect", 20),
    ("Signal Detected", 17),
    ("Active Connection", 19),
    ("Detected Mode", 16),
    ("Pixel Format", 15),
];

/// Consumer of per-iteration status rows.
pub trait StatusRenderer {
    fn render(&mut self, rows: &[StatusRow], iteration: u64) -> RigscanResult<()>;
}

/// Renders the status table to a terminal (or any writer).
pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, rows: &[StatusRow], iteration: u64) -> io::Result<()> {
        if iteration > 0 {
            let lines = u16::try_from(rows.len() + FIXED_LINES).unwrap_or(u16::MAX);
            queue!(self.out, MoveUp(lines))?;
        }

        let border = border_line();
        let titles: Vec<String> = COLUMNS.iter().map(|(title, _)| title.to_string()).collect();
        writeln!(self.out, "{border}")?;
        writeln!(self.out, "{}", table_line(&titles))?;
        writeln!(self.out, "{border}")?;

        for row in rows {
            if row.dimmed {
                queue!(self.out, SetForegroundColor(Color::DarkGrey))?;
            }
            write!(self.out, "{}", table_line(&cells(row)))?;
            if row.dimmed {
                queue!(self.out, ResetColor)?;
            }
            writeln!(self.out)?;
        }

        writeln!(self.out, "{border}")?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "     Scanning... {}",
            SPINNER[(iteration % SPINNER.len() as u64) as usize]
        )?;
        self.out.flush()
    }
}

impl<W: Write> StatusRenderer for ConsoleRenderer<W> {
    fn render(&mut self, rows: &[StatusRow], iteration: u64) -> RigscanResult<()> {
        self.draw(rows, iteration)
            .map_err(|e| RigscanError::render(format!("failed to draw status table: {e}")))
    }
}

fn cells(row: &StatusRow) -> Vec<String> {
    vec![
        row.index.to_string(),
        row.name.clone(),
        yes_no(row.can_input_and_detect).to_string(),
        yes_no(row.signal_detected).to_string(),
        row.active_connection.to_string(),
        row.detected_mode.clone(),
        row.pixel_format.to_string(),
    ]
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn border_line() -> String {
    let mut line = String::from("+");
    for (_, width) in COLUMNS {
        line.push_str(&"-".repeat(width));
        line.push('+');
    }
    line
}

fn table_line(cells: &[String]) -> String {
    let mut line = String::from("|");
    for ((_, width), cell) in COLUMNS.iter().zip(cells) {
        let content: String = cell.chars().take(width - 1).collect();
        line.push_str(&format!(" {content:<w$}|", w = width - 1));
    }
    line
}
