//! Crossterm plumbing: raw-mode guard, keyboard input and coloured drawing.

use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::{Context, Result};
use cops_and_robbers_core::Direction;
use cops_and_robbers_rendering::{Color, Frame, FrameSink};
use cops_and_robbers_system_evasion::{InputSource, Keystroke};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{self, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::error;

/// Keeps the terminal in raw mode on the alternate screen until dropped.
pub(crate) struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub(crate) fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        let guard = Self { _private: () };
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All)
        )
        .context("failed to enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = execute!(io::stdout(), ResetColor, Show, LeaveAlternateScreen) {
            error!(?err, "failed to leave alternate screen");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            error!(?err, "failed to disable raw mode");
        }
    }
}

/// Reads key presses from the terminal.
pub(crate) struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn next_keystroke(&mut self, timeout: Duration) -> Result<Option<Keystroke>> {
        if !event::poll(timeout).context("failed to poll terminal events")? {
            return Ok(None);
        }
        match event::read().context("failed to read terminal event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(translate(key))),
            _ => Ok(None),
        }
    }
}

fn translate(key: KeyEvent) -> Keystroke {
    match key.code {
        KeyCode::Char('c' | 'C') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Keystroke::Interrupt
        }
        KeyCode::Char(character) => Keystroke::Char(character),
        KeyCode::Up => Keystroke::Arrow(Direction::Up),
        KeyCode::Down => Keystroke::Arrow(Direction::Down),
        KeyCode::Left => Keystroke::Arrow(Direction::Left),
        KeyCode::Right => Keystroke::Arrow(Direction::Right),
        KeyCode::Esc => Keystroke::Escape,
        _ => Keystroke::Other,
    }
}

/// Draws frames with one coloured character per cell.
pub(crate) struct CrosstermSink<W> {
    writer: W,
}

impl<W: Write> CrosstermSink<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> FrameSink for CrosstermSink<W> {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let mut last_row = 0;
        for (index, row) in frame.glyph_rows().enumerate() {
            last_row = terminal_row(index);
            queue!(self.writer, MoveTo(0, last_row))?;
            for glyph in row {
                queue!(
                    self.writer,
                    SetForegroundColor(terminal_color(glyph.color)),
                    Print(glyph.symbol)
                )?;
            }
        }
        queue!(
            self.writer,
            ResetColor,
            MoveTo(0, last_row.saturating_add(1)),
            Clear(ClearType::CurrentLine),
            Print(frame.status_line())
        )?;
        self.writer.flush().context("failed to flush terminal")?;
        Ok(())
    }
}

fn terminal_row(index: usize) -> u16 {
    u16::try_from(index).unwrap_or(u16::MAX)
}

fn terminal_color(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.red,
        g: color.green,
        b: color.blue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cops_and_robbers_core::{CellCoord, MatchOutcome};
    use cops_and_robbers_world::{GameState, Grid};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn arrows_translate_to_directions() {
        assert_eq!(
            translate(press(KeyCode::Left, KeyModifiers::NONE)),
            Keystroke::Arrow(Direction::Left)
        );
        assert_eq!(
            translate(press(KeyCode::Down, KeyModifiers::NONE)),
            Keystroke::Arrow(Direction::Down)
        );
    }

    #[test]
    fn control_c_is_an_interrupt() {
        assert_eq!(
            translate(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Keystroke::Interrupt
        );
        assert_eq!(
            translate(press(KeyCode::Char('c'), KeyModifiers::NONE)),
            Keystroke::Char('c')
        );
        assert_eq!(
            translate(press(KeyCode::Esc, KeyModifiers::NONE)),
            Keystroke::Escape
        );
        assert_eq!(
            translate(press(KeyCode::Tab, KeyModifiers::NONE)),
            Keystroke::Other
        );
    }

    #[test]
    fn sink_writes_every_glyph_and_the_status() {
        let grid = Grid::new(15).expect("grid");
        let state = GameState::new(grid, CellCoord::new(3, 3)).expect("robber");
        let frame = Frame::capture(&state).with_outcome(Some(MatchOutcome::Escaped));
        let mut sink = CrosstermSink::new(Vec::new());

        sink.present(&frame).expect("present");

        let written = String::from_utf8(sink.writer).expect("utf8");
        assert_eq!(written.matches('@').count(), 1);
        assert_eq!(written.matches('·').count(), 15 * 15 - 1);
        assert!(written.contains(MatchOutcome::Escaped.banner()));
    }
}
