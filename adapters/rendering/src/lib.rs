#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for cops-and-robbers adapters.
//!
//! The renderer never decides anything about the game: it copies the board
//! under the shared lock into a [`Frame`] and hands that snapshot to a
//! [`FrameSink`] outside the lock.

use std::{fmt::Write as _, io::Write, time::Duration};

use anyhow::{Context, Result as AnyResult};
use cops_and_robbers_coordination::Coordinator;
use cops_and_robbers_core::{Cell, MatchOutcome};
use cops_and_robbers_world::{GameState, Grid};
use tracing::{debug, info};

/// RGB color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel intensity.
    pub red: u8,
    /// Green channel intensity.
    pub green: u8,
    /// Blue channel intensity.
    pub blue: u8,
}

impl Color {
    /// Creates a color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
        }
    }
}

fn lighten_channel(channel: u8, amount: f32) -> u8 {
    let channel = f32::from(channel);
    let lightened = channel + (255.0 - channel) * amount;
    lightened.round().clamp(0.0, 255.0) as u8
}

/// Symbol and color a cell is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Glyph {
    /// Character printed for the cell.
    pub symbol: char,
    /// Foreground color of the character.
    pub color: Color,
}

const WALL_COLOR: Color = Color::from_rgb_u8(150, 150, 160);

impl Glyph {
    /// Glyph used for `cell`.
    #[must_use]
    pub fn for_cell(cell: Cell) -> Self {
        match cell {
            Cell::Empty => Self::new('·', Color::from_rgb_u8(70, 70, 80)),
            Cell::Wall => Self::new('o', WALL_COLOR.lighten(0.4)),
            Cell::Money => Self::new('$', Color::from_rgb_u8(240, 200, 40)),
            Cell::Cop => Self::new('#', Color::from_rgb_u8(60, 120, 255)),
            Cell::Robber => Self::new('@', Color::from_rgb_u8(230, 50, 50)),
        }
    }

    const fn new(symbol: char, color: Color) -> Self {
        Self { symbol, color }
    }
}

/// Snapshot of the board taken in one critical section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    grid: Grid,
    money_remaining: u32,
    cop_count: usize,
    outcome: Option<MatchOutcome>,
}

impl Frame {
    /// Copies everything the renderer shows out of `state`.
    #[must_use]
    pub fn capture(state: &GameState) -> Self {
        Self {
            grid: state.grid().clone(),
            money_remaining: state.money_remaining(),
            cop_count: state.cops().len(),
            outcome: None,
        }
    }

    /// Attaches the match outcome, shown in the status line.
    #[must_use]
    pub fn with_outcome(mut self, outcome: Option<MatchOutcome>) -> Self {
        self.outcome = outcome;
        self
    }

    /// Side length of the captured board.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.grid.size()
    }

    /// Money cells left when the frame was captured.
    #[must_use]
    pub const fn money_remaining(&self) -> u32 {
        self.money_remaining
    }

    /// Number of cops on the board.
    #[must_use]
    pub const fn cop_count(&self) -> usize {
        self.cop_count
    }

    /// Outcome attached with [`Frame::with_outcome`].
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Glyphs of the board, row by row.
    pub fn glyph_rows(&self) -> impl Iterator<Item = Vec<Glyph>> + '_ {
        self.grid
            .rows()
            .map(|row| row.iter().copied().map(Glyph::for_cell).collect())
    }

    /// Text shown below the board.
    #[must_use]
    pub fn status_line(&self) -> String {
        let mut status = format!(
            "money left: {}  cops: {}",
            self.money_remaining, self.cop_count
        );
        match self.outcome {
            Some(outcome) => {
                let _ = write!(status, "  {}", outcome.banner());
            }
            None => status.push_str("  move: wasd/hjkl/arrows  quit: q"),
        }
        status
    }

    /// Plain-text rendering: one line per board row, then the status line.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for row in self.glyph_rows() {
            text.extend(row.iter().map(|glyph| glyph.symbol));
            text.push('\n');
        }
        text.push_str(&self.status_line());
        text.push('\n');
        text
    }
}

/// Destination for rendered frames.
pub trait FrameSink {
    /// Presents one frame.
    fn present(&mut self, frame: &Frame) -> AnyResult<()>;
}

/// Writes frames as plain text to any writer.
#[derive(Debug)]
pub struct TextSink<W> {
    writer: W,
    presented: usize,
}

impl<W: Write> TextSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            presented: 0,
        }
    }

    /// Number of frames written so far.
    #[must_use]
    pub const fn presented(&self) -> usize {
        self.presented
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for TextSink<W> {
    fn present(&mut self, frame: &Frame) -> AnyResult<()> {
        self.writer
            .write_all(frame.to_text().as_bytes())
            .context("failed to write frame")?;
        self.writer.flush().context("failed to flush frame")?;
        self.presented += 1;
        Ok(())
    }
}

/// Redraws the board every `interval` until the match ends.
///
/// One last frame, carrying the outcome, is drawn after shutdown.
pub fn run<S>(coordinator: &Coordinator, sink: &mut S, interval: Duration) -> AnyResult<()>
where
    S: FrameSink + ?Sized,
{
    info!("renderer started");
    let mut frames = 0_u64;
    loop {
        let frame = coordinator.read_exclusive(Frame::capture);
        sink.present(&frame)?;
        frames += 1;
        if !coordinator.wait_tick(interval) {
            break;
        }
    }

    let last = coordinator
        .read_exclusive(Frame::capture)
        .with_outcome(coordinator.outcome());
    sink.present(&last)?;
    debug!(frames = frames + 1, "renderer stopped");
    Ok(())
}
