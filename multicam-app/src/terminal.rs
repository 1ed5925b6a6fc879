//! Terminal operator: true-color half-block preview and single-key commands.
//!
//! Each terminal cell shows two vertically stacked pixels using the upper
//! half block glyph, foreground for the top pixel and background for the
//! bottom one. The last two rows hold the latest log line and the status.

use crate::logging::LogRouter;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use multicam_capture::{CaptureError, Operator, OperatorCommand};
use std::io::{self, Stdout, Write};
use std::sync::mpsc::Receiver;
use std::time::Duration;
use tracing::debug;

const HALF_BLOCK: char = '\u{2580}';

/// Rows below the preview: log line and status line.
const FOOTER_ROWS: u16 = 2;

/// Map a key event to an operator command.
///
/// Raw mode delivers Ctrl-C as a key event instead of SIGINT, so it aborts
/// the session here. Other Ctrl and Alt chords are ignored.
pub fn command_for(key: &KeyEvent) -> Result<Option<OperatorCommand>, CaptureError> {
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }
    let KeyCode::Char(c) = key.code else {
        return Ok(None);
    };
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if c.eq_ignore_ascii_case(&'c') {
            return Err(CaptureError::Interrupted);
        }
        return Ok(None);
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        return Ok(None);
    }
    Ok(OperatorCommand::from_key(c))
}

fn clip(text: &str, cols: u16) -> String {
    text.chars().take(cols as usize).collect()
}

/// Largest size with the image's aspect ratio that fits in `max_w` x `max_h`.
pub fn fit_size(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_w == 0 || max_h == 0 {
        return (0, 0);
    }
    let (width, height) = (width as u64, height as u64);
    let (max_w, max_h) = (max_w as u64, max_h as u64);
    if max_w * height <= max_h * width {
        (max_w as u32, (height * max_w / width).max(1) as u32)
    } else {
        ((width * max_h / height).max(1) as u32, max_h as u32)
    }
}

/// Downscale `image` into rows of (top, bottom) pixel pairs that fit `cols` x `rows` cells.
pub fn halfblock_cells(
    image: &RgbImage,
    cols: u16,
    rows: u16,
) -> Vec<Vec<(Rgb<u8>, Rgb<u8>)>> {
    let (w, h) = fit_size(image.width(), image.height(), cols as u32, rows as u32 * 2);
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let small = if (w, h) == image.dimensions() {
        image.clone()
    } else {
        imageops::resize(image, w, h, FilterType::Triangle)
    };
    let black = Rgb([0, 0, 0]);

    (0..h.div_ceil(2))
        .map(|row| {
            (0..w)
                .map(|x| {
                    let top = *small.get_pixel(x, row * 2);
                    let bottom = if row * 2 + 1 < h {
                        *small.get_pixel(x, row * 2 + 1)
                    } else {
                        black
                    };
                    (top, bottom)
                })
                .collect()
        })
        .collect()
}

fn color(pixel: Rgb<u8>) -> Color {
    let [r, g, b] = pixel.0;
    Color::Rgb { r, g, b }
}

/// Operator that draws into the terminal's alternate screen.
///
/// Log events are taken off stderr while it is active and replayed there
/// once the terminal is restored.
pub struct TerminalOperator {
    out: Stdout,
    poll_interval: Duration,
    captures: u64,
    logs: LogRouter,
    log_rx: Receiver<String>,
    backlog: Vec<String>,
    active: bool,
}

impl TerminalOperator {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn new(poll_interval: Duration, logs: LogRouter) -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        let log_rx = logs.attach();
        if let Err(e) = execute!(out, EnterAlternateScreen, cursor::Hide) {
            logs.detach();
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(Self {
            out,
            poll_interval,
            captures: 0,
            logs,
            log_rx,
            backlog: Vec::new(),
            active: true,
        })
    }

    fn drain_logs(&mut self) {
        self.backlog.extend(self.log_rx.try_iter());
    }

    fn draw(&mut self, preview: &RgbImage) -> io::Result<()> {
        self.drain_logs();
        let (cols, rows) = terminal::size()?;
        let image_rows = rows.saturating_sub(FOOTER_ROWS);
        let cells = halfblock_cells(preview, cols, image_rows);

        queue!(self.out, cursor::MoveTo(0, 0))?;
        for (y, line) in cells.iter().enumerate() {
            queue!(self.out, cursor::MoveTo(0, y as u16))?;
            for &(top, bottom) in line {
                queue!(
                    self.out,
                    SetForegroundColor(color(top)),
                    SetBackgroundColor(color(bottom)),
                    Print(HALF_BLOCK)
                )?;
            }
            queue!(self.out, ResetColor, terminal::Clear(ClearType::UntilNewLine))?;
        }
        queue!(
            self.out,
            cursor::MoveTo(0, cells.len() as u16),
            terminal::Clear(ClearType::FromCursorDown)
        )?;

        let last_log = self.backlog.last().map(String::as_str).unwrap_or("");
        let status = format!(
            "{}x{} preview | {} captured | c: capture  q: quit",
            preview.width(),
            preview.height(),
            self.captures
        );
        queue!(
            self.out,
            cursor::MoveTo(0, image_rows),
            Print(clip(last_log, cols)),
            cursor::MoveTo(0, image_rows + 1),
            Print(clip(&status, cols))
        )?;
        self.out.flush()
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.drain_logs();
        self.logs.detach();
        let restored = execute!(self.out, ResetColor, cursor::Show, LeaveAlternateScreen)
            .and_then(|_| terminal::disable_raw_mode());

        let mut err = io::stderr().lock();
        for line in self.backlog.drain(..) {
            let _ = writeln!(err, "{}", line);
        }
        restored
    }
}

impl Operator for TerminalOperator {
    fn show(&mut self, preview: &RgbImage) -> Result<(), CaptureError> {
        Ok(self.draw(preview)?)
    }

    fn poll_command(&mut self) -> Result<Option<OperatorCommand>, CaptureError> {
        if !event::poll(self.poll_interval)? {
            return Ok(None);
        }
        let command = match event::read()? {
            Event::Key(key) => command_for(&key)?,
            _ => None,
        };
        if command == Some(OperatorCommand::Capture) {
            self.captures += 1;
        }
        debug!("Operator command: {:?}", command);
        Ok(command)
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        Ok(self.restore()?)
    }
}

impl Drop for TerminalOperator {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
