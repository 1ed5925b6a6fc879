//! Interactive capture loop over a fixed set of open streams.
//!
//! Each iteration reads one frame from every source in order, hands the
//! side-by-side preview to the [`Operator`], and reacts to at most one
//! command. Reads are sequential and untimed, so a stalled device stalls
//! the whole loop.

use crate::preview::compose_preview;
use crate::source::{CaptureError, CaptureSource, FrameData};
use crate::store::FrameStore;
use image::RgbImage;
use tracing::{debug, info};

/// Commands the operator can issue between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Save the current frame set.
    Capture,
    /// Stop all streams and leave the loop.
    Quit,
}

impl OperatorCommand {
    /// Map a key press to a command. Keys other than c/C and q/Q are ignored.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'c' | 'C' => Some(Self::Capture),
            'q' | 'Q' => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Display and input side of the capture loop.
pub trait Operator {
    /// Show the combined preview of the latest frame set.
    fn show(&mut self, preview: &RgbImage) -> Result<(), CaptureError>;

    /// Wait briefly for a key and return the command it maps to, if any.
    ///
    /// An error aborts the session without saving the current frame set.
    fn poll_command(&mut self) -> Result<Option<OperatorCommand>, CaptureError>;

    /// Release display resources.
    fn close(&mut self) -> Result<(), CaptureError>;
}

/// What a finished session did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Loop iterations (frame sets read).
    pub iterations: u64,
    /// Frame sets saved to disk.
    pub captures: u64,
}

/// Owns the open streams and the output directories for one operator session.
pub struct CaptureSession {
    sources: Vec<Box<dyn CaptureSource>>,
    store: FrameStore,
    preview_height: u32,
}

impl CaptureSession {
    pub fn new(
        sources: Vec<Box<dyn CaptureSource>>,
        store: FrameStore,
        preview_height: u32,
    ) -> Self {
        Self {
            sources,
            store,
            preview_height,
        }
    }

    /// Read one frame from every source, in source order.
    pub fn grab(&mut self) -> Result<Vec<FrameData>, CaptureError> {
        self.sources
            .iter_mut()
            .map(|source| source.next_frame()?.ok_or(CaptureError::StreamEnded))
            .collect()
    }

    /// Run the loop until the operator quits.
    ///
    /// Streams are stopped and the operator closed on the quit path. On error
    /// the sources are dropped as they are; backends stop their streams in `Drop`.
    pub fn run<O: Operator>(mut self, operator: &mut O) -> Result<SessionSummary, CaptureError> {
        let mut summary = SessionSummary::default();
        info!(
            "Capturing from {} cameras, press c to capture, q to quit",
            self.sources.len()
        );

        loop {
            let frames = self.grab()?;
            summary.iterations += 1;

            let preview = compose_preview(frames.iter().map(|f| &f.image), self.preview_height);
            operator.show(&preview)?;

            match operator.poll_command()? {
                Some(OperatorCommand::Capture) => {
                    self.store.save(&frames)?;
                    summary.captures += 1;
                }
                Some(OperatorCommand::Quit) => break,
                None => {}
            }
        }

        info!("Closing");
        for source in &mut self.sources {
            source.stop();
        }
        operator.close()?;
        debug!(
            "Session finished after {} iterations, {} captures",
            summary.iterations, summary.captures
        );
        Ok(summary)
    }
}
