use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use focus_algo::FrameLandmarks;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::source::{LandmarkSource, SourceError};

/// One line of a recording: a landmark array (`[]` for no face) or a
/// failed detection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Frame(FrameLandmarks),
    Error { error: String },
}

/// Plays back recorded detector output from a JSON-lines file at a fixed
/// frame rate.
pub struct ReplaySource {
    path: PathBuf,
    frame_interval: Duration,
    lines: Option<Lines<BufReader<File>>>,
    pacing: Option<Interval>,
    line_no: u64,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>, frame_interval: Duration) -> Self {
        Self {
            path: path.into(),
            frame_interval,
            lines: None,
            pacing: None,
            line_no: 0,
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

#[async_trait]
impl LandmarkSource for ReplaySource {
    async fn open(&mut self) -> Result<(), SourceError> {
        let file = File::open(&self.path).await?;
        if !file.metadata().await?.is_file() {
            return Err(SourceError::Unavailable(format!(
                "{} is not a regular file",
                self.path.display()
            )));
        }
        self.lines = Some(BufReader::new(file).lines());

        if !self.frame_interval.is_zero() {
            let mut pacing = tokio::time::interval(self.frame_interval);
            pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.pacing = Some(pacing);
        }

        info!(
            path = %self.path.display(),
            interval_ms = self.frame_interval.as_millis() as u64,
            "replay opened"
        );
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<FrameLandmarks, SourceError> {
        if let Some(pacing) = self.pacing.as_mut() {
            pacing.tick().await;
        }

        let lines = self.lines.as_mut().ok_or(SourceError::Closed)?;
        loop {
            let Some(line) = lines.next_line().await? else {
                return Err(SourceError::Closed);
            };
            self.line_no += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return match serde_json::from_str::<ReplayLine>(line) {
                Ok(ReplayLine::Frame(frame)) => Ok(frame),
                Ok(ReplayLine::Error { error }) => Err(SourceError::Frame(error)),
                Err(e) => Err(SourceError::Frame(format!("line {}: {e}", self.line_no))),
            };
        }
    }

    async fn close(&mut self) {
        if self.lines.take().is_some() {
            debug!(path = %self.path.display(), lines = self.line_no, "replay closed");
        }
        self.pacing = None;
    }
}
