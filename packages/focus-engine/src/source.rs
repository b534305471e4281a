use async_trait::async_trait;
use focus_algo::FrameLandmarks;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("capture unavailable: {0}")]
    Unavailable(String),
    #[error("landmark detection failed: {0}")]
    Frame(String),
    #[error("landmark source closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera plus landmark detector, as seen by the detection loop.
///
/// `open` acquires the capture resource, `next_frame` yields one detection
/// cycle (an empty frame when no face is visible) and `close` releases the
/// resource. `close` is called exactly once per `open` attempt, including
/// a failed one.
#[async_trait]
pub trait LandmarkSource: Send {
    async fn open(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// `SourceError::Closed` ends the detection loop; any other error only
    /// fails the current frame.
    async fn next_frame(&mut self) -> Result<FrameLandmarks, SourceError>;

    async fn close(&mut self) {}
}

type FrameResult = Result<FrameLandmarks, String>;

/// Frames pushed by a host-side detector.
pub struct ChannelSource {
    rx: mpsc::Receiver<FrameResult>,
}

/// Feeding half of [`ChannelSource`].
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<FrameResult>,
}

pub fn frame_channel(capacity: usize) -> (FrameSender, ChannelSource) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (FrameSender { tx }, ChannelSource { rx })
}

impl FrameSender {
    pub async fn send_frame(&self, frame: FrameLandmarks) -> Result<(), SourceError> {
        self.tx.send(Ok(frame)).await.map_err(|_| SourceError::Closed)
    }

    /// Reports a failed detection cycle.
    pub async fn send_error(&self, message: impl Into<String>) -> Result<(), SourceError> {
        self.tx
            .send(Err(message.into()))
            .await
            .map_err(|_| SourceError::Closed)
    }

    /// Non-blocking variant for detectors that must not stall; returns false
    /// when the frame was dropped.
    pub fn offer_frame(&self, frame: FrameLandmarks) -> bool {
        self.tx.try_send(Ok(frame)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl LandmarkSource for ChannelSource {
    async fn next_frame(&mut self) -> Result<FrameLandmarks, SourceError> {
        match self.rx.recv().await {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(message)) => Err(SourceError::Frame(message)),
            None => Err(SourceError::Closed),
        }
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_algo::Landmark;

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (sender, mut source) = frame_channel(4);
        sender.send_frame(FrameLandmarks::empty()).await.unwrap();
        sender.send_error("model crashed").await.unwrap();
        sender
            .send_frame(FrameLandmarks::new(vec![Landmark::default(); 2]))
            .await
            .unwrap();
        drop(sender);

        assert!(source.next_frame().await.unwrap().is_empty());
        assert!(matches!(
            source.next_frame().await,
            Err(SourceError::Frame(m)) if m == "model crashed"
        ));
        assert_eq!(source.next_frame().await.unwrap().len(), 2);
        assert!(matches!(source.next_frame().await, Err(SourceError::Closed)));
    }

    #[tokio::test]
    async fn test_closed_source_rejects_frames() {
        let (sender, mut source) = frame_channel(1);
        source.close().await;
        assert!(sender.is_closed());
        assert!(sender.send_frame(FrameLandmarks::empty()).await.is_err());
    }

    #[tokio::test]
    async fn test_offer_drops_when_full() {
        let (sender, _source) = frame_channel(1);
        assert!(sender.offer_frame(FrameLandmarks::empty()));
        assert!(!sender.offer_frame(FrameLandmarks::empty()));
    }
}
