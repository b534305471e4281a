#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use focus_algo::synthetic::SyntheticFace;
use focus_algo::FrameLandmarks;
use focus_engine::{LandmarkSource, SourceError};

pub fn attentive_face() -> FrameLandmarks {
    SyntheticFace::new().build()
}

pub fn no_face() -> FrameLandmarks {
    FrameLandmarks::empty()
}

/// Lets spawned loops drain their queues without crossing a tick.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Sleeps until `secs` seconds after `start` on the paused test clock.
pub async fn sleep_until(start: tokio::time::Instant, secs: f64) {
    tokio::time::sleep_until(start + Duration::from_secs_f64(secs)).await;
}

/// Records lifecycle calls made by the session.
#[derive(Debug, Clone, Default)]
pub struct SourceProbe {
    pub opened: Arc<AtomicU32>,
    pub closed: Arc<AtomicBool>,
}

impl SourceProbe {
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A camera that cannot be acquired.
pub struct UnavailableSource {
    pub probe: SourceProbe,
}

#[async_trait]
impl LandmarkSource for UnavailableSource {
    async fn open(&mut self) -> Result<(), SourceError> {
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Err(SourceError::Unavailable("camera permission denied".into()))
    }

    async fn next_frame(&mut self) -> Result<FrameLandmarks, SourceError> {
        panic!("next_frame called on a source that never opened");
    }

    async fn close(&mut self) {
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}

/// A source that stays open but never produces a frame.
pub struct SilentSource {
    pub probe: SourceProbe,
}

#[async_trait]
impl LandmarkSource for SilentSource {
    async fn open(&mut self) -> Result<(), SourceError> {
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<FrameLandmarks, SourceError> {
        std::future::pending().await
    }

    async fn close(&mut self) {
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}

/// An open source whose `close` blocks until `release` is notified.
pub struct SlowCloseSource {
    pub probe: SourceProbe,
    pub release: Arc<Notify>,
}

#[async_trait]
impl LandmarkSource for SlowCloseSource {
    async fn open(&mut self) -> Result<(), SourceError> {
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<FrameLandmarks, SourceError> {
        std::future::pending().await
    }

    async fn close(&mut self) {
        self.release.notified().await;
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}
