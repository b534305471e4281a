pub mod config;
pub mod logging;
pub mod replay;
pub mod session;
pub mod snapshot;
pub mod source;

pub use config::{EngineConfig, ReplayConfig, SessionConfig};
pub use replay::ReplaySource;
pub use session::{FocusSession, SessionError};
pub use snapshot::{FocusSnapshot, SnapshotCell, TrackingStatus};
pub use source::{frame_channel, ChannelSource, FrameSender, LandmarkSource, SourceError};
