pub mod audio;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod intercept;
pub mod link;
pub mod main_loop;
pub mod metadata;
mod net;
pub mod protocol;

pub use crate::audio::{
    AudioIngest, BufferState, IngestOutcome, IngestStats, SegmentBuffer, StreamingAudioBuffer,
};
pub use crate::config::{BridgeConfig, ReconnectStrategy};
pub use crate::error::{BridgeError, CatalogError, IngestError, LinkError};
pub use crate::host::MediaHost;
pub use crate::intercept::{Interception, LocalEvent};
pub use crate::link::{RemoteLink, RemoteLinkState};
pub use crate::main_loop::MainLoop;
pub use crate::metadata::{reconcile, Reconciled, TrackMetadata};
pub use crate::protocol::{InboundMsg, INBOUND_CAP, OUTBOUND_CAP};
