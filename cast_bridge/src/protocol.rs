use serde_json::Value;

pub const INBOUND_CAP: usize = 256;
pub const OUTBOUND_CAP: usize = 256;
pub const LINK_EVENT_CAP: usize = 256;

/// Messages the host pushes into the control plane between ticks.
pub enum InboundMsg {
    CustomMessage { data: Value },
}

/// Transport signals from a link's network thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Opened,
    Frame { text: String },
    Faulted { reason: String },
    Closed,
}

pub enum OutboundMsg {
    Send { text: String },
}

pub use cast_protocol::{
    ChannelAction, ChannelEnvelope, HlsSegmentFormat, IncomingMetadataPayload, LoadRequest,
    MediaInformation, PlaybackAction, RelayFrame, RelayMessage,
};
