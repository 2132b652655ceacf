use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackAction {
    Play,
    Pause,
    Next,
    Previous,
    Stop,
}

impl PlaybackAction {
    pub fn name(self) -> &'static str {
        match self {
            PlaybackAction::Play => "play",
            PlaybackAction::Pause => "pause",
            PlaybackAction::Next => "next",
            PlaybackAction::Previous => "previous",
            PlaybackAction::Stop => "stop",
        }
    }
}

/// Outbound message to the controller peer: `{"action": "..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayMessage {
    pub action: PlaybackAction,
}

/// Inbound frame from the controller peer. `type` is carried but never
/// discriminates; every frame's `data` is a track description.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RelayFrame {
    #[serde(rename = "type", default)]
    pub kind: Value,
    #[serde(default)]
    pub data: Value,
}

/// Custom-channel message as sent by the app that launched the receiver.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ChannelEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Play,
    Pause,
    Next,
    Previous,
    SetMetadata,
    Stop,
    SendAudio,
}

impl ChannelAction {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "play" => Some(ChannelAction::Play),
            "pause" => Some(ChannelAction::Pause),
            "next" => Some(ChannelAction::Next),
            "previous" => Some(ChannelAction::Previous),
            "setMetadata" => Some(ChannelAction::SetMetadata),
            "stop" => Some(ChannelAction::Stop),
            "sendChunkedMp3Audio" => Some(ChannelAction::SendAudio),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelAction::Play => "play",
            ChannelAction::Pause => "pause",
            ChannelAction::Next => "next",
            ChannelAction::Previous => "previous",
            ChannelAction::SetMetadata => "setMetadata",
            ChannelAction::Stop => "stop",
            ChannelAction::SendAudio => "sendChunkedMp3Audio",
        }
    }

    /// The relayed playback action, for the four actions that go to the peer.
    pub fn relayed(self) -> Option<PlaybackAction> {
        match self {
            ChannelAction::Play => Some(PlaybackAction::Play),
            ChannelAction::Pause => Some(PlaybackAction::Pause),
            ChannelAction::Next => Some(PlaybackAction::Next),
            ChannelAction::Previous => Some(PlaybackAction::Previous),
            ChannelAction::SetMetadata | ChannelAction::Stop | ChannelAction::SendAudio => None,
        }
    }
}

/// Track description as produced by the controller. Built leniently: missing
/// or non-string fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMetadataPayload {
    pub name: String,
    pub artist_name: String,
    pub album_name: String,
    pub artwork_url: Option<String>,
}

impl IncomingMetadataPayload {
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let artwork_url = value
            .get("artwork")
            .and_then(|a| a.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            name: text("name"),
            artist_name: text("artistName"),
            album_name: text("albumName"),
            artwork_url,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HlsSegmentFormat {
    Aac,
    Ac3,
    Mp3,
    Ts,
    TsAac,
    EAc3,
    Fmp4,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaInformation {
    #[serde(default)]
    pub content_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hls_segment_format: Option<HlsSegmentFormat>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub media: MediaInformation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
}
