use crate::protocol::{PlaybackAction, RelayMessage};

pub fn encode(action: PlaybackAction) -> RelayMessage {
    RelayMessage { action }
}

pub fn to_text(msg: &RelayMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}
