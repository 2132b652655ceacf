use crate::codec;
use crate::link::RemoteLink;
use crate::protocol::{HlsSegmentFormat, LoadRequest, PlaybackAction};
use tracing::debug;

/// Locally-originated playback events, seen before they take effect.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalEvent {
    Play,
    Pause,
    QueueUpdate { jump: i32 },
    Load(LoadRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interception {
    Proceed(LocalEvent),
    Suppress,
}

pub fn intercept(link: &RemoteLink, event: LocalEvent) -> Interception {
    match event {
        LocalEvent::QueueUpdate { jump } => {
            if !link.is_open() {
                return Interception::Proceed(event);
            }
            match jump {
                j if j > 0 => forward(link, PlaybackAction::Next),
                j if j < 0 => forward(link, PlaybackAction::Previous),
                _ => {}
            }
            // The peer owns the queue while linked.
            Interception::Suppress
        }
        LocalEvent::Pause => {
            if link.is_open() {
                forward(link, PlaybackAction::Pause);
            }
            Interception::Proceed(event)
        }
        LocalEvent::Play => {
            if link.is_open() {
                forward(link, PlaybackAction::Play);
            }
            Interception::Proceed(event)
        }
        LocalEvent::Load(mut request) => {
            request.media.hls_segment_format = Some(HlsSegmentFormat::Mp3);
            Interception::Proceed(LocalEvent::Load(request))
        }
    }
}

/// Relay `action` to the peer. A missing or closed link is not an error here.
pub fn forward(link: &RemoteLink, action: PlaybackAction) {
    if let Err(e) = link.send(&codec::encode(action)) {
        debug!(action = action.name(), "not forwarded: {e}");
    }
}
