use crate::metadata::TrackMetadata;

/// Capabilities the bridge needs from the receiver's media session.
pub trait MediaHost {
    fn displayed_metadata(&self) -> Option<TrackMetadata>;
    fn set_displayed_metadata(&self, metadata: TrackMetadata);

    fn audio_paused(&self) -> bool;
    fn play_audio(&self) -> Result<(), String>;

    fn stop_session(&self);
}
