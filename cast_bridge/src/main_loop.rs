use crate::audio::{AudioIngest, IngestOutcome, IngestStats, StreamingAudioBuffer};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::host::MediaHost;
use crate::intercept::{self, Interception, LocalEvent};
use crate::link::{RemoteLink, RemoteLinkState};
use crate::metadata;
use crate::protocol::{ChannelAction, ChannelEnvelope, InboundMsg, IncomingMetadataPayload, RelayFrame};
use crossbeam_channel::{Receiver, TryRecvError};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

const LOAD_FAILED_CODE: i32 = 905;

/// Session context: owns the one remote link and the one audio buffer. Every
/// mutation happens inside these methods, driven by the host.
pub struct MainLoop {
    inbound_rx: Receiver<InboundMsg>,
    link: RemoteLink,
    audio: AudioIngest,
    auto_resume: Duration,
}

impl MainLoop {
    pub fn new(
        inbound_rx: Receiver<InboundMsg>,
        config: BridgeConfig,
        buffer: Box<dyn StreamingAudioBuffer>,
    ) -> Self {
        Self {
            inbound_rx,
            link: RemoteLink::new(&config),
            audio: AudioIngest::new(buffer),
            auto_resume: config.auto_resume,
        }
    }

    pub fn tick(&mut self, host: &dyn MediaHost) {
        loop {
            match self.inbound_rx.try_recv() {
                Ok(InboundMsg::CustomMessage { data }) => {
                    if let Err(e) = self.handle_custom_message(host, &data) {
                        warn!("custom message dropped: {e}");
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        for text in self.link.poll() {
            self.handle_relay_frame(host, &text);
        }
    }

    pub fn handle_custom_message(
        &mut self,
        host: &dyn MediaHost,
        data: &Value,
    ) -> Result<(), BridgeError> {
        let envelope: ChannelEnvelope = serde_json::from_value(data.clone())?;

        // A bad address must not swallow the action riding along with it.
        let connected = match envelope.ip.as_deref() {
            Some(ip) => self.link.connect(ip),
            None => Ok(()),
        };
        let dispatched = match envelope.action.as_deref() {
            Some(name) => self.dispatch_action(host, name, &envelope),
            None => Ok(()),
        };
        connected.and(dispatched)
    }

    fn dispatch_action(
        &mut self,
        host: &dyn MediaHost,
        name: &str,
        envelope: &ChannelEnvelope,
    ) -> Result<(), BridgeError> {
        let action = ChannelAction::parse(name)
            .ok_or_else(|| BridgeError::UnrecognizedAction(name.to_string()))?;

        if let Some(relayed) = action.relayed() {
            intercept::forward(&self.link, relayed);
            return Ok(());
        }

        match action {
            ChannelAction::SetMetadata => {
                let payload = envelope
                    .metadata
                    .as_ref()
                    .map(IncomingMetadataPayload::from_value)
                    .unwrap_or_default();
                metadata::synchronize(host, &payload);
            }
            ChannelAction::Stop => host.stop_session(),
            ChannelAction::SendAudio => {
                let chunk = envelope
                    .audio
                    .as_deref()
                    .ok_or(BridgeError::MissingField("audio"))?;
                if let IngestOutcome::Appended { bytes } = self.audio.ingest(chunk, host)? {
                    debug!(bytes, "audio chunk appended");
                }
            }
            ChannelAction::Play
            | ChannelAction::Pause
            | ChannelAction::Next
            | ChannelAction::Previous => {}
        }
        Ok(())
    }

    fn handle_relay_frame(&mut self, host: &dyn MediaHost, text: &str) {
        let frame: RelayFrame = match serde_json::from_str(text) {
            Ok(f) => f,
            Err(e) => {
                warn!("malformed relay frame dropped: {e}");
                return;
            }
        };
        debug!(kind = %frame.kind, "relay frame");
        let payload = IncomingMetadataPayload::from_value(&frame.data);
        metadata::synchronize(host, &payload);
    }

    pub fn intercept(&mut self, event: LocalEvent) -> Interception {
        intercept::intercept(&self.link, event)
    }

    pub fn on_player_error(&self, detailed_code: i32) {
        error!("Detailed Error Code - {detailed_code}");
        if detailed_code == LOAD_FAILED_CODE {
            error!("LOAD_FAILED: Verify the load request is set up properly and the media is able to play.");
        }
    }

    pub fn link_state(&self) -> RemoteLinkState {
        self.link.state()
    }

    pub fn link(&self) -> &RemoteLink {
        &self.link
    }

    /// How much buffered audio the host should hold before auto-resuming.
    pub fn auto_resume(&self) -> Duration {
        self.auto_resume
    }

    pub fn ingest_stats(&self) -> IngestStats {
        self.audio.stats()
    }

    pub fn shutdown(&mut self) {
        self.link.disconnect();
    }
}
