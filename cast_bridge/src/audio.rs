use crate::error::IngestError;
use crate::host::MediaHost;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// Browser `atob` rules: padding optional, stray low bits ignored.
const CHUNK_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Open,
    Updating,
    Closed,
}

/// Playback-side buffer that accepts MP3 bytes one append at a time.
pub trait StreamingAudioBuffer {
    fn ready_state(&self) -> BufferState;
    fn append(&self, bytes: Vec<u8>) -> Result<(), BufferState>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Appended { bytes: usize },
    Dropped { state: BufferState },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub appended: u64,
    pub dropped: u64,
}

pub struct AudioIngest {
    buffer: Box<dyn StreamingAudioBuffer>,
    stats: IngestStats,
}

impl AudioIngest {
    pub fn new(buffer: Box<dyn StreamingAudioBuffer>) -> Self {
        Self {
            buffer,
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Decode one base64 chunk and append it if the buffer is idle. A busy or
    /// closed buffer drops the chunk silently. Playback is kicked afterwards
    /// if it is paused.
    pub fn ingest(
        &mut self,
        chunk: &str,
        host: &dyn MediaHost,
    ) -> Result<IngestOutcome, IngestError> {
        let compact: String = chunk.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = CHUNK_ENGINE.decode(compact)?;

        let outcome = match self.buffer.ready_state() {
            BufferState::Open => {
                let len = bytes.len();
                match self.buffer.append(bytes) {
                    Ok(()) => IngestOutcome::Appended { bytes: len },
                    Err(state) => IngestOutcome::Dropped { state },
                }
            }
            state => IngestOutcome::Dropped { state },
        };

        match &outcome {
            IngestOutcome::Appended { .. } => self.stats.appended += 1,
            IngestOutcome::Dropped { state } => {
                self.stats.dropped += 1;
                debug!(?state, dropped = self.stats.dropped, "audio chunk dropped");
            }
        }

        if host.audio_paused() {
            if let Err(e) = host.play_audio() {
                warn!("error playing audio: {e}");
            }
        }

        Ok(outcome)
    }
}

#[derive(Debug)]
struct SegmentState {
    state: BufferState,
    pending: VecDeque<Vec<u8>>,
}

/// In-process `StreamingAudioBuffer`. Each append leaves the buffer
/// `Updating` until the playback side calls `finish_update`.
#[derive(Debug, Clone)]
pub struct SegmentBuffer {
    inner: Arc<Mutex<SegmentState>>,
}

impl Default for SegmentBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentBuffer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SegmentState {
                state: BufferState::Open,
                pending: VecDeque::new(),
            })),
        }
    }

    pub fn finish_update(&self) {
        if let Ok(mut g) = self.inner.lock() {
            if g.state == BufferState::Updating {
                g.state = BufferState::Open;
            }
        }
    }

    /// Drain appended segments, oldest first.
    pub fn take_pending(&self) -> Vec<Vec<u8>> {
        match self.inner.lock() {
            Ok(mut g) => g.pending.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn close(&self) {
        if let Ok(mut g) = self.inner.lock() {
            g.state = BufferState::Closed;
        }
    }
}

impl StreamingAudioBuffer for SegmentBuffer {
    fn ready_state(&self) -> BufferState {
        self.inner
            .lock()
            .map(|g| g.state)
            .unwrap_or(BufferState::Closed)
    }

    fn append(&self, bytes: Vec<u8>) -> Result<(), BufferState> {
        let Ok(mut g) = self.inner.lock() else {
            return Err(BufferState::Closed);
        };
        if g.state != BufferState::Open {
            return Err(g.state);
        }
        g.pending.push_back(bytes);
        g.state = BufferState::Updating;
        Ok(())
    }
}
