use crate::protocol::OUTBOUND_CAP;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectStrategy {
    /// Close the superseded socket (close frame, thread joined), then dial.
    CloseThenOpen,
    /// Drop the superseded socket's channels and dial immediately; the old
    /// thread exits on its next poll without a close handshake.
    ReplaceWithoutClose,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub reconnect: ReconnectStrategy,
    pub connect_timeout: Duration,
    pub poll_interval: Duration,
    pub outbound_cap: usize,
    /// Buffered audio the host waits for before resuming after a stall.
    pub auto_resume: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectStrategy::CloseThenOpen,
            connect_timeout: Duration::from_millis(5_000),
            poll_interval: Duration::from_millis(30),
            outbound_cap: OUTBOUND_CAP,
            auto_resume: Duration::from_secs(5),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            reconnect: reconnect_from_env().unwrap_or(defaults.reconnect),
            connect_timeout: millis_from_env("CAST_BRIDGE_CONNECT_TIMEOUT_MS", 250, 30_000)
                .unwrap_or(defaults.connect_timeout),
            poll_interval: millis_from_env("CAST_BRIDGE_POLL_MS", 5, 500)
                .unwrap_or(defaults.poll_interval),
            outbound_cap: std::env::var("CAST_BRIDGE_OUTBOUND_CAP")
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|cap| *cap > 0)
                .unwrap_or(defaults.outbound_cap),
            auto_resume: millis_from_env("CAST_BRIDGE_AUTO_RESUME_MS", 0, 60_000)
                .unwrap_or(defaults.auto_resume),
        }
    }
}

fn reconnect_from_env() -> Option<ReconnectStrategy> {
    let raw = std::env::var("CAST_BRIDGE_RECONNECT").ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "close" | "close_then_open" | "close-then-open" => Some(ReconnectStrategy::CloseThenOpen),
        "replace" | "replace_without_close" | "replace-without-close" => {
            Some(ReconnectStrategy::ReplaceWithoutClose)
        }
        other => {
            warn!("unknown CAST_BRIDGE_RECONNECT={other:?}, using close_then_open");
            None
        }
    }
}

fn millis_from_env(key: &str, min: u64, max: u64) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms.clamp(min, max))),
        Err(_) => {
            warn!("ignoring non-numeric {key}={raw:?}");
            None
        }
    }
}
