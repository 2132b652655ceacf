use crate::codec;
use crate::config::{BridgeConfig, ReconnectStrategy};
use crate::error::{BridgeError, LinkError};
use crate::net::{LinkSettings, LinkThread};
use crate::protocol::{LinkEvent, OutboundMsg, RelayMessage, LINK_EVENT_CAP};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteLinkState {
    Disconnected,
    Connecting,
    Open,
    Closing,
    Faulted,
}

struct ActiveLink {
    url: Url,
    thread: LinkThread,
    out_tx: Sender<OutboundMsg>,
    event_rx: Receiver<LinkEvent>,
}

/// The single socket to the controller peer. Only the control plane touches
/// it; the socket itself lives on a `LinkThread`.
pub struct RemoteLink {
    state: RemoteLinkState,
    active: Option<ActiveLink>,
    strategy: ReconnectStrategy,
    settings: LinkSettings,
    outbound_cap: usize,
}

impl RemoteLink {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            state: RemoteLinkState::Disconnected,
            active: None,
            strategy: config.reconnect,
            settings: LinkSettings {
                connect_timeout: config.connect_timeout,
                poll_interval: config.poll_interval,
            },
            outbound_cap: config.outbound_cap.max(1),
        }
    }

    pub fn state(&self) -> RemoteLinkState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == RemoteLinkState::Open
    }

    pub fn peer(&self) -> Option<&Url> {
        self.active.as_ref().map(|a| &a.url)
    }

    /// Start dialing `address`, replacing any existing link.
    pub fn connect(&mut self, address: &str) -> Result<(), BridgeError> {
        let url = peer_url(address).map_err(|reason| BridgeError::Address {
            address: address.to_string(),
            reason,
        })?;

        self.release();

        let (event_tx, event_rx) = bounded(LINK_EVENT_CAP);
        let (out_tx, out_rx) = bounded(self.outbound_cap);
        let thread = match LinkThread::spawn(url.clone(), self.settings, event_tx, out_rx) {
            Ok(t) => t,
            Err(reason) => {
                self.transition(RemoteLinkState::Faulted);
                return Err(BridgeError::Transport(reason));
            }
        };

        self.transition(RemoteLinkState::Connecting);
        self.active = Some(ActiveLink {
            url,
            thread,
            out_tx,
            event_rx,
        });
        Ok(())
    }

    /// Gracefully close the current link, if any.
    pub fn disconnect(&mut self) {
        let Some(prev) = self.active.take() else {
            self.transition(RemoteLinkState::Disconnected);
            return;
        };
        self.transition(RemoteLinkState::Closing);
        close_gracefully(prev);
        self.transition(RemoteLinkState::Disconnected);
    }

    pub fn send(&self, msg: &RelayMessage) -> Result<(), LinkError> {
        let state = self.state;
        let Some(active) = self.active.as_ref().filter(|_| state == RemoteLinkState::Open) else {
            return Err(LinkError::NotOpen(state));
        };
        let text = codec::to_text(msg)?;
        active
            .out_tx
            .try_send(OutboundMsg::Send { text })
            .map_err(|e| match e {
                TrySendError::Full(_) => LinkError::Backpressure,
                TrySendError::Disconnected(_) => LinkError::NotOpen(state),
            })
    }

    /// Apply pending transport signals and return inbound frames in arrival
    /// order.
    pub fn poll(&mut self) -> Vec<String> {
        let Some(active) = self.active.as_ref() else {
            return Vec::new();
        };
        let mut events = Vec::new();
        loop {
            match active.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Worker gone without a word; treat as closed.
                    if events.last() != Some(&LinkEvent::Closed) {
                        events.push(LinkEvent::Closed);
                    }
                    break;
                }
            }
        }

        let mut frames = Vec::new();
        for event in events {
            match event {
                LinkEvent::Frame { text } => frames.push(text),
                LinkEvent::Opened => {
                    if self.state == RemoteLinkState::Connecting {
                        self.transition(RemoteLinkState::Open);
                    }
                }
                LinkEvent::Faulted { reason } => {
                    if matches!(self.state, RemoteLinkState::Open | RemoteLinkState::Connecting) {
                        warn!(%reason, "remote link faulted");
                        self.transition(RemoteLinkState::Faulted);
                    }
                }
                LinkEvent::Closed => {
                    if matches!(
                        self.state,
                        RemoteLinkState::Open | RemoteLinkState::Connecting | RemoteLinkState::Faulted
                    ) {
                        self.transition(RemoteLinkState::Disconnected);
                    }
                    // The thread has already returned; joining is immediate.
                    self.active = None;
                    break;
                }
            }
        }
        frames
    }

    fn release(&mut self) {
        let Some(prev) = self.active.take() else { return };
        match self.strategy {
            ReconnectStrategy::CloseThenOpen => {
                self.transition(RemoteLinkState::Closing);
                close_gracefully(prev);
            }
            ReconnectStrategy::ReplaceWithoutClose => {
                let ActiveLink {
                    url,
                    thread,
                    out_tx,
                    event_rx,
                } = prev;
                debug!(%url, "superseded remote link dropped without close");
                thread.abandon();
                drop(out_tx);
                drop(event_rx);
            }
        }
        self.transition(RemoteLinkState::Disconnected);
    }

    fn transition(&mut self, next: RemoteLinkState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "remote link state");
            self.state = next;
        }
    }
}

fn close_gracefully(link: ActiveLink) {
    let ActiveLink {
        url,
        thread,
        out_tx,
        event_rx,
    } = link;
    debug!(%url, "closing remote link");
    drop(event_rx);
    // Joins: the old socket is gone before anything new is dialed.
    thread.close();
    drop(out_tx);
}

/// Normalize a peer address. Bare `host:port` gets the `ws://` scheme.
pub fn peer_url(address: &str) -> Result<Url, String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err("empty address".to_string());
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("ws://{trimmed}")
    };
    let url = Url::parse(&candidate).map_err(|e| e.to_string())?;
    if url.scheme() != "ws" {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}
