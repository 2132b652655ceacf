use crate::protocol::{LinkEvent, OutboundMsg};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tungstenite::handshake::HandshakeError;
use tungstenite::protocol::Message;
use tungstenite::WebSocket;
use url::Url;

const WRITE_TIMEOUT: Duration = Duration::from_millis(200);
const CONNECT_SLICE: Duration = Duration::from_millis(250);
const CLOSE_GRACE: Duration = Duration::from_secs(1);
// Slots kept free for `Faulted` + `Closed` so the loop always learns the link is gone.
const TERMINAL_RESERVE: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct LinkSettings {
    pub connect_timeout: Duration,
    pub poll_interval: Duration,
}

/// Network thread owning one outbound peer socket.
pub struct LinkThread {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl LinkThread {
    pub fn spawn(
        url: Url,
        settings: LinkSettings,
        event_tx: Sender<LinkEvent>,
        out_rx: Receiver<OutboundMsg>,
    ) -> Result<Self, String> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_for_thread = Arc::clone(&shutdown);

        let join_handle = thread::Builder::new()
            .name("cast-link".to_string())
            .spawn(move || run_link(url, settings, event_tx, out_rx, shutdown_for_thread))
            .map_err(|e| format!("link thread spawn failed: {e}"))?;

        Ok(Self {
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// Send a close frame, wait for the peer's reply (bounded) and join.
    pub fn close(mut self) {
        self.shutdown();
    }

    /// Let the thread go without a close request. It exits once it notices
    /// its outbound queue has been dropped.
    pub fn abandon(mut self) {
        self.join_handle.take();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.join_handle.take() else { return };
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = handle.join();
    }
}

impl Drop for LinkThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_link(
    url: Url,
    settings: LinkSettings,
    events: Sender<LinkEvent>,
    out_rx: Receiver<OutboundMsg>,
    shutdown: Arc<AtomicBool>,
) {
    let mut ws = match open_socket(&url, &settings, &shutdown) {
        Ok(Some(ws)) => ws,
        Ok(None) => {
            debug!(%url, "remote link cancelled before open");
            return;
        }
        Err(reason) => {
            warn!(%url, "remote link connect failed: {reason}");
            fault(&events, reason);
            return;
        }
    };

    info!(%url, "remote link open");
    let _ = events.try_send(LinkEvent::Opened);

    'link: while !shutdown.load(Ordering::Relaxed) {
        // Outbound: drain queued messages.
        loop {
            match out_rx.try_recv() {
                Ok(OutboundMsg::Send { text }) => {
                    if let Err(e) = ws.send(Message::Text(text.into())) {
                        fault(&events, format!("send failed: {e}"));
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if shutdown.load(Ordering::Relaxed) {
                        break 'link;
                    }
                    debug!(%url, "remote link abandoned");
                    return;
                }
            }
        }

        // Inbound: one message per loop; the read timeout keeps the loop moving.
        match ws.read() {
            Ok(Message::Text(text)) => {
                if !push_frame(&events, text.to_string()) {
                    warn!(%url, "link event queue full, frame dropped");
                }
            }
            Ok(Message::Close(_)) => {
                let _ = ws.flush();
                info!(%url, "remote link closed by peer");
                let _ = events.try_send(LinkEvent::Closed);
                return;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                info!(%url, "remote link closed");
                let _ = events.try_send(LinkEvent::Closed);
                return;
            }
            Err(e) => {
                fault(&events, format!("read failed: {e}"));
                return;
            }
        }
    }

    close_socket(&mut ws);
    info!(%url, "remote link closed");
}

/// Initiate the close handshake and wait briefly for the peer's reply.
fn close_socket(ws: &mut WebSocket<TcpStream>) {
    if ws.close(None).is_err() {
        return;
    }
    let _ = ws.flush();
    let deadline = Instant::now() + CLOSE_GRACE;
    while Instant::now() < deadline {
        match ws.read() {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => {}
            Err(_) => break,
        }
    }
}

/// Dial and handshake, checking `shutdown` between bounded waits. `Ok(None)`
/// means the link was cancelled; the partial socket is dropped.
fn open_socket(
    url: &Url,
    settings: &LinkSettings,
    shutdown: &AtomicBool,
) -> Result<Option<WebSocket<TcpStream>>, String> {
    let addrs = url
        .socket_addrs(|| None)
        .map_err(|e| format!("resolve {url} failed: {e}"))?;
    let addr = addrs
        .first()
        .copied()
        .ok_or_else(|| format!("no socket address for {url}"))?;
    let deadline = Instant::now() + settings.connect_timeout;

    let Some(stream) = connect_tcp(addr, deadline, shutdown)? else {
        return Ok(None);
    };
    let _ = stream.set_nodelay(true);
    let _ = stream.set_read_timeout(Some(settings.poll_interval));
    let _ = stream.set_write_timeout(Some(WRITE_TIMEOUT));

    let mut attempt = tungstenite::client(url.as_str(), stream);
    loop {
        match attempt {
            Ok((ws, _resp)) => return Ok(Some(ws)),
            Err(HandshakeError::Interrupted(mid)) => {
                if shutdown.load(Ordering::Relaxed) {
                    return Ok(None);
                }
                if Instant::now() >= deadline {
                    return Err(format!("ws handshake with {url} timed out"));
                }
                attempt = mid.handshake();
            }
            Err(HandshakeError::Failure(e)) => {
                return Err(format!("ws handshake with {url} failed: {e}"));
            }
        }
    }
}

fn connect_tcp(
    addr: SocketAddr,
    deadline: Instant,
    shutdown: &AtomicBool,
) -> Result<Option<TcpStream>, String> {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(None);
        }
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(format!("tcp connect to {addr} timed out"));
        }
        match TcpStream::connect_timeout(&addr, left.min(CONNECT_SLICE)) {
            Ok(stream) => return Ok(Some(stream)),
            Err(e) if is_timeout(&e) => {}
            Err(e) => return Err(format!("tcp connect to {addr} failed: {e}")),
        }
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn push_frame(events: &Sender<LinkEvent>, text: String) -> bool {
    if let Some(cap) = events.capacity() {
        if events.len() + TERMINAL_RESERVE >= cap {
            return false;
        }
    }
    events.try_send(LinkEvent::Frame { text }).is_ok()
}

fn fault(events: &Sender<LinkEvent>, reason: String) {
    let _ = events.try_send(LinkEvent::Faulted { reason });
    let _ = events.try_send(LinkEvent::Closed);
}
