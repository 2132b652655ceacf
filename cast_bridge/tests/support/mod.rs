#![allow(dead_code)]

use cast_bridge::protocol::InboundMsg;
use cast_bridge::{BridgeConfig, MainLoop, MediaHost, SegmentBuffer, TrackMetadata};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::Message;

pub struct MockHost {
    pub metadata: Mutex<Option<TrackMetadata>>,
    pub set_calls: AtomicUsize,
    pub paused: AtomicBool,
    pub play_calls: AtomicUsize,
    pub fail_play: AtomicBool,
    pub stop_calls: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            metadata: Mutex::new(None),
            set_calls: AtomicUsize::new(0),
            paused: AtomicBool::new(true),
            play_calls: AtomicUsize::new(0),
            fail_play: AtomicBool::new(false),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn showing(title: &str, artist: &str, album: &str) -> Self {
        let host = Self::new();
        *host.metadata.lock().unwrap() = Some(TrackMetadata {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            artwork_url: None,
        });
        host
    }

    pub fn current(&self) -> Option<TrackMetadata> {
        self.metadata.lock().unwrap().clone()
    }
}

impl MediaHost for MockHost {
    fn displayed_metadata(&self) -> Option<TrackMetadata> {
        self.metadata.lock().unwrap().clone()
    }

    fn set_displayed_metadata(&self, metadata: TrackMetadata) {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        *self.metadata.lock().unwrap() = Some(metadata);
    }

    fn audio_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn play_audio(&self) -> Result<(), String> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_play.load(Ordering::SeqCst) {
            return Err("NotAllowedError".to_string());
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop_session(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        connect_timeout: Duration::from_millis(2_000),
        poll_interval: Duration::from_millis(10),
        ..BridgeConfig::default()
    }
}

pub fn new_loop(config: BridgeConfig) -> (MainLoop, Sender<InboundMsg>, SegmentBuffer) {
    let (in_tx, in_rx) = bounded(cast_bridge::INBOUND_CAP);
    let buffer = SegmentBuffer::new();
    let main_loop = MainLoop::new(in_rx, config, Box::new(buffer.clone()));
    (main_loop, in_tx, buffer)
}

pub fn tick_until(
    main_loop: &mut MainLoop,
    host: &MockHost,
    timeout: Duration,
    mut done: impl FnMut(&MainLoop, &MockHost) -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        main_loop.tick(host);
        if done(main_loop, host) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Connected(usize),
    Text(usize, String),
    Closed(usize),
    Dropped(usize),
}

enum PeerCmd {
    Text(String),
    Close,
}

/// Controller stand-in: accepts bridge connections and records what they send.
pub struct PeerServer {
    pub addr: SocketAddr,
    events: Receiver<PeerEvent>,
    push: Sender<PeerCmd>,
}

impl PeerServer {
    pub fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind peer");
        let addr = listener.local_addr().expect("peer addr");
        let (event_tx, event_rx) = unbounded();
        let (push_tx, push_rx) = unbounded::<PeerCmd>();

        thread::spawn(move || {
            for (id, stream) in listener.incoming().enumerate() {
                let Ok(stream) = stream else { continue };
                let events = event_tx.clone();
                let push = push_rx.clone();
                thread::spawn(move || serve(id, stream, events, push));
            }
        });

        Self {
            addr,
            events: event_rx,
            push: push_tx,
        }
    }

    pub fn push(&self, text: &str) {
        self.push
            .send(PeerCmd::Text(text.to_string()))
            .expect("push frame");
    }

    /// Start a close handshake on the live connection.
    pub fn close(&self) {
        self.push.send(PeerCmd::Close).expect("push close");
    }

    pub fn next_event(&self, timeout: Duration) -> Option<PeerEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    pub fn wait_for(&self, timeout: Duration, want: impl Fn(&PeerEvent) -> bool) -> Option<PeerEvent> {
        let deadline = Instant::now() + timeout;
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            match self.events.recv_timeout(left) {
                Ok(ev) if want(&ev) => return Some(ev),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    pub fn texts_within(&self, window: Duration) -> Vec<String> {
        let deadline = Instant::now() + window;
        let mut out = Vec::new();
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            match self.events.recv_timeout(left) {
                Ok(PeerEvent::Text(_, s)) => out.push(s),
                Ok(_) => {}
                Err(_) => break,
            }
        }
        out
    }
}

fn serve(id: usize, stream: TcpStream, events: Sender<PeerEvent>, push: Receiver<PeerCmd>) {
    let Ok(mut ws) = tungstenite::accept(stream) else { return };
    let _ = ws.get_ref().set_read_timeout(Some(Duration::from_millis(10)));
    let _ = events.send(PeerEvent::Connected(id));

    loop {
        while let Ok(cmd) = push.try_recv() {
            let sent = match cmd {
                PeerCmd::Text(text) => ws.send(Message::Text(text.into())),
                PeerCmd::Close => ws.close(None).and_then(|_| ws.flush()),
            };
            if sent.is_err() {
                let _ = events.send(PeerEvent::Dropped(id));
                return;
            }
        }
        match ws.read() {
            Ok(Message::Text(s)) => {
                let _ = events.send(PeerEvent::Text(id, s.to_string()));
            }
            Ok(Message::Close(_)) => {
                // Recorded before the reply goes out, so it precedes anything
                // the bridge does once its close completes.
                let _ = events.send(PeerEvent::Closed(id));
                let _ = ws.flush();
                return;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(tungstenite::Error::ConnectionClosed) => {
                let _ = events.send(PeerEvent::Closed(id));
                return;
            }
            Err(_) => {
                let _ = events.send(PeerEvent::Dropped(id));
                return;
            }
        }
    }
}

/// Accepts TCP but never answers the WebSocket handshake. Reports when the
/// bridge gives up on the socket.
pub struct SilentPeer {
    pub addr: SocketAddr,
    closed: Receiver<Instant>,
}

impl SilentPeer {
    pub fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent peer");
        let addr = listener.local_addr().expect("silent peer addr");
        let (closed_tx, closed_rx) = unbounded();

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else { return };
            let mut buf = [0u8; 1024];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            let _ = closed_tx.send(Instant::now());
        });

        Self {
            addr,
            closed: closed_rx,
        }
    }

    pub fn closed_at(&self, timeout: Duration) -> Option<Instant> {
        self.closed.recv_timeout(timeout).ok()
    }
}
