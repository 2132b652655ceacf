use cast_bridge::protocol::InboundMsg;
use cast_bridge::{BridgeConfig, MainLoop, MediaHost, SegmentBuffer, TrackMetadata};
use crossbeam_channel::bounded;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct MockHost {
    metadata: Mutex<Option<TrackMetadata>>,
    paused: AtomicBool,
}

impl MockHost {
    fn new() -> Self {
        Self {
            metadata: Mutex::new(Some(TrackMetadata {
                title: "Cider".to_string(),
                artist: "Playing ...".to_string(),
                album: "Test build".to_string(),
                artwork_url: None,
            })),
            paused: AtomicBool::new(true),
        }
    }
}

impl MediaHost for MockHost {
    fn displayed_metadata(&self) -> Option<TrackMetadata> {
        self.metadata.lock().ok()?.clone()
    }

    fn set_displayed_metadata(&self, metadata: TrackMetadata) {
        info!(?metadata, "display updated");
        if let Ok(mut g) = self.metadata.lock() {
            *g = Some(metadata);
        }
    }

    fn audio_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn play_audio(&self) -> Result<(), String> {
        info!("audio playback started");
        self.paused.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn stop_session(&self) {
        info!("session stop requested");
        self.paused.store(true, Ordering::Relaxed);
    }
}

fn parse_arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let connect = parse_arg_value(&args, "--connect")
        .or_else(|| std::env::var("CAST_BRIDGE_PEER").ok());
    let run_for_ms = parse_arg_value(&args, "--run-for-ms")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis);

    let (in_tx, in_rx) = bounded(cast_bridge::INBOUND_CAP);

    if let Some(addr) = connect {
        let _ = in_tx.try_send(InboundMsg::CustomMessage {
            data: serde_json::json!({ "ip": addr }),
        });
    }

    // One custom-channel message per stdin line.
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(data) => {
                    if in_tx.send(InboundMsg::CustomMessage { data }).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("stdin line is not json: {e}"),
            }
        }
    });

    let buffer = SegmentBuffer::new();
    let host = MockHost::new();
    let mut main_loop = MainLoop::new(in_rx, BridgeConfig::from_env(), Box::new(buffer.clone()));

    info!(
        auto_resume_ms = main_loop.auto_resume().as_millis() as u64,
        "playback config"
    );
    println!("mock_receiver ready; send custom-channel JSON on stdin");

    let start = Instant::now();
    loop {
        main_loop.tick(&host);

        // Stand-in for the audio element consuming appended segments.
        let drained: usize = buffer.take_pending().iter().map(Vec::len).sum();
        if drained > 0 {
            info!(bytes = drained, "segments played");
        }
        buffer.finish_update();

        thread::sleep(Duration::from_millis(33));
        if let Some(max) = run_for_ms {
            if start.elapsed() >= max {
                break;
            }
        }
    }

    let stats = main_loop.ingest_stats();
    info!(appended = stats.appended, dropped = stats.dropped, "audio ingest summary");
    main_loop.shutdown();
}
