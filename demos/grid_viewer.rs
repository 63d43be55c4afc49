//! Headless grid viewer demo
//!
//! Run with: cargo run --example grid_viewer [BACKEND_URL] RTSP_URL [RTSP_URL...]
//!
//! Examples:
//!   cargo run --example grid_viewer rtsp://cam1.local/stream
//!   cargo run --example grid_viewer http://localhost:8000/ rtsp://cam1.local/stream rtsp://cam2.local/stream
//!
//! Registers each RTSP source with the backend, then prints every status
//! transition as it arrives over the push channel. There is no video
//! output here (the playback engine is a stand-in that logs lifecycle
//! calls), but the session handling is exactly what a rendering layer
//! would sit on top of.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use streamgrid::{
    ClientConfig, EngineEvent, EngineHandle, EngineInitError, EngineSession, PlaybackEngine,
    SessionOrchestrator,
};

/// Playback engine stand-in: accepts every source and reports `Playing`
struct LoggingEngine {
    next_id: AtomicU64,
}

impl LoggingEngine {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl PlaybackEngine for LoggingEngine {
    async fn create(&self, source_url: &str) -> Result<EngineSession, EngineInitError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!("[engine] create #{id} for {source_url}");

        let (tx, rx) = mpsc::channel(8);
        // A real renderer would emit waiting/playing as media arrives
        tokio::spawn(async move {
            let _ = tx.send(EngineEvent::Waiting).await;
            let _ = tx.send(EngineEvent::Playing).await;
        });

        Ok(EngineSession {
            handle: EngineHandle::new(id),
            events: rx,
        })
    }

    async fn dispose(&self, handle: EngineHandle) {
        println!("[engine] dispose #{}", handle.id());
    }
}

fn print_usage() {
    eprintln!("Usage: grid_viewer [BACKEND_URL] RTSP_URL [RTSP_URL...]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BACKEND_URL   Backend base URL (default: http://localhost:8000/)");
    eprintln!("  RTSP_URL      One or more rtsp:// sources to register");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("streamgrid=debug".parse()?),
        )
        .init();

    // First arg is the backend URL if it is not an RTSP source
    let config = if !args[0].starts_with("rtsp") {
        let base = Url::parse(&args.remove(0))?;
        ClientConfig::with_backend(&base)
    } else {
        ClientConfig::default()
    };

    println!("Backend: {}", config.api_base);
    println!("Push channel: {}", config.push_url);

    let engine = Arc::new(LoggingEngine::new());
    let mut grid = SessionOrchestrator::connect(&config, engine).await?;

    let mut watchers = Vec::new();
    for source in &args {
        match grid.start(source).await {
            Ok(view) => {
                println!("Started {} -> {} [{}]", source, view.playable_url, view.status);
                if let Some(rx) = grid.watch(&view.id) {
                    watchers.push((view.id.clone(), rx));
                }
            }
            Err(e) => eprintln!("Failed to start {source}: {e}"),
        }
    }

    if grid.is_empty() {
        eprintln!("No sessions started");
        return Ok(());
    }

    // Print transitions until interrupted
    for (id, mut rx) in watchers {
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snap = rx.borrow().clone();
                match &snap.error {
                    Some(error) => println!("[{id}] {} ({error})", snap.status),
                    None => println!("[{id}] {}", snap.status),
                }
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    println!("\nStopping sessions...");

    for view in grid.sessions() {
        if let Err(e) = grid.stop(&view.id).await {
            eprintln!("Stop {} failed on the backend (cleaned up locally): {e}", view.id);
        }
    }

    Ok(())
}
