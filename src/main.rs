use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use flatdoc::config::Config;
use flatdoc::logger;
use flatdoc::server::{accept_connection, create_listener, start_signal_handler, SignalHandler};
use flatdoc::state::AppState;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    ensure_storage(&cfg).await?;

    let listener = create_listener(addr)?;
    let state = Arc::new(AppState::new(&cfg));
    let connections = Arc::new(AtomicUsize::new(0));

    logger::log_server_start(&addr, &cfg);

    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals));

    // LocalSet for spawn_local support in connection handling
    let local = tokio::task::LocalSet::new();
    local
        .run_until(run_server(listener, state, connections, signals))
        .await
}

/// Accept loop; exits on the shutdown signal
async fn run_server(
    listener: TcpListener,
    state: Arc<AppState>,
    connections: Arc<AtomicUsize>,
    signals: Arc<SignalHandler>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = signals.shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }
    Ok(())
}

/// Create the storage directories when missing
async fn ensure_storage(cfg: &Config) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&cfg.storage.data_dir).await?;
    tokio::fs::create_dir_all(&cfg.storage.uploads_dir).await?;
    if let Some(parent) = std::path::Path::new(&cfg.storage.credentials_file).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
