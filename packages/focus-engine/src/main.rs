use std::io::Write;
use std::path::PathBuf;

use focus_engine::config::EngineConfig;
use focus_engine::logging::init_tracing;
use focus_engine::{FocusSession, ReplaySource};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = EngineConfig::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let Some(path) = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.replay.path.clone())
    else {
        tracing::error!("no recording given; pass a JSON-lines path or set FOCUS_REPLAY_PATH");
        std::process::exit(2);
    };

    let session = FocusSession::new(config.session.clone());
    let source = ReplaySource::new(&path, config.replay.frame_interval);
    if let Err(e) = session.start(source).await {
        tracing::error!(error = %e, path = %path.display(), "failed to start focus session");
        std::process::exit(1);
    }

    let mut snapshots = session.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *snapshots.borrow_and_update();
                match serde_json::to_string(&snapshot) {
                    Ok(line) => {
                        let mut stdout = std::io::stdout().lock();
                        if writeln!(stdout, "{line}").is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to encode snapshot"),
                }
            }
        }
    }

    tracing::info!("shutdown requested, stopping focus session");
    if let Err(e) = session.stop().await {
        tracing::warn!(error = %e, "focus session stop failed");
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
