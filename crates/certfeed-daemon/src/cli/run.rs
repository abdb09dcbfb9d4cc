use certfeed_daemon::{ApiServer, AppState, Daemon, DaemonConfig};
use certfeed_types::{CertfeedError, CertfeedResult};
use std::path::PathBuf;
use tracing::{info, warn};

pub async fn run_daemon(config: DaemonConfig, pid_file: Option<PathBuf>) -> CertfeedResult<()> {
    info!("Starting certfeed daemon v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| CertfeedError::Config(format!("Failed to create data directory: {}", e)))?;

    if let Some(ref pid_path) = pid_file {
        std::fs::write(pid_path, std::process::id().to_string())
            .map_err(|e| CertfeedError::Config(format!("Failed to write PID file: {}", e)))?;
        info!("PID file written: {:?}", pid_path);
    }

    let daemon = Daemon::open(config)?;

    let served = if daemon.config().api.enabled {
        let addr = daemon.config().api_socket_addr();
        let server = ApiServer::new(addr, AppState::from_daemon(&daemon), &daemon.config().api);
        print_ready_message(&daemon, Some(addr));
        server.serve(wait_for_shutdown()).await
    } else {
        warn!("HTTP API disabled in configuration");
        print_ready_message(&daemon, None);
        wait_for_shutdown().await;
        Ok(())
    };

    info!("Shutting down...");
    let flushed = daemon.flush_async().await;

    if let Some(ref pid_path) = pid_file {
        let _ = std::fs::remove_file(pid_path);
    }

    served?;
    flushed?;
    info!("Shutdown complete");
    Ok(())
}

fn print_ready_message(daemon: &Daemon, addr: Option<std::net::SocketAddr>) {
    let verifier = if daemon.verifier_enabled() { "enabled" } else { "disabled" };
    println!();
    println!("\x1b[38;5;46mcertfeed daemon is running\x1b[0m");
    match addr {
        Some(addr) => println!("  API:         \x1b[38;5;51mhttp://{}\x1b[0m", addr),
        None => println!("  API:         disabled"),
    }
    println!("  Backend:     {}", daemon.config().storage.backend);
    println!("  ZK verifier: {}", verifier);
    println!("  \x1b[38;5;245mPress Ctrl+C to stop\x1b[0m");
    println!();
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => { info!("Received SIGTERM"); }
                    _ = sigint.recv() => { info!("Received SIGINT"); }
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to install signal handlers, falling back to Ctrl+C: {}", e);
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C"),
        Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
    }
}
