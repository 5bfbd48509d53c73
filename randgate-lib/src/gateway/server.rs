use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::time::{interval, sleep, Duration};
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};
use crate::gateway::context::GatewayContext;
use crate::gateway::handler::handle_request;

/// How long shutdown waits for in-flight connections to drain
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Guard to decrement active connections counter when dropped
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Bind and run the gateway until SIGINT/SIGTERM, then drain connections.
pub async fn run(ctx: Arc<GatewayContext>) -> Result<()> {
    let addr = ctx.config.listen;
    let listener = TcpListener::bind(addr).await.map_err(GatewayError::Io)?;

    let sweeper = spawn_bucket_sweeper(Arc::clone(&ctx));

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| GatewayError::Io(std::io::Error::other(format!(
            "Failed to setup SIGTERM handler: {e}"
        ))))?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(|e| GatewayError::Io(std::io::Error::other(format!(
            "Failed to setup SIGINT handler: {e}"
        ))))?;

    let active_connections = Arc::new(AtomicUsize::new(0));

    info!(?addr, "starting randomness gateway");

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, initiating graceful shutdown");
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        spawn_connection(Arc::clone(&ctx), stream, peer, Arc::clone(&active_connections));
                    }
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                }
            }
        }
    }

    sweeper.abort();
    drain(active_connections).await;
    info!("Gateway stopped");
    Ok(())
}

/// Accept loop without signal handling, for embedding and tests.
pub async fn serve(listener: TcpListener, ctx: Arc<GatewayContext>) -> Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept error");
                continue;
            }
        };
        spawn_connection(Arc::clone(&ctx), stream, peer, Arc::clone(&active_connections));
    }
}

fn spawn_connection(
    ctx: Arc<GatewayContext>,
    stream: TcpStream,
    peer: std::net::SocketAddr,
    active_connections: Arc<AtomicUsize>,
) {
    active_connections.fetch_add(1, Ordering::Relaxed);
    let builder = ConnBuilder::new(TokioExecutor::new());

    tokio::spawn(async move {
        let _guard = ConnectionGuard(active_connections);

        let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
            let ctx = Arc::clone(&ctx);
            async move { Ok::<_, hyper::Error>(handle_request(ctx, Some(peer), req).await) }
        });

        if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
            debug!(?peer, error = %e, "serve_connection error");
        }
    });
}

/// Periodically drop rate-limit buckets whose window expired long ago.
fn spawn_bucket_sweeper(ctx: Arc<GatewayContext>) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_secs(ctx.config.rate_limit.sweep_interval_seconds);
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            let removed = ctx.limiter.sweep(ctx.sweep_grace());
            if removed > 0 {
                debug!(removed, live = ctx.limiter.bucket_count(), "swept stale rate-limit buckets");
            }
        }
    })
}

async fn drain(active_connections: Arc<AtomicUsize>) {
    info!(
        "Waiting for active connections to finish (timeout: {}s)",
        SHUTDOWN_TIMEOUT.as_secs()
    );
    let start = std::time::Instant::now();

    loop {
        let active = active_connections.load(Ordering::Relaxed);
        if active == 0 {
            info!("All connections closed, shutdown complete");
            break;
        }

        if start.elapsed() >= SHUTDOWN_TIMEOUT {
            warn!(active_connections = active, "Shutdown timeout reached");
            break;
        }

        sleep(Duration::from_millis(100)).await;
    }
}
