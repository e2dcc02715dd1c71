//! Runs the HTTP daemon until a shutdown signal arrives.

use std::future::IntoFuture;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task;
use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::errors::ServeError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{DRAIN_BUDGET, PROCESS_TARGET};

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns a [`ServeError`] when bootstrap, binding, serving, or signal
/// handling fails.
pub fn run_daemon() -> Result<(), ServeError> {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let shutdown = SystemShutdownSignal::install(DRAIN_BUDGET)?;
    run_daemon_with(&SystemConfigLoader, reporter, shutdown)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<S>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: S,
) -> Result<(), ServeError>
where
    S: ShutdownSignal + 'static,
{
    let daemon = bootstrap_with(loader, reporter)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|source| ServeError::Runtime { source })?;
    let outcome = runtime.block_on(serve(&daemon, shutdown));
    // A signal listener may still be parked on the blocking pool.
    runtime.shutdown_background();
    outcome
}

async fn serve<S>(daemon: &Daemon, shutdown: S) -> Result<(), ServeError>
where
    S: ShutdownSignal + 'static,
{
    let address = daemon.config().listen().bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServeError::Bind {
            address: address.clone(),
            source,
        })?;
    match listener.local_addr() {
        Ok(local) => info!(target: PROCESS_TARGET, address = %local, "listening"),
        Err(error) => warn!(target: PROCESS_TARGET, %error, "listening on unknown address"),
    }

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(listener, daemon.router())
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .into_future(),
    );
    let drain_budget = shutdown.drain_budget();
    let signalled = task::spawn_blocking(move || shutdown.wait());

    let waited = tokio::select! {
        joined = &mut server => return finished(joined),
        waited = signalled => waited,
    };
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain_budget, &mut server).await {
        Ok(joined) => finished(joined)?,
        Err(_) => {
            warn!(
                target: PROCESS_TARGET,
                drain_ms = drain_budget.as_millis(),
                "in-flight requests did not drain in time"
            );
            server.abort();
        }
    }

    match waited {
        Ok(result) => result?,
        Err(error) => warn!(target: PROCESS_TARGET, %error, "shutdown listener panicked"),
    }
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

fn finished(joined: Result<std::io::Result<()>, task::JoinError>) -> Result<(), ServeError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(ServeError::Serve { source }),
        Err(error) => Err(ServeError::Serve {
            source: std::io::Error::other(error),
        }),
    }
}
