//! Terminal binding of the shared poll controller: a `tokio` interval raced
//! against a shutdown signal (normally Ctrl-C).

use std::{future::Future, time::Duration};

use anyhow::Result;
use markflow_shared::{ApiError, PollController};
use tokio::time::{self, MissedTickBehavior};

/// Why a watch loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The last successful fetch showed nothing processing.
    Settled,
    /// The shutdown signal fired first.
    Interrupted,
}

fn session_lost(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized))
}

/// Poll `refetch` every `period` until it reports nothing processing or
/// `shutdown` resolves.
///
/// `refetch` yields whether anything is still processing. The first fetch runs
/// immediately and is the initial load: if it fails the error is returned and
/// polling never starts. Later failures are logged and the loop carries on,
/// except [`ApiError::Unauthorized`], which ends it since the session is gone.
/// Once `shutdown` resolves the controller is torn down and `refetch` is not
/// called again.
pub async fn watch<F, Fut, S>(period: Duration, mut refetch: F, shutdown: S) -> Result<WatchExit>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
    S: Future<Output = ()>,
{
    let mut controller = PollController::new();
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    let mut loaded = false;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                controller.teardown();
                return Ok(WatchExit::Interrupted);
            }
            _ = interval.tick() => {
                let processing = match refetch().await {
                    Ok(processing) => processing,
                    Err(err) if !loaded || session_lost(&err) => {
                        controller.teardown();
                        return Err(err);
                    },
                    Err(err) => {
                        tracing::warn!("refresh failed: {err:#}");
                        continue;
                    },
                };
                loaded = true;
                controller.observe_flag(processing);
                if !controller.is_armed() {
                    return Ok(WatchExit::Settled);
                }
            }
        }
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves,
/// leaving the loop to end on its own.
pub async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
