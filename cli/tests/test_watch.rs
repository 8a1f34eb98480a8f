//! Integration tests.

#[cfg(test)]
mod tests {
    use std::{cell::Cell, future::pending, time::Duration};

    use anyhow::{anyhow, Context, Result};
    use markflow_cli::watch::{watch, WatchExit};
    use markflow_shared::ApiError;

    const PERIOD: Duration = Duration::from_millis(5);

    /// `Some(flag)` answers with the processing flag, `None` fails the fetch.
    fn reply(script: &[Option<bool>], call: usize) -> Result<bool> {
        match script.get(call).copied().flatten() {
            Some(processing) => Ok(processing),
            None => Err(anyhow!("connection reset")),
        }
    }

    #[tokio::test]
    async fn settles_once_nothing_is_processing() {
        let script = [Some(true), Some(true), Some(false), Some(true)];
        let calls = Cell::new(0usize);

        let exit = watch(
            PERIOD,
            || {
                let answer = reply(&script, calls.get());
                calls.set(calls.get() + 1);
                async move { answer }
            },
            pending(),
        )
        .await
        .expect("watch settles");

        assert_eq!(exit, WatchExit::Settled);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn idle_first_fetch_settles_immediately() {
        let calls = Cell::new(0usize);
        let exit = watch(
            PERIOD,
            || {
                calls.set(calls.get() + 1);
                async { Ok(false) }
            },
            pending(),
        )
        .await
        .expect("watch settles");

        assert_eq!(exit, WatchExit::Settled);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn failed_initial_load_ends_the_watch() {
        let calls = Cell::new(0usize);
        let outcome = tokio::time::timeout(
            Duration::from_millis(300),
            watch(
                PERIOD,
                || {
                    calls.set(calls.get() + 1);
                    async { Err::<bool, _>(ApiError::Validation {
                        status: 404,
                        message: "Group not found".to_string(),
                    })
                    .context("failed to list uploads") }
                },
                pending(),
            ),
        )
        .await
        .expect("watch returns instead of polling on");

        let err = outcome.expect_err("initial failure is reported");
        assert!(format!("{err:#}").contains("Group not found"));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn failures_after_the_initial_load_keep_polling() {
        let script = [Some(true), None, None, Some(false)];
        let calls = Cell::new(0usize);

        let exit = watch(
            PERIOD,
            || {
                let answer = reply(&script, calls.get());
                calls.set(calls.get() + 1);
                async move { answer }
            },
            pending(),
        )
        .await
        .expect("transient failures are swallowed");

        assert_eq!(exit, WatchExit::Settled);
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn lost_session_stops_polling() {
        let calls = Cell::new(0usize);
        let outcome = watch(
            PERIOD,
            || {
                calls.set(calls.get() + 1);
                let answer = if calls.get() == 1 {
                    Ok(true)
                } else {
                    Err(ApiError::Unauthorized).context("failed to list marking jobs")
                };
                async move { answer }
            },
            pending(),
        )
        .await;

        let err = outcome.expect_err("unauthorized ends the watch");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn shutdown_stops_before_any_fetch() {
        let calls = Cell::new(0usize);
        let exit = watch(
            PERIOD,
            || {
                calls.set(calls.get() + 1);
                async { Ok(true) }
            },
            std::future::ready(()),
        )
        .await
        .expect("interrupted watch is not an error");

        assert_eq!(exit, WatchExit::Interrupted);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_busy_watch() {
        let calls = Cell::new(0usize);
        let exit = watch(
            PERIOD,
            || {
                calls.set(calls.get() + 1);
                async { Ok(true) }
            },
            tokio::time::sleep(Duration::from_millis(30)),
        )
        .await
        .expect("interrupted watch is not an error");

        assert_eq!(exit, WatchExit::Interrupted);
        assert!(calls.get() >= 1);
    }
}
