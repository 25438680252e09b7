//! Bounded fan-out over a stage's work list.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::Result;

/// Per-item results of one stage run.
#[derive(Debug)]
pub struct StageOutcome<T> {
    pub total: usize,

    /// Values of successful items, in completion order
    pub succeeded: Vec<T>,
    pub failed: usize,
}

impl<T> StageOutcome<T> {
    fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: Vec::new(),
            failed: 0,
        }
    }

    /// Summarize into a report, `created` being the stage's aggregate.
    pub fn report(&self, stage: &'static str, created: usize) -> StageReport {
        StageReport {
            stage,
            total: self.total,
            succeeded: self.succeeded.len(),
            failed: self.failed,
            created,
        }
    }
}

/// Counts reported by a finished stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,

    /// Records newly created by the stage
    pub created: usize,
}

impl StageReport {
    /// Report for a stage that had nothing to do.
    pub fn empty(stage: &'static str) -> Self {
        Self {
            stage,
            total: 0,
            succeeded: 0,
            failed: 0,
            created: 0,
        }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} items, {} succeeded, {} failed, {} created",
            self.stage, self.total, self.succeeded, self.failed, self.created
        )
    }
}

/// Run `per_item` over `items` with at most `concurrency` in flight.
///
/// Failed or panicking items are logged and counted without disturbing
/// their siblings. A fatal error stops the stage and is returned.
pub async fn run_stage<I, T, F, Fut>(
    stage: &str,
    items: Vec<I>,
    concurrency: usize,
    per_item: F,
) -> Result<StageOutcome<T>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut outcome = StageOutcome::new(items.len());
    log::info!(
        "[{}] Processing {} items ({} concurrent)",
        stage,
        outcome.total,
        concurrency
    );

    let mut results = stream::iter(items)
        .map(|item| AssertUnwindSafe(per_item(item)).catch_unwind())
        .buffer_unordered(concurrency.max(1));

    while let Some(result) = results.next().await {
        match result {
            Ok(Ok(value)) => outcome.succeeded.push(value),
            Ok(Err(e)) if e.is_fatal() => {
                log::error!("[{}] Aborting: {}", stage, e);
                return Err(e);
            }
            Ok(Err(e)) => {
                outcome.failed += 1;
                log::warn!("[{}] Item failed: {}", stage, e);
            }
            Err(panic) => {
                outcome.failed += 1;
                log::error!("[{}] Item panicked: {}", stage, panic_message(&*panic));
            }
        }
    }

    Ok(outcome)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::testing::FakeTransport;
    use crate::utils::http::Transport;
    use std::time::Duration;

    #[tokio::test]
    async fn test_bounded_in_flight() {
        let urls: Vec<String> = (0..20).map(|i| format!("http://r{i}.test/")).collect();
        let transport = FakeTransport::new().with_latency(Duration::from_millis(10));
        let transport = &transport;

        let outcome = run_stage("test", urls, 3, move |url| async move {
            transport.fetch(&url).await.map(|r| r.status)
        })
        .await
        .unwrap();

        assert_eq!(outcome.succeeded.len(), 20);
        assert_eq!(transport.max_in_flight(), 3);
    }

    #[tokio::test]
    async fn test_failures_do_not_affect_siblings() {
        let outcome = run_stage("test", (0..10).collect(), 4, |i: u32| async move {
            match i {
                3 => Err(AppError::status("http://r.test/3", 500)),
                7 => panic!("item {i} exploded"),
                _ => Ok(i * 10),
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome.total, 10);
        assert_eq!(outcome.failed, 2);
        let mut values = outcome.succeeded.clone();
        values.sort();
        assert_eq!(values, vec![0, 10, 20, 40, 50, 60, 80, 90]);

        let report = outcome.report("test", 8);
        assert_eq!(report.succeeded, 8);
        assert_eq!(report.to_string(), "test: 10 items, 8 succeeded, 2 failed, 8 created");
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_stage() {
        let result = run_stage("test", (0..5).collect(), 1, |i: u32| async move {
            if i == 2 {
                Err(AppError::CatalogUnavailable {
                    attempts: 5,
                    message: "refused".into(),
                })
            } else {
                Ok(i)
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::CatalogUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_empty_work_list() {
        let outcome = run_stage("test", Vec::<u32>::new(), 4, |i| async move { Ok(i) })
            .await
            .unwrap();
        assert_eq!(outcome.total, 0);
        assert!(outcome.succeeded.is_empty());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
