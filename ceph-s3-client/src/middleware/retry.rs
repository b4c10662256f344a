/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep};
use futures_util::future::BoxFuture;
use tokio::sync::watch;

use crate::error::Error;
use crate::runtime::backoff::FibonacciBackoff;
use crate::types::RetryPolicy;

/// Progress of a single retry sequence.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttemptState {
    /// Number of failed attempts so far
    pub(crate) attempt: u32,
    /// Delay waited before the most recent retry
    pub(crate) last_delay: Duration,
}

/// A `tower::retry::Policy` implementation retrying retryable errors with Fibonacci backoff.
///
/// `tower::retry::Retry` clones the policy for every request it receives, so each request
/// gets its own [`AttemptState`] and backoff sequence.
#[derive(Debug, Clone)]
pub(crate) struct UploadRetryPolicy {
    backoff: FibonacciBackoff,
    state: AttemptState,
    max_attempts: u32,
    sleep_impl: SharedAsyncSleep,
    cancel_rx: watch::Receiver<bool>,
}

impl UploadRetryPolicy {
    pub(crate) fn new(
        policy: &RetryPolicy,
        sleep_impl: SharedAsyncSleep,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            backoff: FibonacciBackoff::new(policy),
            state: AttemptState::default(),
            max_attempts: policy.max_attempts(),
            sleep_impl,
            cancel_rx,
        }
    }
}

/// Resolves once cancellation has been signalled. Never resolves if the sender is gone.
pub(crate) async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    let closed = cancel_rx.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

impl<Req, Res> tower::retry::Policy<Req, Res, Error> for UploadRetryPolicy
where
    Req: Clone,
{
    type Future = BoxFuture<'static, ()>;

    fn retry(&mut self, _req: &mut Req, result: &mut Result<Res, Error>) -> Option<Self::Future> {
        let err = match result {
            Ok(_) => return None,
            Err(err) => err,
        };

        self.state.attempt += 1;
        if !err.is_retryable() {
            tracing::debug!("attempt {} failed with non-retryable error: {err}", self.state.attempt);
            return None;
        }
        if self.state.attempt >= self.max_attempts {
            tracing::debug!(
                "attempt {} of {} failed, giving up (last backoff {:?}): {err}",
                self.state.attempt,
                self.max_attempts,
                self.state.last_delay
            );
            return None;
        }

        let delay = self.backoff.next_delay();
        self.state.last_delay = delay;
        tracing::debug!(
            "attempt {} of {} failed, retrying in {:?}: {err}",
            self.state.attempt,
            self.max_attempts,
            delay
        );

        let sleep = self.sleep_impl.sleep(delay);
        let mut cancel_rx = self.cancel_rx.clone();
        Some(Box::pin(async move {
            tokio::select! {
                _ = sleep => {}
                _ = cancelled(&mut cancel_rx) => {
                    tracing::debug!("received cancellation signal, backoff interrupted");
                }
            }
        }))
    }

    fn clone_request(&mut self, req: &Req) -> Option<Req> {
        Some(req.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{self, ErrorKind};
    use aws_smithy_async::rt::sleep::{Sleep, TokioSleep};
    use std::sync::{Arc, Mutex};
    use tower::retry::Policy;

    #[derive(Debug, Default, Clone)]
    struct RecordingSleep(Arc<Mutex<Vec<Duration>>>);

    impl AsyncSleep for RecordingSleep {
        fn sleep(&self, duration: Duration) -> Sleep {
            self.0.lock().unwrap().push(duration);
            Sleep::new(std::future::ready(()))
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::builder()
            .initial_delay(Duration::from_millis(10))
            .max_delay(Duration::from_millis(100))
            .jitter_factor(0.0)
            .max_attempts(max_attempts)
            .build()
            .unwrap()
    }

    fn transport_error() -> Result<(), Error> {
        Err(error::unexpected_status("put object", 500))
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let sleeps = RecordingSleep::default();
        let (_tx, rx) = watch::channel(false);
        let mut policy = UploadRetryPolicy::new(&policy(3), SharedAsyncSleep::new(sleeps.clone()), rx);

        for _ in 0..2 {
            let backoff = policy.retry(&mut (), &mut transport_error()).expect("should retry");
            backoff.await;
        }
        assert!(policy.retry(&mut (), &mut transport_error()).is_none());
        assert_eq!(3, policy.state.attempt);
        assert_eq!(
            vec![Duration::from_millis(10), Duration::from_millis(10)],
            *sleeps.0.lock().unwrap()
        );
    }

    #[tokio::test]
    async fn test_success_and_non_retryable_errors_are_final() {
        let (_tx, rx) = watch::channel(false);
        let mut policy = UploadRetryPolicy::new(&policy(5), SharedAsyncSleep::new(TokioSleep::new()), rx);

        assert!(policy.retry(&mut (), &mut Ok::<_, Error>(())).is_none());

        let mut result: Result<(), Error> = Err(error::operation_cancelled());
        assert!(policy.retry(&mut (), &mut result).is_none());
        assert_eq!(
            &ErrorKind::OperationCancelled,
            result.unwrap_err().kind()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let (tx, rx) = watch::channel(false);
        let long = RetryPolicy::builder()
            .initial_delay(Duration::from_secs(3600))
            .max_delay(Duration::from_secs(3600))
            .jitter_factor(0.0)
            .build()
            .unwrap();
        let mut policy = UploadRetryPolicy::new(&long, SharedAsyncSleep::new(TokioSleep::new()), rx);

        let backoff = policy.retry(&mut (), &mut transport_error()).unwrap();
        let mut backoff = tokio_test::task::spawn(backoff);
        tokio_test::assert_pending!(backoff.poll());

        tx.send(true).unwrap();
        assert!(backoff.is_woken());
        tokio_test::assert_ready!(backoff.poll());
    }
}
