/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use crate::types::RetryPolicy;

/// Fibonacci backoff with optional jitter.
///
/// The un-jittered sequence is `initial, initial, 2 * initial, 3 * initial, 5 * initial, ...`
/// capped at `max`. Each instance owns the running pair of the sequence and must not be
/// shared between retry sequences.
#[derive(Debug, Clone)]
pub(crate) struct FibonacciBackoff {
    initial: Duration,
    max: Duration,
    jitter_factor: f64,
    /// The two most recent base delays, `(delay[n-2], delay[n-1])`
    prev: Duration,
    curr: Duration,
    started: bool,
}

impl FibonacciBackoff {
    pub(crate) fn new(policy: &RetryPolicy) -> Self {
        Self {
            initial: policy.initial_delay(),
            max: policy.max_delay(),
            jitter_factor: policy.jitter_factor(),
            prev: Duration::ZERO,
            curr: Duration::ZERO,
            started: false,
        }
    }

    /// Advance the sequence and return the next (jittered) delay.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let base = self.next_base();
        self.jitter(base, fastrand::f64() * 2.0 - 1.0)
    }

    /// Advance the un-jittered sequence.
    fn next_base(&mut self) -> Duration {
        let next = if self.started {
            self.prev.saturating_add(self.curr).min(self.max)
        } else {
            self.started = true;
            self.initial.min(self.max)
        };
        self.prev = self.curr;
        self.curr = next;
        next
    }

    /// Perturb `base` by `base * jitter_factor * unit` where `unit` is in `[-1, 1]`, clamped
    /// to `[0, max]`.
    fn jitter(&self, base: Duration, unit: f64) -> Duration {
        if self.jitter_factor == 0.0 {
            return base;
        }
        let offset = base.as_secs_f64() * self.jitter_factor * unit.clamp(-1.0, 1.0);
        let jittered = (base.as_secs_f64() + offset).max(0.0);
        // seconds beyond what a Duration can hold are over `max` anyway
        Duration::try_from_secs_f64(jittered).map_or(self.max, |delay| delay.min(self.max))
    }
}

/// The `n`th (zero based) un-jittered delay for `policy`.
pub(crate) fn base_delay(policy: &RetryPolicy, n: usize) -> Duration {
    let mut backoff = FibonacciBackoff::new(policy);
    let mut delay = Duration::ZERO;
    for _ in 0..=n {
        delay = backoff.next_base();
    }
    delay
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(initial_ms: u64, max_ms: u64, jitter: f64) -> RetryPolicy {
        RetryPolicy::builder()
            .initial_delay(Duration::from_millis(initial_ms))
            .max_delay(Duration::from_millis(max_ms))
            .jitter_factor(jitter)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fibonacci_sequence() {
        let mut backoff = FibonacciBackoff::new(&policy(100, 10_000, 0.0));
        let delays: Vec<u128> = (0..7).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(vec![100, 100, 200, 300, 500, 800, 1300], delays);
    }

    #[test]
    fn test_capped_at_max_delay() {
        let mut backoff = FibonacciBackoff::new(&policy(100, 450, 0.0));
        let delays: Vec<u128> = (0..7).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(vec![100, 100, 200, 300, 450, 450, 450], delays);
    }

    #[test]
    fn test_base_delay_non_decreasing_and_bounded() {
        for (initial, max) in [(1, 1), (1, 600_000), (1000, 600_000), (250, 1000)] {
            let policy = policy(initial, max, 0.3);
            let mut last = Duration::ZERO;
            for n in 0..64 {
                let delay = base_delay(&policy, n);
                assert!(delay >= last, "delay[{n}] = {delay:?} < {last:?}");
                assert!(delay <= policy.max_delay());
                last = delay;
            }
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let backoff = FibonacciBackoff::new(&policy(1000, 1500, 0.5));
        let base = Duration::from_millis(1000);
        assert_eq!(Duration::from_millis(500), backoff.jitter(base, -1.0));
        assert_eq!(Duration::from_millis(1000), backoff.jitter(base, 0.0));
        // 1500 would be reached at +1.0 exactly, anything above is clamped
        assert_eq!(Duration::from_millis(1500), backoff.jitter(Duration::from_millis(1400), 1.0));
    }

    #[test]
    fn test_jittered_delays_stay_within_range() {
        let policy = policy(10, 200, 1.0);
        let mut backoff = FibonacciBackoff::new(&policy);
        for _ in 0..1000 {
            let delay = backoff.next_delay();
            assert!(delay <= policy.max_delay());
        }
    }

    #[test]
    fn test_jitter_near_duration_max() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::MAX)
            .max_delay(Duration::MAX)
            .jitter_factor(0.3)
            .build()
            .unwrap();
        let mut backoff = FibonacciBackoff::new(&policy);
        assert_eq!(Duration::MAX, backoff.jitter(Duration::MAX, 0.5));
        assert!(backoff.jitter(Duration::MAX, -1.0) < Duration::MAX);
        for _ in 0..5 {
            assert!(backoff.next_delay() <= Duration::MAX);
        }
    }

    #[test]
    fn test_zero_initial_delay() {
        let mut backoff = FibonacciBackoff::new(&policy(0, 100, 0.3));
        for _ in 0..10 {
            assert_eq!(Duration::ZERO, backoff.next_delay());
        }
    }
}
