/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep, Sleep};
use aws_smithy_runtime_api::http::StatusCode;
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use ceph_s3_client::error::{Error, ErrorKind};
use ceph_s3_client::transport::{SharedTransport, Transport};
use ceph_s3_client::types::Headers;
use ceph_s3_client::{Client, Config};

#[doc(hidden)]
pub mod __private {
    pub use aws_smithy_mocks_experimental;
    pub use aws_smithy_runtime;
    pub use aws_smithy_types;
    pub use http_02x;
}

/// Create a mock S3 client whose HTTP client answers every request with an empty `200 OK`.
///
/// Rules using `then_http_response` replace that response, so their status codes reach the
/// caller instead of a dispatch failure.
#[macro_export]
macro_rules! mock_client_with_stubbed_http_client {
    ($aws_crate: ident, $rules: expr) => {
        $crate::mock_client_with_stubbed_http_client!(
            $aws_crate,
            $crate::__private::aws_smithy_mocks_experimental::RuleMode::Sequential,
            $rules
        )
    };
    ($aws_crate: ident, $rule_mode: expr, $rules: expr) => {{
        $crate::__private::aws_smithy_mocks_experimental::mock_client!(
            $aws_crate,
            $rule_mode,
            $rules,
            |client_builder: $aws_crate::config::Builder| {
                client_builder.http_client(
                    $crate::__private::aws_smithy_runtime::client::http::test_util::infallible_client_fn(
                        |_req| {
                            $crate::__private::http_02x::Response::builder()
                                .status(200)
                                .body($crate::__private::aws_smithy_types::body::SdkBody::empty())
                                .unwrap()
                        },
                    ),
                )
            }
        )
    }};
}

/// How a scripted key misbehaves
#[derive(Debug, Clone, Copy)]
enum Failure {
    /// Answer every attempt with this status
    Always(u16),
    /// Answer the next `n` attempts with this status, then succeed
    Times(u32, u16),
    /// Fail every attempt without a response
    Unreachable,
}

#[derive(Debug)]
struct State {
    bucket_status: u16,
    failures: HashMap<String, Failure>,
    attempts: HashMap<String, u32>,
    objects: HashMap<String, (Bytes, Headers)>,
    get_headers: Vec<Headers>,
}

/// In-memory [`Transport`] with scripted failures.
///
/// Every key succeeds with `200 OK` unless told otherwise.
#[derive(Debug)]
pub struct FakeTransport {
    state: Mutex<State>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                bucket_status: 200,
                failures: HashMap::new(),
                attempts: HashMap::new(),
                objects: HashMap::new(),
                get_headers: Vec::new(),
            }),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make every `put_object` take `delay` (on the tokio clock)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Status returned by `create_bucket`
    pub fn bucket_status(self, status: u16) -> Self {
        self.state.lock().unwrap().bucket_status = status;
        self
    }

    /// Answer every put of `key` with `status`
    pub fn fail_always(self, key: &str, status: u16) -> Self {
        self.script(key, Failure::Always(status))
    }

    /// Answer the first `times` puts of `key` with `status`
    pub fn fail_times(self, key: &str, times: u32, status: u16) -> Self {
        self.script(key, Failure::Times(times, status))
    }

    /// Fail every put of `key` without a response
    pub fn unreachable(self, key: &str) -> Self {
        self.script(key, Failure::Unreachable)
    }

    fn script(self, key: &str, failure: Failure) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(key.to_owned(), failure);
        self
    }

    /// Number of `put_object` calls made for `key`
    pub fn attempts(&self, key: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    /// Total number of `put_object` calls
    pub fn total_attempts(&self) -> u32 {
        self.state.lock().unwrap().attempts.values().sum()
    }

    /// Body stored under `key`
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(key)
            .map(|(body, _)| body.clone())
    }

    /// Headers sent with the object stored under `key`
    pub fn object_headers(&self, key: &str) -> Option<Headers> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(key)
            .map(|(_, headers)| headers.clone())
    }

    /// Headers received by each `get_object` call, in call order
    pub fn get_headers(&self) -> Vec<Headers> {
        self.state.lock().unwrap().get_headers.clone()
    }

    /// Highest number of `put_object` calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Record an attempt and decide its answer
    fn answer(&self, body: Bytes, key: &str, headers: &Headers) -> Result<u16, Error> {
        let mut state = self.state.lock().unwrap();
        *state.attempts.entry(key.to_owned()).or_default() += 1;
        let status = match state.failures.get_mut(key) {
            Some(Failure::Always(status)) => *status,
            Some(Failure::Times(remaining, status)) if *remaining > 0 => {
                *remaining -= 1;
                *status
            }
            Some(Failure::Unreachable) => {
                return Err(Error::new(
                    ErrorKind::TransportFailed { status: None },
                    "connection refused",
                ))
            }
            _ => 200,
        };
        if status == 200 {
            state
                .objects
                .insert(key.to_owned(), (body, headers.clone()));
        }
        Ok(status)
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::try_from(status).expect("valid status code")
}

#[async_trait]
impl Transport for FakeTransport {
    async fn create_bucket(&self) -> Result<StatusCode, Error> {
        let status = self.state.lock().unwrap().bucket_status;
        Ok(status_code(status))
    }

    async fn put_object(
        &self,
        body: Bytes,
        key: &str,
        headers: &Headers,
    ) -> Result<StatusCode, Error> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.answer(body, key, headers);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map(status_code)
    }

    async fn get_object(&self, key: &str, headers: &Headers) -> Result<ByteStream, Error> {
        let mut state = self.state.lock().unwrap();
        state.get_headers.push(headers.clone());
        match state.objects.get(key) {
            Some((body, _)) => Ok(ByteStream::from(body.clone())),
            None => Err(Error::new(
                ErrorKind::TransportFailed { status: Some(404) },
                format!("no such key: {key}"),
            )),
        }
    }
}

/// [`AsyncSleep`] that records each requested duration and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleep {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleep {
    /// Durations requested so far, in call order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl AsyncSleep for RecordingSleep {
    fn sleep(&self, duration: Duration) -> Sleep {
        self.delays.lock().unwrap().push(duration);
        Sleep::new(std::future::ready(()))
    }
}

/// Create a client for the built-in `test` tenant backed by `transport`
pub fn client_for(transport: &Arc<FakeTransport>, sleep: &RecordingSleep) -> Client {
    let config = Config::builder()
        .username("test")
        .transport(SharedTransport::from(transport.clone()))
        .sleep_impl(SharedAsyncSleep::new(sleep.clone()))
        .build()
        .unwrap();
    Client::new(config).unwrap()
}
