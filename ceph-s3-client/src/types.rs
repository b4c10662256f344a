/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;

use crate::error;

/// Request headers, keyed by header name.
pub type Headers = HashMap<String, String>;

/// The concurrency settings to use for a batch upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConcurrencySetting {
    /// Every request of the batch may have a transport call in flight at the same time.
    #[default]
    Unbounded,

    /// Explicit upper bound on simultaneous in-flight transport calls.
    ///
    /// A value of zero is treated as one.
    Explicit(usize),
}

/// How bucket names are encoded in request URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressingStyle {
    /// `https://endpoint/bucket/key`
    #[default]
    Path,

    /// `https://bucket.endpoint/key`
    VirtualHost,
}

impl std::str::FromStr for AddressingStyle {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(AddressingStyle::Path),
            "virtual-host" | "virtual" => Ok(AddressingStyle::VirtualHost),
            other => Err(error::invalid_input(format!(
                "unknown addressing style `{other}`, expected `path` or `virtual-host`"
            ))),
        }
    }
}

/// A single object ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub(crate) payload: Bytes,
    pub(crate) key: String,
    pub(crate) headers: Headers,
}

impl UploadRequest {
    /// Create a new request with no headers.
    pub fn new(key: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            key: key.into(),
            headers: Headers::new(),
        }
    }

    /// Add a header to send along with the object.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The object contents.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The object key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Headers sent along with the object.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// Payload contents of a [`PartialRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialBody {
    /// Raw bytes
    Bytes(Bytes),
    /// UTF-8 text
    Text(String),
}

impl PartialBody {
    pub(crate) fn into_bytes(self) -> Bytes {
        match self {
            PartialBody::Bytes(bytes) => bytes,
            PartialBody::Text(text) => Bytes::from(text),
        }
    }
}

/// A caller supplied request where any field may be missing.
///
/// Missing keys are generated and missing headers come from the batch defaults. A missing
/// payload is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRequest {
    /// Object contents
    pub payload: Option<PartialBody>,
    /// Object key, generated from the batch key prefix when absent
    pub key: Option<String>,
    /// Headers, merged over the batch default headers
    pub headers: Headers,
}

impl PartialRequest {
    /// Create an empty partial request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set raw byte contents.
    pub fn bytes(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(PartialBody::Bytes(payload.into()));
        self
    }

    /// Set text contents.
    pub fn text(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(PartialBody::Text(payload.into()));
        self
    }

    /// Set the object key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Any payload shape accepted by a batch upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw bytes, uploaded under a generated key
    Bytes(Bytes),
    /// UTF-8 text, uploaded under a generated key
    Text(String),
    /// A (possibly incomplete) request
    Partial(PartialRequest),
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(value))
    }
}

impl From<&'static [u8]> for Payload {
    fn from(value: &'static [u8]) -> Self {
        Payload::Bytes(Bytes::from_static(value))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_owned())
    }
}

impl From<PartialRequest> for Payload {
    fn from(value: PartialRequest) -> Self {
        Payload::Partial(value)
    }
}

impl From<UploadRequest> for Payload {
    fn from(value: UploadRequest) -> Self {
        Payload::Partial(PartialRequest {
            payload: Some(PartialBody::Bytes(value.payload)),
            key: Some(value.key),
            headers: value.headers,
        })
    }
}

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(600);
const DEFAULT_JITTER_FACTOR: f64 = 0.3;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Retry behaviour for each upload of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Create a new `RetryPolicy` builder
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Delay before the first retry
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound of any single delay
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Relative amount of randomization applied to each delay, in `[0, 1]`
    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    /// Total number of attempts per upload, including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The un-jittered delay waited before retry `n` (zero based).
    pub fn base_delay(&self, n: usize) -> Duration {
        crate::runtime::backoff::base_delay(self, n)
    }
}

/// Builder for [`RetryPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RetryPolicyBuilder {
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    jitter_factor: Option<f64>,
    max_attempts: Option<u32>,
}

impl RetryPolicyBuilder {
    /// Delay before the first retry. Default is one second.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Upper bound of any single delay. Default is ten minutes.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Relative amount of randomization applied to each delay. Default is `0.3`.
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = Some(factor);
        self
    }

    /// Total number of attempts per upload, including the first one. Default is 5.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Consumes the builder and constructs a [`RetryPolicy`]
    pub fn build(self) -> Result<RetryPolicy, error::Error> {
        let policy = RetryPolicy {
            initial_delay: self.initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY),
            max_delay: self.max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            jitter_factor: self.jitter_factor.unwrap_or(DEFAULT_JITTER_FACTOR),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        };

        if policy.max_attempts == 0 {
            return Err(error::invalid_input("max_attempts must be at least 1"));
        }
        if !(0.0..=1.0).contains(&policy.jitter_factor) {
            return Err(error::invalid_input(format!(
                "jitter_factor must be within [0, 1], got {}",
                policy.jitter_factor
            )));
        }
        if policy.initial_delay > policy.max_delay {
            return Err(error::invalid_input(format!(
                "initial_delay ({:?}) must not exceed max_delay ({:?})",
                policy.initial_delay, policy.max_delay
            )));
        }

        Ok(policy)
    }
}
