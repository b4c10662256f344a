/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error;
use crate::types::{ConcurrencySetting, Headers, Payload, RetryPolicy};

use super::{StoreFiles, StoreFilesHandle, StoreFilesOutput};

/// Fluent builder for constructing a batch upload with retries
#[derive(Debug)]
pub struct StoreFilesFluentBuilder {
    handle: Arc<crate::client::Handle>,
    payloads: Vec<Payload>,
    key_prefix: String,
    default_headers: Headers,
    retry_policy: Option<RetryPolicy>,
    concurrency: Option<ConcurrencySetting>,
}

impl StoreFilesFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            payloads: Vec::new(),
            key_prefix: String::new(),
            default_headers: Headers::new(),
            retry_policy: None,
            concurrency: None,
        }
    }

    /// Initiate the batch upload.
    ///
    /// Payloads are normalized before anything is sent: a malformed payload or a duplicate key
    /// fails the whole batch here and no object is uploaded. Must be called from within a
    /// tokio runtime.
    #[tracing::instrument(skip_all, level = "debug", name = "store-files", fields(
        key_prefix = self.key_prefix.as_str(),
        payloads = self.payloads.len(),
    ))]
    pub fn initiate(self) -> Result<StoreFilesHandle, error::Error> {
        let requests =
            super::normalize(self.payloads, &self.default_headers, &self.key_prefix)?;
        let retry_policy = self
            .retry_policy
            .unwrap_or_else(|| self.handle.config.retry_policy().clone());
        let concurrency = self
            .concurrency
            .unwrap_or_else(|| self.handle.config.concurrency().clone());
        Ok(StoreFiles::orchestrate(
            self.handle,
            requests,
            retry_policy,
            concurrency,
        ))
    }

    /// Initiate the batch upload and wait for every object to reach a final outcome.
    pub async fn send(self) -> Result<StoreFilesOutput, error::Error> {
        let handle = self.initiate()?;
        Ok(handle.join().await)
    }

    /// Append a single payload to the batch.
    pub fn payload(mut self, input: impl Into<Payload>) -> Self {
        self.payloads.push(input.into());
        self
    }

    /// Append several payloads to the batch.
    pub fn payloads<I>(mut self, inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Payload>,
    {
        self.payloads.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Replace the payloads of the batch.
    pub fn set_payloads(mut self, input: Vec<Payload>) -> Self {
        self.payloads = input;
        self
    }

    /// Payloads of the batch.
    pub fn get_payloads(&self) -> &[Payload] {
        &self.payloads
    }

    /// Prefix for generated keys. Payloads without a key are stored under this prefix
    /// followed by their 1-based position among keyless payloads.
    pub fn key_prefix(mut self, input: impl Into<String>) -> Self {
        self.key_prefix = input.into();
        self
    }

    /// Prefix for generated keys.
    pub fn get_key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Add a header sent with every object unless the payload sets it itself.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Replace the default headers.
    pub fn set_default_headers(mut self, input: Headers) -> Self {
        self.default_headers = input;
        self
    }

    /// Headers sent with every object.
    pub fn get_default_headers(&self) -> &Headers {
        &self.default_headers
    }

    /// Retry policy for each object. Defaults to the client's configured policy.
    pub fn retry_policy(mut self, input: RetryPolicy) -> Self {
        self.retry_policy = Some(input);
        self
    }

    /// Retry policy for each object.
    pub fn get_retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    /// Bound on transport calls in flight across the batch. Defaults to the client's
    /// configured setting.
    pub fn concurrency(mut self, input: ConcurrencySetting) -> Self {
        self.concurrency = Some(input);
        self
    }

    /// Bound on transport calls in flight across the batch.
    pub fn get_concurrency(&self) -> Option<&ConcurrencySetting> {
        self.concurrency.as_ref()
    }
}
