/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error;
use crate::types::{Headers, PartialBody, UploadRequest};

/// Fluent builder for constructing a single object upload
#[derive(Debug)]
pub struct StoreFileFluentBuilder {
    handle: Arc<crate::client::Handle>,
    key: Option<String>,
    payload: Option<PartialBody>,
    headers: Headers,
}

impl StoreFileFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            key: None,
            payload: None,
            headers: Headers::new(),
        }
    }

    /// Upload the object, returning its key.
    #[tracing::instrument(skip_all, level = "debug", name = "store-file", fields(
        key = self.key.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<String, error::Error> {
        let key = self
            .key
            .ok_or_else(|| error::invalid_input("key is required"))?;
        let payload = self
            .payload
            .ok_or_else(|| error::malformed_payload(format!("no payload given for `{key}`")))?;
        let request = UploadRequest {
            payload: payload.into_bytes(),
            key,
            headers: self.headers,
        };
        crate::operation::store_file::StoreFile::orchestrate(self.handle, request).await
    }

    /// The key to store the object under.
    /// Required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// The key to store the object under.
    pub fn get_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Text contents, encoded as UTF-8.
    /// Either this or [`bytes`](Self::bytes) is required.
    pub fn payload(mut self, input: impl Into<String>) -> Self {
        self.payload = Some(PartialBody::Text(input.into()));
        self
    }

    /// Raw byte contents.
    pub fn bytes(mut self, input: impl Into<bytes::Bytes>) -> Self {
        self.payload = Some(PartialBody::Bytes(input.into()));
        self
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace all request headers.
    pub fn set_headers(mut self, input: Headers) -> Self {
        self.headers = input;
        self
    }

    /// Request headers.
    pub fn get_headers(&self) -> &Headers {
        &self.headers
    }
}

impl UploadRequest {
    /// Upload this request using the given client, without retries.
    pub async fn send_with(self, client: &crate::Client) -> Result<String, error::Error> {
        crate::operation::store_file::StoreFile::orchestrate(client.handle.clone(), self).await
    }
}
