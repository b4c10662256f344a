/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use aws_smithy_types::byte_stream::ByteStream;

use crate::error;
use crate::types::Headers;

/// Fluent builder for constructing a single object download
#[derive(Debug)]
pub struct GetFileFluentBuilder {
    handle: Arc<crate::client::Handle>,
    key: Option<String>,
    headers: Headers,
}

impl GetFileFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            key: None,
            headers: Headers::new(),
        }
    }

    /// Download the object.
    ///
    /// Only the `range`, `if-modified-since`, `if-unmodified-since`, `if-match` and
    /// `if-none-match` headers are forwarded to the store; all others are dropped.
    #[tracing::instrument(skip_all, level = "debug", name = "get-file", fields(
        key = self.key.as_deref().unwrap_or_default(),
    ))]
    pub async fn send(self) -> Result<ByteStream, error::Error> {
        let key = self
            .key
            .ok_or_else(|| error::invalid_input("key is required"))?;
        crate::operation::get_file::GetFile::orchestrate(self.handle, key, self.headers).await
    }

    /// The key of the object to download.
    /// Required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// The key of the object to download.
    pub fn get_key(&self) -> Option<&str> {
        self.key.as_deref()
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
