/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_smithy_runtime_api::http::StatusCode;
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::error::Error;
use crate::types::Headers;

/// Transport backed by the AWS SDK for Amazon S3
pub mod s3;

pub use s3::S3Transport;

/// Wire-level access to a single bucket of an S3-compatible object store.
///
/// Implementations report the status code the store answered with and leave it to the
/// caller to decide what counts as success. An `Err` is reserved for failures where no
/// response was received at all (connection refused, timeouts, ...) and should use
/// [`ErrorKind::TransportFailed`](crate::error::ErrorKind::TransportFailed).
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Issue a `PUT` against the bucket root, creating the bucket.
    async fn create_bucket(&self) -> Result<StatusCode, Error>;

    /// Store `body` under `key`.
    async fn put_object(
        &self,
        body: Bytes,
        key: &str,
        headers: &Headers,
    ) -> Result<StatusCode, Error>;

    /// Fetch the object stored under `key`.
    async fn get_object(&self, key: &str, headers: &Headers) -> Result<ByteStream, Error>;
}

/// A reference-counted [`Transport`] that can be shared between clients.
#[derive(Clone, Debug)]
pub struct SharedTransport(Arc<dyn Transport>);

impl SharedTransport {
    /// Wrap a transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self(Arc::new(transport))
    }
}

impl std::ops::Deref for SharedTransport {
    type Target = dyn Transport;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl<T: Transport + 'static> From<Arc<T>> for SharedTransport {
    fn from(value: Arc<T>) -> Self {
        Self(value)
    }
}
