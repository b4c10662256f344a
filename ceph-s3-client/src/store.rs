/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::byte_stream::ByteStream;

use crate::error::{self, Error};
use crate::transport::SharedTransport;
use crate::types::{Headers, UploadRequest};

/// Headers that may be forwarded on a download; anything else is dropped.
const GET_HEADER_WHITELIST: &[&str] = &[
    "range",
    "if-modified-since",
    "if-unmodified-since",
    "if-match",
    "if-none-match",
];

/// Status the store must answer a bucket creation with.
const BUCKET_CREATED: u16 = 200;

/// Single-object operations against the tenant bucket.
#[derive(Debug, Clone)]
pub(crate) struct ObjectStore {
    transport: SharedTransport,
}

impl ObjectStore {
    pub(crate) fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    /// Create the bucket.
    ///
    /// Any status other than 200 fails, including the ones some stores use to report that
    /// the bucket already exists.
    pub(crate) async fn ensure_bucket(&self) -> Result<(), Error> {
        let status = self.transport.create_bucket().await?;
        if status.as_u16() != BUCKET_CREATED {
            return Err(error::unexpected_status(
                "couldn't create bucket",
                status.as_u16(),
            ));
        }
        Ok(())
    }

    /// Upload a single object, returning its key on success.
    pub(crate) async fn put_object(&self, request: &UploadRequest) -> Result<String, Error> {
        let status = self
            .transport
            .put_object(request.payload.clone(), &request.key, &request.headers)
            .await?;
        if !status.is_success() {
            return Err(error::unexpected_status("put object", status.as_u16()));
        }
        tracing::trace!("stored object {:?} ({} bytes)", request.key, request.payload.len());
        Ok(request.key.clone())
    }

    /// Download a single object. Only whitelisted conditional/range headers are forwarded.
    pub(crate) async fn get_object(&self, key: &str, headers: &Headers) -> Result<ByteStream, Error> {
        let headers = whitelist_get_headers(headers);
        self.transport.get_object(key, &headers).await
    }
}

fn whitelist_get_headers(headers: &Headers) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.to_ascii_lowercase();
            if GET_HEADER_WHITELIST.contains(&name.as_str()) {
                Some((name, value.clone()))
            } else {
                tracing::trace!("dropping header `{name}` from download request");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use aws_smithy_runtime_api::http::StatusCode;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct StaticStatus {
        status: u16,
        seen_headers: Mutex<Option<Headers>>,
    }

    impl StaticStatus {
        fn new(status: u16) -> Self {
            Self {
                status,
                seen_headers: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Transport for StaticStatus {
        async fn create_bucket(&self) -> Result<StatusCode, Error> {
            Ok(StatusCode::try_from(self.status).unwrap())
        }

        async fn put_object(
            &self,
            _body: Bytes,
            _key: &str,
            _headers: &Headers,
        ) -> Result<StatusCode, Error> {
            Ok(StatusCode::try_from(self.status).unwrap())
        }

        async fn get_object(&self, _key: &str, headers: &Headers) -> Result<ByteStream, Error> {
            *self.seen_headers.lock().unwrap() = Some(headers.clone());
            Ok(ByteStream::from_static(b"data"))
        }
    }

    fn store_answering(status: u16) -> (ObjectStore, std::sync::Arc<StaticStatus>) {
        let transport = std::sync::Arc::new(StaticStatus::new(status));
        (ObjectStore::new(transport.clone().into()), transport)
    }

    #[tokio::test]
    async fn test_ensure_bucket_requires_ok() {
        let (store, _) = store_answering(200);
        store.ensure_bucket().await.unwrap();

        let (store, _) = store_answering(409);
        let err = store.ensure_bucket().await.unwrap_err();
        assert_eq!(&ErrorKind::TransportFailed { status: Some(409) }, err.kind());
    }

    #[tokio::test]
    async fn test_put_object_status_handling() {
        let request = UploadRequest::new("key", "payload");

        let (store, _) = store_answering(200);
        assert_eq!("key", store.put_object(&request).await.unwrap());

        for status in [301, 403, 500, 503] {
            let (store, _) = store_answering(status);
            let err = store.put_object(&request).await.unwrap_err();
            assert_eq!(
                &ErrorKind::TransportFailed {
                    status: Some(status)
                },
                err.kind()
            );
            assert!(err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_get_object_drops_unlisted_headers() {
        let (store, transport) = store_answering(200);
        let mut headers = Headers::new();
        headers.insert("Range".to_owned(), "bytes=0-3".to_owned());
        headers.insert("if-none-match".to_owned(), "\"etag\"".to_owned());
        headers.insert("x-amz-meta-foo".to_owned(), "bar".to_owned());
        headers.insert("authorization".to_owned(), "nope".to_owned());

        let body = store.get_object("key", &headers).await.unwrap();
        assert_eq!(b"data".as_slice(), &body.collect().await.unwrap().into_bytes()[..]);

        let seen = transport.seen_headers.lock().unwrap().clone().unwrap();
        assert_eq!(2, seen.len());
        assert_eq!(Some("bytes=0-3"), seen.get("range").map(String::as_str));
        assert_eq!(Some("\"etag\""), seen.get("if-none-match").map(String::as_str));
    }
}
