/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::http::StatusCode;
use aws_smithy_types::byte_stream::ByteStream;
use aws_smithy_types::date_time::{DateTime, Format};
use bytes::Bytes;

use crate::credentials::Credential;
use crate::error::{self, Error, ErrorKind};
use crate::types::{AddressingStyle, Headers};

/// Region sent with every request. Ceph ignores it but SigV4 requires one.
const DEFAULT_REGION: &str = "us-east-1";

const PROVIDER_NAME: &str = "ceph-s3-client";

/// [`Transport`](crate::transport::Transport) implementation on top of [`aws_sdk_s3::Client`].
///
/// SDK level retries are disabled; retrying is the responsibility of the caller.
#[derive(Debug, Clone)]
pub struct S3Transport {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Transport {
    /// Create a transport from an existing S3 client.
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create a transport for the store listening at `endpoint_url`, authenticating with
    /// `credential`.
    pub fn from_endpoint(
        endpoint_url: impl Into<String>,
        style: AddressingStyle,
        bucket: impl Into<String>,
        credential: &Credential,
    ) -> Self {
        let credentials = Credentials::new(
            credential.access_key(),
            credential.secret_key(),
            None,
            None,
            PROVIDER_NAME,
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(DEFAULT_REGION))
            .endpoint_url(endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(style == AddressingStyle::Path)
            .retry_config(RetryConfig::disabled())
            .build();
        Self::new(aws_sdk_s3::Client::from_conf(config), bucket)
    }

    /// The bucket this transport operates on
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn ok_status() -> StatusCode {
    StatusCode::try_from(200).expect("200 is a valid status code")
}

/// Split an SDK error into the status the store answered with, or a transport error when
/// no response was received.
fn status_of<E>(err: SdkError<E, HttpResponse>) -> Result<StatusCode, Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match err.raw_response().map(|resp| resp.status()) {
        Some(status) => Ok(status),
        None => Err(Error::new(ErrorKind::TransportFailed { status: None }, err)),
    }
}

fn parse_http_date(name: &str, value: &str) -> Result<DateTime, Error> {
    DateTime::from_str(value, Format::HttpDate)
        .map_err(|err| error::invalid_input(format!("invalid `{name}` header value: {err}")))
}

#[async_trait]
impl crate::transport::Transport for S3Transport {
    async fn create_bucket(&self) -> Result<StatusCode, Error> {
        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(ok_status()),
            Err(err) => status_of(err),
        }
    }

    async fn put_object(
        &self,
        body: Bytes,
        key: &str,
        headers: &Headers,
    ) -> Result<StatusCode, Error> {
        let headers = headers.clone();
        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(body.len() as i64)
            .body(ByteStream::from(body))
            .customize()
            .mutate_request(move |req| {
                for (name, value) in &headers {
                    if let Err(err) = req.headers_mut().try_insert(name.clone(), value.clone()) {
                        tracing::warn!("dropping invalid header `{name}`: {err}");
                    }
                }
            })
            .send()
            .await;

        match result {
            Ok(_) => Ok(ok_status()),
            Err(err) => status_of(err),
        }
    }

    async fn get_object(&self, key: &str, headers: &Headers) -> Result<ByteStream, Error> {
        let mut req = self.client.get_object().bucket(&self.bucket).key(key);
        for (name, value) in headers {
            req = match name.as_str() {
                "range" => req.range(value),
                "if-match" => req.if_match(value),
                "if-none-match" => req.if_none_match(value),
                "if-modified-since" => req.if_modified_since(parse_http_date(name, value)?),
                "if-unmodified-since" => {
                    req.if_unmodified_since(parse_http_date(name, value)?)
                }
                _ => {
                    tracing::trace!("header `{name}` not supported for get_object, ignoring");
                    req
                }
            };
        }

        match req.send().await {
            Ok(output) => Ok(output.body),
            Err(err) => {
                let status = err.raw_response().map(|resp| resp.status().as_u16());
                Err(Error::new(ErrorKind::TransportFailed { status }, err))
            }
        }
    }
}
