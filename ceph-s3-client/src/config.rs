/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_async::rt::sleep::{SharedAsyncSleep, TokioSleep};

use crate::credentials::CredentialResolver;
use crate::error::{self, Error};
use crate::transport::SharedTransport;
use crate::types::{AddressingStyle, ConcurrencySetting, RetryPolicy};

/// Environment based config loading
pub mod loader;

pub(crate) const DEFAULT_ENDPOINT: &str = "127.0.0.1";
pub(crate) const DEFAULT_PORT: u16 = 6788;
pub(crate) const DEFAULT_BUCKET: &str = "arkapi";

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    endpoint: String,
    port: u16,
    bucket: String,
    secure: bool,
    style: AddressingStyle,
    username: String,
    credentials: CredentialResolver,
    concurrency: ConcurrencySetting,
    retry_policy: RetryPolicy,
    transport: Option<SharedTransport>,
    sleep_impl: SharedAsyncSleep,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Host name or address of the object store
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Port the object store listens on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The bucket all objects are stored in
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Whether to use HTTPS
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// URL addressing style
    pub fn style(&self) -> AddressingStyle {
        self.style
    }

    /// The tenant whose credential is used
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Registry used to resolve [`username`](Self::username)
    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    /// Returns the default concurrency setting for batch uploads.
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// Returns the default retry policy for batch uploads.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Explicit transport overriding the default S3 transport, if any.
    pub fn transport(&self) -> Option<&SharedTransport> {
        self.transport.as_ref()
    }

    /// Sleep implementation used to wait out retry backoff.
    pub fn sleep_impl(&self) -> &SharedAsyncSleep {
        &self.sleep_impl
    }

    /// `http(s)://endpoint:port`
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.endpoint, self.port)
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    endpoint: Option<String>,
    port: Option<u16>,
    bucket: Option<String>,
    secure: Option<bool>,
    style: Option<AddressingStyle>,
    username: Option<String>,
    credentials: Option<CredentialResolver>,
    concurrency: ConcurrencySetting,
    retry_policy: RetryPolicy,
    transport: Option<SharedTransport>,
    sleep_impl: Option<SharedAsyncSleep>,
}

impl Builder {
    /// Host name or address of the object store. Default is `127.0.0.1`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Port the object store listens on. Default is `6788`.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The bucket objects are stored in. Default is `arkapi`.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Whether to use HTTPS. Default is `false`.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// URL addressing style. Default is [`AddressingStyle::Path`].
    pub fn style(mut self, style: AddressingStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// The tenant to act as.
    /// Required.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Registry to resolve the username with.
    ///
    /// Default is a registry containing only the built-in `test` credential.
    pub fn credentials(mut self, credentials: CredentialResolver) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the default concurrency setting for batch uploads.
    ///
    /// This bounds the number of simultaneous in-flight transport calls of a batch.
    /// Default is [ConcurrencySetting::Unbounded].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the default retry policy for batch uploads.
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Use an explicit transport instead of building an S3 client from the endpoint
    /// settings.
    pub fn transport(mut self, transport: SharedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sleep implementation used to wait out retry backoff. Default is tokio's timer.
    pub fn sleep_impl(mut self, sleep_impl: SharedAsyncSleep) -> Self {
        self.sleep_impl = Some(sleep_impl);
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Result<Config, Error> {
        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| error::invalid_input("username is required"))?;

        Ok(Config {
            endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            bucket: self.bucket.unwrap_or_else(|| DEFAULT_BUCKET.to_owned()),
            secure: self.secure.unwrap_or_default(),
            style: self.style.unwrap_or_default(),
            username,
            credentials: self
                .credentials
                .unwrap_or_else(CredentialResolver::with_test_credential),
            concurrency: self.concurrency,
            retry_policy: self.retry_policy,
            transport: self.transport,
            sleep_impl: self
                .sleep_impl
                .unwrap_or_else(|| SharedAsyncSleep::new(TokioSleep::new())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = Config::builder().username("test").build().unwrap();
        assert_eq!("http://127.0.0.1:6788", config.endpoint_url());
        assert_eq!("arkapi", config.bucket());
        assert_eq!(AddressingStyle::Path, config.style());
        assert_eq!(&ConcurrencySetting::Unbounded, config.concurrency());
        assert_eq!(&RetryPolicy::default(), config.retry_policy());
        assert!(config.credentials().resolve("test").is_ok());
    }

    #[test]
    fn test_username_required() {
        let err = Config::builder().build().unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }

    #[test]
    fn test_secure_endpoint_url() {
        let config = Config::builder()
            .username("test")
            .endpoint("rgw.internal")
            .port(443)
            .secure(true)
            .build()
            .unwrap();
        assert_eq!("https://rgw.internal:443", config.endpoint_url());
    }
}
