/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::Error;
use crate::store::ObjectStore;
use crate::transport::{S3Transport, SharedTransport};
use crate::types::ConcurrencySetting;
use crate::Config;

/// Client for an S3-compatible object store, acting on behalf of a single tenant.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config, transport, etc
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: crate::Config,
    pub(crate) store: ObjectStore,
    access_key: String,
}

impl Handle {
    /// Get the concrete bound on in-flight transport calls for a concurrency setting.
    pub(crate) fn concurrency_limit(setting: &ConcurrencySetting) -> usize {
        match setting {
            ConcurrencySetting::Explicit(limit) => (*limit).clamp(1, Semaphore::MAX_PERMITS),
            ConcurrencySetting::Unbounded => Semaphore::MAX_PERMITS,
        }
    }
}

impl Client {
    /// Creates a new client from a config.
    ///
    /// The configured username is resolved once, here. Fails with
    /// [`ErrorKind::UnknownUser`](crate::error::ErrorKind::UnknownUser) if no credential is
    /// registered for it.
    pub fn new(config: Config) -> Result<Client, Error> {
        let credential = config.credentials().resolve(config.username())?;
        let transport = match config.transport() {
            Some(transport) => transport.clone(),
            None => SharedTransport::new(S3Transport::from_endpoint(
                config.endpoint_url(),
                config.style(),
                config.bucket(),
                &credential,
            )),
        };
        tracing::debug!(
            "created client for user {:?} against {} (bucket {:?})",
            config.username(),
            config.endpoint_url(),
            config.bucket()
        );

        let handle = Arc::new(Handle {
            config,
            store: ObjectStore::new(transport),
            access_key: credential.access_key().to_owned(),
        });
        Ok(Client { handle })
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// The access key of the tenant this client acts for
    pub fn access_key(&self) -> &str {
        &self.handle.access_key
    }

    /// Make sure the configured bucket exists by creating it.
    ///
    /// The store must answer with `200 OK`; any other status is reported as
    /// [`ErrorKind::TransportFailed`](crate::error::ErrorKind::TransportFailed).
    #[tracing::instrument(skip_all, level = "debug", name = "connect", fields(bucket = self.config().bucket()))]
    pub async fn connect(&self) -> Result<(), Error> {
        self.handle.store.ensure_bucket().await
    }

    /// Download a single object.
    ///
    /// Constructs a fluent builder for the
    /// [`GetFile`](crate::operation::get_file::builders::GetFileFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    ///
    /// async fn get_object(client: &ceph_s3_client::Client) -> Result<(), Box<dyn Error>> {
    ///     let body = client
    ///         .get_file()
    ///         .key("job1:1")
    ///         .header("range", "bytes=0-1023")
    ///         .send()
    ///         .await?;
    ///
    ///     let data = body.collect().await?.into_bytes();
    ///     // ... do something with data
    ///     Ok(())
    /// }
    /// ```
    pub fn get_file(&self) -> crate::operation::get_file::builders::GetFileFluentBuilder {
        crate::operation::get_file::builders::GetFileFluentBuilder::new(self.handle.clone())
    }

    /// Upload a single object, without retries.
    ///
    /// Constructs a fluent builder for the
    /// [`StoreFile`](crate::operation::store_file::builders::StoreFileFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    ///
    /// async fn put_object(client: &ceph_s3_client::Client) -> Result<(), Box<dyn Error>> {
    ///     let key = client
    ///         .store_file()
    ///         .key("dump.html")
    ///         .payload("<html></html>")
    ///         .header("content-type", "text/html")
    ///         .send()
    ///         .await?;
    ///     assert_eq!("dump.html", key);
    ///     Ok(())
    /// }
    /// ```
    pub fn store_file(&self) -> crate::operation::store_file::builders::StoreFileFluentBuilder {
        crate::operation::store_file::builders::StoreFileFluentBuilder::new(self.handle.clone())
    }

    /// Upload a batch of payloads, retrying each one independently with backoff.
    ///
    /// Constructs a fluent builder for the
    /// [`StoreFiles`](crate::operation::store_files::builders::StoreFilesFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use ceph_s3_client::error::Error;
    /// use ceph_s3_client::types::RetryPolicy;
    ///
    /// async fn store_dumps(client: &ceph_s3_client::Client, pages: Vec<String>) -> Result<(), Error> {
    ///     let handle = client
    ///         .store_files_with_retry()
    ///         .payloads(pages)
    ///         .key_prefix("user_id:121212:")
    ///         .default_header("content-type", "text/html")
    ///         .retry_policy(RetryPolicy::builder().max_attempts(3).build()?)
    ///         .initiate()?;
    ///
    ///     let output = handle.join().await;
    ///     for failed in output.failed() {
    ///         eprintln!("{} failed: {:?}", failed.key(), failed.result());
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn store_files_with_retry(
        &self,
    ) -> crate::operation::store_files::builders::StoreFilesFluentBuilder {
        crate::operation::store_files::builders::StoreFilesFluentBuilder::new(self.handle.clone())
    }
}
