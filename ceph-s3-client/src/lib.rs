/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! A multi-tenant client for S3-compatible object stores (e.g. the Ceph RADOS gateway).
//!
//! Each [`Client`] acts on behalf of a single tenant whose credentials are looked up by
//! username in a [`CredentialResolver`](crate::credentials::CredentialResolver) when the
//! client is constructed. Batches of payloads can be uploaded with per-object retries and
//! Fibonacci backoff; one object exhausting its attempts never prevents the rest of the
//! batch from completing.
//!
//! # Examples
//!
//! Load the configuration from the environment and upload a batch:
//!
//! ```no_run
//! # async fn example() -> Result<(), ceph_s3_client::error::Error> {
//! let config = ceph_s3_client::from_env().username("test").load().await?;
//! let client = ceph_s3_client::Client::new(config)?;
//! client.connect().await?;
//!
//! let handle = client
//!     .store_files_with_retry()
//!     .payloads(["a", "b", "c"])
//!     .key_prefix("job1:")
//!     .initiate()?;
//!
//! let output = handle.join().await;
//! for outcome in output.outcomes() {
//!     println!("{}: {}", outcome.key(), outcome.is_success());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! See the documentation for each client operation for more information:
//!
//! * [`connect`](crate::Client::connect) - make sure the tenant bucket exists
//! * [`get_file`](crate::Client::get_file) - download a single object
//! * [`store_file`](crate::Client::store_file) - upload a single object
//! * [`store_files_with_retry`](crate::Client::store_files_with_retry) - upload a batch of objects with retries

/// Error types emitted by `ceph-s3-client`
pub mod error;

/// Common types used by `ceph-s3-client`
pub mod types;

/// Tenant credentials
pub mod credentials;

/// Object store transport abstraction
pub mod transport;

/// Client for a single tenant
pub mod client;

/// Client operations
pub mod operation;

/// Client configuration
pub mod config;

/// Tower related middleware and components
pub(crate) mod middleware;

/// Internal runtime components
pub(crate) mod runtime;

/// Thin facade over the transport
pub(crate) mod store;

pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
