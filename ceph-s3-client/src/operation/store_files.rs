/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

mod handle;
pub use handle::{AbortHandle, StoreFilesHandle};

mod normalize;
pub use normalize::normalize;

mod output;
pub use output::{StoreFilesOutput, UploadOutcome};

mod service;
mod worker;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::types::{ConcurrencySetting, RetryPolicy, UploadRequest};

use super::TransferContext;

/// Operation struct for uploading a batch of objects with per-object retries
#[derive(Clone, Default, Debug)]
pub(crate) struct StoreFiles;

impl StoreFiles {
    /// Execute a single `StoreFiles` operation.
    ///
    /// One task is spawned per request. Transport calls across the whole batch are bounded by
    /// `concurrency`; backoff sleeps do not hold a slot.
    pub(crate) fn orchestrate(
        handle: Arc<crate::client::Handle>,
        requests: Vec<UploadRequest>,
        retry_policy: RetryPolicy,
        concurrency: ConcurrencySetting,
    ) -> StoreFilesHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let ctx = StoreFilesContext::new(handle, retry_policy, concurrency, cancel_rx);
        let svc = service::store_object_service(&ctx);

        let keys: Vec<String> = requests.iter().map(|r| r.key.clone()).collect();
        tracing::debug!("spawning {} object uploaders", keys.len());

        let mut tasks = JoinSet::new();
        for (index, request) in requests.into_iter().enumerate() {
            let span = tracing::debug_span!("object-uploader", key = request.key.as_str());
            tasks.spawn(
                worker::store_object(svc.clone(), ctx.clone(), index, request).instrument(span),
            );
        }

        StoreFilesHandle {
            tasks,
            keys,
            abort: AbortHandle::new(cancel_tx),
        }
    }
}

/// Batch-wide state shared by every object uploader
#[derive(Debug)]
pub(crate) struct StoreFilesState {
    retry_policy: RetryPolicy,
    concurrency: ConcurrencySetting,
    cancel_rx: watch::Receiver<bool>,
}

type StoreFilesContext = TransferContext<StoreFilesState>;

impl StoreFilesContext {
    fn new(
        handle: Arc<crate::client::Handle>,
        retry_policy: RetryPolicy,
        concurrency: ConcurrencySetting,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        let state = StoreFilesState {
            retry_policy,
            concurrency,
            cancel_rx,
        };
        TransferContext {
            handle,
            state: Arc::new(state),
        }
    }

    /// Whether the batch has been aborted
    fn is_cancelled(&self) -> bool {
        *self.state.cancel_rx.borrow()
    }
}
