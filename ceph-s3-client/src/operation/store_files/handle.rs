/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::{Error, ErrorKind};

use super::output::{StoreFilesOutput, UploadOutcome};

/// Handle for a batch upload in progress
#[derive(Debug)]
pub struct StoreFilesHandle {
    /// One task per object in the batch
    pub(crate) tasks: JoinSet<(usize, UploadOutcome)>,
    /// Keys in request order
    pub(crate) keys: Vec<String>,
    pub(crate) abort: AbortHandle,
}

impl StoreFilesHandle {
    /// Get a handle that can abort the batch from elsewhere
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Abort the batch.
    ///
    /// Objects that are not stored yet end with
    /// [`ErrorKind::OperationCancelled`](crate::error::ErrorKind::OperationCancelled).
    /// Call [`join`](Self::join) to wait for the remaining tasks to wind down.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Wait for every object in the batch to reach a final outcome.
    ///
    /// Failures of individual objects are reported in the returned output, never as an error.
    pub async fn join(mut self) -> StoreFilesOutput {
        let mut outcomes: Vec<Option<UploadOutcome>> = self.keys.iter().map(|_| None).collect();
        while let Some(join_result) = self.tasks.join_next().await {
            match join_result {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(err) => tracing::error!("object uploader task failed: {err}"),
            }
        }

        let outcomes = outcomes
            .into_iter()
            .zip(self.keys)
            .map(|(outcome, key)| {
                outcome.unwrap_or_else(|| UploadOutcome {
                    key,
                    attempts: 0,
                    result: Err(Error::new(
                        ErrorKind::RuntimeError,
                        "object uploader task did not complete",
                    )),
                })
            })
            .collect();
        StoreFilesOutput::new(outcomes)
    }
}

/// Aborts a batch upload. Cheap to clone and safe to call more than once.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub(crate) fn new(tx: watch::Sender<bool>) -> Self {
        Self { tx: Arc::new(tx) }
    }

    /// Signal every uploader of the batch to stop
    pub fn abort(&self) {
        if !self.tx.send_replace(true) {
            tracing::debug!("sending cancellation signal to object uploaders");
        }
    }

    /// Whether [`abort`](Self::abort) has been called
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}
