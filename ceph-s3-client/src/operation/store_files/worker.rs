/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tower::{Service, ServiceExt};

use crate::error::{self, Error};
use crate::types::UploadRequest;

use super::output::UploadOutcome;
use super::service::StoreObjectRequest;
use super::StoreFilesContext;

/// Upload a single object of the batch, retrying as the service's policy allows.
///
/// Returns the position of the request in the batch along with its outcome.
pub(super) async fn store_object<S>(
    svc: S,
    ctx: StoreFilesContext,
    index: usize,
    upload: UploadRequest,
) -> (usize, UploadOutcome)
where
    S: Service<StoreObjectRequest, Response = String, Error = Error>,
{
    let key = upload.key.clone();
    let request = StoreObjectRequest::new(ctx, upload);
    let attempts = request.attempts.clone();

    let result = svc.oneshot(request).await;
    let attempts = attempts.load(std::sync::atomic::Ordering::SeqCst);
    let result = match result {
        Ok(key) => {
            tracing::debug!("object stored after {attempts} attempt(s)");
            Ok(key)
        }
        // the retry policy only gives up on a retryable error once attempts run out
        Err(err) if err.is_retryable() => {
            tracing::warn!("giving up after {attempts} attempt(s): {err}");
            Err(error::retry_exhausted(attempts, err))
        }
        Err(err) => {
            tracing::debug!("object upload failed: {err}");
            Err(err)
        }
    };

    (
        index,
        UploadOutcome {
            key,
            attempts,
            result,
        },
    )
}
