/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tower::{service_fn, Service, ServiceBuilder};

use crate::client::Handle;
use crate::error::{self, Error};
use crate::middleware::retry::UploadRetryPolicy;
use crate::types::UploadRequest;

use super::StoreFilesContext;

/// Request/input type for our "store_object" service.
#[derive(Debug, Clone)]
pub(super) struct StoreObjectRequest {
    pub(super) ctx: StoreFilesContext,
    pub(super) upload: Arc<UploadRequest>,
    /// Transport calls made so far, shared by every retry of this request
    pub(super) attempts: Arc<AtomicU32>,
}

impl StoreObjectRequest {
    pub(super) fn new(ctx: StoreFilesContext, upload: UploadRequest) -> Self {
        Self {
            ctx,
            upload: Arc::new(upload),
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }
}

/// handler (service fn) for a single attempt at storing an object
async fn store_object_handler(request: StoreObjectRequest) -> Result<String, Error> {
    if request.ctx.is_cancelled() {
        tracing::debug!("received cancellation signal, skipping attempt");
        return Err(error::operation_cancelled());
    }

    let attempt = request.attempts.fetch_add(1, Ordering::SeqCst) + 1;
    tracing::trace!("starting attempt {attempt}");
    let result = request.ctx.store().put_object(&request.upload).await;

    // an abort that arrives while the call is in flight still wins
    if request.ctx.is_cancelled() {
        tracing::debug!("received cancellation signal, discarding attempt {attempt}");
        return Err(error::operation_cancelled());
    }
    result
}

/// Create a new tower::Service for storing objects with retries.
///
/// The concurrency limit sits inside the retry layer so a request only holds a slot while a
/// transport call is in flight.
pub(super) fn store_object_service(
    ctx: &StoreFilesContext,
) -> impl Service<StoreObjectRequest, Response = String, Error = Error, Future: Send> + Clone + Send
{
    let state = &ctx.state;
    let concurrency_limit = Handle::concurrency_limit(&state.concurrency);
    let policy = UploadRetryPolicy::new(
        &state.retry_policy,
        ctx.handle.config.sleep_impl().clone(),
        state.cancel_rx.clone(),
    );

    let svc = service_fn(store_object_handler);
    ServiceBuilder::new()
        .retry(policy)
        .concurrency_limit(concurrency_limit)
        .service(svc)
}

