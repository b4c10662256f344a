/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

use std::sync::Arc;

use crate::error;
use crate::types::UploadRequest;

/// Operation struct for single object upload
#[derive(Clone, Default, Debug)]
pub(crate) struct StoreFile;

impl StoreFile {
    /// Execute a single `StoreFile` operation. No retries are made.
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        request: UploadRequest,
    ) -> Result<String, error::Error> {
        if request.key.is_empty() {
            return Err(error::invalid_input("key must not be empty"));
        }
        handle.store.put_object(&request).await
    }
}
