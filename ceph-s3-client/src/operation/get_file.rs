/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

use std::sync::Arc;

use aws_smithy_types::byte_stream::ByteStream;

use crate::error;
use crate::types::Headers;

/// Operation struct for single object download
#[derive(Clone, Default, Debug)]
pub(crate) struct GetFile;

impl GetFile {
    /// Execute a single `GetFile` operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        key: String,
        headers: Headers,
    ) -> Result<ByteStream, error::Error> {
        if key.is_empty() {
            return Err(error::invalid_input("key must not be empty"));
        }
        handle.store.get_object(&key, &headers).await
    }
}
