/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;

use crate::error::Error;

/// Final result of uploading one object of a batch
#[derive(Debug)]
pub struct UploadOutcome {
    pub(crate) key: String,
    pub(crate) attempts: u32,
    pub(crate) result: Result<String, Error>,
}

impl UploadOutcome {
    /// The key the object was (or would have been) stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of transport calls made for this object
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The stored key on success, or the error that ended the upload
    pub fn result(&self) -> &Result<String, Error> {
        &self.result
    }

    /// Whether the object was stored
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The error that ended the upload, if any
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    /// Consume the outcome, returning the result
    pub fn into_result(self) -> Result<String, Error> {
        self.result
    }
}

/// Output type for uploading a batch of objects
///
/// Holds exactly one outcome per request, in the order the requests were given.
#[derive(Debug)]
pub struct StoreFilesOutput {
    outcomes: Vec<UploadOutcome>,
    by_key: HashMap<String, usize>,
}

impl StoreFilesOutput {
    pub(crate) fn new(outcomes: Vec<UploadOutcome>) -> Self {
        let by_key = outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| (outcome.key.clone(), i))
            .collect();
        Self { outcomes, by_key }
    }

    /// All outcomes, in request order
    pub fn outcomes(&self) -> &[UploadOutcome] {
        &self.outcomes
    }

    /// Look up the outcome for a key
    pub fn get(&self, key: &str) -> Option<&UploadOutcome> {
        self.by_key.get(key).map(|i| &self.outcomes[*i])
    }

    /// The number of objects that were successfully stored
    pub fn objects_uploaded(&self) -> u64 {
        self.outcomes.iter().filter(|o| o.is_success()).count() as u64
    }

    /// Outcomes of objects that were stored
    pub fn successful(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// Outcomes of objects that failed to upload
    pub fn failed(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Number of outcomes
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the batch was empty
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Consume the output, returning the outcomes in request order
    pub fn into_outcomes(self) -> Vec<UploadOutcome> {
        self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;

    fn outcome(key: &str, result: Result<String, Error>) -> UploadOutcome {
        UploadOutcome {
            key: key.to_owned(),
            attempts: 1,
            result,
        }
    }

    #[test]
    fn test_lookup_and_counts() {
        let output = StoreFilesOutput::new(vec![
            outcome("a", Ok("a".to_owned())),
            outcome("b", Err(error::unexpected_status("put object", 503))),
            outcome("c", Ok("c".to_owned())),
        ]);

        assert_eq!(3, output.len());
        assert_eq!(2, output.objects_uploaded());
        let failed: Vec<&str> = output.failed().map(|o| o.key()).collect();
        assert_eq!(vec!["b"], failed);
        assert_eq!(2, output.successful().count());
        assert_eq!(Some(503), output.get("b").unwrap().error().unwrap().status_code());
        assert!(output.get("missing").is_none());

        let keys: Vec<String> = output.into_outcomes().into_iter().map(|o| o.key).collect();
        assert_eq!(vec!["a", "b", "c"], keys);
    }
}
