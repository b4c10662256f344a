/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashSet;

use bytes::Bytes;

use crate::error::{self, Error};
use crate::types::{Headers, Payload, UploadRequest};

/// Turn heterogeneous payloads into fully specified upload requests.
///
/// Elements without a key are stored under `key_prefix` followed by a 1-based index that
/// counts keyless elements only. Explicit keys are used verbatim and never get `key_prefix`;
/// callers that want prefixed explicit keys must include the prefix themselves. An empty
/// explicit key counts as no key. Headers given on a
/// [`PartialRequest`](crate::types::PartialRequest) override `default_headers`.
///
/// Fails without producing any request if an element has no payload
/// ([`ErrorKind::MalformedPayload`](crate::error::ErrorKind::MalformedPayload)) or if two
/// elements end up with the same key
/// ([`ErrorKind::InputInvalid`](crate::error::ErrorKind::InputInvalid)).
pub fn normalize<I, P>(
    inputs: I,
    default_headers: &Headers,
    key_prefix: &str,
) -> Result<Vec<UploadRequest>, Error>
where
    I: IntoIterator<Item = P>,
    P: Into<Payload>,
{
    let mut auto_index: u64 = 0;
    let mut seen = HashSet::new();
    let mut requests = Vec::new();

    for (position, input) in inputs.into_iter().enumerate() {
        let (payload, key, headers) = match input.into() {
            Payload::Bytes(payload) => (payload, None, default_headers.clone()),
            Payload::Text(text) => (Bytes::from(text), None, default_headers.clone()),
            Payload::Partial(partial) => {
                let payload = partial.payload.ok_or_else(|| {
                    error::malformed_payload(format!("element {position} of the batch has no payload"))
                })?;
                let mut headers = default_headers.clone();
                headers.extend(partial.headers);
                let key = partial.key.filter(|key| !key.is_empty());
                (payload.into_bytes(), key, headers)
            }
        };

        let key = match key {
            Some(key) => key,
            None => {
                auto_index += 1;
                format!("{key_prefix}{auto_index}")
            }
        };
        if !seen.insert(key.clone()) {
            return Err(error::invalid_input(format!(
                "key `{key}` appears more than once in the batch"
            )));
        }

        requests.push(UploadRequest {
            payload,
            key,
            headers,
        });
    }

    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::PartialRequest;

    fn html_headers() -> Headers {
        Headers::from([("content-type".to_owned(), "text/html".to_owned())])
    }

    #[test]
    fn test_prefixed_keys_for_plain_payloads() {
        let requests = normalize(["a", "b", "c"], &html_headers(), "job1:").unwrap();
        let keys: Vec<&str> = requests.iter().map(|r| r.key()).collect();
        assert_eq!(vec!["job1:1", "job1:2", "job1:3"], keys);
        assert_eq!(&Bytes::from_static(b"b"), requests[1].payload());
        assert!(requests.iter().all(|r| r.headers() == &html_headers()));
    }

    #[test]
    fn test_mixed_payloads() {
        let inputs: Vec<Payload> = vec![
            Bytes::from_static(b"raw").into(),
            PartialRequest::new()
                .text("page")
                .key("pages/index.html")
                .header("content-type", "application/xhtml+xml")
                .header("x-amz-meta-crawl", "7")
                .into(),
            "text".into(),
            PartialRequest::new().bytes(vec![1u8, 2, 3]).key("").into(),
        ];
        let requests = normalize(inputs, &html_headers(), "user_id:121212:").unwrap();

        let keys: Vec<&str> = requests.iter().map(|r| r.key()).collect();
        assert_eq!(
            vec![
                "user_id:121212:1",
                "pages/index.html",
                "user_id:121212:2",
                "user_id:121212:3"
            ],
            keys
        );

        let page = &requests[1];
        assert_eq!(&Bytes::from_static(b"page"), page.payload());
        assert_eq!("application/xhtml+xml", page.headers()["content-type"]);
        assert_eq!("7", page.headers()["x-amz-meta-crawl"]);
        assert_eq!(&Bytes::from_static(&[1, 2, 3]), requests[3].payload());
    }

    #[test]
    fn test_fully_specified_requests_are_unchanged() {
        let requests = vec![
            UploadRequest::new("one", "1").with_header("content-type", "text/plain"),
            UploadRequest::new("two", "2"),
        ];
        let once = normalize(requests.clone(), &Headers::new(), "ignored:").unwrap();
        assert_eq!(requests, once);

        let twice = normalize(once.clone(), &Headers::new(), "ignored:").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_payload_fails_whole_batch() {
        let inputs: Vec<Payload> = vec!["ok".into(), PartialRequest::new().key("empty").into()];
        let err = normalize(inputs, &Headers::new(), "p:").unwrap_err();
        assert_eq!(&ErrorKind::MalformedPayload, err.kind());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let inputs: Vec<Payload> = vec![
            "a".into(),
            PartialRequest::new().text("b").key("p:1").into(),
        ];
        let err = normalize(inputs, &Headers::new(), "p:").unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }

    #[test]
    fn test_empty_batch() {
        let requests = normalize(Vec::<Payload>::new(), &Headers::new(), "p:").unwrap();
        assert!(requests.is_empty());
    }
}
