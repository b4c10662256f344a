/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use ceph_s3_client::credentials::{Credential, CredentialResolver};
use ceph_s3_client::error::ErrorKind;
use ceph_s3_client::transport::SharedTransport;
use ceph_s3_client::types::UploadRequest;
use ceph_s3_client::{Client, Config};
use test_common::{client_for, FakeTransport, RecordingSleep};

#[tokio::test]
async fn test_connect_requires_200() {
    let sleep = RecordingSleep::default();

    let created = Arc::new(FakeTransport::new());
    client_for(&created, &sleep).connect().await.unwrap();

    let exists = Arc::new(FakeTransport::new().bucket_status(409));
    let err = client_for(&exists, &sleep).connect().await.unwrap_err();
    assert_eq!(&ErrorKind::TransportFailed { status: Some(409) }, err.kind());
    assert!(format!("{}", aws_smithy_types::error::display::DisplayErrorContext(err))
        .contains("response status code is 409"));
}

#[tokio::test]
async fn test_store_then_get_file() {
    let transport = Arc::new(FakeTransport::new());
    let client = client_for(&transport, &RecordingSleep::default());

    let key = client
        .store_file()
        .key("dump.html")
        .payload("<html></html>")
        .header("content-type", "text/html")
        .send()
        .await
        .unwrap();
    assert_eq!("dump.html", key);
    assert_eq!(
        "text/html",
        transport.object_headers("dump.html").unwrap()["content-type"]
    );

    let body = client
        .get_file()
        .key("dump.html")
        .header("Range", "bytes=0-5")
        .header("If-None-Match", "\"etag\"")
        .header("x-amz-meta-ignored", "1")
        .send()
        .await
        .unwrap();
    let data = body.collect().await.unwrap().into_bytes();
    assert_eq!(&b"<html></html>"[..], &data[..]);

    let forwarded = transport.get_headers();
    assert_eq!(1, forwarded.len());
    let mut names: Vec<&str> = forwarded[0].keys().map(String::as_str).collect();
    names.sort();
    assert_eq!(vec!["if-none-match", "range"], names);
}

#[tokio::test]
async fn test_store_file_is_not_retried() {
    let transport = Arc::new(FakeTransport::new().fail_always("once", 503));
    let client = client_for(&transport, &RecordingSleep::default());

    let err = UploadRequest::new("once", "body")
        .send_with(&client)
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::TransportFailed { status: Some(503) }, err.kind());
    assert_eq!(1, transport.attempts("once"));
}

#[tokio::test]
async fn test_get_missing_file() {
    let transport = Arc::new(FakeTransport::new());
    let client = client_for(&transport, &RecordingSleep::default());

    let err = client.get_file().key("missing").send().await.unwrap_err();
    assert_eq!(Some(404), err.status_code());
}

#[test]
fn test_clients_per_tenant() {
    let transport = SharedTransport::from(Arc::new(FakeTransport::new()));
    let credentials = CredentialResolver::new();
    credentials.register([
        ("crawler", Credential::new("AKID-CRAWLER", "s1")),
        ("indexer", Credential::new("AKID-INDEXER", "s2")),
    ]);

    let client = |username: &str| {
        let config = Config::builder()
            .username(username)
            .credentials(credentials.clone())
            .transport(transport.clone())
            .build()
            .unwrap();
        Client::new(config)
    };

    assert_eq!("AKID-CRAWLER", client("crawler").unwrap().access_key());
    assert_eq!("AKID-INDEXER", client("indexer").unwrap().access_key());
    assert_eq!(
        &ErrorKind::UnknownUser,
        client("unknown-user").unwrap_err().kind()
    );
}
