/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use aws_sdk_s3::error::DisplayErrorContext;
use ceph_s3_client::types::{ConcurrencySetting, PartialRequest, Payload, RetryPolicy};
use clap::Parser;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "store")]
#[command(about = "Uploads local files to the tenant bucket, retrying each one with backoff.")]
pub struct Args {
    /// Files to upload
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Tenant to upload as (falls back to S3_USERNAME)
    #[arg(long)]
    username: Option<String>,

    /// Prefix for generated keys
    #[arg(long, default_value = "")]
    prefix: String,

    /// Store each file under its own file name instead of a generated key
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    keep_names: bool,

    /// Content type sent with every file
    #[arg(long)]
    content_type: Option<String>,

    /// Number of concurrent uploads, unbounded if not given
    #[arg(long)]
    concurrency: Option<usize>,

    /// Attempts per file
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,

    /// Create the bucket before uploading
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    connect: bool,
}

async fn read_payloads(args: &Args) -> Result<Vec<Payload>, BoxError> {
    let mut payloads = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let body = tokio::fs::read(path).await?;
        let payload = if args.keep_names {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| format!("{} has no file name", path.display()))?;
            PartialRequest::new().bytes(body).key(name).into()
        } else {
            Payload::from(body)
        };
        payloads.push(payload);
    }
    Ok(payloads)
}

async fn do_store(args: Args) -> Result<(), BoxError> {
    let mut loader = ceph_s3_client::from_env();
    if let Some(username) = &args.username {
        loader = loader.username(username);
    }
    let config = loader.load().await?;
    let client = ceph_s3_client::Client::new(config)?;

    if args.connect {
        client.connect().await?;
    }

    let payloads = read_payloads(&args).await?;
    let retry_policy = RetryPolicy::builder()
        .max_attempts(args.max_attempts)
        .build()?;

    let mut builder = client
        .store_files_with_retry()
        .set_payloads(payloads)
        .key_prefix(&args.prefix)
        .retry_policy(retry_policy);
    if let Some(content_type) = &args.content_type {
        builder = builder.default_header("content-type", content_type);
    }
    if let Some(concurrency) = args.concurrency {
        builder = builder.concurrency(ConcurrencySetting::Explicit(concurrency));
    }

    let start = Instant::now();
    let handle = builder.initiate()?;
    let output = handle.join().await;
    let elapsed = start.elapsed();

    for (path, outcome) in args.files.iter().zip(output.outcomes()) {
        match outcome.result() {
            Ok(key) => println!(
                "{} -> {key} ({} attempt(s))",
                path.display(),
                outcome.attempts()
            ),
            Err(err) => println!(
                "{} failed: {}",
                path.display(),
                DisplayErrorContext(err)
            ),
        }
    }
    println!(
        "stored {} of {} file(s) in {:?}",
        output.objects_uploaded(),
        output.len(),
        elapsed
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    if let Err(ref err) = do_store(args).await {
        tracing::error!("store failed: {}", DisplayErrorContext(err.as_ref()));
    }
    Ok(())
}
