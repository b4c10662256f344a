/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;

use crate::config::Builder;
use crate::credentials::CredentialResolver;
use crate::error::{self, Error};
use crate::types::{AddressingStyle, ConcurrencySetting, RetryPolicy};
use crate::Config;

const ENV_ENDPOINT: &str = "S3_ENDPOINT";
const ENV_PORT: &str = "S3_PORT";
const ENV_BUCKET: &str = "S3_BUCKET";
const ENV_PROTO: &str = "S3_PROTO";
const ENV_STYLE: &str = "S3_STYLE";
const ENV_USERNAME: &str = "S3_USERNAME";
const ENV_USERS_FILE: &str = "S3_USERS_FILE";

const DEFAULT_USERS_FILE: &str = "users.json";

/// Load client [`Config`] from the environment.
///
/// | Variable | Setting |
/// |---|---|
/// | `S3_ENDPOINT` | store host name or address |
/// | `S3_PORT` | store port |
/// | `S3_BUCKET` | bucket name |
/// | `S3_PROTO` | `https` enables TLS |
/// | `S3_STYLE` | `path` or `virtual-host` |
/// | `S3_USERNAME` | tenant username |
/// | `S3_USERS_FILE` | JSON credential table, defaults to `users.json` |
///
/// Values set explicitly on the loader take precedence over the environment.
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
    users_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Host name or address of the object store
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.builder = self.builder.endpoint(endpoint);
        self
    }

    /// Port the object store listens on
    pub fn port(mut self, port: u16) -> Self {
        self.builder = self.builder.port(port);
        self
    }

    /// The bucket objects are stored in
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.builder = self.builder.bucket(bucket);
        self
    }

    /// Whether to use HTTPS
    pub fn secure(mut self, secure: bool) -> Self {
        self.builder = self.builder.secure(secure);
        self
    }

    /// URL addressing style
    pub fn style(mut self, style: AddressingStyle) -> Self {
        self.builder = self.builder.style(style);
        self
    }

    /// The tenant to act as
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.builder = self.builder.username(username);
        self
    }

    /// Use an explicit credential registry instead of loading the credential file
    pub fn credentials(mut self, credentials: CredentialResolver) -> Self {
        self.builder = self.builder.credentials(credentials);
        self
    }

    /// Path of the JSON credential table
    pub fn users_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.users_file = Some(path.into());
        self
    }

    /// Set the default concurrency setting for batch uploads.
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.builder = self.builder.concurrency(concurrency);
        self
    }

    /// Set the default retry policy for batch uploads.
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.builder = self.builder.retry_policy(retry_policy);
        self
    }

    /// Load the configuration
    ///
    /// If fields have been overridden during builder construction, the override values will be
    /// used. Otherwise, the environment is consulted and finally the default values for each
    /// field are used.
    pub async fn load(self) -> Result<Config, Error> {
        self.load_with(|key| std::env::var(key).ok()).await
    }

    async fn load_with<F>(self, env: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = self.builder;

        if builder.endpoint.is_none() {
            builder.endpoint = env(ENV_ENDPOINT);
        }
        if builder.port.is_none() {
            if let Some(port) = env(ENV_PORT) {
                let port = port.parse().map_err(|err| {
                    error::invalid_input(format!("invalid {ENV_PORT} value `{port}`: {err}"))
                })?;
                builder.port = Some(port);
            }
        }
        if builder.bucket.is_none() {
            builder.bucket = env(ENV_BUCKET);
        }
        if builder.secure.is_none() {
            builder.secure = env(ENV_PROTO).map(|proto| proto == "https");
        }
        if builder.style.is_none() {
            if let Some(style) = env(ENV_STYLE) {
                builder.style = Some(style.parse()?);
            }
        }
        if builder.username.is_none() {
            builder.username = env(ENV_USERNAME);
        }
        if builder.credentials.is_none() {
            let users_file = self
                .users_file
                .or_else(|| env(ENV_USERS_FILE).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_USERS_FILE));
            builder.credentials = Some(CredentialResolver::load_or_default(users_file).await?);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[tokio::test]
    async fn test_load_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join("users.json");
        std::fs::write(
            &users,
            r#"{"crawler": {"access_key": "AK", "secret_key": "SK"}}"#,
        )
        .unwrap();

        let env = env_of(&[
            ("S3_ENDPOINT", "10.0.0.5"),
            ("S3_PORT", "7480"),
            ("S3_BUCKET", "dumps"),
            ("S3_PROTO", "https"),
            ("S3_STYLE", "virtual-host"),
            ("S3_USERNAME", "crawler"),
            ("S3_USERS_FILE", users.to_str().unwrap()),
        ]);
        let config = ConfigLoader::default().load_with(env).await.unwrap();

        assert_eq!("https://10.0.0.5:7480", config.endpoint_url());
        assert_eq!("dumps", config.bucket());
        assert_eq!(AddressingStyle::VirtualHost, config.style());
        assert_eq!("crawler", config.username());
        assert_eq!("AK", config.credentials().resolve("crawler").unwrap().access_key());
    }

    #[tokio::test]
    async fn test_explicit_values_override_env() {
        let env = env_of(&[("S3_BUCKET", "from-env"), ("S3_USERNAME", "env-user")]);
        let config = ConfigLoader::default()
            .bucket("explicit")
            .username("test")
            .credentials(CredentialResolver::with_test_credential())
            .load_with(env)
            .await
            .unwrap();
        assert_eq!("explicit", config.bucket());
        assert_eq!("test", config.username());
    }

    #[tokio::test]
    async fn test_missing_users_file_falls_back_to_test_user() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::default()
            .username("test")
            .users_file(dir.path().join("absent.json"))
            .load_with(env_of(&[]))
            .await
            .unwrap();
        assert_eq!("123", config.credentials().resolve("test").unwrap().access_key());
        assert_eq!(6788, config.port());
        assert!(!config.secure());
    }

    #[tokio::test]
    async fn test_invalid_port() {
        let err = ConfigLoader::default()
            .username("test")
            .credentials(CredentialResolver::new())
            .load_with(env_of(&[("S3_PORT", "http")]))
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }
}
