/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{self, Error};

const TEST_USERNAME: &str = "test";
const TEST_ACCESS_KEY: &str = "123";
const TEST_SECRET_KEY: &str = "abc";

/// Access key pair used to authenticate a tenant against the object store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    access_key: String,
    secret_key: String,
}

impl Credential {
    /// Create a new credential
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// The access key id
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The secret access key
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"** redacted **")
            .finish()
    }
}

/// Registry mapping tenant usernames to their [`Credential`].
///
/// The resolver is internally reference-counted: clones share the same registry, so a
/// credential registered through one clone is visible through all of them. Every lookup and
/// mutation is serialized through a lock.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    registry: Arc<RwLock<HashMap<String, Credential>>>,
}

impl CredentialResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver containing only the built-in `test` credential
    pub fn with_test_credential() -> Self {
        let resolver = Self::new();
        resolver.register([(
            TEST_USERNAME,
            Credential::new(TEST_ACCESS_KEY, TEST_SECRET_KEY),
        )]);
        resolver
    }

    /// Load a credential table from a JSON file.
    ///
    /// The file maps usernames to `{ "access_key": "...", "secret_key": "..." }` objects.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = tokio::fs::read(path.as_ref()).await?;
        let table: HashMap<String, Credential> = serde_json::from_slice(&contents)?;
        tracing::debug!(
            "loaded {} credential(s) from {}",
            table.len(),
            path.as_ref().display()
        );
        let resolver = Self::new();
        resolver.register(table);
        Ok(resolver)
    }

    /// Load a credential table from a JSON file, falling back to the built-in `test`
    /// credential when the file does not exist.
    ///
    /// Any other I/O or parse failure is returned as an error.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Error> {
        match tokio::fs::metadata(path.as_ref()).await {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "credential file {} not found, using built-in test credential",
                    path.as_ref().display()
                );
                Ok(Self::with_test_credential())
            }
            _ => Self::from_path(path).await,
        }
    }

    /// Look up the credential registered for `username`.
    pub fn resolve(&self, username: &str) -> Result<Credential, Error> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry
            .get(username)
            .cloned()
            .ok_or_else(|| error::unknown_user(username))
    }

    /// Merge `credentials` into the registry, replacing existing entries with the same
    /// username.
    pub fn register<I, U>(&self, credentials: I)
    where
        I: IntoIterator<Item = (U, Credential)>,
        U: Into<String>,
    {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        for (username, credential) in credentials {
            registry.insert(username.into(), credential);
        }
    }

    /// Remove the credential registered for `username`. Unknown usernames are ignored.
    pub fn revoke(&self, username: &str) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.remove(username).is_none() {
            tracing::trace!("revoke of unknown user `{username}` ignored");
        }
    }

    /// Registered usernames, sorted.
    pub fn usernames(&self) -> Vec<String> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let mut usernames: Vec<String> = registry.keys().cloned().collect();
        usernames.sort();
        usernames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_resolve_unknown_user() {
        let resolver = CredentialResolver::new();
        let err = resolver.resolve("unknown-user").unwrap_err();
        assert_eq!(&ErrorKind::UnknownUser, err.kind());
    }

    #[test]
    fn test_register_then_resolve() {
        let resolver = CredentialResolver::new();
        let cred = Credential::new("AKID", "SECRET");
        resolver.register([("configured-user", cred.clone())]);
        assert_eq!(cred, resolver.resolve("configured-user").unwrap());
    }

    #[test]
    fn test_register_overwrites_and_is_shared_between_clones() {
        let resolver = CredentialResolver::with_test_credential();
        let other = resolver.clone();
        other.register([("test", Credential::new("new", "creds"))]);
        assert_eq!("new", resolver.resolve("test").unwrap().access_key());
    }

    #[test]
    fn test_revoke() {
        let resolver = CredentialResolver::with_test_credential();
        resolver.revoke("nobody");
        assert_eq!(vec!["test".to_owned()], resolver.usernames());
        resolver.revoke("test");
        assert!(resolver.usernames().is_empty());
        assert_eq!(
            &ErrorKind::UnknownUser,
            resolver.resolve("test").unwrap_err().kind()
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cred = Credential::new("AKID", "hunter2");
        let debug = format!("{cred:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_concurrent_registration_loses_no_updates() {
        let resolver = CredentialResolver::new();
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let resolver = resolver.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        resolver.register([(format!("user-{i}-{j}"), Credential::new("a", "b"))]);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(400, resolver.usernames().len());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"alice": {{"access_key": "AK1", "secret_key": "SK1"}}, "bob": {{"access_key": "AK2", "secret_key": "SK2"}}}}"#
        )
        .unwrap();

        let resolver = CredentialResolver::load_or_default(file.path())
            .await
            .unwrap();
        assert_eq!(vec!["alice", "bob"], resolver.usernames());
        assert_eq!(Credential::new("AK2", "SK2"), resolver.resolve("bob").unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_test_credential() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CredentialResolver::load_or_default(dir.path().join("users.json"))
            .await
            .unwrap();
        assert_eq!(
            Credential::new("123", "abc"),
            resolver.resolve("test").unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"alice": {{"access_key": 1}}}}"#).unwrap();
        let err = CredentialResolver::load_or_default(file.path())
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }
}
