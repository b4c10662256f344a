/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of client errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues
    InputInvalid,

    /// No credential is registered for the requested username
    UnknownUser,

    /// A payload could not be coerced into bytes
    MalformedPayload,

    /// The object store answered with a non-success status, or could not be reached at all
    TransportFailed {
        /// The HTTP status code returned by the store, if a response was received
        status: Option<u16>,
    },

    /// Every allowed attempt of an upload failed; the source is the last transport error
    RetryExhausted {
        /// Number of attempts that were made
        attempts: u32,
    },

    /// The operation was cancelled before it could complete
    OperationCancelled,

    /// I/O errors
    IOError,

    /// Some kind of internal runtime issue (e.g. task failure, poisoned mutex, etc)
    RuntimeError,
}

impl Error {
    /// Creates a new [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Whether the failed operation may succeed if attempted again.
    ///
    /// Only transport failures are retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::TransportFailed { .. })
    }

    /// The HTTP status code associated with this error, if any.
    ///
    /// For [`ErrorKind::RetryExhausted`] this is the status of the last attempt.
    pub fn status_code(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::TransportFailed { status } => *status,
            ErrorKind::RetryExhausted { .. } => self
                .source
                .downcast_ref::<Error>()
                .and_then(Error::status_code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::UnknownUser => write!(f, "unknown user"),
            ErrorKind::MalformedPayload => write!(f, "malformed payload"),
            ErrorKind::TransportFailed { status: Some(status) } => {
                write!(f, "transport failed with status {status}")
            }
            ErrorKind::TransportFailed { status: None } => write!(f, "transport failed"),
            ErrorKind::RetryExhausted { attempts } => {
                write!(f, "retries exhausted after {attempts} attempt(s)")
            }
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

/// The store answered with a status code other than the one expected.
#[derive(Debug)]
pub(crate) struct UnexpectedStatus {
    pub(crate) context: &'static str,
    pub(crate) status: u16,
}

impl fmt::Display for UnexpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: response status code is {}", self.context, self.status)
    }
}

impl std::error::Error for UnexpectedStatus {}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn malformed_payload<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::MalformedPayload, err)
}

pub(crate) fn unknown_user(username: &str) -> Error {
    Error::new(
        ErrorKind::UnknownUser,
        format!("no credential registered for user `{username}`"),
    )
}

pub(crate) fn unexpected_status(context: &'static str, status: u16) -> Error {
    Error::new(
        ErrorKind::TransportFailed {
            status: Some(status),
        },
        UnexpectedStatus { context, status },
    )
}

pub(crate) fn retry_exhausted(attempts: u32, last_error: Error) -> Error {
    Error::new(ErrorKind::RetryExhausted { attempts }, last_error)
}

static CANCELLATION_ERROR: &str =
    "the batch has been aborted, no further attempts will be made";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}
