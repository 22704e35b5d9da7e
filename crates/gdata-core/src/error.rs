//! Error types for the gdata library.
//!
//! This module provides a unified error type with explicit variants for
//! parsing, authorization, transport, service and input validation errors.
//! None of these are retried internally; callers decide what to do with them.

use thiserror::Error;

/// The unified error type for gdata operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The response did not match the schema this client expects.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The authorizer could not attach credentials.
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Network failure or an unmapped non-2xx status.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service refused the operation.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Input validation errors (bad visibility, uninserted entry, ...).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Schema mismatches between client and server. Never retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A schema-mandated element or attribute is absent.
    #[error("required field '{field}' missing from <{element}>")]
    MissingRequiredField { element: String, field: String },

    /// A field is present but structurally invalid.
    #[error("malformed <{element}>: {reason}")]
    Malformed { element: String, reason: String },

    /// An element that may appear once appeared more than once.
    #[error("duplicate <{element}> element")]
    DuplicateElement { element: String },

    /// The entry kind is not one the strict schema accepts.
    #[error("unknown entry kind '{kind}'")]
    UnknownEntryKind { kind: String },

    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// The document is not valid JSON, or not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(String),
}

impl ParseError {
    pub(crate) fn missing(element: &str, field: &str) -> Self {
        ParseError::MissingRequiredField {
            element: element.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn malformed(element: &str, reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Json(err.to_string())
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::Xml(err.to_string())
    }
}

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No authenticated account is available.
    #[error("no account found")]
    NoAccountFound,

    /// The credentials are no longer accepted.
    #[error("credentials expired")]
    CredentialsExpired,

    /// The credentials were rejected or could not be attached.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Transport-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The server answered with a status this layer does not interpret.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

/// Errors the service reports for a specific operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The authenticated identity may not perform this operation.
    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    /// The entry changed on the server since it was fetched (stale ETag).
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The resource does not exist.
    #[error("not found: {uri}")]
    NotFound { uri: String },

    /// The resource has not changed since the ETag sent with the request.
    #[error("not modified")]
    NotModified,

    /// The server rejected the request as malformed.
    #[error("protocol error (HTTP {status}): {message}")]
    Protocol { status: u16, message: String },
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// Invalid service base URL.
    #[error("invalid service URL '{value}': {reason}")]
    ServiceUrl { value: String, reason: String },

    /// Property visibility outside the enumerated values.
    #[error("invalid visibility '{value}'")]
    Visibility { value: String },

    /// Inserting an entry that already exists on the server.
    #[error("entry is already inserted")]
    AlreadyInserted,

    /// Updating or deleting an entry that was never inserted.
    #[error("entry has not been inserted")]
    NotInserted,

    /// The entry lacks a link the operation needs.
    #[error("entry has no '{rel}' link")]
    MissingLink { rel: String },

    /// A comment missing its content or author.
    #[error("invalid comment: {reason}")]
    InvalidComment { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
