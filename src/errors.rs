//! Error types for dynamo-gsi.
//!
//! `StoreError` is what the remote store client reports; `GsiError` is what
//! lifecycle operations surface to the caller. SDK errors are classified with
//! typed `SdkError` variant matching and service error codes, not by parsing
//! debug output.

use aws_sdk_dynamodb::error::SdkError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::types::{KeyRole, ScalarType};

/// Classification of a remote store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    InUse,
    Validation,
    Credentials,
    AccessDenied,
    Throttled,
    Connection,
    Other,
}

impl StoreErrorKind {
    fn name(&self) -> &'static str {
        match self {
            StoreErrorKind::NotFound => "resource not found",
            StoreErrorKind::InUse => "resource in use",
            StoreErrorKind::Validation => "validation failed",
            StoreErrorKind::Credentials => "credentials error",
            StoreErrorKind::AccessDenied => "access denied",
            StoreErrorKind::Throttled => "throttled",
            StoreErrorKind::Connection => "connection error",
            StoreErrorKind::Other => "remote error",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified failure from a `TableStore` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Other, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

/// Step of a lifecycle operation, used to give remote errors context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Describe,
    Create,
    Update,
    Delete,
    WaitActive,
    WaitUpdated,
    WaitDeleted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Describe => "describing",
            Phase::Create => "creating",
            Phase::Update => "updating",
            Phase::Delete => "deleting",
            Phase::WaitActive => "waiting for creation of",
            Phase::WaitUpdated => "waiting for update of",
            Phase::WaitDeleted => "waiting for deletion of",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by index lifecycle operations.
#[derive(Debug, Error)]
pub enum GsiError {
    /// Rule violation in the declared spec or identity. Raised before any remote call.
    #[error("invalid index configuration: {0}")]
    Validation(String),

    /// Key attribute type disagrees with the table-level definition.
    #[error(
        "{role} key type does not match the existing definition of attribute '{attribute}' on the table ({existing} != {requested})"
    )]
    Conflict {
        attribute: String,
        role: KeyRole,
        existing: ScalarType,
        requested: ScalarType,
    },

    #[error("dynamodb table ({table}) or index ({index}) not found")]
    NotFound { table: String, index: String },

    /// The poll window elapsed. The remote transition may still complete.
    #[error(
        "timeout after {timeout:?} {phase} index {index} on table {table} (last status: {last_status})"
    )]
    Timeout {
        table: String,
        index: String,
        phase: Phase,
        timeout: Duration,
        last_status: String,
    },

    #[error("unexpected status {status} {phase} index {index} on table {table}")]
    UnexpectedState {
        table: String,
        index: String,
        phase: Phase,
        status: String,
    },

    #[error("attribute {attribute} of index {index} is not defined on table {table}")]
    MissingAttributeDefinition {
        table: String,
        index: String,
        attribute: String,
    },

    #[error("error {phase} index {index} on table {table}: {source}")]
    Remote {
        table: String,
        index: String,
        phase: Phase,
        #[source]
        source: StoreError,
    },

    #[error("failed to configure DynamoDB client: {0}")]
    Client(String),

    #[error("failed to (de)serialize index state: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GsiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(table: &str, index: &str) -> Self {
        Self::NotFound {
            table: table.to_string(),
            index: index.to_string(),
        }
    }

    pub fn remote(table: &str, index: &str, phase: Phase, source: StoreError) -> Self {
        Self::Remote {
            table: table.to_string(),
            index: index.to_string(),
            phase,
            source,
        }
    }

    /// True when the caller should treat the outcome as unknown and re-check later.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GsiError::Timeout { .. })
    }
}

// ========== TYPED ERROR MAPPING ==========

/// Map non-service `SdkError` variants (dispatch failures, timeouts, etc.).
///
/// Returns `Some(StoreError)` for non-service errors, `None` for `ServiceError`.
fn map_outer_sdk_error<E, R>(err: &SdkError<E, R>) -> Option<StoreError>
where
    E: fmt::Debug,
    R: fmt::Debug,
{
    match err {
        SdkError::DispatchFailure(dispatch) => {
            let msg = if dispatch.is_timeout() {
                "Connection timed out to DynamoDB. Check your network or endpoint."
            } else if dispatch.is_io() {
                "Connection failed to DynamoDB (I/O error). Check if the endpoint is reachable."
            } else {
                "Connection failed to DynamoDB. Check if the endpoint is reachable."
            };
            Some(StoreError::new(StoreErrorKind::Connection, msg))
        }
        SdkError::TimeoutError(_) => Some(StoreError::new(
            StoreErrorKind::Connection,
            "Connection timed out to DynamoDB. Check your network or endpoint.",
        )),
        SdkError::ConstructionFailure(err) => {
            let msg = format!("{:?}", err);
            if msg.contains("credentials")
                || msg.contains("Credentials")
                || msg.contains("NoCredentialsError")
            {
                Some(StoreError::new(
                    StoreErrorKind::Credentials,
                    "No AWS credentials found. Configure static keys, a profile, or an IAM role.",
                ))
            } else {
                Some(StoreError::other(format!("Failed to build request: {}", msg)))
            }
        }
        SdkError::ResponseError(err) => Some(StoreError::other(format!(
            "Invalid response from DynamoDB: {:?}",
            err
        ))),
        SdkError::ServiceError(_) => None,
        _ => Some(StoreError::other(format!(
            "Unknown error from DynamoDB: {:?}",
            err
        ))),
    }
}

/// Map a DynamoDB service error code + message to a `StoreError`.
pub(crate) fn map_dynamodb_code(
    code: Option<&str>,
    message: Option<&str>,
    display: &str,
    table: Option<&str>,
) -> StoreError {
    let detail = message.unwrap_or(display).to_string();

    match code {
        Some("UnrecognizedClientException") => StoreError::new(
            StoreErrorKind::Credentials,
            "Invalid AWS credentials. Check your access key and secret.",
        ),
        Some("ExpiredTokenException") => StoreError::new(
            StoreErrorKind::Credentials,
            "AWS credentials have expired. Refresh your session token.",
        ),
        Some("AccessDeniedException") => StoreError::new(
            StoreErrorKind::AccessDenied,
            format!("Access denied to DynamoDB: {}", detail),
        ),
        Some("ProvisionedThroughputExceededException")
        | Some("RequestLimitExceeded")
        | Some("ThrottlingException") => StoreError::new(
            StoreErrorKind::Throttled,
            "DynamoDB request rate too high. Try again later.",
        ),
        Some("ResourceNotFoundException") => {
            let msg = match table {
                Some(t) => format!("Resource not found on table '{}': {}", t, detail),
                None => format!("Resource not found: {}", detail),
            };
            StoreError::not_found(msg)
        }
        // LimitExceeded on UpdateTable means another index operation is in flight.
        Some("ResourceInUseException") | Some("LimitExceededException") => {
            StoreError::new(StoreErrorKind::InUse, detail)
        }
        Some("ValidationException") => StoreError::new(StoreErrorKind::Validation, detail),
        _ => StoreError::other(detail),
    }
}

/// Map DynamoDB SDK errors using typed `SdkError` variants.
///
/// For `ServiceError`, uses `ProvideErrorMetadata` to get the error code and message.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>, table: Option<&str>) -> StoreError
where
    E: aws_sdk_dynamodb::error::ProvideErrorMetadata + fmt::Debug + fmt::Display,
    R: fmt::Debug,
{
    if let Some(store_err) = map_outer_sdk_error(&err) {
        return store_err;
    }

    if let Some(service_err) = err.as_service_error() {
        let meta = aws_sdk_dynamodb::error::ProvideErrorMetadata::meta(service_err);
        let display = service_err.to_string();
        return map_dynamodb_code(meta.code(), meta.message(), &display, table);
    }

    StoreError::other(format!("Unexpected DynamoDB error: {:?}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_not_found_names_the_table() {
        let err = map_dynamodb_code(
            Some("ResourceNotFoundException"),
            Some("Requested resource not found"),
            "ResourceNotFoundException",
            Some("orders"),
        );
        assert!(err.is_not_found());
        assert_eq!(
            err.message,
            "Resource not found on table 'orders': Requested resource not found"
        );
    }

    #[test]
    fn missing_index_detail_is_kept() {
        let err = map_dynamodb_code(
            Some("ResourceNotFoundException"),
            Some("Requested resource not found: Index: by_customer not found"),
            "ResourceNotFoundException",
            Some("orders"),
        );
        assert!(err.is_not_found());
        assert!(err.message.contains("orders"));
        assert!(err.message.contains("Index: by_customer not found"));
    }

    #[test]
    fn limit_exceeded_is_in_use() {
        let err = map_dynamodb_code(
            Some("LimitExceededException"),
            Some("Subscriber limit exceeded: Only 1 online index can be created or deleted simultaneously per table"),
            "",
            Some("orders"),
        );
        assert_eq!(err.kind, StoreErrorKind::InUse);
        assert!(err.message.contains("simultaneously"));
    }

    #[test]
    fn unknown_code_keeps_message() {
        let err = map_dynamodb_code(Some("InternalServerError"), None, "boom", None);
        assert_eq!(err.kind, StoreErrorKind::Other);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn remote_error_carries_context() {
        let err = GsiError::remote(
            "orders",
            "by_customer",
            Phase::Create,
            StoreError::new(StoreErrorKind::InUse, "table is being updated"),
        );
        assert_eq!(
            err.to_string(),
            "error creating index by_customer on table orders: resource in use: table is being updated"
        );
    }

    #[test]
    fn timeout_message_mentions_last_status() {
        let err = GsiError::Timeout {
            table: "orders".into(),
            index: "by_customer".into(),
            phase: Phase::WaitDeleted,
            timeout: Duration::from_secs(600),
            last_status: "DELETING".into(),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("last status: DELETING"));
    }
}
