use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for ledgerdoc operations
///
/// Each kind names one category of failure so callers can decide between
/// skipping an item and aborting a whole batch.
///
/// # Examples
///
/// ```rust,ignore
/// use ledgerdoc::errors::{LedgerError, ErrorKind, LedgerResult};
///
/// fn example() -> LedgerResult<()> {
///     Err(LedgerError::new("Upsert matched 2 documents", ErrorKind::AmbiguousUpsert))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// An upsert predicate matched more than one document
    AmbiguousUpsert,
    /// Caller supplied filter or document text could not be parsed
    MalformedInput,
    /// The transactional executor failed while running a statement
    ExecutionFailure,
    /// Optimistic concurrency conflict; the driver may retry the transaction
    OccConflict,
    /// The requested document was not found
    NotFound,
    /// Invalid collection or field name
    InvalidFieldName,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The stream client failed to start or stop a consumer
    ConsumerError,
    /// Configuration or data validation failed
    ValidationError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::AmbiguousUpsert => write!(f, "Ambiguous upsert"),
            ErrorKind::MalformedInput => write!(f, "Malformed input"),
            ErrorKind::ExecutionFailure => write!(f, "Execution failure"),
            ErrorKind::OccConflict => write!(f, "OCC conflict"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ConsumerError => write!(f, "Consumer error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type for every fallible ledgerdoc operation.
///
/// `LedgerError` carries a message, a kind, an optional cause and the backtrace
/// captured where it was created.
///
/// ```rust,ignore
/// use ledgerdoc::errors::{LedgerError, ErrorKind};
///
/// let cause = LedgerError::new("session expired", ErrorKind::ExecutionFailure);
/// let err = LedgerError::new_with_cause("insert failed", ErrorKind::ExecutionFailure, cause);
/// ```
#[derive(Clone)]
pub struct LedgerError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<LedgerError>>,
    backtrace: Atomic<Backtrace>,
}

impl LedgerError {
    /// Creates a new `LedgerError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        LedgerError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `LedgerError` wrapping a cause error.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: LedgerError) -> Self {
        LedgerError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&LedgerError> {
        self.cause.as_deref()
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// `LedgerResult<T>` is shorthand for `Result<T, LedgerError>`.
pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::new(&format!("JSON parsing error: {}", err), ErrorKind::MalformedInput)
    }
}

impl From<std::string::FromUtf8Error> for LedgerError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        LedgerError::new(
            &format!("UTF-8 decoding error: {}", err),
            ErrorKind::MalformedInput,
        )
    }
}

impl From<String> for LedgerError {
    fn from(msg: String) -> Self {
        LedgerError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for LedgerError {
    fn from(msg: &str) -> Self {
        LedgerError::new(msg, ErrorKind::InternalError)
    }
}
