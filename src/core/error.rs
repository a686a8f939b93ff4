//! Error types for AgriQuery
//!
//! Every pipeline stage has its own error enum; the top-level
//! [`AgriQueryError`] aggregates them so callers can hold one type.
//! Recovery hints are exposed through [`ErrorRecovery`].

use thiserror::Error;

/// Result type alias for AgriQuery operations
pub type Result<T> = std::result::Result<T, AgriQueryError>;

/// Main error type for AgriQuery
#[derive(Error, Debug)]
pub enum AgriQueryError {
    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    #[error("Time range error: {0}")]
    TimeRange(#[from] TimeRangeError),

    #[error("Routing error: {0}")]
    Route(#[from] RouteError),

    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("Alert parse error: {0}")]
    AlertParse(#[from] AlertParseError),

    #[error("SQL guard error: {0}")]
    SqlGuard(#[from] SqlGuardError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Ontology loading and lookup errors
#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("Synonym {synonym:?} maps to both {first} and {second}")]
    SynonymCollision {
        synonym: String,
        first: String,
        second: String,
    },

    #[error("Unknown sensor identifier: {token}")]
    UnknownSensor { token: String },

    #[error("Unknown feature context: {context}")]
    UnknownContext { context: String },

    #[error("Synonym learning rejected: {reason}")]
    LearningRejected { reason: String },

    #[error("Synonym learning is disabled")]
    LearningDisabled,
}

/// Canonical time token errors
#[derive(Error, Debug)]
pub enum TimeRangeError {
    #[error("Unknown time range token: {token}")]
    UnknownToken { token: String },

    #[error("Time quantity out of range: {value}")]
    QuantityOutOfRange { value: u64 },
}

/// Intent routing errors
#[derive(Error, Debug)]
pub enum RouteError {
    /// The query asked for something outside the sensor-reading domain
    /// (destructive SQL verbs, credential or prompt exfiltration). The
    /// reason is for internal logs only and is never shown to the user.
    #[error("Unsafe request rejected: {reason}")]
    UnsafeRequest { reason: String },
}

/// Descriptor construction errors. These are recoverable by asking the
/// user to rephrase.
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("Could not resolve a sensor entity (feature context: {feature_context})")]
    EntityUnresolved { feature_context: String },

    #[error("Comparison phrasing found but the two periods could not be resolved")]
    ComparisonUnresolved,

    #[error("Descriptor invariant violated: {reason}")]
    InvalidDescriptor { reason: String },
}

/// Alert extraction errors
#[derive(Error, Debug)]
pub enum AlertParseError {
    #[error("No sensor entity found in alert request")]
    MissingSensor,

    #[error("No comparison operator found in alert request")]
    MissingOperator,

    #[error("No numeric threshold found in alert request")]
    MissingThreshold,
}

/// Static SQL validation errors. Reasons are logged internally and never
/// returned to the end user.
#[derive(Error, Debug)]
pub enum SqlGuardError {
    #[error("Multiple SQL statements in one string")]
    MultipleStatements,

    #[error("Statement is not a SELECT")]
    NotSelect,

    #[error("Forbidden keyword: {keyword}")]
    ForbiddenKeyword { keyword: String },

    #[error("Table not allowed: {table}")]
    ForbiddenTable { table: String },

    #[error("Column not allowed: {column}")]
    ForbiddenColumn { column: String },
}

/// Text-completion API errors
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Completion rate limit exceeded")]
    RateLimitExceeded,

    #[error("Completion authentication failed")]
    AuthenticationFailed,

    #[error("Completion response parsing failed: {reason}")]
    ResponseParseFailed { reason: String },

    #[error("Completion timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Completion backend is disabled")]
    Disabled,
}

/// Sensor-reading store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Store query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Store query timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed {
                reason: db_err.to_string(),
            },
            sqlx::Error::PoolTimedOut => StoreError::ConnectionFailed {
                reason: "Pool timed out".to_string(),
            },
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed {
                reason: "Pool closed".to_string(),
            },
            _ => StoreError::QueryFailed {
                reason: err.to_string(),
            },
        }
    }
}

/// Trait for error recovery strategies
pub trait ErrorRecovery {
    /// Check if the error is retryable
    fn is_retryable(&self) -> bool;

    /// Get suggested retry delay in milliseconds
    fn retry_delay_ms(&self) -> Option<u64>;

    /// Get recovery action suggestion
    fn recovery_action(&self) -> RecoveryAction;
}

/// Recovery action suggestions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation
    Retry,
    /// Skip this item and continue
    Skip,
    /// Fall back to alternative method
    Fallback,
    /// Notify user and wait for input
    NotifyUser,
    /// Abort the operation
    Abort,
}

impl ErrorRecovery for AgriQueryError {
    fn is_retryable(&self) -> bool {
        match self {
            AgriQueryError::Completion(e) => e.is_retryable(),
            AgriQueryError::Store(e) => e.is_retryable(),
            AgriQueryError::Database(_) => true,
            AgriQueryError::Io(_) => true,
            _ => false,
        }
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            AgriQueryError::Completion(e) => e.retry_delay_ms(),
            AgriQueryError::Store(e) => e.retry_delay_ms(),
            AgriQueryError::Database(_) => Some(1000),
            AgriQueryError::Io(_) => Some(1000),
            _ => None,
        }
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            AgriQueryError::Ontology(e) => e.recovery_action(),
            AgriQueryError::TimeRange(_) => RecoveryAction::NotifyUser,
            AgriQueryError::Route(_) => RecoveryAction::Abort,
            AgriQueryError::Semantic(_) => RecoveryAction::NotifyUser,
            AgriQueryError::AlertParse(_) => RecoveryAction::NotifyUser,
            AgriQueryError::SqlGuard(_) => RecoveryAction::Abort,
            AgriQueryError::Completion(e) => e.recovery_action(),
            AgriQueryError::Store(e) => e.recovery_action(),
            AgriQueryError::Database(_) => RecoveryAction::Retry,
            AgriQueryError::Io(_) => RecoveryAction::Retry,
            AgriQueryError::Internal(_) => RecoveryAction::Abort,
        }
    }
}

impl AgriQueryError {
    /// True when the user can fix the problem by rephrasing the question.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            AgriQueryError::Semantic(_)
                | AgriQueryError::AlertParse(_)
                | AgriQueryError::TimeRange(_)
        )
    }

    /// True when the query was rejected as out of scope or unsafe.
    pub fn is_unsafe_rejection(&self) -> bool {
        matches!(self, AgriQueryError::Route(RouteError::UnsafeRequest { .. }))
    }
}

impl ErrorRecovery for OntologyError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            // Collisions are a configuration bug and must stop startup.
            OntologyError::SynonymCollision { .. } => RecoveryAction::Abort,
            OntologyError::UnknownSensor { .. } => RecoveryAction::NotifyUser,
            OntologyError::UnknownContext { .. } => RecoveryAction::NotifyUser,
            OntologyError::LearningRejected { .. } => RecoveryAction::Skip,
            OntologyError::LearningDisabled => RecoveryAction::Skip,
        }
    }
}

impl ErrorRecovery for CompletionError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::RequestFailed { .. }
                | CompletionError::Timeout { .. }
                | CompletionError::RateLimitExceeded
        )
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            CompletionError::RateLimitExceeded => Some(60000),
            CompletionError::Timeout { .. } => Some(1000),
            CompletionError::RequestFailed { .. } => Some(2000),
            _ => None,
        }
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            CompletionError::AuthenticationFailed => RecoveryAction::NotifyUser,
            CompletionError::Disabled => RecoveryAction::Fallback,
            CompletionError::ResponseParseFailed { .. } => RecoveryAction::Fallback,
            _ => RecoveryAction::Retry,
        }
    }
}

impl ErrorRecovery for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionFailed { .. } | StoreError::Timeout { .. }
        )
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            StoreError::ConnectionFailed { .. } => Some(1000),
            StoreError::Timeout { .. } => Some(500),
            _ => None,
        }
    }

    fn recovery_action(&self) -> RecoveryAction {
        match self {
            StoreError::QueryFailed { .. } => RecoveryAction::NotifyUser,
            _ => RecoveryAction::Retry,
        }
    }
}
