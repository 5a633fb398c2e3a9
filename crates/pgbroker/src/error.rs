//! Error types for pgbroker

use thiserror::Error;

/// Result type alias for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Error types for statement assembly and persistence operations
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Property or column missing from an entity's table profile
    #[error("Schema binding error: {0}")]
    SchemaBinding(String),

    /// Value mappings bound to different table profiles
    #[error("Incompatible mappings: {0}")]
    IncompatibleMapping(String),

    /// Keyed view requested on a merged value mapping
    #[error("Merged mapping: {0}")]
    MergedMapping(String),

    /// Statement rendered or bound before its required parts were set
    #[error("Statement not ready: {0}")]
    NotReady(String),

    /// Setter invoked on a statement kind that forbids it
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Insert values already carry the generated identity property
    #[error("Identity conflict: {0}")]
    IdentityConflict(String),

    /// Row or property not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Schema configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity <-> value mapping conversion error
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Statement execution error from the backend
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// Create a schema binding error
    pub fn schema_binding(message: impl Into<String>) -> Self {
        Self::SchemaBinding(message.into())
    }

    /// Create a not ready error
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady(message.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a conversion error
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// Create an internal invariant error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a not ready error
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }

    /// Check if this is a merged mapping error
    pub fn is_merged_mapping(&self) -> bool {
        matches!(self, Self::MergedMapping(_))
    }

    /// Check if the backend reported a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::UniqueViolation(_)))
    }
}

/// Error types reported by [`Executor`](crate::executor::Executor) implementations
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Statement carries a placeholder with no bound value
    #[error("Unknown placeholder: {0}")]
    UnknownPlaceholder(String),

    /// Column type the value layer cannot represent
    #[error("Unsupported type {ty} on column '{column}'")]
    UnsupportedType { column: String, ty: String },

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Other backend error
    #[error("Backend error: {0}")]
    Backend(#[from] tokio_postgres::Error),
}

impl ExecutionError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Parse a tokio_postgres error into a more specific ExecutionError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Backend(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for BrokerError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
