use std::path::PathBuf;
use thiserror::Error;

use crate::model::SourceId;
use crate::registry::EntityKind;

/// Main error type for catalog-migrate
#[derive(Error, Debug)]
pub enum MigrateError {
    // Source Store Errors
    #[error("Failed to connect to source database: {message}")]
    SourceConnection {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Source query failed while reading {entity}: {message}")]
    SourceQuery {
        entity: String,
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    // Destination API Errors
    #[error("Request to content API failed during {operation}: {message}")]
    Http {
        operation: String,
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Content API rejected {operation} (HTTP {status}): {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from content API during {operation}: {message}")]
    MalformedResponse {
        operation: String,
        message: String,
    },

    // Pipeline Invariants
    #[error("{kind} {source_id} was already mapped to a destination id")]
    DuplicateMapping {
        kind: EntityKind,
        source_id: SourceId,
    },

    #[error("Entity type {0} is active but has no destination schema id")]
    MissingSchemaId(EntityKind),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load configuration from {path}: {message}")]
    ConfigLoad {
        path: PathBuf,
        message: String,
    },

    // General Errors
    #[error("{0}")]
    Other(String),
}

impl MigrateError {
    /// Wrap a source query failure with the entity being read
    pub fn source_query(entity: impl Into<String>, err: tokio_postgres::Error) -> Self {
        MigrateError::SourceQuery {
            entity: entity.into(),
            message: err.to_string(),
            source: err,
        }
    }

    /// Wrap a transport failure with the remote operation being attempted
    pub fn http(operation: impl Into<String>, err: reqwest::Error) -> Self {
        MigrateError::Http {
            operation: operation.into(),
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<tokio_postgres::Error> for MigrateError {
    fn from(err: tokio_postgres::Error) -> Self {
        MigrateError::SourceConnection {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<url::ParseError> for MigrateError {
    fn from(err: url::ParseError) -> Self {
        MigrateError::InvalidConnectionString(err.to_string())
    }
}

/// Result type alias for catalog-migrate operations
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Helper function to format error with all its causes
pub fn format_error_chain(err: &MigrateError) -> String {
    use std::error::Error;

    let mut output = format!("Error: {}", err);

    let mut current_err: &dyn Error = err;
    while let Some(source) = current_err.source() {
        output.push_str(&format!("\n  Caused by: {}", source));
        current_err = source;
    }

    output
}

/// Helper function to suggest fixes for common errors
pub fn suggest_fix(err: &MigrateError) -> Option<String> {
    match err {
        MigrateError::SourceConnection { .. } => Some(
            "Suggestions:\n\
             - Check if PostgreSQL is running\n\
             - Verify [source] connection_string or DATABASE_URL\n\
             - Try: psql <your-connection-string> to test the connection".to_string()
        ),
        MigrateError::InvalidConnectionString(_) => Some(
            "Connection string should be in format:\n\
             postgres://[user[:password]@][host][:port][/dbname]".to_string()
        ),
        MigrateError::Api { status: 401, .. } | MigrateError::Api { status: 403, .. } => Some(
            "The content API refused the token.\n\
             - Check [destination] api_token or DATO_TOKEN\n\
             - Make sure the token has write access to items and uploads".to_string()
        ),
        MigrateError::Api { status: 422, operation, .. } => Some(
            format!("The content API rejected the payload for {}.\n\
                    - Verify the schema ids in [entities.*] match the remote models\n\
                    - Check that the remote fields accept the migrated values", operation)
        ),
        MigrateError::MissingSchemaId(kind) => Some(
            format!("Set [entities.{}] schema_id in catalog-migrate.toml \
                    or the {} environment variable", kind, kind.env_var())
        ),
        _ => None,
    }
}
