//! Unified error taxonomy for every data-access operation.
//!
//! Backend driver errors never cross the engine boundary: they are converted
//! into one of the four [`DaoError`] kinds, so callers can branch on the kind
//! without knowing which backend served the call.

use crate::codec::CodecError;
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all DAO operations.
#[derive(Error, Debug)]
pub enum DaoError {
    /// Pool, network or backend unavailability. Also raised for malformed
    /// connection configuration and unknown drivers at startup.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The requested key has no stored representation.
    #[error("Value not found: {entity} with key {key}")]
    NotFound { entity: String, key: String },

    /// A field value could not be encoded to or decoded from its backend form.
    #[error("Codec error on field `{field}`: {source}")]
    Codec {
        field: String,
        #[source]
        source: CodecError,
    },

    /// The entity declaration is unusable (key missing or ambiguous, bad names).
    #[error("Invalid entity {entity}: {reason}")]
    InvalidEntity { entity: String, reason: String },
}

impl DaoError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Codec { .. } => "CODEC_ERROR",
            Self::InvalidEntity { .. } => "INVALID_ENTITY",
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection<T: Into<String>>(message: T) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a not found error for an entity key.
    #[must_use]
    pub fn not_found<E: Into<String>, K: ToString>(entity: E, key: K) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    /// Creates a codec error attached to a field.
    #[must_use]
    pub fn codec<F: Into<String>>(field: F, source: CodecError) -> Self {
        Self::Codec {
            field: field.into(),
            source,
        }
    }

    /// Creates an invalid entity error.
    #[must_use]
    pub fn invalid_entity<E: Into<String>, R: Into<String>>(entity: E, reason: R) -> Self {
        Self::InvalidEntity {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Checks if the caller may reasonably retry the operation.
    ///
    /// Only connection failures are transient; the core itself never retries.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns true for the not-found control-flow signal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for DaoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { index, source } => {
                Self::codec(index, CodecError::new(source.to_string()))
            }
            sqlx::Error::ColumnNotFound(column) => {
                Self::codec(column, CodecError::new("column missing from result set"))
            }
            sqlx::Error::Decode(source) => {
                Self::codec("<row>", CodecError::new(source.to_string()))
            }
            sqlx::Error::RowNotFound => Self::NotFound {
                entity: "database_row".to_string(),
                key: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) if is_data_error(&*db_err) => {
                Self::codec("<row>", CodecError::new(db_err.message()))
            }
            other => Self::Connection(other.to_string()),
        }
    }
}

/// Returns true when the backend rejected the data itself (constraint
/// violations, SQLSTATE classes 22 and 23), which retrying cannot fix.
#[cfg(feature = "sqlx")]
fn is_data_error(err: &dyn sqlx::error::DatabaseError) -> bool {
    use sqlx::error::ErrorKind;

    if !matches!(err.kind(), ErrorKind::Other) {
        return true;
    }
    err.code()
        .is_some_and(|code| code.starts_with("22") || code.starts_with("23"))
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for DaoError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

#[cfg(feature = "mongodb")]
impl From<bson::ser::Error> for DaoError {
    fn from(err: bson::ser::Error) -> Self {
        Self::codec("<document>", CodecError::new(err.to_string()))
    }
}

#[cfg(feature = "mongodb")]
impl From<bson::de::Error> for DaoError {
    fn from(err: bson::de::Error) -> Self {
        Self::codec("<document>", CodecError::new(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DaoError::connection("down").error_code(), "CONNECTION_ERROR");
        assert_eq!(DaoError::not_found("user", "u1").error_code(), "NOT_FOUND");
        assert_eq!(
            DaoError::codec("tags", CodecError::new("bad json")).error_code(),
            "CODEC_ERROR"
        );
        assert_eq!(
            DaoError::invalid_entity("user", "no key").error_code(),
            "INVALID_ENTITY"
        );
    }

    #[test]
    fn test_only_connection_errors_are_retriable() {
        assert!(DaoError::connection("pool exhausted").is_retriable());
        assert!(!DaoError::not_found("user", "u1").is_retriable());
        assert!(!DaoError::codec("age", CodecError::new("overflow")).is_retriable());
        assert!(!DaoError::invalid_entity("user", "two keys").is_retriable());
    }

    #[test]
    fn test_display_carries_cause() {
        let err = DaoError::not_found("user", "u1");
        assert_eq!(err.to_string(), "Value not found: user with key u1");
        assert!(err.is_not_found());

        let err = DaoError::codec("tags", CodecError::new("expected a sequence"));
        assert!(err.to_string().contains("`tags`"));
        assert!(err.to_string().contains("expected a sequence"));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_sqlx_errors_are_reclassified() {
        let err: DaoError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DaoError::Connection(_)));

        let err: DaoError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DaoError::Connection(_)));

        let err: DaoError = sqlx::Error::ColumnNotFound("name".to_string()).into();
        assert!(matches!(err, DaoError::Codec { ref field, .. } if field == "name"));

        let err: DaoError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[cfg(feature = "sqlx")]
    mod database {
        use super::*;
        use sqlx::error::{DatabaseError, ErrorKind};
        use std::borrow::Cow;
        use std::error::Error as StdError;
        use std::fmt;

        #[derive(Debug)]
        struct Rejected {
            code: &'static str,
            kind: ErrorKind,
        }

        impl fmt::Display for Rejected {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "rejected with {}", self.code)
            }
        }

        impl StdError for Rejected {}

        impl DatabaseError for Rejected {
            fn message(&self) -> &str {
                "Data too long for column 'id'"
            }

            fn code(&self) -> Option<Cow<'_, str>> {
                Some(Cow::Borrowed(self.code))
            }

            fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
                self
            }

            fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
                self
            }

            fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
                self
            }

            fn kind(&self) -> ErrorKind {
                match self.kind {
                    ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                    ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                    _ => ErrorKind::Other,
                }
            }
        }

        fn convert(code: &'static str, kind: ErrorKind) -> DaoError {
            sqlx::Error::Database(Box::new(Rejected { code, kind })).into()
        }

        #[test]
        fn test_rejected_data_is_a_codec_error() {
            let err = convert("22001", ErrorKind::Other);
            assert!(matches!(err, DaoError::Codec { .. }));
            assert!(!err.is_retriable());
            assert!(err.to_string().contains("Data too long"));

            assert!(matches!(
                convert("275", ErrorKind::CheckViolation),
                DaoError::Codec { .. }
            ));
            assert!(matches!(
                convert("23505", ErrorKind::UniqueViolation),
                DaoError::Codec { .. }
            ));
        }

        #[test]
        fn test_other_database_errors_stay_retriable() {
            let err = convert("08006", ErrorKind::Other);
            assert!(matches!(err, DaoError::Connection(_)));
            assert!(err.is_retriable());
        }
    }
}
