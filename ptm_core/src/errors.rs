//! # Error Types
//!
//! Structured error types for ptm_core.
//!
//! Only contract violations and data-loading failures are errors. Geometry
//! that cannot be evaluated yields `NaN`, and a coating table without a
//! matching entry yields a [`LookupMiss`](crate::materials::LookupMiss), so a
//! caller can always render a row of dashes instead of aborting.
//!
//! ## Example
//!
//! ```rust
//! use ptm_core::errors::{CalcError, CalcResult};
//!
//! fn validate_segments(count: usize) -> CalcResult<()> {
//!     if count == 0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "segments".to_string(),
//!             value: count.to_string(),
//!             reason: "An outline needs at least one segment".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for ptm_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for loading data and calling the engine.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, wrong shape family, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Profile not present in the shape catalogue
    #[error("Profile not found: {family} / {standard} / {name}")]
    ProfileNotFound {
        family: String,
        standard: String,
        name: String,
    },

    /// Material not present in the coating database
    #[error("Material not found: {material_id}")]
    MaterialNotFound { material_id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a ProfileNotFound error
    pub fn profile_not_found(
        family: impl Into<String>,
        standard: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        CalcError::ProfileNotFound {
            family: family.into(),
            standard: standard.into(),
            name: name.into(),
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_id: impl Into<String>) -> Self {
        CalcError::MaterialNotFound {
            material_id: material_id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

/// Read a whole file to a string, mapping I/O failures to [`CalcError::FileError`].
pub(crate) fn read_to_string(path: &std::path::Path) -> CalcResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("segments", "0", "An outline needs at least one segment");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("kind").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::material_not_found("ograx").error_code(), "MATERIAL_NOT_FOUND");
        assert_eq!(
            CalcError::profile_not_found("I-beam", "GOST 8239-89", "20").error_code(),
            "PROFILE_NOT_FOUND"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let err: CalcError = serde_json::from_str::<Vec<f64>>("{").unwrap_err().into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_missing_file() {
        let err = read_to_string(std::path::Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert!(err.to_string().contains("here.json"));
    }
}
