use std::sync::Arc;

use thiserror::Error;

use crate::validate::ValidationReport;

/// Errors raised by the extraction engine.
///
/// `ConfigurationIntegrity`, `SheetNotFound` and `StructuralValidation` abort
/// the whole batch before any output is written. `MalformedRange` and `Decode`
/// abort only the record being processed.
#[derive(Clone, Debug, Error, strum_macros::EnumDiscriminants)]
#[strum_discriminants(name(ErrorKind))]
pub enum ExtractionError {
    /// The configuration table is malformed or contradicts itself.
    #[error("configuration integrity: {0}")]
    ConfigurationIntegrity(String),

    /// A sheet referenced by the configuration does not exist.
    #[error("sheet does not exist: {sheet:?}")]
    SheetNotFound { sheet: String },

    /// Blank rows or whitespace-only cells were found in configured sheets.
    #[error("{0}")]
    StructuralValidation(ValidationReport),

    /// A range expression could not be parsed.
    #[error("malformed range expression {expression:?}: {reason}")]
    MalformedRange { expression: String, reason: String },

    /// A workbook or cell could not be decoded.
    #[error("decoding {location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: Arc<DecodeFailure>,
    },
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        self.into()
    }

    pub(crate) fn integrity(message: impl Into<String>) -> Self {
        Self::ConfigurationIntegrity(message.into())
    }

    pub(crate) fn decode(location: impl Into<String>, failure: DecodeFailure) -> Self {
        Self::Decode {
            location: location.into(),
            source: Arc::new(failure),
        }
    }

    pub(crate) fn malformed_range(expression: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRange {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Underlying cause of an [ExtractionError::Decode].
#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error(transparent)]
    Workbook(#[from] calamine::Error),

    #[error("date serial {0} is out of range")]
    DateOutOfRange(f64),
}

pub type Result<T, E = ExtractionError> = std::result::Result<T, E>;
