//! Error types for loading registration transforms.

use thiserror::Error;

use crate::consts::SINGULARITY_TOLERANCE;

/// Why a supplied matrix was not accepted as a transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidTransform {
  #[error("expected {expected} rows, found {found}")]
  RowCount { expected: usize, found: usize },

  #[error("row {row} has {found} entries, expected {expected}")]
  RowLength {
    row: usize,
    expected: usize,
    found: usize,
  },

  #[error("row {row} is not a sequence")]
  RowNotSequence { row: usize },

  #[error("entry ({row}, {col}) is not a number")]
  NonNumeric { row: usize, col: usize },

  #[error("entry ({row}, {col}) is not finite: {value}")]
  NonFinite { row: usize, col: usize, value: f64 },

  /// Finite entries whose determinant overflowed or cancelled to NaN.
  #[error("determinant is not finite: {determinant}")]
  NonFiniteDeterminant { determinant: f64 },

  /// The determinant passed the singularity check but the inverse overflowed.
  #[error("inverse has non-finite entries")]
  NonFiniteInverse,

  /// Cofactors under- or overflowed so `transform * inverse` is not the identity.
  #[error("inverse does not reproduce the identity")]
  InverseMismatch,

  #[error("expected a matrix or a record with a `matrix` field")]
  NotAMatrix,

  #[error("record has no `matrix` field")]
  MissingMatrix,

  #[error("malformed JSON: {0}")]
  Json(String),
}

/// Errors raised when loading a transform. The store is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
  #[error("invalid transform: {0}")]
  InvalidTransform(#[from] InvalidTransform),

  #[error("singular transform: |det| = {determinant:e} is below {tolerance:e}")]
  SingularMatrix { determinant: f64, tolerance: f64 },
}

pub type Result<T> = std::result::Result<T, TransformError>;

impl TransformError {
  pub fn singular(determinant: f64) -> Self {
    Self::SingularMatrix {
      determinant,
      tolerance: SINGULARITY_TOLERANCE,
    }
  }

  pub fn is_invalid(&self) -> bool {
    matches!(self, Self::InvalidTransform(_))
  }
  pub fn is_singular(&self) -> bool {
    matches!(self, Self::SingularMatrix { .. })
  }
}

impl From<serde_json::Error> for InvalidTransform {
  fn from(err: serde_json::Error) -> Self {
    Self::Json(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_offending_entry() {
    let err = TransformError::from(InvalidTransform::NonFinite {
      row: 1,
      col: 3,
      value: f64::INFINITY,
    });
    assert_eq!(
      err.to_string(),
      "invalid transform: entry (1, 3) is not finite: inf"
    );
    assert!(err.is_invalid());
    assert!(!err.is_singular());
  }

  #[test]
  fn singular_reports_threshold() {
    let err = TransformError::singular(0.0);
    assert!(err.is_singular());
    assert_eq!(
      err,
      TransformError::SingularMatrix {
        determinant: 0.0,
        tolerance: 1e-10
      }
    );
    assert!(err.to_string().starts_with("singular transform"));
  }
}
