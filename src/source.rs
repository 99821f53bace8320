//! Accepted input shapes for a register-to-DICOM transform.
//!
//! A transform arrives either as a bare 4x4 nested sequence or as a record
//! `{ "matrix": [...], "description": "...", "notes": "..." }`. Only the
//! matrix takes part in conversion; the metadata travels with the loaded
//! transform and shows up again in snapshots.

use std::str::FromStr;

use common::affine::AffineTransform;
use itertools::iproduct;
use serde::Serialize;
use serde_json::Value;

use crate::{
  consts::MATRIX_DIM,
  error::{InvalidTransform, TransformError},
};

pub type RawMatrix = Vec<Vec<f64>>;
/// Row-major 4x4 array.
pub type RowMatrix = [[f64; MATRIX_DIM]; MATRIX_DIM];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformMetadata {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}
impl TransformMetadata {
  pub fn is_empty(&self) -> bool {
    self.description.is_none() && self.notes.is_none()
  }
}

/// Patient axis convention a matrix is written in.
///
/// The store works in LPS, the DICOM convention. Planning tools commonly
/// export RAS; the two differ by the sign of the x and y axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FrameConvention {
  #[default]
  Lps,
  Ras,
}
impl FrameConvention {
  /// Re-expresses a transform between this convention and LPS, in either
  /// direction. Applies the flip on the left only.
  pub fn convert_transform(self, transform: &AffineTransform) -> AffineTransform {
    match self {
      Self::Lps => *transform,
      Self::Ras => transform.flip_ras_lps(),
    }
  }

  /// Counterpart of [`FrameConvention::convert_transform`] for an inverse,
  /// where the flip lands on the right.
  pub fn convert_inverse(self, inverse: &AffineTransform) -> AffineTransform {
    match self {
      Self::Lps => *inverse,
      Self::Ras => inverse.compose(&AffineTransform::ras_lps_flip()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransformSource {
  Raw(RawMatrix),
  Record {
    matrix: RawMatrix,
    #[serde(flatten)]
    metadata: TransformMetadata,
  },
}

impl TransformSource {
  pub fn record(matrix: impl Into<RawMatrix>, description: Option<String>) -> Self {
    Self::Record {
      matrix: matrix.into(),
      metadata: TransformMetadata {
        description,
        notes: None,
      },
    }
  }

  pub fn rows(&self) -> &RawMatrix {
    match self {
      Self::Raw(matrix) | Self::Record { matrix, .. } => matrix,
    }
  }

  pub fn metadata(&self) -> TransformMetadata {
    match self {
      Self::Raw(_) => TransformMetadata::default(),
      Self::Record { metadata, .. } => metadata.clone(),
    }
  }

  /// Checks the shape and the entries and builds the 4x4 matrix.
  pub fn to_matrix(&self) -> Result<na::Matrix4<f64>, InvalidTransform> {
    let rows = self.rows();
    if rows.len() != MATRIX_DIM {
      return Err(InvalidTransform::RowCount {
        expected: MATRIX_DIM,
        found: rows.len(),
      });
    }
    if let Some((row, entries)) = rows
      .iter()
      .enumerate()
      .find(|(_, entries)| entries.len() != MATRIX_DIM)
    {
      return Err(InvalidTransform::RowLength {
        row,
        expected: MATRIX_DIM,
        found: entries.len(),
      });
    }
    if let Some((row, col)) =
      iproduct!(0..MATRIX_DIM, 0..MATRIX_DIM).find(|&(row, col)| !rows[row][col].is_finite())
    {
      return Err(InvalidTransform::NonFinite {
        row,
        col,
        value: rows[row][col],
      });
    }
    Ok(na::Matrix4::from_fn(|row, col| rows[row][col]))
  }

  /// Like [`TransformSource::to_matrix`], with the matrix re-expressed in LPS.
  pub fn to_lps_matrix(
    &self,
    convention: FrameConvention,
  ) -> Result<na::Matrix4<f64>, InvalidTransform> {
    let transform = AffineTransform::new(self.to_matrix()?);
    Ok(*convention.convert_transform(&transform).matrix())
  }

  /// Decodes a JSON matrix or record.
  ///
  /// Shape is not checked here, a 3x3 matrix decodes fine and is rejected
  /// by [`TransformSource::to_matrix`]. Non-string metadata is dropped.
  pub fn from_json_value(value: &Value) -> Result<Self, InvalidTransform> {
    match value {
      Value::Array(rows) => Ok(Self::Raw(decode_rows(rows)?)),
      Value::Object(fields) => {
        let matrix = fields.get("matrix").ok_or(InvalidTransform::MissingMatrix)?;
        let rows = matrix.as_array().ok_or(InvalidTransform::NotAMatrix)?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);
        Ok(Self::Record {
          matrix: decode_rows(rows)?,
          metadata: TransformMetadata {
            description: text("description"),
            notes: text("notes"),
          },
        })
      }
      _ => Err(InvalidTransform::NotAMatrix),
    }
  }
}

fn decode_rows(rows: &[Value]) -> Result<RawMatrix, InvalidTransform> {
  rows
    .iter()
    .enumerate()
    .map(|(row, entries)| -> Result<Vec<f64>, InvalidTransform> {
      let entries = entries
        .as_array()
        .ok_or(InvalidTransform::RowNotSequence { row })?;
      entries
        .iter()
        .enumerate()
        .map(|(col, entry)| entry.as_f64().ok_or(InvalidTransform::NonNumeric { row, col }))
        .collect()
    })
    .collect()
}

impl FromStr for TransformSource {
  type Err = TransformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let value: Value = serde_json::from_str(s).map_err(InvalidTransform::from)?;
    Ok(Self::from_json_value(&value)?)
  }
}

impl TryFrom<Value> for TransformSource {
  type Error = TransformError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    Ok(Self::from_json_value(&value)?)
  }
}

impl From<RawMatrix> for TransformSource {
  fn from(matrix: RawMatrix) -> Self {
    Self::Raw(matrix)
  }
}
impl From<RowMatrix> for TransformSource {
  fn from(matrix: RowMatrix) -> Self {
    Self::Raw(matrix.iter().map(|row| row.to_vec()).collect())
  }
}
impl From<na::Matrix4<f64>> for TransformSource {
  fn from(matrix: na::Matrix4<f64>) -> Self {
    Self::Raw(
      matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect(),
    )
  }
}
