//! Transform store converting positions between the register and DICOM frames.
//!
//! The store holds at most one `rMd` transform (register to DICOM) together
//! with its inverse, both computed once on load. Conversions never fail:
//! without a transform, or with an identity transform, positions pass
//! through untouched.

use common::{affine::AffineTransform, linalg::nalgebra::Matrix4Ext as _};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
  consts::{IDENTITY_TOLERANCE, INVERSE_TOLERANCE, SINGULARITY_TOLERANCE},
  error::{InvalidTransform, Result, TransformError},
  source::{FrameConvention, RowMatrix, TransformMetadata, TransformSource},
  Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDirection {
  /// Applies the inverse of the stored transform.
  RegisterToDicom,
  /// Applies the stored transform.
  DicomToRegister,
}

/// A validated transform with its precomputed inverse.
///
/// Only constructible through validation, so holding one means the matrix is
/// finite and invertible and that `forward * inverse` is the identity up to
/// rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTransform {
  forward: AffineTransform,
  inverse: AffineTransform,
  is_identity: bool,
  metadata: TransformMetadata,
}
impl LoadedTransform {
  pub fn new(matrix: na::Matrix4<f64>, metadata: TransformMetadata) -> Result<Self> {
    if let Some((row, col, value)) = matrix.find_non_finite() {
      return Err(InvalidTransform::NonFinite { row, col, value }.into());
    }
    let forward = AffineTransform::new(matrix);
    let determinant = forward.determinant();
    if !determinant.is_finite() {
      return Err(InvalidTransform::NonFiniteDeterminant { determinant }.into());
    }
    let inverse = forward
      .try_inverse(SINGULARITY_TOLERANCE)
      .ok_or_else(|| TransformError::singular(determinant))?;
    if inverse.matrix().find_non_finite().is_some() {
      return Err(InvalidTransform::NonFiniteInverse.into());
    }
    if !matrix.is_inverse_within(inverse.matrix(), INVERSE_TOLERANCE) {
      return Err(InvalidTransform::InverseMismatch.into());
    }
    let is_identity = matrix.is_identity_within(IDENTITY_TOLERANCE);
    Ok(Self {
      forward,
      inverse,
      is_identity,
      metadata,
    })
  }

  /// Validates `source` and derives the inverse. Rejections are logged.
  pub fn from_source(source: &TransformSource) -> Result<Self> {
    Self::from_source_in(source, FrameConvention::Lps)
  }

  /// [`LoadedTransform::from_source`] for a matrix written in `convention`.
  pub fn from_source_in(source: &TransformSource, convention: FrameConvention) -> Result<Self> {
    source
      .to_lps_matrix(convention)
      .map_err(TransformError::from)
      .and_then(|matrix| Self::new(matrix, source.metadata()))
      .inspect_err(|err| warn!("rejected registration transform: {err}"))
  }

  pub fn forward(&self) -> &AffineTransform {
    &self.forward
  }
  pub fn inverse(&self) -> &AffineTransform {
    &self.inverse
  }
  pub fn is_identity(&self) -> bool {
    self.is_identity
  }
  pub fn metadata(&self) -> &TransformMetadata {
    &self.metadata
  }
  pub fn determinant(&self) -> f64 {
    self.forward.determinant()
  }

  pub fn map(&self, direction: FrameDirection, position: Position) -> Position {
    if self.is_identity {
      return position;
    }
    match direction {
      FrameDirection::RegisterToDicom => self.inverse.apply_forward(&position),
      FrameDirection::DicomToRegister => self.forward.apply_forward(&position),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TransformState {
  #[default]
  Empty,
  Loaded(LoadedTransform),
}
impl TransformState {
  pub fn loaded(&self) -> Option<&LoadedTransform> {
    match self {
      Self::Empty => None,
      Self::Loaded(loaded) => Some(loaded),
    }
  }
}

/// Owned copy of the store contents at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSnapshot {
  pub transform: Option<RowMatrix>,
  pub inverse_transform: Option<RowMatrix>,
  #[serde(flatten)]
  pub metadata: TransformMetadata,
}
impl TransformSnapshot {
  /// Copies `state` with both matrices re-expressed in `convention`.
  pub fn of(state: &TransformState, convention: FrameConvention) -> Self {
    match state {
      TransformState::Empty => Self::default(),
      TransformState::Loaded(loaded) => Self {
        transform: Some(to_rows(convention.convert_transform(&loaded.forward).matrix())),
        inverse_transform: Some(to_rows(convention.convert_inverse(&loaded.inverse).matrix())),
        metadata: loaded.metadata.clone(),
      },
    }
  }

  pub fn is_empty(&self) -> bool {
    self.transform.is_none()
  }
}
impl From<&TransformState> for TransformSnapshot {
  fn from(state: &TransformState) -> Self {
    Self::of(state, FrameConvention::Lps)
  }
}

fn to_rows(matrix: &na::Matrix4<f64>) -> RowMatrix {
  std::array::from_fn(|row| std::array::from_fn(|col| matrix[(row, col)]))
}

#[derive(Debug, Clone, Default)]
pub struct CoordinateTransformer {
  state: TransformState,
}
impl CoordinateTransformer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Validates and installs a new transform.
  ///
  /// On error the previously loaded transform, if any, stays active.
  pub fn load_transform(&mut self, source: impl Into<TransformSource>) -> Result<()> {
    let loaded = LoadedTransform::from_source(&source.into())?;
    self.install(loaded);
    Ok(())
  }

  /// [`CoordinateTransformer::load_transform`] for a matrix written in
  /// `convention`, converted to LPS before validation.
  pub fn load_transform_in(
    &mut self,
    source: impl Into<TransformSource>,
    convention: FrameConvention,
  ) -> Result<()> {
    let loaded = LoadedTransform::from_source_in(&source.into(), convention)?;
    self.install(loaded);
    Ok(())
  }

  /// Replaces the current state with an already validated transform.
  pub fn install(&mut self, loaded: LoadedTransform) {
    debug!(
      determinant = loaded.determinant(),
      is_identity = loaded.is_identity,
      description = loaded.metadata.description.as_deref(),
      "installed registration transform"
    );
    self.state = TransformState::Loaded(loaded);
  }

  pub fn clear(&mut self) {
    if matches!(self.state, TransformState::Loaded(_)) {
      debug!("cleared registration transform");
    }
    self.state = TransformState::Empty;
  }

  pub fn convert_to_dicom(&self, register_position: impl Into<Position>) -> Position {
    self.convert(FrameDirection::RegisterToDicom, register_position)
  }

  pub fn convert_to_register(&self, dicom_position: impl Into<Position>) -> Position {
    self.convert(FrameDirection::DicomToRegister, dicom_position)
  }

  pub fn convert(&self, direction: FrameDirection, position: impl Into<Position>) -> Position {
    let position = position.into();
    match &self.state {
      TransformState::Empty => position,
      TransformState::Loaded(loaded) => loaded.map(direction, position),
    }
  }

  pub fn convert_all<I>(&self, direction: FrameDirection, positions: I) -> Vec<Position>
  where
    I: IntoIterator,
    I::Item: Into<Position>,
  {
    let positions = positions.into_iter().map(Into::<Position>::into);
    match &self.state {
      TransformState::Empty => positions.collect(),
      TransformState::Loaded(loaded) => positions.map(|p| loaded.map(direction, p)).collect(),
    }
  }

  pub fn has_transform(&self) -> bool {
    self.state.loaded().is_some()
  }

  /// `false` when no transform is loaded.
  pub fn is_identity_transform(&self) -> bool {
    self.state.loaded().is_some_and(LoadedTransform::is_identity)
  }

  pub fn determinant(&self) -> Option<f64> {
    self.state.loaded().map(LoadedTransform::determinant)
  }

  pub fn get_transform(&self) -> TransformSnapshot {
    TransformSnapshot::from(&self.state)
  }

  /// Snapshot with the matrices expressed in `convention`, e.g. for handing a
  /// transform back to a RAS planning tool.
  pub fn get_transform_in(&self, convention: FrameConvention) -> TransformSnapshot {
    TransformSnapshot::of(&self.state, convention)
  }

  pub fn state(&self) -> &TransformState {
    &self.state
  }
}
