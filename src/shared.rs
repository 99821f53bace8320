//! Lock-guarded handle for hosts that convert from several threads.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::{
  error::Result,
  source::{FrameConvention, TransformSource},
  transformer::{CoordinateTransformer, FrameDirection, LoadedTransform, TransformSnapshot},
  Position,
};

/// Cloneable handle to one [`CoordinateTransformer`].
///
/// A new transform is validated and inverted before the write lock is taken,
/// the swap under the lock is a single assignment.
#[derive(Debug, Clone, Default)]
pub struct SharedTransformer {
  inner: Arc<RwLock<CoordinateTransformer>>,
}
impl SharedTransformer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn load_transform(&self, source: impl Into<TransformSource>) -> Result<()> {
    let loaded = LoadedTransform::from_source(&source.into())?;
    self.inner.write().install(loaded);
    Ok(())
  }

  pub fn load_transform_in(
    &self,
    source: impl Into<TransformSource>,
    convention: FrameConvention,
  ) -> Result<()> {
    let loaded = LoadedTransform::from_source_in(&source.into(), convention)?;
    self.inner.write().install(loaded);
    Ok(())
  }

  pub fn clear(&self) {
    self.inner.write().clear();
  }

  pub fn convert_to_dicom(&self, register_position: impl Into<Position>) -> Position {
    self.inner.read().convert_to_dicom(register_position)
  }

  pub fn convert_to_register(&self, dicom_position: impl Into<Position>) -> Position {
    self.inner.read().convert_to_register(dicom_position)
  }

  pub fn convert_all<I>(&self, direction: FrameDirection, positions: I) -> Vec<Position>
  where
    I: IntoIterator,
    I::Item: Into<Position>,
  {
    self.inner.read().convert_all(direction, positions)
  }

  pub fn has_transform(&self) -> bool {
    self.inner.read().has_transform()
  }

  pub fn is_identity_transform(&self) -> bool {
    self.inner.read().is_identity_transform()
  }

  pub fn get_transform(&self) -> TransformSnapshot {
    self.inner.read().get_transform()
  }

  pub fn get_transform_in(&self, convention: FrameConvention) -> TransformSnapshot {
    self.inner.read().get_transform_in(convention)
  }

  /// Holds the read lock so that several calls see the same transform.
  pub fn read(&self) -> RwLockReadGuard<'_, CoordinateTransformer> {
    self.inner.read()
  }
}

impl From<CoordinateTransformer> for SharedTransformer {
  fn from(transformer: CoordinateTransformer) -> Self {
    Self {
      inner: Arc::new(RwLock::new(transformer)),
    }
  }
}
