//! Conversion of 3-D positions between a surgical-planning register frame
//! and the DICOM patient frame through a 4x4 homogeneous transform.

extern crate nalgebra as na;

pub mod consts;
pub mod error;
pub mod shared;
pub mod source;
pub mod transformer;

pub use error::{InvalidTransform, Result, TransformError};
pub use shared::SharedTransformer;
pub use source::{FrameConvention, TransformMetadata, TransformSource};
pub use transformer::{CoordinateTransformer, FrameDirection, TransformSnapshot, TransformState};

/// A position in either frame, in millimetres.
pub type Position = na::Point3<f64>;
