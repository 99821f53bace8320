use crate::linalg::nalgebra::{Matrix4, Matrix4Ext, Point3};

/// Affine map stored as a homogeneous 4x4 matrix.
///
/// Points are lifted with an implicit `w = 1` and the first three components
/// of the product are returned. The bottom row takes part in the product
/// but no perspective division happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
  matrix: Matrix4,
}
impl AffineTransform {
  pub fn new(matrix: Matrix4) -> Self {
    Self { matrix }
  }

  /// `diag(-1, -1, 1, 1)`: negates x and y, mapping RAS patient axes to LPS
  /// and back.
  pub fn ras_lps_flip() -> Self {
    Self::new(Matrix4::from_diagonal(&na::Vector4::new(-1.0, -1.0, 1.0, 1.0)))
  }

  pub fn matrix(&self) -> &Matrix4 {
    &self.matrix
  }

  pub fn determinant(&self) -> f64 {
    self.matrix.cofactor_determinant()
  }

  pub fn apply_forward(&self, coord: &Point3) -> Point3 {
    let m = &self.matrix;
    let row =
      |r: usize| m[(r, 0)] * coord.x + m[(r, 1)] * coord.y + m[(r, 2)] * coord.z + m[(r, 3)];
    Point3::new(row(0), row(1), row(2))
  }

  /// Inverse by adjugate over determinant; `None` when `|det| < eps`.
  pub fn try_inverse(&self, eps: f64) -> Option<Self> {
    self.matrix.try_cofactor_inverse(eps).map(Self::new)
  }

  /// `self` after `other`.
  pub fn compose(&self, other: &Self) -> Self {
    Self::new(self.matrix * other.matrix)
  }

  /// Flips the output axes between RAS and LPS, `flip * self`.
  pub fn flip_ras_lps(&self) -> Self {
    Self::ras_lps_flip().compose(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  fn sheared() -> AffineTransform {
    AffineTransform::new(Matrix4::new(
      0.0, -2.0, 0.0, -1.0, //
      1.0, 0.0, 0.5, 4.0, //
      0.0, 0.0, 3.0, 2.5, //
      0.0, 0.0, 0.0, 1.0,
    ))
  }

  #[test]
  fn translation_moves_points() {
    let mut m = Matrix4::identity();
    m[(0, 3)] = 10.0;
    m[(1, 3)] = 20.0;
    m[(2, 3)] = 30.0;
    let p = AffineTransform::new(m).apply_forward(&Point3::new(1.0, 2.0, 3.0));
    assert_eq!(p, Point3::new(11.0, 22.0, 33.0));
  }

  #[test]
  fn apply_matches_homogeneous_product() {
    let t = sheared();
    let p = Point3::new(0.5, -7.0, 12.0);
    let expected = t.matrix() * p.to_homogeneous();
    let computed = t.apply_forward(&p);
    assert_relative_eq!(computed.coords, expected.xyz(), epsilon = 1e-12);
  }

  #[test]
  fn inverse_undoes_forward() {
    let rotation = na::Rotation3::from_euler_angles(0.3, -1.1, 2.0);
    let scaling = Matrix4::new_nonuniform_scaling(&na::Vector3::new(1.5, 0.8, 2.0));
    let mut m = rotation.to_homogeneous() * scaling;
    m[(0, 3)] = -35.0;
    m[(1, 3)] = 120.0;
    m[(2, 3)] = 7.0;
    let t = AffineTransform::new(m);
    let inv = t.try_inverse(1e-10).unwrap();
    let p = Point3::new(-12.0, 3.25, 88.0);
    assert_relative_eq!(inv.apply_forward(&t.apply_forward(&p)), p, epsilon = 1e-10);
    assert_relative_eq!(*t.compose(&inv).matrix(), Matrix4::identity(), epsilon = 1e-12);
  }

  #[test]
  fn degenerate_linear_part_is_not_invertible() {
    let flat = Matrix4::from_diagonal(&na::Vector4::new(1.0, 1.0, 0.0, 1.0));
    let flat = AffineTransform::new(flat);
    assert_eq!(flat.determinant(), 0.0);
    assert!(flat.try_inverse(1e-10).is_none());
  }

  #[test]
  fn ras_lps_flip_is_its_own_inverse() {
    let flip = AffineTransform::ras_lps_flip();
    assert_eq!(*flip.compose(&flip).matrix(), Matrix4::identity());
    assert_eq!(flip.determinant(), 1.0);
    assert_eq!(
      flip.apply_forward(&Point3::new(1.0, -2.0, 3.0)),
      Point3::new(-1.0, 2.0, 3.0)
    );

    let t = sheared();
    assert_eq!(t.flip_ras_lps().flip_ras_lps(), t);
  }

  #[test]
  fn flip_negates_first_two_rows() {
    let t = sheared();
    let flipped = t.flip_ras_lps();
    for col in 0..4 {
      assert_eq!(flipped.matrix()[(0, col)], -t.matrix()[(0, col)]);
      assert_eq!(flipped.matrix()[(1, col)], -t.matrix()[(1, col)]);
      assert_eq!(flipped.matrix()[(2, col)], t.matrix()[(2, col)]);
      assert_eq!(flipped.matrix()[(3, col)], t.matrix()[(3, col)]);
    }
  }
}
