use itertools::iproduct;

pub type Matrix4 = na::Matrix4<f64>;
pub type Point3 = na::Point3<f64>;

const N: usize = 4;

/// Fixed-size 4x4 helpers based on cofactor expansion.
///
/// Determinant and adjugate are built from the sixteen 3x3 minors,
/// no row reduction or pivoting is involved.
pub trait Matrix4Ext: Sized {
  fn minor(&self, row: usize, col: usize) -> f64;
  fn cofactor(&self, row: usize, col: usize) -> f64;
  fn cofactor_matrix(&self) -> Self;
  fn cofactor_determinant(&self) -> f64;
  /// Transposed cofactor matrix, `adj[j][i] = C[i][j]`.
  fn adjugate(&self) -> Self;
  /// Adjugate divided by the determinant, or `None` if `|det| < eps` or the
  /// determinant is not finite.
  fn try_cofactor_inverse(&self, eps: f64) -> Option<Self>;
  /// Whether `self * inverse` is the identity up to rounding.
  ///
  /// Each product entry may be off by `rel` times the summed magnitudes of
  /// the terms that formed it.
  fn is_inverse_within(&self, inverse: &Self, rel: f64) -> bool;
  fn is_identity_within(&self, eps: f64) -> bool;
  /// First entry (in row-major order) that is NaN or infinite.
  fn find_non_finite(&self) -> Option<(usize, usize, f64)>;
}

impl Matrix4Ext for Matrix4 {
  fn minor(&self, row: usize, col: usize) -> f64 {
    let rows = complement(row);
    let cols = complement(col);
    let e = |r: usize, c: usize| self[(rows[r], cols[c])];
    e(0, 0) * (e(1, 1) * e(2, 2) - e(1, 2) * e(2, 1))
      - e(0, 1) * (e(1, 0) * e(2, 2) - e(1, 2) * e(2, 0))
      + e(0, 2) * (e(1, 0) * e(2, 1) - e(1, 1) * e(2, 0))
  }

  fn cofactor(&self, row: usize, col: usize) -> f64 {
    let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
    sign * self.minor(row, col)
  }

  fn cofactor_matrix(&self) -> Self {
    Self::from_fn(|row, col| self.cofactor(row, col))
  }

  fn cofactor_determinant(&self) -> f64 {
    expand_first_row(self, &self.cofactor_matrix())
  }

  fn adjugate(&self) -> Self {
    self.cofactor_matrix().transpose()
  }

  fn try_cofactor_inverse(&self, eps: f64) -> Option<Self> {
    let cofactors = self.cofactor_matrix();
    let det = expand_first_row(self, &cofactors);
    (det.is_finite() && det.abs() >= eps).then(|| cofactors.transpose() / det)
  }

  fn is_inverse_within(&self, inverse: &Self, rel: f64) -> bool {
    iproduct!(0..N, 0..N).all(|(row, col)| {
      let (sum, scale) = (0..N)
        .map(|k| self[(row, k)] * inverse[(k, col)])
        .fold((0.0, 0.0), |(sum, scale), term| (sum + term, scale + term.abs()));
      let expected = if row == col { 1.0 } else { 0.0 };
      let residual = (sum - expected).abs();
      residual.is_finite() && residual <= rel * scale
    })
  }

  fn is_identity_within(&self, eps: f64) -> bool {
    iproduct!(0..N, 0..N).all(|(row, col)| {
      let expected = if row == col { 1.0 } else { 0.0 };
      (self[(row, col)] - expected).abs() <= eps
    })
  }

  fn find_non_finite(&self) -> Option<(usize, usize, f64)> {
    iproduct!(0..N, 0..N)
      .map(|(row, col)| (row, col, self[(row, col)]))
      .find(|&(_, _, value)| !value.is_finite())
  }
}

/// Laplace expansion along the first row, given the precomputed cofactors.
fn expand_first_row(m: &Matrix4, cofactors: &Matrix4) -> f64 {
  (0..N).map(|col| m[(0, col)] * cofactors[(0, col)]).sum()
}

/// The three indices of `0..4` other than `skip`, in ascending order.
fn complement(skip: usize) -> [usize; 3] {
  let mut out = [0; 3];
  for (slot, idx) in out.iter_mut().zip((0..N).filter(|&i| i != skip)) {
    *slot = idx;
  }
  out
}
