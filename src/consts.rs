/// Rows and columns of a homogeneous 3-D transform.
pub const MATRIX_DIM: usize = 4;

/// Per-entry tolerance when deciding whether a transform is the identity.
pub const IDENTITY_TOLERANCE: f64 = 1e-6;

/// Determinants with a smaller magnitude are treated as singular.
pub const SINGULARITY_TOLERANCE: f64 = 1e-10;

/// Relative rounding allowed when checking `transform * inverse` against the
/// identity.
pub const INVERSE_TOLERANCE: f64 = 1e-6;
