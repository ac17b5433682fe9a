//! Affine transformation matrix for 2D pattern transformations
//!
//! A 3x3 affine matrix reduced to its six meaningful coefficients
//! `(a b c d e f)`. New transforms compose by post-multiplication: the most
//! recently applied transform acts in the already-transformed frame.

/// A 2D affine transformation
///
/// `point_in_matrix_space(x, y) = (a*x + c*y + e, b*x + d*y + f)`
///
/// # Example
///
/// ```
/// use stitchwise::core::matrix::EmbMatrix;
///
/// let mut matrix = EmbMatrix::new();
/// matrix.post_rotate(90.0, 100.0, 100.0);
/// let (x, y) = matrix.point_in_matrix_space(50.0, 50.0);
/// assert!((x - 150.0).abs() < 1e-9);
/// assert!((y - 50.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EmbMatrix {
    m: [f64; 6],
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

impl EmbMatrix {
    /// Create a new identity matrix
    pub fn new() -> Self {
        Self { m: IDENTITY }
    }

    /// Create a matrix from raw coefficients `(a b c d e f)`
    pub fn from_coefficients(m: [f64; 6]) -> Self {
        Self { m }
    }

    /// Get the raw coefficients
    pub fn coefficients(&self) -> &[f64; 6] {
        &self.m
    }

    /// Reset to the identity matrix
    pub fn reset(&mut self) {
        self.m = IDENTITY;
    }

    /// Check whether this matrix is (numerically) the identity
    pub fn is_identity(&self) -> bool {
        const EPSILON: f64 = 1e-10;
        self.m
            .iter()
            .zip(IDENTITY.iter())
            .all(|(v, i)| (v - i).abs() < EPSILON)
    }

    /// Post-multiply by a translation
    pub fn post_translate(&mut self, tx: f64, ty: f64) {
        self.post_cat([1.0, 0.0, 0.0, 1.0, tx, ty]);
    }

    /// Post-multiply by a scale about `(px, py)`
    ///
    /// `sy` defaults to `sx` when `None`.
    pub fn post_scale(&mut self, sx: f64, sy: Option<f64>, px: f64, py: f64) {
        let sy = sy.unwrap_or(sx);
        if px == 0.0 && py == 0.0 {
            self.post_cat([sx, 0.0, 0.0, sy, 0.0, 0.0]);
        } else {
            self.post_translate(-px, -py);
            self.post_scale(sx, Some(sy), 0.0, 0.0);
            self.post_translate(px, py);
        }
    }

    /// Post-multiply by a rotation of `theta` degrees about `(px, py)`
    pub fn post_rotate(&mut self, theta: f64, px: f64, py: f64) {
        if px == 0.0 && py == 0.0 {
            let rad = theta.to_radians();
            let ct = rad.cos();
            let st = rad.sin();
            self.post_cat([ct, st, -st, ct, 0.0, 0.0]);
        } else {
            self.post_translate(-px, -py);
            self.post_rotate(theta, 0.0, 0.0);
            self.post_translate(px, py);
        }
    }

    /// Transform a point through this matrix
    pub fn point_in_matrix_space(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.m;
        (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
    }

    /// Append `other` so that it applies after this matrix
    fn post_cat(&mut self, a: [f64; 6]) {
        let m = &self.m;
        self.m = [
            m[0] * a[0] + m[1] * a[2],
            m[0] * a[1] + m[1] * a[3],
            m[2] * a[0] + m[3] * a[2],
            m[2] * a[1] + m[3] * a[3],
            m[4] * a[0] + m[5] * a[2] + a[4],
            m[4] * a[1] + m[5] * a[3] + a[5],
        ];
    }
}

impl Default for EmbMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Mul for &EmbMatrix {
    type Output = EmbMatrix;

    /// Compose two matrices; the right-hand side applies after the left.
    fn mul(self, rhs: &EmbMatrix) -> EmbMatrix {
        let mut out = self.clone();
        out.post_cat(rhs.m);
        out
    }
}
