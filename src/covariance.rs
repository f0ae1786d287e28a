use core::ops::Add;
use nalgebra::{Matrix4, RealField};
use num_traits::Float;

/// The dimension of the quaternion state.
pub const QUATERNION_DIM: usize = 4;

/// A 4×4 covariance matrix over the quaternion components, stored row-major.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Covariance<T> {
    rows: [[T; QUATERNION_DIM]; QUATERNION_DIM],
}

impl<T> Covariance<T> {
    /// Initializes a new [`Covariance`] from its rows.
    #[inline(always)]
    pub const fn from_rows(rows: [[T; QUATERNION_DIM]; QUATERNION_DIM]) -> Self {
        Self { rows }
    }

    /// Returns the rows of the matrix.
    #[inline(always)]
    pub const fn rows(&self) -> &[[T; QUATERNION_DIM]; QUATERNION_DIM] {
        &self.rows
    }

    /// Gets the value at the specified row and column.
    #[inline(always)]
    pub fn get_at(&self, row: usize, column: usize) -> T
    where
        T: Copy,
    {
        self.rows[row][column]
    }

    /// Sets the value at the specified row and column.
    #[inline(always)]
    pub fn set_at(&mut self, row: usize, column: usize, value: T) {
        self.rows[row][column] = value;
    }
}

impl<T> Covariance<T>
where
    T: Float,
{
    /// Returns the all-zero matrix.
    pub fn zeros() -> Self {
        Self::from_rows([[T::zero(); QUATERNION_DIM]; QUATERNION_DIM])
    }

    /// Returns the identity matrix.
    pub fn identity() -> Self {
        Self::from_scalar(T::one())
    }

    /// Returns `value · I`.
    pub fn from_scalar(value: T) -> Self {
        Self::from_diagonal([value; QUATERNION_DIM])
    }

    /// Returns a diagonal matrix.
    pub fn from_diagonal(diagonal: [T; QUATERNION_DIM]) -> Self {
        let mut matrix = Self::zeros();
        for (i, value) in diagonal.into_iter().enumerate() {
            matrix.rows[i][i] = value;
        }
        matrix
    }

    /// Determines whether all entries are finite.
    pub fn is_finite(&self) -> bool {
        self.rows.iter().flatten().all(|value| value.is_finite())
    }

    /// Determines whether the matrix is symmetric up to `tolerance`, scaled by the
    /// magnitude of the compared entries.
    pub fn is_symmetric(&self, tolerance: T) -> bool {
        for row in 0..QUATERNION_DIM {
            for column in (row + 1)..QUATERNION_DIM {
                let a = self.rows[row][column];
                let b = self.rows[column][row];
                let scale = T::one().max(a.abs()).max(b.abs());
                if (a - b).abs() > tolerance * scale {
                    return false;
                }
            }
        }
        true
    }
}

impl<T> Covariance<T>
where
    T: RealField + Copy,
{
    /// Copies the entries into an [`nalgebra`] matrix.
    pub fn to_matrix(&self) -> Matrix4<T> {
        Matrix4::from_fn(|row, column| self.rows[row][column])
    }

    /// Determines whether the (symmetric) matrix is positive definite by attempting
    /// a Cholesky decomposition.
    pub fn is_positive_definite(&self) -> bool {
        Self::has_positive_cholesky_factor(self.to_matrix())
    }

    /// Determines whether the (symmetric) matrix is positive semi-definite.
    ///
    /// The diagonal is relaxed by `tolerance` times the largest diagonal magnitude
    /// (or by `tolerance` for an all-zero diagonal) before decomposing, so that
    /// singular but valid matrices such as the zero matrix are accepted.
    pub fn is_positive_semi_definite(&self, tolerance: T) -> bool {
        let matrix = self.to_matrix();
        let largest = matrix.diagonal().amax();
        let scale = if largest > T::one() { largest } else { T::one() };
        Self::has_positive_cholesky_factor(
            matrix + Matrix4::from_diagonal_element(tolerance * scale),
        )
    }

    /// Calculates the determinant.
    pub fn determinant(&self) -> T {
        self.to_matrix().determinant()
    }

    /// Determines whether the (symmetric) matrix can be inverted reliably.
    ///
    /// The matrix must be positive definite, and `|det A| / ∏ aᵢᵢ` must be at least
    /// `tolerance`. The ratio lies in `(0, 1]` and does not change when the matrix is
    /// scaled, so small but well-conditioned matrices are accepted.
    pub fn is_well_conditioned(&self, tolerance: T) -> bool {
        let matrix = self.to_matrix();
        if !Self::has_positive_cholesky_factor(matrix) {
            return false;
        }

        let ratio = matrix.determinant() / matrix.diagonal().product();
        ratio >= tolerance
    }

    fn has_positive_cholesky_factor(matrix: Matrix4<T>) -> bool {
        matrix.cholesky().map_or(false, |cholesky| {
            cholesky
                .l()
                .diagonal()
                .iter()
                .all(|&value| value > T::zero())
        })
    }
}

impl<T> Add<Covariance<T>> for Covariance<T>
where
    T: Copy + Add<T, Output = T>,
{
    type Output = Covariance<T>;

    fn add(self, rhs: Covariance<T>) -> Self::Output {
        let mut rows = self.rows;
        for (row, rhs_row) in rows.iter_mut().zip(rhs.rows.iter()) {
            for (value, rhs_value) in row.iter_mut().zip(rhs_row.iter()) {
                *value = *value + *rhs_value;
            }
        }
        Self { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_and_diagonal() {
        let m = Covariance::<f64>::from_scalar(0.5);
        assert_eq!(m.get_at(0, 0), 0.5);
        assert_eq!(m.get_at(3, 3), 0.5);
        assert_eq!(m.get_at(0, 3), 0.0);
        assert_eq!(Covariance::<f64>::identity(), Covariance::from_diagonal([1.0; 4]));
    }

    #[test]
    fn test_determinant() {
        assert_relative_eq!(Covariance::<f64>::from_diagonal([1.0, 2.0, 3.0, 4.0]).determinant(), 24.0);
        assert_eq!(Covariance::<f64>::zeros().determinant(), 0.0);

        let m = Covariance::<f64>::from_rows([
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, 1.0],
            [0.0, 0.0, 1.0, 2.0],
        ]);
        assert_relative_eq!(m.determinant(), -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_definiteness() {
        assert!(Covariance::<f64>::identity().is_positive_definite());
        assert!(!Covariance::<f64>::zeros().is_positive_definite());
        assert!(Covariance::<f64>::zeros().is_positive_semi_definite(1e-12));
        assert!(!Covariance::<f64>::from_diagonal([1.0, 1.0, -1.0, 1.0]).is_positive_semi_definite(1e-12));

        // Symmetric, but with a negative eigenvalue.
        let indefinite = Covariance::<f64>::from_rows([
            [1.0, 2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert!(indefinite.is_symmetric(1e-12));
        assert!(!indefinite.is_positive_definite());
        assert!(!indefinite.is_positive_semi_definite(1e-12));
    }

    #[test]
    fn test_conditioning_is_scale_invariant() {
        for scale in [1e-6, 1e-4, 1.0, 1e4] {
            assert!(Covariance::<f64>::from_scalar(scale).is_well_conditioned(1e-12));
            assert!(Covariance::<f64>::from_diagonal([scale, 2.0 * scale, 0.5 * scale, scale])
                .is_well_conditioned(1e-12));
        }
        assert!(Covariance::<f32>::from_scalar(1e-3).is_well_conditioned(1e-6));

        // Nearly perfectly correlated components.
        let c = 1.0 - 1e-15;
        let correlated = Covariance::<f64>::from_rows([
            [1.0, c, 0.0, 0.0],
            [c, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert!(correlated.is_positive_definite());
        assert!(!correlated.is_well_conditioned(1e-12));

        assert!(!Covariance::<f64>::zeros().is_well_conditioned(1e-12));
        let mut nan = Covariance::<f64>::identity();
        nan.set_at(2, 2, f64::NAN);
        assert!(!nan.is_well_conditioned(1e-12));
    }

    #[test]
    fn test_symmetry() {
        let mut m = Covariance::<f64>::identity();
        m.set_at(0, 1, 0.2);
        assert!(!m.is_symmetric(1e-9));
        m.set_at(1, 0, 0.2);
        assert!(m.is_symmetric(1e-9));
    }

    #[test]
    fn test_add() {
        let sum = Covariance::<f64>::identity() + Covariance::from_scalar(2.0);
        assert_eq!(sum, Covariance::from_scalar(3.0));
    }
}
