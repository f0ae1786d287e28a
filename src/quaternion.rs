use crate::impl_standard_traits;
use core::ops::{Add, Mul, Neg, Sub};
use num_traits::Float;
use uniform_array_derive::UniformArray;

/// A quaternion in scalar-first `(w, x, y, z)` order, i.e. `(q₀, q₁, q₂, q₃)`.
///
/// Orientations are represented by unit quaternions; `q` and `-q` describe the
/// same rotation. The filter does not force unit norm between steps, so values
/// obtained from an estimator may deviate slightly from it.
#[derive(UniformArray)]
#[cfg_attr(test, ensure_uniform_type::ensure_uniform_type)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Quaternion<T> {
    /// The scalar part.
    pub w: T,
    /// The first vector component.
    pub x: T,
    /// The second vector component.
    pub y: T,
    /// The third vector component.
    pub z: T,
}

impl<T> Quaternion<T> {
    /// Initializes a new [`Quaternion`] instance.
    #[inline(always)]
    pub const fn new(w: T, x: T, y: T, z: T) -> Self {
        Self { w, x, y, z }
    }

    /// Returns the identity rotation `(1, 0, 0, 0)`.
    #[inline]
    pub fn identity() -> Self
    where
        T: Float,
    {
        Self::new(T::one(), T::zero(), T::zero(), T::zero())
    }

    /// Calculates the four-dimensional inner product.
    #[inline]
    pub fn dot(&self, rhs: &Self) -> T
    where
        T: Copy + Mul<T, Output = T> + Add<T, Output = T>,
    {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Calculates the squared norm.
    #[inline]
    pub fn norm_sq(&self) -> T
    where
        T: Copy + Mul<T, Output = T> + Add<T, Output = T>,
    {
        self.dot(self)
    }

    /// Calculates the norm.
    #[inline]
    pub fn norm(&self) -> T
    where
        T: Float,
    {
        Float::sqrt(self.norm_sq())
    }

    /// Returns a unit-norm version of the quaternion.
    ///
    /// A zero quaternion has no direction and is returned unchanged.
    pub fn normalized(&self) -> Self
    where
        T: Float,
    {
        let norm = self.norm();
        if norm == T::zero() {
            return *self;
        }

        Self::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm)
    }

    /// Returns the representative of this rotation that lies in the same
    /// hemisphere as `reference`, i.e. `self` or `-self`.
    #[inline]
    pub fn aligned_with(&self, reference: &Self) -> Self
    where
        T: Float,
    {
        if self.dot(reference) < T::zero() {
            -*self
        } else {
            *self
        }
    }
}

impl<T> Neg for Quaternion<T>
where
    T: Neg<Output = T>,
{
    type Output = Quaternion<T>;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }
}

impl<T> Sub<Quaternion<T>> for Quaternion<T>
where
    T: Sub<T, Output = T>,
{
    type Output = Quaternion<T>;

    #[inline]
    fn sub(self, rhs: Quaternion<T>) -> Self::Output {
        Self::new(
            self.w - rhs.w,
            self.x - rhs.x,
            self.y - rhs.y,
            self.z - rhs.z,
        )
    }
}

impl<T> PartialEq for Quaternion<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.w == other.w && self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl_standard_traits!(Quaternion, T, w, x, y, z);
