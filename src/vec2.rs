//! Plane vector primitive used for positions, velocities and directions.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Magnitudes below this threshold are treated as zero everywhere in the
/// model: normalization yields the zero vector and divisions clamp the
/// denominator instead of blowing up.
pub const EPS: f64 = 1e-10;

/// Immutable 2D vector value type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at the given angle from the positive x-axis (radians).
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    /// Unit vector in the same direction, or the zero vector if the magnitude
    /// is below [`EPS`].
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < EPS { Self::ZERO } else { self / mag }
    }

    /// Rotate counterclockwise by an angle in radians.
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Projection of this vector onto `other` (zero if `other` is degenerate).
    pub fn project_onto(self, other: Self) -> Self {
        let mag_squared = other.magnitude_squared();
        if mag_squared < EPS {
            return Self::ZERO;
        }
        other * (self.dot(other) / mag_squared)
    }

    /// Reflection about a unit normal: `v - n * (2 v·n)`.
    pub fn reflect(self, normal: Self) -> Self {
        self - normal * (2.0 * self.dot(normal))
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;

    /// Scalar division with the denominator clamped to [`EPS`].
    fn div(self, scalar: f64) -> Self {
        let scalar = if scalar.abs() < EPS {
            EPS.copysign(scalar)
        } else {
            scalar
        };
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
