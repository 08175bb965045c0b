use std::f64::consts::PI;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix, used for barycentric transforms.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Tolerance for floating-point comparisons of derived quantities.
pub const TOLERANCE: f64 = 1e-10;

/// Minimum length of a panel edge. Shorter edges make the panel null.
pub const LENGTH_PRECISION: f64 = 1.0e-6;

/// Normal distance below which a field point is considered to lie in the panel's plane.
pub const INPLANE_PRECISION: f64 = 1.0e-8;

/// Minimum interior angle, in degrees, of a usable triangle.
pub const ANGLE_PRECISION: f64 = 1.0e-3;

/// `1/(2π)`.
pub const FRAC_1_2PI: f64 = 0.5 / PI;

/// `1/(4π)`.
pub const FRAC_1_4PI: f64 = 0.25 / PI;

/// Returns `-1.0` for negative values and `1.0` otherwise.
///
/// Unlike [`f64::signum`], a signed zero maps to `1.0`.
#[must_use]
pub fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Rotates a 2D vector counter-clockwise by `angle` radians.
#[must_use]
pub fn rotate_2d(v: &Vector2, angle: f64) -> Vector2 {
    let (s, c) = angle.sin_cos();
    Vector2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Returns the angle in degrees between two vectors, 0 if either is zero-length.
#[must_use]
pub fn angle_between_deg(a: &Vector3, b: &Vector3) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < TOLERANCE {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Returns `true` if two 3D points are closer than `tolerance`.
#[must_use]
pub fn points_coincide(a: &Point3, b: &Point3, tolerance: f64) -> bool {
    (a - b).norm() < tolerance
}
