use crate::math::{Point2, Point3, Vector2, Vector3};

/// A right-handed orthonormal frame in the plane.
///
/// Local coordinates of a point `P` are `((P - origin)·i, (P - origin)·j)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame2d {
    origin: Point2,
    i: Vector2,
    j: Vector2,
}

impl Default for Frame2d {
    fn default() -> Self {
        Self {
            origin: Point2::origin(),
            i: Vector2::x(),
            j: Vector2::y(),
        }
    }
}

impl Frame2d {
    /// Creates a frame from an origin and an x-axis direction.
    ///
    /// The y-axis is the x-axis rotated by +90°. A zero-length axis yields
    /// the global axes translated to `origin`.
    #[must_use]
    pub fn new(origin: Point2, x_axis: Vector2) -> Self {
        let len = x_axis.norm();
        if len <= 0.0 {
            return Self {
                origin,
                ..Self::default()
            };
        }
        let i = x_axis / len;
        Self {
            origin,
            i,
            j: Vector2::new(-i.y, i.x),
        }
    }

    /// Returns the frame origin.
    #[must_use]
    pub fn origin(&self) -> &Point2 {
        &self.origin
    }

    /// Returns the local x-axis.
    #[must_use]
    pub fn i(&self) -> &Vector2 {
        &self.i
    }

    /// Returns the local y-axis.
    #[must_use]
    pub fn j(&self) -> &Vector2 {
        &self.j
    }

    /// Expresses a global point in local coordinates.
    #[must_use]
    pub fn to_local_point(&self, p: &Point2) -> Point2 {
        let v = p - self.origin;
        Point2::new(v.dot(&self.i), v.dot(&self.j))
    }

    /// Expresses a global vector in local coordinates.
    #[must_use]
    pub fn to_local_vector(&self, v: &Vector2) -> Vector2 {
        Vector2::new(v.dot(&self.i), v.dot(&self.j))
    }

    /// Expresses a local point in global coordinates.
    #[must_use]
    pub fn to_global_point(&self, p: &Point2) -> Point2 {
        self.origin + self.i * p.x + self.j * p.y
    }

    /// Expresses a local vector in global coordinates.
    #[must_use]
    pub fn to_global_vector(&self, v: &Vector2) -> Vector2 {
        self.i * v.x + self.j * v.y
    }
}

/// A right-handed orthonormal frame in space.
///
/// Panels use `i` and `j` as the in-plane axes and `k` as the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame3d {
    origin: Point3,
    i: Vector3,
    j: Vector3,
    k: Vector3,
}

impl Default for Frame3d {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            i: Vector3::x(),
            j: Vector3::y(),
            k: Vector3::z(),
        }
    }
}

impl Frame3d {
    /// Creates a frame from an origin, an x-axis and a normal.
    ///
    /// The x-axis is re-orthogonalized against the normal and `j = k × i`.
    /// Degenerate axes yield the global axes translated to `origin`.
    #[must_use]
    pub fn new(origin: Point3, x_axis: Vector3, normal: Vector3) -> Self {
        let k_len = normal.norm();
        if k_len <= 0.0 {
            return Self {
                origin,
                ..Self::default()
            };
        }
        let k = normal / k_len;
        let i = x_axis - k * x_axis.dot(&k);
        let i_len = i.norm();
        if i_len <= 0.0 {
            return Self {
                origin,
                ..Self::default()
            };
        }
        let i = i / i_len;
        Self {
            origin,
            i,
            j: k.cross(&i),
            k,
        }
    }

    /// Returns the frame origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the local x-axis.
    #[must_use]
    pub fn i(&self) -> &Vector3 {
        &self.i
    }

    /// Returns the local y-axis.
    #[must_use]
    pub fn j(&self) -> &Vector3 {
        &self.j
    }

    /// Returns the local z-axis (the panel normal).
    #[must_use]
    pub fn k(&self) -> &Vector3 {
        &self.k
    }

    /// Expresses a global point in local coordinates.
    #[must_use]
    pub fn to_local_point(&self, p: &Point3) -> Point3 {
        let v = p - self.origin;
        Point3::new(v.dot(&self.i), v.dot(&self.j), v.dot(&self.k))
    }

    /// Expresses a global vector in local coordinates.
    #[must_use]
    pub fn to_local_vector(&self, v: &Vector3) -> Vector3 {
        Vector3::new(v.dot(&self.i), v.dot(&self.j), v.dot(&self.k))
    }

    /// Expresses a local point in global coordinates.
    #[must_use]
    pub fn to_global_point(&self, p: &Point3) -> Point3 {
        self.origin + self.i * p.x + self.j * p.y + self.k * p.z
    }

    /// Expresses a local vector in global coordinates.
    #[must_use]
    pub fn to_global_vector(&self, v: &Vector3) -> Vector3 {
        self.i * v.x + self.j * v.y + self.k * v.z
    }
}
