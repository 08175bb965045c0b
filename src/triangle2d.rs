use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::{rotate_2d, Matrix3, Point2, Vector2, LENGTH_PRECISION};

/// Tolerance on barycentric coordinates used by point classification.
pub const BARYCENTRIC_PRECISION: f64 = 1.0e-4;

/// Circumradius-to-shortest-edge ratio above which a triangle is skinny.
pub const QUALITY_BOUND: f64 = std::f64::consts::SQRT_2;

/// Position of a point relative to a triangle.
///
/// Vertex and edge indices follow the triangle's convention: edge `i` is
/// the edge opposite vertex `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPosition {
    Inside,
    OnVertex(usize),
    OnEdge(usize),
    Outside,
}

/// A straight segment between two points in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2d {
    start: Point2,
    end: Point2,
}

impl Segment2d {
    /// Creates a segment from its endpoints.
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Returns the start point.
    #[must_use]
    pub fn start(&self) -> &Point2 {
        &self.start
    }

    /// Returns the end point.
    #[must_use]
    pub fn end(&self) -> &Point2 {
        &self.end
    }

    /// Returns the segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Returns the midpoint.
    #[must_use]
    pub fn midpoint(&self) -> Point2 {
        Point2::from((self.start.coords + self.end.coords) * 0.5)
    }

    /// Returns `true` if both segments join the same points, in either direction.
    #[must_use]
    pub fn is_same(&self, other: &Segment2d, precision: f64) -> bool {
        let same = |a: &Point2, b: &Point2| (a - b).norm() < precision;
        (same(&self.start, &other.start) && same(&self.end, &other.end))
            || (same(&self.start, &other.end) && same(&self.end, &other.start))
    }

    /// Returns `true` if `pt` lies within `precision` of the segment,
    /// between its endpoints.
    #[must_use]
    pub fn is_on_segment(&self, pt: &Point2, precision: f64) -> bool {
        let s = self.end - self.start;
        let l = s.norm();
        if l < LENGTH_PRECISION {
            return (pt - self.start).norm() < precision;
        }
        let d0 = pt - self.start;
        let d1 = pt - self.end;
        let proj = s.dot(&d0) / l;
        let h = d0 - s * (proj / l);
        if h.norm() > precision {
            return false;
        }
        d0.dot(&s) >= 0.0 && d1.dot(&s) <= 0.0
    }
}

/// A triangle in the plane with cached barycentric transform.
///
/// Vertex order is significant: the signed area is positive for
/// counter-clockwise vertices. Any mutation goes through a method that
/// rebuilds the cached quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle2d {
    vertices: [Point2; 3],
    edges: [Segment2d; 3],
    centroid: Point2,
    signed_area: f64,
    angles: [f64; 3],
    gmat: Matrix3,
    null: bool,
}

impl Triangle2d {
    /// Creates a triangle from three vertices.
    ///
    /// A triangle with an edge shorter than [`LENGTH_PRECISION`], or with an
    /// area below its square, is null: its area is zero and its barycentric
    /// transform maps every point to zero.
    #[must_use]
    pub fn new(s0: Point2, s1: Point2, s2: Point2) -> Self {
        let vertices = [s0, s1, s2];
        let edges = [
            Segment2d::new(s1, s2),
            Segment2d::new(s2, s0),
            Segment2d::new(s0, s1),
        ];
        let centroid = Point2::from((s0.coords + s1.coords + s2.coords) / 3.0);

        let mut triangle = Self {
            vertices,
            edges,
            centroid,
            signed_area: 0.0,
            angles: [0.0; 3],
            gmat: Matrix3::zeros(),
            null: true,
        };

        let s01 = s1 - s0;
        let s02 = s2 - s0;
        let s12 = s2 - s1;
        if s01.norm() < LENGTH_PRECISION
            || s02.norm() < LENGTH_PRECISION
            || s12.norm() < LENGTH_PRECISION
        {
            debug!("null triangle: edge below length precision");
            return triangle;
        }

        let a0 = (s01.dot(&s02) / s01.norm() / s02.norm())
            .clamp(-1.0, 1.0)
            .acos()
            .to_degrees();
        let a1 = (-s01.dot(&s12) / s01.norm() / s12.norm())
            .clamp(-1.0, 1.0)
            .acos()
            .to_degrees();
        triangle.angles = [a0, a1, 180.0 - a0 - a1];

        let signed_area = (s01.x * s02.y - s01.y * s02.x) / 2.0;
        if signed_area.abs() < LENGTH_PRECISION * LENGTH_PRECISION {
            debug!(signed_area, "null triangle: collinear vertices");
            return triangle;
        }

        let m = Matrix3::new(1.0, s0.x, s0.y, 1.0, s1.x, s1.y, 1.0, s2.x, s2.y);
        if let Some(gmat) = m.transpose().try_inverse() {
            triangle.gmat = gmat;
            triangle.signed_area = signed_area;
            triangle.null = false;
        }
        triangle
    }

    /// Creates a triangle, rejecting null geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the triangle is null.
    pub fn try_new(s0: Point2, s1: Point2, s2: Point2) -> Result<Self> {
        let triangle = Self::new(s0, s1, s2);
        if triangle.null {
            return Err(GeometryError::Degenerate("null triangle".into()).into());
        }
        Ok(triangle)
    }

    /// Returns vertex `i`, modulo 3.
    #[must_use]
    pub fn vertex(&self, i: usize) -> &Point2 {
        &self.vertices[i % 3]
    }

    /// Returns the three vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point2; 3] {
        &self.vertices
    }

    /// Returns edge `i`, modulo 3, which is opposite vertex `i`.
    #[must_use]
    pub fn edge(&self, i: usize) -> &Segment2d {
        &self.edges[i % 3]
    }

    /// Returns the vertex opposite edge `edge`, modulo 3.
    #[must_use]
    pub fn opposite_vertex_of(&self, edge: usize) -> &Point2 {
        &self.vertices[edge % 3]
    }

    /// Returns the centroid.
    #[must_use]
    pub fn centroid(&self) -> &Point2 {
        &self.centroid
    }

    /// Returns the signed area, positive for counter-clockwise vertices.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        self.signed_area
    }

    /// Returns the interior angles at each vertex, in degrees.
    #[must_use]
    pub fn angles(&self) -> &[f64; 3] {
        &self.angles
    }

    /// Returns `true` if the triangle is degenerate.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Returns the matrix mapping `(1, x, y)` to barycentric coordinates.
    ///
    /// Row `i` holds the coefficients of the linear basis function that is 1
    /// at vertex `i` and 0 at the other two.
    #[must_use]
    pub fn gmat(&self) -> &Matrix3 {
        &self.gmat
    }

    /// Returns the barycentric coordinates `(g0, g1, g2)` of a point.
    #[must_use]
    pub fn barycentric_coords(&self, pt: &Point2) -> [f64; 3] {
        let g = self.gmat * nalgebra::Vector3::new(1.0, pt.x, pt.y);
        [g.x, g.y, g.z]
    }

    /// Returns the point with barycentric coordinates `g`.
    #[must_use]
    pub fn point_at(&self, g: &[f64; 3]) -> Point2 {
        Point2::from(
            self.vertices[0].coords * g[0]
                + self.vertices[1].coords * g[1]
                + self.vertices[2].coords * g[2],
        )
    }

    /// Classifies a point as inside, on a vertex, on an edge or outside.
    #[must_use]
    pub fn point_position(&self, pt: &Point2) -> PointPosition {
        let g = self.barycentric_coords(pt);
        let strictly_between = |v: f64| v > BARYCENTRIC_PRECISION && v < 1.0 - BARYCENTRIC_PRECISION;
        let zero = |v: f64| v.abs() < BARYCENTRIC_PRECISION;
        let one = |v: f64| (v - 1.0).abs() < BARYCENTRIC_PRECISION;

        if g.iter().all(|&v| strictly_between(v)) {
            return PointPosition::Inside;
        }
        for i in 0..3 {
            if one(g[i]) && zero(g[(i + 1) % 3]) && zero(g[(i + 2) % 3]) {
                return PointPosition::OnVertex(i);
            }
        }
        if let Some(i) = g.iter().position(|&v| zero(v)) {
            return PointPosition::OnEdge(i);
        }
        PointPosition::Outside
    }

    /// Returns `true` if the point is inside, edges and vertices included.
    #[must_use]
    pub fn is_inside(&self, pt: &Point2) -> bool {
        self.barycentric_coords(pt)
            .iter()
            .all(|&v| (0.0..=1.0).contains(&v))
    }

    /// Returns `true` if the point is inside, away from edges and vertices.
    #[must_use]
    pub fn is_strictly_inside(&self, pt: &Point2) -> bool {
        self.point_position(pt) == PointPosition::Inside
    }

    /// Containment test with a [`LENGTH_PRECISION`] band on the barycentric
    /// coordinates, widened when `edges_inside` and narrowed otherwise.
    #[must_use]
    pub fn contains(&self, pt: &Point2, edges_inside: bool) -> bool {
        let band = if edges_inside {
            -LENGTH_PRECISION
        } else {
            LENGTH_PRECISION
        };
        self.barycentric_coords(pt)
            .iter()
            .all(|&v| band < v && v < 1.0 - band)
    }

    /// Returns the index of the first edge the point lies on.
    #[must_use]
    pub fn is_on_edge(&self, pt: &Point2, precision: f64) -> Option<usize> {
        self.edges
            .iter()
            .position(|edge| edge.is_on_segment(pt, precision))
    }

    /// Returns `true` if the point lies strictly inside the circumcircle.
    ///
    /// The determinant sign is corrected by the winding, so both vertex
    /// orders give the same answer.
    #[must_use]
    pub fn has_in_circum_circle(&self, pt: &Point2) -> bool {
        let [s0, s1, s2] = self.vertices;
        let ccw = (s1.x - s0.x) * (s2.y - s0.y) - (s2.x - s0.x) * (s1.y - s0.y) > 0.0;
        let (ax, ay) = (s0.x - pt.x, s0.y - pt.y);
        let (bx, by) = (s1.x - pt.x, s1.y - pt.y);
        let (cx, cy) = (s2.x - pt.x, s2.y - pt.y);
        let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
            - (bx * bx + by * by) * (ax * cy - cx * ay)
            + (cx * cx + cy * cy) * (ax * by - bx * ay);
        if ccw {
            det > 0.0
        } else {
            det < 0.0
        }
    }

    /// Returns the circumcenter and circumradius, or `None` if the vertices
    /// are aligned horizontally.
    #[must_use]
    pub fn circum_center(&self) -> Option<(Point2, f64)> {
        let [a, b, c] = self.vertices;
        let dy1 = (a.y - b.y).abs();
        let dy2 = (b.y - c.y).abs();
        if dy1 < LENGTH_PRECISION && dy2 < LENGTH_PRECISION {
            return None;
        }

        let (xc, yc) = if dy1 < LENGTH_PRECISION {
            let m2 = -(c.x - b.x) / (c.y - b.y);
            let xc = (b.x + a.x) / 2.0;
            (xc, m2 * (xc - (b.x + c.x) / 2.0) + (b.y + c.y) / 2.0)
        } else if dy2 < LENGTH_PRECISION {
            let m1 = -(b.x - a.x) / (b.y - a.y);
            let xc = (c.x + b.x) / 2.0;
            (xc, m1 * (xc - (a.x + b.x) / 2.0) + (a.y + b.y) / 2.0)
        } else {
            let m1 = -(b.x - a.x) / (b.y - a.y);
            let m2 = -(c.x - b.x) / (c.y - b.y);
            let (mx1, my1) = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            let (mx2, my2) = ((b.x + c.x) / 2.0, (b.y + c.y) / 2.0);
            if (m1 - m2).abs() < f64::EPSILON {
                return None;
            }
            let xc = (m1 * mx1 - m2 * mx2 + my2 - my1) / (m1 - m2);
            let yc = if dy1 > dy2 {
                m1 * (xc - mx1) + my1
            } else {
                m2 * (xc - mx2) + my2
            };
            (xc, yc)
        };

        let center = Point2::new(xc, yc);
        Some((center, (b - center).norm()))
    }

    /// Returns the circumradius-to-shortest-edge ratio.
    ///
    /// Null triangles return infinity.
    #[must_use]
    pub fn quality_factor(&self) -> f64 {
        if self.null {
            return f64::INFINITY;
        }
        let a = self.edges[0].length();
        let b = self.edges[1].length();
        let c = self.edges[2].length();
        let r = a * b * c / ((a + b + c) * (b + c - a) * (c + a - b) * (a + b - c)).sqrt();
        r / self.min_edge_length()
    }

    /// Returns `true` if the quality factor exceeds √2.
    #[must_use]
    pub fn is_skinny(&self) -> bool {
        self.quality_factor() > QUALITY_BOUND
    }

    /// Returns `true` if any edge is longer than `size`.
    #[must_use]
    pub fn is_long(&self, size: f64) -> bool {
        self.edges.iter().any(|e| e.length() > size)
    }

    /// Returns the length of the shortest edge.
    #[must_use]
    pub fn min_edge_length(&self) -> f64 {
        self.edges
            .iter()
            .map(Segment2d::length)
            .fold(f64::INFINITY, f64::min)
    }

    /// Returns the length of the longest edge.
    #[must_use]
    pub fn max_edge_length(&self) -> f64 {
        self.edges.iter().map(Segment2d::length).fold(0.0, f64::max)
    }

    /// Returns the index and length of the longest edge.
    #[must_use]
    pub fn longest_edge(&self) -> (usize, f64) {
        let mut best = (0, self.edges[0].length());
        for (i, edge) in self.edges.iter().enumerate().skip(1) {
            let l = edge.length();
            if l > best.1 {
                best = (i, l);
            }
        }
        best
    }

    /// Returns `true` if `vtx` is one of the vertices.
    #[must_use]
    pub fn has_vertex(&self, vtx: &Point2) -> bool {
        self.vertex_index(vtx).is_some()
    }

    /// Returns the index of the vertex at `vtx`.
    #[must_use]
    pub fn vertex_index(&self, vtx: &Point2) -> Option<usize> {
        self.vertices
            .iter()
            .position(|v| (v - vtx).norm() < LENGTH_PRECISION)
    }

    /// Returns the index of the edge joining `v0` and `v1`, in either order.
    #[must_use]
    pub fn is_edge(&self, v0: &Point2, v1: &Point2) -> Option<usize> {
        let i0 = self.vertex_index(v0)?;
        let i1 = self.vertex_index(v1)?;
        if i0 == i1 {
            return None;
        }
        Some(3 - i0 - i1)
    }

    /// Returns the index of the edge matching `seg` within `precision`.
    #[must_use]
    pub fn edge_index(&self, seg: &Segment2d, precision: f64) -> Option<usize> {
        self.edges.iter().position(|e| e.is_same(seg, precision))
    }

    /// Returns `true` if the two triangles share an edge.
    #[must_use]
    pub fn has_common_edge(&self, other: &Triangle2d) -> bool {
        self.common_edge(other).is_some()
    }

    /// Returns the index of the shared edge in `self` and in `other`.
    #[must_use]
    pub fn common_edge(&self, other: &Triangle2d) -> Option<(usize, usize)> {
        (0..3).find_map(|k| {
            let e = other.edge(k);
            self.is_edge(e.start(), e.end()).map(|i| (i, k))
        })
    }

    /// Splits the triangle in two at the midpoint of edge `edge`.
    #[must_use]
    pub fn split_edge(&self, edge: usize) -> [Triangle2d; 2] {
        let mid = self.edge(edge).midpoint();
        let [s0, s1, s2] = self.vertices;
        match edge % 3 {
            0 => [Self::new(s1, s0, mid), Self::new(s2, s0, mid)],
            1 => [Self::new(s0, s1, mid), Self::new(s2, s1, mid)],
            _ => [Self::new(s0, s2, mid), Self::new(s1, s2, mid)],
        }
    }

    /// Splits the triangle in four at its edge midpoints.
    #[must_use]
    pub fn split_at_edge_midpoints(&self) -> [Triangle2d; 4] {
        let m0 = self.edges[0].midpoint();
        let m1 = self.edges[1].midpoint();
        let m2 = self.edges[2].midpoint();
        let [s0, s1, s2] = self.vertices;
        [
            Self::new(m0, s2, m1),
            Self::new(m1, s0, m2),
            Self::new(m2, s1, m0),
            Self::new(m0, m1, m2),
        ]
    }

    /// Splits the triangle in three at its centroid.
    #[must_use]
    pub fn split_at_centroid(&self) -> [Triangle2d; 3] {
        let g = self.centroid;
        let [s0, s1, s2] = self.vertices;
        [
            Self::new(s0, g, s1),
            Self::new(s1, g, s2),
            Self::new(s2, g, s0),
        ]
    }

    /// Scales the vertex coordinates about the origin.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        let [s0, s1, s2] = self.vertices.map(|v| Point2::new(v.x * sx, v.y * sy));
        *self = Self::new(s0, s1, s2);
    }

    /// Translates the triangle.
    pub fn translate(&mut self, t: &Vector2) {
        let [s0, s1, s2] = self.vertices.map(|v| v + t);
        *self = Self::new(s0, s1, s2);
    }

    /// Rotates the triangle about `center` by `angle` degrees.
    pub fn rotate(&mut self, center: &Point2, angle: f64) {
        let rad = angle.to_radians();
        let [s0, s1, s2] = self
            .vertices
            .map(|v| center + rotate_2d(&(v - center), rad));
        *self = Self::new(s0, s1, s2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn sample() -> Triangle2d {
        Triangle2d::new(
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
        )
    }

    #[test]
    fn edges_are_opposite_their_vertex() {
        let t = sample();
        for i in 0..3 {
            let e = t.edge(i);
            let opposite = t.opposite_vertex_of(i);
            assert!((e.start() - opposite).norm() > LENGTH_PRECISION);
            assert!((e.end() - opposite).norm() > LENGTH_PRECISION);
        }
        assert_eq!(t.opposite_vertex_of(4), t.vertex(1));
    }

    #[test]
    fn area_and_angles() {
        let t = sample();
        assert!(!t.is_null());
        assert_abs_diff_eq!(t.signed_area(), 0.5, epsilon = 1e-15);
        let a = t.angles();
        assert_abs_diff_eq!(a[0], 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a[1], 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a[2], 45.0, epsilon = 1e-9);

        let cw = Triangle2d::new(*t.vertex(0), *t.vertex(2), *t.vertex(1));
        assert_abs_diff_eq!(cw.signed_area(), -0.5, epsilon = 1e-15);
    }

    #[test]
    fn degenerate_triangles_are_null() {
        let p = Point2::new(0.0, 0.0);
        let short = Triangle2d::new(p, Point2::new(1e-8, 0.0), Point2::new(0.0, 1.0));
        assert!(short.is_null());
        let flat = Triangle2d::new(p, Point2::new(1.0, 0.0), Point2::new(2.0, 0.0));
        assert!(flat.is_null());
        assert_abs_diff_eq!(flat.signed_area(), 0.0);
        assert!(Triangle2d::try_new(p, Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)).is_err());
        assert!(flat.quality_factor().is_infinite());
        assert!(flat.barycentric_coords(&Point2::new(0.3, 0.1)).iter().all(|g| g.is_finite()));
    }

    #[test]
    fn inclusive_inside_test() {
        let t = sample();
        for (x, y) in [(1.4, 0.8), (1.99, 0.995), (1.01, 0.995), (1.01, 0.015)] {
            assert!(t.is_inside(&Point2::new(x, y)), "({x}, {y})");
        }
        for (x, y) in [
            (0.0, 0.0),
            (1.4, 0.0),
            (1.4, 1.2),
            (0.8, 0.5),
            (2.2, 0.5),
            (1.01, 1.005),
        ] {
            assert!(!t.is_inside(&Point2::new(x, y)), "({x}, {y})");
        }
    }

    #[test]
    fn points_on_edges() {
        let t = sample();
        let prec = LENGTH_PRECISION;
        assert_eq!(t.is_on_edge(&Point2::new(1.6, 1.0), prec), Some(2));
        assert_eq!(t.is_on_edge(&Point2::new(1.6, 0.6), prec), Some(1));
        assert_eq!(t.is_on_edge(&Point2::new(1.0, 0.7), prec), Some(0));
        assert_eq!(t.is_on_edge(&Point2::new(1.6, 1.1), prec), None);
        assert_eq!(t.is_on_edge(&Point2::new(1.6, 0.9), prec), None);
        assert_eq!(t.is_on_edge(&Point2::new(2.5, 1.0), prec), None);
    }

    #[test]
    fn point_position_classification() {
        let t = sample();
        assert_eq!(t.point_position(&Point2::new(1.4, 0.8)), PointPosition::Inside);
        assert_eq!(t.point_position(&Point2::new(1.0, 1.0)), PointPosition::OnVertex(1));
        assert_eq!(t.point_position(&Point2::new(1.0, 0.0)), PointPosition::OnVertex(2));
        assert_eq!(t.point_position(&Point2::new(1.6, 1.0)), PointPosition::OnEdge(2));
        assert_eq!(t.point_position(&Point2::new(1.0, 0.4)), PointPosition::OnEdge(0));
        assert_eq!(t.point_position(&Point2::new(3.0, 3.0)), PointPosition::Outside);

        assert!(t.is_strictly_inside(&Point2::new(1.4, 0.8)));
        assert!(!t.is_strictly_inside(&Point2::new(1.6, 1.0)));
        assert!(t.contains(&Point2::new(1.6, 1.0), true));
    }

    #[test]
    fn contains_with_and_without_edges() {
        let t = sample();
        let on_edge = Point2::new(1.0, 0.5);
        assert!(t.contains(&on_edge, true));
        assert!(!t.contains(&on_edge, false));
        assert!(t.contains(&Point2::new(1.4, 0.8), false));
    }

    #[test]
    fn circumcircle_of_right_triangle() {
        let t = sample();
        let (center, r) = t.circum_center().unwrap();
        assert_abs_diff_eq!(center, Point2::new(1.5, 0.5), epsilon = 1e-12);
        assert_abs_diff_eq!(r, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert!(t.has_in_circum_circle(&Point2::new(1.5, 0.6)));
        assert!(!t.has_in_circum_circle(&Point2::new(3.0, 0.5)));

        let flat = Triangle2d::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        );
        assert!(flat.circum_center().is_none());
    }

    #[test]
    fn quality_of_equilateral_and_sliver() {
        let eq = Triangle2d::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.75_f64.sqrt()),
        );
        assert_abs_diff_eq!(eq.quality_factor(), 1.0 / 3.0_f64.sqrt(), epsilon = 1e-12);
        assert!(!eq.is_skinny());

        let sliver = Triangle2d::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.05),
        );
        assert!(sliver.is_skinny());
    }

    #[test]
    fn edge_lookup() {
        let t = sample();
        assert_eq!(t.is_edge(&Point2::new(1.0, 1.0), &Point2::new(2.0, 1.0)), Some(2));
        assert_eq!(t.is_edge(&Point2::new(1.0, 0.0), &Point2::new(1.0, 1.0)), Some(0));
        assert_eq!(t.is_edge(&Point2::new(1.0, 0.0), &Point2::new(5.0, 1.0)), None);
        let seg = Segment2d::new(Point2::new(2.0, 1.0), Point2::new(1.0, 0.0));
        assert_eq!(t.edge_index(&seg, 1e-6), Some(1));
        assert!(t.has_vertex(&Point2::new(1.0, 0.0)));
        assert!(!t.has_vertex(&Point2::new(0.0, 0.0)));
    }

    #[test]
    fn neighbours_share_an_edge() {
        let t = sample();
        let n = Triangle2d::new(
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        );
        assert_eq!(t.common_edge(&n), Some((1, 2)));
        let far = Triangle2d::new(
            Point2::new(5.0, 5.0),
            Point2::new(6.0, 5.0),
            Point2::new(5.0, 6.0),
        );
        assert!(!t.has_common_edge(&far));
    }

    #[test]
    fn splits_preserve_area() {
        let t = sample();
        let area = t.signed_area().abs();
        for e in 0..3 {
            let halves = t.split_edge(e);
            let sum: f64 = halves.iter().map(|h| h.signed_area().abs()).sum();
            assert_abs_diff_eq!(sum, area, epsilon = 1e-14);
        }
        let quarters = t.split_at_edge_midpoints();
        for q in &quarters {
            assert_abs_diff_eq!(q.signed_area().abs(), area / 4.0, epsilon = 1e-14);
        }
        let thirds = t.split_at_centroid();
        for s in &thirds {
            assert_abs_diff_eq!(s.signed_area().abs(), area / 3.0, epsilon = 1e-14);
            assert!(s.has_vertex(t.centroid()));
        }
    }

    #[test]
    fn longest_and_shortest_edges() {
        let t = sample();
        let (i, l) = t.longest_edge();
        assert_eq!(i, 1);
        assert_abs_diff_eq!(l, 2.0_f64.sqrt(), epsilon = 1e-15);
        assert_abs_diff_eq!(t.max_edge_length(), l);
        assert_abs_diff_eq!(t.min_edge_length(), 1.0, epsilon = 1e-15);
        assert!(t.is_long(1.2));
        assert!(!t.is_long(1.5));
    }

    #[test]
    fn transforms_rebuild_barycentric_map() {
        let mut t = sample();
        t.translate(&Vector2::new(10.0, -3.0));
        let g = t.barycentric_coords(&Point2::new(12.0, -2.0));
        assert_abs_diff_eq!(g[0], 1.0, epsilon = 1e-12);

        t.scale(2.0, 2.0);
        assert_abs_diff_eq!(t.signed_area(), 2.0, epsilon = 1e-12);
        let g = t.barycentric_coords(&Point2::new(24.0, -4.0));
        assert_abs_diff_eq!(g[0], 1.0, epsilon = 1e-12);

        let c = *t.centroid();
        t.rotate(&c, 90.0);
        assert_abs_diff_eq!(t.signed_area(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(*t.centroid(), c, epsilon = 1e-12);
        let g = t.barycentric_coords(t.vertex(1));
        assert_abs_diff_eq!(g[1], 1.0, epsilon = 1e-12);
    }

    fn well_shaped(t: &Triangle2d) -> bool {
        !t.is_null() && t.signed_area().abs() > 0.05 && t.angles().iter().all(|&a| a > 5.0)
    }

    proptest! {
        #[test]
        fn barycentric_round_trip(
            x0 in -10.0..10.0f64, y0 in -10.0..10.0f64,
            x1 in -10.0..10.0f64, y1 in -10.0..10.0f64,
            x2 in -10.0..10.0f64, y2 in -10.0..10.0f64,
            px in -20.0..20.0f64, py in -20.0..20.0f64,
        ) {
            let t = Triangle2d::new(Point2::new(x0, y0), Point2::new(x1, y1), Point2::new(x2, y2));
            prop_assume!(well_shaped(&t));
            let p = Point2::new(px, py);
            let g = t.barycentric_coords(&p);
            prop_assert!((g[0] + g[1] + g[2] - 1.0).abs() < 1e-9);
            let back = t.point_at(&g);
            prop_assert!((back - p).norm() < 1e-8);
        }

        #[test]
        fn in_circle_ignores_winding(
            x0 in -10.0..10.0f64, y0 in -10.0..10.0f64,
            x1 in -10.0..10.0f64, y1 in -10.0..10.0f64,
            x2 in -10.0..10.0f64, y2 in -10.0..10.0f64,
            px in -20.0..20.0f64, py in -20.0..20.0f64,
        ) {
            let (a, b, c) = (Point2::new(x0, y0), Point2::new(x1, y1), Point2::new(x2, y2));
            let ccw = Triangle2d::new(a, b, c);
            prop_assume!(well_shaped(&ccw));
            let p = Point2::new(px, py);
            if let Some((center, r)) = ccw.circum_center() {
                prop_assume!(((p - center).norm() - r).abs() > 1e-6);
            }
            let cw = Triangle2d::new(a, c, b);
            prop_assert_eq!(ccw.has_in_circum_circle(&p), cw.has_in_circum_circle(&p));
        }
    }
}
