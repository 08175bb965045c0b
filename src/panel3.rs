use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul};

use tracing::{debug, trace};

use crate::config::KernelConfig;
use crate::error::{GeometryError, Result};
use crate::frame::Frame3d;
use crate::integrals::{nintcheu_fata, polygon_n4023};
use crate::math::{
    angle_between_deg, Point2, Point3, Vector3, ANGLE_PRECISION, INPLANE_PRECISION,
    LENGTH_PRECISION,
};
use crate::quadrature::TriangleQuadrature;
use crate::triangle2d::Triangle2d;
use crate::vortex::ring_induced_velocity;

/// Quadrature order of the first moments of the basis functions.
const MOMENT_ORDER: usize = 5;

/// Distance, relative to the panel size, below which a projected field point
/// is considered to sit on a vertex.
const VERTEX_BAND: f64 = 1.0e-8;

/// Relative outward shift of a field point sitting on a vertex.
const VERTEX_SHIFT: f64 = 1.0e-7;

/// Height, relative to the panel size, at which in-plane points are evaluated
/// by the closed-form integrals.
const INPLANE_LIFT: f64 = 1.0e-6;

/// Potential and velocity induced at a field point by a unit-strength
/// distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Influence {
    pub potential: f64,
    pub velocity: Vector3,
}

impl Add for Influence {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            potential: self.potential + rhs.potential,
            velocity: self.velocity + rhs.velocity,
        }
    }
}

impl AddAssign for Influence {
    fn add_assign(&mut self, rhs: Self) {
        self.potential += rhs.potential;
        self.velocity += rhs.velocity;
    }
}

impl Mul<f64> for Influence {
    type Output = Self;

    fn mul(self, strength: f64) -> Self {
        Self {
            potential: self.potential * strength,
            velocity: self.velocity * strength,
        }
    }
}

/// Influences of the three linear doublet basis functions of a triangle.
///
/// Entry `i` belongs to the basis function equal to 1 at vertex `i`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BasisInfluence {
    pub potential: [f64; 3],
    pub velocity: [Vector3; 3],
}

impl BasisInfluence {
    /// Returns the influence of a linear doublet with nodal strengths `mu`.
    #[must_use]
    pub fn combine(&self, mu: &[f64; 3]) -> Influence {
        (0..3).fold(Influence::default(), |acc, i| {
            acc + Influence {
                potential: self.potential[i],
                velocity: self.velocity[i],
            } * mu[i]
        })
    }

    /// Returns the influence of a uniform unit doublet.
    #[must_use]
    pub fn total(&self) -> Influence {
        self.combine(&[1.0; 3])
    }
}

/// A flat triangular panel carrying source and doublet distributions.
///
/// Edge `i` is the edge opposite vertex `i`: `(S1, S2)`, `(S2, S0)`,
/// `(S0, S1)`. The local frame has its origin at the centroid, its x-axis
/// along `S0 → S1` and its z-axis along the normal `(S1 - S0) × (S2 - S0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel3 {
    vertices: [Point3; 3],
    local: [Point3; 3],
    footprint: Triangle2d,
    frame: Frame3d,
    area: f64,
    max_size: f64,
    x_moments: [f64; 3],
    y_moments: [f64; 3],
    null: bool,
}

impl Panel3 {
    /// Creates a panel from three vertices.
    ///
    /// A panel with an edge shorter than [`LENGTH_PRECISION`] or an interior
    /// angle below [`ANGLE_PRECISION`] is null: it has no area and induces
    /// nothing.
    #[must_use]
    pub fn new(s0: Point3, s1: Point3, s2: Point3) -> Self {
        let vertices = [s0, s1, s2];
        let centroid = Point3::from((s0.coords + s1.coords + s2.coords) / 3.0);
        let e1 = s1 - s0;
        let e2 = s2 - s0;
        let frame = Frame3d::new(centroid, e1, e1.cross(&e2));
        let local = vertices.map(|v| {
            let p = frame.to_local_point(&v);
            Point3::new(p.x, p.y, 0.0)
        });
        let footprint = Triangle2d::new(local[0].xy(), local[1].xy(), local[2].xy());
        let max_size = (0..3).map(|i| edge_vector(&vertices, i).norm()).fold(0.0, f64::max);

        let mut panel = Self {
            vertices,
            local,
            footprint,
            frame,
            area: 0.0,
            max_size,
            x_moments: [0.0; 3],
            y_moments: [0.0; 3],
            null: true,
        };

        if (0..3).any(|i| edge_vector(&vertices, i).norm() < LENGTH_PRECISION) {
            debug!("null panel: edge below length precision");
            return panel;
        }
        let a0 = angle_between_deg(&e1, &e2);
        let a1 = angle_between_deg(&(s0 - s1), &(s2 - s1));
        if a0.min(a1).min(180.0 - a0 - a1) < ANGLE_PRECISION || panel.footprint.is_null() {
            debug!(a0, a1, "null panel: flat triangle");
            return panel;
        }

        let rule = TriangleQuadrature::new(MOMENT_ORDER);
        for node in rule.nodes(&panel.local, 0) {
            let b = panel.footprint.barycentric_coords(&node.point.xy());
            for i in 0..3 {
                panel.x_moments[i] += node.weight * node.point.x * b[i];
                panel.y_moments[i] += node.weight * node.point.y * b[i];
            }
        }
        panel.area = e1.cross(&e2).norm() / 2.0;
        panel.null = false;
        panel
    }

    /// Creates a panel, rejecting null geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the panel is null.
    pub fn try_new(s0: Point3, s1: Point3, s2: Point3) -> Result<Self> {
        let panel = Self::new(s0, s1, s2);
        if panel.null {
            return Err(GeometryError::Degenerate("null triangular panel".into()).into());
        }
        Ok(panel)
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3; 3] {
        &self.vertices
    }

    /// Returns vertex `i`, modulo 3.
    #[must_use]
    pub fn vertex(&self, i: usize) -> &Point3 {
        &self.vertices[i % 3]
    }

    /// Returns the end points of edge `i`, modulo 3.
    #[must_use]
    pub fn edge(&self, i: usize) -> (Point3, Point3) {
        let i = i % 3;
        (self.vertices[(i + 1) % 3], self.vertices[(i + 2) % 3])
    }

    #[must_use]
    pub fn centroid(&self) -> &Point3 {
        self.frame.origin()
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        self.frame.k()
    }

    #[must_use]
    pub fn frame(&self) -> &Frame3d {
        &self.frame
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Returns the signed area of the local footprint, positive unless null.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        self.footprint.signed_area()
    }

    /// Returns the length of the longest edge.
    #[must_use]
    pub fn max_size(&self) -> f64 {
        self.max_size
    }

    /// Returns the vertices in the local frame, all with `z = 0`.
    #[must_use]
    pub fn local_vertices(&self) -> &[Point3; 3] {
        &self.local
    }

    /// Returns the triangle formed by the local vertices.
    #[must_use]
    pub fn footprint(&self) -> &Triangle2d {
        &self.footprint
    }

    /// Returns `∫ x·b_i` over the panel, in the local frame.
    #[must_use]
    pub fn x_moments(&self) -> &[f64; 3] {
        &self.x_moments
    }

    /// Returns `∫ y·b_i` over the panel, in the local frame.
    #[must_use]
    pub fn y_moments(&self) -> &[f64; 3] {
        &self.y_moments
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Returns the interior angles in degrees.
    #[must_use]
    pub fn angles(&self) -> &[f64; 3] {
        self.footprint.angles()
    }

    #[must_use]
    pub fn min_angle(&self) -> f64 {
        self.angles().iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Returns the circumradius-to-shortest-edge ratio.
    #[must_use]
    pub fn quality_factor(&self) -> f64 {
        self.footprint.quality_factor()
    }

    #[must_use]
    pub fn is_low_quality(&self) -> bool {
        self.footprint.is_skinny()
    }

    #[must_use]
    pub fn min_edge_length(&self) -> f64 {
        (0..3).map(|i| edge_vector(&self.vertices, i).norm()).fold(f64::INFINITY, f64::min)
    }

    /// Returns the value at a local point of the basis function attached to
    /// vertex `index`, modulo 3.
    #[must_use]
    pub fn basis(&self, local: &Point2, index: usize) -> f64 {
        self.footprint.barycentric_coords(local)[index % 3]
    }

    /// Returns the barycentric coordinates of the projection of a global point.
    #[must_use]
    pub fn barycentric(&self, pt: &Point3) -> [f64; 3] {
        self.footprint.barycentric_coords(&self.frame.to_local_point(pt).xy())
    }

    /// Returns the global point with barycentric coordinates `g`.
    #[must_use]
    pub fn point_at(&self, g: &[f64; 3]) -> Point3 {
        Point3::from(
            self.vertices[0].coords * g[0]
                + self.vertices[1].coords * g[1]
                + self.vertices[2].coords * g[2],
        )
    }

    /// Returns `true` if `pt` lies within `core_radius` of an edge, between
    /// its end points.
    #[must_use]
    pub fn is_edge_point(&self, pt: &Point3, core_radius: f64) -> bool {
        near_polygon_edge(&self.vertices, pt, core_radius)
    }

    /// Returns `true` if `pt` is beyond the far-field distance of the panel.
    #[must_use]
    pub fn is_far_field(&self, pt: &Point3, config: &KernelConfig) -> bool {
        (pt - self.frame.origin()).norm() > config.far_field_factor * self.max_size
    }

    /// Returns the influence of a unit uniform source.
    ///
    /// Far-field points use the point-source approximation, other points the
    /// Nintcheu Fata closed form, or the NASA CR-4023 closed form when the
    /// former is disabled.
    #[must_use]
    pub fn source_influence(
        &self,
        pt: &Point3,
        self_influence: bool,
        config: &KernelConfig,
    ) -> Influence {
        if self.null {
            return Influence::default();
        }
        if !self_influence && self.is_far_field(pt, config) {
            return self.source_far_field(pt);
        }
        if config.use_nintcheu_fata {
            self.source_nf(pt, self_influence)
        } else {
            self.source_n4023(pt, self_influence, config.core_radius)
        }
    }

    /// Returns the influence of a unit uniform doublet.
    #[must_use]
    pub fn doublet_influence(
        &self,
        pt: &Point3,
        self_influence: bool,
        config: &KernelConfig,
    ) -> Influence {
        if self.null {
            return Influence::default();
        }
        if !self_influence && self.is_far_field(pt, config) {
            return self.doublet_far_field(pt);
        }
        self.doublet_n4023(pt, self_influence, config.core_radius)
    }

    /// Returns the influences of the three linear doublet basis functions.
    #[must_use]
    pub fn doublet_basis_influence(
        &self,
        pt: &Point3,
        self_influence: bool,
        config: &KernelConfig,
    ) -> BasisInfluence {
        if self.null {
            return BasisInfluence::default();
        }
        if !self_influence && self.is_far_field(pt, config) {
            return self.doublet_basis_far_field(pt);
        }
        self.doublet_basis(pt, self_influence, config)
    }

    /// Source influence from the NASA CR-4023 closed form.
    ///
    /// In the panel plane the normal velocity is zero. With `self_influence`
    /// the velocity is the exterior limit `2π·n`.
    #[must_use]
    pub fn source_n4023(&self, pt: &Point3, self_influence: bool, core_radius: f64) -> Influence {
        if self.null {
            return Influence::default();
        }
        let sums = polygon_n4023(&self.vertices, &self.frame, pt, core_radius, false);
        let n = self.frame.k();
        let pn = (pt - self.frame.origin()).dot(n);

        let mut velocity = sums.source_velocity;
        if self_influence {
            velocity = n * (2.0 * PI);
        } else if pn.abs() < INPLANE_PRECISION {
            velocity -= n * velocity.dot(n);
        }
        Influence {
            potential: sums.source_potential,
            velocity,
        }
    }

    /// Source influence from the Nintcheu Fata closed-form integrals.
    ///
    /// With `self_influence` the velocity is the exterior limit `2π·n`.
    #[must_use]
    pub fn source_nf(&self, pt: &Point3, self_influence: bool) -> Influence {
        if self.null {
            return Influence::default();
        }
        let local = self.frame.to_local_point(pt);
        let p = self.regularize(&local);
        let g = nintcheu_fata(&self.local, &p);

        let mut v = Vector3::new(
            p.x * g.g3[0] - g.g3[1],
            p.y * g.g3[0] - g.g3[2],
            p.z * g.g3[0],
        );
        if self_influence {
            v = Vector3::new(0.0, 0.0, 2.0 * PI);
        } else if local.z.abs() < INPLANE_PRECISION {
            v.z = 0.0;
        }
        Influence {
            potential: -g.g1[0],
            velocity: self.frame.to_global_vector(&v),
        }
    }

    /// Source influence by Gaussian quadrature.
    ///
    /// Only accurate for field points at some distance from the panel.
    #[must_use]
    pub fn source_quadrature(&self, pt: &Point3, config: &KernelConfig) -> Influence {
        if self.null {
            return Influence::default();
        }
        let p = self.frame.to_local_point(pt);
        let rule = TriangleQuadrature::new(config.quadrature_order);

        let mut potential = 0.0;
        let mut v = Vector3::zeros();
        for node in rule.nodes(&self.local, config.quadrature_subdivision) {
            let r: Vector3 = p - node.point;
            let d = r.norm();
            potential -= node.weight / d;
            v += r * (node.weight / (d * d * d));
        }
        Influence {
            potential,
            velocity: self.frame.to_global_vector(&v),
        }
    }

    /// Point-source approximation of the source influence.
    #[must_use]
    pub fn source_far_field(&self, pt: &Point3) -> Influence {
        if self.null {
            return Influence::default();
        }
        point_source(self.frame.origin(), self.area, pt)
    }

    /// Uniform doublet influence from the NASA CR-4023 closed form.
    ///
    /// The potential is zero in the panel plane, and `2π` on the panel itself
    /// with `self_influence`, i.e. the limit on the side opposite the normal.
    #[must_use]
    pub fn doublet_n4023(&self, pt: &Point3, self_influence: bool, core_radius: f64) -> Influence {
        if self.null {
            return Influence::default();
        }
        let sums = polygon_n4023(&self.vertices, &self.frame, pt, core_radius, false);
        let pn = (pt - self.frame.origin()).dot(self.frame.k());
        let potential = if self_influence {
            2.0 * PI
        } else if pn.abs() < INPLANE_PRECISION {
            0.0
        } else {
            sums.doublet_potential
        };
        Influence {
            potential,
            velocity: sums.doublet_velocity,
        }
    }

    /// Velocity of a uniform unit doublet computed as the equivalent vortex
    /// ring along the three edges, with the configured core model.
    #[must_use]
    pub fn doublet_vortex_velocity(&self, pt: &Point3, config: &KernelConfig) -> Vector3 {
        if self.null {
            return Vector3::zeros();
        }
        let ring = ring_induced_velocity(&self.vertices, pt, config.core_radius, config.vortex_model);
        ring * (4.0 * PI)
    }

    /// Point-doublet approximation of the uniform doublet influence.
    #[must_use]
    pub fn doublet_far_field(&self, pt: &Point3) -> Influence {
        if self.null {
            return Influence::default();
        }
        point_doublet(self.frame.origin(), self.frame.k(), self.area, pt)
    }

    /// Returns the basis function influences, from the closed-form integrals
    /// or from quadrature when those are disabled.
    ///
    /// In-plane points always use the closed form. Their potential is zero,
    /// except with `self_influence` where it is `2π·b_i` at the field point.
    #[must_use]
    pub fn doublet_basis(
        &self,
        pt: &Point3,
        self_influence: bool,
        config: &KernelConfig,
    ) -> BasisInfluence {
        if self.null {
            return BasisInfluence::default();
        }
        let local = self.frame.to_local_point(pt);
        let in_plane = local.z.abs() < INPLANE_PRECISION;

        let mut out = if config.use_nintcheu_fata || in_plane {
            self.doublet_basis_nf(&local)
        } else {
            self.doublet_basis_quadrature(pt, config)
        };
        if self_influence {
            out.potential = self
                .footprint
                .barycentric_coords(&local.xy())
                .map(|b| 2.0 * PI * b);
        } else if in_plane {
            out.potential = [0.0; 3];
        }
        out
    }

    /// Basis function influences by Gaussian quadrature.
    #[must_use]
    pub fn doublet_basis_quadrature(&self, pt: &Point3, config: &KernelConfig) -> BasisInfluence {
        if self.null {
            return BasisInfluence::default();
        }
        let p = self.frame.to_local_point(pt);
        let rule = TriangleQuadrature::new(config.quadrature_order);

        let mut potential = [0.0; 3];
        let mut velocity = [Vector3::zeros(); 3];
        for node in rule.nodes(&self.local, config.quadrature_subdivision) {
            let b = self.footprint.barycentric_coords(&node.point.xy());
            let r: Vector3 = p - node.point;
            let d2 = r.norm_squared();
            let r3 = d2 * d2.sqrt();
            let r5 = r3 * d2;
            let kernel = Vector3::new(
                3.0 * r.x * p.z / r5,
                3.0 * r.y * p.z / r5,
                -1.0 / r3 + 3.0 * p.z * p.z / r5,
            );
            for i in 0..3 {
                potential[i] -= b[i] * p.z / r3 * node.weight;
                velocity[i] += kernel * (b[i] * node.weight);
            }
        }
        BasisInfluence {
            potential,
            velocity: velocity.map(|v| self.frame.to_global_vector(&v)),
        }
    }

    /// Far-field expansion of the basis function influences, to first order
    /// in the panel size.
    #[must_use]
    pub fn doublet_basis_far_field(&self, pt: &Point3) -> BasisInfluence {
        if self.null {
            return BasisInfluence::default();
        }
        let p = self.frame.to_local_point(pt);
        let r2 = p.coords.norm_squared();
        if r2 < LENGTH_PRECISION * LENGTH_PRECISION {
            return BasisInfluence::default();
        }
        let r3 = r2 * r2.sqrt();
        let r5 = r3 * r2;
        let third = self.area / 3.0;

        let mut out = BasisInfluence::default();
        for i in 0..3 {
            let (bx, by) = (self.x_moments[i], self.y_moments[i]);
            let pm = p.x * bx + p.y * by;
            out.potential[i] = -p.z / r3 * (third + 3.0 * pm / r2);
            let v = Vector3::new(
                3.0 * p.z / r5 * (p.x * third - bx + 5.0 * p.x * pm / r2),
                3.0 * p.z / r5 * (p.y * third - by + 5.0 * p.y * pm / r2),
                -(third + 3.0 * pm / r2) / r3 + 3.0 * p.z * p.z / r5 * (third + 5.0 * pm / r2),
            );
            out.velocity[i] = self.frame.to_global_vector(&v);
        }
        out
    }

    fn doublet_basis_nf(&self, local: &Point3) -> BasisInfluence {
        let p = self.regularize(local);
        let g = nintcheu_fata(&self.local, &p);
        let gmat = self.footprint.gmat();

        let j03 = gmat * Vector3::new(g.g3[0], g.g3[1], g.g3[2]);
        let j05 = gmat * Vector3::new(g.g5[0], g.g5[1], g.g5[2]);
        let jx5 = gmat * Vector3::new(g.g5[1], g.g5[3], g.g5[4]);
        let jy5 = gmat * Vector3::new(g.g5[2], g.g5[4], g.g5[5]);

        let mut out = BasisInfluence::default();
        for i in 0..3 {
            out.potential[i] = -p.z * j03[i];
            let v = Vector3::new(
                3.0 * p.z * (p.x * j05[i] - jx5[i]),
                3.0 * p.z * (p.y * j05[i] - jy5[i]),
                -j03[i] + 3.0 * p.z * p.z * j05[i],
            );
            out.velocity[i] = self.frame.to_global_vector(&v);
        }
        out
    }

    /// Moves a local field point to where the closed-form integrals are
    /// regular: off the panel plane and off the vertices.
    fn regularize(&self, local: &Point3) -> Point3 {
        let mut p = *local;
        if p.z.abs() < INPLANE_PRECISION {
            p.z = INPLANE_LIFT * self.max_size;
        }
        let band = VERTEX_BAND * self.max_size;
        if let Some(s) = self.local.iter().find(|s| (p.x - s.x).hypot(p.y - s.y) < band) {
            trace!(x = p.x, y = p.y, "field point projects onto a vertex");
            p.x = s.x * (1.0 + VERTEX_SHIFT);
            p.y = s.y * (1.0 + VERTEX_SHIFT);
        }
        p
    }
}

/// Returns the vector along edge `i` of a triangle, from `S(i+1)` to `S(i+2)`.
fn edge_vector(vertices: &[Point3; 3], i: usize) -> Vector3 {
    vertices[(i + 2) % 3] - vertices[(i + 1) % 3]
}

/// Point-source approximation of a flat panel of area `area` centered at `origin`.
/// Zero at the centre itself, as for [`point_doublet`].
pub(crate) fn point_source(origin: &Point3, area: f64, pt: &Point3) -> Influence {
    let r: Vector3 = pt - origin;
    let d = r.norm();
    if d < LENGTH_PRECISION {
        return Influence::default();
    }
    Influence {
        potential: -area / d,
        velocity: r * (area / (d * d * d)),
    }
}

/// Point-doublet approximation of a flat panel of area `area` centered at `origin`.
pub(crate) fn point_doublet(
    origin: &Point3,
    normal: &Vector3,
    area: f64,
    pt: &Point3,
) -> Influence {
    let r: Vector3 = pt - origin;
    let d2 = r.norm_squared();
    if d2 < LENGTH_PRECISION * LENGTH_PRECISION {
        return Influence::default();
    }
    let d3 = d2 * d2.sqrt();
    let pn = r.dot(normal);
    Influence {
        potential: -pn * area / d3,
        velocity: (r * (3.0 * pn) - normal * d2) * (area / (d3 * d2)),
    }
}

/// Returns `true` if `pt` lies within `core_radius` of a side of the closed
/// polygon `nodes`, between the side's end points.
pub(crate) fn near_polygon_edge(nodes: &[Point3], pt: &Point3, core_radius: f64) -> bool {
    (0..nodes.len()).any(|i| {
        let a = &nodes[i];
        let b = &nodes[(i + 1) % nodes.len()];
        let r0: Vector3 = pt - a;
        let r1: Vector3 = pt - b;
        let e: Vector3 = b - a;
        let len = e.norm();
        len > 0.0 && r0.dot(&r1) <= 0.0 && r0.cross(&e).norm() / len < core_radius
    })
}
