use std::f64::consts::PI;

use tracing::debug;

use crate::config::KernelConfig;
use crate::error::{GeometryError, Result};
use crate::frame::Frame3d;
use crate::integrals::polygon_n4023;
use crate::math::{angle_between_deg, points_coincide, Point3, Vector3, LENGTH_PRECISION};
use crate::panel3::{near_polygon_edge, point_doublet, point_source, Influence};
use crate::vortex::ring_induced_velocity;

/// Chordwise position of the bound vortex, as a fraction of the panel chord.
pub const VORTEX_POSITION: f64 = 0.25;

/// Chordwise position of the control point, as a fraction of the panel chord.
pub const CONTROL_POSITION: f64 = 0.75;

/// Distance below which two corners count as one for the collocation point.
const CORNER_MERGE_DISTANCE: f64 = 1.0e-3;

/// A quadrilateral panel of a lifting surface.
///
/// The corners are the leading and trailing nodes of the left side `A` and
/// of the right side `B`, stored in ring order `[LA, TA, TB, LB]`:
///
/// ```text
///  LA ---- LB
///   |      |     | freestream
///   |      |     v
///  TA ---- TB
/// ```
///
/// The normal is `(TB - LA) × (LB - TA)`. The local frame has its origin at
/// the collocation point, its y-axis towards the middle of side `B` and its
/// z-axis along the normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel4 {
    nodes: [Point3; 4],
    frame: Frame3d,
    area: f64,
    max_size: f64,
    vortex_a: Point3,
    vortex_b: Point3,
    control_point: Point3,
    null: bool,
}

impl Panel4 {
    /// Creates a panel from its leading and trailing corners.
    ///
    /// A panel with no area is null and induces nothing. Coincident corners
    /// are allowed, so triangular panels can be built from a collapsed side.
    #[must_use]
    pub fn new(la: Point3, lb: Point3, ta: Point3, tb: Point3) -> Self {
        let nodes = [la, ta, tb, lb];
        let cross = (tb - la).cross(&(lb - ta));
        let area = cross.norm() / 2.0;

        let mut sum = la.coords;
        let mut count = 1.0;
        for (prev, next) in [(&la, &lb), (&lb, &tb), (&tb, &ta)] {
            if !points_coincide(prev, next, CORNER_MERGE_DISTANCE) {
                sum += next.coords;
                count += 1.0;
            }
        }
        let collocation = Point3::from(sum / count);

        let lerp = |p: &Point3, q: &Point3, t: f64| p + (q - p) * t;
        let vortex_a = lerp(&la, &ta, VORTEX_POSITION);
        let vortex_b = lerp(&lb, &tb, VORTEX_POSITION);
        let control_point = nalgebra::center(
            &lerp(&la, &ta, CONTROL_POSITION),
            &lerp(&lb, &tb, CONTROL_POSITION),
        );

        let side_b = nalgebra::center(&lb, &tb) - collocation;
        let trailing = nalgebra::center(&tb, &ta) - collocation;
        let max_size = side_b.norm().max(trailing.norm());

        let normal = if area > 0.0 { cross / (2.0 * area) } else { Vector3::zeros() };
        let frame = Frame3d::new(collocation, side_b.cross(&normal), normal);

        let tiny = LENGTH_PRECISION * LENGTH_PRECISION;
        let null = area < tiny || side_b.norm() < LENGTH_PRECISION;
        if null {
            debug!(area, "null quad panel");
        }

        Self {
            nodes,
            frame,
            area: if null { 0.0 } else { area },
            max_size,
            vortex_a,
            vortex_b,
            control_point,
            null,
        }
    }

    /// Creates a panel, rejecting null geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the panel is null.
    pub fn try_new(la: Point3, lb: Point3, ta: Point3, tb: Point3) -> Result<Self> {
        let panel = Self::new(la, lb, ta, tb);
        if panel.null {
            return Err(GeometryError::Degenerate("null quad panel".into()).into());
        }
        Ok(panel)
    }

    /// Returns the corners in ring order `[LA, TA, TB, LB]`.
    #[must_use]
    pub fn nodes(&self) -> &[Point3; 4] {
        &self.nodes
    }

    /// Returns corner `i` in ring order, modulo 4.
    #[must_use]
    pub fn node(&self, i: usize) -> &Point3 {
        &self.nodes[i % 4]
    }

    #[must_use]
    pub fn la(&self) -> &Point3 {
        &self.nodes[0]
    }

    #[must_use]
    pub fn ta(&self) -> &Point3 {
        &self.nodes[1]
    }

    #[must_use]
    pub fn tb(&self) -> &Point3 {
        &self.nodes[2]
    }

    #[must_use]
    pub fn lb(&self) -> &Point3 {
        &self.nodes[3]
    }

    /// Returns the average of the distinct corners.
    #[must_use]
    pub fn collocation_point(&self) -> &Point3 {
        self.frame.origin()
    }

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

    /// Returns the larger distance from the collocation point to the middle
    /// of side `B` or of the trailing edge.
    #[must_use]
    pub fn max_size(&self) -> f64 {
        self.max_size
    }

    /// Returns the left end of the bound vortex, at ¼ chord on side `A`.
    #[must_use]
    pub fn vortex_a(&self) -> &Point3 {
        &self.vortex_a
    }

    /// Returns the right end of the bound vortex, at ¼ chord on side `B`.
    #[must_use]
    pub fn vortex_b(&self) -> &Point3 {
        &self.vortex_b
    }

    /// Returns the control point, at ¾ chord in the middle of the span.
    #[must_use]
    pub fn control_point(&self) -> &Point3 {
        &self.control_point
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Returns the warp angle in degrees.
    ///
    /// Each diagonal splits the panel into two triangles; the warp is the
    /// smaller of the two angles between the triangle normals. Panels with a
    /// collapsed corner have no warp.
    #[must_use]
    pub fn warp_angle(&self) -> f64 {
        let [n0, n1, n2, n3] = self.nodes;
        let normal = |a: &Point3, b: &Point3, c: &Point3| (b - a).cross(&(c - a));
        let halves = [
            (normal(&n0, &n1, &n2), normal(&n0, &n2, &n3)),
            (normal(&n0, &n1, &n3), normal(&n1, &n2, &n3)),
        ];
        let tiny = LENGTH_PRECISION * LENGTH_PRECISION;
        if halves.iter().any(|(u, v)| u.norm() < tiny || v.norm() < tiny) {
            return 0.0;
        }
        halves
            .iter()
            .map(|(u, v)| angle_between_deg(u, v))
            .fold(f64::INFINITY, f64::min)
    }

    /// Returns the smallest interior angle in degrees.
    #[must_use]
    pub fn min_angle(&self) -> f64 {
        (0..4)
            .map(|i| {
                let corner = &self.nodes[i];
                let prev = &self.nodes[(i + 3) % 4];
                let next = &self.nodes[(i + 1) % 4];
                angle_between_deg(&(prev - corner), &(next - corner))
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Returns `true` if `pt` lies within `core_radius` of a side, between
    /// its end points.
    #[must_use]
    pub fn is_edge_point(&self, pt: &Point3, core_radius: f64) -> bool {
        near_polygon_edge(&self.nodes, pt, core_radius)
    }

    /// Returns `true` if `pt` is beyond the far-field distance of the panel.
    #[must_use]
    pub fn is_far_field(&self, pt: &Point3, config: &KernelConfig) -> bool {
        (pt - self.frame.origin()).norm() > config.far_field_factor * self.max_size
    }

    /// Returns the influence of a unit uniform source, switching to the
    /// point-source approximation in the far field.
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
            return point_source(self.frame.origin(), self.area, pt);
        }
        self.source_n4023(pt, self_influence, config.core_radius)
    }

    /// Returns the influence of a unit uniform doublet, switching to the
    /// point-doublet approximation in the far field.
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
            return point_doublet(self.frame.origin(), self.frame.k(), self.area, pt);
        }
        self.doublet_n4023(pt, self_influence, config.core_radius)
    }

    /// Source influence from the NASA CR-4023 closed form.
    ///
    /// With `self_influence` the velocity is the exterior limit `2π·n`.
    #[must_use]
    pub fn source_n4023(&self, pt: &Point3, self_influence: bool, core_radius: f64) -> Influence {
        if self.null {
            return Influence::default();
        }
        let sums = polygon_n4023(&self.nodes, &self.frame, pt, core_radius, true);
        let velocity = if self_influence {
            self.frame.k() * (2.0 * PI)
        } else {
            sums.source_velocity
        };
        Influence {
            potential: sums.source_potential,
            velocity,
        }
    }

    /// Uniform doublet influence from the NASA CR-4023 closed form.
    ///
    /// With `self_influence` the potential is `2π`, the limit on the side
    /// opposite the normal.
    #[must_use]
    pub fn doublet_n4023(&self, pt: &Point3, self_influence: bool, core_radius: f64) -> Influence {
        if self.null {
            return Influence::default();
        }
        let sums = polygon_n4023(&self.nodes, &self.frame, pt, core_radius, true);
        Influence {
            potential: if self_influence { 2.0 * PI } else { sums.doublet_potential },
            velocity: sums.doublet_velocity,
        }
    }

    /// Velocity induced by a vortex ring of unit circulation along the four
    /// sides, with the configured core model.
    ///
    /// The ring is equivalent to a uniform doublet of strength `1/(4π)`.
    #[must_use]
    pub fn vortex_ring_velocity(&self, pt: &Point3, config: &KernelConfig) -> Vector3 {
        if self.null {
            return Vector3::zeros();
        }
        ring_induced_velocity(&self.nodes, pt, config.core_radius, config.vortex_model)
    }
}
