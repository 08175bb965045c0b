use std::f64::consts::PI;

use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::frame::Frame2d;
use crate::math::{Point2, Vector2, FRAC_1_2PI, FRAC_1_4PI, LENGTH_PRECISION};

/// Normal distance below which a field point is pushed off the panel's line
/// before evaluating the uniform source stream function.
const STREAM_NUDGE_BAND: f64 = 0.001;

/// Angles and log-distances of a local point relative to the panel endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Trig {
    /// Angle from the local y-axis to the vector `A → P`, continuous across the panel line.
    pub beta1: f64,
    /// Angle from the local y-axis to the vector `B → P`, continuous across the panel line.
    pub beta2: f64,
    /// `ln |P - A|`, zero when the point coincides with `A`.
    pub ln_r1: f64,
    /// `ln |P - B|`, zero when the point coincides with `B`.
    pub ln_r2: f64,
}

/// Potential, stream function and velocity of a unit uniform source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceField2d {
    pub potential: f64,
    pub stream: f64,
    pub velocity: Vector2,
}

/// Stream function and velocity per endpoint of a unit linear source.
///
/// Index 0 is the contribution of a unit strength at `A`, index 1 at `B`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearSourceField2d {
    pub stream: [f64; 2],
    pub velocity: [Vector2; 2],
}

/// Constant and linear parts of the linear vortex stream function.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VortexStream {
    pub constant: f64,
    pub linear: f64,
}

/// Velocity derivatives with respect to the vorticity at each endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VortexSensitivities {
    /// `∂V/∂γ` at `A` and `B`, global frame.
    pub dv_dgamma: [Vector2; 2],
    /// `∂²V/∂y∂γ` at `A` and `B`, panel-local frame.
    pub d2v_dy_dgamma: [Vector2; 2],
}

/// Sum and difference stream functions of the linear vortex, scaled by `1/(4π)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct XfoilStream {
    /// Integral of `ln r` over the panel.
    pub psi_plus: f64,
    /// Integral of `ln r` weighted by the antisymmetric linear shape.
    pub psi_minus: f64,
}

/// A flat 2D panel between two endpoints.
///
/// The local frame has its origin at the midpoint and its x-axis running
/// from `A` to `B`, so that `al().x < bl().x` for every non-null panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel2d {
    a: Point2,
    b: Point2,
    midpoint: Point2,
    tangent: Vector2,
    normal: Vector2,
    length: f64,
    angle: f64,
    frame: Frame2d,
    al: Point2,
    bl: Point2,
    trailing_edge: bool,
    null: bool,
}

impl Panel2d {
    /// Creates a panel from its two endpoints.
    #[must_use]
    pub fn new(a: Point2, b: Point2) -> Self {
        Self::build(a, b, false)
    }

    /// Creates a trailing-edge panel, which closes a foil contour.
    #[must_use]
    pub fn new_trailing_edge(a: Point2, b: Point2) -> Self {
        Self::build(a, b, true)
    }

    /// Creates a panel, rejecting endpoints closer than [`LENGTH_PRECISION`].
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for a null panel.
    pub fn try_new(a: Point2, b: Point2) -> Result<Self> {
        let panel = Self::new(a, b);
        if panel.null {
            return Err(GeometryError::Degenerate(format!(
                "panel length {} is below {LENGTH_PRECISION}",
                panel.length
            ))
            .into());
        }
        Ok(panel)
    }

    /// Moves the endpoints and rebuilds the frame.
    pub fn set_endpoints(&mut self, a: Point2, b: Point2) {
        *self = Self::build(a, b, self.trailing_edge);
    }

    fn build(a: Point2, b: Point2, trailing_edge: bool) -> Self {
        let midpoint = Point2::from((a.coords + b.coords) * 0.5);
        let t = a - b;
        let length = t.norm();
        let tangent = if length > 0.0 { t / length } else { t };
        let normal = Vector2::new(-tangent.y, tangent.x);
        let frame = Frame2d::new(midpoint, -tangent);

        let angle = if trailing_edge {
            (-tangent.x).atan2(tangent.y) + PI
        } else {
            (-normal.y).atan2(-normal.x)
        };

        let null = length < LENGTH_PRECISION;
        let (al, bl) = if null {
            debug!(length, "null 2d panel");
            (Point2::origin(), Point2::origin())
        } else {
            (frame.to_local_point(&a), frame.to_local_point(&b))
        };

        Self {
            a,
            b,
            midpoint,
            tangent,
            normal,
            length,
            angle,
            frame,
            al,
            bl,
            trailing_edge,
            null,
        }
    }

    /// Returns the first endpoint.
    #[must_use]
    pub fn a(&self) -> &Point2 {
        &self.a
    }

    /// Returns the second endpoint.
    #[must_use]
    pub fn b(&self) -> &Point2 {
        &self.b
    }

    /// Returns the panel midpoint, the origin of the local frame.
    #[must_use]
    pub fn midpoint(&self) -> &Point2 {
        &self.midpoint
    }

    /// Returns the unit tangent `(A - B)/|A - B|`.
    #[must_use]
    pub fn tangent(&self) -> &Vector2 {
        &self.tangent
    }

    /// Returns the unit normal, the tangent rotated by +90°.
    #[must_use]
    pub fn normal(&self) -> &Vector2 {
        &self.normal
    }

    /// Returns the panel length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Returns the orientation angle of the panel, in radians.
    ///
    /// Trailing-edge panels measure it along the tangent, offset by π;
    /// other panels measure it from the inward normal.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Returns the local x-axis, which is the reversed tangent `B - A` direction.
    #[must_use]
    pub fn local_x_axis(&self) -> Vector2 {
        *self.frame.i()
    }

    /// Returns the local frame.
    #[must_use]
    pub fn frame(&self) -> &Frame2d {
        &self.frame
    }

    /// Returns endpoint `A` in local coordinates, nominally `(-length/2, 0)`.
    #[must_use]
    pub fn al(&self) -> &Point2 {
        &self.al
    }

    /// Returns endpoint `B` in local coordinates, nominally `(+length/2, 0)`.
    #[must_use]
    pub fn bl(&self) -> &Point2 {
        &self.bl
    }

    /// Returns `true` for a trailing-edge panel.
    #[must_use]
    pub fn is_trailing_edge(&self) -> bool {
        self.trailing_edge
    }

    /// Returns `true` if the panel is shorter than [`LENGTH_PRECISION`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Expresses a global point in the local frame.
    #[must_use]
    pub fn to_local_point(&self, p: &Point2) -> Point2 {
        self.frame.to_local_point(p)
    }

    /// Expresses a global vector in the local frame.
    #[must_use]
    pub fn to_local_vector(&self, v: &Vector2) -> Vector2 {
        self.frame.to_local_vector(v)
    }

    /// Expresses a local vector in the global frame.
    #[must_use]
    pub fn to_global_vector(&self, v: &Vector2) -> Vector2 {
        self.frame.to_global_vector(v)
    }

    /// Computes the angles and log-distances of the local point `(x, y)`.
    ///
    /// The angles fold the sign of `y` into the `atan2` arguments so that they
    /// stay continuous across the panel's own line. Within
    /// [`LENGTH_PRECISION`] of the line the upper side is used.
    #[must_use]
    pub fn trig(&self, x: f64, y: f64) -> Trig {
        let x1 = x - self.al.x;
        let x2 = x - self.bl.x;
        let r1 = x1.hypot(y);
        let r2 = x2.hypot(y);

        let sgn = if y.abs() < LENGTH_PRECISION || y > 0.0 {
            1.0
        } else {
            -1.0
        };
        let fold = (0.5 - 0.5 * sgn) * PI;

        let mut trig = Trig::default();
        if r1 > 0.0 {
            trig.ln_r1 = r1.ln();
            trig.beta1 = (sgn * x1).atan2(sgn * y) + fold;
        }
        if r2 > 0.0 {
            trig.ln_r2 = r2.ln();
            trig.beta2 = (sgn * x2).atan2(sgn * y) + fold;
        }
        trig
    }

    /// Evaluates a unit uniform source distribution at a global point.
    ///
    /// At either endpoint the stream function takes the XFoil limit, with the
    /// angles shifted by π/2, and the velocity is zero. Points within 0.001 of
    /// the panel's line are moved to `y = LENGTH_PRECISION` before evaluating,
    /// which keeps the stream function on one side of its branch cut.
    #[must_use]
    pub fn uniform_source(&self, pt: &Point2) -> SourceField2d {
        if self.null {
            return SourceField2d::default();
        }

        let mut pl = self.to_local_point(pt);
        let x1 = pl.x - self.al.x;
        let x2 = pl.x - self.bl.x;

        if (self.a - pt).norm() < LENGTH_PRECISION {
            let ln_r1 = 0.0;
            let theta1 = PI / 2.0;
            let theta2 = PI + PI / 2.0;
            return SourceField2d {
                potential: -2.0 * x2 * ln_r1 * FRAC_1_4PI,
                stream: (x1 * theta1 - x2 * theta2) * FRAC_1_2PI,
                velocity: Vector2::zeros(),
            };
        }
        if (self.b - pt).norm() < LENGTH_PRECISION {
            let ln_r2 = 0.0;
            let theta1 = PI / 2.0;
            let theta2 = PI / 2.0;
            return SourceField2d {
                potential: 2.0 * x1 * ln_r2 * FRAC_1_4PI,
                stream: (x1 * theta1 - x2 * theta2) * FRAC_1_2PI,
                velocity: Vector2::zeros(),
            };
        }

        if pl.y.abs() < STREAM_NUDGE_BAND {
            pl.y = LENGTH_PRECISION;
        }

        let t = self.trig(pl.x, pl.y);
        let theta1 = PI - t.beta1;
        let theta2 = PI - t.beta2;

        let stream =
            (x1 * theta1 - x2 * theta2 + pl.y * (t.ln_r1 - t.ln_r2)) * FRAC_1_2PI;
        let potential =
            (2.0 * (x1 * t.ln_r1 - x2 * t.ln_r2) + 2.0 * pl.y * (theta2 - theta1)) * FRAC_1_4PI;

        let vx = (t.ln_r1 - t.ln_r2) * FRAC_1_2PI;
        let vy = if pl.y.abs() < LENGTH_PRECISION {
            0.0
        } else {
            (theta2 - theta1) * FRAC_1_2PI
        };

        SourceField2d {
            potential,
            stream,
            velocity: self.to_global_vector(&Vector2::new(vx, vy)),
        }
    }

    /// Evaluates a unit linear source distribution, split per endpoint.
    ///
    /// The two velocities sum to the uniform source velocity.
    #[must_use]
    pub fn linear_source(&self, pt: &Point2) -> LinearSourceField2d {
        if self.null {
            return LinearSourceField2d::default();
        }

        let pl = self.to_local_point(pt);
        let t = self.trig(pl.x, pl.y);
        let mut ln_r1 = t.ln_r1;
        let mut ln_r2 = t.ln_r2;
        let mut theta1 = PI - t.beta1;
        let mut theta2 = PI - t.beta2;

        if (self.a - pt).norm() < LENGTH_PRECISION {
            ln_r1 = 0.0;
            theta1 = 0.0;
        }
        if (self.b - pt).norm() < LENGTH_PRECISION {
            ln_r2 = 0.0;
            theta2 = 0.0;
        }

        let l = self.bl.x - self.al.x;
        let xa = self.al.x;
        let xb = self.bl.x;
        let x = pl.x;
        let y = pl.y - self.al.y;
        let x1 = x - xa;
        let x2 = x - xb;
        let dln = ln_r2 - ln_r1;
        let dtheta = theta2 - theta1;

        let psi_c = (x1 * theta1 - x2 * theta2 - y * dln) * FRAC_1_2PI;
        let psi_l = -(2.0 * x * y * dln
            + y * (xb - xa)
            + (x * x - y * y - xb * xb) * theta2
            - (x * x - y * y - xa * xa) * theta1)
            * FRAC_1_4PI;

        let u_c = -dln * FRAC_1_2PI;
        let u_l = (-x * dln - (xb - xa) + y * dtheta) * FRAC_1_2PI;
        let v_c = dtheta * FRAC_1_2PI;
        let v_l = (y * dln + x * dtheta) * FRAC_1_2PI;

        let vl1 = Vector2::new((xb * u_c - u_l) / l, (xb * v_c - v_l) / l);
        let vl2 = Vector2::new(-(xa * u_c - u_l) / l, -(xa * v_c - v_l) / l);

        LinearSourceField2d {
            stream: [(xb * psi_c - psi_l) / l, -(xa * psi_c - psi_l) / l],
            velocity: [self.to_global_vector(&vl1), self.to_global_vector(&vl2)],
        }
    }

    /// Katz & Plotkin stream function of a linear vortex, split into the
    /// constant-strength part and the part proportional to local `x`.
    #[must_use]
    pub fn linear_vortex_kp(&self, pt: &Point2) -> VortexStream {
        if self.null {
            return VortexStream::default();
        }

        let pl = self.to_local_point(pt);
        let (x, y) = (pl.x, pl.y);
        let xa = self.al.x;
        let xb = self.bl.x;
        let t = self.trig(x, y);
        let theta1 = PI / 2.0 - t.beta1;
        let theta2 = PI / 2.0 - t.beta2;

        let constant = ((x - xa) * t.ln_r1 - (x - xb) * t.ln_r2 + y * (theta2 - theta1) - xb + xa)
            * FRAC_1_2PI;

        let upper = -(x * x - xb * xb - y * y) * t.ln_r2 - xb * xb / 2.0 - x * xb
            + 2.0 * x * y * theta2;
        let lower = -(x * x - xa * xa - y * y) * t.ln_r1 - xa * xa / 2.0 - x * xa
            + 2.0 * x * y * theta1;

        VortexStream {
            constant,
            linear: (upper - lower) * FRAC_1_4PI,
        }
    }

    /// Velocity of a unit uniform vortex distribution.
    #[must_use]
    pub fn uniform_vortex(&self, pt: &Point2) -> Vector2 {
        if self.null {
            return Vector2::zeros();
        }

        let pl = self.to_local_point(pt);
        let t = self.trig(pl.x, pl.y);
        let b1 = PI / 2.0 - t.beta1;
        let b2 = PI / 2.0 - t.beta2;

        let u_c = (b2 - b1) * FRAC_1_2PI;
        let v_c = (t.ln_r2 - t.ln_r1) * FRAC_1_2PI;
        self.to_global_vector(&Vector2::new(u_c, v_c))
    }

    /// Velocity sensitivities of a linear vortex distribution.
    ///
    /// Returns `∂V/∂γ` for a unit vorticity at each endpoint, in the global
    /// frame, and `∂²V/∂y∂γ` with `y` the local normal coordinate, in the
    /// local frame. The second derivatives are singular on the panel's line.
    #[must_use]
    pub fn linear_vortex_sensitivities(&self, pt: &Point2) -> VortexSensitivities {
        if self.null {
            return VortexSensitivities::default();
        }

        let pl = self.to_local_point(pt);
        let (x, y) = (pl.x, pl.y);
        let ax = self.al.x;
        let bx = self.bl.x;
        let d = bx - ax;

        let t = self.trig(x, y);
        let b1 = PI / 2.0 - t.beta1;
        let b2 = PI / 2.0 - t.beta2;
        let dln = t.ln_r2 - t.ln_r1;
        let db = b2 - b1;

        let u_c = db * FRAC_1_2PI;
        let u_l = (y * dln + x * db) * FRAC_1_2PI;
        let v_c = dln * FRAC_1_2PI;
        let v_l = (x * dln + d - y * db) * FRAC_1_2PI;

        let dv1 = Vector2::new((bx * u_c - u_l) / d, (bx * v_c - v_l) / d);
        let dv2 = Vector2::new(-(ax * u_c - u_l) / d, -(ax * v_c - v_l) / d);

        let r1_sq = (x - ax) * (x - ax) + y * y;
        let r2_sq = (x - bx) * (x - bx) + y * y;
        let (d2v1, d2v2) = if r1_sq > 0.0 && r2_sq > 0.0 {
            let c4 = FRAC_1_4PI;
            let c2 = FRAC_1_2PI;
            let (ln1, ln2) = (r1_sq.ln(), r2_sq.ln());
            let w_a = -c4 * ax * ax + c2 * ax * x - c4 * x * x - c4 * y * y;
            let w_b = c4 * bx * bx - c2 * bx * x + c4 * x * x + c4 * y * y;
            let d2u1 = (w_a * ln1 - w_a * ln2 + c2 * ax * ax + (-c2 * bx - c2 * x) * ax
                + c2 * bx * x)
                / (ax - bx)
                / r1_sq;
            let d2u2 = (w_b * ln1 - w_b * ln2 + c2 * bx * bx + (-c2 * ax - c2 * x) * bx
                + c2 * ax * x)
                / (ax - bx)
                / r2_sq;

            let dv_c = (y / r2_sq - y / r1_sq) * FRAC_1_2PI;
            let dv_l = (y * bx / r2_sq - y * ax / r1_sq - db) * FRAC_1_2PI;
            (
                Vector2::new(d2u1, (bx * dv_c - dv_l) / d),
                Vector2::new(d2u2, -(ax * dv_c - dv_l) / d),
            )
        } else {
            (Vector2::zeros(), Vector2::zeros())
        };

        VortexSensitivities {
            dv_dgamma: [self.to_global_vector(&dv1), self.to_global_vector(&dv2)],
            d2v_dy_dgamma: [d2v1, d2v2],
        }
    }

    /// XFoil-style stream functions of a linear vortex, `1/(4π)` included.
    ///
    /// `psi_minus` is derived from `psi_plus` through the closed-form
    /// identity of Drela's formulation rather than integrated separately.
    #[must_use]
    pub fn linear_vortex_stream(&self, pt: &Point2) -> XfoilStream {
        if self.null {
            return XfoilStream::default();
        }

        let pl = self.to_local_point(pt);
        let r1 = (pt - self.a).norm();
        let r2 = (pt - self.b).norm();
        let x1 = pl.x - self.al.x;
        let x2 = pl.x - self.bl.x;

        let t = self.trig(pl.x, pl.y);
        let psi_p = x1 * t.ln_r1 - x2 * t.ln_r2 + x2 - x1 - pl.y * (t.beta2 - t.beta1);
        let psi_m = ((x1 + x2) * psi_p + r2 * r2 * t.ln_r2 - r1 * r1 * t.ln_r1
            + 0.5 * (x1 * x1 - x2 * x2))
            / (x1 - x2);

        XfoilStream {
            psi_plus: psi_p * FRAC_1_4PI,
            psi_minus: psi_m * FRAC_1_4PI,
        }
    }
}
