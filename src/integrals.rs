use std::f64::consts::{FRAC_PI_2, PI};

use crate::frame::Frame3d;
use crate::math::{
    points_coincide, sign, Point3, Vector2, Vector3, INPLANE_PRECISION, LENGTH_PRECISION,
};

/// Surface integrals of `{1, x, y, x², xy, y²}` weighted by `1/r`, `1/r³`, `1/r⁵`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceIntegrals {
    pub g1: [f64; 3],
    pub g3: [f64; 6],
    pub g5: [f64; 6],
}

/// Per-edge quantities of the Nintcheu Fata formulas.
struct EdgeTerms {
    /// Edge direction cosine and sine.
    ca: f64,
    sa: f64,
    /// Signed distance from the projected point to the edge line, negative inside.
    q: f64,
    /// `q² + η²`.
    d: f64,
    /// `ρ_i - ρ_{i+1}`.
    rt: f64,
    gamma: f64,
    chi: f64,
    delta: f64,
    l: f64,
}

/// Evaluates the surface integrals of a counter-clockwise local triangle.
///
/// `vertices` lie in the `z = 0` plane and `p` is expressed in the same
/// frame. For source points `q = (x, y, 0)` and `r = |p - q|`:
///
/// - `g1 = ∫ {1, x, y} / r`
/// - `g3 = ∫ {1, x, y, x², xy, y²} / r³`
/// - `g5 = ∫ {1, x, y, x², xy, y²} / r⁵`
///
/// The expressions are those of S. Nintcheu Fata, "Explicit expressions for
/// 3D boundary integrals in potential theory", IJNME 2009. The field point
/// must be off the plane, and its projection must not coincide with a
/// vertex; callers shift such points beforehand.
#[must_use]
pub fn nintcheu_fata(vertices: &[Point3; 3], p: &Point3) -> SurfaceIntegrals {
    let eta = p.z;
    let rho: [f64; 3] = std::array::from_fn(|i| (vertices[i] - p).norm());

    let edges: [EdgeTerms; 3] = std::array::from_fn(|i| {
        let j = (i + 1) % 3;
        let s = vertices[j] - vertices[i];
        let u = Vector2::new(s.x, s.y).normalize();
        let normal = Vector2::new(-u.y, u.x);
        let to_start = Vector2::new(vertices[i].x - p.x, vertices[i].y - p.y);
        let to_end = Vector2::new(vertices[j].x - p.x, vertices[j].y - p.y);

        // Adding zero turns -0.0 into +0.0 so atan2 picks a consistent branch.
        let q = to_start.dot(&normal) + 0.0;
        let p0 = to_start.dot(&u);
        let p1 = to_end.dot(&u);
        let (r0, r1) = (rho[i], rho[j]);

        let angle = |pk: f64, rk: f64| {
            let den = q * q * (pk * pk + q * q) + eta * eta * (q - pk) * (q + pk);
            (-2.0 * pk * q * eta * rk).atan2(den)
        };

        // (r + p)(r - p) = d holds at both ends, which keeps the differences
        // below exact for field points beyond the edge ends.
        let d = q * q + eta * eta;
        let ln_sum = |pk: f64, rk: f64| {
            if pk >= 0.0 {
                (pk + rk).ln()
            } else {
                d.ln() - (rk - pk).ln()
            }
        };
        let chi = if p0 < 0.0 && p1 < 0.0 {
            (r1 - p1).ln() - (r0 - p0).ln()
        } else {
            ln_sum(p0, r0) - ln_sum(p1, r1)
        };
        let rt = (p0 - p1) * (p0 + p1) / (r0 + r1);
        let delta = if p0 * p1 > 0.0 {
            d * (p0 - p1) * (p0 + p1) / (r0 * r1 * (p0 * r1 + p1 * r0))
        } else {
            p0 / r0 - p1 / r1
        };

        EdgeTerms {
            ca: u.x,
            sa: u.y,
            q,
            d,
            rt,
            gamma: angle(p0, r0) - angle(p1, r1),
            chi,
            delta,
            l: -rt / (r0 * r1),
        }
    });

    let inside = edges.iter().all(|e| e.q < 0.0);
    let theta0 = if inside { 2.0 * PI } else { 0.0 };
    let thetx = 0.5 * edges.iter().map(|e| e.gamma).sum::<f64>() + sign(eta) * theta0;

    let mut n1 = [-eta * thetx, 0.0, 0.0];
    let mut n3 = [thetx / eta, 0.0, 0.0, -eta * thetx, 0.0, -eta * thetx];
    let mut n5 = [0.0; 6];

    for e in &edges {
        n1[0] += e.q * e.chi;
        n1[1] += 0.5 * (e.q * e.rt * e.ca - e.d * e.chi * e.sa);
        n1[2] += 0.5 * (e.q * e.rt * e.sa + e.d * e.chi * e.ca);

        let cx = e.q * e.chi * e.ca + e.rt * e.sa;
        n3[1] += e.chi * e.sa;
        n3[2] -= e.chi * e.ca;
        n3[3] += cx * e.ca;
        n3[4] += cx * e.sa;
        n3[5] += (e.q * e.chi * e.sa - e.rt * e.ca) * e.sa;

        let qd = e.q / e.d * e.delta;
        n5[0] += qd;
        n5[1] += e.delta / e.d * e.sa;
        n5[2] -= e.delta / e.d * e.ca;
        n5[3] += (e.l * e.ca + qd * e.sa) * e.sa;
        n5[4] += (e.l * e.sa - qd * e.ca) * e.sa;
        n5[5] += (e.l * e.sa - qd * e.ca) * e.ca;
    }

    let eta2 = eta * eta;
    n5[0] = n5[0] / (3.0 * eta2) + thetx / (3.0 * eta2 * eta);
    n5[1] /= 3.0;
    n5[2] /= 3.0;
    n5[3] = -n5[3] / 3.0 + thetx / (3.0 * eta);
    n5[4] /= -3.0;
    n5[5] = n5[5] / 3.0 + thetx / (3.0 * eta);

    let (dx, dy) = (p.x, p.y);
    let shift = |n: &[f64; 6]| {
        [
            n[0],
            dx * n[0] + n[1],
            dy * n[0] + n[2],
            dx * dx * n[0] + n[3] + 2.0 * dx * n[1],
            dx * dy * n[0] + dy * n[1] + dx * n[2] + n[4],
            dy * dy * n[0] + n[5] + 2.0 * dy * n[2],
        ]
    };

    SurfaceIntegrals {
        g1: [n1[0], dx * n1[0] + n1[1], dy * n1[0] + n1[2]],
        g3: shift(&n3),
        g5: shift(&n5),
    }
}

/// Edge sums of the NASA CR-4023 closed forms for a flat polygon with unit
/// uniform source and doublet strengths.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PolygonSums {
    pub source_potential: f64,
    pub source_velocity: Vector3,
    pub doublet_potential: f64,
    pub doublet_velocity: Vector3,
}

/// Accumulates the NASA CR-4023 edge terms over the closed polygon `nodes`.
///
/// `frame` holds the collocation point and the panel axes `(l, m, n)`.
/// Edges within `core_radius` of `c` are skipped, as are edges whose end
/// points coincide. Edges with an end point within `core_radius` of `c`
/// still add their doublet potential. In the panel plane the edge angle is
/// `±π`, `±π/2` or 0; with `signed_sides` its sign also follows the side of
/// the edge on which `c` lies.
pub(crate) fn polygon_n4023(
    nodes: &[Point3],
    frame: &Frame3d,
    c: &Point3,
    core_radius: f64,
    signed_sides: bool,
) -> PolygonSums {
    let (l, m, n) = (frame.i(), frame.j(), frame.k());
    let pn = (c - frame.origin()).dot(n);
    let in_plane = pn.abs() < INPLANE_PRECISION;

    let mut sums = PolygonSums::default();
    for (i, start) in nodes.iter().enumerate() {
        let end = &nodes[(i + 1) % nodes.len()];
        if points_coincide(start, end, LENGTH_PRECISION) {
            continue;
        }
        let a: Vector3 = c - start;
        let b: Vector3 = c - end;
        let s: Vector3 = end - start;
        let (aa, bb, ss) = (a.norm(), b.norm(), s.norm());
        let h = a.cross(&s);

        let near_segment =
            a.dot(&s) >= 0.0 && b.dot(&s) <= 0.0 && h.norm() <= core_radius * ss;
        if near_segment {
            continue;
        }

        let sm = s.dot(m);
        let sl = s.dot(l);
        let am = a.dot(m);
        let al = a.dot(l);
        let a_l = am * sl - al * sm;
        let pa = pn * pn * sl + a_l * am;
        let pb = pa - a_l * sm;

        let rnum = sm * pn * (bb * pa - aa * pb);
        let dnom = pa * pb + pn * pn * aa * bb * sm * sm;
        let cjk = if in_plane {
            let side = if signed_sides { sign(n.dot(&h)) } else { 1.0 };
            let angle = if dnom < 0.0 {
                PI
            } else if dnom == 0.0 {
                FRAC_PI_2
            } else {
                0.0
            };
            angle * side * if pn > 0.0 { 1.0 } else { -1.0 }
        } else {
            rnum.atan2(dnom)
        };
        sums.doublet_potential -= cjk;

        // The potential is regular at the vertices, the velocities are not.
        if aa < core_radius || bb < core_radius {
            continue;
        }

        let gl = if (aa + bb - ss).abs() > 0.0 {
            ((aa + bb + ss) / (aa + bb - ss)).abs().ln() / ss
        } else {
            0.0
        };

        sums.source_potential -= a_l * gl - pn * cjk;
        sums.source_velocity += n * cjk + l * (sm * gl) - m * (sl * gl);

        let ring = aa * bb * (aa * bb + a.dot(&b));
        if ring > 0.0 {
            sums.doublet_velocity += a.cross(&b) * ((aa + bb) / ring);
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrature::TriangleQuadrature;

    fn triangle() -> [Point3; 3] {
        [
            Point3::new(-1.0, -0.3, 0.0),
            Point3::new(1.0, -0.3, 0.0),
            Point3::new(0.0, 0.7, 0.0),
        ]
    }

    fn reference(vertices: &[Point3; 3], p: &Point3) -> SurfaceIntegrals {
        let rule = TriangleQuadrature::new(8);
        let mut out = SurfaceIntegrals::default();
        for node in rule.nodes(vertices, 4) {
            let (x, y) = (node.point.x, node.point.y);
            let r = (p - node.point).norm();
            let f = [1.0, x, y, x * x, x * y, y * y];
            for k in 0..3 {
                out.g1[k] += f[k] / r * node.weight;
            }
            for k in 0..6 {
                out.g3[k] += f[k] / r.powi(3) * node.weight;
                out.g5[k] += f[k] / r.powi(5) * node.weight;
            }
        }
        out
    }

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() / y.abs().max(1.0) < tol, "{x} vs {y}");
        }
    }

    #[test]
    fn matches_quadrature_above_and_below() {
        let tri = triangle();
        for p in [
            Point3::new(3.2, -1.7, 0.5),
            Point3::new(0.1, 0.2, 0.3),
            Point3::new(0.5, 0.5, -0.2),
            Point3::new(0.1, 0.1, 0.8),
            Point3::new(-2.0, 1.5, -1.0),
        ] {
            let nf = nintcheu_fata(&tri, &p);
            let q = reference(&tri, &p);
            assert_close(&nf.g1, &q.g1, 1e-6);
            assert_close(&nf.g3, &q.g3, 1e-6);
            assert_close(&nf.g5, &q.g5, 1e-6);
        }
    }

    #[test]
    fn solid_angle_of_point_above_centroid() {
        // ∫ z/r³ is the solid angle, which tends to 2π very close to the plane.
        let tri = triangle();
        let eta = 1e-6;
        let above = nintcheu_fata(&tri, &Point3::new(0.0, 0.0, eta));
        assert!((above.g3[0] * eta - 2.0 * PI).abs() < 1e-4);
        let below = nintcheu_fata(&tri, &Point3::new(0.0, 0.0, -eta));
        assert!((below.g3[0] * eta - 2.0 * PI).abs() < 1e-4);
    }

    #[test]
    fn projection_on_edge_is_finite() {
        let tri = triangle();
        let p = Point3::new(0.2, -0.3, 0.25);
        let nf = nintcheu_fata(&tri, &p);
        assert!(nf.g1.iter().chain(&nf.g3).chain(&nf.g5).all(|v| v.is_finite()));
        let q = reference(&tri, &p);
        assert_close(&nf.g3, &q.g3, 1e-5);
    }

    #[test]
    fn points_beyond_the_edge_ends_stay_accurate() {
        // Points on the extensions of the edges, barely off the plane.
        let bases = [(3.0, 0.0), (-1.0, 0.0), (0.0, 2.5), (0.0, -0.7), (-1.0, 1.5)];
        for scale in [1.0, 100.0] {
            let tri = [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0 * scale, 0.0, 0.0),
                Point3::new(0.0, scale, 0.0),
            ];
            for (x, y) in bases {
                for eta in [1e-6, 1e-7, 5e-8, 2e-8] {
                    let p = Point3::new(x * scale, y * scale, eta * scale);
                    let nf = nintcheu_fata(&tri, &p);
                    assert!(
                        nf.g1.iter().chain(&nf.g3).chain(&nf.g5).all(|v| v.is_finite()),
                        "non-finite integrals at {p}"
                    );
                    let q = reference(&tri, &p);
                    for (a, b) in [(&nf.g1[..], &q.g1[..]), (&nf.g3[..], &q.g3[..])] {
                        let size = b.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
                        for (u, v) in a.iter().zip(b) {
                            assert!((u - v).abs() < 1e-6 * size, "{u} vs {v} at {p}");
                        }
                    }
                }
            }
        }
    }
}
