use tracing::warn;

use crate::config::{MAX_QUADRATURE_ORDER, MIN_QUADRATURE_ORDER};
use crate::math::{Point3, Vector3};

/// Rule order used when an invalid order is requested.
const FALLBACK_ORDER: usize = 3;

/// A Gauss point in the reference triangle `(0,0), (1,0), (0,1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussPoint {
    pub xi: f64,
    pub eta: f64,
    /// Weight, normalized so that the weights of a rule sum to 1.
    pub weight: f64,
}

/// A quadrature point mapped onto a physical triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureNode {
    pub point: Point3,
    /// Weight including the triangle area.
    pub weight: f64,
}

/// Symmetric Dunavant quadrature rule on triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleQuadrature {
    order: usize,
    points: Vec<GaussPoint>,
}

impl Default for TriangleQuadrature {
    fn default() -> Self {
        Self::new(FALLBACK_ORDER)
    }
}

impl TriangleQuadrature {
    /// Creates the rule of the given polynomial order.
    ///
    /// Orders above 8 are reduced to 8; order 0 falls back to 3.
    #[must_use]
    pub fn new(order: usize) -> Self {
        let order = if order < MIN_QUADRATURE_ORDER {
            warn!(order, "quadrature order too low, using {FALLBACK_ORDER}");
            FALLBACK_ORDER
        } else if order > MAX_QUADRATURE_ORDER {
            warn!(order, "quadrature order too high, using {MAX_QUADRATURE_ORDER}");
            MAX_QUADRATURE_ORDER
        } else {
            order
        };
        Self {
            order,
            points: dunavant(order),
        }
    }

    /// Returns the polynomial order integrated exactly.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the Gauss points of the reference triangle.
    #[must_use]
    pub fn points(&self) -> &[GaussPoint] {
        &self.points
    }

    /// Maps the rule onto a triangle, after `subdivision` levels of 4-way
    /// midpoint splitting.
    #[must_use]
    pub fn nodes(&self, vertices: &[Point3; 3], subdivision: usize) -> Vec<QuadratureNode> {
        let mut triangles = vec![*vertices];
        for _ in 0..subdivision {
            triangles = triangles.iter().flat_map(split_at_midpoints).collect();
        }

        let mut nodes = Vec::with_capacity(triangles.len() * self.points.len());
        for [s0, s1, s2] in &triangles {
            let e1: Vector3 = s1 - s0;
            let e2: Vector3 = s2 - s0;
            let area = e1.cross(&e2).norm() / 2.0;
            nodes.extend(self.points.iter().map(|gp| QuadratureNode {
                point: s0 + e1 * gp.xi + e2 * gp.eta,
                weight: gp.weight * area,
            }));
        }
        nodes
    }

    /// Integrates a scalar function over a triangle.
    #[must_use]
    pub fn integrate<F>(&self, vertices: &[Point3; 3], subdivision: usize, f: F) -> f64
    where
        F: Fn(&Point3) -> f64,
    {
        self.nodes(vertices, subdivision)
            .iter()
            .map(|n| f(&n.point) * n.weight)
            .sum()
    }
}

fn split_at_midpoints(t: &[Point3; 3]) -> [[Point3; 3]; 4] {
    let [s0, s1, s2] = *t;
    let m01 = nalgebra::center(&s0, &s1);
    let m12 = nalgebra::center(&s1, &s2);
    let m20 = nalgebra::center(&s2, &s0);
    [
        [s0, m01, m20],
        [m01, s1, m12],
        [m20, m12, s2],
        [m01, m12, m20],
    ]
}

fn gp(xi: f64, eta: f64, weight: f64) -> GaussPoint {
    GaussPoint { xi, eta, weight }
}

/// Three points `(a,a), (a,b), (b,a)` with `b = 1 - 2a`.
fn orbit3(a: f64, b: f64, weight: f64) -> [GaussPoint; 3] {
    [gp(a, a, weight), gp(a, b, weight), gp(b, a, weight)]
}

/// Six permutations of `(a, b, c)`.
fn orbit6(a: f64, b: f64, c: f64, weight: f64) -> [GaussPoint; 6] {
    [
        gp(a, b, weight),
        gp(b, c, weight),
        gp(c, a, weight),
        gp(b, a, weight),
        gp(a, c, weight),
        gp(c, b, weight),
    ]
}

#[allow(clippy::unreadable_literal)]
fn dunavant(order: usize) -> Vec<GaussPoint> {
    let third = 1.0 / 3.0;
    let mut points = Vec::new();
    match order {
        1 => points.push(gp(third, third, 1.0)),
        2 => points.extend(orbit3(1.0 / 6.0, 2.0 / 3.0, third)),
        3 => {
            points.push(gp(third, third, -0.5625));
            points.extend(orbit3(0.2, 0.6, 0.52083333333333));
        }
        4 => {
            points.extend(orbit3(0.44594849091597, 0.10810301816807, 0.22338158967801));
            points.extend(orbit3(0.09157621350977, 0.81684757298046, 0.10995174365532));
        }
        5 => {
            points.push(gp(third, third, 0.225));
            points.extend(orbit3(0.47014206410511, 0.05971587178977, 0.13239415278851));
            points.extend(orbit3(0.10128650732346, 0.79742698535309, 0.12593918054483));
        }
        6 => {
            points.extend(orbit3(0.24928674517091, 0.50142650965818, 0.11678627572638));
            points.extend(orbit3(0.06308901449150, 0.87382197101700, 0.05084490637021));
            points.extend(orbit6(
                0.31035245103378,
                0.63650249912140,
                0.05314504984482,
                0.08285107561837,
            ));
        }
        7 => {
            points.push(gp(third, third, -0.14957004446768));
            points.extend(orbit3(0.26034596607904, 0.47930806784192, 0.17561525743321));
            points.extend(orbit3(0.06513010290222, 0.86973979419557, 0.05334723560884));
            points.extend(orbit6(
                0.31286549600487,
                0.63844418856981,
                0.04869031542532,
                0.07711376089026,
            ));
        }
        _ => {
            points.push(gp(third, third, 0.14431560767779));
            points.extend(orbit3(0.45929258829272, 0.08141482341455, 0.09509163426728));
            points.extend(orbit3(0.17056930775176, 0.65886138449648, 0.10321737053472));
            points.extend(orbit3(0.05054722831703, 0.89890554336594, 0.03245849762320));
            points.extend(orbit6(
                0.26311282963464,
                0.72849239295540,
                0.00839477740996,
                0.02723031417443,
            ));
        }
    }
    points
}
