use crate::math::{Point3, Vector3, FRAC_1_4PI};

/// Lamb–Oseen constant such that the peak tangential velocity sits at the core radius.
const LAMB_OSEEN_ALPHA: f64 = 1.25643;

/// Relative length below which a filament is treated as a point.
const MIN_FILAMENT_LENGTH: f64 = 1.0e-12;

/// Desingularization applied to the velocity of a straight vortex filament.
///
/// Each model scales the potential Biot–Savart velocity by a factor that
/// depends on the distance `h` from the field point to the filament line and
/// on the core radius `rc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VortexModel {
    /// Potential vortex. Points inside the core induce nothing.
    #[default]
    Potential,
    /// Velocity capped at its value on the core boundary.
    CutOff,
    /// `1 - exp(-α h²/rc²)`.
    LambOseen,
    /// Solid-body rotation inside the core.
    Rankine,
    /// `h²/(rc² + h²)`.
    Scully,
    /// Vatistas model with `n = 2`: `h²/√(rc⁴ + h⁴)`.
    Vatistas,
}

impl VortexModel {
    /// Returns the factor applied to the potential velocity at distance `h`
    /// from the filament.
    ///
    /// A zero core radius disables every model except at `h = 0`.
    #[must_use]
    pub fn core_factor(self, h: f64, core_radius: f64) -> f64 {
        if core_radius <= 0.0 {
            return if h > 0.0 { 1.0 } else { 0.0 };
        }
        let h2 = h * h;
        let rc2 = core_radius * core_radius;
        match self {
            Self::Potential => {
                if h < core_radius {
                    0.0
                } else {
                    1.0
                }
            }
            Self::CutOff => (h / core_radius).min(1.0),
            Self::LambOseen => 1.0 - (-LAMB_OSEEN_ALPHA * h2 / rc2).exp(),
            Self::Rankine => (h2 / rc2).min(1.0),
            Self::Scully => h2 / (rc2 + h2),
            Self::Vatistas => h2 / (rc2 * rc2 + h2 * h2).sqrt(),
        }
    }
}

/// Returns the velocity induced at `c` by a straight vortex filament from `a`
/// to `b` carrying unit circulation.
///
/// The potential part is the Biot–Savart law
/// `(r1 × r2)(|r1| + |r2|) / (4π |r1||r2| (|r1||r2| + r1·r2))` with
/// `r1 = c - a` and `r2 = c - b`, scaled by the core factor of `model`.
/// Points closer than `core_radius` to either end of the filament, and points
/// on the filament itself, induce a zero velocity.
#[must_use]
pub fn vortex_induced_velocity(
    a: &Point3,
    b: &Point3,
    c: &Point3,
    core_radius: f64,
    model: VortexModel,
) -> Vector3 {
    let r0: Vector3 = b - a;
    let r1: Vector3 = c - a;
    let r2: Vector3 = c - b;

    let len = r0.norm();
    let n1 = r1.norm();
    let n2 = r2.norm();
    if len < MIN_FILAMENT_LENGTH * (n1 + n2) || n1 < core_radius || n2 < core_radius {
        return Vector3::zeros();
    }

    let cross = r1.cross(&r2);
    let h = r0.cross(&r1).norm() / len;
    let denom = n1 * n2 * (n1 * n2 + r1.dot(&r2));
    if denom <= 0.0 || h <= 0.0 {
        return Vector3::zeros();
    }

    let factor = model.core_factor(h, core_radius);
    if factor == 0.0 {
        return Vector3::zeros();
    }
    cross * ((n1 + n2) / denom * FRAC_1_4PI * factor)
}

/// Returns the velocity induced at `c` by a closed ring of straight filaments
/// through `nodes`, carrying unit circulation.
#[must_use]
pub fn ring_induced_velocity(
    nodes: &[Point3],
    c: &Point3,
    core_radius: f64,
    model: VortexModel,
) -> Vector3 {
    (0..nodes.len())
        .map(|i| {
            vortex_induced_velocity(
                &nodes[i],
                &nodes[(i + 1) % nodes.len()],
                c,
                core_radius,
                model,
            )
        })
        .sum()
}
