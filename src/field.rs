use rayon::prelude::*;
use tracing::debug;

use crate::config::KernelConfig;
use crate::error::{GeometryError, Result};
use crate::math::{points_coincide, Point3, LENGTH_PRECISION};
use crate::panel3::{Influence, Panel3};
use crate::panel4::Panel4;

/// How the doublet of a triangular panel is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoubletMethod {
    /// Linear doublet from the three nodal strengths.
    #[default]
    Basis,
    /// Uniform doublet, NASA CR-4023 closed form, with the mean nodal strength.
    Nasa4023,
    /// Uniform doublet whose velocity is that of the equivalent vortex ring,
    /// with the mean nodal strength.
    VortexRing,
}

fn check_len(what: &'static str, len: usize, panels: usize) -> Result<()> {
    if len != panels {
        return Err(GeometryError::StrengthCount { what, len, panels }.into());
    }
    Ok(())
}

/// Sums `eval` over every panel, for each field point in parallel.
fn aggregate<P, F>(panels: &[P], points: &[Point3], eval: F) -> Vec<Influence>
where
    P: Sync,
    F: Fn(usize, &P, &Point3) -> Influence + Sync + Send,
{
    points
        .par_iter()
        .map(|pt| {
            panels
                .iter()
                .enumerate()
                .fold(Influence::default(), |acc, (i, panel)| acc + eval(i, panel, pt))
        })
        .collect()
}

/// Returns the potential and velocity induced at each point by uniform sources
/// of strength `sigma[i]` on `panels[i]`.
///
/// A field point at a panel centroid takes that panel's self-influence.
///
/// # Errors
///
/// Returns [`ConfigError`](crate::ConfigError) if the configuration is invalid
/// and [`GeometryError::StrengthCount`] if `sigma` and `panels` differ in length.
pub fn source_field(
    panels: &[Panel3],
    sigma: &[f64],
    points: &[Point3],
    config: &KernelConfig,
) -> Result<Vec<Influence>> {
    let config = config.validate()?;
    check_len("source", sigma.len(), panels.len())?;
    debug!(panels = panels.len(), points = points.len(), "triangle source field");

    Ok(aggregate(panels, points, |i, panel, pt| {
        if sigma[i] == 0.0 {
            return Influence::default();
        }
        let own = points_coincide(pt, panel.centroid(), LENGTH_PRECISION);
        panel.source_influence(pt, own, &config) * sigma[i]
    }))
}

/// Returns the potential and velocity induced at each point by the doublets
/// of `panels`, with nodal strengths `mu[i]` on `panels[i]`.
///
/// # Errors
///
/// Returns [`ConfigError`](crate::ConfigError) if the configuration is invalid
/// and [`GeometryError::StrengthCount`] if `mu` and `panels` differ in length.
pub fn doublet_field(
    panels: &[Panel3],
    mu: &[[f64; 3]],
    points: &[Point3],
    method: DoubletMethod,
    config: &KernelConfig,
) -> Result<Vec<Influence>> {
    let config = config.validate()?;
    check_len("doublet", mu.len(), panels.len())?;
    debug!(panels = panels.len(), points = points.len(), ?method, "triangle doublet field");

    Ok(aggregate(panels, points, |i, panel, pt| {
        let own = points_coincide(pt, panel.centroid(), LENGTH_PRECISION);
        let mean = mu[i].iter().sum::<f64>() / 3.0;
        match method {
            DoubletMethod::Basis => panel.doublet_basis_influence(pt, own, &config).combine(&mu[i]),
            DoubletMethod::Nasa4023 => panel.doublet_influence(pt, own, &config) * mean,
            DoubletMethod::VortexRing => {
                let potential = panel.doublet_influence(pt, own, &config).potential;
                Influence {
                    potential,
                    velocity: panel.doublet_vortex_velocity(pt, &config),
                } * mean
            }
        }
    }))
}

/// Returns the potential and velocity induced at each point by uniform
/// sources `sigma[i]` and doublets `mu[i]` on the quad panels.
///
/// A field point at a collocation point takes that panel's self-influence.
///
/// # Errors
///
/// Returns [`ConfigError`](crate::ConfigError) if the configuration is invalid
/// and [`GeometryError::StrengthCount`] if `sigma` or `mu` differ in length
/// from `panels`.
pub fn quad_field(
    panels: &[Panel4],
    sigma: &[f64],
    mu: &[f64],
    points: &[Point3],
    config: &KernelConfig,
) -> Result<Vec<Influence>> {
    let config = config.validate()?;
    check_len("source", sigma.len(), panels.len())?;
    check_len("doublet", mu.len(), panels.len())?;
    debug!(panels = panels.len(), points = points.len(), "quad field");

    Ok(aggregate(panels, points, |i, panel, pt| {
        let own = points_coincide(pt, panel.collocation_point(), LENGTH_PRECISION);
        let mut total = Influence::default();
        if sigma[i] != 0.0 {
            total += panel.source_influence(pt, own, &config) * sigma[i];
        }
        if mu[i] != 0.0 {
            total += panel.doublet_influence(pt, own, &config) * mu[i];
        }
        total
    }))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::error::{ConfigError, KernelError};
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// A unit square split into two triangles, slightly tilted.
    fn square() -> Vec<Panel3> {
        let p = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.1),
            Point3::new(1.0, 1.0, 0.1),
            Point3::new(0.0, 1.0, 0.0),
        ];
        vec![Panel3::new(p[0], p[1], p[2]), Panel3::new(p[0], p[2], p[3])]
    }

    fn points() -> Vec<Point3> {
        vec![
            Point3::new(0.3, 0.4, 0.5),
            Point3::new(-0.6, 1.4, -0.3),
            Point3::new(2.0, 0.5, 1.0),
            Point3::new(0.5, -0.2, -0.7),
        ]
    }

    #[test]
    fn source_field_is_the_weighted_sum() {
        init_tracing();
        let panels = square();
        let config = KernelConfig::default();
        let sigma = [0.7, -1.3];
        let field = source_field(&panels, &sigma, &points(), &config).unwrap();
        for (pt, got) in points().iter().zip(&field) {
            let expected = panels[0].source_influence(pt, false, &config) * sigma[0]
                + panels[1].source_influence(pt, false, &config) * sigma[1];
            assert_relative_eq!(got.potential, expected.potential, epsilon = 1e-14);
            assert_relative_eq!(got.velocity, expected.velocity, epsilon = 1e-14);
        }
    }

    #[test]
    fn uniform_doublet_methods_agree() {
        init_tracing();
        let panels = square();
        let config = KernelConfig::default();
        let mu = [[0.8; 3], [0.8; 3]];
        let basis = doublet_field(&panels, &mu, &points(), DoubletMethod::Basis, &config).unwrap();
        let n4023 = doublet_field(&panels, &mu, &points(), DoubletMethod::Nasa4023, &config).unwrap();
        let ring = doublet_field(&panels, &mu, &points(), DoubletMethod::VortexRing, &config).unwrap();
        for ((b, n), r) in basis.iter().zip(&n4023).zip(&ring) {
            assert!((b.potential - n.potential).abs() < 1e-8);
            assert!((b.velocity - n.velocity).norm() < 1e-8 * n.velocity.norm().max(1.0));
            assert_relative_eq!(r.potential, n.potential, epsilon = 1e-14);
            assert!((r.velocity - n.velocity).norm() < 1e-10 * n.velocity.norm().max(1.0));
        }
    }

    #[test]
    fn linear_doublet_uses_nodal_strengths() {
        let panels = square();
        let config = KernelConfig::default();
        let mu = [[1.0, 0.0, 2.0], [1.0, 2.0, 0.5]];
        let field = doublet_field(&panels, &mu, &points(), DoubletMethod::Basis, &config).unwrap();
        for (pt, got) in points().iter().zip(&field) {
            let expected = panels[0].doublet_basis_influence(pt, false, &config).combine(&mu[0])
                + panels[1].doublet_basis_influence(pt, false, &config).combine(&mu[1]);
            assert_relative_eq!(got.potential, expected.potential, epsilon = 1e-14);
            assert_relative_eq!(got.velocity, expected.velocity, epsilon = 1e-14);
        }
    }

    #[test]
    fn centroid_points_take_the_self_influence() {
        let panels = vec![Panel3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )];
        let config = KernelConfig::default();
        let pts = [*panels[0].centroid()];
        let field = doublet_field(&panels, &[[1.0; 3]], &pts, DoubletMethod::Nasa4023, &config).unwrap();
        assert_relative_eq!(field[0].potential, 2.0 * PI, epsilon = 1e-12);

        let field = source_field(&panels, &[1.0], &pts, &config).unwrap();
        assert_relative_eq!(field[0].velocity.dot(&Vector3::z()), 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn quad_field_matches_panel_sums() {
        init_tracing();
        let panels = vec![
            Panel4::new(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ),
            Panel4::new(
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
            ),
        ];
        let config = KernelConfig::default();
        let sigma = [1.0, 0.0];
        let mu = [-0.5, 2.0];
        let field = quad_field(&panels, &sigma, &mu, &points(), &config).unwrap();
        for (pt, got) in points().iter().zip(&field) {
            let expected = panels[0].source_influence(pt, false, &config)
                + panels[0].doublet_influence(pt, false, &config) * -0.5
                + panels[1].doublet_influence(pt, false, &config) * 2.0;
            assert_relative_eq!(got.potential, expected.potential, epsilon = 1e-14);
            assert_relative_eq!(got.velocity, expected.velocity, epsilon = 1e-14);
        }
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let panels = square();
        let config = KernelConfig::default();
        assert!(matches!(
            source_field(&panels, &[1.0], &points(), &config),
            Err(KernelError::Geometry(GeometryError::StrengthCount { what: "source", len: 1, panels: 2 }))
        ));
        assert!(matches!(
            doublet_field(&panels, &[[1.0; 3]; 3], &points(), DoubletMethod::Basis, &config),
            Err(KernelError::Geometry(GeometryError::StrengthCount { what: "doublet", len: 3, panels: 2 }))
        ));
        assert!(matches!(
            quad_field(&[], &[], &[1.0], &points(), &config),
            Err(KernelError::Geometry(GeometryError::StrengthCount { what: "doublet", .. }))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = KernelConfig::default().with_core_radius(-1.0);
        assert!(matches!(
            source_field(&square(), &[1.0, 1.0], &points(), &config),
            Err(KernelError::Config(ConfigError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn empty_batches() {
        let config = KernelConfig::default();
        assert!(source_field(&square(), &[1.0, 1.0], &[], &config).unwrap().is_empty());
        let field = quad_field(&[], &[], &[], &points(), &config).unwrap();
        assert!(field.iter().all(|f| *f == Influence::default()));
    }
}
