use crate::error::{ConfigError, Result};
use crate::vortex::VortexModel;

/// Lowest Gaussian quadrature order available on triangles.
pub const MIN_QUADRATURE_ORDER: usize = 1;

/// Highest Gaussian quadrature order available on triangles.
pub const MAX_QUADRATURE_ORDER: usize = 8;

/// Numerical settings shared by all 3D evaluators of a batch.
///
/// The configuration is an immutable snapshot: build it once, then pass it by
/// reference into every evaluation so that concurrent evaluations read the
/// same values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelConfig {
    /// Relative far-field factor. A field point farther than
    /// `far_field_factor * max_size` from the panel centroid uses the
    /// far-field approximation.
    pub far_field_factor: f64,
    /// Order of the Gaussian quadrature rule on triangles, in `1..=8`.
    pub quadrature_order: usize,
    /// Number of recursive midpoint subdivisions applied before quadrature.
    pub quadrature_subdivision: usize,
    /// Use the closed-form Nintcheu Fata integrals for linear basis
    /// functions instead of quadrature.
    pub use_nintcheu_fata: bool,
    /// Regularization radius around vortex filaments and panel edges.
    pub core_radius: f64,
    /// Vortex-core model applied to filament velocities.
    pub vortex_model: VortexModel,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            far_field_factor: 10.0,
            quadrature_order: 5,
            quadrature_subdivision: 0,
            use_nintcheu_fata: true,
            core_radius: 1.0e-5,
            vortex_model: VortexModel::Potential,
        }
    }
}

impl KernelConfig {
    /// Returns a copy with a different far-field factor.
    #[must_use]
    pub fn with_far_field_factor(mut self, factor: f64) -> Self {
        self.far_field_factor = factor;
        self
    }

    /// Returns a copy with a different quadrature order.
    #[must_use]
    pub fn with_quadrature_order(mut self, order: usize) -> Self {
        self.quadrature_order = order;
        self
    }

    /// Returns a copy with a different number of subdivision levels.
    #[must_use]
    pub fn with_quadrature_subdivision(mut self, levels: usize) -> Self {
        self.quadrature_subdivision = levels;
        self
    }

    /// Returns a copy selecting closed-form or quadrature basis integrals.
    #[must_use]
    pub fn with_nintcheu_fata(mut self, enabled: bool) -> Self {
        self.use_nintcheu_fata = enabled;
        self
    }

    /// Returns a copy with a different core radius.
    #[must_use]
    pub fn with_core_radius(mut self, radius: f64) -> Self {
        self.core_radius = radius;
        self
    }

    /// Returns a copy with a different vortex-core model.
    #[must_use]
    pub fn with_vortex_model(mut self, model: VortexModel) -> Self {
        self.vortex_model = model;
        self
    }

    /// Checks that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] if the far-field factor is not
    /// positive, the quadrature order is outside `1..=8`, or the core radius
    /// is negative or not finite.
    pub fn validate(self) -> Result<Self> {
        if !(self.far_field_factor.is_finite() && self.far_field_factor > 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "far_field_factor must be positive, got {}",
                self.far_field_factor
            ))
            .into());
        }
        if !(MIN_QUADRATURE_ORDER..=MAX_QUADRATURE_ORDER).contains(&self.quadrature_order) {
            return Err(ConfigError::InvalidParameter(format!(
                "quadrature_order must be in {MIN_QUADRATURE_ORDER}..={MAX_QUADRATURE_ORDER}, got {}",
                self.quadrature_order
            ))
            .into());
        }
        if !(self.core_radius.is_finite() && self.core_radius >= 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "core_radius must be non-negative, got {}",
                self.core_radius
            ))
            .into());
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = KernelConfig::default();
        assert!((config.far_field_factor - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.quadrature_order, 5);
        assert_eq!(config.quadrature_subdivision, 0);
        assert!(config.use_nintcheu_fata);
        assert_eq!(config.vortex_model, VortexModel::Potential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builders_do_not_touch_other_fields() {
        let config = KernelConfig::default()
            .with_far_field_factor(4.0)
            .with_quadrature_order(7);
        assert!((config.far_field_factor - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.quadrature_order, 7);
        assert!((config.core_radius - 1.0e-5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(KernelConfig::default()
            .with_quadrature_order(0)
            .validate()
            .is_err());
        assert!(KernelConfig::default()
            .with_quadrature_order(9)
            .validate()
            .is_err());
        assert!(KernelConfig::default()
            .with_far_field_factor(0.0)
            .validate()
            .is_err());
        assert!(KernelConfig::default()
            .with_core_radius(f64::NAN)
            .validate()
            .is_err());
    }
}
