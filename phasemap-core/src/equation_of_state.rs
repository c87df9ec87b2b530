use crate::errors::{EosError, EosResult};
use crate::state::StateHD;
use crate::{REFERENCE_DENSITY, REFERENCE_MOLES, RGAS};
use ndarray::Array1;
use num_dual::DualNum;

/// A model for the residual Helmholtz energy of a mixture.
pub trait Residual: Send + Sync {
    /// Number of components the model was parametrized for.
    fn components(&self) -> usize;

    /// Liquid-like starting density of iterations in Å⁻³ for the given
    /// (reduced) mole numbers.
    fn compute_max_density(&self, moles: &Array1<f64>) -> f64;

    /// Named contributions to $\beta A^\mathrm{res}$.
    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy>(
        &self,
        state: &StateHD<D>,
    ) -> Vec<(&'static str, D)>;

    /// $\beta A^\mathrm{res}$ as the sum of all contributions.
    fn residual_helmholtz_energy<D: DualNum<f64> + Copy>(&self, state: &StateHD<D>) -> D {
        self.residual_helmholtz_energy_contributions(state)
            .into_iter()
            .fold(D::zero(), |total, (_, a)| total + a)
    }

    /// Check if the provided mole numbers are consistent with the
    /// equation of state.
    fn validate_moles(&self, moles: &Array1<f64>) -> EosResult<()> {
        if self.components() == moles.len() {
            Ok(())
        } else {
            Err(EosError::IncompatibleComponents(
                self.components(),
                moles.len(),
            ))
        }
    }

    /// Liquid-like starting density of iterations in mol/m³.
    fn max_density(&self, moles: &Array1<f64>) -> EosResult<f64> {
        self.validate_moles(moles)?;
        let mr = moles / REFERENCE_MOLES;
        Ok(self.compute_max_density(&mr) * REFERENCE_DENSITY)
    }
}

/// Critical properties and acentric factors of the pure components.
///
/// Used for correlations that provide initial estimates, like the Wilson
/// K-factors or the pseudo-critical volume of a mixture.
pub trait CriticalParameters {
    /// Critical temperatures in K.
    fn critical_temperature(&self) -> Array1<f64>;

    /// Critical pressures in Pa.
    fn critical_pressure(&self) -> Array1<f64>;

    /// Acentric factors.
    fn acentric_factor(&self) -> Array1<f64>;

    /// Critical compressibility factor predicted by the model.
    fn critical_compressibility(&self) -> f64;

    /// Critical molar volumes in m³/mol: $v_{c,i}=Z_c RT_{c,i}/p_{c,i}$
    fn critical_volume(&self) -> Array1<f64> {
        let zc = self.critical_compressibility();
        self.critical_temperature() * RGAS * zc / self.critical_pressure()
    }

    /// Pseudo-critical molar volume of a mixture in m³/mol (Kay's rule).
    fn pseudo_critical_volume(&self, molefracs: &Array1<f64>) -> f64 {
        (molefracs * &self.critical_volume()).sum()
    }

    /// Wilson estimate of the K-factors $K_i=y_i/x_i$.
    fn wilson_k_factors(&self, temperature: f64, pressure: f64) -> Array1<f64> {
        let tc = self.critical_temperature();
        let pc = self.critical_pressure();
        let w = self.acentric_factor();
        Array1::from_shape_fn(tc.len(), |i| {
            pc[i] / pressure * (5.373 * (1.0 + w[i]) * (1.0 - tc[i] / temperature)).exp()
        })
    }
}
