use super::{DensityInitialization, State};
use crate::equation_of_state::{CriticalParameters, Residual};
use crate::errors::{EosError, EosResult};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

/// Relative density deviation below which the vapor and liquid roots are
/// considered identical.
const ROOT_REL_DEVIATION: f64 = 1e-6;

/// Coarse classification of a single phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseGuess {
    Liquid,
    Vapor,
}

impl fmt::Display for PhaseGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liquid => write!(f, "liquid"),
            Self::Vapor => write!(f, "vapor"),
        }
    }
}

impl<E: Residual + CriticalParameters> State<E> {
    /// Decide whether a single phase at the given temperature (K), pressure (Pa)
    /// and composition is vapor-like or liquid-like.
    ///
    /// If the equation of state has distinct vapor and liquid roots, the one with
    /// the lower Gibbs energy is chosen. If only one root exists, its molar volume
    /// is compared to the pseudo-critical volume of the mixture.
    pub fn guess_phase(
        eos: &Arc<E>,
        temperature: f64,
        pressure: f64,
        moles: &Array1<f64>,
    ) -> EosResult<PhaseGuess> {
        let vapor = State::new_npt(eos, temperature, pressure, moles, DensityInitialization::Vapor);
        let liquid =
            State::new_npt(eos, temperature, pressure, moles, DensityInitialization::Liquid);
        let state = match (vapor, liquid) {
            (Ok(v), Ok(l)) => {
                if (v.density - l.density).abs() > ROOT_REL_DEVIATION * l.density {
                    return Ok(
                        if v.residual_gibbs_energy() <= l.residual_gibbs_energy() {
                            PhaseGuess::Vapor
                        } else {
                            PhaseGuess::Liquid
                        },
                    );
                }
                v
            }
            (Ok(s), Err(_)) | (Err(_), Ok(s)) => s,
            (Err(_), Err(_)) => {
                return Err(EosError::UndeterminedState(format!(
                    "no density root at T = {temperature} K and p = {pressure} Pa"
                )))
            }
        };
        let v_pc = eos.pseudo_critical_volume(&state.molefracs);
        Ok(if state.molar_volume() > v_pc {
            PhaseGuess::Vapor
        } else {
            PhaseGuess::Liquid
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cubic::{PengRobinson, PengRobinsonParameters, PengRobinsonRecord};
    use crate::parameter::{Identifier, Parameter, PureRecord};
    use ndarray::arr1;

    fn co2_n2() -> EosResult<Arc<PengRobinson>> {
        let records = vec![
            PureRecord::new(
                Identifier::default(),
                44.01,
                PengRobinsonRecord::new(304.13, 7377300.0, 0.2239),
            ),
            PureRecord::new(
                Identifier::default(),
                28.02,
                PengRobinsonRecord::new(126.19, 3395800.0, 0.0372),
            ),
        ];
        let parameters = PengRobinsonParameters::new_binary(records, Some(-0.017))?;
        Ok(Arc::new(PengRobinson::new(Arc::new(parameters))))
    }

    #[test]
    fn low_pressure_is_vapor() -> EosResult<()> {
        let eos = co2_n2()?;
        let z = arr1(&[0.85, 0.15]);
        assert_eq!(State::guess_phase(&eos, 273.15, 4e6, &z)?, PhaseGuess::Vapor);
        assert_eq!(State::guess_phase(&eos, 298.15, 6e6, &z)?, PhaseGuess::Vapor);
        Ok(())
    }

    #[test]
    fn high_pressure_is_liquid() -> EosResult<()> {
        let eos = co2_n2()?;
        let z = arr1(&[0.85, 0.15]);
        assert_eq!(State::guess_phase(&eos, 263.15, 1e7, &z)?, PhaseGuess::Liquid);
        assert_eq!(State::guess_phase(&eos, 273.15, 1e7, &z)?, PhaseGuess::Liquid);
        Ok(())
    }

    #[test]
    fn pure_component_below_saturation() -> EosResult<()> {
        let parameters = PengRobinsonParameters::new_simple(&[304.13], &[7377300.0], &[0.2239])?;
        let eos = Arc::new(PengRobinson::new(Arc::new(parameters)));
        let n = arr1(&[1.0]);
        assert_eq!(State::guess_phase(&eos, 270.0, 1e6, &n)?, PhaseGuess::Vapor);
        assert_eq!(State::guess_phase(&eos, 270.0, 6e6, &n)?, PhaseGuess::Liquid);
        Ok(())
    }
}
