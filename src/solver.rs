//! Binding between the density map and the equation of state.
use crate::config::MapConfig;
use crate::errors::MapResult;
use phasemap_core::cubic::{PengRobinson, PengRobinsonParameters};
use phasemap_core::parameter::{IdentifierOption, Parameter};
use phasemap_core::{
    DensityInitialization, EnvelopeOptions, EosError, EosResult, PhaseEnvelope, PhaseGuess,
    SolverOptions, State,
};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

const PURE_PARAMETERS: &str = include_str!("../parameters/peng_robinson.json");
const BINARY_PARAMETERS: &str = include_str!("../parameters/peng_robinson_binary.json");

/// Phase state reported by a flash calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseCode {
    TwoPhase,
    Liquid,
    Vapor,
    /// Stable single phase that is not further classified by the flash.
    SinglePhase,
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoPhase => write!(f, "two-phase"),
            Self::Liquid => write!(f, "liquid"),
            Self::Vapor => write!(f, "vapor"),
            Self::SinglePhase => write!(f, "single phase"),
        }
    }
}

/// Result of a Tp-flash.
#[derive(Clone, Debug, PartialEq)]
pub struct FlashResult {
    pub phase: PhaseCode,
    /// Liquid mole fractions
    pub x: Array1<f64>,
    /// Vapor mole fractions
    pub y: Array1<f64>,
    /// Vapor phase fraction on a mole basis
    pub beta: f64,
}

impl FlashResult {
    /// Flash result of a feed that does not split. Both phase compositions
    /// equal the feed.
    pub fn single_phase(phase: PhaseCode, feed: &Array1<f64>) -> Self {
        Self {
            phase,
            x: feed.clone(),
            y: feed.clone(),
            beta: 0.0,
        }
    }
}

/// Thermodynamic queries needed to build a density map.
///
/// Temperatures are in K, pressures in Pa and compositions are mole fractions.
pub trait PhaseSolver: Send + Sync {
    fn flash(&self, temperature: f64, pressure: f64, feed: &Array1<f64>) -> EosResult<FlashResult>;

    /// Molar volume in m³/mol of the requested density root at the given
    /// composition. If only one root exists, it is returned for both phases.
    fn specific_volume(
        &self,
        temperature: f64,
        pressure: f64,
        molefracs: &Array1<f64>,
        phase: PhaseGuess,
    ) -> EosResult<f64>;

    fn phase_guess(
        &self,
        temperature: f64,
        pressure: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<PhaseGuess>;

    fn envelope(
        &self,
        molefracs: &Array1<f64>,
        initial_pressure: f64,
        maximum_pressure: f64,
    ) -> EosResult<PhaseEnvelope>;
}

/// [PhaseSolver] for the Peng-Robinson equation of state.
#[derive(Clone)]
pub struct CubicSolver {
    eos: Arc<PengRobinson>,
    options: SolverOptions,
}

impl CubicSolver {
    pub fn new(eos: Arc<PengRobinson>) -> Self {
        Self {
            eos,
            options: SolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the solver from the built-in CO2/N2/CH4 parameter set.
    pub fn from_builtin(
        substances: &[&str],
        identifier_option: IdentifierOption,
    ) -> MapResult<Self> {
        let parameters = PengRobinsonParameters::from_json_str(
            substances,
            PURE_PARAMETERS,
            Some(BINARY_PARAMETERS),
            identifier_option,
        )?;
        Ok(Self::new(Arc::new(PengRobinson::new(Arc::new(parameters)))))
    }

    /// Build the solver for the components of a run, reading parameter files
    /// if the configuration names any.
    pub fn from_config(config: &MapConfig) -> MapResult<Self> {
        let substances: Vec<&str> = config.components.iter().map(String::as_str).collect();
        let solver = match &config.parameters {
            Some(files) => {
                let parameters = PengRobinsonParameters::from_json(
                    substances,
                    &files.pure,
                    files.binary.as_ref(),
                    config.identifier_option,
                )?;
                Self::new(Arc::new(PengRobinson::new(Arc::new(parameters))))
            }
            None => Self::from_builtin(&substances, config.identifier_option)?,
        };
        Ok(solver.with_options(SolverOptions::new().verbosity(config.verbosity)))
    }

    pub fn eos(&self) -> &Arc<PengRobinson> {
        &self.eos
    }
}

impl PhaseSolver for CubicSolver {
    fn flash(&self, temperature: f64, pressure: f64, feed: &Array1<f64>) -> EosResult<FlashResult> {
        let state = State::new_npt(
            &self.eos,
            temperature,
            pressure,
            feed,
            DensityInitialization::None,
        )?;
        match state.tp_flash_with_restart(self.options) {
            Ok(vle) => Ok(FlashResult {
                phase: PhaseCode::TwoPhase,
                x: vle.liquid().molefracs.clone(),
                y: vle.vapor().molefracs.clone(),
                beta: vle.vapor_phase_fraction(),
            }),
            Err(EosError::NoPhaseSplit | EosError::TrivialSolution) => {
                Ok(FlashResult::single_phase(PhaseCode::SinglePhase, feed))
            }
            Err(e) => Err(e),
        }
    }

    fn specific_volume(
        &self,
        temperature: f64,
        pressure: f64,
        molefracs: &Array1<f64>,
        phase: PhaseGuess,
    ) -> EosResult<f64> {
        let density_initialization = match phase {
            PhaseGuess::Vapor => DensityInitialization::Vapor,
            PhaseGuess::Liquid => DensityInitialization::Liquid,
        };
        let state = State::new_npt(
            &self.eos,
            temperature,
            pressure,
            molefracs,
            density_initialization,
        )?;
        Ok(state.molar_volume())
    }

    fn phase_guess(
        &self,
        temperature: f64,
        pressure: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<PhaseGuess> {
        State::guess_phase(&self.eos, temperature, pressure, molefracs)
    }

    fn envelope(
        &self,
        molefracs: &Array1<f64>,
        initial_pressure: f64,
        maximum_pressure: f64,
    ) -> EosResult<PhaseEnvelope> {
        let options = EnvelopeOptions {
            initial_pressure,
            maximum_pressure,
            solver_options: self.options,
            ..Default::default()
        };
        PhaseEnvelope::trace(&self.eos, molefracs, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;
    use phasemap_core::RGAS;

    fn solver() -> MapResult<CubicSolver> {
        CubicSolver::from_builtin(&["carbon dioxide", "nitrogen"], IdentifierOption::Name)
    }

    #[test]
    fn two_phase_flash() -> MapResult<()> {
        let z = arr1(&[0.85, 0.15]);
        let flash = solver()?.flash(273.15, 6e6, &z)?;
        assert_eq!(flash.phase, PhaseCode::TwoPhase);
        assert!(flash.y[1] > flash.x[1]);
        let balance = flash.beta * &flash.y + (1.0 - flash.beta) * &flash.x;
        assert_relative_eq!(balance, z, max_relative = 1e-8);
        Ok(())
    }

    #[test]
    fn single_phase_flash() -> MapResult<()> {
        let z = arr1(&[0.85, 0.15]);
        let flash = solver()?.flash(273.15, 4e6, &z)?;
        assert_eq!(flash, FlashResult::single_phase(PhaseCode::SinglePhase, &z));
        Ok(())
    }

    #[test]
    fn specific_volume_roots() -> MapResult<()> {
        let solver = solver()?;
        let z = arr1(&[0.85, 0.15]);
        let (t, p) = (273.15, 6e6);
        let vg = solver.specific_volume(t, p, &z, PhaseGuess::Vapor)?;
        let vl = solver.specific_volume(t, p, &z, PhaseGuess::Liquid)?;
        assert_relative_eq!(vg * p / (RGAS * t), 0.4696, epsilon = 5e-3);
        assert!(vl < 0.5 * vg);

        // a single root is shared by both phases
        let (t, p) = (298.15, 6e6);
        let vg = solver.specific_volume(t, p, &z, PhaseGuess::Vapor)?;
        let vl = solver.specific_volume(t, p, &z, PhaseGuess::Liquid)?;
        assert_relative_eq!(vg, vl, max_relative = 1e-8);
        Ok(())
    }

    #[test]
    fn unknown_component() {
        assert!(CubicSolver::from_builtin(&["argon", "nitrogen"], IdentifierOption::Name).is_err());
    }
}
