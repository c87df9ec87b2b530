use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::{DensityInitialization, State};
use crate::RGAS;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

mod phase_envelope;
mod stability_analysis;
mod tp_flash;
pub use phase_envelope::{EnvelopeOptions, PhaseEnvelope, PhaseEnvelopePoint};

/// How much a solver reports about its progress.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Silent.
    #[default]
    None,
    /// One line once the solver is done.
    Result,
    /// One line per iteration.
    Iter,
}

/// Iteration limits and output of a solver. Unset limits fall back to
/// the defaults of the individual solver.
#[derive(Copy, Clone, Debug, Default)]
pub struct SolverOptions {
    pub max_iter: Option<usize>,
    pub tol: Option<f64>,
    pub verbosity: Verbosity,
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }

    pub fn tol(self, tol: f64) -> Self {
        Self {
            tol: Some(tol),
            ..self
        }
    }

    pub fn verbosity(self, verbosity: Verbosity) -> Self {
        Self { verbosity, ..self }
    }

    /// Resolve the options against solver specific defaults.
    pub fn unwrap_or(self, max_iter: usize, tol: f64) -> (usize, f64, Verbosity) {
        (
            self.max_iter.unwrap_or(max_iter),
            self.tol.unwrap_or(tol),
            self.verbosity,
        )
    }
}

/// Two coexisting phases at the same temperature and pressure,
/// stored as `[vapor, liquid]` where the vapor is the less dense phase.
#[derive(Debug)]
pub struct PhaseEquilibrium<E>([State<E>; 2]);

impl<E> Clone for PhaseEquilibrium<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E: Residual> fmt::Display for PhaseEquilibrium<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "vapor:  {}", self.vapor())?;
        writeln!(f, "liquid: {}", self.liquid())
    }
}

impl<E> PhaseEquilibrium<E> {
    pub fn vapor(&self) -> &State<E> {
        &self.0[0]
    }

    pub fn liquid(&self) -> &State<E> {
        &self.0[1]
    }
}

impl<E: Residual> PhaseEquilibrium<E> {
    pub(super) fn from_states(state1: State<E>, state2: State<E>) -> Self {
        if state1.density < state2.density {
            Self([state1, state2])
        } else {
            Self([state2, state1])
        }
    }

    /// Fraction of the total moles in the vapor phase.
    pub fn vapor_phase_fraction(&self) -> f64 {
        let [vapor, liquid] = &self.0;
        vapor.total_moles / (vapor.total_moles + liquid.total_moles)
    }

    /// Recompute both phases at a new temperature and pressure, starting
    /// from their current densities.
    pub(super) fn update_pressure(mut self, temperature: f64, pressure: f64) -> EosResult<Self> {
        for s in self.0.iter_mut() {
            *s = s.at(temperature, pressure, &s.moles)?;
        }
        Ok(self)
    }

    /// Recompute both phases with new mole numbers `[vapor, liquid]`.
    pub(super) fn update_moles(&mut self, pressure: f64, moles: [&Array1<f64>; 2]) -> EosResult<()> {
        for (s, n) in self.0.iter_mut().zip(moles) {
            *s = s.at(s.temperature, pressure, n)?;
        }
        Ok(())
    }

    /// Gibbs energy of both phases in J, relative to the ideal gas
    /// of the pure components at the same temperature and pressure.
    pub(super) fn total_gibbs_energy(&self) -> f64 {
        self.0
            .iter()
            .map(|s| {
                let ln_x = s.molefracs.mapv(|x| if x > 0.0 { x.ln() } else { 0.0 });
                (&s.moles * &(ln_x + s.ln_phi())).sum() * RGAS * s.temperature
            })
            .sum()
    }
}

impl<E: Residual> State<E> {
    /// The state at another temperature, pressure and composition,
    /// found by a density iteration starting from the current density.
    fn at(&self, temperature: f64, pressure: f64, moles: &Array1<f64>) -> EosResult<Self> {
        State::new_npt(
            &self.eos,
            temperature,
            pressure,
            moles,
            DensityInitialization::InitialDensity(self.density),
        )
    }
}

/// Largest relative deviation of the partial densities for which two
/// states are considered identical.
const TRIVIAL_REL_DEVIATION: f64 = 1e-5;

impl<E: Residual> PhaseEquilibrium<E> {
    pub(super) fn check_trivial_solution(self) -> EosResult<Self> {
        if Self::is_trivial_solution(self.vapor(), self.liquid()) {
            Err(EosError::TrivialSolution)
        } else {
            Ok(self)
        }
    }

    /// Check if the two states form a trivial solution
    pub fn is_trivial_solution(state1: &State<E>, state2: &State<E>) -> bool {
        state1
            .partial_density
            .iter()
            .zip(state2.partial_density.iter())
            .map(|(&rho1, &rho2)| (rho2 / rho1 - 1.0).abs())
            .fold(0.0, f64::max)
            < TRIVIAL_REL_DEVIATION
    }
}
