use crate::solver::{FlashResult, PhaseCode, PhaseSolver};
use ndarray::Array1;
use phasemap_core::{EosResult, PhaseGuess};
use std::fmt;

/// Phases present at a grid point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseRegion {
    VaporOnly,
    LiquidOnly,
    TwoPhase,
}

impl fmt::Display for PhaseRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VaporOnly => write!(f, "vapor"),
            Self::LiquidOnly => write!(f, "liquid"),
            Self::TwoPhase => write!(f, "two-phase"),
        }
    }
}

impl From<PhaseGuess> for PhaseRegion {
    fn from(guess: PhaseGuess) -> Self {
        match guess {
            PhaseGuess::Vapor => Self::VaporOnly,
            PhaseGuess::Liquid => Self::LiquidOnly,
        }
    }
}

impl PhaseRegion {
    /// Classify a grid point from its flash result.
    ///
    /// The phase guess of the solver is only consulted if the flash reports
    /// an unclassified single phase.
    pub fn classify<S: PhaseSolver + ?Sized>(
        solver: &S,
        temperature: f64,
        pressure: f64,
        feed: &Array1<f64>,
        flash: &FlashResult,
    ) -> EosResult<Self> {
        Ok(match flash.phase {
            PhaseCode::TwoPhase => Self::TwoPhase,
            PhaseCode::Vapor => Self::VaporOnly,
            PhaseCode::Liquid => Self::LiquidOnly,
            PhaseCode::SinglePhase => solver.phase_guess(temperature, pressure, feed)?.into(),
        })
    }

    /// Molar masses (gas, liquid) in g/mol of the phases in this region.
    ///
    /// An absent phase has a molar mass of exactly zero. A vapor-only point
    /// uses the feed composition while a liquid-only point uses the liquid
    /// composition reported by the flash.
    pub fn phase_molar_masses(
        &self,
        flash: &FlashResult,
        feed: &Array1<f64>,
        molar_masses: &Array1<f64>,
    ) -> (f64, f64) {
        match self {
            Self::VaporOnly => (feed.dot(molar_masses), 0.0),
            Self::LiquidOnly => (0.0, flash.x.dot(molar_masses)),
            Self::TwoPhase => (flash.y.dot(molar_masses), flash.x.dot(molar_masses)),
        }
    }
}
