#![warn(clippy::all)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]

/// Print messages with level `Verbosity::Iter` or higher.
#[macro_export]
macro_rules! log_iter {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Iter {
            println!($($arg)*);
        }
    }
}

/// Print messages with level `Verbosity::Result` or higher.
#[macro_export]
macro_rules! log_result {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Result {
            println!($($arg)*);
        }
    }
}

pub mod cubic;
mod density_iteration;
mod equation_of_state;
mod errors;
pub mod parameter;
mod phase_equilibria;
mod state;
pub use equation_of_state::{CriticalParameters, Residual};
pub use errors::{EosError, EosResult};
pub use phase_equilibria::{
    EnvelopeOptions, PhaseEnvelope, PhaseEnvelopePoint, PhaseEquilibrium, SolverOptions, Verbosity,
};
pub use state::{Contributions, DensityInitialization, Derivative, PhaseGuess, State, StateHD};

/// Boltzmann constant in J/K
pub const KB: f64 = 1.380649e-23;
/// Avogadro constant in 1/mol
pub const NAV: f64 = 6.02214076e23;
/// Ideal gas constant in J/(mol K)
pub const RGAS: f64 = KB * NAV;

/// Volume of one cubic Angstrom in m³. Helmholtz energies are evaluated with
/// volumes in units of Angstrom³ and moles as number of molecules.
pub const REFERENCE_VOLUME: f64 = 1e-30;
/// Reference moles in mol.
pub const REFERENCE_MOLES: f64 = 1.0 / NAV;
/// Reference density in mol/m³.
pub const REFERENCE_DENSITY: f64 = REFERENCE_MOLES / REFERENCE_VOLUME;
/// Reference pressure in Pa.
pub const REFERENCE_PRESSURE: f64 = KB / REFERENCE_VOLUME;
