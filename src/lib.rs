//! Gas and liquid mass density maps of CO2/N2 mixtures.
//!
//! Every point of a temperature/pressure grid is flashed with the
//! Peng-Robinson equation of state. The phase compositions give the molar
//! masses of the phases present which, divided by the molar volumes of the
//! corresponding density roots, yield the gas and liquid densities. The
//! grids are written as text files and rendered as heatmaps together with
//! the phase envelope of the mixture.
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod config;
mod density;
mod errors;
mod grid;
pub mod output;
#[cfg(feature = "plot")]
mod plot;
mod region;
mod solver;

pub use config::{FailurePolicy, MapConfig};
pub use density::{DensityGrids, GridPoint};
pub use errors::{MapError, MapResult};
pub use grid::GridAxes;
#[cfg(feature = "plot")]
pub use plot::render_density_map;
pub use region::PhaseRegion;
pub use solver::{CubicSolver, FlashResult, PhaseCode, PhaseSolver};

use ndarray::Array1;
use phasemap_core::{log_result, PhaseEnvelope};

/// Densities and phase envelope of a complete run.
#[derive(Clone, Debug)]
pub struct DensityMap {
    pub axes: GridAxes,
    pub grids: DensityGrids,
    pub envelope: PhaseEnvelope,
}

impl DensityMap {
    /// Evaluate the density grids and the phase envelope with any solver.
    pub fn compute<S: PhaseSolver + ?Sized>(solver: &S, config: &MapConfig) -> MapResult<Self> {
        config.validate()?;
        let axes = GridAxes::from_config(config);
        let feed = Array1::from_vec(config.composition.clone());
        let molar_masses = Array1::from_vec(config.molar_masses.clone());
        let grids = DensityGrids::compute(
            solver,
            &axes,
            &feed,
            &molar_masses,
            config.on_failure,
            config.verbosity,
        )?;
        let envelope = solver.envelope(
            &feed,
            config.envelope.initial_pressure,
            config.envelope.maximum_pressure,
        )?;
        log_result!(
            config.verbosity,
            "Phase envelope: {} points",
            envelope.len()
        );
        Ok(Self {
            axes,
            grids,
            envelope,
        })
    }

    /// Write the gas and liquid grids to the configured text files.
    pub fn write(&self, config: &MapConfig) -> MapResult<()> {
        output::write_grid(&config.output.gas_density, &self.grids.gas)?;
        output::write_grid(&config.output.liquid_density, &self.grids.liquid)?;
        Ok(())
    }

    /// Render the heatmaps if a figure path is configured.
    #[cfg(feature = "plot")]
    pub fn render(&self, config: &MapConfig) -> MapResult<()> {
        match &config.output.figure {
            Some(path) => render_density_map(path, &self.axes, &self.grids, &self.envelope),
            None => Ok(()),
        }
    }
}

/// Compute, store and plot the density map described by `config`.
pub fn run(config: &MapConfig) -> MapResult<DensityMap> {
    let solver = CubicSolver::from_config(config)?;
    let map = DensityMap::compute(&solver, config)?;
    map.write(config)?;
    #[cfg(feature = "plot")]
    map.render(config)?;
    Ok(map)
}
