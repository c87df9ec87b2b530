use crate::config::FailurePolicy;
use crate::errors::{MapError, MapResult};
use crate::grid::GridAxes;
use crate::region::PhaseRegion;
use crate::solver::PhaseSolver;
use ndarray::{Array1, Array2};
use phasemap_core::{log_iter, log_result, EosResult, PhaseGuess, Verbosity};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Densities at a single grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPoint {
    pub region: PhaseRegion,
    /// Gas density in kg/m³
    pub gas_density: f64,
    /// Liquid density in kg/m³
    pub liquid_density: f64,
}

impl GridPoint {
    /// Evaluate the gas and liquid mass densities at one temperature (K)
    /// and pressure (Pa).
    ///
    /// Both molar volumes are evaluated at the feed composition; the
    /// density of an absent phase is zero.
    pub fn evaluate<S: PhaseSolver + ?Sized>(
        solver: &S,
        temperature: f64,
        pressure: f64,
        feed: &Array1<f64>,
        molar_masses: &Array1<f64>,
    ) -> EosResult<Self> {
        let flash = solver.flash(temperature, pressure, feed)?;
        let vg = solver.specific_volume(temperature, pressure, feed, PhaseGuess::Vapor)?;
        let vl = solver.specific_volume(temperature, pressure, feed, PhaseGuess::Liquid)?;
        let region = PhaseRegion::classify(solver, temperature, pressure, feed, &flash)?;
        let (mg, ml) = region.phase_molar_masses(&flash, feed, molar_masses);

        // g/mol / m³/mol -> kg/m³
        Ok(Self {
            region,
            gas_density: mg / vg / 1e3,
            liquid_density: ml / vl / 1e3,
        })
    }
}

/// Gas and liquid mass densities in kg/m³ on a (temperature, pressure) grid.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityGrids {
    pub gas: Array2<f64>,
    pub liquid: Array2<f64>,
}

impl DensityGrids {
    /// Evaluate every point of the grid.
    ///
    /// With [FailurePolicy::Abort] the first failing point is returned as
    /// an error, with [FailurePolicy::Nan] it is stored as NaN in both grids.
    pub fn compute<S: PhaseSolver + ?Sized>(
        solver: &S,
        axes: &GridAxes,
        feed: &Array1<f64>,
        molar_masses: &Array1<f64>,
        policy: FailurePolicy,
        verbosity: Verbosity,
    ) -> MapResult<Self> {
        let (nt, np) = axes.shape();
        log_result!(
            verbosity,
            "Density map: {} temperatures x {} pressures",
            nt,
            np
        );

        let row = |(i, &t): (usize, &f64)| -> MapResult<Vec<(f64, f64)>> {
            let points = axes
                .pressures
                .iter()
                .map(|&p| Self::evaluate_cell(solver, t, p, feed, molar_masses, policy))
                .collect::<MapResult<Vec<_>>>()?;
            log_iter!(verbosity, " {:4} | T = {:8.3} K | done", i, t);
            Ok(points)
        };

        #[cfg(feature = "rayon")]
        let rows = axes
            .temperatures
            .as_slice()
            .ok_or_else(|| MapError::InvalidConfig("non-contiguous temperature axis".to_owned()))?
            .par_iter()
            .enumerate()
            .map(row)
            .collect::<MapResult<Vec<_>>>()?;
        #[cfg(not(feature = "rayon"))]
        let rows = axes
            .temperatures
            .iter()
            .enumerate()
            .map(row)
            .collect::<MapResult<Vec<_>>>()?;

        let mut grids = Self {
            gas: Array2::zeros((nt, np)),
            liquid: Array2::zeros((nt, np)),
        };
        for (i, points) in rows.into_iter().enumerate() {
            for (j, (gas, liquid)) in points.into_iter().enumerate() {
                grids.gas[(i, j)] = gas;
                grids.liquid[(i, j)] = liquid;
            }
        }

        let failed = grids.gas.iter().filter(|rho| rho.is_nan()).count();
        log_result!(
            verbosity,
            "Density map: {} points evaluated, {} failed",
            nt * np,
            failed
        );
        Ok(grids)
    }

    fn evaluate_cell<S: PhaseSolver + ?Sized>(
        solver: &S,
        temperature: f64,
        pressure: f64,
        feed: &Array1<f64>,
        molar_masses: &Array1<f64>,
        policy: FailurePolicy,
    ) -> MapResult<(f64, f64)> {
        match GridPoint::evaluate(solver, temperature, pressure, feed, molar_masses) {
            Ok(point) => Ok((point.gas_density, point.liquid_density)),
            Err(source) => match policy {
                FailurePolicy::Abort => Err(MapError::PointFailed {
                    temperature,
                    pressure,
                    source,
                }),
                FailurePolicy::Nan => Ok((f64::NAN, f64::NAN)),
            },
        }
    }

    /// Shape (n_T, n_p) of both grids.
    pub fn shape(&self) -> (usize, usize) {
        self.gas.dim()
    }
}
