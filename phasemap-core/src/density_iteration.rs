use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::State;
use crate::{REFERENCE_DENSITY, REFERENCE_PRESSURE};
use ndarray::Array1;
use std::sync::Arc;

const MAX_ITER: usize = 50;
const ABS_TOL: f64 = 1e-12;
const REL_TOL: f64 = 1e-14;
/// Largest Newton step as a fraction of the maximum density.
const MAX_STEP: f64 = 0.075;

const MAX_ITER_SPINODAL: usize = 30;
const TOL_SPINODAL: f64 = 1e-8;
const MAX_STEP_SPINODAL: f64 = 0.05;

/// Find the density at which the equation of state reproduces the given pressure.
///
/// Temperature in K, pressure in Pa, moles in mol and the initial density in mol/m³.
/// Depending on the initial density, either the vapor-like or the liquid-like root
/// of the pressure equation is found.
pub fn density_iteration<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    pressure: f64,
    moles: &Array1<f64>,
    initial_density: f64,
) -> EosResult<State<E>> {
    if initial_density <= 0.0 || !initial_density.is_finite() {
        return Err(EosError::InvalidState(
            String::from("density iteration"),
            String::from("density"),
            initial_density,
        ));
    }
    let eq = PressureEquation {
        eos,
        temperature,
        moles,
        total_moles: moles.sum(),
        max_density: eos.max_density(moles)?,
    };
    let max_density = eq.max_density;

    let mut rho = initial_density;
    for k in 0..MAX_ITER {
        let (mut p, mut dp_drho) = eq.state(rho)?.p_dpdrho();

        // a first guess inside the unstable region is moved towards
        // the root it is closer to
        if k == 0 && dp_drho.is_sign_negative() {
            rho = if initial_density <= 0.15 * max_density {
                0.05 * initial_density
            } else {
                (1.1 * initial_density).min(max_density)
            };
            (p, dp_drho) = eq.state(rho)?.p_dpdrho();
        }
        let error = p - pressure;

        if dp_drho.is_sign_negative() {
            let curvature = eq.state(rho)?.d2pdrho2().2;
            rho = eq.leave_unstable_region(rho, error, curvature, pressure, initial_density)?;
            continue;
        }

        let step = (-error / dp_drho)
            .clamp(-MAX_STEP * max_density, MAX_STEP * max_density)
            .max(-0.95 * rho);
        rho += step;
        if (error / REFERENCE_PRESSURE).abs() < ABS_TOL.max(rho / REFERENCE_DENSITY * REL_TOL) {
            return eq.state(rho);
        }
    }
    Err(EosError::NotConverged("density_iteration".to_owned()))
}

/// Pressure as a function of the density at fixed temperature and composition.
struct PressureEquation<'a, E> {
    eos: &'a Arc<E>,
    temperature: f64,
    moles: &'a Array1<f64>,
    total_moles: f64,
    max_density: f64,
}

impl<E: Residual> PressureEquation<'_, E> {
    fn state(&self, density: f64) -> EosResult<State<E>> {
        State::new_nvt(
            self.eos,
            self.temperature,
            self.total_moles / density,
            self.moles,
        )
    }

    /// New density after an iterate landed where dp/drho < 0, based on
    /// the signs of the pressure error and of the curvature and on the
    /// location of the spinodals.
    fn leave_unstable_region(
        &self,
        rho: f64,
        error: f64,
        curvature: f64,
        pressure: f64,
        initial_density: f64,
    ) -> EosResult<f64> {
        let max_density = self.max_density;

        if rho > 0.85 * max_density {
            let (p_sp, rho_sp) = self.spinodal(initial_density)?;
            let above = (p_sp - pressure).is_sign_positive();
            return match (rho_sp > 0.85 * max_density, above) {
                (true, false) => Err(EosError::IterationFailed(String::from(
                    "density_iteration",
                ))),
                (true, true) => Ok(0.98 * rho_sp),
                (false, true) => Ok(0.001 * max_density),
                (false, false) => Ok((1.1 * rho_sp).min(max_density)),
            };
        }

        match (error.is_sign_positive(), curvature.is_sign_positive()) {
            (true, true) => {
                let (p_sp, rho_sp) = self.spinodal(initial_density)?;
                Ok(if (p_sp - pressure).is_sign_positive() {
                    0.001 * max_density
                } else {
                    (1.1 * rho_sp).min(max_density)
                })
            }
            (false, false) => {
                let (p_sp, rho_sp) = self.spinodal(initial_density)?;
                Ok(if (p_sp - pressure).is_sign_negative() {
                    0.8 * max_density
                } else {
                    0.8 * rho_sp
                })
            }
            (error_positive, _) => {
                let (_, rho_l) = self.spinodal(0.8 * max_density)?;
                let (p_v, rho_v) = self.spinodal(0.001 * max_density)?;
                let vapor_side = (p_v - pressure).is_sign_positive();
                let dist_v = (initial_density - rho_v).abs();
                let dist_l = (initial_density - rho_l).abs();
                let liquid = (1.1 * rho_l).min(max_density);
                Ok(if error_positive {
                    if !vapor_side && dist_v > dist_l {
                        liquid
                    } else {
                        0.8 * rho_v
                    }
                } else if vapor_side && dist_v < dist_l {
                    0.8 * rho_v
                } else {
                    liquid
                })
            }
        }
    }

    /// Locate a spinodal (dp/drho = 0) starting from `rho_init`.
    ///
    /// Returns the pressure in Pa and the density in mol/m³ at the spinodal.
    fn spinodal(&self, rho_init: f64) -> EosResult<(f64, f64)> {
        if rho_init <= 0.0 {
            return Err(EosError::InvalidState(
                String::from("pressure spinodal"),
                String::from("density"),
                rho_init,
            ));
        }
        let max_step = MAX_STEP_SPINODAL * self.max_density;
        let mut rho = rho_init;
        for _ in 0..MAX_ITER_SPINODAL {
            let (p, dp_drho, d2p_drho2) = self.state(rho)?.d2pdrho2();
            rho += (-dp_drho / d2p_drho2)
                .clamp(-max_step, max_step)
                .max(-0.95 * rho)
                .min(self.max_density - rho);
            if (dp_drho * REFERENCE_DENSITY / REFERENCE_PRESSURE).abs() < TOL_SPINODAL {
                return Ok((p, rho));
            }
        }
        Err(EosError::NotConverged("pressure_spinodal".to_owned()))
    }
}
