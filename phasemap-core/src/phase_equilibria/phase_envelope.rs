use super::SolverOptions;
use crate::equation_of_state::{CriticalParameters, Residual};
use crate::errors::{EosError, EosResult};
use crate::state::{DensityInitialization, State};
use ndarray::{s, Array1, Array2};
use num_dual::linalg::LU;
use std::sync::Arc;

const MAX_ITER_ENVELOPE: usize = 30;
const TOL_ENVELOPE: f64 = 1e-10;
const TRIVIAL_LN_K: f64 = 1e-8;
const FAST_CONVERGENCE: usize = 3;
const STEP_INCREASE: f64 = 1.5;

/// Settings for the continuation of the phase envelope.
#[derive(Clone, Copy, Debug)]
pub struct EnvelopeOptions {
    /// Pressure of the first (dew) point in Pa.
    pub initial_pressure: f64,
    /// Tracing stops once this pressure in Pa is exceeded.
    pub maximum_pressure: f64,
    /// Tracing stops below this temperature in K.
    pub min_temperature: Option<f64>,
    /// Step size in the specified logarithmic variable.
    pub initial_step: f64,
    pub max_step: f64,
    pub min_step: f64,
    pub max_points: usize,
    /// Options for the Newton iterations at every point.
    pub solver_options: SolverOptions,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        Self {
            initial_pressure: 1e4,
            maximum_pressure: 1.5e7,
            min_temperature: None,
            initial_step: 0.1,
            max_step: 0.2,
            min_step: 1e-4,
            max_points: 500,
            solver_options: SolverOptions::default(),
        }
    }
}

/// A converged point on the phase envelope.
#[derive(Clone, Debug)]
pub struct PhaseEnvelopePoint {
    /// Temperature in K
    pub temperature: f64,
    /// Pressure in Pa
    pub pressure: f64,
    /// Logarithm of the ratio between feed and incipient phase mole fractions
    pub ln_k: Array1<f64>,
    /// Composition of the incipient phase
    pub incipient_molefracs: Array1<f64>,
}

/// The two-phase boundary of a mixture with fixed composition.
///
/// Starts on the dew point branch and, after passing the critical point,
/// continues on the bubble point branch.
#[derive(Clone, Debug)]
pub struct PhaseEnvelope {
    pub points: Vec<PhaseEnvelopePoint>,
}

impl PhaseEnvelope {
    pub fn temperatures(&self) -> Array1<f64> {
        self.points.iter().map(|p| p.temperature).collect()
    }

    pub fn pressures(&self) -> Array1<f64> {
        self.points.iter().map(|p| p.pressure).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Estimate of the critical point (temperature, pressure) by linear
    /// interpolation in the first K-factor between the points that enclose
    /// its change of sign.
    pub fn critical_point(&self) -> Option<(f64, f64)> {
        self.points.windows(2).find_map(|w| {
            let (k0, k1) = (w[0].ln_k[0], w[1].ln_k[0]);
            (k0 * k1 <= 0.0 && k0 != k1).then(|| {
                let f = k0 / (k0 - k1);
                (
                    w[0].temperature + f * (w[1].temperature - w[0].temperature),
                    (w[0].pressure.ln() + f * (w[1].pressure.ln() - w[0].pressure.ln())).exp(),
                )
            })
        })
    }
}

/// Saturation equations in the variables (ln K, ln T, ln p).
///
/// The feed phase has the composition `z`, the incipient phase the
/// (unnormalized) mole numbers z/K.
struct SaturationSystem<'a, E> {
    eos: &'a Arc<E>,
    z: &'a Array1<f64>,
}

impl<'a, E: Residual> SaturationSystem<'a, E> {
    fn components(&self) -> usize {
        self.z.len()
    }

    fn incipient_moles(&self, x: &Array1<f64>) -> Array1<f64> {
        let n = self.components();
        self.z / &x.slice(s![..n]).mapv(f64::exp)
    }

    /// Residual and Jacobian. The last row fixes `x[spec] = target`.
    fn evaluate(
        &self,
        x: &Array1<f64>,
        spec: usize,
        target: f64,
        swapped: bool,
    ) -> EosResult<(Array1<f64>, Array2<f64>)> {
        let n = self.components();
        let (t, p) = (x[n].exp(), x[n + 1].exp());
        let w = self.incipient_moles(x);
        let (feed_init, incipient_init) = if swapped {
            (DensityInitialization::Liquid, DensityInitialization::Vapor)
        } else {
            (DensityInitialization::Vapor, DensityInitialization::Liquid)
        };
        let feed = State::new_npt(self.eos, t, p, self.z, feed_init)?;
        let incipient = State::new_npt(self.eos, t, p, &w, incipient_init)?;

        let ln_phi_feed = feed.ln_phi();
        let ln_phi_incipient = incipient.ln_phi();
        let dln_phi_dnj = incipient.dln_phi_dnj();
        let dln_phi_dt = feed.dln_phi_dt() - incipient.dln_phi_dt();
        let dln_phi_dp = feed.dln_phi_dp() - incipient.dln_phi_dp();

        let mut f = Array1::zeros(n + 2);
        let mut jac = Array2::zeros((n + 2, n + 2));
        for i in 0..n {
            f[i] = x[i] + ln_phi_feed[i] - ln_phi_incipient[i];
            for j in 0..n {
                jac[[i, j]] = w[j] * dln_phi_dnj[[i, j]];
            }
            jac[[i, i]] += 1.0;
            jac[[i, n]] = t * dln_phi_dt[i];
            jac[[i, n + 1]] = p * dln_phi_dp[i];
            jac[[n, i]] = -w[i];
        }
        f[n] = w.sum() - 1.0;
        f[n + 1] = x[spec] - target;
        jac[[n + 1, spec]] = 1.0;
        Ok((f, jac))
    }

    fn newton(
        &self,
        mut x: Array1<f64>,
        spec: usize,
        swapped: bool,
        options: SolverOptions,
    ) -> EosResult<(Array1<f64>, usize)> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_ENVELOPE, TOL_ENVELOPE);
        let n = self.components();
        let target = x[spec];
        for i in 0..max_iter {
            let (f, jac) = self.evaluate(&x, spec, target, swapped)?;
            let dx = LU::new(jac)?.solve(&f);
            x -= &dx;
            if !x.iter().all(|x| x.is_finite()) {
                return Err(EosError::IterationFailed(String::from("phase envelope")));
            }
            let error = dx.iter().fold(0.0, |acc: f64, d| acc.max(d.abs()));
            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:10.5} K | {:12.5} Pa",
                i,
                error,
                x[n].exp(),
                x[n + 1].exp()
            );
            if error < tol {
                if x.slice(s![..n]).iter().all(|k| k.abs() < TRIVIAL_LN_K) {
                    return Err(EosError::TrivialSolution);
                }
                return Ok((x, i));
            }
        }
        Err(EosError::NotConverged(String::from("phase envelope")))
    }

    /// Sensitivity of all variables with respect to the specified one.
    fn sensitivity(&self, x: &Array1<f64>, spec: usize, swapped: bool) -> EosResult<Array1<f64>> {
        let n = self.components();
        let (_, jac) = self.evaluate(x, spec, x[spec], swapped)?;
        let mut rhs = Array1::zeros(n + 2);
        rhs[n + 1] = 1.0;
        Ok(LU::new(jac)?.solve(&rhs))
    }

    fn point(&self, x: &Array1<f64>) -> PhaseEnvelopePoint {
        let n = self.components();
        let w = self.incipient_moles(x);
        PhaseEnvelopePoint {
            temperature: x[n].exp(),
            pressure: x[n + 1].exp(),
            ln_k: x.slice(s![..n]).to_owned(),
            incipient_molefracs: &w / w.sum(),
        }
    }
}

/// The ln K of all components change their sign at the critical point.
fn passes_critical_point(x: &Array1<f64>, x_new: &Array1<f64>) -> bool {
    x[0].signum() != x_new[0].signum()
}

/// Temperature at which the Wilson K-factors put the mixture on its dew point.
fn wilson_dew_temperature<E: CriticalParameters>(
    eos: &E,
    z: &Array1<f64>,
    pressure: f64,
) -> EosResult<f64> {
    let g = |t: f64| (z / &eos.wilson_k_factors(t, pressure)).sum() - 1.0;
    let tc_max = eos.critical_temperature().fold(0.0, |acc: f64, &t| acc.max(t));
    let (mut lo, mut hi) = (0.1 * tc_max, 5.0 * tc_max);
    if !(g(lo) > 0.0 && g(hi) < 0.0) {
        return Err(EosError::NotConverged(String::from(
            "Wilson dew point temperature",
        )));
    }
    while hi - lo > 1e-10 * hi {
        let t = 0.5 * (lo + hi);
        if g(t) > 0.0 {
            lo = t;
        } else {
            hi = t;
        }
    }
    Ok(0.5 * (lo + hi))
}

impl PhaseEnvelope {
    /// Trace the phase envelope of a mixture with the given mole fractions.
    ///
    /// The continuation starts at the dew point at `options.initial_pressure`
    /// and follows the two-phase boundary through the critical point until the
    /// pressure leaves the range between the initial and the maximum pressure.
    pub fn trace<E: Residual + CriticalParameters>(
        eos: &Arc<E>,
        molefracs: &Array1<f64>,
        options: EnvelopeOptions,
    ) -> EosResult<Self> {
        eos.validate_moles(molefracs)?;
        let z = molefracs / molefracs.sum();
        let n = z.len();
        let verbosity = options.solver_options.verbosity;
        let system = SaturationSystem { eos, z: &z };

        // initial dew point with specified pressure
        let p0 = options.initial_pressure;
        let t0 = wilson_dew_temperature(eos.as_ref(), &z, p0)?;
        let mut x = Array1::zeros(n + 2);
        x.slice_mut(s![..n])
            .assign(&eos.wilson_k_factors(t0, p0).mapv(f64::ln));
        x[n] = t0.ln();
        x[n + 1] = p0.ln();
        let mut spec = n + 1;
        let mut swapped = false;
        let (mut x, _) = system.newton(x, spec, swapped, options.solver_options)?;
        log_result!(
            verbosity,
            "Phase envelope: dew point at {:.5} K and {:.5} Pa",
            x[n].exp(),
            x[n + 1].exp()
        );

        let mut points = vec![system.point(&x)];
        let mut previous: Option<Array1<f64>> = None;
        let mut ds = options.initial_step;

        'trace: while points.len() < options.max_points {
            // fix the most sensitive variable in the next step
            let mut dxds = system.sensitivity(&x, spec, swapped)?;
            let new_spec = (0..n + 2)
                .max_by(|&i, &j| dxds[i].abs().total_cmp(&dxds[j].abs()))
                .unwrap_or(n + 1);
            if new_spec != spec {
                spec = new_spec;
                dxds = system.sensitivity(&x, spec, swapped)?;
            }

            // continue in the direction of the last step
            let direction = match &previous {
                Some(prev) => (&x - prev).dot(&dxds).signum(),
                None => dxds[n + 1].signum(),
            };

            let (x_new, iterations) = loop {
                let x_pred = &x + &(&dxds * (direction * ds));
                let predicted = passes_critical_point(&x, &x_pred);
                match system.newton(
                    x_pred,
                    spec,
                    swapped ^ predicted,
                    options.solver_options,
                ) {
                    Ok(result) => break result,
                    Err(_) => {
                        ds *= 0.5;
                        if ds < options.min_step {
                            log_result!(
                                verbosity,
                                "Phase envelope: step size below {} after {} points",
                                options.min_step,
                                points.len()
                            );
                            break 'trace;
                        }
                    }
                }
            };
            if passes_critical_point(&x, &x_new) {
                swapped = !swapped;
                log_result!(
                    verbosity,
                    "Phase envelope: passed the critical point near {:.5} K and {:.5} Pa",
                    x_new[n].exp(),
                    x_new[n + 1].exp()
                );
            }

            let (t, p) = (x_new[n].exp(), x_new[n + 1].exp());
            if p > options.maximum_pressure
                || p < options.initial_pressure
                || options.min_temperature.map_or(false, |t_min| t < t_min)
            {
                break;
            }
            points.push(system.point(&x_new));
            previous = Some(std::mem::replace(&mut x, x_new));
            if iterations < FAST_CONVERGENCE {
                ds = (ds * STEP_INCREASE).min(options.max_step);
            }
        }
        log_result!(verbosity, "Phase envelope: {} points", points.len());
        Ok(Self { points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cubic::{PengRobinson, PengRobinsonParameters};
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn wilson_dew_point_of_pure_component() -> EosResult<()> {
        let parameters = PengRobinsonParameters::new_simple(&[304.13], &[7377300.0], &[0.2239])?;
        let eos = PengRobinson::new(Arc::new(parameters));
        let z = arr1(&[1.0]);
        let t = wilson_dew_temperature(&eos, &z, 1e5)?;
        assert_relative_eq!(eos.wilson_k_factors(t, 1e5)[0], 1.0, max_relative = 1e-8);
        Ok(())
    }

    #[test]
    fn critical_point_from_converged_step() {
        let x = arr1(&[-0.02, 0.03, 5.6, 15.9]);
        // a predictor beyond the critical point that converges back
        let predicted = arr1(&[0.01, -0.01, 5.61, 15.95]);
        let converged = arr1(&[-0.005, 0.008, 5.61, 15.95]);
        assert!(passes_critical_point(&x, &predicted));
        assert!(!passes_critical_point(&x, &converged));
        assert!(passes_critical_point(&x, &-&x));
    }

    #[test]
    fn critical_point_interpolation() {
        let point = |t: f64, p: f64, k: f64| PhaseEnvelopePoint {
            temperature: t,
            pressure: p,
            ln_k: arr1(&[k, -k]),
            incipient_molefracs: arr1(&[0.5, 0.5]),
        };
        let envelope = PhaseEnvelope {
            points: vec![
                point(280.0, 5e6, -0.2),
                point(290.0, 8e6, -0.1),
                point(292.0, 9e6, 0.1),
            ],
        };
        let (t, p) = envelope.critical_point().unwrap();
        assert_relative_eq!(t, 291.0, max_relative = 1e-12);
        assert_relative_eq!(p, (8e6f64 * 9e6).sqrt(), max_relative = 1e-12);
        assert_eq!(envelope.temperatures().len(), 3);
    }
}
