use super::PhaseEquilibrium;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::{Contributions, DensityInitialization, State};
use crate::SolverOptions;
use ndarray::{Array1, Array2, Axis};
use num_dual::linalg::{smallest_ev, LU};
use std::fmt;

const X_DOMINANT: f64 = 0.99;
const MINIMIZE_TOL: f64 = 1E-06;
const MINIMIZE_KMAX: usize = 100;
const ZERO_TPD: f64 = -1E-08;
const MIN_EIGENVAL: f64 = 1E-03;
const ETA_STEP: f64 = 0.25;
const ETA_MAX_CURVATURE: f64 = 20.0;
const ETA_MAX_DESCENT: f64 = 30.0;
const MAX_STEP_RATIO: f64 = 5.0;
/// Candidates closer than this in every mole fraction are the same minimum.
const DUPLICATE_MOLEFRACS: f64 = 1E-03;

/// Initial guess for a trial phase.
#[derive(Clone, Copy)]
enum TrialPhase {
    /// Vapor with the composition of an ideal mixture in equilibrium with the feed.
    Vapor,
    /// Liquid that consists mostly of one component.
    Liquid(usize),
}

impl fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vapor => write!(f, "Vapor phase"),
            Self::Liquid(i) => write!(f, "Liquid phase {}", i + 1),
        }
    }
}

/// Result of the minimization of the tangent plane distance for one trial phase.
enum TrialResult<E> {
    /// Negative tangent plane distance.
    Unstable(State<E>),
    /// The minimum is positive.
    Stable(f64),
    /// The trial phase converged to the feed.
    Trivial,
}

/// # Stability analysis
impl<E: Residual> State<E> {
    /// Determine if the state is stable, i.e. if a phase split should
    /// occur or not.
    pub fn is_stable(&self, options: SolverOptions) -> EosResult<bool> {
        Ok(self.stability_analysis(options)?.is_empty())
    }

    /// Perform a stability analysis. The result is a list of [State]s with
    /// negative tangent plane distance (i.e. lower Gibbs energy) that can be
    /// used as initial estimates for a phase equilibrium calculation.
    ///
    /// Trial phases whose minimization fails are skipped. The analysis only
    /// fails if no trial phase could be minimized.
    pub fn stability_analysis(&self, options: SolverOptions) -> EosResult<Vec<State<E>>> {
        let n = self.eos.components();
        let trial_phases = (0..n)
            .map(TrialPhase::Liquid)
            .chain(std::iter::once(TrialPhase::Vapor));

        let mut candidates: Vec<State<E>> = Vec::new();
        let mut last_error = None;
        let mut minimized = 0;
        for phase in trial_phases {
            let Ok(trial) = self.trial_state(phase) else {
                continue;
            };
            let (result, iterations) = match self.minimize_tpd(trial, options) {
                Ok(minimum) => minimum,
                Err(e) => {
                    log_result!(options.verbosity, "{}: skipped ({})\n", phase, e);
                    last_error = Some(e);
                    continue;
                }
            };
            minimized += 1;
            let msg = match result {
                TrialResult::Unstable(state) => {
                    if candidates.iter().any(|c| same_composition(c, &state)) {
                        "Found already identified minimum".to_owned()
                    } else {
                        candidates.push(state);
                        "Found candidate".to_owned()
                    }
                }
                TrialResult::Stable(tpd) => format!("Found minimum tpd = {tpd:.3e} > 0"),
                TrialResult::Trivial => "Found trivial solution".to_owned(),
            };
            log_result!(
                options.verbosity,
                "{}: {} in {} step(s)\n",
                phase,
                msg,
                iterations
            );
        }
        match last_error {
            Some(e) if minimized == 0 => Err(e),
            _ => Ok(candidates),
        }
    }

    fn trial_state(&self, phase: TrialPhase) -> EosResult<State<E>> {
        let z = &self.molefracs;
        let (x, density_initialization) = match phase {
            TrialPhase::Vapor => {
                let x = self.ln_phi().mapv(f64::exp) * z;
                (&x / x.sum(), DensityInitialization::Vapor)
            }
            TrialPhase::Liquid(dominant) => {
                let scale = (1.0 - X_DOMINANT) / (z.sum() - z[dominant]);
                let mut x = z * scale;
                x[dominant] = X_DOMINANT;
                (x, DensityInitialization::Liquid)
            }
        };
        State::new_npt(
            &self.eos,
            self.temperature,
            self.pressure(Contributions::Total),
            &x,
            density_initialization,
        )
    }

    /// Update a trial state at the temperature and pressure of `self`.
    fn with_trial_moles(&self, trial: &State<E>, moles: &Array1<f64>) -> EosResult<State<E>> {
        State::new_npt(
            &self.eos,
            self.temperature,
            self.pressure(Contributions::Total),
            moles,
            DensityInitialization::InitialDensity(trial.density),
        )
    }

    /// Michelsen's tangent plane distance minimization: successive
    /// substitution followed by a modified Newton method if the substitution
    /// converges slowly or the tangent plane distance increases.
    fn minimize_tpd(
        &self,
        mut trial: State<E>,
        options: SolverOptions,
    ) -> EosResult<(TrialResult<E>, usize)> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MINIMIZE_KMAX, MINIMIZE_TOL);
        let d = self.molefracs.mapv(f64::ln) + self.ln_phi();
        let mut newton = false;
        let mut tpd = f64::INFINITY;
        let mut scaled_tol = tol;

        log_iter!(verbosity, " iter |    residual    |     tpd     | Newton");
        log_iter!(verbosity, "{:-<46}", "");

        for k in 1..=max_iter {
            let error = if newton {
                let (state, new_tpd, error) = self.tpd_newton_step(&trial, &d, tpd)?;
                trial = state;
                tpd = new_tpd;
                error
            } else {
                let y = (&d - &trial.ln_phi()).mapv(f64::exp);
                let y_sum = y.sum();
                let error = (&y / y_sum - &trial.molefracs).mapv(f64::abs).sum();
                let previous_tpd = tpd;
                tpd = 1.0 - y_sum;
                trial = self.with_trial_moles(&trial, &y)?;
                newton = (k > 4 && error > scaled_tol) || (k > 2 && tpd > previous_tpd + 1E-05);
                error
            };
            log_iter!(verbosity, " {:4} | {:14.8e} | {:11.8} | {}", k, error, tpd, newton);

            if PhaseEquilibrium::is_trivial_solution(self, &trial) {
                return Ok((TrialResult::Trivial, k));
            }

            // deep minima do not need to be resolved accurately
            scaled_tol = scaled_tol.max(match tpd {
                t if t < -1E-01 && k > 5 => tol * 1E03,
                t if t < -1E-01 => tol * 1E02,
                t if t < -1E-02 => tol * 1E01,
                _ => tol,
            });
            if error < scaled_tol {
                let result = if tpd < ZERO_TPD {
                    TrialResult::Unstable(trial)
                } else {
                    TrialResult::Stable(tpd)
                };
                return Ok((result, k));
            }
        }
        Err(EosError::NotConverged(String::from("stability analysis")))
    }

    /// Newton step in the variables 2√Y. The Hessian is shifted by a multiple
    /// of the identity until it is positive definite, the step is bounded and
    /// the tangent plane distance decreases.
    fn tpd_newton_step(
        &self,
        trial: &State<E>,
        d: &Array1<f64>,
        tpd_old: f64,
    ) -> EosResult<(State<E>, f64, f64)> {
        let n = self.eos.components();
        let ln_phi = trial.ln_phi();
        let y = &trial.moles;
        let safe_ln = |y: &Array1<f64>| y.mapv(|y| if y > f64::EPSILON { y.ln() } else { 0.0 });
        let sq_y = y.mapv(f64::sqrt);
        let residual = &safe_ln(y) + &ln_phi - d;
        let gradient = &residual * &sq_y;

        let mut hesse = trial.dln_phi_dnj();
        for (i, mut row) in hesse.axis_iter_mut(Axis(0)).enumerate() {
            row *= &(sq_y[i] * &sq_y);
            if y[i] > f64::EPSILON {
                row[i] += residual[i];
            }
        }

        let mut eta = 1.0;
        loop {
            let shifted = &hesse + &(eta * &Array2::<f64>::eye(n));
            let (min_eigenval, _) = smallest_ev(shifted.clone());
            if min_eigenval < MIN_EIGENVAL && eta < ETA_MAX_CURVATURE {
                eta += 2.0 * ETA_STEP;
                continue;
            }

            let delta = LU::new(shifted)?.solve(&gradient);
            let too_large = delta
                .iter()
                .zip(y.iter())
                .any(|(dy, y)| (0.5 * dy).powi(2) / y > MAX_STEP_RATIO);
            if too_large {
                eta += 2.0 * ETA_STEP;
                continue;
            }

            let y_new = (&sq_y - &(0.5 * &delta)).mapv(|v| v * v);
            let tpd = 1.0 + (&y_new * &(&safe_ln(&y_new) + &ln_phi - d - 1.0)).sum();
            if tpd > tpd_old && eta < ETA_MAX_DESCENT {
                eta += ETA_STEP;
                continue;
            }

            let state = self.with_trial_moles(trial, &y_new)?;
            return Ok((state, tpd, gradient.mapv(f64::abs).sum()));
        }
    }
}

fn same_composition<E>(state1: &State<E>, state2: &State<E>) -> bool {
    state1
        .molefracs
        .iter()
        .zip(state2.molefracs.iter())
        .all(|(x1, x2)| (x1 - x2).abs() < DUPLICATE_MOLEFRACS)
}
