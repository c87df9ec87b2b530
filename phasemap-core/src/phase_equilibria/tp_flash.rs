use super::PhaseEquilibrium;
use crate::equation_of_state::{CriticalParameters, Residual};
use crate::errors::{EosError, EosResult};
use crate::state::{Contributions, DensityInitialization, State};
use crate::{SolverOptions, Verbosity};
use ndarray::{Array1, Array2, Axis};
use num_dual::linalg::norm;
use std::sync::Arc;

const MAX_ITER_TP: usize = 400;
const TOL_TP: f64 = 1e-8;
/// Substitution steps between two extrapolations.
const SS_STEPS: usize = 5;
/// Number of ln K vectors used by the extrapolation.
const HISTORY: usize = 4;

/// Bookkeeping shared by the substitution steps of one flash.
struct Iteration {
    count: usize,
    tol: f64,
    verbosity: Verbosity,
}

/// # Flash calculations
impl<E: Residual> PhaseEquilibrium<E> {
    /// Perform a Tp-flash calculation. If no initial values are
    /// given, the solution is initialized using a stability analysis.
    ///
    /// Temperature in K, pressure in Pa and the feed in mol.
    pub fn tp_flash(
        eos: &Arc<E>,
        temperature: f64,
        pressure: f64,
        feed: &Array1<f64>,
        initial_state: Option<&PhaseEquilibrium<E>>,
        options: SolverOptions,
    ) -> EosResult<Self> {
        let feed = State::new_npt(eos, temperature, pressure, feed, DensityInitialization::None)?;
        feed.tp_flash(initial_state, options)
    }
}

/// # Flash calculations
impl<E: Residual> State<E> {
    /// Perform a Tp-flash calculation using the [State] as feed.
    /// If no initial values are given, the solution is initialized
    /// using a stability analysis.
    pub fn tp_flash(
        &self,
        initial_state: Option<&PhaseEquilibrium<E>>,
        options: SolverOptions,
    ) -> EosResult<PhaseEquilibrium<E>> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_TP, TOL_TP);
        let mut it = Iteration {
            count: 0,
            tol,
            verbosity,
        };

        let mut vle = match initial_state {
            Some(init) => init
                .clone()
                .update_pressure(self.temperature, self.pressure(Contributions::Total))?,
            None => PhaseEquilibrium::from_stability_analysis(self)?,
        };

        log_iter!(
            verbosity,
            " iter |    residual    |  phase I mole fractions  |  phase II mole fractions  "
        );
        log_iter!(verbosity, "{:-<77}", "");
        log_iter!(
            verbosity,
            " {:4} |                | {:10.8} | {:10.8}",
            0,
            vle.vapor().molefracs,
            vle.liquid().molefracs,
        );

        if vle.successive_substitution(self, 3, &mut it, None)? {
            return vle.check_trivial_solution();
        }
        self.restart_from_stable_phase(&mut vle, &mut it)?;

        vle.accelerated_successive_substitution(self, max_iter, &mut it)?;
        vle.check_trivial_solution()
    }

    /// If the initial guess left one phase with a positive tangent plane
    /// distance while the other is negative, restart from the K values
    /// of the promising phase.
    fn restart_from_stable_phase(
        &self,
        vle: &mut PhaseEquilibrium<E>,
        it: &mut Iteration,
    ) -> EosResult<()> {
        let beta = vle.vapor_phase_fraction();
        let tpd_v = self.tangent_plane_distance(vle.vapor());
        let tpd_l = self.tangent_plane_distance(vle.liquid());
        if beta * tpd_v + (1.0 - beta) * tpd_l < 0.0 {
            return Ok(());
        }

        let ln_phi = self.ln_phi();
        for (tpd, ln_k) in [
            (tpd_v, &ln_phi - &vle.vapor().ln_phi()),
            (tpd_l, vle.liquid().ln_phi() - &ln_phi),
        ] {
            if tpd < 0.0 {
                vle.update_states(self, &ln_k.mapv(f64::exp))?;
                vle.successive_substitution(self, 1, it, None)?;
            }
        }
        Ok(())
    }

    fn tangent_plane_distance(&self, trial_state: &State<E>) -> f64 {
        let z = &self.molefracs;
        let w = &trial_state.molefracs;
        let ln_ratio = w.mapv(f64::ln) - z.mapv(f64::ln) + trial_state.ln_phi() - self.ln_phi();
        (w * &ln_ratio).sum()
    }
}

/// # Flash calculations
impl<E: Residual + CriticalParameters> State<E> {
    /// Tp-flash initialized by a stability analysis that is restarted
    /// from Wilson K-factors if the substitution cannot distribute the feed
    /// on the initial phases or does not converge.
    ///
    /// If the Wilson K-factors do not split the feed either, the error of
    /// the first attempt is returned.
    pub fn tp_flash_with_restart(
        &self,
        options: SolverOptions,
    ) -> EosResult<PhaseEquilibrium<E>> {
        let error = match self.tp_flash(None, options) {
            Err(e @ (EosError::IterationFailed(_) | EosError::NotConverged(_))) => e,
            result => return result,
        };
        log_result!(
            options.verbosity,
            "Tp flash: {}, restarting from Wilson K-factors",
            error
        );
        let k = self
            .eos
            .wilson_k_factors(self.temperature, self.pressure(Contributions::Total));
        match PhaseEquilibrium::from_k_factors(self, &k) {
            Ok(init) => self.tp_flash(Some(&init), options),
            Err(_) => Err(error),
        }
    }
}

impl<E: Residual> PhaseEquilibrium<E> {
    /// Successive substitution with an extrapolation of ln K along the
    /// dominant eigenvalue after every [SS_STEPS] steps. The extrapolated
    /// K values are only accepted if they lower the Gibbs energy.
    fn accelerated_successive_substitution(
        &mut self,
        feed: &State<E>,
        max_iter: usize,
        it: &mut Iteration,
    ) -> EosResult<()> {
        let n = self.vapor().eos.components();
        for _ in 0..max_iter {
            let mut history = Array2::zeros((HISTORY, n));
            if self.successive_substitution(feed, SS_STEPS, it, Some(&mut history))? {
                log_result!(
                    it.verbosity,
                    "Tp flash: calculation converged in {} step(s)\n",
                    it.count
                );
                return Ok(());
            }

            let Some(k) = extrapolate_ln_k(&history).map(|ln_k| ln_k.mapv(f64::exp)) else {
                continue;
            };
            let gibbs = self.total_gibbs_energy();
            let mut trial = self.clone();
            if trial.update_states(feed, &k).is_ok() && trial.total_gibbs_energy() < gibbs {
                *self = trial;
            }
        }
        Err(EosError::NotConverged("Tp flash".to_owned()))
    }

    /// Perform `steps` substitution steps. Returns `true` once the
    /// fugacities of both phases agree. The last ln K vectors are stored
    /// in `history` if it is given.
    fn successive_substitution(
        &mut self,
        feed: &State<E>,
        steps: usize,
        it: &mut Iteration,
        mut history: Option<&mut Array2<f64>>,
    ) -> EosResult<bool> {
        for step in 0..steps {
            let ln_k = self.liquid().ln_phi() - self.vapor().ln_phi();
            let ln_x_over_y = (&self.liquid().molefracs / &self.vapor().molefracs)
                .mapv(|r| if r > 0.0 { r.ln() } else { 0.0 });
            let residual = norm(&(&ln_k + &ln_x_over_y));

            it.count += 1;
            log_iter!(
                it.verbosity,
                " {:4} | {:14.8e} | {:.8} | {:.8}",
                it.count,
                residual,
                self.vapor().molefracs,
                self.liquid().molefracs,
            );
            if residual < it.tol {
                return Ok(true);
            }

            self.update_states(feed, &ln_k.mapv(f64::exp))?;
            if let Some(history) = history.as_deref_mut() {
                let rows = history.nrows();
                if step + rows >= steps {
                    history
                        .index_axis_mut(Axis(0), step + rows - steps)
                        .assign(&ln_k);
                }
            }
        }
        Ok(false)
    }

    /// Distribute the feed on both phases for given K values.
    fn update_states(&mut self, feed: &State<E>, k: &Array1<f64>) -> EosResult<()> {
        let [vapor, liquid] = split_feed(feed, k, Some(self.vapor_phase_fraction()))?;
        self.update_moles(feed.pressure(Contributions::Total), [&vapor, &liquid])
    }

    /// Vapor and liquid phase obtained by distributing the feed with the
    /// given K-factors.
    pub fn from_k_factors(feed: &State<E>, k: &Array1<f64>) -> EosResult<Self> {
        let [vapor, liquid] = split_feed(feed, k, None)?;
        let (t, p) = (feed.temperature, feed.pressure(Contributions::Total));
        Ok(Self::from_states(
            State::new_npt(&feed.eos, t, p, &vapor, DensityInitialization::Vapor)?,
            State::new_npt(&feed.eos, t, p, &liquid, DensityInitialization::Liquid)?,
        ))
    }

    /// Initial phases of the flash from the stability analysis.
    ///
    /// The two candidates with the lowest tangent plane distance are used
    /// if their K-factors split the feed. Otherwise the best candidate is
    /// paired with the feed itself.
    fn from_stability_analysis(feed: &State<E>) -> EosResult<Self> {
        let mut candidates: Vec<_> = feed
            .stability_analysis(SolverOptions::default())?
            .into_iter()
            .map(|s| (feed.tangent_plane_distance(&s), s))
            .collect();
        candidates.sort_by(|(tpd1, _), (tpd2, _)| tpd1.total_cmp(tpd2));

        let mut candidates = candidates.into_iter().map(|(_, s)| s);
        let best = candidates.next().ok_or(EosError::NoPhaseSplit)?;
        if let Some(second) = candidates.next() {
            let vle = Self::from_states(best.clone(), second);
            let k = (vle.liquid().ln_phi() - vle.vapor().ln_phi()).mapv(f64::exp);
            if splits_feed(&feed.molefracs, &k) {
                return Ok(vle);
            }
        }
        Ok(Self::from_states(best, feed.clone()))
    }
}

/// Moles of the vapor and the liquid phase for given K-factors.
fn split_feed<E>(
    feed: &State<E>,
    k: &Array1<f64>,
    beta_in: Option<f64>,
) -> EosResult<[Array1<f64>; 2]> {
    let beta = rachford_rice(&feed.molefracs, k, beta_in)?;
    let denominator = 1.0 - beta + beta * k;
    Ok([
        &feed.moles * &(beta * k / &denominator),
        &feed.moles * &((1.0 - beta) / &denominator),
    ])
}

/// The Rachford-Rice equation has a solution with a vapor fraction in
/// (0, 1) if g(0) > 0 and g(1) < 0.
fn splits_feed(feed: &Array1<f64>, k: &Array1<f64>) -> bool {
    let g0 = (feed * k).sum();
    let g1 = (feed / k).iter().filter(|x| !x.is_nan()).sum::<f64>();
    g0 > 1.0 && g1 > 1.0
}

/// Dominant eigenvalue extrapolation of a sequence of ln K vectors
/// (Michelsen, 1982). Returns [None] if the extrapolation is singular.
fn extrapolate_ln_k(history: &Array2<f64>) -> Option<Array1<f64>> {
    let m = history.nrows();
    let delta: Vec<Array1<f64>> = (1..m)
        .map(|i| &history.row(i) - &history.row(i - 1))
        .collect();
    let dot = |i: usize, j: usize| delta[i].dot(&delta[j]);

    let det = dot(0, 1) * dot(0, 1) - dot(0, 0) * dot(1, 1);
    let a = (dot(0, 2) * dot(0, 1) - dot(1, 2) * dot(0, 0)) / det;
    let b = (dot(1, 2) * dot(0, 1) - dot(0, 2) * dot(1, 1)) / det;

    let ln_k = &history.row(m - 1) + &((b * &delta[1] + (a + b) * &delta[2]) / (1.0 - a - b));
    ln_k.iter().all(|v| v.is_finite()).then_some(ln_k)
}

/// Solve the Rachford-Rice equation for the vapor fraction with a
/// Newton iteration that falls back to bisection whenever a step leaves
/// the bracket of physically meaningful solutions.
fn rachford_rice(feed: &Array1<f64>, k: &Array1<f64>, beta_in: Option<f64>) -> EosResult<f64> {
    const MAX_ITER: usize = 10;
    const ABS_TOL: f64 = 1e-6;

    if !splits_feed(feed, k) {
        return Err(EosError::IterationFailed(String::from("rachford_rice")));
    }

    // tighter bounds that keep all mole fractions positive
    let (mut beta_min, mut beta_max) = k.iter().zip(feed.iter()).fold(
        (0.0f64, 1.0f64),
        |(lo, hi), (&k, &z)| match k {
            k if k > 1.0 => (lo.max((k * z - 1.0) / (k - 1.0)), hi),
            k if k < 1.0 => (lo, hi.min((1.0 - z) / (1.0 - k))),
            _ => (lo, hi),
        },
    );

    let mut beta = match beta_in {
        Some(b) if b > beta_min && b < beta_max => b,
        _ => 0.5 * (beta_min + beta_max),
    };

    for _ in 0..=MAX_ITER {
        let frac = (k - 1.0) / (1.0 - beta + beta * k);
        let g = (feed * &frac).sum();
        if g > 0.0 {
            beta_min = beta;
        } else {
            beta_max = beta;
        }

        let dg = -(feed * &frac * &frac).sum();
        let step = g / dg;
        beta -= step;
        if beta < beta_min || beta > beta_max {
            beta = 0.5 * (beta_min + beta_max);
        }
        if step.abs() < ABS_TOL {
            break;
        }
    }
    Ok(beta)
}
