//! The Peng-Robinson equation of state.
//!
//! The residual Helmholtz energy is written in terms of the temperature,
//! the volume and the mole numbers so that every partial derivative needed
//! by states and phase equilibria follows from dual numbers. Mixtures use
//! the van der Waals one-fluid mixing rules with a binary interaction
//! parameter $k_{ij}$ in the attractive term.
use crate::equation_of_state::{CriticalParameters, Residual};
use crate::parameter::{Parameter, ParameterError, PureRecord};
use crate::state::StateHD;
use crate::REFERENCE_PRESSURE;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;
use std::fmt;
use std::sync::Arc;

/// Critical compressibility factor of the Peng-Robinson equation of state.
pub const PR_CRITICAL_COMPRESSIBILITY: f64 = 0.3074;
const OMEGA_A: f64 = 0.45724;
const OMEGA_B: f64 = 0.07780;
/// Largest packing b·ρ used as the liquid starting point of density iterations.
const MAX_PACKING: f64 = 0.9;

/// Critical point and acentric factor of a pure substance.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PengRobinsonRecord {
    /// K
    pub tc: f64,
    /// Pa
    pub pc: f64,
    pub acentric_factor: f64,
}

impl PengRobinsonRecord {
    pub fn new(tc: f64, pc: f64, acentric_factor: f64) -> Self {
        Self {
            tc,
            pc,
            acentric_factor,
        }
    }
}

impl fmt::Display for PengRobinsonRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PengRobinsonRecord(tc={} K, pc={} Pa, acentric_factor={})",
            self.tc, self.pc, self.acentric_factor
        )
    }
}

/// Component parameters of the Peng-Robinson equation of state in
/// reduced units (K, Å³ per molecule).
pub struct PengRobinsonParameters {
    tc: Array1<f64>,
    pc: Array1<f64>,
    acentric_factor: Array1<f64>,
    /// attraction parameter at the critical temperature
    a: Array1<f64>,
    /// co-volume
    b: Array1<f64>,
    k_ij: Array2<f64>,
    /// slope of the α function
    kappa: Array1<f64>,
}

impl PengRobinsonParameters {
    /// Parameters from plain arrays, without binary interaction parameters.
    pub fn new_simple(
        tc: &[f64],
        pc: &[f64],
        acentric_factor: &[f64],
    ) -> Result<Self, ParameterError> {
        let n = tc.len();
        if pc.len() != n || acentric_factor.len() != n {
            return Err(ParameterError::IncompatibleParameters(format!(
                "expected {n} values of every parameter"
            )));
        }
        Self::from_arrays(
            Array1::from_vec(tc.to_vec()),
            Array1::from_vec(pc.to_vec()),
            Array1::from_vec(acentric_factor.to_vec()),
            Array2::zeros((n, n)),
        )
    }

    fn from_arrays(
        tc: Array1<f64>,
        pc: Array1<f64>,
        acentric_factor: Array1<f64>,
        k_ij: Array2<f64>,
    ) -> Result<Self, ParameterError> {
        let n = tc.len();
        if n == 0 {
            return Err(ParameterError::InsufficientInformation);
        }
        if let Some(i) = (0..n).position(|i| tc[i] <= 0.0 || pc[i] <= 0.0) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "component {i} needs a positive critical temperature and pressure"
            )));
        }
        if k_ij.dim() != (n, n) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "binary interaction matrix of shape {:?} for {n} components",
                k_ij.dim()
            )));
        }

        let a = OMEGA_A * REFERENCE_PRESSURE * &tc * &tc / &pc;
        let b = OMEGA_B * REFERENCE_PRESSURE * &tc / &pc;
        let kappa = acentric_factor.mapv(|w| 0.37464 + (1.54226 - 0.26992 * w) * w);

        Ok(Self {
            tc,
            pc,
            acentric_factor,
            a,
            b,
            k_ij,
            kappa,
        })
    }

    pub fn k_ij(&self) -> &Array2<f64> {
        &self.k_ij
    }
}

impl Parameter for PengRobinsonParameters {
    type Pure = PengRobinsonRecord;
    type Binary = f64;

    fn from_records(
        pure_records: Vec<PureRecord<Self::Pure>>,
        binary_records: Option<Array2<Self::Binary>>,
    ) -> Result<Self, ParameterError> {
        let n = pure_records.len();
        let collect = |f: fn(&PureRecord<PengRobinsonRecord>) -> f64| {
            pure_records.iter().map(f).collect::<Array1<f64>>()
        };
        Self::from_arrays(
            collect(|r| r.model_record.tc),
            collect(|r| r.model_record.pc),
            collect(|r| r.model_record.acentric_factor),
            binary_records.unwrap_or_else(|| Array2::zeros((n, n))),
        )
    }
}

/// The Peng-Robinson equation of state.
pub struct PengRobinson {
    parameters: Arc<PengRobinsonParameters>,
}

impl PengRobinson {
    pub fn new(parameters: Arc<PengRobinsonParameters>) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &Arc<PengRobinsonParameters> {
        &self.parameters
    }
}

impl fmt::Display for PengRobinson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peng-Robinson ({} components)", self.components())
    }
}

impl Residual for PengRobinson {
    fn components(&self) -> usize {
        self.parameters.b.len()
    }

    fn compute_max_density(&self, moles: &Array1<f64>) -> f64 {
        let b_mix = moles.dot(&self.parameters.b) / moles.sum();
        MAX_PACKING / b_mix
    }

    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy>(
        &self,
        state: &StateHD<D>,
    ) -> Vec<(&'static str, D)> {
        let p = &self.parameters;
        let t = state.temperature;
        let x = &state.molefracs;

        // a_i α_i(T)
        let a_t = Array1::from_shape_fn(p.a.len(), |i| {
            ((D::one() - (t / p.tc[i]).sqrt()) * p.kappa[i] + 1.0).powi(2) * p.a[i]
        });
        let mut a_mix = D::zero();
        for (i, (&xi, &ai)) in x.iter().zip(a_t.iter()).enumerate() {
            for (j, (&xj, &aj)) in x.iter().zip(a_t.iter()).enumerate() {
                a_mix += (ai * aj).sqrt() * xi * xj * (1.0 - p.k_ij[(i, j)]);
            }
        }
        let b_mix = (x * &p.b).sum();

        let n = state.moles.sum();
        let v = state.volume;
        let nb = b_mix * n;
        let repulsion = (v / (v - nb)).ln();
        let attraction = a_mix / (b_mix * t * 2.0 * SQRT_2)
            * ((v + nb * (1.0 + SQRT_2)) / (v + nb * (1.0 - SQRT_2))).ln();
        vec![("Peng-Robinson", (repulsion - attraction) * n)]
    }
}

impl CriticalParameters for PengRobinson {
    fn critical_temperature(&self) -> Array1<f64> {
        self.parameters.tc.clone()
    }

    fn critical_pressure(&self) -> Array1<f64> {
        self.parameters.pc.clone()
    }

    fn acentric_factor(&self) -> Array1<f64> {
        self.parameters.acentric_factor.clone()
    }

    fn critical_compressibility(&self) -> f64 {
        PR_CRITICAL_COMPRESSIBILITY
    }
}
