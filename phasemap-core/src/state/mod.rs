//! Thermodynamic states of a mixture.
//!
//! A [State] is fixed by temperature, volume and mole numbers, the natural
//! variables of the Helmholtz energy. Constructors at given pressure find
//! the volume with a density iteration.
use crate::density_iteration::density_iteration;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::{REFERENCE_MOLES, REFERENCE_VOLUME, RGAS};
use cache::Cache;
use ndarray::Array1;
use num_dual::{Dual2_64, Dual3_64, Dual64, DualNum, HyperDual64};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

mod cache;
mod phase_guess;
mod properties;
pub use phase_guess::PhaseGuess;

/// Part of a property that is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contributions {
    IdealGas,
    /// Total minus ideal gas.
    Residual,
    Total,
}

/// Starting point of the density iteration in [State::new_npt].
#[derive(Clone, Copy, Debug)]
pub enum DensityInitialization {
    /// Start from the ideal gas density.
    Vapor,
    /// Start from the maximum density of the model.
    Liquid,
    /// Start from a density in mol/m³.
    InitialDensity(f64),
    /// Try both roots and keep the one with the lower Gibbs energy.
    None,
}

/// Temperature, volume and mole numbers in reduced units as (hyper) dual
/// numbers, the input of the Helmholtz energy models.
#[derive(Clone, Debug)]
pub struct StateHD<D: DualNum<f64>> {
    /// K
    pub temperature: D,
    /// Å³
    pub volume: D,
    /// number of molecules
    pub moles: Array1<D>,
    pub molefracs: Array1<D>,
    /// Å⁻³
    pub partial_density: Array1<D>,
}

impl<D: DualNum<f64> + Copy> StateHD<D> {
    pub fn new(temperature: D, volume: D, moles: Array1<D>) -> Self {
        let total = moles.sum();
        Self {
            temperature,
            volume,
            partial_density: moles.mapv(|n| n / volume),
            molefracs: moles.mapv(|n| n / total),
            moles,
        }
    }
}

/// A thermodynamic state in SI units (K, m³, mol, mol/m³) together with
/// the equation of state it was created with.
///
/// Derivatives of the residual Helmholtz energy are cached, so repeated
/// evaluations of e.g. the pressure are cheap. A higher derivative also
/// fills the cache for all lower ones.
///
/// The public fields must not be modified; derived fields and the cache
/// would become inconsistent.
#[derive(Debug)]
pub struct State<E> {
    pub eos: Arc<E>,
    /// K
    pub temperature: f64,
    /// m³
    pub volume: f64,
    /// mol
    pub moles: Array1<f64>,
    /// mol
    pub total_moles: f64,
    /// mol/m³
    pub partial_density: Array1<f64>,
    /// mol/m³
    pub density: f64,
    pub molefracs: Array1<f64>,
    reduced_temperature: f64,
    reduced_volume: f64,
    reduced_moles: Array1<f64>,
    cache: Mutex<Cache>,
}

impl<E> Clone for State<E> {
    fn clone(&self) -> Self {
        let cache = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            eos: Arc::clone(&self.eos),
            moles: self.moles.clone(),
            partial_density: self.partial_density.clone(),
            molefracs: self.molefracs.clone(),
            reduced_moles: self.reduced_moles.clone(),
            cache: Mutex::new(cache),
            ..*self
        }
    }
}

impl<E: Residual> fmt::Display for State<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T = {:.5} K, ρ = {:.5} mol/m³", self.temperature, self.density)?;
        if self.molefracs.len() > 1 {
            write!(f, ", x = {:.5}", self.molefracs)?;
        }
        Ok(())
    }
}

/// Variable of a partial derivative of the Helmholtz energy.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Debug, PartialOrd, Ord)]
pub enum Derivative {
    DV,
    DT,
    /// Mole number of component `i`.
    DN(usize),
}

impl Derivative {
    /// SI value of one reduced unit of the variable.
    fn reference(&self) -> f64 {
        match self {
            Derivative::DV => REFERENCE_VOLUME,
            Derivative::DT => 1.0,
            Derivative::DN(_) => REFERENCE_MOLES,
        }
    }
}

/// Key of a cached derivative.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Debug)]
pub(crate) enum PartialDerivative {
    Zeroth,
    First(Derivative),
    Second(Derivative),
    SecondMixed(Derivative, Derivative),
    Third(Derivative),
}

/// # State constructors
impl<E: Residual> State<E> {
    /// Return a new `State` given a temperature, an array of mole numbers and a volume.
    ///
    /// Temperature, volume and mole numbers have to be finite and
    /// non-negative. Whether the density is physically accessible is
    /// not checked.
    pub fn new_nvt(
        eos: &Arc<E>,
        temperature: f64,
        volume: f64,
        moles: &Array1<f64>,
    ) -> EosResult<Self> {
        eos.validate_moles(moles)?;
        validate(temperature, volume, moles)?;

        Ok(Self::new_nvt_unchecked(eos, temperature, volume, moles))
    }

    pub(crate) fn new_nvt_unchecked(
        eos: &Arc<E>,
        temperature: f64,
        volume: f64,
        moles: &Array1<f64>,
    ) -> Self {
        let total_moles = moles.sum();
        State {
            eos: eos.clone(),
            total_moles,
            temperature,
            volume,
            moles: moles.to_owned(),
            partial_density: moles / volume,
            density: total_moles / volume,
            molefracs: moles / total_moles,
            reduced_temperature: temperature,
            reduced_volume: volume / REFERENCE_VOLUME,
            reduced_moles: moles / REFERENCE_MOLES,
            cache: Mutex::new(Cache::with_capacity(eos.components())),
        }
    }

    /// Return a new `State` at given temperature and pressure using a
    /// density iteration. The [DensityInitialization] selects the root.
    pub fn new_npt(
        eos: &Arc<E>,
        temperature: f64,
        pressure: f64,
        moles: &Array1<f64>,
        density_initialization: DensityInitialization,
    ) -> EosResult<Self> {
        let ideal_gas_density = pressure / (RGAS * temperature);
        let iterate = |rho0| density_iteration(eos, temperature, pressure, moles, rho0);
        match density_initialization {
            DensityInitialization::InitialDensity(rho0) => iterate(rho0),
            DensityInitialization::Vapor => iterate(ideal_gas_density),
            DensityInitialization::Liquid => iterate(eos.max_density(moles)?),
            DensityInitialization::None => {
                let max_density = eos.max_density(moles)?;
                let liquid = iterate(max_density);
                // above this pressure no vapor root exists
                if ideal_gas_density >= max_density {
                    return liquid;
                }
                match (liquid, iterate(ideal_gas_density)) {
                    (Ok(l), Ok(v)) => Ok(
                        if l.residual_gibbs_energy() > v.residual_gibbs_energy() {
                            v
                        } else {
                            l
                        },
                    ),
                    (Ok(state), Err(_)) | (Err(_), Ok(state)) => Ok(state),
                    (Err(_), Err(_)) => Err(EosError::UndeterminedState(String::from(
                        "no density root found",
                    ))),
                }
            }
        }
    }
}

/// Reduced temperature, volume and moles as (hyper) dual numbers.
type ReducedVariables<D> = (D, D, Array1<D>);

/// Set the derivative part of one variable using `f`.
fn seed<D: Copy>(
    variables: &mut ReducedVariables<D>,
    derivative: Derivative,
    f: impl FnOnce(D) -> D,
) {
    let x = match derivative {
        Derivative::DT => &mut variables.0,
        Derivative::DV => &mut variables.1,
        Derivative::DN(i) => &mut variables.2[i],
    };
    *x = f(*x);
}

impl<E: Residual> State<E> {
    fn reduced_variables<D: DualNum<f64> + Copy>(&self) -> ReducedVariables<D> {
        (
            D::from(self.reduced_temperature),
            D::from(self.reduced_volume),
            self.reduced_moles.mapv(D::from),
        )
    }

    /// Creates a [StateHD] cloning temperature, volume and moles.
    pub fn derive0(&self) -> StateHD<f64> {
        let (t, v, n) = self.reduced_variables();
        StateHD::new(t, v, n)
    }

    /// Creates a [StateHD] taking the first derivative.
    pub fn derive1(&self, derivative: Derivative) -> StateHD<Dual64> {
        let mut vars = self.reduced_variables();
        seed(&mut vars, derivative, Dual64::derivative);
        StateHD::new(vars.0, vars.1, vars.2)
    }

    /// Creates a [StateHD] taking the first and second derivatives with
    /// respect to one variable.
    pub fn derive2(&self, derivative: Derivative) -> StateHD<Dual2_64> {
        let mut vars = self.reduced_variables();
        seed(&mut vars, derivative, Dual2_64::derivative);
        StateHD::new(vars.0, vars.1, vars.2)
    }

    /// Creates a [StateHD] taking the mixed second derivative.
    pub fn derive2_mixed(
        &self,
        derivative1: Derivative,
        derivative2: Derivative,
    ) -> StateHD<HyperDual64> {
        let mut vars = self.reduced_variables();
        seed(&mut vars, derivative1, HyperDual64::derivative1);
        seed(&mut vars, derivative2, HyperDual64::derivative2);
        StateHD::new(vars.0, vars.1, vars.2)
    }

    /// Creates a [StateHD] taking up to the third derivative with respect to one variable.
    pub fn derive3(&self, derivative: Derivative) -> StateHD<Dual3_64> {
        let mut vars = self.reduced_variables();
        seed(&mut vars, derivative, Dual3_64::derivative);
        StateHD::new(vars.0, vars.1, vars.2)
    }
}

/// Temperature, volume and mole numbers have to be finite and non-negative.
fn validate(temperature: f64, volume: f64, moles: &Array1<f64>) -> EosResult<()> {
    let invalid = |x: f64| !x.is_finite() || x.is_sign_negative();
    let checks = [("temperature", temperature), ("volume", volume)]
        .into_iter()
        .chain(moles.iter().map(|&n| ("moles", n)));
    for (name, value) in checks {
        if invalid(value) {
            return Err(EosError::InvalidState(
                String::from("validate"),
                String::from(name),
                value,
            ));
        }
    }
    Ok(())
}
