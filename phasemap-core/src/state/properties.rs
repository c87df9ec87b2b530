use super::{Contributions, Derivative::*, PartialDerivative, State, StateHD};
use crate::equation_of_state::Residual;
use crate::{KB, RGAS};
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use std::sync::PoisonError;

/// $A^\text{res}/k_B$ in K, the quantity that is cached for every state.
fn reduced_helmholtz<E: Residual, D: DualNum<f64> + Copy>(eos: &E, state: &StateHD<D>) -> D {
    eos.residual_helmholtz_energy(state) * state.temperature
}

impl Contributions {
    fn select(self, ideal_gas: f64, residual: f64) -> f64 {
        match self {
            Self::IdealGas => ideal_gas,
            Self::Residual => residual,
            Self::Total => ideal_gas + residual,
        }
    }
}

/// # State properties
impl<E: Residual> State<E> {
    /// Partial derivative of the residual Helmholtz energy in SI units.
    pub(super) fn get_or_compute_derivative_residual(&self, derivative: PartialDerivative) -> f64 {
        let eos = &*self.eos;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let reduced = match derivative {
            PartialDerivative::Zeroth => {
                cache.get_or_insert_with_f64(|| reduced_helmholtz(eos, &self.derive0()))
            }
            PartialDerivative::First(v) => {
                cache.get_or_insert_with_d64(v, || reduced_helmholtz(eos, &self.derive1(v)))
                    / v.reference()
            }
            PartialDerivative::Second(v) => {
                cache.get_or_insert_with_d2_64(v, || reduced_helmholtz(eos, &self.derive2(v)))
                    / v.reference().powi(2)
            }
            PartialDerivative::SecondMixed(v1, v2) => {
                cache.get_or_insert_with_hd64(v1, v2, || {
                    reduced_helmholtz(eos, &self.derive2_mixed(v1, v2))
                }) / (v1.reference() * v2.reference())
            }
            PartialDerivative::Third(v) => {
                cache.get_or_insert_with_d3_64(v, || reduced_helmholtz(eos, &self.derive3(v)))
                    / v.reference().powi(3)
            }
        };
        reduced * KB
    }

    /// $A^\text{res}$ in J
    pub fn residual_helmholtz_energy(&self) -> f64 {
        self.get_or_compute_derivative_residual(PartialDerivative::Zeroth)
    }

    /// $p=-\left(\frac{\partial A}{\partial V}\right)_{T,N_i}$ in Pa
    pub fn pressure(&self, contributions: Contributions) -> f64 {
        contributions.select(
            self.density * RGAS * self.temperature,
            -self.get_or_compute_derivative_residual(PartialDerivative::First(DV)),
        )
    }

    /// $\mu_i^\text{res}=\left(\frac{\partial A^\text{res}}{\partial N_i}\right)_{T,V,N_j}$ in J/mol
    pub fn residual_chemical_potential(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.eos.components(), |i| {
            self.get_or_compute_derivative_residual(PartialDerivative::First(DN(i)))
        })
    }

    /// $Z=\frac{pV}{NRT}$
    pub fn compressibility(&self, contributions: Contributions) -> f64 {
        self.pressure(contributions) / (self.density * self.temperature * RGAS)
    }

    /// $v=\frac{V}{N}$ in m³/mol
    pub fn molar_volume(&self) -> f64 {
        self.volume / self.total_moles
    }

    /// $\left(\frac{\partial p}{\partial V}\right)_{T,N_i}$ in Pa/m³
    pub fn dp_dv(&self, contributions: Contributions) -> f64 {
        contributions.select(
            -self.density * RGAS * self.temperature / self.volume,
            -self.get_or_compute_derivative_residual(PartialDerivative::Second(DV)),
        )
    }

    /// $\left(\frac{\partial p}{\partial \rho}\right)_{T,N_i}$ in J/mol
    pub fn dp_drho(&self, contributions: Contributions) -> f64 {
        -self.volume / self.density * self.dp_dv(contributions)
    }

    /// $\left(\frac{\partial p}{\partial T}\right)_{V,N_i}$ in Pa/K
    pub fn dp_dt(&self, contributions: Contributions) -> f64 {
        contributions.select(
            self.density * RGAS,
            -self.get_or_compute_derivative_residual(PartialDerivative::SecondMixed(DV, DT)),
        )
    }

    /// $\left(\frac{\partial p}{\partial N_i}\right)_{T,V,N_j}$ in Pa/mol
    pub fn dp_dni(&self, contributions: Contributions) -> Array1<f64> {
        let ideal_gas = RGAS * self.temperature / self.volume;
        Array1::from_shape_fn(self.eos.components(), |i| {
            let residual = if contributions == Contributions::IdealGas {
                0.0
            } else {
                -self.get_or_compute_derivative_residual(PartialDerivative::SecondMixed(DV, DN(i)))
            };
            contributions.select(ideal_gas, residual)
        })
    }

    /// $\left(\frac{\partial^2 p}{\partial V^2}\right)_{T,N_i}$ in Pa/m⁶
    pub fn d2p_dv2(&self, contributions: Contributions) -> f64 {
        contributions.select(
            2.0 * self.density * RGAS * self.temperature / self.volume.powi(2),
            -self.get_or_compute_derivative_residual(PartialDerivative::Third(DV)),
        )
    }

    /// Pressure and its density derivative, the residual and slope of the
    /// density iteration.
    pub(crate) fn p_dpdrho(&self) -> (f64, f64) {
        (
            self.pressure(Contributions::Total),
            self.dp_drho(Contributions::Total),
        )
    }

    /// Pressure with its first and second density derivatives, used to
    /// locate spinodals.
    pub(crate) fn d2pdrho2(&self) -> (f64, f64, f64) {
        let dp_dv = self.dp_dv(Contributions::Total);
        let d2p_dv2 = self.d2p_dv2(Contributions::Total);
        let v_rho = self.volume / self.density;
        (
            self.pressure(Contributions::Total),
            -v_rho * dp_dv,
            v_rho / self.density * (2.0 * dp_dv + self.volume * d2p_dv2),
        )
    }

    /// $\left(\frac{\partial\mu_i^\text{res}}{\partial T}\right)_{V,N_i}$ in J/(mol K)
    pub fn dmu_res_dt(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.eos.components(), |i| {
            self.get_or_compute_derivative_residual(PartialDerivative::SecondMixed(DT, DN(i)))
        })
    }

    /// $\left(\frac{\partial\mu_i^\text{res}}{\partial N_j}\right)_{T,V,N_k}$ in J/mol²
    pub fn dmu_res_dni(&self) -> Array2<f64> {
        let n = self.eos.components();
        Array2::from_shape_fn((n, n), |(i, j)| {
            self.get_or_compute_derivative_residual(PartialDerivative::SecondMixed(DN(i), DN(j)))
        })
    }

    /// $v_i=\left(\frac{\partial V}{\partial N_i}\right)_{T,p,N_j}$ in m³/mol
    pub fn partial_molar_volume(&self) -> Array1<f64> {
        -self.dp_dni(Contributions::Total) / self.dp_dv(Contributions::Total)
    }

    /// Logarithm of the fugacity coefficients: $\ln\varphi_i=\beta\mu_i^\mathrm{res}\left(T,V,\lbrace N_i\rbrace\right)-\ln Z$
    pub fn ln_phi(&self) -> Array1<f64> {
        let beta_mu = self.residual_chemical_potential() / (RGAS * self.temperature);
        beta_mu - self.compressibility(Contributions::Total).ln()
    }

    /// $\left(\frac{\partial\ln\varphi_i}{\partial T}\right)_{p,N_i}$ in 1/K
    pub fn dln_phi_dt(&self) -> Array1<f64> {
        let rt = RGAS * self.temperature;
        let dmu = self.dmu_res_dt()
            - self.residual_chemical_potential() / self.temperature
            - self.partial_molar_volume() * self.dp_dt(Contributions::Total);
        dmu / rt + 1.0 / self.temperature
    }

    /// $\left(\frac{\partial\ln\varphi_i}{\partial p}\right)_{T,N_i}$ in 1/Pa
    pub fn dln_phi_dp(&self) -> Array1<f64> {
        self.partial_molar_volume() / (RGAS * self.temperature)
            - 1.0 / self.pressure(Contributions::Total)
    }

    /// $\left(\frac{\partial\ln\varphi_i}{\partial N_j}\right)_{T,p,N_k}$ in 1/mol
    pub fn dln_phi_dnj(&self) -> Array2<f64> {
        let dp_dni = self.dp_dni(Contributions::Total);
        let dp_dv = self.dp_dv(Contributions::Total);
        let n = dp_dni.len();
        let outer = Array2::from_shape_fn((n, n), |(i, j)| dp_dni[i] * dp_dni[j]);
        (self.dmu_res_dni() + outer / dp_dv) / (RGAS * self.temperature) + 1.0 / self.total_moles
    }

    /// $G^\text{res}(T,p,\mathbf{n})=A^\text{res}+p^\text{res}V-NRT \ln Z$ in J
    pub fn residual_gibbs_energy(&self) -> f64 {
        let nrt = self.total_moles * RGAS * self.temperature;
        self.residual_helmholtz_energy() + self.pressure(Contributions::Residual) * self.volume
            - nrt * self.compressibility(Contributions::Total).ln()
    }
}

#[cfg(test)]
mod tests {
    use crate::cubic::{PengRobinson, PengRobinsonParameters, PengRobinsonRecord};
    use crate::parameter::{Identifier, Parameter, PureRecord};
    use crate::{Contributions, EosResult, State};
    use approx::assert_relative_eq;
    use ndarray::arr1;
    use std::sync::Arc;

    fn co2_n2() -> EosResult<Arc<PengRobinson>> {
        let records = vec![
            PureRecord::new(
                Identifier::default(),
                44.01,
                PengRobinsonRecord::new(304.13, 7377300.0, 0.2239),
            ),
            PureRecord::new(
                Identifier::default(),
                28.02,
                PengRobinsonRecord::new(126.19, 3395800.0, 0.0372),
            ),
        ];
        let parameters = PengRobinsonParameters::new_binary(records, Some(-0.017))?;
        Ok(Arc::new(PengRobinson::new(Arc::new(parameters))))
    }

    fn state() -> EosResult<State<PengRobinson>> {
        let eos = co2_n2()?;
        State::new_nvt(&eos, 280.0, 2.0e-4, &arr1(&[0.6, 0.4]))
    }

    #[test]
    fn pressure_derivatives() -> EosResult<()> {
        let s = state()?;
        let h = 1e-10;
        let sp = State::new_nvt(&s.eos, s.temperature, s.volume + h, &s.moles)?;
        let sm = State::new_nvt(&s.eos, s.temperature, s.volume - h, &s.moles)?;
        let dp_dv =
            (sp.pressure(Contributions::Total) - sm.pressure(Contributions::Total)) / (2.0 * h);
        assert_relative_eq!(s.dp_dv(Contributions::Total), dp_dv, max_relative = 1e-5);
        let d2p_dv2 =
            (sp.dp_dv(Contributions::Total) - sm.dp_dv(Contributions::Total)) / (2.0 * h);
        assert_relative_eq!(
            s.d2p_dv2(Contributions::Total),
            d2p_dv2,
            max_relative = 1e-5
        );

        let ht = 1e-5;
        let tp = State::new_nvt(&s.eos, s.temperature + ht, s.volume, &s.moles)?;
        let tm = State::new_nvt(&s.eos, s.temperature - ht, s.volume, &s.moles)?;
        let dp_dt =
            (tp.pressure(Contributions::Total) - tm.pressure(Contributions::Total)) / (2.0 * ht);
        assert_relative_eq!(s.dp_dt(Contributions::Total), dp_dt, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn fugacity_coefficient_derivatives() -> EosResult<()> {
        let s = state()?;
        let p = s.pressure(Contributions::Total);
        let hp = p * 1e-5;
        let moles = s.moles.clone();
        let init = crate::DensityInitialization::InitialDensity(s.density);
        let pp = State::new_npt(&s.eos, s.temperature, p + hp, &moles, init)?;
        let pm = State::new_npt(&s.eos, s.temperature, p - hp, &moles, init)?;
        let dln_phi_dp = (pp.ln_phi() - pm.ln_phi()) / (2.0 * hp);
        let analytic = s.dln_phi_dp();
        for i in 0..2 {
            assert_relative_eq!(analytic[i], dln_phi_dp[i], max_relative = 1e-5);
        }

        let ht = 1e-3;
        let tp = State::new_npt(&s.eos, s.temperature + ht, p, &moles, init)?;
        let tm = State::new_npt(&s.eos, s.temperature - ht, p, &moles, init)?;
        let dln_phi_dt = (tp.ln_phi() - tm.ln_phi()) / (2.0 * ht);
        let analytic = s.dln_phi_dt();
        for i in 0..2 {
            assert_relative_eq!(analytic[i], dln_phi_dt[i], max_relative = 1e-5);
        }

        let hn = 1e-5;
        let analytic = s.dln_phi_dnj();
        for j in 0..2 {
            let mut np = moles.clone();
            np[j] += hn;
            let mut nm = moles.clone();
            nm[j] -= hn;
            let sp = State::new_npt(&s.eos, s.temperature, p, &np, init)?;
            let sm = State::new_npt(&s.eos, s.temperature, p, &nm, init)?;
            let numeric = (sp.ln_phi() - sm.ln_phi()) / (2.0 * hn);
            for i in 0..2 {
                assert_relative_eq!(analytic[[i, j]], numeric[i], max_relative = 1e-5);
            }
        }
        Ok(())
    }

    #[test]
    fn gibbs_duhem() -> EosResult<()> {
        let s = state()?;
        let dln_phi_dnj = s.dln_phi_dnj();
        let sum = s.moles.dot(&dln_phi_dnj);
        assert_relative_eq!(sum[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(sum[1], 0.0, epsilon = 1e-10);
        Ok(())
    }
}
