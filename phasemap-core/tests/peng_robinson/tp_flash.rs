use super::co2_n2;
use approx::assert_relative_eq;
use ndarray::{arr1, Array1};
use phasemap_core::{
    Contributions, CriticalParameters, DensityInitialization, EosError, PhaseEquilibrium,
    SolverOptions, State,
};
use std::error::Error;

#[test]
fn test_tp_flash() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let vle = PhaseEquilibrium::tp_flash(&eos, 273.15, 6e6, &z, None, SolverOptions::default())?;
    println!("{}", vle);

    assert_relative_eq!(
        vle.vapor().pressure(Contributions::Total),
        6e6,
        max_relative = 1e-10
    );
    assert_relative_eq!(
        vle.liquid().pressure(Contributions::Total),
        6e6,
        max_relative = 1e-10
    );
    assert_relative_eq!(
        &vle.vapor().molefracs * &vle.vapor().ln_phi().mapv(f64::exp),
        &vle.liquid().molefracs * &vle.liquid().ln_phi().mapv(f64::exp),
        max_relative = 1e-6
    );

    let beta = vle.vapor_phase_fraction();
    assert!(beta > 0.3 && beta < 0.55);
    assert!(vle.liquid().molefracs[0] > vle.vapor().molefracs[0]);
    assert_relative_eq!(vle.liquid().molefracs[0], 0.947, max_relative = 1e-2);
    assert_relative_eq!(vle.vapor().molefracs[0], 0.717, max_relative = 2e-2);

    let balance = &vle.vapor().molefracs * beta + &vle.liquid().molefracs * (1.0 - beta);
    assert_relative_eq!(balance, z, max_relative = 1e-10);
    Ok(())
}

#[test]
fn test_tp_flash_low_temperature() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let vle = PhaseEquilibrium::tp_flash(&eos, 263.15, 4e6, &z, None, SolverOptions::default())?;
    assert!(vle.liquid().density > vle.vapor().density);
    assert_relative_eq!(vle.vapor_phase_fraction(), 0.54, max_relative = 0.1);
    Ok(())
}

#[test]
fn test_tp_flash_initial_state() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let options = SolverOptions::new().max_iter(100).tol(1e-10);
    let vle = PhaseEquilibrium::tp_flash(&eos, 273.15, 6e6, &z, None, options)?;
    let next = PhaseEquilibrium::tp_flash(&eos, 273.15, 6.1e6, &z, Some(&vle), options)?;
    assert_relative_eq!(
        next.liquid().pressure(Contributions::Total),
        6.1e6,
        max_relative = 1e-10
    );
    assert!(next.vapor_phase_fraction() < vle.vapor_phase_fraction());
    Ok(())
}

#[test]
fn test_tp_flash_single_phase() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    for (t, p) in [(273.15, 4e6), (298.15, 6e6), (263.15, 1e7)] {
        let result = PhaseEquilibrium::tp_flash(&eos, t, p, &z, None, SolverOptions::default());
        assert!(matches!(
            result,
            Err(EosError::NoPhaseSplit) | Err(EosError::TrivialSolution)
        ));
    }
    Ok(())
}

#[test]
fn test_tp_flash_with_restart() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let feed = State::new_npt(&eos, 263.15, 5106212.42, &z, DensityInitialization::None)?;
    let vle = feed.tp_flash_with_restart(SolverOptions::default())?;
    assert_relative_eq!(vle.vapor_phase_fraction(), 0.328, max_relative = 1e-2);
    assert_relative_eq!(vle.liquid().molefracs[0], 0.952, max_relative = 1e-2);
    assert_relative_eq!(vle.vapor().molefracs[0], 0.641, max_relative = 1e-2);
    Ok(())
}

#[test]
fn test_tp_flash_pressure_sweep() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let mut beta_old = 1.0;
    for p in Array1::linspace(5e6, 6.3e6, 53) {
        let feed = State::new_npt(&eos, 263.15, p, &z, DensityInitialization::None)?;
        let vle = feed.tp_flash_with_restart(SolverOptions::default())?;
        let beta = vle.vapor_phase_fraction();
        assert!(beta < beta_old);
        let balance = &vle.vapor().molefracs * beta + &vle.liquid().molefracs * (1.0 - beta);
        assert_relative_eq!(balance, z, max_relative = 1e-8);
        beta_old = beta;
    }
    Ok(())
}

#[test]
fn test_from_k_factors() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let feed = State::new_npt(&eos, 263.15, 5e6, &z, DensityInitialization::None)?;
    let k = eos.wilson_k_factors(263.15, 5e6);
    let vle = PhaseEquilibrium::from_k_factors(&feed, &k)?;
    assert!(vle.liquid().density > vle.vapor().density);
    let ratio = &vle.vapor().molefracs / &vle.liquid().molefracs;
    assert_relative_eq!(ratio, k, max_relative = 1e-4);

    let no_split = arr1(&[1.1, 1.5]);
    assert!(PhaseEquilibrium::from_k_factors(&feed, &no_split).is_err());
    Ok(())
}
