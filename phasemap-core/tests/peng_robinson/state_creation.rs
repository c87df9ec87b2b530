use super::co2_n2;
use approx::assert_relative_eq;
use ndarray::arr1;
use phasemap_core::{Contributions, CriticalParameters, DensityInitialization, PhaseGuess, State};
use std::error::Error;

#[test]
fn test_vapor_and_liquid_roots() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let vapor = State::new_npt(&eos, 273.15, 6e6, &z, DensityInitialization::Vapor)?;
    let liquid = State::new_npt(&eos, 273.15, 6e6, &z, DensityInitialization::Liquid)?;
    assert_relative_eq!(
        vapor.compressibility(Contributions::Total),
        0.4696,
        max_relative = 5e-3
    );
    assert_relative_eq!(
        liquid.compressibility(Contributions::Total),
        0.187,
        max_relative = 3e-2
    );
    assert!(vapor.molar_volume() > eos.pseudo_critical_volume(&z));
    assert!(liquid.molar_volume() < eos.pseudo_critical_volume(&z));
    Ok(())
}

#[test]
fn test_single_root() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let vapor = State::new_npt(&eos, 298.15, 6e6, &z, DensityInitialization::Vapor)?;
    let liquid = State::new_npt(&eos, 298.15, 6e6, &z, DensityInitialization::Liquid)?;
    assert_relative_eq!(vapor.density, liquid.density, max_relative = 1e-8);
    assert_relative_eq!(
        vapor.compressibility(Contributions::Total),
        0.69,
        max_relative = 1e-2
    );
    Ok(())
}

#[test]
fn test_guess_phase() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    for _ in 0..3 {
        assert_eq!(State::guess_phase(&eos, 263.15, 4e6, &z)?, PhaseGuess::Vapor);
    }
    assert_eq!(State::guess_phase(&eos, 263.15, 1e7, &z)?, PhaseGuess::Liquid);
    Ok(())
}
