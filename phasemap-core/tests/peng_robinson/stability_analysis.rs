use super::co2_n2;
use ndarray::arr1;
use phasemap_core::{DensityInitialization, SolverOptions, State};
use std::error::Error;

#[test]
fn test_stability_analysis() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);

    let vapor = State::new_npt(&eos, 273.15, 4e6, &z, DensityInitialization::Vapor)?;
    assert!(vapor.is_stable(SolverOptions::default())?);

    let unstable = State::new_npt(&eos, 273.15, 6e6, &z, DensityInitialization::None)?;
    let candidates = unstable.stability_analysis(SolverOptions::default())?;
    assert!(!candidates.is_empty());
    for candidate in candidates {
        assert!((candidate.molefracs[0] - 0.85).abs() > 1e-3);
    }
    Ok(())
}

#[test]
fn test_distinct_candidates() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let state = State::new_npt(&eos, 263.15, 5106212.42, &z, DensityInitialization::None)?;
    let candidates = state.stability_analysis(SolverOptions::default())?;
    assert!(!candidates.is_empty());
    for (i, c1) in candidates.iter().enumerate() {
        for c2 in &candidates[i + 1..] {
            let distance = (&c1.molefracs - &c2.molefracs).mapv(f64::abs);
            assert!(distance.iter().any(|&d| d >= 1e-3));
        }
    }
    Ok(())
}
