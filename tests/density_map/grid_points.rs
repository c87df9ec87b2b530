use super::solver;
use approx::assert_relative_eq;
use ndarray::arr1;
use phasemap::{GridPoint, MapResult, PhaseCode, PhaseRegion, PhaseSolver};

#[test]
fn two_phase_point() -> MapResult<()> {
    let solver = solver()?;
    let z = arr1(&[0.85, 0.15]);
    let m = arr1(&[44.01, 28.02]);
    let point = GridPoint::evaluate(&solver, 273.15, 6e6, &z, &m)?;
    assert_eq!(point.region, PhaseRegion::TwoPhase);
    assert!(point.gas_density.is_finite() && point.liquid_density.is_finite());
    assert!(point.gas_density > 200.0 && point.gas_density < 245.0);
    assert!(point.liquid_density > 560.0 && point.liquid_density < 660.0);

    // mass balance of the underlying flash
    let flash = solver.flash(273.15, 6e6, &z)?;
    assert_eq!(flash.phase, PhaseCode::TwoPhase);
    let balance = flash.beta * &flash.y + (1.0 - flash.beta) * &flash.x;
    assert_relative_eq!(balance, z, max_relative = 1e-8);
    Ok(())
}

#[test]
fn vapor_point() -> MapResult<()> {
    let z = arr1(&[0.85, 0.15]);
    let m = arr1(&[44.01, 28.02]);
    let point = GridPoint::evaluate(&solver()?, 273.15, 4e6, &z, &m)?;
    assert_eq!(point.region, PhaseRegion::VaporOnly);
    assert_eq!(point.liquid_density, 0.0);
    assert!(point.gas_density > 90.0 && point.gas_density < 115.0);
    Ok(())
}

#[test]
fn liquid_point() -> MapResult<()> {
    let z = arr1(&[0.85, 0.15]);
    let m = arr1(&[44.01, 28.02]);
    let point = GridPoint::evaluate(&solver()?, 263.15, 1e7, &z, &m)?;
    assert_eq!(point.region, PhaseRegion::LiquidOnly);
    assert_eq!(point.gas_density, 0.0);
    assert!(point.liquid_density > 780.0 && point.liquid_density < 930.0);
    Ok(())
}

#[test]
fn corner_point_is_repeatable() -> MapResult<()> {
    let solver = solver()?;
    let z = arr1(&[0.85, 0.15]);
    let m = arr1(&[44.01, 28.02]);
    let first = GridPoint::evaluate(&solver, 263.15, 4e6, &z, &m)?;
    for _ in 0..3 {
        // a different point in between must not influence the result
        GridPoint::evaluate(&solver, 273.15, 6e6, &z, &m)?;
        let again = GridPoint::evaluate(&solver, 263.15, 4e6, &z, &m)?;
        assert_eq!(again.region, first.region);
        assert_eq!(again.gas_density.to_bits(), first.gas_density.to_bits());
        assert_eq!(again.liquid_density.to_bits(), first.liquid_density.to_bits());
    }
    Ok(())
}
