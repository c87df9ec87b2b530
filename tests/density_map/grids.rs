use super::{coarse_config, solver};
use ndarray::{arr1, s};
use phasemap::{DensityGrids, DensityMap, FailurePolicy, GridAxes, MapConfig, MapResult};
use phasemap_core::Verbosity;

#[test]
fn grid_shapes_and_absent_phases() -> MapResult<()> {
    let config = coarse_config();
    let map = DensityMap::compute(&solver()?, &config)?;
    assert_eq!(map.grids.shape(), (3, 4));
    assert_eq!(map.grids.liquid.dim(), (3, 4));
    assert_eq!(map.axes.temperatures.len(), 3);
    assert_eq!(map.axes.pressures.len(), 4);
    for (&gas, &liquid) in map.grids.gas.iter().zip(map.grids.liquid.iter()) {
        assert!(gas.is_finite() && liquid.is_finite());
        assert!(gas >= 0.0 && liquid >= 0.0);
        assert!(gas > 0.0 || liquid > 0.0);
    }

    // 263.15 K and 4 MPa lies inside the two-phase region, 1e7 Pa at the
    // same temperature is a compressed liquid
    assert!(map.grids.gas[(0, 0)] > 0.0 && map.grids.liquid[(0, 0)] > 0.0);
    assert_eq!(map.grids.gas[(0, 3)], 0.0);
    assert!(map.grids.liquid[(0, 3)] > 0.0);
    Ok(())
}

#[test]
fn envelope_of_the_run() -> MapResult<()> {
    let config = coarse_config();
    let map = DensityMap::compute(&solver()?, &config)?;
    let p = map.envelope.pressures();
    assert!(!map.envelope.is_empty());
    assert!((p[0] / config.envelope.initial_pressure - 1.0).abs() < 1e-8);
    assert!(p.iter().all(|&p| p <= config.envelope.maximum_pressure));
    Ok(())
}

#[test]
fn coldest_rows_at_full_pressure_resolution() -> MapResult<()> {
    let config = MapConfig::default();
    let full = GridAxes::from_config(&config);
    let axes = GridAxes::new(
        full.temperatures.slice(s![..2]).to_owned(),
        full.pressures.clone(),
    );
    let grids = DensityGrids::compute(
        &solver()?,
        &axes,
        &arr1(&config.composition),
        &arr1(&config.molar_masses),
        FailurePolicy::Abort,
        Verbosity::None,
    )?;
    assert_eq!(grids.shape(), (2, 500));
    assert!(grids.gas.iter().all(|rho| rho.is_finite()));

    // the two-phase region at the cold end reaches beyond 9 MPa
    let two_phase = grids
        .gas
        .row(0)
        .iter()
        .zip(grids.liquid.row(0))
        .take_while(|&(&gas, &liquid)| gas > 0.0 && liquid > 0.0)
        .count();
    assert!(two_phase > 400);
    Ok(())
}
