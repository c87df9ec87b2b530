use phasemap::config::{AxisConfig, MapConfig, ParameterFiles};
use phasemap::{CubicSolver, MapResult};
use std::path::PathBuf;

mod grid_points;
mod grids;
mod persistence;

fn solver() -> MapResult<CubicSolver> {
    CubicSolver::from_config(&MapConfig::default())
}

/// Small grid at the cold end of the default temperature range.
fn coarse_config() -> MapConfig {
    MapConfig {
        temperature: AxisConfig::new(263.15, 273.15, 3),
        pressure: AxisConfig::new(4e6, 1e7, 4),
        ..Default::default()
    }
}

fn temporary_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("phasemap_{}_{name}", std::process::id()))
}

#[test]
fn parameters_from_files() -> MapResult<()> {
    let config = MapConfig {
        parameters: Some(ParameterFiles {
            pure: "parameters/peng_robinson.json".into(),
            binary: Some("parameters/peng_robinson_binary.json".into()),
        }),
        ..coarse_config()
    };
    let from_files = CubicSolver::from_config(&config)?;
    let builtin = solver()?;
    assert_eq!(
        from_files.eos().parameters().k_ij(),
        builtin.eos().parameters().k_ij()
    );
    assert_eq!(from_files.eos().parameters().k_ij()[(0, 1)], -0.017);
    Ok(())
}
