use super::{coarse_config, solver, temporary_file};
use phasemap::config::OutputConfig;
use phasemap::output::read_grid;
use phasemap::{DensityMap, MapConfig, MapResult};
use std::fs;

#[test]
fn text_dumps_round_trip() -> MapResult<()> {
    let config = MapConfig {
        output: OutputConfig {
            gas_density: temporary_file("Rhog.txt"),
            liquid_density: temporary_file("Rhol.txt"),
            figure: None,
        },
        ..coarse_config()
    };
    let map = DensityMap::compute(&solver()?, &config)?;
    map.write(&config)?;

    let gas = read_grid(&config.output.gas_density)?;
    let liquid = read_grid(&config.output.liquid_density)?;
    let text = fs::read_to_string(&config.output.gas_density)?;
    fs::remove_file(&config.output.gas_density)?;
    fs::remove_file(&config.output.liquid_density)?;

    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().all(|l| l.split(' ').count() == 4));
    for (read, computed) in [(gas, &map.grids.gas), (liquid, &map.grids.liquid)] {
        assert_eq!(read.dim(), computed.dim());
        for (a, b) in read.iter().zip(computed.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
    Ok(())
}
