use clap::{Parser, ValueEnum};
use phasemap::{run, MapConfig};
use phasemap_core::Verbosity;
use std::error::Error;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Output {
    #[value(name = "none")]
    Quiet,
    Result,
    Iter,
}

impl From<Output> for Verbosity {
    fn from(output: Output) -> Self {
        match output {
            Output::Quiet => Verbosity::None,
            Output::Result => Verbosity::Result,
            Output::Iter => Verbosity::Iter,
        }
    }
}

/// Gas and liquid density maps of CO2/N2 mixtures
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Gas and liquid density maps of CO2/N2 mixtures"
)]
struct Cli {
    /// JSON file overriding the default settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Solver and progress output
    #[arg(long, value_enum)]
    verbosity: Option<Output>,
}

impl Cli {
    /// Settings of the run. Without flags these are the defaults.
    fn map_config(&self) -> Result<MapConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => MapConfig::from_json(path)?,
            None => MapConfig::default(),
        };
        if let Some(verbosity) = self.verbosity {
            config.verbosity = verbosity.into();
        }
        Ok(config)
    }
}

fn main() {
    if let Err(err) = try_run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn try_run() -> Result<(), Box<dyn Error>> {
    let config = Cli::parse().map_config()?;

    let map = run(&config)?;
    let (nt, np) = map.grids.shape();
    println!(
        "Wrote {nt} x {np} density grids to {} and {}",
        config.output.gas_density.display(),
        config.output.liquid_density.display()
    );
    if let Some((t, p)) = map.envelope.critical_point() {
        println!("Critical point of the mixture: T = {t:.2} K, p = {p:.4e} Pa");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_run_the_defaults() -> Result<(), Box<dyn Error>> {
        let cli = Cli::try_parse_from(["phasemap"])?;
        assert_eq!(cli.map_config()?, MapConfig::default());
        Ok(())
    }

    #[test]
    fn verbosity_flag() -> Result<(), Box<dyn Error>> {
        let cli = Cli::try_parse_from(["phasemap", "--verbosity", "iter"])?;
        assert_eq!(cli.map_config()?.verbosity, Verbosity::Iter);
        assert!(Cli::try_parse_from(["phasemap", "--grid", "10"]).is_err());
        Ok(())
    }
}
