use crate::errors::{MapError, MapResult};
use phasemap_core::parameter::IdentifierOption;
use phasemap_core::Verbosity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const COMPOSITION_TOLERANCE: f64 = 1e-10;

/// Handling of grid points at which the solver fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing point and report it.
    #[default]
    Abort,
    /// Store NaN in both grids and continue.
    Nan,
}

/// An evenly spaced axis of the density map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub min: f64,
    pub max: f64,
    pub points: usize,
}

impl AxisConfig {
    pub fn new(min: f64, max: f64, points: usize) -> Self {
        Self { min, max, points }
    }

    fn validate(&self, name: &str) -> MapResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min >= self.max {
            return Err(MapError::InvalidConfig(format!(
                "{name} axis must be increasing, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.points < 2 {
            return Err(MapError::InvalidConfig(format!(
                "{name} axis needs at least two points, got {}",
                self.points
            )));
        }
        Ok(())
    }
}

/// Pressure bounds of the phase envelope in Pa.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub initial_pressure: f64,
    pub maximum_pressure: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            initial_pressure: 1e4,
            maximum_pressure: 1.5e7,
        }
    }
}

/// Json files with Peng-Robinson parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterFiles {
    pub pure: PathBuf,
    #[serde(default)]
    pub binary: Option<PathBuf>,
}

/// Output locations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub gas_density: PathBuf,
    pub liquid_density: PathBuf,
    pub figure: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            gas_density: PathBuf::from("Rhog.txt"),
            liquid_density: PathBuf::from("Rhol.txt"),
            figure: Some(PathBuf::from("density.png")),
        }
    }
}

/// Settings of a density map run.
///
/// Every field has a default, so an empty json object reproduces the
/// CO2/N2 map at 85/15 mol-% on a 500 x 500 grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Substance names used to look up parameters.
    pub components: Vec<String>,
    /// Feed mole fractions.
    pub composition: Vec<f64>,
    /// Molar masses in g/mol used to convert molar into mass densities.
    pub molar_masses: Vec<f64>,
    /// Temperature axis in K.
    pub temperature: AxisConfig,
    /// Pressure axis in Pa.
    pub pressure: AxisConfig,
    pub envelope: EnvelopeConfig,
    /// If not given, the built-in parameter set is used.
    pub parameters: Option<ParameterFiles>,
    pub identifier_option: IdentifierOption,
    pub output: OutputConfig,
    pub on_failure: FailurePolicy,
    pub verbosity: Verbosity,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            components: vec!["carbon dioxide".to_owned(), "nitrogen".to_owned()],
            composition: vec![0.85, 0.15],
            molar_masses: vec![44.01, 28.02],
            temperature: AxisConfig::new(-10.0 + 273.15, 25.0 + 273.15, 500),
            pressure: AxisConfig::new(4e6, 10e6, 500),
            envelope: EnvelopeConfig::default(),
            parameters: None,
            identifier_option: IdentifierOption::Name,
            output: OutputConfig::default(),
            on_failure: FailurePolicy::Abort,
            verbosity: Verbosity::None,
        }
    }
}

impl MapConfig {
    /// Read a configuration from a json file and validate it.
    pub fn from_json<P: AsRef<Path>>(file: P) -> MapResult<Self> {
        let content = fs::read_to_string(file)?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from a json string and validate it.
    pub fn from_json_str(json: &str) -> MapResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MapResult<()> {
        let n = self.components.len();
        if n == 0 {
            return Err(MapError::InvalidConfig("no components given".to_owned()));
        }
        if self.composition.len() != n || self.molar_masses.len() != n {
            return Err(MapError::InvalidConfig(format!(
                "expected {n} mole fractions and molar masses, got {} and {}",
                self.composition.len(),
                self.molar_masses.len()
            )));
        }
        if self.composition.iter().any(|&x| !(0.0..=1.0).contains(&x)) {
            return Err(MapError::InvalidConfig(
                "mole fractions must lie between 0 and 1".to_owned(),
            ));
        }
        let sum: f64 = self.composition.iter().sum();
        if (sum - 1.0).abs() > COMPOSITION_TOLERANCE {
            return Err(MapError::InvalidConfig(format!(
                "mole fractions sum to {sum} instead of 1"
            )));
        }
        if self.molar_masses.iter().any(|&m| !(m > 0.0 && m.is_finite())) {
            return Err(MapError::InvalidConfig(
                "molar masses must be positive".to_owned(),
            ));
        }
        self.temperature.validate("temperature")?;
        self.pressure.validate("pressure")?;
        if self.temperature.min <= 0.0 || self.pressure.min <= 0.0 {
            return Err(MapError::InvalidConfig(
                "temperatures and pressures must be positive".to_owned(),
            ));
        }
        let envelope = &self.envelope;
        if !(envelope.initial_pressure > 0.0
            && envelope.initial_pressure < envelope.maximum_pressure)
        {
            return Err(MapError::InvalidConfig(format!(
                "envelope pressure bounds must be increasing, got [{}, {}]",
                envelope.initial_pressure, envelope.maximum_pressure
            )));
        }
        Ok(())
    }
}
