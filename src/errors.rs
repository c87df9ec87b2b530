use phasemap_core::parameter::ParameterError;
use phasemap_core::EosError;
use std::io;
use thiserror::Error;

/// Error type of the density map.
#[derive(Error, Debug)]
pub enum MapError {
    #[error(transparent)]
    EosError(#[from] EosError),
    #[error(transparent)]
    ParameterError(#[from] ParameterError),
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error("Solver failed at T = {temperature} K and p = {pressure} Pa: {source}")]
    PointFailed {
        temperature: f64,
        pressure: f64,
        #[source]
        source: EosError,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Malformed grid file: {0}")]
    MalformedGrid(String),
    #[error("Plotting failed: {0}")]
    PlotError(String),
}

/// Convenience type for `Result<T, MapError>`.
pub type MapResult<T> = Result<T, MapError>;
