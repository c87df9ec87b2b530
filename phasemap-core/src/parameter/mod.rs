//! Parameter records and their assembly into model parameters.
//!
//! Pure substance records and binary interaction records are read from json
//! files (or strings) and looked up by one of the identifiers of a substance.
use ndarray::Array2;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;

mod identifier;
mod model_record;

pub use identifier::{Identifier, IdentifierOption};
pub use model_record::{BinaryRecord, PureRecord};

/// Constructor methods for parameters.
///
/// Implementors only provide [Parameter::from_records]; all other
/// constructors look up and order the records before calling it.
pub trait Parameter: Sized {
    type Pure: Clone + DeserializeOwned;
    type Binary: Clone + DeserializeOwned + Default;

    /// Creates parameters from records for pure substances and an optional
    /// matrix of binary parameters.
    fn from_records(
        pure_records: Vec<PureRecord<Self::Pure>>,
        binary_records: Option<Array2<Self::Binary>>,
    ) -> Result<Self, ParameterError>;

    /// Creates parameters for a binary mixture with a single, symmetric
    /// binary parameter.
    fn new_binary(
        pure_records: Vec<PureRecord<Self::Pure>>,
        binary_record: Option<Self::Binary>,
    ) -> Result<Self, ParameterError> {
        let matrix = binary_record.map(|b| {
            let mut m = Array2::from_elem([2, 2], Self::Binary::default());
            m[(0, 1)] = b.clone();
            m[(1, 0)] = b;
            m
        });
        Self::from_records(pure_records, matrix)
    }

    /// Arrange binary records in a matrix that matches the order of the pure
    /// records. Pairs without a record get the default binary parameter.
    fn binary_matrix_from_records(
        pure_records: &[PureRecord<Self::Pure>],
        binary_records: &[BinaryRecord<Identifier, Self::Binary>],
        identifier_option: IdentifierOption,
    ) -> Result<Option<Array2<Self::Binary>>, ParameterError> {
        if binary_records.is_empty() {
            return Ok(None);
        }

        let mut pairs = HashMap::with_capacity(2 * binary_records.len());
        for record in binary_records {
            if let (Some(id1), Some(id2)) = (
                record.id1.as_string(identifier_option),
                record.id2.as_string(identifier_option),
            ) {
                pairs.insert((id2.clone(), id1.clone()), record.model_record.clone());
                pairs.insert((id1, id2), record.model_record.clone());
            }
        }

        let ids = pure_records
            .iter()
            .map(|r| r.identifier.as_string(identifier_option))
            .collect::<Option<Vec<_>>>()
            .ok_or(ParameterError::InsufficientInformation)?;

        let n = ids.len();
        Ok(Some(Array2::from_shape_fn([n, n], |(i, j)| {
            pairs
                .get(&(ids[i].clone(), ids[j].clone()))
                .cloned()
                .unwrap_or_default()
        })))
    }

    /// Look up `substances` in a list of pure records and combine them with
    /// the matching binary records.
    fn from_pure_and_binary_records(
        pure_records: Vec<PureRecord<Self::Pure>>,
        binary_records: &[BinaryRecord<Identifier, Self::Binary>],
        identifier_option: IdentifierOption,
    ) -> Result<Self, ParameterError> {
        let matrix =
            Self::binary_matrix_from_records(&pure_records, binary_records, identifier_option)?;
        Self::from_records(pure_records, matrix)
    }

    /// Creates parameters from json files with pure substance records and,
    /// optionally, binary records.
    fn from_json<P>(
        substances: Vec<&str>,
        file_pure: P,
        file_binary: Option<P>,
        identifier_option: IdentifierOption,
    ) -> Result<Self, ParameterError>
    where
        P: AsRef<Path>,
    {
        let pure_records = PureRecord::from_json(&substances, file_pure, identifier_option)?;
        let binary_records = match file_binary {
            Some(file) => BinaryRecord::from_json(file)?,
            None => Vec::new(),
        };
        Self::from_pure_and_binary_records(pure_records, &binary_records, identifier_option)
    }

    /// Creates parameters from json strings, e.g. parameter files embedded
    /// into an executable.
    fn from_json_str(
        substances: &[&str],
        pure_json: &str,
        binary_json: Option<&str>,
        identifier_option: IdentifierOption,
    ) -> Result<Self, ParameterError> {
        let pure_records = PureRecord::from_json_str(substances, pure_json, identifier_option)?;
        let binary_records: Vec<BinaryRecord<Identifier, Self::Binary>> = binary_json
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();
        Self::from_pure_and_binary_records(pure_records, &binary_records, identifier_option)
    }
}

/// Errors while reading or combining parameter records.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("no parameters found for: {0}")]
    ComponentsNotFound(String),
    #[error("a substance lacks the identifier used to look up binary parameters")]
    InsufficientInformation,
    #[error("incompatible parameters: {0}")]
    IncompatibleParameters(String),
}
