use super::identifier::Identifier;
use super::{IdentifierOption, ParameterError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Identifier, molar weight and model parameters of one substance.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PureRecord<M> {
    pub identifier: Identifier,
    /// Molar weight in g/mol
    #[serde(default)]
    pub molarweight: f64,
    pub model_record: M,
}

impl<M> PureRecord<M> {
    pub fn new(identifier: Identifier, molarweight: f64, model_record: M) -> Self {
        Self {
            identifier,
            molarweight,
            model_record,
        }
    }

    /// Read the records of `substances` from a json file containing a list of records.
    pub fn from_json<P>(
        substances: &[&str],
        file: P,
        identifier_option: IdentifierOption,
    ) -> Result<Vec<Self>, ParameterError>
    where
        P: AsRef<Path>,
        M: Clone + DeserializeOwned,
    {
        let records: Vec<Self> = serde_json::from_reader(BufReader::new(File::open(file)?))?;
        Self::select(substances, records, identifier_option)
    }

    /// Same as [PureRecord::from_json] for a json string.
    pub fn from_json_str(
        substances: &[&str],
        json: &str,
        identifier_option: IdentifierOption,
    ) -> Result<Vec<Self>, ParameterError>
    where
        M: Clone + DeserializeOwned,
    {
        let records: Vec<Self> = serde_json::from_str(json)?;
        Self::select(substances, records, identifier_option)
    }

    /// Pick the queried substances from a list of records, in the order of the query.
    fn select(
        substances: &[&str],
        available: Vec<Self>,
        identifier_option: IdentifierOption,
    ) -> Result<Vec<Self>, ParameterError> {
        let queried: HashSet<&str> = substances.iter().copied().collect();
        if queried.len() != substances.len() {
            return Err(ParameterError::IncompatibleParameters(
                "a substance was queried more than once".into(),
            ));
        }

        // the first record with a matching identifier wins
        let mut found: HashMap<String, Self> = HashMap::with_capacity(substances.len());
        for record in available {
            match record.identifier.as_string(identifier_option) {
                Some(id) if queried.contains(id.as_str()) && !found.contains_key(&id) => {
                    found.insert(id, record);
                }
                _ => (),
            }
            if found.len() == queried.len() {
                break;
            }
        }

        let missing: Vec<&str> = substances
            .iter()
            .copied()
            .filter(|s| !found.contains_key(*s))
            .collect();
        if !missing.is_empty() {
            return Err(ParameterError::ComponentsNotFound(missing.join(", ")));
        }

        Ok(substances
            .iter()
            .filter_map(|&s| found.remove(s))
            .collect())
    }
}

impl<M: fmt::Display> fmt::Display for PureRecord<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PureRecord({}, molarweight={} g/mol, {})",
            self.identifier, self.molarweight, self.model_record
        )
    }
}

/// Interaction parameters of a pair of substances.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BinaryRecord<I, B> {
    pub id1: I,
    pub id2: I,
    pub model_record: B,
}

impl<I, B> BinaryRecord<I, B> {
    /// Read all records of a json file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Vec<Self>, ParameterError>
    where
        I: DeserializeOwned,
        B: DeserializeOwned,
    {
        Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
    }
}

impl<I: fmt::Display, B: fmt::Display> fmt::Display for BinaryRecord<I, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryRecord({} | {}: {})", self.id1, self.id2, self.model_record)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, Default, Clone)]
    struct TestModelRecord {
        a: f64,
    }

    const RECORDS: &str = r#"
        [
            {
                "identifier": {
                    "cas": "1",
                    "name": "first"
                },
                "molarweight": 1.0,
                "model_record": {
                    "a": 1.0
                }
            },
            {
                "identifier": {
                    "cas": "2",
                    "name": "second"
                },
                "molarweight": 2.0,
                "model_record": {
                    "a": 2.0
                }
            }
        ]"#;

    #[test]
    fn deserialize() {
        let r = r#"
        {
            "identifier": {
                "cas": "124-38-9"
            },
            "molarweight": 44.01,
            "model_record": {
                "a": 0.1
            }
        }
        "#;
        let record: PureRecord<TestModelRecord> =
            serde_json::from_str(r).expect("Unable to parse json.");
        assert_eq!(record.identifier.cas, Some("124-38-9".into()));
        assert_eq!(record.molarweight, 44.01);
    }

    #[test]
    fn select_in_query_order() {
        let records: Vec<PureRecord<TestModelRecord>> =
            PureRecord::from_json_str(&["second", "first"], RECORDS, IdentifierOption::Name)
                .expect("Unable to select records.");
        assert_eq!(records[0].identifier.cas, Some("2".into()));
        assert_eq!(records[1].identifier.cas, Some("1".into()));
    }

    #[test]
    fn missing_component() {
        let records: Result<Vec<PureRecord<TestModelRecord>>, _> =
            PureRecord::from_json_str(&["first", "third"], RECORDS, IdentifierOption::Name);
        assert!(matches!(records, Err(ParameterError::ComponentsNotFound(_))));
    }

    #[test]
    fn duplicate_component() {
        let records: Result<Vec<PureRecord<TestModelRecord>>, _> =
            PureRecord::from_json_str(&["first", "first"], RECORDS, IdentifierOption::Name);
        assert!(matches!(
            records,
            Err(ParameterError::IncompatibleParameters(_))
        ));
    }
}
