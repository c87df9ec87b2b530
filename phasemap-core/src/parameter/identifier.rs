use serde::{Deserialize, Serialize};
use std::fmt;

/// The identifier that is used to look up substances in parameter files.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierOption {
    Cas,
    #[default]
    Name,
    IupacName,
    Smiles,
    Inchi,
    Formula,
}

impl IdentifierOption {
    const ALL: [Self; 6] = [
        Self::Cas,
        Self::Name,
        Self::IupacName,
        Self::Smiles,
        Self::Inchi,
        Self::Formula,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Cas => "cas",
            Self::Name => "name",
            Self::IupacName => "iupac_name",
            Self::Smiles => "smiles",
            Self::Inchi => "inchi",
            Self::Formula => "formula",
        }
    }
}

/// Names and keys of a substance. Every field is optional in parameter files.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iupac_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smiles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inchi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Identifier {
    /// Create a new identifier.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use phasemap_core::parameter::Identifier;
    /// let co2 = Identifier::new(
    ///     Some("124-38-9"),
    ///     Some("carbon dioxide"),
    ///     None,
    ///     Some("O=C=O"),
    ///     Some("InChI=1S/CO2/c2-1-3"),
    ///     Some("CO2")
    /// );
    /// ```
    pub fn new(
        cas: Option<&str>,
        name: Option<&str>,
        iupac_name: Option<&str>,
        smiles: Option<&str>,
        inchi: Option<&str>,
        formula: Option<&str>,
    ) -> Identifier {
        let owned = |s: Option<&str>| s.map(String::from);
        Identifier {
            cas: owned(cas),
            name: owned(name),
            iupac_name: owned(iupac_name),
            smiles: owned(smiles),
            inchi: owned(inchi),
            formula: owned(formula),
        }
    }

    fn get(&self, option: IdentifierOption) -> Option<&String> {
        match option {
            IdentifierOption::Cas => self.cas.as_ref(),
            IdentifierOption::Name => self.name.as_ref(),
            IdentifierOption::IupacName => self.iupac_name.as_ref(),
            IdentifierOption::Smiles => self.smiles.as_ref(),
            IdentifierOption::Inchi => self.inchi.as_ref(),
            IdentifierOption::Formula => self.formula.as_ref(),
        }
    }

    pub fn as_string(&self, option: IdentifierOption) -> Option<String> {
        self.get(option).cloned()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<_> = IdentifierOption::ALL
            .into_iter()
            .filter_map(|o| self.get(o).map(|id| format!("{}={id}", o.key())))
            .collect();
        write!(f, "Identifier({})", ids.join(", "))
    }
}
