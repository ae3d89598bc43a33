//! Physiotherapist module - the registered payees

use serde::{Deserialize, Serialize};

/// Contract type of a payee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    /// Legal entity (pessoa jurídica) - paid against an invoice (NF)
    #[serde(rename = "PJ")]
    Pj,

    /// Self-employed - paid against an RPA receipt
    #[serde(rename = "RPA")]
    Rpa,

    /// No formal contract on file
    #[serde(rename = "NO_CONTRACT")]
    NoContract,
}

impl ContractType {
    /// Get the contract type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Pj => "PJ",
            ContractType::Rpa => "RPA",
            ContractType::NoContract => "NO_CONTRACT",
        }
    }

    /// Parse a contract type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PJ" => Some(ContractType::Pj),
            "RPA" => Some(ContractType::Rpa),
            "NO_CONTRACT" => Some(ContractType::NoContract),
            _ => None,
        }
    }
}

impl std::str::FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid contract type: {}", s))
    }
}

/// A registered physiotherapist
///
/// Identifiers are small integers because they cross the upload boundary as
/// decimal strings in form fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Physiotherapist {
    /// Registry identifier
    pub id: u32,

    /// Full name (sanitized into stored filenames)
    pub name: String,

    /// Contact e-mail for payment notifications
    pub email: Option<String>,

    /// Contract type
    pub contract_type: ContractType,

    /// Whether this physiotherapist is active (inactive ones are not seeded
    /// into new monthly controls)
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_type_round_trip() {
        for ct in [ContractType::Pj, ContractType::Rpa, ContractType::NoContract] {
            assert_eq!(ContractType::parse(ct.as_str()), Some(ct));
        }
        assert_eq!(ContractType::parse("freelance"), None);
    }

    #[test]
    fn test_contract_type_wire_form() {
        assert_eq!(
            serde_json::to_string(&ContractType::NoContract).unwrap(),
            r#""NO_CONTRACT""#
        );
        let ct: ContractType = serde_json::from_str(r#""RPA""#).unwrap();
        assert_eq!(ct, ContractType::Rpa);
    }
}
