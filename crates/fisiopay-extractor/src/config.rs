//! Configuration for the financial-field extractor
//!
//! The rule table maps label variants to target fields. Defaults carry the
//! vocabulary of the RPA receipt layout; other layouts are added by
//! extending the table in configuration, not by touching the scanner.

use serde::{Deserialize, Serialize};

/// Target field of an extraction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialField {
    /// Gross service value
    GrossValue,
    /// Net value after deductions
    NetValue,
    /// Other deductions
    OtherDeductions,
    /// Municipal service tax (ISS)
    ServiceTax,
    /// Income tax withholding (IRRF)
    IncomeTaxWithholding,
    /// Social security withholding (INSS)
    SocialSecurityWithholding,
    /// Printed deductions total
    TotalDeductions,
}

/// One extraction rule: any of the label variants marks the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field the rule extracts into
    pub field: FinancialField,

    /// Label variants, matched case-insensitively on word boundaries
    pub labels: Vec<String>,
}

/// Configuration for the extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Extraction rules, scanned in order on every line
    pub rules: Vec<FieldRule>,

    /// Section-reset markers, matched case-sensitively so that a header
    /// line like `DESCONTOS` resets the scan without an inline mention
    /// ("Outros Descontos") doing the same
    #[serde(default)]
    pub section_markers: Vec<String>,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rules.is_empty() {
            return Err("rules must not be empty".to_string());
        }
        for rule in &self.rules {
            if rule.labels.is_empty() {
                return Err(format!("rule for {:?} has no labels", rule.field));
            }
            if rule.labels.iter().any(|l| l.trim().is_empty()) {
                return Err(format!("rule for {:?} has a blank label", rule.field));
            }
        }
        if self.section_markers.iter().any(|m| m.trim().is_empty()) {
            return Err("section markers must not be blank".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    /// Default rule table for the RPA receipt layout, accented and
    /// unaccented variants both listed because extracted PDF text is
    /// inconsistent about diacritics
    fn default() -> Self {
        fn rule(field: FinancialField, labels: &[&str]) -> FieldRule {
            FieldRule {
                field,
                labels: labels.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self {
            rules: vec![
                rule(
                    FinancialField::GrossValue,
                    &["Valor Serviço Prestado", "Valor Servico Prestado", "Valor Bruto"],
                ),
                rule(
                    FinancialField::NetValue,
                    &["Valor Líquido", "Valor Liquido"],
                ),
                rule(FinancialField::OtherDeductions, &["Outros Descontos"]),
                rule(FinancialField::ServiceTax, &["ISS"]),
                rule(FinancialField::IncomeTaxWithholding, &["IRRF"]),
                rule(
                    FinancialField::SocialSecurityWithholding,
                    &["Dedução INSS", "Deducao INSS", "INSS"],
                ),
                rule(
                    FinancialField::TotalDeductions,
                    &["Total de Descontos", "Total"],
                ),
            ],
            section_markers: vec!["DESCONTOS".to_string()],
        }
    }
}
