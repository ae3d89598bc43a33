//! Core extractor implementation

use crate::config::{ExtractorConfig, FinancialField};
use crate::error::ExtractorError;
use crate::money_format::parse_brazilian_amount;
use fisiopay_domain::{ExtractedFinancials, Money};
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One compiled rule: field plus a regex per label variant
struct CompiledRule {
    field: FinancialField,
    labels: Vec<Regex>,
}

/// The extractor scans invoice text for labeled monetary amounts
///
/// Missing labels yield absent fields, never errors; only empty input is
/// rejected. The caller decides whether absence is acceptable.
pub struct FinancialExtractor {
    rules: Vec<CompiledRule>,
    section_markers: Vec<String>,
    amount_re: Regex,
}

impl FinancialExtractor {
    /// Build an extractor from a rule table
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let rules = config
            .rules
            .iter()
            .map(|rule| {
                let labels = rule
                    .labels
                    .iter()
                    .map(|label| {
                        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(label)))
                            .map_err(|e| ExtractorError::Config(e.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledRule {
                    field: rule.field,
                    labels,
                })
            })
            .collect::<Result<Vec<_>, ExtractorError>>()?;

        // Amounts end on a digit so trailing punctuation stays out
        let amount_re = Regex::new(r"-?\s*(?:R\$)?\s*-?\d(?:[\d.,]*\d)?")
            .map_err(|e| ExtractorError::Config(e.to_string()))?;

        Ok(Self {
            rules,
            section_markers: config.section_markers,
            amount_re,
        })
    }

    /// Build an extractor with the default RPA rule table
    pub fn with_defaults() -> Result<Self, ExtractorError> {
        Self::new(ExtractorConfig::default())
    }

    /// Extract financial fields from raw invoice text
    ///
    /// Scans line by line. Crossing a section marker starts a new section;
    /// for every field the first match after the most recent section marker
    /// wins, so a `Total` printed inside the deductions section beats one
    /// printed before it. An amount may follow its label on the same line
    /// or lead the next line. Negative amounts are stored as magnitudes.
    pub fn extract(&self, text: &str) -> Result<ExtractedFinancials, ExtractorError> {
        if text.trim().is_empty() {
            return Err(ExtractorError::EmptyInput);
        }

        let lines: Vec<&str> = text.lines().collect();
        let mut section = 0usize;
        let mut found: HashMap<FinancialField, (usize, Money)> = HashMap::new();

        for (i, line) in lines.iter().enumerate() {
            if self.section_markers.iter().any(|m| line.contains(m.as_str())) {
                section += 1;
            }

            for rule in &self.rules {
                // First match within a section wins; a later section resets
                if found.get(&rule.field).is_some_and(|(s, _)| *s == section) {
                    continue;
                }

                let Some(label_end) = rule
                    .labels
                    .iter()
                    .find_map(|re| re.find(line).map(|m| m.end()))
                else {
                    continue;
                };

                let amount = self
                    .first_amount(&line[label_end..])
                    .or_else(|| lines.get(i + 1).and_then(|next| self.first_amount(next)));

                if let Some(value) = amount {
                    debug!(field = ?rule.field, line = i, "matched financial field");
                    found.insert(rule.field, (section, value.abs()));
                }
            }
        }

        let get = |field: FinancialField| found.get(&field).map(|(_, v)| *v);

        let financials = ExtractedFinancials {
            gross_value: get(FinancialField::GrossValue),
            net_value: get(FinancialField::NetValue),
            other_deductions: get(FinancialField::OtherDeductions),
            service_tax: get(FinancialField::ServiceTax),
            income_tax_withholding: get(FinancialField::IncomeTaxWithholding),
            social_security_withholding: get(FinancialField::SocialSecurityWithholding),
            total_deductions: get(FinancialField::TotalDeductions),
        };

        if let (Some(net), Some(gross)) = (financials.net_value, financials.gross_value) {
            // Data-quality anomaly, not a failure: reconciliation is the
            // caller's call
            if net > gross {
                warn!(net = net.cents(), gross = gross.cents(), "net value exceeds gross value");
            }
        }

        Ok(financials)
    }

    fn first_amount(&self, text: &str) -> Option<Money> {
        self.amount_re
            .find(text)
            .and_then(|m| parse_brazilian_amount(m.as_str()))
    }
}
