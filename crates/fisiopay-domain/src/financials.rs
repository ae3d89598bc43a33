//! Extracted financial fields of an RPA receipt

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// The monetary fields extracted from one RPA document
///
/// Every field is optional because real invoices vary in layout and the
/// extractor never fails on "label not found". The set is immutable once
/// produced; a re-upload discards it and extracts again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFinancials {
    /// Gross service value (Valor Serviço Prestado / Valor Bruto)
    pub gross_value: Option<Money>,

    /// Net value after deductions (Valor Líquido)
    pub net_value: Option<Money>,

    /// Other deductions (Outros Descontos)
    pub other_deductions: Option<Money>,

    /// Municipal service tax withholding (ISS)
    pub service_tax: Option<Money>,

    /// Income tax withholding (IRRF)
    pub income_tax_withholding: Option<Money>,

    /// Social security withholding (INSS)
    pub social_security_withholding: Option<Money>,

    /// Deductions total as printed in the DESCONTOS section, when present
    pub total_deductions: Option<Money>,
}

impl ExtractedFinancials {
    /// The deductions total: the printed value when the document carries
    /// one, otherwise the sum of the individual components.
    pub fn total_deductions_or_sum(&self) -> Money {
        self.total_deductions.unwrap_or_else(|| {
            [
                self.other_deductions,
                self.service_tax,
                self.income_tax_withholding,
                self.social_security_withholding,
            ]
            .into_iter()
            .flatten()
            .sum()
        })
    }

    /// Whether extraction found nothing at all
    pub fn is_empty(&self) -> bool {
        self.gross_value.is_none()
            && self.net_value.is_none()
            && self.other_deductions.is_none()
            && self.service_tax.is_none()
            && self.income_tax_withholding.is_none()
            && self.social_security_withholding.is_none()
            && self.total_deductions.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_prefers_printed_value() {
        let fin = ExtractedFinancials {
            income_tax_withholding: Some(Money::from_cents(9226)),
            social_security_withholding: Some(Money::from_cents(42350)),
            total_deductions: Some(Money::from_cents(51576)),
            ..Default::default()
        };
        assert_eq!(fin.total_deductions_or_sum(), Money::from_cents(51576));
    }

    #[test]
    fn test_total_falls_back_to_component_sum() {
        let fin = ExtractedFinancials {
            other_deductions: Some(Money::from_cents(100)),
            service_tax: Some(Money::from_cents(200)),
            income_tax_withholding: Some(Money::from_cents(300)),
            ..Default::default()
        };
        assert_eq!(fin.total_deductions_or_sum(), Money::from_cents(600));
    }

    #[test]
    fn test_empty() {
        assert!(ExtractedFinancials::default().is_empty());
        assert_eq!(
            ExtractedFinancials::default().total_deductions_or_sum(),
            Money::ZERO
        );

        let fin = ExtractedFinancials {
            net_value: Some(Money::from_cents(1)),
            ..Default::default()
        };
        assert!(!fin.is_empty());
    }
}
