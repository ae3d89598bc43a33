//! Upload orchestrator
//!
//! Validates the upload, persists the file, and - for RPA receipts only -
//! runs the sandbox and the extractor. A failure in that secondary step is
//! reported as a warning on the response instead of failing the request:
//! the stored artifact has independent value even when parsing does not
//! work out.

use crate::handlers::{AppError, AppState};
use fisiopay_domain::{DocumentKind, ExtractedFinancials, Money, ReferenceMonth};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parsed RPA values on the upload response, all in minor units
#[derive(Debug, Clone, Serialize)]
pub struct RpaData {
    /// Gross service value
    #[serde(rename = "valorBruto")]
    pub valor_bruto: Option<Money>,

    /// Net value
    #[serde(rename = "valorLiquido")]
    pub valor_liquido: Option<Money>,

    /// Other deductions
    #[serde(rename = "outrosDescontos")]
    pub outros_descontos: Option<Money>,

    /// Municipal service tax withholding
    pub iss: Option<Money>,

    /// Income tax withholding
    pub irrf: Option<Money>,

    /// Social security withholding
    pub inss: Option<Money>,

    /// Deductions total (printed, or the sum of the components)
    #[serde(rename = "totalDescontos")]
    pub total_descontos: Money,
}

impl From<&ExtractedFinancials> for RpaData {
    fn from(fin: &ExtractedFinancials) -> Self {
        Self {
            valor_bruto: fin.gross_value,
            valor_liquido: fin.net_value,
            outros_descontos: fin.other_deductions,
            iss: fin.service_tax,
            irrf: fin.income_tax_withholding,
            inss: fin.social_security_withholding,
            total_descontos: fin.total_deductions_or_sum(),
        }
    }
}

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Always true - failures surface as error responses
    pub success: bool,

    /// Deterministic stored filename
    pub file_name: String,

    /// Full stored path
    pub file_path: String,

    /// Owning physiotherapist
    pub physiotherapist_id: u32,

    /// Declared document kind
    pub file_type: DocumentKind,

    /// Parsed RPA values; null for non-RPA kinds and on extraction failure
    pub rpa_data: Option<RpaData>,

    /// Present when RPA extraction failed but the file was stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Run one upload through the pipeline
pub async fn process_upload(
    state: &AppState,
    month: &ReferenceMonth,
    kind: DocumentKind,
    physiotherapist_id: u32,
    original_name: &str,
    data: Vec<u8>,
) -> Result<UploadResponse, AppError> {
    let physiotherapist = state.registry.get(physiotherapist_id).ok_or_else(|| {
        AppError::NotFound(format!("Physiotherapist {} not found", physiotherapist_id))
    })?;

    let document = state
        .store
        .store_document(
            month,
            kind,
            physiotherapist_id,
            &physiotherapist.name,
            original_name,
            data,
        )
        .await?;

    let (rpa_data, warning) = if kind == DocumentKind::Rpa {
        match extract_financials(state, &document.stored_path).await {
            Ok(financials) => {
                attach_to_ledger(state, month, physiotherapist_id, &financials);
                (Some(RpaData::from(&financials)), None)
            }
            Err(message) => {
                warn!(
                    pdf = %document.stored_path.display(),
                    error = %message,
                    "RPA extraction failed; file kept"
                );
                (None, Some(message))
            }
        }
    } else {
        (None, None)
    };

    info!(
        month = %month,
        physiotherapist = physiotherapist_id,
        kind = kind.as_str(),
        parsed = rpa_data.is_some(),
        "payment document uploaded"
    );

    Ok(UploadResponse {
        success: true,
        file_name: document.file_name,
        file_path: document.stored_path.display().to_string(),
        physiotherapist_id,
        file_type: kind,
        rpa_data,
        warning,
    })
}

/// Sandbox then extractor; both failure kinds collapse into the warning
/// message the response carries
async fn extract_financials(state: &AppState, pdf_path: &Path) -> Result<ExtractedFinancials, String> {
    let text = state
        .sandbox
        .extract_text(pdf_path)
        .await
        .map_err(|e| e.to_string())?;

    state.extractor.extract(&text).map_err(|e| e.to_string())
}

/// Best-effort: when the month's control has a record for this
/// physiotherapist, write the parsed values into it
fn attach_to_ledger(
    state: &AppState,
    month: &ReferenceMonth,
    physiotherapist_id: u32,
    financials: &ExtractedFinancials,
) {
    if !state.ledger.is_open(month) {
        return;
    }
    if let Err(e) =
        state
            .ledger
            .attach_financials_by_physiotherapist(month, physiotherapist_id, financials)
    {
        debug!(error = %e, "no ledger record to attach financials to");
    }
}
