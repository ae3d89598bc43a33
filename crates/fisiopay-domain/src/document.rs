//! Document module - uploaded payment artifacts

use crate::month::ReferenceMonth;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of an uploaded payment document
///
/// Closed set: only these artifacts are accepted on the upload boundary.
/// RPA receipts are the one kind that goes through text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Self-employment service receipt (the parsed kind)
    Rpa,

    /// Fiscal invoice (nota fiscal)
    #[serde(rename = "nf")]
    Invoice,

    /// PIX transfer receipt
    #[serde(rename = "pix")]
    PixReceipt,
}

impl DocumentKind {
    /// Wire form used in the `fileType` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Rpa => "rpa",
            DocumentKind::Invoice => "nf",
            DocumentKind::PixReceipt => "pix",
        }
    }

    /// Upper-case prefix used in stored filenames
    pub fn file_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Rpa => "RPA",
            DocumentKind::Invoice => "NF",
            DocumentKind::PixReceipt => "PIX",
        }
    }

    /// Parse a kind from its wire form
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rpa" => Some(DocumentKind::Rpa),
            "nf" => Some(DocumentKind::Invoice),
            "pix" => Some(DocumentKind::PixReceipt),
            _ => None,
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document kind: {}", s))
    }
}

/// A stored payment document
///
/// The stored path is deterministic per (month, kind, physiotherapist), so a
/// re-upload lands on the same path and overwrites the previous artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    /// Owning physiotherapist
    pub physiotherapist_id: u32,

    /// Declared document kind
    pub kind: DocumentKind,

    /// Filename as uploaded by the client
    pub original_name: String,

    /// Deterministic filename under the month directory
    pub file_name: String,

    /// Full stored path
    pub stored_path: PathBuf,

    /// Reference month the document belongs to
    pub reference_month: ReferenceMonth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [DocumentKind::Rpa, DocumentKind::Invoice, DocumentKind::PixReceipt] {
            assert_eq!(DocumentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(DocumentKind::parse("RPA"), Some(DocumentKind::Rpa));
        assert_eq!(DocumentKind::parse("docx"), None);
    }

    #[test]
    fn test_file_prefixes() {
        assert_eq!(DocumentKind::Rpa.file_prefix(), "RPA");
        assert_eq!(DocumentKind::Invoice.file_prefix(), "NF");
        assert_eq!(DocumentKind::PixReceipt.file_prefix(), "PIX");
    }
}
