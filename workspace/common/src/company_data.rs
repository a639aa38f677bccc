use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// One spreadsheet row: column header to cell value.
pub type SpreadsheetRow = BTreeMap<String, serde_json::Value>;

/// Dataset attached to a company.
///
/// The frontend uploads spreadsheets (OTIF, FEFO, supplier scorecards, NCR
/// logs) and stores the parsed rows here. Anything else goes into `Custom`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompanyData {
    Spreadsheet(SpreadsheetUpload),
    Custom {
        #[schema(value_type = Object)]
        value: serde_json::Value,
    },
}

/// Parsed workbook as uploaded by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct SpreadsheetUpload {
    pub file_name: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Rows per sheet name
    #[schema(value_type = Object)]
    #[serde(default)]
    pub sheets: BTreeMap<String, Vec<SpreadsheetRow>>,
}

impl CompanyData {
    /// Total number of rows across all sheets. Custom data counts as zero.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Spreadsheet(upload) => upload.sheets.values().map(Vec::len).sum(),
            Self::Custom { .. } => 0,
        }
    }

    /// Sheet names that are empty or whitespace only.
    pub fn blank_sheet_names(&self) -> usize {
        match self {
            Self::Spreadsheet(upload) => upload
                .sheets
                .keys()
                .filter(|name| name.trim().is_empty())
                .count(),
            Self::Custom { .. } => 0,
        }
    }
}
