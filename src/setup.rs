//! One-time sheet setup
//!
//! `provision` writes the header row for the configured column order;
//! `inspect` reports what the hook would read from, for checking a
//! deployment before pointing forms at it.

use serde::Serialize;

use crate::config::SheetConfig;
use crate::error::StorageError;
use crate::logger;
use crate::report::Schema;
use crate::sheet::SheetStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    pub success: bool,
    pub message: String,
    pub sheet_name: String,
    pub headers: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupSummary {
    pub success: bool,
    pub location: String,
    pub sheet_name: String,
    pub total_rows: usize,
    pub total_columns: usize,
    pub headers: Vec<String>,
}

/// Create the report sheet if missing and write its header row
pub fn provision(store: &dyn SheetStore, sheet: &SheetConfig) -> Result<ProvisionReport, StorageError> {
    let handle = store.insert_sheet(&sheet.name)?;
    let headers = Schema::new(sheet.column_order).headers();
    store.provision_headers(&handle, &headers, &sheet.header_style)?;
    logger::log_info(&format!(
        "Sheet structure created: '{}' ({} columns)",
        handle.name(),
        headers.len()
    ));

    Ok(ProvisionReport {
        success: true,
        message: "Sheet structure created".to_string(),
        sheet_name: handle.name().to_string(),
        headers,
    })
}

/// Describe the sheet requests would land in
pub fn inspect(store: &dyn SheetStore, sheet_name: &str) -> Result<SetupSummary, StorageError> {
    let handle = store.find_or_create_sheet(sheet_name)?;
    let rows = store.read_all(&handle)?;
    let headers = rows.first().cloned().unwrap_or_default();

    Ok(SetupSummary {
        success: true,
        location: store.location(),
        sheet_name: handle.name().to_string(),
        total_rows: rows.len(),
        total_columns: headers.len(),
        headers,
    })
}
