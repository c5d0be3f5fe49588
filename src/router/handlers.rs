// Hook handlers: create, list, preflight, diagnostic

use std::sync::Arc;

use serde_json::{json, Value};

use super::types::{HookRequest, HookResponse};
use super::{flatten_join, Router};
use crate::error::{HookResult, StorageError};
use crate::report::{iso_now, to_entries, to_row, Entry, EntryPayload};
use crate::sheet::AppendTicket;

impl Router {
    /// Validate a report payload and append it as one row.
    ///
    /// POST bodies and GET parameters both end up here, so both paths share
    /// validation and mapping.
    pub(super) async fn handle_create(&self, data: Value) -> HookResult<HookResponse> {
        let entry = Entry::try_from(EntryPayload::from_value(data)?)?;
        self.trace(&format!(
            "Adding report for '{}' on {}",
            entry.officer_name(),
            entry.date()
        ));

        let row = to_row(&entry, &self.settings.schema, &iso_now());
        self.append(row).await?;
        self.trace("Row added successfully");

        Ok(HookResponse::success(json!({
            "success": true,
            "message": "Entry added successfully",
            "timestamp": iso_now(),
        })))
    }

    /// Every data row as an object keyed by header, `[]` for an empty sheet
    pub(super) async fn handle_list(&self) -> HookResult<HookResponse> {
        let rows = self
            .run_storage(|store, name| {
                let sheet = store.find_or_create_sheet(name)?;
                store.read_all(&sheet)
            })
            .await?;

        if let Some(headers) = rows.first() {
            self.trace(&format!("Headers: {}", headers.join(", ")));
            self.trace(&format!("Found {} data rows", rows.len() - 1));
        } else {
            self.trace("No data found in sheet");
        }

        Ok(HookResponse::success(Value::Array(to_entries(&rows))))
    }

    pub(super) fn handle_preflight(&self) -> HookResponse {
        self.trace("OPTIONS request received");
        HookResponse::Preflight
    }

    /// Echo what was received, for connectivity checks
    pub(super) fn handle_diagnostic(&self, req: &HookRequest) -> HookResponse {
        self.trace("TEST request received");
        HookResponse::success(json!({
            "success": true,
            "message": "Sheet hook is working",
            "timestamp": iso_now(),
            "method": req.method.as_str(),
            "parameters": req.params,
            "postData": req.body.as_deref().unwrap_or("No postData"),
        }))
    }

    /// Append under the write gate with one deadline for the whole step.
    ///
    /// Waiting for the gate counts against `storage_timeout`. On expiry the
    /// ticket is abandoned, so a late writer drops the row instead of storing
    /// it after the caller was told it failed. A write that already committed
    /// is awaited and reported as it ended.
    async fn append(&self, row: Vec<String>) -> Result<(), StorageError> {
        let ticket = AppendTicket::new();
        let gate = Arc::clone(&self.write_gate);
        let store = Arc::clone(&self.store);
        let sheet_name = self.settings.sheet_name.clone();
        let writer_ticket = ticket.clone();

        let write = async move {
            let gate = gate.lock_owned().await;
            tokio::task::spawn_blocking(move || {
                let _gate = gate;
                let sheet = store.find_or_create_sheet(&sheet_name)?;
                store.commit_row(&sheet, &row, &writer_ticket)
            })
            .await
        };
        tokio::pin!(write);

        match tokio::time::timeout(self.settings.storage_timeout, &mut write).await {
            Ok(joined) => flatten_join(joined),
            Err(_) if ticket.abandon() => Err(StorageError::Timeout),
            Err(_) => flatten_join(write.await),
        }
    }
}
