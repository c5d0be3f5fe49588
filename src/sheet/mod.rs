//! Sheet storage port
//!
//! The router only talks to a [`SheetStore`]. Two backends exist:
//! - [`MemoryWorkbook`] keeps rows in process memory
//! - [`CsvWorkbook`] keeps one CSV file per sheet in a directory
//!
//! Calls are blocking; the router moves them onto the blocking pool.

mod csv_store;
mod memory;

pub use csv_store::CsvWorkbook;
pub use memory::MemoryWorkbook;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::config::HeaderStyle;
use crate::error::StorageError;

/// Reference to a sheet inside a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    name: String,
}

impl SheetHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

const PENDING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

/// One-shot decision between the writer and the caller waiting on it.
///
/// The store calls [`AppendTicket::commit`] right before the write becomes
/// visible; a caller that gave up calls [`AppendTicket::abandon`]. Exactly one
/// of the two succeeds.
#[derive(Debug, Clone, Default)]
pub struct AppendTicket {
    state: Arc<AtomicU8>,
}

impl AppendTicket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the write; `false` once the caller has abandoned it
    pub fn commit(&self) -> bool {
        self.state
            .compare_exchange(PENDING, COMMITTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Give up on the write; `false` when the write is already committed
    pub fn abandon(&self) -> bool {
        self.state
            .compare_exchange(PENDING, ABANDONED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Tabular store holding named sheets of string cells
pub trait SheetStore: Send + Sync {
    /// Look up `name`, falling back to the active sheet when it does not exist
    fn find_or_create_sheet(&self, name: &str) -> Result<SheetHandle, StorageError>;

    /// Look up `name`, creating it when missing
    fn insert_sheet(&self, name: &str) -> Result<SheetHandle, StorageError>;

    /// Append one row unless `ticket` was abandoned before the write.
    ///
    /// Implementations call `ticket.commit()` after every step that can stall
    /// and return [`StorageError::Timeout`] without writing when it fails.
    fn commit_row(
        &self,
        sheet: &SheetHandle,
        values: &[String],
        ticket: &AppendTicket,
    ) -> Result<(), StorageError>;

    fn append_row(&self, sheet: &SheetHandle, values: &[String]) -> Result<(), StorageError> {
        self.commit_row(sheet, values, &AppendTicket::new())
    }

    /// All rows, header row first; empty when the sheet has no rows
    fn read_all(&self, sheet: &SheetHandle) -> Result<Vec<Vec<String>>, StorageError>;

    /// Write `headers` as row 0, replacing an existing header row
    fn provision_headers(
        &self,
        sheet: &SheetHandle,
        headers: &[String],
        style: &HeaderStyle,
    ) -> Result<(), StorageError>;

    /// Human readable identifier of the backing workbook
    fn location(&self) -> String;
}

pub type SharedStore = Arc<dyn SheetStore>;
