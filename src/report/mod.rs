//! Visit report model
//!
//! Field definitions, column layouts, entry validation and row mapping.

mod entry;
mod mapper;
mod schema;

pub use entry::{Entry, EntryPayload};
pub use mapper::{to_entries, to_row};
pub use schema::{ColumnOrder, Schema};

use chrono::{SecondsFormat, Utc};

/// Current UTC time as ISO-8601 with millisecond precision (`...T10:11:12.345Z`)
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
