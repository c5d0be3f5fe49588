//! Report fields and column layouts
//!
//! A visit report has a fixed set of named fields. A [`Schema`] fixes the
//! position of every field in a sheet row.

use serde::Deserialize;

/// One named field of a visit report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Date,
    OfficerName,
    PlannedAreas,
    ActualAreas,
    DoctorsVisited,
    PharmaciesVisited,
    Orders,
    Returns,
    Notes,
}

impl Field {
    /// Header text used in the sheet and as the JSON key
    pub const fn header(self) -> &'static str {
        match self {
            Self::Timestamp => "Timestamp",
            Self::Date => "Date",
            Self::OfficerName => "Officer Name",
            Self::PlannedAreas => "Planned Areas",
            Self::ActualAreas => "Actual Areas",
            Self::DoctorsVisited => "Doctors Visited",
            Self::PharmaciesVisited => "Pharmacies Visited",
            Self::Orders => "Orders",
            Self::Returns => "Returns",
            Self::Notes => "Notes",
        }
    }

    /// camelCase key accepted when the header key is not present
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::OfficerName => "officerName",
            Self::PlannedAreas => "plannedAreas",
            Self::ActualAreas => "actualAreas",
            Self::DoctorsVisited => "doctorsVisited",
            Self::PharmaciesVisited => "pharmaciesVisited",
            Self::Orders => "orders",
            Self::Returns => "returns",
            Self::Notes => "notes",
        }
    }
}

/// Report columns without the timestamp, in sheet order
const REPORT_COLUMNS: [Field; 9] = [
    Field::Date,
    Field::OfficerName,
    Field::PlannedAreas,
    Field::ActualAreas,
    Field::DoctorsVisited,
    Field::PharmaciesVisited,
    Field::Orders,
    Field::Returns,
    Field::Notes,
];

/// Where the timestamp column sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrder {
    #[default]
    TimestampFirst,
    /// Layout of sheets created by the legacy script
    TimestampLast,
}

/// Ordered column layout of a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Field>,
}

impl Schema {
    pub fn new(order: ColumnOrder) -> Self {
        let mut columns = Vec::with_capacity(REPORT_COLUMNS.len() + 1);
        match order {
            ColumnOrder::TimestampFirst => {
                columns.push(Field::Timestamp);
                columns.extend_from_slice(&REPORT_COLUMNS);
            }
            ColumnOrder::TimestampLast => {
                columns.extend_from_slice(&REPORT_COLUMNS);
                columns.push(Field::Timestamp);
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    /// Header row for this layout
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|f| f.header().to_string()).collect()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(ColumnOrder::default())
    }
}
