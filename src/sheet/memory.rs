// In-memory workbook backend

use std::sync::{Mutex, MutexGuard};

use super::{AppendTicket, SheetHandle, SheetStore};
use crate::config::HeaderStyle;
use crate::error::StorageError;

struct MemorySheet {
    name: String,
    rows: Vec<Vec<String>>,
    header_style: Option<HeaderStyle>,
}

impl MemorySheet {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
            header_style: None,
        }
    }
}

struct Workbook {
    sheets: Vec<MemorySheet>,
    /// Created with the workbook; sheets are never removed
    active: String,
}

impl Workbook {
    fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    fn sheet_mut(&mut self, handle: &SheetHandle) -> &mut MemorySheet {
        if let Some(index) = self.position(handle.name()) {
            return &mut self.sheets[index];
        }
        self.sheets.push(MemorySheet::new(handle.name()));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }
}

/// Workbook held in process memory, starting with one empty active sheet
pub struct MemoryWorkbook {
    inner: Mutex<Workbook>,
}

impl MemoryWorkbook {
    pub fn new(active_sheet: &str) -> Self {
        Self {
            inner: Mutex::new(Workbook {
                sheets: vec![MemorySheet::new(active_sheet)],
                active: active_sheet.to_string(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Workbook>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Task("workbook lock poisoned".to_string()))
    }

    /// Style recorded by the last `provision_headers` call
    #[cfg(test)]
    pub fn header_style(&self, name: &str) -> Option<HeaderStyle> {
        let book = self.inner.lock().ok()?;
        let index = book.position(name)?;
        book.sheets[index].header_style.clone()
    }

    /// Names of all sheets in creation order
    #[cfg(test)]
    pub fn sheet_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|book| book.sheets.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl SheetStore for MemoryWorkbook {
    fn find_or_create_sheet(&self, name: &str) -> Result<SheetHandle, StorageError> {
        let book = self.lock()?;
        if book.position(name).is_some() {
            return Ok(SheetHandle::new(name));
        }
        Ok(SheetHandle::new(book.active.clone()))
    }

    fn insert_sheet(&self, name: &str) -> Result<SheetHandle, StorageError> {
        let mut book = self.lock()?;
        if book.position(name).is_none() {
            book.sheets.push(MemorySheet::new(name));
        }
        Ok(SheetHandle::new(name))
    }

    fn commit_row(
        &self,
        sheet: &SheetHandle,
        values: &[String],
        ticket: &AppendTicket,
    ) -> Result<(), StorageError> {
        let mut book = self.lock()?;
        if !ticket.commit() {
            return Err(StorageError::Timeout);
        }
        book.sheet_mut(sheet).rows.push(values.to_vec());
        Ok(())
    }

    fn read_all(&self, sheet: &SheetHandle) -> Result<Vec<Vec<String>>, StorageError> {
        let book = self.lock()?;
        Ok(book
            .position(sheet.name())
            .map(|index| book.sheets[index].rows.clone())
            .unwrap_or_default())
    }

    fn provision_headers(
        &self,
        sheet: &SheetHandle,
        headers: &[String],
        style: &HeaderStyle,
    ) -> Result<(), StorageError> {
        let mut book = self.lock()?;
        let target = book.sheet_mut(sheet);
        match target.rows.first_mut() {
            Some(first) => *first = headers.to_vec(),
            None => target.rows.push(headers.to_vec()),
        }
        target.header_style = Some(style.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
