// CSV directory backend
// Each sheet is `<data_dir>/<sheet name>.csv`, rows appended in place

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{AppendTicket, SheetHandle, SheetStore};
use crate::config::HeaderStyle;
use crate::error::StorageError;

/// Workbook stored as a directory of CSV files
pub struct CsvWorkbook {
    dir: PathBuf,
    active_sheet: String,
    // Serializes file access between blocking tasks
    lock: Mutex<()>,
}

impl CsvWorkbook {
    /// Open (and create if needed) the data directory
    pub fn open(dir: &Path, active_sheet: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            active_sheet: active_sheet.to_string(),
            lock: Mutex::new(()),
        })
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.lock
            .lock()
            .map_err(|_| StorageError::Task("workbook lock poisoned".to_string()))
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", file_stem(name)))
    }

    fn touch(path: &Path) -> io::Result<()> {
        OpenOptions::new().create(true).append(true).open(path).map(drop)
    }

    fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, StorageError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(ToString::to_string).collect());
        }
        Ok(rows)
    }

    fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), StorageError> {
        let tmp_path = path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&tmp_path)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Sheet names may contain anything; file names may not
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match stem.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => stem,
    }
}

impl SheetStore for CsvWorkbook {
    fn find_or_create_sheet(&self, name: &str) -> Result<SheetHandle, StorageError> {
        let _guard = self.guard()?;
        if self.sheet_path(name).exists() {
            return Ok(SheetHandle::new(name));
        }
        Self::touch(&self.sheet_path(&self.active_sheet))?;
        Ok(SheetHandle::new(self.active_sheet.clone()))
    }

    fn insert_sheet(&self, name: &str) -> Result<SheetHandle, StorageError> {
        let _guard = self.guard()?;
        Self::touch(&self.sheet_path(name))?;
        Ok(SheetHandle::new(name))
    }

    fn commit_row(
        &self,
        sheet: &SheetHandle,
        values: &[String],
        ticket: &AppendTicket,
    ) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.sheet_path(sheet.name()))?;

        // Encode first so the record goes out in a single write
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::new());
        writer.write_record(values)?;
        let record = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;

        if !ticket.commit() {
            return Err(StorageError::Timeout);
        }
        file.write_all(&record)?;
        file.flush()?;
        Ok(())
    }

    fn read_all(&self, sheet: &SheetHandle) -> Result<Vec<Vec<String>>, StorageError> {
        let _guard = self.guard()?;
        Self::read_rows(&self.sheet_path(sheet.name()))
    }

    // CSV has no cell formatting, only the header values are written
    fn provision_headers(
        &self,
        sheet: &SheetHandle,
        headers: &[String],
        _style: &HeaderStyle,
    ) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        let path = self.sheet_path(sheet.name());
        let mut rows = Self::read_rows(&path)?;
        match rows.first_mut() {
            Some(first) => *first = headers.to_vec(),
            None => rows.push(headers.to_vec()),
        }
        Self::write_rows(&path, &rows)
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
