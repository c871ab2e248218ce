use crate::utils::{L10nError, Result};
use csv::Writer;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct CsvStreamWriter {
    path: PathBuf,
    headers: Vec<String>,
    writer: Option<Writer<File>>,
    rows_written: usize,
}

impl CsvStreamWriter {
    pub fn new(path: impl Into<PathBuf>, headers: Vec<String>) -> Self {
        Self {
            path: path.into(),
            headers,
            writer: None,
            rows_written: 0,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = Writer::from_writer(file);
        writer.write_record(&self.headers)?;
        self.writer = Some(writer);
        Ok(())
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            L10nError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Writer not initialized",
            ))
        })?;

        writer.write_record(row)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_rows(&mut self, rows: &[Vec<String>]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.rows_written)
    }
}

/// Fails with [`L10nError::OutputNotWritable`] unless a file can be created
/// next to `output`. The scratch file is removed again on drop.
pub fn ensure_writable_parent(output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !dir.is_dir() {
        return Err(L10nError::OutputNotWritable(dir.display().to_string()));
    }

    tempfile::Builder::new()
        .prefix(".l10n-write-check")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|_| L10nError::OutputNotWritable(dir.display().to_string()))
}
