use crate::utils::{L10nError, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Element name → replacement text, built once per patch run.
pub type TranslationMap = HashMap<String, String>;

pub const KEY_COLUMN: &str = "key";
pub const TEXT_COLUMN: &str = "text";
pub const TRANSLATED_COLUMN: &str = "translated";

/// Hierarchical keys such as `ThingDef/Gun.label` reduce to their last path
/// segment. Keys without both `/` and `.` are used as-is.
pub fn normalize_key(key: &str) -> &str {
    if key.contains('/') && key.contains('.') {
        key.rsplit('/').next().unwrap_or(key)
    } else {
        key
    }
}

pub fn load_translation_map(path: &Path) -> Result<TranslationMap> {
    let mut reader = CsvStreamReader::new(path);
    let headers = reader.read_headers()?;

    let key_idx = reader.require_column(KEY_COLUMN)?;
    let text_idx = reader.require_column(TEXT_COLUMN)?;
    let translated_idx = column_index(&headers, TRANSLATED_COLUMN);

    let mut map = TranslationMap::new();
    for result in reader.iter_records()? {
        let (_, record) = result?;
        let key = normalize_key(record.get(key_idx).unwrap_or_default());
        let value = translated_idx
            .and_then(|idx| record.get(idx))
            .filter(|v| !v.is_empty())
            .or_else(|| record.get(text_idx))
            .unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
    }

    tracing::debug!(path = %path.display(), entries = map.len(), "Loaded translation map");
    Ok(map)
}

pub fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

pub struct CsvStreamReader {
    path: PathBuf,
    headers: Option<StringRecord>,
}

impl CsvStreamReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            headers: None,
        }
    }

    fn open(&self) -> Result<csv::Reader<File>> {
        if !file_exists(&self.path) {
            return Err(L10nError::FileNotFound(self.path.display().to_string()));
        }
        let file = File::open(&self.path)?;
        Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
    }

    pub fn read_headers(&mut self) -> Result<StringRecord> {
        let mut reader = self.open()?;
        let headers = reader.headers()?.clone();
        self.headers = Some(headers.clone());
        Ok(headers)
    }

    /// Index of `name` in the header row read by [`Self::read_headers`].
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.headers
            .as_ref()
            .and_then(|h| column_index(h, name))
            .ok_or_else(|| L10nError::MissingColumn {
                column: name.to_string(),
                path: self.path.display().to_string(),
            })
    }

    pub fn iter_records(&self) -> Result<CsvRecordIterator> {
        let reader = self.open()?;
        Ok(CsvRecordIterator {
            reader,
            current_index: 0,
        })
    }
}

pub struct CsvRecordIterator {
    reader: csv::Reader<File>,
    current_index: usize,
}

impl Iterator for CsvRecordIterator {
    type Item = Result<(usize, StringRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.records().next() {
            Some(Ok(record)) => {
                let index = self.current_index;
                self.current_index += 1;
                Some(Ok((index, record)))
            }
            Some(Err(e)) => Some(Err(L10nError::CsvError(e))),
            None => None,
        }
    }
}

pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}
