use super::placeholder::{is_placeholder_only, PlaceholderTranslator};
use super::Translate;
use crate::csv_processor::{
    column_index, ensure_writable_parent, CsvStreamReader, CsvStreamWriter, TEXT_COLUMN,
    TRANSLATED_COLUMN,
};
use crate::utils::{L10nError, Result};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    pub rows_total: usize,
    pub rows_translated: usize,
    pub rows_blank: usize,
    pub rows_placeholder_only: usize,
    pub rows_failed: usize,
}

/// Translates the `text` column of `input` row by row and writes `output`
/// with an added `translated` column.
///
/// The input file, the `text` column and the output directory are checked
/// before any external call is made. Output is written only after every row
/// has been processed.
pub async fn translate_csv<T: Translate>(
    input: &Path,
    output: &Path,
    translator: &PlaceholderTranslator<T>,
    delay: Duration,
) -> Result<TranslationReport> {
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        delay_ms = delay.as_millis() as u64,
        "Translating CSV"
    );

    let mut reader = CsvStreamReader::new(input);
    let headers = reader.read_headers()?;
    let text_idx = reader.require_column(TEXT_COLUMN)?;
    ensure_writable_parent(output)?;

    let mut out_headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    let translated_idx = match column_index(&headers, TRANSLATED_COLUMN) {
        Some(idx) => idx,
        None => {
            out_headers.push(TRANSLATED_COLUMN.to_string());
            out_headers.len() - 1
        }
    };

    // Every record is read and checked before the first external call.
    let mut records = Vec::new();
    for result in reader.iter_records()? {
        let (index, record) = result?;
        // Header is line 1.
        let line = index + 2;
        if record.len() > headers.len() {
            return Err(L10nError::FieldCountMismatch {
                line,
                expected: headers.len(),
                got: record.len(),
            });
        }
        records.push((line, record));
    }

    let mut report = TranslationReport::default();
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len());

    for (line, record) in records {
        let text = record.get(text_idx).unwrap_or_default().trim();

        let translated = if text.is_empty() {
            report.rows_blank += 1;
            String::new()
        } else if is_placeholder_only(text) {
            report.rows_placeholder_only += 1;
            text.to_string()
        } else {
            match translator.try_translate_line(text).await {
                Ok(translated) => {
                    if translated.trim().is_empty() {
                        tracing::warn!(line, text = %text, "Translation came back blank");
                    } else {
                        tracing::debug!(line, text = %text, translated = %translated, "Row translated");
                    }
                    report.rows_translated += 1;
                    translated
                }
                Err(e) => {
                    tracing::warn!(line, text = %text, error = %e, "Translation failed, keeping source text");
                    report.rows_failed += 1;
                    text.to_string()
                }
            }
        };

        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        row.resize(out_headers.len(), String::new());
        row[translated_idx] = translated;
        rows.push(row);
        report.rows_total += 1;

        tokio::time::sleep(delay).await;
    }

    let mut writer = CsvStreamWriter::new(output, out_headers);
    writer.initialize()?;
    writer.write_rows(&rows)?;
    writer.finish()?;

    tracing::info!(
        output = %output.display(),
        rows = report.rows_total,
        translated = report.rows_translated,
        failed = report.rows_failed,
        "Translation finished"
    );
    Ok(report)
}
