use super::{read_source, rewrite_document, RewriteOptions, XmlPatcher};
use crate::csv_processor::TranslationMap;
use crate::utils::Result;
use std::path::Path;

/// Re-serializes the document with standard escaping.
///
/// Text must be well-formed: a bare `&` or an entity such as `&nbsp;` fails
/// the file without writing it.
/// Comments, processing instructions and the doctype are not carried over.
/// Use [`super::PreservingPatcher`] when the files must keep them.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPatcher;

impl XmlPatcher for StrictPatcher {
    fn patch(&self, path: &Path, map: &TranslationMap) -> Result<bool> {
        let source = read_source(path)?;
        let options = RewriteOptions {
            keep_misc: false,
            validate_text: true,
            newline_after_root: false,
        };

        let Some(output) = rewrite_document(&source, map, options)? else {
            return Ok(false);
        };

        std::fs::write(path, output)?;
        tracing::info!(path = %path.display(), "Updated XML file");
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}
