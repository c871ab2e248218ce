use super::{read_source, rewrite_document, RewriteOptions, XmlPatcher};
use crate::csv_processor::TranslationMap;
use crate::utils::Result;
use std::path::Path;

/// Keeps comments and whitespace, and writes `&`, `<` and `>` back as raw
/// characters so markup-like snippets in text nodes stay readable on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreservingPatcher;

impl XmlPatcher for PreservingPatcher {
    fn patch(&self, path: &Path, map: &TranslationMap) -> Result<bool> {
        let source = read_source(path)?;
        let options = RewriteOptions {
            keep_misc: true,
            validate_text: false,
            newline_after_root: true,
        };

        let Some(output) = rewrite_document(&source, map, options)? else {
            return Ok(false);
        };
        let output = unescape_entities(&String::from_utf8(output)?);

        std::fs::write(path, output)?;
        tracing::info!(path = %path.display(), "Updated XML file");
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "preserve"
    }
}

/// Literal substitution over the whole serialized document. `&amp;` goes
/// first, so `&amp;lt;` ends up as `<`.
pub fn unescape_entities(xml: &str) -> String {
    xml.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}
