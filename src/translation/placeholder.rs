use super::{Translate, TranslationError};
use regex::Regex;
use std::sync::LazyLock;

/// Any bracketed span counts as a placeholder, including literal brackets
/// that were never meant as one.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]").expect("placeholder pattern is valid"));

static PLACEHOLDER_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s*\[[^\]]+\]\s*)+$").expect("placeholder-only pattern is valid")
});

/// True when `text` is one or more `[token]`s separated only by whitespace.
pub fn is_placeholder_only(text: &str) -> bool {
    PLACEHOLDER_ONLY.is_match(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Placeholder(&'a str),
    Text(&'a str),
    Whitespace(&'a str),
}

impl<'a> Segment<'a> {
    fn from_span(span: &'a str) -> Self {
        if span.trim().is_empty() {
            Segment::Whitespace(span)
        } else {
            Segment::Text(span)
        }
    }

    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Placeholder(s) | Segment::Text(s) | Segment::Whitespace(s) => s,
        }
    }
}

/// Splits `text` at placeholder boundaries, keeping every byte in order.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in PLACEHOLDER.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::from_span(&text[last..m.start()]));
        }
        segments.push(Segment::Placeholder(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::from_span(&text[last..]));
    }

    segments
}

/// Translates the text between placeholders and leaves the placeholders
/// themselves untouched.
pub struct PlaceholderTranslator<T> {
    inner: T,
    source_lang: String,
    target_lang: String,
}

impl<T: Translate> PlaceholderTranslator<T> {
    pub fn new(inner: T) -> Self {
        Self::with_languages(inner, "en", "zh")
    }

    pub fn with_languages(
        inner: T,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    /// One external call per non-blank text segment. The first failing call
    /// aborts the line.
    pub async fn try_translate_line(&self, text: &str) -> Result<String, TranslationError> {
        if is_placeholder_only(text) {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len() * 2);
        for segment in split_segments(text) {
            match segment {
                Segment::Text(span) => {
                    let translated = self
                        .inner
                        .translate(span, &self.source_lang, &self.target_lang)
                        .await?;
                    out.push_str(&translated);
                }
                other => out.push_str(other.as_str()),
            }
        }
        Ok(out)
    }

    /// Like [`Self::try_translate_line`], but a failed call is logged and the
    /// untranslated input comes back instead.
    pub async fn translate_line(&self, text: &str) -> String {
        match self.try_translate_line(text).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::error!(text = %text, error = %e, "Translation failed, keeping source text");
                text.to_string()
            }
        }
    }
}
