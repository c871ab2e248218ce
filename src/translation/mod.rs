pub mod aliyun;
pub mod driver;
pub mod placeholder;

pub use aliyun::AliyunTranslator;
pub use driver::{translate_csv, TranslationReport};
pub use placeholder::{is_placeholder_only, split_segments, PlaceholderTranslator, Segment};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error {code}: {message}")]
    ApiError { code: String, message: String },

    #[error("Could not decode response: {0}")]
    DecodeError(String),

    #[error("Could not sign request: {0}")]
    SignatureError(String),
}

/// A single external translation call.
#[allow(async_fn_in_trait)]
pub trait Translate {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> std::result::Result<String, TranslationError>;
}

impl<T: Translate + ?Sized> Translate for &T {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> std::result::Result<String, TranslationError> {
        (**self).translate(text, source_lang, target_lang).await
    }
}
