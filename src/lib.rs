pub mod csv_processor;
pub mod layout;
pub mod translation;
pub mod utils;
pub mod xml_patch;

pub use csv_processor::{load_translation_map, normalize_key, TranslationMap};
pub use layout::{patch_mod, LanguageLayout, PatchReport};
pub use translation::{
    translate_csv, AliyunTranslator, PlaceholderTranslator, Translate, TranslationError,
    TranslationReport,
};
pub use utils::{AppConfig, L10nError, PatchStrategy, Result};
pub use xml_patch::{patcher_for, PreservingPatcher, StrictPatcher, XmlPatcher};
