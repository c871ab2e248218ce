pub mod reader;
pub mod writer;

pub use reader::{
    column_index, file_exists, load_translation_map, normalize_key, CsvStreamReader,
    TranslationMap, KEY_COLUMN, TEXT_COLUMN, TRANSLATED_COLUMN,
};
pub use writer::{ensure_writable_parent, CsvStreamWriter};
