use thiserror::Error;

#[derive(Error, Debug)]
pub enum L10nError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("File is not valid UTF-8: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Output directory is not writable: {0}")]
    OutputNotWritable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Line {line} has {got} fields, the header has {expected}")]
    FieldCountMismatch {
        line: usize,
        expected: usize,
        got: usize,
    },
}

impl From<quick_xml::Error> for L10nError {
    fn from(e: quick_xml::Error) -> Self {
        L10nError::XmlError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, L10nError>;
