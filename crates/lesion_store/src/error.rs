use lesion::LesionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    #[error("Metadata line {line}: {reason}")]
    Metadata { line: usize, reason: String },

    #[error("Unknown diagnosis code '{0}'")]
    UnknownDiagnosis(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error("Table encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Table decoding failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Lesion(#[from] LesionError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
