use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corpus contains no selection lists")]
    EmptyCorpus,

    #[error("No unlock level determinable for family '{0}': it has no list occurrences")]
    NoLevels(String),

    #[error("Record not found: {0:?}")]
    RecordNotFound(crate::core::types::RecordId),

    #[error("Record {0:?} is not a selection list")]
    NotASelectionList(crate::core::types::RecordId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
