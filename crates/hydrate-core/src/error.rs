//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to serialize document to YAML: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to parse YAML document: {0}")]
    Deserialize(#[source] serde_yaml::Error),

    #[error("failed to parse JSON document: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("document root must be a mapping")]
    NonMappingRoot,
}

pub type Result<T> = std::result::Result<T, CoreError>;
