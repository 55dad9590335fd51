use thiserror::Error;

#[derive(Error, Debug)]
pub enum CourierError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Invalid weather data: {0}")]
    InvalidWeather(String),

    #[error("Unknown difficulty: {0:?}")]
    UnknownDifficulty(String),

    #[error("Job not found: {0}")]
    UnknownJob(crate::core::types::JobId),

    #[error("Job {id} exceeds capacity ({total:.1} > {max:.1})")]
    OverCapacity { id: crate::core::types::JobId, total: f32, max: f32 },
}

pub type Result<T> = std::result::Result<T, CourierError>;
