pub mod election;
pub mod region;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Schema mismatch in {context}: {reason}")]
    SchemaMismatch { context: String, reason: String },
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;
