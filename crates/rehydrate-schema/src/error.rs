use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("entity '{name}' is defined more than once")]
    DuplicateEntity { name: String },
    #[error("entity definition has an empty name")]
    EmptyName,
    #[error("entity '{name}' declares an empty id attribute")]
    EmptyIdAttribute { name: String },
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}
