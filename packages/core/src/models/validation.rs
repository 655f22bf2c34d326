use thiserror::Error;

/// Validation errors raised at the repository boundary before anything is written
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Space title must not be empty")]
    EmptyTitle,

    #[error("Item text must not be empty")]
    EmptyText,

    #[error("A date is required for items in dated space {space_id}")]
    MissingDate { space_id: String },

    #[error("Invalid item date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
