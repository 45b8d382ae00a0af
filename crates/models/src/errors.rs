use sea_orm::SqlErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    /// A single form field failed its constraint.
    #[error("{field}: {message}")]
    Field { field: &'static str, message: String },
    /// A unique constraint rejected the row.
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ModelError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Field { field, message: message.into() }
    }
}

impl From<sea_orm::DbErr> for ModelError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::Duplicate(msg),
            _ => Self::Db(e.to_string()),
        }
    }
}

/// Reject blank values.
pub fn required(field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::field(field, "This field is required."));
    }
    Ok(())
}

/// Reject values longer than `max` characters.
pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ModelError> {
    let len = value.chars().count();
    if len > max {
        return Err(ModelError::field(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        ));
    }
    Ok(())
}
