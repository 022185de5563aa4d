use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid task status: '{0}' (expected: To Do|In Progress|Done)")]
    InvalidStatus(String),
    #[error("invalid task priority: '{0}' (expected: Low|Medium|High)")]
    InvalidPriority(String),
    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },
}
