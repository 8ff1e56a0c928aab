use crate::source::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RbacError {
    #[error("invalid subject criterion: {0}")]
    InvalidCriterion(String),
    #[error("failed to retrieve role bindings: {0}")]
    RetrievalFailed(#[from] SourceError),
}

pub type RbacResult<T> = Result<T, RbacError>;
