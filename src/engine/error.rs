use thiserror::Error;

use crate::auth::LoginError;

use super::validate::Rejection;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Rejected(#[from] Rejection),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Login(#[from] LoginError),
    #[error("admin login required")]
    Unauthorized,
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    /// The validation outcome, if this is a user-facing rejection.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            EngineError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}
