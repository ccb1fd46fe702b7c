// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("description must not be empty")]
    EmptyDescription,
}

pub type Result<T> = std::result::Result<T, DomainError>;
