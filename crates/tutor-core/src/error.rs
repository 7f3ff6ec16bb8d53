use thiserror::Error;
use tutor_session::StorageError;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for TutorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SessionNotFound { id } => TutorError::SessionNotFound(id),
            other => TutorError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;
