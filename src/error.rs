use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Ownership(String),

    #[error("Backend unavailable: {0}")]
    Backend(String),

    #[error("You are not in a group yet. Use /creategroup <name> or /joingroup <name>.")]
    NotInCollective,

    #[error("Settings error: {0}")]
    Settings(String),
}

impl AdvisorError {
    /// Only malformed input can be retried within the same conversation step.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AdvisorError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_retriable() {
        assert!(AdvisorError::Validation("bad percent".into()).is_retriable());
        assert!(!AdvisorError::NotFound("offer 5".into()).is_retriable());
        assert!(!AdvisorError::Ownership("nope".into()).is_retriable());
        assert!(!AdvisorError::Backend("down".into()).is_retriable());
        assert!(!AdvisorError::NotInCollective.is_retriable());
    }

    #[test]
    fn test_backend_message_is_verbatim() {
        let err = AdvisorError::Backend("connection refused".into());
        assert_eq!(err.to_string(), "Backend unavailable: connection refused");
    }
}
