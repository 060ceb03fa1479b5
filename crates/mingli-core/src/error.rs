use thiserror::Error;

#[derive(Debug, Error)]
pub enum MingliError {
    /// Any failed HTTP exchange: transport failure, non-2xx status, or a
    /// body that is not the expected JSON. Callers never branch on the cause.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MingliError {
    /// Short text suitable for a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "network request failed".to_string(),
            Self::Login(_) => "login failed".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Storage(_) => "could not access local session storage".to_string(),
            Self::Config(msg) => msg.clone(),
            Self::Serialization(_) => "unexpected data format".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MingliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let err = MingliError::Network("GET /api/users/x returned 500".into());
        assert_eq!(
            err.to_string(),
            "Network error: GET /api/users/x returned 500"
        );
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = MingliError::Validation("nickname cannot be empty".into());
        assert_eq!(err.user_message(), "nickname cannot be empty");
    }

    #[test]
    fn test_network_message_hides_detail() {
        let err = MingliError::Network("connection refused (os error 111)".into());
        assert_eq!(err.user_message(), "network request failed");
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: std::result::Result<i64, _> = serde_json::from_str("not json");
        let err: MingliError = parse.unwrap_err().into();
        assert!(matches!(err, MingliError::Serialization(_)));
    }
}
