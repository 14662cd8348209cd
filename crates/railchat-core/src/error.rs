use thiserror::Error;

/// Top-level error type for railchat.
///
/// Subsystem crates define their own error types and implement
/// `From<RailchatError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RailchatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for RailchatError {
    fn from(err: toml::de::Error) -> Self {
        RailchatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RailchatError {
    fn from(err: toml::ser::Error) -> Self {
        RailchatError::Config(err.to_string())
    }
}

/// A specialized `Result` type for railchat operations.
pub type Result<T> = std::result::Result<T, RailchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RailchatError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RailchatError = io_err.into();
        assert!(matches!(err, RailchatError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let converted: RailchatError = err.unwrap_err().into();
        assert!(matches!(converted, RailchatError::Config(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
