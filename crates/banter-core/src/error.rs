use thiserror::Error;

/// Top-level error type for the Banter system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for BanterError` (or the reverse) so that the `?`
/// operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BanterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog data error: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for BanterError {
    fn from(err: toml::de::Error) -> Self {
        BanterError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BanterError {
    fn from(err: toml::ser::Error) -> Self {
        BanterError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BanterError {
    fn from(err: serde_json::Error) -> Self {
        BanterError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Banter operations.
pub type Result<T> = std::result::Result<T, BanterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BanterError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = BanterError::Data("duplicate action key".to_string());
        assert_eq!(err.to_string(), "Catalog data error: duplicate action key");

        let err = BanterError::Serialization("invalid json".to_string());
        assert_eq!(err.to_string(), "Serialization error: invalid json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BanterError = io_err.into();
        assert!(matches!(err, BanterError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(parsed.is_err());
        let err: BanterError = parsed.unwrap_err().into();
        assert!(matches!(err, BanterError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(parsed.is_err());
        let err: BanterError = parsed.unwrap_err().into();
        assert!(matches!(err, BanterError::Serialization(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(BanterError::Data("fail".to_string()))
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }

    #[test]
    fn test_error_debug_impl() {
        let err = BanterError::Config("test debug".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("test debug"));
    }
}
