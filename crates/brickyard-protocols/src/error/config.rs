//! Configuration document errors.

use thiserror::Error;

/// A value could not be interpreted as a brick config value or expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid config value: {0}")]
pub struct ConfigValueError(pub String);

/// A registry id is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid registry id '{id}': {reason}")]
pub struct InvalidRegistryId {
    pub id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_value_error_display() {
        let err = ConfigValueError("unknown expression type 'jq'".to_string());
        assert!(err.to_string().contains("jq"));
    }

    #[test]
    fn test_invalid_registry_id_display() {
        let err = InvalidRegistryId {
            id: "Bad Id".to_string(),
            reason: "invalid character ' '".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("Bad Id"));
        assert!(display.contains("invalid character"));
    }
}
