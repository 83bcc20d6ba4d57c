/// Errors raised while translating declarations or identifiers.
///
/// None of these involve the remote store; they are configuration mistakes
/// on the declaring side and are surfaced to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A JSON-encoded field (`params`, `search_template`) did not parse.
    #[error("Invalid JSON in {field}: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A composite id string could not be split back into scope and name.
    #[error("Malformed id '{id}': {reason}")]
    MalformedId { id: String, reason: &'static str },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_malformed_id() {
        let err = CoreError::MalformedId {
            id: "nope".to_string(),
            reason: "missing '/' separator",
        };
        assert_eq!(
            err.to_string(),
            "Malformed id 'nope': missing '/' separator"
        );
    }

    #[test]
    fn decode_keeps_serde_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CoreError::Decode {
            field: "params",
            source,
        };
        assert!(err.to_string().starts_with("Invalid JSON in params:"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
