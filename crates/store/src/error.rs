/// Errors from the stored-script REST layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The request exceeded the client's configured timeout.
    #[error("HTTP request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The cluster returned a non-2xx status code other than an expected 404.
    #[error("Store API error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The cluster's error type and reason, or the raw body.
        detail: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_decode() {
            Self::Decode(err)
        } else {
            Self::Request(err)
        }
    }
}

impl StoreError {
    /// Whether the failure was a transport deadline rather than a rejection.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// HTTP status reported by the cluster, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract a readable explanation from a cluster error body.
///
/// Error bodies look like
/// `{"error": {"type": "...", "reason": "..."}, "status": 400}`; anything
/// else is returned verbatim.
pub(crate) fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    let error = &value["error"];
    match (error["type"].as_str(), error["reason"].as_str()) {
        (Some(kind), Some(reason)) => format!("{kind}: {reason}"),
        (None, Some(reason)) => reason.to_string(),
        _ => match error.as_str() {
            Some(message) => message.to_string(),
            None => body.to_string(),
        },
    }
}
