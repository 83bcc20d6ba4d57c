use std::path::PathBuf;

/// Default store endpoint for local development.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9200";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote search cluster, loaded from
/// environment variables.
///
/// All fields have defaults suitable for a local single-node cluster
/// without security enabled.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Cluster endpoints; only the first one is used for requests.
    pub endpoints: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Takes precedence over basic auth when set.
    pub api_key: Option<String>,
    /// Accept invalid TLS certificates.
    pub insecure: bool,
    /// Extra PEM root certificate to trust.
    pub ca_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

/// How requests authenticate against the cluster.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Basic { username: String, password: String },
    ApiKey(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("no cluster endpoint configured")]
    NoEndpoint,

    #[error("ELASTICSEARCH_PASSWORD is set without ELASTICSEARCH_USERNAME")]
    PasswordWithoutUsername,

    #[error("failed to read CA file {path}: {source}")]
    CaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client (TLS setup, certificate parsing) could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl ConnectionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                              | Default                  |
    /// |--------------------------------------|--------------------------|
    /// | `ELASTICSEARCH_ENDPOINTS`            | `http://localhost:9200`  |
    /// | `ELASTICSEARCH_USERNAME`             | unset                    |
    /// | `ELASTICSEARCH_PASSWORD`             | unset                    |
    /// | `ELASTICSEARCH_API_KEY`              | unset                    |
    /// | `ELASTICSEARCH_INSECURE`             | `false`                  |
    /// | `ELASTICSEARCH_CA_FILE`              | unset                    |
    /// | `ELASTICSEARCH_REQUEST_TIMEOUT_SECS` | `30`                     |
    ///
    /// `ELASTICSEARCH_ENDPOINTS` is comma-separated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let endpoints: Vec<String> = var("ELASTICSEARCH_ENDPOINTS")
            .unwrap_or_else(|| DEFAULT_ENDPOINT.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoint);
        }

        let insecure = match var("ELASTICSEARCH_INSECURE") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: "ELASTICSEARCH_INSECURE",
                expected: "a boolean",
                value: raw,
            })?,
        };

        let request_timeout_secs = match var("ELASTICSEARCH_REQUEST_TIMEOUT_SECS") {
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "ELASTICSEARCH_REQUEST_TIMEOUT_SECS",
                        expected: "a positive integer",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            endpoints,
            username: var("ELASTICSEARCH_USERNAME"),
            password: var("ELASTICSEARCH_PASSWORD"),
            api_key: var("ELASTICSEARCH_API_KEY"),
            insecure,
            ca_file: var("ELASTICSEARCH_CA_FILE").map(PathBuf::from),
            request_timeout_secs,
        })
    }

    /// The endpoint requests are sent to.
    pub fn primary_endpoint(&self) -> Result<&str, ConfigError> {
        self.endpoints
            .first()
            .map(String::as_str)
            .ok_or(ConfigError::NoEndpoint)
    }

    /// Resolve the authentication scheme. An API key wins over basic auth.
    pub fn auth(&self) -> Result<Auth, ConfigError> {
        if let Some(key) = &self.api_key {
            return Ok(Auth::ApiKey(key.clone()));
        }
        match (&self.username, &self.password) {
            (Some(username), password) => Ok(Auth::Basic {
                username: username.clone(),
                password: password.clone().unwrap_or_default(),
            }),
            (None, Some(_)) => Err(ConfigError::PasswordWithoutUsername),
            (None, None) => Ok(Auth::None),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            username: None,
            password: None,
            api_key: None,
            insecure: false,
            ca_file: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

// Secrets never reach logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoints", &self.endpoints)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .field("ca_file", &self.ca_file)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => write!(f, "Basic({username})"),
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
