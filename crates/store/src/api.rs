//! REST client for the cluster's stored-script endpoints.
//!
//! Wraps `PUT`/`GET`/`DELETE /_scripts/{name}` and `GET /` (cluster
//! identity) using [`reqwest`]. "Not found" is reported as `None`/`false`
//! rather than as an error; every other non-2xx response becomes
//! [`StoreError::Api`] carrying the cluster's own explanation.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Url};
use scriptkeeper_core::script::{Script, StoredScript};
use scriptkeeper_core::wire::{ClusterInfo, GetScriptResponse, PutScriptRequest};

use crate::config::{Auth, ConfigError, ConnectionConfig};
use crate::error::StoreError;

/// HTTP client for a single cluster endpoint.
#[derive(Debug)]
pub struct ScriptStoreApi {
    client: reqwest::Client,
    base_url: Url,
    auth: Auth,
}

impl ScriptStoreApi {
    /// Create an unauthenticated client for `base_url`, e.g.
    /// `http://localhost:9200`.
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_client(reqwest::Client::new(), base_url, Auth::None)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        auth: Auth,
    ) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    /// Build a client from connection settings: timeout, TLS options and
    /// credentials all come from `config`.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, StoreApiSetupError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.insecure);

        if let Some(path) = &config.ca_file {
            let pem = std::fs::read(path).map_err(|source| ConfigError::CaFile {
                path: path.clone(),
                source,
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(ConfigError::Client)?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder.build().map_err(ConfigError::Client)?;
        let endpoint = config.primary_endpoint()?;
        if config.endpoints.len() > 1 {
            tracing::debug!(
                endpoint,
                ignored = config.endpoints.len() - 1,
                "Using the first configured endpoint",
            );
        }
        Ok(Self::with_client(client, endpoint, config.auth()?)?)
    }

    /// Base URL of the cluster.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the cluster's identity (`GET /`).
    pub async fn cluster_info(&self) -> Result<ClusterInfo, StoreError> {
        let response = self
            .request(Method::GET, self.base_url.clone())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Create or fully replace a stored script.
    ///
    /// Sends `PUT /_scripts/{name}` with the whole definition; the
    /// previous definition, if any, is overwritten.
    pub async fn put_script(&self, name: &str, script: &Script) -> Result<(), StoreError> {
        let body = PutScriptRequest { script };
        tracing::debug!(
            name,
            body = %serde_json::to_string(&body).unwrap_or_default(),
            "Sending stored script",
        );

        let response = self
            .request(Method::PUT, self.script_url(name)?)
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await?;
        tracing::info!(name, lang = %script.lang, "Stored script written");
        Ok(())
    }

    /// Fetch a stored script, or `None` if the cluster has none by that name.
    pub async fn get_script(&self, name: &str) -> Result<Option<StoredScript>, StoreError> {
        let response = self
            .request(Method::GET, self.script_url(name)?)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(name, "Stored script not found");
            return Ok(None);
        }

        let body: GetScriptResponse = Self::parse_response(response).await?;
        let stored = body.into_stored_script(name);
        tracing::debug!(name, found = stored.is_some(), "Fetched stored script");
        Ok(stored)
    }

    /// Delete a stored script.
    ///
    /// Returns `true` if a script was deleted and `false` if there was
    /// nothing to delete.
    pub async fn delete_script(&self, name: &str) -> Result<bool, StoreError> {
        let response = self
            .request(Method::DELETE, self.script_url(name)?)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(name, "Stored script already absent");
            return Ok(false);
        }

        Self::check_status(response).await?;
        tracing::info!(name, "Stored script deleted");
        Ok(true)
    }

    // ---- private helpers ----

    /// `{base}/_scripts/{name}`, with `name` encoded as one path segment.
    fn script_url(&self, name: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("_scripts")
            .push(name);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth {
            Auth::None => builder,
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::ApiKey(key) => {
                builder.header(reqwest::header::AUTHORIZATION, format!("ApiKey {key}"))
            }
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`StoreError::Api`] with the
    /// status and the cluster's error detail on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                detail: crate::error::error_detail(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), StoreError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Errors from [`ScriptStoreApi::from_config`].
#[derive(Debug, thiserror::Error)]
pub enum StoreApiSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
