//! The [`ScriptStore`] seam between reconciliation and transport.

use async_trait::async_trait;
use scriptkeeper_core::script::{Script, StoredScript};

use crate::api::ScriptStoreApi;
use crate::error::StoreError;

/// Remote operations the reconciliation controller needs.
///
/// Implemented by [`ScriptStoreApi`] for a live cluster; tests provide
/// in-memory implementations.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// Stable identity of the cluster behind this connection.
    async fn cluster_id(&self) -> Result<String, StoreError>;

    /// Create or fully replace the script stored under `name`.
    async fn put_script(&self, name: &str, script: &Script) -> Result<(), StoreError>;

    /// Fetch the script stored under `name`; `None` if there is none.
    async fn get_script(&self, name: &str) -> Result<Option<StoredScript>, StoreError>;

    /// Delete the script stored under `name`; `false` if there was none.
    async fn delete_script(&self, name: &str) -> Result<bool, StoreError>;
}

#[async_trait]
impl ScriptStore for ScriptStoreApi {
    async fn cluster_id(&self) -> Result<String, StoreError> {
        let info = self.cluster_info().await?;
        tracing::debug!(
            cluster_uuid = %info.cluster_uuid,
            cluster_name = info.cluster_name.as_deref().unwrap_or("<unnamed>"),
            "Resolved cluster identity",
        );
        Ok(info.cluster_uuid)
    }

    async fn put_script(&self, name: &str, script: &Script) -> Result<(), StoreError> {
        ScriptStoreApi::put_script(self, name, script).await
    }

    async fn get_script(&self, name: &str) -> Result<Option<StoredScript>, StoreError> {
        ScriptStoreApi::get_script(self, name).await
    }

    async fn delete_script(&self, name: &str) -> Result<bool, StoreError> {
        ScriptStoreApi::delete_script(self, name).await
    }
}
