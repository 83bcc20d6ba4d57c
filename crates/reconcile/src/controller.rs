//! Put / Read / Delete for stored scripts.
//!
//! Each operation is one independent round-trip (two for `put`, which
//! first learns the cluster identity) and keeps no state between calls.
//! The remote store is the only source of truth: reads always go to the
//! cluster, and the declared shape is re-rendered from what it returns.

use std::future::Future;
use std::sync::Arc;

use scriptkeeper_core::declared::DeclaredStoredScript;
use scriptkeeper_core::diff::{diff_declared, forces_replacement};
use scriptkeeper_core::id::CompositeId;
use scriptkeeper_core::script::StoredScript;
use scriptkeeper_store::ScriptStore;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{ReconcileError, ReconcileResult};
use crate::plan::Plan;

/// A stored script as last read from the cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedScript {
    pub id: CompositeId,
    /// Canonical form returned by the store.
    pub stored: StoredScript,
    /// The declared shape re-rendered from `stored` alone.
    pub declared: DeclaredStoredScript,
}

impl ObservedScript {
    /// The observed state in the shape of `desired`, the basis for drift
    /// comparison. Fields the store does not report (params) are taken
    /// from `desired`.
    pub fn declared_against(&self, desired: &DeclaredStoredScript) -> DeclaredStoredScript {
        DeclaredStoredScript::decode_against(&self.stored, desired)
    }
}

/// Result of [`StoredScriptController::read`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReadOutcome {
    Found(ObservedScript),
    /// Nothing is stored under the id; the resource must be recreated.
    Absent,
}

/// Result of [`StoredScriptController::delete`]. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// Result of [`StoredScriptController::apply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedScript {
    pub id: CompositeId,
    /// What the cluster actually persisted, in declared shape.
    pub declared: DeclaredStoredScript,
}

/// Drives one stored script towards its declared state.
#[derive(Clone)]
pub struct StoredScriptController {
    store: Arc<dyn ScriptStore>,
}

impl StoredScriptController {
    pub fn new(store: Arc<dyn ScriptStore>) -> Self {
        Self { store }
    }

    /// Create or fully replace the declared script and return its id.
    ///
    /// The declaration is encoded before anything is sent, so a decode
    /// error never leaves a partial write behind. Writing identical
    /// content twice succeeds both times and yields the same id.
    pub async fn put(
        &self,
        declared: &DeclaredStoredScript,
        cancel: &CancellationToken,
    ) -> ReconcileResult<CompositeId> {
        let script = declared.encode_script()?;
        let name = declared.name.as_str();

        let cluster_id = cancellable(cancel, self.store.cluster_id())
            .await?
            .map_err(ReconcileError::ClusterIdentity)?;
        let id = CompositeId::compose(cluster_id, name)?;

        cancellable(cancel, self.store.put_script(name, &script))
            .await?
            .map_err(|source| ReconcileError::RemoteWrite {
                name: name.to_string(),
                source,
            })?;

        tracing::info!(id = %id, lang = %script.lang, "Stored script put");
        Ok(id)
    }

    /// Read the script addressed by `id`.
    ///
    /// A missing script is [`ReadOutcome::Absent`], not an error.
    pub async fn read(&self, id: &str, cancel: &CancellationToken) -> ReconcileResult<ReadOutcome> {
        let id = CompositeId::parse(id)?;
        let name = id.resource_id().to_string();

        let fetched = cancellable(cancel, self.store.get_script(&name))
            .await?
            .map_err(|source| ReconcileError::RemoteRead {
                name: name.clone(),
                source,
            })?;

        let Some(mut stored) = fetched else {
            tracing::info!(id = %id, "Stored script absent");
            return Ok(ReadOutcome::Absent);
        };

        // The id, not the response body, is authoritative for the name.
        stored.name = name;
        let declared = DeclaredStoredScript::decode(&stored);
        tracing::debug!(id = %id, has_script = stored.script.is_some(), "Stored script read");

        Ok(ReadOutcome::Found(ObservedScript {
            id,
            stored,
            declared,
        }))
    }

    /// Delete the script addressed by `id`.
    ///
    /// Deleting something already gone succeeds with
    /// [`DeleteOutcome::AlreadyAbsent`].
    pub async fn delete(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> ReconcileResult<DeleteOutcome> {
        let id = CompositeId::parse(id)?;
        let name = id.resource_id();

        let deleted = cancellable(cancel, self.store.delete_script(name))
            .await?
            .map_err(|source| ReconcileError::RemoteDelete {
                name: name.to_string(),
                source,
            })?;

        let outcome = if deleted {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::AlreadyAbsent
        };
        tracing::info!(id = %id, outcome = ?outcome, "Stored script delete finished");
        Ok(outcome)
    }

    /// Put, then read back what the cluster persisted.
    ///
    /// The returned declaration replaces the caller's: it is what the next
    /// drift comparison must start from.
    pub async fn apply(
        &self,
        declared: &DeclaredStoredScript,
        cancel: &CancellationToken,
    ) -> ReconcileResult<AppliedScript> {
        let id = self.put(declared, cancel).await?;

        match self.read(&id.to_string(), cancel).await? {
            ReadOutcome::Found(observed) => Ok(AppliedScript {
                declared: observed.declared_against(declared),
                id: observed.id,
            }),
            ReadOutcome::Absent => Err(ReconcileError::MissingAfterWrite(
                id.resource_id().to_string(),
            )),
        }
    }

    /// Decide what `apply` would have to do for `declared`.
    ///
    /// `id` is the identifier recorded by a previous apply, if any.
    pub async fn plan(
        &self,
        declared: &DeclaredStoredScript,
        id: Option<&str>,
        cancel: &CancellationToken,
    ) -> ReconcileResult<Plan> {
        declared.encode_script()?;

        let Some(id) = id else {
            return Ok(Plan::Create);
        };

        let observed = match self.read(id, cancel).await? {
            ReadOutcome::Found(observed) => observed,
            ReadOutcome::Absent => return Ok(Plan::Create),
        };

        let diffs = diff_declared(declared, &observed.declared_against(declared));
        let plan = if diffs.is_empty() {
            Plan::NoOp { id: observed.id }
        } else if forces_replacement(&diffs) {
            Plan::Replace {
                id: observed.id,
                diffs,
            }
        } else {
            Plan::Update {
                id: observed.id,
                diffs,
            }
        };
        tracing::debug!(action = plan.action(), "Planned stored script");
        Ok(plan)
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> ReconcileResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReconcileError::Cancelled),
        output = fut => Ok(output),
    }
}
