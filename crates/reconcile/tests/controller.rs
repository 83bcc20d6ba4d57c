//! Controller lifecycle tests against an in-memory script store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use scriptkeeper_core::declared::{DeclaredScript, DeclaredSource, DeclaredStoredScript};
use scriptkeeper_core::diff::{DiffStatus, FIELD_NAME, FIELD_PARAMS};
use scriptkeeper_core::error::CoreError;
use scriptkeeper_core::script::{Script, ScriptSource, StoredScript};
use scriptkeeper_reconcile::{
    DeleteOutcome, Plan, ReadOutcome, ReconcileError, StoredScriptController,
};
use scriptkeeper_store::{ScriptStore, StoreError};
use tokio_util::sync::CancellationToken;

const CLUSTER: &str = "uuid-1";

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryStore {
    scripts: Mutex<HashMap<String, Script>>,
    puts: AtomicUsize,
    fail_with: Mutex<Option<u16>>,
    hang_reads: bool,
}

impl MemoryStore {
    fn failing(status: u16) -> Self {
        let store = Self::default();
        *store.fail_with.lock().unwrap() = Some(status);
        store
    }

    fn hanging() -> Self {
        Self {
            hang_reads: true,
            ..Self::default()
        }
    }

    fn insert(&self, name: &str, script: Script) {
        self.scripts.lock().unwrap().insert(name.to_string(), script);
    }

    fn len(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        match *self.fail_with.lock().unwrap() {
            Some(status) => Err(StoreError::Api {
                status,
                detail: "cluster_block_exception: blocked".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ScriptStore for MemoryStore {
    async fn cluster_id(&self) -> Result<String, StoreError> {
        Ok(CLUSTER.to_string())
    }

    async fn put_script(&self, name: &str, script: &Script) -> Result<(), StoreError> {
        self.check()?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.insert(name, script.clone());
        Ok(())
    }

    async fn get_script(&self, name: &str) -> Result<Option<StoredScript>, StoreError> {
        if self.hang_reads {
            std::future::pending::<()>().await;
        }
        self.check()?;
        let scripts = self.scripts.lock().unwrap();
        // The body never echoes the name back.
        Ok(scripts
            .get(name)
            .map(|script| StoredScript::new(String::new(), script.clone())))
    }

    async fn delete_script(&self, name: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.scripts.lock().unwrap().remove(name).is_some())
    }
}

fn controller(store: &Arc<MemoryStore>) -> StoredScriptController {
    StoredScriptController::new(store.clone())
}

fn sum_script() -> DeclaredStoredScript {
    DeclaredStoredScript::new(
        "sum_script",
        DeclaredScript::new("painless", DeclaredSource::inline("doc['a'].value + params.b"))
            .with_params(r#"{"b":1}"#),
    )
}

fn search_template() -> DeclaredStoredScript {
    DeclaredStoredScript::new(
        "search_tpl",
        DeclaredScript::new(
            "mustache",
            DeclaredSource::search_template(r#"{ "size": 10, "query": { "match": { "f": "{{v}}" } } }"#),
        ),
    )
}

// ---------------------------------------------------------------------------
// put / read / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_then_read_returns_declared_shape() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let id = ctl.put(&sum_script(), &cancel).await.unwrap();
    assert_eq!(id.to_string(), "uuid-1/sum_script");

    let observed = assert_matches!(
        ctl.read(&id.to_string(), &cancel).await.unwrap(),
        ReadOutcome::Found(observed) => observed
    );
    assert_eq!(observed.id, id);
    assert_eq!(observed.stored.name, "sum_script");
    assert_eq!(observed.declared, sum_script());
}

#[tokio::test]
async fn repeated_put_is_idempotent() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let first = ctl.put(&sum_script(), &cancel).await.unwrap();
    let second = ctl.put(&sum_script(), &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.puts.load(Ordering::SeqCst), 2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn template_is_stored_as_object() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    ctl.put(&search_template(), &cancel).await.unwrap();

    let stored = store.scripts.lock().unwrap().get("search_tpl").cloned().unwrap();
    assert_matches!(stored.source, ScriptSource::SearchTemplate(ref t) if t["size"] == 10);
}

#[tokio::test]
async fn read_of_unknown_script_is_absent() {
    let store = Arc::new(MemoryStore::default());
    let outcome = controller(&store)
        .read("uuid-1/missing", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, ReadOutcome::Absent);
}

#[tokio::test]
async fn delete_then_read_is_absent() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let id = ctl.put(&sum_script(), &cancel).await.unwrap().to_string();
    assert_eq!(ctl.delete(&id, &cancel).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(ctl.read(&id, &cancel).await.unwrap(), ReadOutcome::Absent);
    assert_eq!(
        ctl.delete(&id, &cancel).await.unwrap(),
        DeleteOutcome::AlreadyAbsent
    );
}

#[tokio::test]
async fn malformed_id_is_rejected_without_remote_calls() {
    let store = Arc::new(MemoryStore::failing(500));
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    assert_matches!(
        ctl.read("no-separator", &cancel).await,
        Err(ReconcileError::Core(CoreError::MalformedId { .. }))
    );
    assert_matches!(
        ctl.delete("/sum_script", &cancel).await,
        Err(ReconcileError::Core(CoreError::MalformedId { .. }))
    );
}

#[tokio::test]
async fn invalid_declaration_never_reaches_the_store() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);

    let mut declared = sum_script();
    declared.script[0].params = "{not json".into();

    assert_matches!(
        ctl.put(&declared, &CancellationToken::new()).await,
        Err(ReconcileError::Core(CoreError::Decode { field: "params", .. }))
    );
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn remote_failures_name_the_operation() {
    let store = Arc::new(MemoryStore::failing(503));
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let err = ctl.put(&sum_script(), &cancel).await.unwrap_err();
    assert_matches!(err, ReconcileError::RemoteWrite { ref name, .. } if name == "sum_script");
    assert_eq!(err.store_error().and_then(StoreError::status), Some(503));

    assert_matches!(
        ctl.read("uuid-1/sum_script", &cancel).await,
        Err(ReconcileError::RemoteRead { .. })
    );
    assert_matches!(
        ctl.delete("uuid-1/sum_script", &cancel).await,
        Err(ReconcileError::RemoteDelete { .. })
    );
}

#[tokio::test]
async fn cancelled_token_stops_before_the_store() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert_matches!(
        ctl.put(&sum_script(), &cancel).await,
        Err(ReconcileError::Cancelled)
    );
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancellation_interrupts_a_pending_call() {
    let store = Arc::new(MemoryStore::hanging());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    assert_matches!(
        ctl.read("uuid-1/sum_script", &cancel).await,
        Err(ReconcileError::Cancelled)
    );
}

// ---------------------------------------------------------------------------
// apply / plan
// ---------------------------------------------------------------------------

#[tokio::test]
async fn apply_returns_what_the_cluster_persisted() {
    let store = Arc::new(MemoryStore::default());
    let applied = controller(&store)
        .apply(&search_template(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(applied.id.to_string(), "uuid-1/search_tpl");
    let block = &applied.declared.script[0];
    assert_eq!(
        block.source[0].search_template.as_deref(),
        Some(r#"{"query":{"match":{"f":"{{v}}"}},"size":10}"#)
    );
    assert_eq!(block.params, "{}");
}

#[tokio::test]
async fn plan_without_id_is_create() {
    let store = Arc::new(MemoryStore::default());
    let plan = controller(&store)
        .plan(&sum_script(), None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(plan, Plan::Create);
}

#[tokio::test]
async fn plan_for_vanished_script_is_create() {
    let store = Arc::new(MemoryStore::default());
    let plan = controller(&store)
        .plan(&sum_script(), Some("uuid-1/sum_script"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(plan, Plan::Create);
}

#[tokio::test]
async fn plan_ignores_json_formatting() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let id = ctl.put(&search_template(), &cancel).await.unwrap().to_string();
    let plan = ctl.plan(&search_template(), Some(&id), &cancel).await.unwrap();
    assert_matches!(plan, Plan::NoOp { .. });
}

#[tokio::test]
async fn plan_detects_param_drift_as_update() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let id = ctl.put(&sum_script(), &cancel).await.unwrap().to_string();

    let mut changed = sum_script();
    changed.script[0].params = r#"{"b":2}"#.into();
    let plan = ctl.plan(&changed, Some(&id), &cancel).await.unwrap();

    assert_eq!(plan.action(), "update");
    assert_eq!(plan.diffs().len(), 1);
    assert_eq!(plan.diffs()[0].field, FIELD_PARAMS);
    assert_eq!(plan.diffs()[0].status, DiffStatus::Changed);
}

#[tokio::test]
async fn plan_for_renamed_script_is_replace() {
    let store = Arc::new(MemoryStore::default());
    let ctl = controller(&store);
    let cancel = CancellationToken::new();

    let id = ctl.put(&sum_script(), &cancel).await.unwrap().to_string();

    let mut renamed = sum_script();
    renamed.name = "sum_script_v2".into();
    let plan = ctl.plan(&renamed, Some(&id), &cancel).await.unwrap();

    assert_eq!(plan.action(), "replace");
    assert_eq!(plan.diffs()[0].field, FIELD_NAME);
}

#[tokio::test]
async fn plan_validates_before_reading() {
    let store = Arc::new(MemoryStore::failing(500));
    let mut declared = sum_script();
    declared.script[0].source[0].search_template = Some("{}".into());

    assert_matches!(
        controller(&store)
            .plan(&declared, Some("uuid-1/sum_script"), &CancellationToken::new())
            .await,
        Err(ReconcileError::Core(CoreError::Validation(_)))
    );
}
