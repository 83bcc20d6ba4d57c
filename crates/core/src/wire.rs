//! Wire format of the `_scripts` API.
//!
//! Writes send `{"script": {"lang", "source", "params"}}`. `source` is a
//! string for literal scripts and an object for search templates. Reads
//! return the same `script` object wrapped with `_id` and `found`.
//!
//! Decoding is tolerant: missing `params` stay unreported, and a `mustache`
//! script whose `source` arrives as a string holding a JSON object is read
//! back as a search template (the store keeps template bodies as strings).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::script::{Script, ScriptSource, StoredScript, LANG_MUSTACHE};

/// Reasons a wire `script` object cannot become a [`Script`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("script object has no source")]
    MissingSource,

    /// `source` was neither a string nor an object.
    #[error("unsupported source type: {0}")]
    UnsupportedSource(&'static str),
}

/// The `script` object exactly as it travels over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireScript {
    pub lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    /// Clusters do not echo `params` back on read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl From<Script> for WireScript {
    fn from(script: Script) -> Self {
        let source = match script.source {
            ScriptSource::Inline(body) => Value::String(body),
            ScriptSource::SearchTemplate(body) => Value::Object(body),
        };
        Self {
            lang: script.lang,
            source: Some(source),
            params: script.params,
        }
    }
}

impl TryFrom<WireScript> for Script {
    type Error = WireError;

    fn try_from(wire: WireScript) -> Result<Self, Self::Error> {
        let source = match wire.source {
            None | Some(Value::Null) => return Err(WireError::MissingSource),
            Some(Value::String(body)) => string_source(&wire.lang, body),
            Some(Value::Object(body)) => ScriptSource::SearchTemplate(body),
            Some(Value::Array(_)) => return Err(WireError::UnsupportedSource("array")),
            Some(Value::Number(_)) => return Err(WireError::UnsupportedSource("number")),
            Some(Value::Bool(_)) => return Err(WireError::UnsupportedSource("bool")),
        };
        Ok(Self {
            lang: wire.lang,
            source,
            params: wire.params,
        })
    }
}

fn string_source(lang: &str, body: String) -> ScriptSource {
    if lang == LANG_MUSTACHE {
        if let Ok(Value::Object(template)) = serde_json::from_str::<Value>(&body) {
            return ScriptSource::SearchTemplate(template);
        }
    }
    ScriptSource::Inline(body)
}

/// Body of `PUT /_scripts/{name}`.
#[derive(Debug, Serialize)]
pub struct PutScriptRequest<'a> {
    pub script: &'a Script,
}

/// Body of a successful `GET /_scripts/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetScriptResponse {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub found: Option<bool>,
    #[serde(default)]
    pub script: Option<WireScript>,
}

impl GetScriptResponse {
    /// Convert into the canonical model, addressed by `name`.
    ///
    /// Returns `None` when the body itself says `found: false`. A script
    /// object that cannot be decoded leaves [`StoredScript::script`] unset.
    pub fn into_stored_script(self, name: &str) -> Option<StoredScript> {
        if self.found == Some(false) {
            return None;
        }
        let script = self.script.and_then(|wire| match Script::try_from(wire) {
            Ok(script) => Some(script),
            Err(e) => {
                tracing::warn!(name, error = %e, "Stored script body could not be decoded");
                None
            }
        });
        Some(StoredScript {
            name: self.id.unwrap_or_else(|| name.to_string()),
            script,
        })
    }
}

/// Body of `GET /`, used to learn the cluster's identity.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    pub cluster_uuid: String,
    #[serde(default)]
    pub cluster_name: Option<String>,
}
