//! Canonical stored-script model.
//!
//! [`StoredScript`] is what the remote store holds under a name;
//! [`Script`] is its payload. The two kinds of source body are a sum type
//! so a script with both (or neither) cannot be built.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::json;
use crate::wire::WireScript;

/// Language name the store uses for search templates.
pub const LANG_MUSTACHE: &str = "mustache";

/// The body of a stored script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptSource {
    /// A literal script body in the script's language.
    Inline(String),
    /// A structured search-template body (a search request with Mustache
    /// placeholders).
    SearchTemplate(Map<String, Value>),
}

impl ScriptSource {
    /// Semantic comparison: template bodies compare as JSON, not as text.
    pub fn semantically_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Inline(a), Self::Inline(b)) => a == b,
            (Self::SearchTemplate(a), Self::SearchTemplate(b)) => json::objects_eq(a, b),
            _ => false,
        }
    }

    /// The body as a template object: a template as is, or a literal body
    /// that holds a JSON object.
    pub fn as_template(&self) -> Option<Cow<'_, Map<String, Value>>> {
        match self {
            Self::SearchTemplate(template) => Some(Cow::Borrowed(template)),
            Self::Inline(body) => match serde_json::from_str::<Value>(body) {
                Ok(Value::Object(template)) => Some(Cow::Owned(template)),
                _ => None,
            },
        }
    }
}

/// Payload of a stored script: language, body and invocation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireScript", into = "WireScript")]
pub struct Script {
    pub lang: String,
    pub source: ScriptSource,
    /// Parameters passed at invocation time. `None` when the store did not
    /// report them; locally built scripts always carry a map.
    pub params: Option<Map<String, Value>>,
}

impl Script {
    pub fn new(lang: impl Into<String>, source: ScriptSource) -> Self {
        Self {
            lang: lang.into(),
            source,
            params: Some(Map::new()),
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn is_search_template(&self) -> bool {
        matches!(self.source, ScriptSource::SearchTemplate(_))
    }

    /// Compare two scripts the way drift detection does: `lang` exactly,
    /// the source and params semantically.
    ///
    /// For `mustache` a literal body holding a JSON object equals the same
    /// template given as an object.
    pub fn semantically_eq(&self, other: &Self) -> bool {
        if self.lang != other.lang {
            return false;
        }
        let sources_eq = if self.lang == LANG_MUSTACHE {
            match (self.source.as_template(), other.source.as_template()) {
                (Some(a), Some(b)) => json::objects_eq(&a, &b),
                _ => self.source.semantically_eq(&other.source),
            }
        } else {
            self.source.semantically_eq(&other.source)
        };
        let params_eq = match (&self.params, &other.params) {
            (Some(a), Some(b)) => json::objects_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        sources_eq && params_eq
    }
}

/// A named script as held by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScript {
    /// Unique within a cluster; changing it means a new resource.
    pub name: String,
    /// Present once the store has accepted a definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
}

impl StoredScript {
    pub fn new(name: impl Into<String>, script: Script) -> Self {
        Self {
            name: name.into(),
            script: Some(script),
        }
    }
}
