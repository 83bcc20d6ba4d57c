//! Declared configuration shape and its conversion to the canonical model.
//!
//! The declared form mirrors what a human writes:
//!
//! ```json
//! {
//!   "name": "sum_script",
//!   "script": [{
//!     "lang": "painless",
//!     "source": [{ "script": "doc['a'].value + params.b" }],
//!     "params": "{\"b\": 1}"
//!   }]
//! }
//! ```
//!
//! `script` and `source` are single-element lists, the source body is one of
//! two mutually exclusive keys, and the JSON-bearing fields are strings so
//! they can be diffed against the previous declaration.
//! [`DeclaredStoredScript::encode`] turns this into a [`StoredScript`];
//! [`DeclaredStoredScript::decode`] renders a stored script back, and
//! [`DeclaredStoredScript::decode_against`] does the same while filling in
//! what the store does not report from the declaration it was written from.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::json;
use crate::script::{Script, ScriptSource, StoredScript};

/// Default value of [`DeclaredScript::params`].
pub const DEFAULT_PARAMS: &str = "{}";

fn default_params() -> String {
    DEFAULT_PARAMS.to_string()
}

/// Top-level declaration of one stored script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredStoredScript {
    /// Identity-affecting; a change forces replacement.
    pub name: String,
    /// Exactly one block.
    pub script: Vec<DeclaredScript>,
}

/// The `script` block of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredScript {
    /// Script language; `mustache` for search templates.
    pub lang: String,
    /// Exactly one block.
    pub source: Vec<DeclaredSource>,
    /// JSON-encoded object.
    #[serde(default = "default_params")]
    pub params: String,
}

/// The `source` block: exactly one of the two keys carries a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// JSON-encoded search-template object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_template: Option<String>,
}

impl DeclaredSource {
    pub fn inline(body: impl Into<String>) -> Self {
        Self {
            script: Some(body.into()),
            search_template: None,
        }
    }

    pub fn search_template(body: impl Into<String>) -> Self {
        Self {
            script: None,
            search_template: Some(body.into()),
        }
    }

    /// Resolve the block into the canonical sum type.
    ///
    /// Empty strings count as "not provided", so a block must carry exactly
    /// one non-empty value.
    pub fn to_source(&self) -> CoreResult<ScriptSource> {
        let script = self.script.as_deref().filter(|s| !s.is_empty());
        let template = self.search_template.as_deref().filter(|s| !s.is_empty());

        match (script, template) {
            (Some(body), None) => Ok(ScriptSource::Inline(body.to_string())),
            (None, Some(raw)) => Ok(ScriptSource::SearchTemplate(json::parse_object(
                "search_template",
                raw,
            )?)),
            (Some(_), Some(_)) => Err(CoreError::Validation(
                "source must set only one of `script` or `search_template`".into(),
            )),
            (None, None) => Err(CoreError::Validation(
                "source must set one of `script` or `search_template`".into(),
            )),
        }
    }

    /// Render a canonical source back into the declared block.
    pub fn from_source(source: &ScriptSource) -> Self {
        match source {
            ScriptSource::Inline(body) => Self::inline(body.clone()),
            ScriptSource::SearchTemplate(template) => {
                Self::search_template(json::canonical_object_string(template))
            }
        }
    }
}

impl DeclaredScript {
    pub fn new(lang: impl Into<String>, source: DeclaredSource) -> Self {
        Self {
            lang: lang.into(),
            source: vec![source],
            params: default_params(),
        }
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    /// The single `source` block.
    pub fn single_source(&self) -> CoreResult<&DeclaredSource> {
        single("script.source", &self.source)
    }

    /// Encode into the canonical [`Script`].
    pub fn to_script(&self) -> CoreResult<Script> {
        if self.lang.is_empty() {
            return Err(CoreError::Validation("script.lang must not be empty".into()));
        }
        let source = self.single_source()?.to_source()?;
        let params = json::parse_object("params", &self.params)?;
        Ok(Script::new(self.lang.clone(), source).with_params(params))
    }

    /// Render a canonical [`Script`] back into the declared block.
    ///
    /// Unreported params render as [`DEFAULT_PARAMS`].
    pub fn from_script(script: &Script) -> Self {
        Self {
            lang: script.lang.clone(),
            source: vec![DeclaredSource::from_source(&script.source)],
            params: script
                .params
                .as_ref()
                .map_or_else(default_params, json::canonical_object_string),
        }
    }

    /// Like [`from_script`](Self::from_script), shaped after `prior`.
    ///
    /// Params the store did not report are taken from `prior`. A `mustache`
    /// body that `prior` declared under `script` reads back as a template
    /// object; it is rendered under `script` again, verbatim when it still
    /// matches.
    pub fn from_script_against(script: &Script, prior: &DeclaredScript) -> Self {
        let mut rendered = Self::from_script(script);
        if script.params.is_none() {
            rendered.params = prior.params.clone();
        }

        let prior_body = prior
            .source
            .first()
            .and_then(|source| source.script.as_deref())
            .filter(|body| !body.is_empty());
        if let (ScriptSource::SearchTemplate(template), Some(body)) = (&script.source, prior_body)
        {
            let unchanged = json::parse_object("script", body)
                .is_ok_and(|declared| json::objects_eq(&declared, template));
            let body = if unchanged {
                body.to_string()
            } else {
                json::canonical_object_string(template)
            };
            rendered.source = vec![DeclaredSource::inline(body)];
        }
        rendered
    }
}

impl DeclaredStoredScript {
    pub fn new(name: impl Into<String>, script: DeclaredScript) -> Self {
        Self {
            name: name.into(),
            script: vec![script],
        }
    }

    /// The single `script` block.
    pub fn single_script(&self) -> CoreResult<&DeclaredScript> {
        single("script", &self.script)
    }

    /// Encode the declaration into the canonical model.
    pub fn encode(&self) -> CoreResult<StoredScript> {
        let script = self.encode_script()?;
        Ok(StoredScript::new(self.name.clone(), script))
    }

    /// Validate the declaration and encode just its payload.
    pub fn encode_script(&self) -> CoreResult<Script> {
        if self.name.is_empty() {
            return Err(CoreError::Validation("name must not be empty".into()));
        }
        self.single_script()?.to_script()
    }

    /// Render a stored script back into the declared shape.
    ///
    /// A stored script without a payload renders with an empty `script`
    /// list, which never equals a valid declaration.
    pub fn decode(stored: &StoredScript) -> Self {
        Self {
            name: stored.name.clone(),
            script: stored
                .script
                .iter()
                .map(DeclaredScript::from_script)
                .collect(),
        }
    }

    /// Render a stored script back, shaped after `prior`, the declaration
    /// it was written from. See [`DeclaredScript::from_script_against`].
    pub fn decode_against(stored: &StoredScript, prior: &DeclaredStoredScript) -> Self {
        let Some(prior_script) = prior.script.first() else {
            return Self::decode(stored);
        };
        Self {
            name: stored.name.clone(),
            script: stored
                .script
                .iter()
                .map(|script| DeclaredScript::from_script_against(script, prior_script))
                .collect(),
        }
    }
}

fn single<'a, T>(field: &str, items: &'a [T]) -> CoreResult<&'a T> {
    match items {
        [item] => Ok(item),
        [] => Err(CoreError::Validation(format!("`{field}` block is required"))),
        _ => Err(CoreError::Validation(format!(
            "`{field}` accepts exactly one block, got {}",
            items.len()
        ))),
    }
}
