//! Composite resource identifiers.
//!
//! A [`CompositeId`] couples the identity of the cluster a script lives in
//! with the script's own name, so the same name under two connections never
//! collides. Its string form is `<cluster>/<name>`:
//!
//! - `%` and `/` inside the cluster part are escaped as `%25` and `%2F`;
//! - the name follows the first `/` verbatim and may itself contain `/`.
//!
//! This keeps the common case readable (`"aBcD1234/sum_script"`) while
//! staying unambiguous for every input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, CoreResult};

const SEPARATOR: char = '/';

/// Opaque handle of one stored script within one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    cluster_id: String,
    resource_id: String,
}

impl CompositeId {
    /// Build an id from a cluster scope and a script name.
    ///
    /// Both parts must be non-empty, otherwise the id could not be parsed
    /// back.
    pub fn compose(
        cluster_id: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> CoreResult<Self> {
        let cluster_id = cluster_id.into();
        let resource_id = resource_id.into();
        if cluster_id.is_empty() || resource_id.is_empty() {
            let rendered = format!("{}{SEPARATOR}{resource_id}", escape(&cluster_id));
            let reason = if cluster_id.is_empty() {
                "cluster id is empty"
            } else {
                "resource id is empty"
            };
            return Err(malformed(&rendered, reason));
        }
        Ok(Self {
            cluster_id,
            resource_id,
        })
    }

    /// Parse the string form produced by [`Display`](fmt::Display).
    pub fn parse(id: &str) -> CoreResult<Self> {
        let (cluster, resource) = id
            .split_once(SEPARATOR)
            .ok_or_else(|| malformed(id, "missing '/' separator"))?;
        if cluster.is_empty() {
            return Err(malformed(id, "cluster id is empty"));
        }
        if resource.is_empty() {
            return Err(malformed(id, "resource id is empty"));
        }
        let cluster_id =
            unescape(cluster).ok_or_else(|| malformed(id, "invalid escape in cluster id"))?;
        Ok(Self {
            cluster_id,
            resource_id: resource.to_string(),
        })
    }

    /// The connection scope (the cluster UUID).
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// The script name.
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn into_parts(self) -> (String, String) {
        (self.cluster_id, self.resource_id)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            escape(&self.cluster_id),
            self.resource_id
        )
    }
}

impl FromStr for CompositeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CompositeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompositeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn malformed(id: &str, reason: &'static str) -> CoreError {
    CoreError::MalformedId {
        id: id.to_string(),
        reason,
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape`]. Only `%25` and `%2F` (any hex case) are valid.
fn unescape(escaped: &str) -> Option<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3)?;
        match code {
            "25" => out.push('%'),
            "2F" | "2f" => out.push('/'),
            _ => return None,
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}
