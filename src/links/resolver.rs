//! CURIE-aware link resolver

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// A single `<prefix>:<local_name>` link relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRelation {
    /// CURIE prefix (e.g. `osdi`)
    pub prefix: String,
    /// Relation name after the colon (e.g. `people`)
    pub local_name: String,
    /// Target of the link
    pub href: String,
}

/// A stream candidate found in the root document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredStream {
    /// Stream name (the relation's local name)
    pub name: String,
    /// Resource URL
    pub url: String,
}

/// Streams keyed by name, in first-seen order
///
/// Inserting a name that is already present replaces its URL but keeps the
/// original position: the last relation with a given name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredStreams {
    entries: Vec<DiscoveredStream>,
}

impl DiscoveredStreams {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a stream; returns the URL it replaced
    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) -> Option<String> {
        let name = name.into();
        let url = url.into();

        match self.entries.iter_mut().find(|s| s.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.url, url)),
            None => {
                self.entries.push(DiscoveredStream { name, url });
                None
            }
        }
    }

    /// URL of a stream
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.url.as_str())
    }

    /// Streams in order
    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredStream> {
        self.entries.iter()
    }

    /// Stream names in order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was discovered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for DiscoveredStreams {
    type Item = DiscoveredStream;
    type IntoIter = std::vec::IntoIter<DiscoveredStream>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Names declared in `_links.curies`
pub fn curie_names(links: &Value) -> HashSet<String> {
    links
        .get("curies")
        .and_then(Value::as_array)
        .map(|curies| {
            curies
                .iter()
                .filter_map(|curie| curie.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse one `_links` entry into a relation
///
/// The key is split at its first colon. Returns `None` for keys without a
/// colon and for links without a non-empty string `href`. Prefix validity
/// is checked by the caller.
pub fn parse_relation(key: &str, link: &Value) -> Option<LinkRelation> {
    let (prefix, local_name) = key.split_once(':')?;
    let href = link
        .get("href")
        .and_then(Value::as_str)
        .filter(|href| !href.is_empty())?;

    Some(LinkRelation {
        prefix: prefix.to_string(),
        local_name: local_name.to_string(),
        href: href.to_string(),
    })
}

/// Resolve the stream candidates of an API root document
///
/// Relations with undeclared prefixes or without an `href` are not streams
/// and are skipped without error.
pub fn resolve_streams(root: &Value) -> DiscoveredStreams {
    let mut streams = DiscoveredStreams::new();

    let Some(links) = root.get("_links") else {
        return streams;
    };
    let Value::Object(entries) = links else {
        return streams;
    };

    let prefixes = curie_names(links);

    for (key, link) in entries {
        let Some(relation) = parse_relation(key, link) else {
            continue;
        };
        if !prefixes.contains(&relation.prefix) {
            debug!(relation = %key, "Skipping relation with undeclared prefix");
            continue;
        }
        if let Some(previous) = streams.insert(&relation.local_name, &relation.href) {
            debug!(
                stream = %relation.local_name,
                previous = %previous,
                url = %relation.href,
                "Relation overrides an earlier stream with the same name"
            );
        }
    }

    streams
}
