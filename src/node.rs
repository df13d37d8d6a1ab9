//! Local node entity and its pattern rendering.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::error::Result;
use crate::ident::{self, ValidateOptions};
use crate::value::Value;

/// A node in the mirrored graph.
///
/// The alias is a client-side handle: it keys the node inside a
/// [`Graph`](crate::Graph) and doubles as the pattern variable in
/// generated queries. The remote id is only ever populated from query
/// results, never set by the client on creation.
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// Remote-assigned identifier, present only after the node is known
    /// to exist in the remote store.
    pub id: Option<u64>,
    /// Unique-within-graph name, also the pattern variable.
    pub alias: Option<String>,
    /// Optional single type tag.
    pub label: Option<String>,
    /// Property map. Keys must be valid identifiers.
    pub properties: BTreeMap<String, Value>,
}

impl Node {
    /// Creates an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node carrying the given label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Sets the alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets a property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Validates alias, label, and every property key against the
    /// identifier grammar. The first offender aborts with
    /// [`Error::InvalidIdentifier`](crate::Error::InvalidIdentifier).
    pub fn validate(&self) -> Result<()> {
        let opts = ValidateOptions::default();
        ident::validate(self.alias.as_deref(), opts)?;
        ident::validate(self.label.as_deref(), opts)?;
        for key in self.properties.keys() {
            ident::validate(Some(key), opts)?;
        }
        Ok(())
    }

    /// Renders just the `{k:v,...}` property block, or an empty string
    /// when no non-null property remains.
    ///
    /// Null-valued properties are omitted entirely rather than rendered
    /// as `k:null`; the remote store treats an absent property and a
    /// null property the same way.
    pub fn property_block(&self) -> String {
        render_property_block(&self.properties)
    }

    /// Renders the node into the pattern fragment used inside
    /// create/merge queries, e.g. `(a:Person{name:"Bob"})`.
    pub fn to_pattern(&self) -> String {
        let mut out = String::from("(");
        if let Some(alias) = &self.alias {
            out.push_str(alias);
        }
        if let Some(label) = &self.label {
            out.push(':');
            out.push_str(label);
        }
        out.push_str(&self.property_block());
        out.push(')');
        out
    }
}

/// Shared property-block rendering for nodes and edges.
pub(crate) fn render_property_block(properties: &BTreeMap<String, Value>) -> String {
    let live: Vec<String> = properties
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| format!("{k}:{}", v.to_literal()))
        .collect();
    if live.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", live.join(","))
    }
}

impl PartialEq for Node {
    /// Two nodes are equal if both carry the same non-null remote id,
    /// or failing that, if label and the full property map match
    /// exactly. The alias never participates.
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            if a == b {
                return true;
            }
        }
        self.label == other.label && self.properties == other.properties
    }
}

impl Hash for Node {
    /// Hashes the structural key (label plus properties), matching the
    /// equality rule's fallback arm. Alias and remote id are excluded.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.properties.hash(state);
    }
}
