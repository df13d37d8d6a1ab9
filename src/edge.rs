//! Local edge entity and its pattern rendering.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::ident::{self, ValidateOptions};
use crate::node::render_property_block;
use crate::value::Value;

/// A directed edge between two nodes of the mirrored graph.
///
/// Endpoints are held by alias, a lookup-by-key relation into the
/// graph's node table, never an owning reference: the node's canonical
/// storage stays the graph itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Edge {
    /// Alias of the source node.
    pub src: String,
    /// Alias of the destination node.
    pub dst: String,
    /// Optional pattern variable for the edge itself.
    pub alias: Option<String>,
    /// Optional relation type tag.
    pub relation: Option<String>,
    /// Property map, same shape as node properties.
    pub properties: BTreeMap<String, Value>,
}

impl Edge {
    /// Creates an edge from `src` to `dst` (endpoint aliases).
    pub fn connect(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            ..Self::default()
        }
    }

    /// Sets the relation type.
    pub fn relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Sets the edge's own pattern variable.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets a property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Validates alias, relation, and every property key against the
    /// identifier grammar.
    pub fn validate(&self) -> Result<()> {
        let opts = ValidateOptions::default();
        ident::validate(self.alias.as_deref(), opts)?;
        ident::validate(self.relation.as_deref(), opts)?;
        for key in self.properties.keys() {
            ident::validate(Some(key), opts)?;
        }
        Ok(())
    }

    /// Renders the edge into its pattern fragment, e.g.
    /// `(a)-[:knows{since:2009}]->(b)`. Null-valued properties are
    /// omitted, as for nodes.
    pub fn to_pattern(&self) -> String {
        let mut out = String::from("(");
        out.push_str(&self.src);
        out.push_str(")-[");
        if let Some(alias) = &self.alias {
            out.push_str(alias);
        }
        if let Some(relation) = &self.relation {
            out.push(':');
            out.push_str(relation);
        }
        out.push_str(&render_property_block(&self.properties));
        out.push_str("]->(");
        out.push_str(&self.dst);
        out.push(')');
        out
    }
}
