//! The in-memory graph mirror and its batched synchronization protocol.
//!
//! A [`Graph`] owns the full believed-current node and edge
//! collections plus the pending subset not yet flushed to the remote
//! store. `add_node`/`add_edge` mutate local state synchronously and
//! never touch the network; `commit` drains the pending state into
//! bulk `CREATE` commands, bounded in size by the flush rate.
//!
//! The model is single-threaded cooperative: every operation blocks
//! the caller until any network round trip completes, and nothing here
//! is synchronized. A graph discarded without a commit silently drops
//! its unflushed state.

use std::collections::BTreeMap;

use indicatif::ProgressBar;
use tracing::{debug, info, trace, warn};

use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::ident;
use crate::node::Node;
use crate::result::QueryResult;
use crate::transport::{Reply, Transport};
use crate::value::Value;

const CREATE_PREFIX: &str = "CREATE ";

const QUERY_COMMAND: &str = "GRAPH.QUERY";
const EXPLAIN_COMMAND: &str = "GRAPH.EXPLAIN";
const DELETE_COMMAND: &str = "GRAPH.DELETE";
const COMPACT_FLAG: &str = "--compact";

const LABELS_PROCEDURE: &str = "db.labels";
const RELATIONSHIP_TYPES_PROCEDURE: &str = "db.relationshipTypes";
const PROPERTY_KEYS_PROCEDURE: &str = "db.propertyKeys";

/// Construction options for [`Graph`].
#[derive(Clone, Copy, Debug)]
pub struct GraphOptions {
    /// Maximum number of entities combined into a single bulk write
    /// command. Bulk `CREATE` with many comma-separated patterns is far
    /// cheaper than one query per entity, but an unbounded query risks
    /// the remote store's message and parser limits.
    pub flush_rate: usize,
    /// Whether to render a terminal progress bar while registering or
    /// flushing large batches.
    pub progress: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            flush_rate: 100,
            progress: false,
        }
    }
}

/// Options for [`Graph::add_node`].
#[derive(Clone, Debug)]
pub struct AddNodeOptions {
    /// When set, the alias is copied from this property's current text
    /// value (overwriting any existing alias), letting a designated
    /// property act as a natural key.
    pub alias_property: Option<String>,
    /// Whether to run identifier validation on alias, label, and every
    /// property key. Defaults to `true`.
    pub validate: bool,
}

impl Default for AddNodeOptions {
    fn default() -> Self {
        Self {
            alias_property: None,
            validate: true,
        }
    }
}

impl AddNodeOptions {
    /// Options that alias each node from the given property.
    pub fn alias_from(property: impl Into<String>) -> Self {
        Self {
            alias_property: Some(property.into()),
            ..Self::default()
        }
    }
}

/// Client-side mirror of one named graph in the remote store.
///
/// Generic over its [`Transport`] so tests can run against a scripted
/// connection and production callers against a real one.
pub struct Graph<T> {
    name: String,
    conn: T,
    flush_rate: usize,
    progress: bool,
    recreate_flag: bool,
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
    pending_nodes: BTreeMap<String, Node>,
    pending_edges: Vec<Edge>,
    label_cache: Vec<String>,
    relationship_type_cache: Vec<String>,
    property_key_cache: Vec<String>,
}

impl<T: Transport> Graph<T> {
    /// Creates an empty mirror of the named remote graph.
    ///
    /// Nothing is loaded from the remote store; the mirror starts
    /// empty regardless of what the store holds.
    pub fn open(name: impl Into<String>, conn: T) -> Self {
        Self::with_options(name, conn, GraphOptions::default())
    }

    /// Creates an empty mirror with explicit options.
    pub fn with_options(name: impl Into<String>, conn: T, opts: GraphOptions) -> Self {
        Self {
            name: name.into(),
            conn,
            flush_rate: opts.flush_rate.max(1),
            progress: opts.progress,
            recreate_flag: false,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            pending_nodes: BTreeMap::new(),
            pending_edges: Vec::new(),
            label_cache: Vec::new(),
            relationship_type_cache: Vec::new(),
            property_key_cache: Vec::new(),
        }
    }

    /// The remote store identifier of this graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &T {
        &self.conn
    }

    /// Mutably borrows the underlying connection.
    pub fn connection_mut(&mut self) -> &mut T {
        &mut self.conn
    }

    /// The full believed-current node set, keyed by alias.
    pub fn nodes(&self) -> &BTreeMap<String, Node> {
        &self.nodes
    }

    /// All edges added in this session.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes not yet flushed to the remote store.
    pub fn pending_node_count(&self) -> usize {
        self.pending_nodes.len()
    }

    /// Number of edges not yet flushed to the remote store.
    pub fn pending_edge_count(&self) -> usize {
        self.pending_edges.len()
    }

    /// Registers a node and marks it pending; returns its alias.
    ///
    /// Alias resolution order: `opts.alias_property` (must name a text
    /// property), then the node's own alias, then a random one whose
    /// uniqueness is best-effort only. Re-using an alias silently
    /// replaces the previous holder and its pending state.
    ///
    /// Never touches the network.
    pub fn add_node(&mut self, mut node: Node, opts: &AddNodeOptions) -> Result<String> {
        if let Some(key) = &opts.alias_property {
            match node.properties.get(key.as_str()) {
                Some(Value::Text(alias)) => node.alias = Some(alias.clone()),
                Some(other) => {
                    return Err(Error::InvalidArgument(format!(
                        "alias property '{key}' holds {other:?}, not text"
                    )))
                }
                None => {
                    return Err(Error::InvalidArgument(format!(
                        "alias property '{key}' is not set on the node"
                    )))
                }
            }
        }

        let alias = match &node.alias {
            Some(alias) => alias.clone(),
            None => {
                let alias = ident::random_alias();
                node.alias = Some(alias.clone());
                alias
            }
        };

        if opts.validate {
            node.validate()?;
        }

        trace!(graph = %self.name, alias = %alias, "registering node");
        self.nodes.insert(alias.clone(), node.clone());
        self.pending_nodes.insert(alias.clone(), node);
        Ok(alias)
    }

    /// Adds every node in input order and returns the resulting
    /// aliases. The first failure aborts the batch at that point;
    /// earlier elements remain added and pending.
    pub fn add_nodes(
        &mut self,
        nodes: impl IntoIterator<Item = Node>,
        opts: &AddNodeOptions,
    ) -> Result<Vec<String>> {
        let nodes: Vec<Node> = nodes.into_iter().collect();
        let bar = self.progress_bar(nodes.len());
        let mut aliases = Vec::with_capacity(nodes.len());
        for node in nodes {
            aliases.push(self.add_node(node, opts)?);
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(aliases)
    }

    /// Appends an edge and marks it pending.
    ///
    /// With `validate_endpoints`, both endpoint aliases must already be
    /// registered in this graph's node table.
    ///
    /// # Panics
    ///
    /// Panics when `validate_endpoints` is set and an endpoint alias is
    /// unknown. An edge referencing absent endpoints can never be sent
    /// correctly, so this is a call-order bug rather than a recoverable
    /// condition.
    pub fn add_edge(&mut self, edge: Edge, validate_endpoints: bool) {
        if validate_endpoints {
            assert!(
                self.nodes.contains_key(&edge.src),
                "edge source '{}' is not a registered node alias",
                edge.src
            );
            assert!(
                self.nodes.contains_key(&edge.dst),
                "edge destination '{}' is not a registered node alias",
                edge.dst
            );
        }
        trace!(graph = %self.name, src = %edge.src, dst = %edge.dst, "registering edge");
        self.edges.push(edge.clone());
        self.pending_edges.push(edge);
    }

    /// Appends every edge in input order. See [`Graph::add_edge`].
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>, validate_endpoints: bool) {
        let edges: Vec<Edge> = edges.into_iter().collect();
        let bar = self.progress_bar(edges.len());
        for edge in edges {
            self.add_edge(edge, validate_endpoints);
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    /// Synchronizes the remote store with the in-memory graph.
    ///
    /// Pending nodes flush first, then pending edges: an edge in the
    /// remote store requires both endpoints to already exist there.
    /// Each flush walks its collection in natural order, packing up to
    /// `flush_rate` rendered fragments per bulk `CREATE` command.
    ///
    /// The pending collections are cleared only after their entire
    /// flush succeeded. A mid-flush transport error propagates
    /// immediately and leaves the whole pending collection as it was
    /// on entry, so entities from batches that were already sent will
    /// be re-sent by the next commit (at-least-once).
    pub fn commit(&mut self) -> Result<()> {
        self.flush_pending_nodes()?;
        self.flush_pending_edges()?;
        Ok(())
    }

    fn flush_pending_nodes(&mut self) -> Result<()> {
        let fragments: Vec<String> = self.pending_nodes.values().map(Node::to_pattern).collect();
        let batches = self.send_batches(&fragments)?;
        if batches > 0 {
            debug!(
                graph = %self.name,
                nodes = fragments.len(),
                batches,
                "flushed pending nodes"
            );
        }
        self.pending_nodes.clear();
        Ok(())
    }

    fn flush_pending_edges(&mut self) -> Result<()> {
        let fragments: Vec<String> = self.pending_edges.iter().map(Edge::to_pattern).collect();
        let batches = self.send_batches(&fragments)?;
        if batches > 0 {
            debug!(
                graph = %self.name,
                edges = fragments.len(),
                batches,
                "flushed pending edges"
            );
        }
        self.pending_edges.clear();
        Ok(())
    }

    /// Sends `fragments` as a sequence of bulk `CREATE` commands of at
    /// most `flush_rate` fragments each; returns how many commands
    /// went out. An empty slice sends nothing.
    fn send_batches(&mut self, fragments: &[String]) -> Result<usize> {
        if fragments.is_empty() {
            return Ok(0);
        }
        let bar = self.progress_bar(fragments.len());
        let mut sent = 0;
        let mut buffer = String::from(CREATE_PREFIX);
        let mut buffered = 0;
        for fragment in fragments {
            buffer.push_str(fragment);
            buffer.push(',');
            buffered += 1;
            if buffered == self.flush_rate {
                self.run_query(&buffer)?;
                sent += 1;
                bar.inc(buffered as u64);
                buffer = String::from(CREATE_PREFIX);
                buffered = 0;
            }
        }
        if buffered > 0 {
            self.run_query(&buffer)?;
            sent += 1;
            bar.inc(buffered as u64);
        }
        bar.finish_and_clear();
        Ok(sent)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if self.progress {
            ProgressBar::new(len as u64)
        } else {
            ProgressBar::hidden()
        }
    }

    /// Destructively re-sends the **entire** graph, not just the
    /// pending subset, for when the remote store is stale or missing.
    ///
    /// Guarded by a two-step confirmation: without a prior
    /// [`Graph::set_recreate_flag`] the call logs a warning and does
    /// nothing. The flag re-arms to off afterwards.
    pub fn recreate_in_database(&mut self) -> Result<()> {
        if !self.recreate_flag {
            warn!(
                graph = %self.name,
                "set_recreate_flag must be called before recreate_in_database; ignoring"
            );
            return Ok(());
        }

        info!(
            graph = %self.name,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "recreating graph in the remote store"
        );
        let node_fragments: Vec<String> = self.nodes.values().map(Node::to_pattern).collect();
        let edge_fragments: Vec<String> = self.edges.iter().map(Edge::to_pattern).collect();
        self.send_batches(&node_fragments)?;
        self.send_batches(&edge_fragments)?;

        self.pending_nodes.clear();
        self.pending_edges.clear();
        self.recreate_flag = false;
        Ok(())
    }

    /// Arms the destructive [`Graph::recreate_in_database`].
    pub fn set_recreate_flag(&mut self) {
        self.recreate_flag = true;
    }

    /// Executes a query against the graph.
    ///
    /// With `params`, a `CYPHER k1=v1 k2=v2 ` header is prepended
    /// (values rendered as literals) so the server substitutes them.
    pub fn query(&mut self, text: &str, params: Option<&[(&str, Value)]>) -> Result<QueryResult> {
        match params {
            Some(params) => {
                let composed = format!("{}{}", params_header(params), text);
                self.run_query(&composed)
            }
            None => self.run_query(text),
        }
    }

    /// Merges a pattern into the remote graph (`MERGE <pattern>`).
    pub fn merge(&mut self, pattern: &str) -> Result<QueryResult> {
        let query = format!("MERGE {pattern}");
        self.run_query(&query)
    }

    fn run_query(&mut self, text: &str) -> Result<QueryResult> {
        // A batching caller may leave a trailing separator behind.
        let text = text.strip_suffix(',').unwrap_or(text);
        trace!(graph = %self.name, query = text, "executing query");
        let reply = self.conn.execute(
            QUERY_COMMAND,
            &[self.name.clone(), text.to_owned(), COMPACT_FLAG.to_owned()],
        )?;
        QueryResult::decode(reply)
    }

    /// Retrieves the remote store's execution plan for `text`, one
    /// operation per line.
    pub fn execution_plan(&mut self, text: &str) -> Result<String> {
        let reply = self
            .conn
            .execute(EXPLAIN_COMMAND, &[self.name.clone(), text.to_owned()])?;
        let steps = reply.into_array()?;
        let mut lines = Vec::with_capacity(steps.len());
        for step in steps {
            match step {
                Reply::Text(line) => lines.push(line),
                other => {
                    return Err(Error::Response(format!(
                        "unexpected execution plan step: {other:?}"
                    )))
                }
            }
        }
        Ok(lines.join("\n"))
    }

    /// Deletes the graph from the remote store and resets the mirror
    /// to a fresh empty state.
    ///
    /// Local state is reset before the remote command goes out, so a
    /// remote failure (e.g. graph-not-found) still leaves the mirror
    /// empty.
    pub fn delete(&mut self) -> Result<()> {
        self.reset();
        info!(graph = %self.name, "deleting graph from the remote store");
        self.conn.execute(DELETE_COMMAND, &[self.name.clone()])?;
        Ok(())
    }

    fn reset(&mut self) {
        self.recreate_flag = false;
        self.nodes.clear();
        self.edges.clear();
        self.pending_nodes.clear();
        self.pending_edges.clear();
        self.invalidate_catalog();
    }

    /// Calls a stored procedure: `CALL name(args) YIELD yields`.
    /// String arguments are quoted through the literal formatter.
    pub fn call_procedure(
        &mut self,
        procedure: &str,
        args: &[&str],
        yields: &[&str],
    ) -> Result<QueryResult> {
        let args: Vec<String> = args.iter().map(|arg| Value::from(*arg).to_literal()).collect();
        let mut query = format!("CALL {procedure}({})", args.join(","));
        if !yields.is_empty() {
            query.push_str(" YIELD ");
            query.push_str(&yields.join(","));
        }
        self.run_query(&query)
    }

    /// Retrieves the set of node labels from the remote store.
    pub fn labels(&mut self) -> Result<Vec<String>> {
        self.procedure_column(LABELS_PROCEDURE)
    }

    /// Retrieves the set of relationship types from the remote store.
    pub fn relationship_types(&mut self) -> Result<Vec<String>> {
        self.procedure_column(RELATIONSHIP_TYPES_PROCEDURE)
    }

    /// Retrieves the set of property keys from the remote store.
    pub fn property_keys(&mut self) -> Result<Vec<String>> {
        self.procedure_column(PROPERTY_KEYS_PROCEDURE)
    }

    fn procedure_column(&mut self, procedure: &str) -> Result<Vec<String>> {
        let result = self.call_procedure(procedure, &[], &[])?;
        Ok(result
            .result_set
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter_map(|value| match value {
                Value::Text(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Resolves a label id from the cached catalog, refreshing the
    /// cache from the remote store once on an out-of-range index.
    ///
    /// The caches are never invalidated proactively within a session;
    /// call [`Graph::invalidate_catalog`] to force the next lookup to
    /// refresh.
    pub fn label(&mut self, idx: usize) -> Result<String> {
        if self.label_cache.get(idx).is_none() {
            self.label_cache = self.labels()?;
        }
        self.label_cache.get(idx).cloned().ok_or(Error::NotFound("label"))
    }

    /// Resolves a relationship type id from the cached catalog; same
    /// refresh behavior as [`Graph::label`].
    pub fn relationship_type(&mut self, idx: usize) -> Result<String> {
        if self.relationship_type_cache.get(idx).is_none() {
            self.relationship_type_cache = self.relationship_types()?;
        }
        self.relationship_type_cache
            .get(idx)
            .cloned()
            .ok_or(Error::NotFound("relationship type"))
    }

    /// Resolves a property key id from the cached catalog; same
    /// refresh behavior as [`Graph::label`].
    pub fn property_key(&mut self, idx: usize) -> Result<String> {
        if self.property_key_cache.get(idx).is_none() {
            self.property_key_cache = self.property_keys()?;
        }
        self.property_key_cache
            .get(idx)
            .cloned()
            .ok_or(Error::NotFound("property key"))
    }

    /// Empties all three catalog caches so the next indexed lookup
    /// refreshes from the remote store.
    pub fn invalidate_catalog(&mut self) {
        self.label_cache.clear();
        self.relationship_type_cache.clear();
        self.property_key_cache.clear();
    }
}

fn params_header(params: &[(&str, Value)]) -> String {
    let mut header = String::from("CYPHER ");
    for (key, value) in params {
        header.push_str(key);
        header.push('=');
        header.push_str(&value.to_literal());
        header.push(' ');
    }
    header
}
