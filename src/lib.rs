//! Espejo is a client-side mirror and batched-synchronization layer
//! for a remote property-graph store queried through a Cypher-like
//! text query language.
//!
//! Nodes and edges are built and registered locally, validated before
//! any network traffic, and flushed to the remote store in bounded
//! bulk `CREATE` batches. Writes are fire-and-forget: espejo offers no
//! transactions and no consistency guarantee beyond whatever the
//! remote store itself provides.
//!
//! ```
//! use espejo::{AddNodeOptions, Edge, Graph, Node};
//! use espejo::testkit::RecordingTransport;
//!
//! # fn main() -> espejo::Result<()> {
//! let mut graph = Graph::open("moma", RecordingTransport::new());
//! let bob = graph.add_node(
//!     Node::with_label("Person").property("name", "Bob"),
//!     &AddNodeOptions::default(),
//! )?;
//! let eve = graph.add_node(
//!     Node::with_label("Person").property("name", "Eve"),
//!     &AddNodeOptions::default(),
//! )?;
//! graph.add_edge(Edge::connect(bob, eve).relation("knows"), true);
//! graph.commit()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod edge;
pub mod error;
pub mod graph;
pub mod ident;
pub mod logging;
pub mod node;
pub mod result;
pub mod testkit;
pub mod transport;
pub mod value;

pub use edge::Edge;
pub use error::{Error, Result};
pub use graph::{AddNodeOptions, Graph, GraphOptions};
pub use node::Node;
pub use result::{QueryResult, Statistics};
pub use transport::{Reply, Transport};
pub use value::Value;
