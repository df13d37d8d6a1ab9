//! Node and edge registration scenarios against a scripted connection,
//! modeled on a real ingestion workload (HLA loci and alleles).

use espejo::testkit::RecordingTransport;
use espejo::{ident, AddNodeOptions, Edge, Error, Graph, Node, Result};

const GRAPH_NAME: &str = "test_graph";

fn hla_loci() -> Vec<&'static str> {
    vec![
        "HLA_A", "HLA_B", "HLA_C", "HLA_DRB1", "HLA_DRB3", "HLA_DRB4", "HLA_DRB5",
    ]
}

fn invalid_hla_alleles() -> Vec<&'static str> {
    vec![
        "DRB1*04:20",
        "B*39:45",
        "C*12:21",
        "DRB1*09:09",
        "B*37:01",
        "A**0201",
    ]
}

fn valid_hla_alleles() -> Vec<&'static str> {
    vec![
        "DRB1_04_20",
        "B_39_45",
        "C_12_21",
        "DRB1_09_09",
        "B_37_01",
        "A__0201",
    ]
}

fn clean_graph() -> Graph<RecordingTransport> {
    Graph::open(GRAPH_NAME, RecordingTransport::new())
}

fn locus_node(locus: &str) -> Node {
    Node::with_label("hla_locus").property("locus", locus)
}

#[test]
fn insert_with_underscore_names() -> Result<()> {
    let mut graph = clean_graph();
    let nodes: Vec<Node> = hla_loci().into_iter().map(locus_node).collect();

    let aliases = graph.add_nodes(nodes, &AddNodeOptions::alias_from("locus"))?;
    assert_eq!(aliases, hla_loci());
    assert_eq!(graph.pending_node_count(), hla_loci().len());

    graph.commit()?;

    assert_eq!(graph.nodes().len(), hla_loci().len());
    assert_eq!(graph.pending_node_count(), 0);
    Ok(())
}

#[test]
fn insert_invalid_names_raises() {
    let mut graph = clean_graph();
    let nodes: Vec<Node> = invalid_hla_alleles()
        .into_iter()
        .map(|allele| Node::with_label("hla_allele").property("allele", allele))
        .collect();

    let err = graph
        .add_nodes(nodes, &AddNodeOptions::alias_from("allele"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier(_)));
    // Nothing was registered and nothing went over the wire.
    assert!(graph.nodes().is_empty());
    assert!(graph.connection().sent().is_empty());
}

#[test]
fn batch_aborts_at_first_invalid_element() {
    let mut graph = clean_graph();
    let nodes = vec![
        locus_node("HLA_A"),
        locus_node("B*39:45"),
        locus_node("C_12_21"),
    ];

    assert!(graph
        .add_nodes(nodes, &AddNodeOptions::alias_from("locus"))
        .is_err());
    // The element before the offender remains added and pending.
    assert_eq!(graph.nodes().len(), 1);
    assert!(graph.nodes().contains_key("HLA_A"));
    assert_eq!(graph.pending_node_count(), 1);
}

#[test]
fn fix_invalid_names() {
    let fixed: Vec<String> = invalid_hla_alleles()
        .into_iter()
        .map(ident::sanitize)
        .collect();
    assert_eq!(fixed, valid_hla_alleles());
}

#[test]
fn insert_missing_property_renders_without_it() -> Result<()> {
    let mut graph = clean_graph();
    let node = Node::with_label("hla_allele")
        .property("allele", "A_02_01")
        .property("missing_property", espejo::Value::Null);

    graph.add_nodes(vec![node], &AddNodeOptions::default())?;
    graph.commit()?;

    let queries = graph.connection().queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("allele:\"A_02_01\""));
    assert!(!queries[0].contains("missing_property"));
    assert!(!queries[0].contains("null"));
    Ok(())
}

#[test]
#[should_panic(expected = "not a registered node alias")]
fn edge_before_endpoints_panics() {
    let mut graph = clean_graph();
    graph.add_edge(Edge::connect("a", "b").relation("knows"), true);
}

#[test]
fn edge_after_endpoints_succeeds() -> Result<()> {
    let mut graph = clean_graph();
    graph.add_node(Node::new().alias("a"), &AddNodeOptions::default())?;
    graph.add_node(Node::new().alias("b"), &AddNodeOptions::default())?;
    graph.add_edge(Edge::connect("a", "b").relation("knows"), true);
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.pending_edge_count(), 1);
    Ok(())
}

#[test]
fn edge_validation_can_be_skipped() {
    let mut graph = clean_graph();
    graph.add_edge(Edge::connect("ghost", "phantom"), false);
    assert_eq!(graph.pending_edge_count(), 1);
}
