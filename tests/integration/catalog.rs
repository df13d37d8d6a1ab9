//! Catalog cache behavior, the guarded full re-sync, and plan/delete
//! round trips against a scripted connection.

use espejo::testkit::RecordingTransport;
use espejo::{AddNodeOptions, Error, Graph, Node, Reply, Result};

fn text(s: &str) -> Reply {
    Reply::Text(s.to_owned())
}

/// A `[header, rows]` reply carrying one text column.
fn column_reply(column: &str, names: &[&str]) -> Reply {
    Reply::Array(vec![
        Reply::Array(vec![text(column)]),
        Reply::Array(
            names
                .iter()
                .map(|name| Reply::Array(vec![text(name)]))
                .collect(),
        ),
    ])
}

fn clean_graph() -> Graph<RecordingTransport> {
    Graph::open("catalog_graph", RecordingTransport::new())
}

#[test]
fn label_lookup_refreshes_cache_once() -> Result<()> {
    let mut g = clean_graph();
    g.connection_mut()
        .enqueue(column_reply("label", &["hla_locus", "hla_allele"]));

    assert_eq!(g.label(1)?, "hla_allele");
    assert_eq!(g.connection().sent().len(), 1);

    // Served from cache, no further round trip.
    assert_eq!(g.label(0)?, "hla_locus");
    assert_eq!(g.connection().sent().len(), 1);
    Ok(())
}

#[test]
fn out_of_range_after_refresh_is_an_error() -> Result<()> {
    let mut g = clean_graph();
    g.connection_mut()
        .enqueue(column_reply("label", &["hla_locus"]));

    let err = g.label(5).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(g.connection().sent().len(), 1);
    Ok(())
}

#[test]
fn invalidate_catalog_forces_next_lookup_to_refresh() -> Result<()> {
    let mut g = clean_graph();
    g.connection_mut()
        .enqueue(column_reply("relationshipType", &["knows"]));
    assert_eq!(g.relationship_type(0)?, "knows");

    g.invalidate_catalog();
    g.connection_mut()
        .enqueue(column_reply("relationshipType", &["knows", "owns"]));
    assert_eq!(g.relationship_type(1)?, "owns");
    assert_eq!(g.connection().sent().len(), 2);
    Ok(())
}

#[test]
fn catalog_procedures_send_expected_calls() -> Result<()> {
    let mut g = clean_graph();
    g.connection_mut()
        .enqueue(column_reply("propertyKey", &["name", "rank"]));

    assert_eq!(g.property_keys()?, vec!["name", "rank"]);
    assert_eq!(g.connection().queries()[0], "CALL db.propertyKeys()");
    Ok(())
}

#[test]
fn recreate_without_flag_is_a_noop() -> Result<()> {
    let mut g = clean_graph();
    g.add_node(
        Node::with_label("Person").alias("bob"),
        &AddNodeOptions::default(),
    )?;

    g.recreate_in_database()?;

    assert!(g.connection().sent().is_empty());
    assert_eq!(g.pending_node_count(), 1);
    Ok(())
}

#[test]
fn recreate_with_flag_resends_the_whole_graph() -> Result<()> {
    let mut g = clean_graph();
    g.add_node(
        Node::with_label("Person").alias("bob"),
        &AddNodeOptions::default(),
    )?;
    g.add_node(
        Node::with_label("Person").alias("eve"),
        &AddNodeOptions::default(),
    )?;
    g.commit()?;
    assert_eq!(g.connection().queries().len(), 1);

    g.set_recreate_flag();
    g.recreate_in_database()?;

    // The full node set goes out again even though nothing was pending.
    let queries = g.connection().queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[1].contains("(bob:Person)"));
    assert!(queries[1].contains("(eve:Person)"));
    assert_eq!(g.pending_node_count(), 0);

    // The flag re-arms to off: a second call is a no-op again.
    g.recreate_in_database()?;
    assert_eq!(g.connection().queries().len(), 2);
    Ok(())
}

#[test]
fn execution_plan_joins_operations() -> Result<()> {
    let mut g = clean_graph();
    g.connection_mut().enqueue(Reply::Array(vec![
        text("Results"),
        text("    Project"),
        text("        Node By Label Scan | (p:Person)"),
    ]));

    let plan = g.execution_plan("MATCH (p:Person) RETURN p")?;
    assert_eq!(
        plan,
        "Results\n    Project\n        Node By Label Scan | (p:Person)"
    );
    let sent = g.connection().sent();
    assert_eq!(sent[0].0, "GRAPH.EXPLAIN");
    Ok(())
}

#[test]
fn delete_resets_mirror_and_catalog() -> Result<()> {
    let mut g = clean_graph();
    g.connection_mut()
        .enqueue(column_reply("label", &["hla_locus"]));
    assert_eq!(g.label(0)?, "hla_locus");
    g.add_node(Node::with_label("Person").alias("bob"), &AddNodeOptions::default())?;

    g.delete()?;

    assert!(g.nodes().is_empty());
    assert_eq!(g.pending_node_count(), 0);
    // The catalog cache was dropped too: the next lookup refreshes.
    g.connection_mut()
        .enqueue(column_reply("label", &["other"]));
    assert_eq!(g.label(0)?, "other");
    Ok(())
}

#[test]
fn commit_reply_statistics_decode() -> Result<()> {
    let mut g = clean_graph();
    g.connection_mut().enqueue(Reply::Array(vec![Reply::Array(vec![
        text("Nodes created: 1"),
        text("Properties set: 1"),
        text("Query internal execution time: 0.5 milliseconds"),
    ])]));

    let result = g.query("CREATE (a:Person{name:\"Bob\"})", None)?;
    assert_eq!(result.statistics.nodes_created(), 1);
    assert_eq!(result.statistics.properties_set(), 1);
    assert_eq!(result.statistics.execution_time_ms(), Some(0.5));
    Ok(())
}
