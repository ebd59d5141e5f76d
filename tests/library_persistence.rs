//! Saved-graph library backed by an on-disk SQLite file
//!
//! Run with: `cargo test --test library_persistence`

mod common;

use common::three_tier;
use infragraph::{
    GraphDocument, GraphLibrary, GraphRepository, GraphUpdate, InfraStore, OpenStore,
    SqliteStore,
};
use std::path::Path;
use std::sync::Arc;

fn open_library(path: &Path) -> GraphLibrary {
    let store = SqliteStore::open(path).unwrap();
    let library = GraphLibrary::with_store(Arc::new(store));
    library.load_all().unwrap();
    library
}

#[test]
fn test_create_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("graphs").join("infragraph.db");
    let (store, _) = three_tier();

    let created = {
        let library = open_library(&db);
        library
            .create_graph("web stack", Some("three tier".into()), store.export_graph())
            .unwrap()
    };

    let library = open_library(&db);
    assert!(library.is_persistent());
    assert_eq!(library.graph_count(), 1);
    let loaded = library.get_graph(&created.id).unwrap();
    assert_eq!(loaded, created);

    let restored = InfraStore::from_document(loaded.data);
    assert_eq!(restored.export_graph(), store.export_graph());
    common::assert_consistent(&restored);
}

#[test]
fn test_update_and_delete_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("infragraph.db");

    let (kept_id, deleted_id) = {
        let library = open_library(&db);
        let kept = library
            .create_graph("staging", None, GraphDocument::default())
            .unwrap();
        let doomed = library
            .create_graph("scratch", None, GraphDocument::default())
            .unwrap();

        let (store, _) = three_tier();
        library
            .update_graph(
                &kept.id,
                GraphUpdate::new()
                    .name("production")
                    .data(store.export_graph()),
            )
            .unwrap();
        assert!(library.delete_graph(&doomed.id).unwrap());
        (kept.id, doomed.id)
    };

    let library = open_library(&db);
    let summaries = library.list_graphs();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, kept_id);
    assert_eq!(summaries[0].name, "production");
    assert_eq!(summaries[0].node_count, 8);
    assert_eq!(summaries[0].edge_count, 4);
    assert!(library.get_graph(&deleted_id).is_none());
    assert!(library.find_by_name("production").is_some());
}

#[test]
fn test_library_writes_through_to_repository() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let library = GraphLibrary::with_store(store.clone());

    let graph = library
        .create_graph("prod", None, GraphDocument::default())
        .unwrap();
    assert_eq!(store.load_graph(&graph.id).unwrap(), Some(graph.clone()));

    library.delete_graph(&graph.id).unwrap();
    assert!(store.load_graph(&graph.id).unwrap().is_none());
}

#[test]
fn test_library_is_shareable_across_threads() {
    let library = Arc::new(GraphLibrary::with_store(Arc::new(
        SqliteStore::open_in_memory().unwrap(),
    )));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let library = Arc::clone(&library);
            std::thread::spawn(move || {
                library
                    .create_graph(&format!("graph-{i}"), None, GraphDocument::default())
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let names: Vec<_> = library.list_graphs().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["graph-0", "graph-1", "graph-2", "graph-3"]);
}
