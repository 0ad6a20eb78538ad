//! Integration tests for the scene inventory through the public interface.
//!
//! Documents are seeded into a store, containers into a static host, and the
//! resulting trees are inspected through `InventorySession` snapshots.

use std::sync::Arc;

use inventory_core::inventory::{Aggregation, GroupState};
use inventory_core::sync::{group_availability, SiteAvailability};
use inventory_core::tree::TextFilter;
use inventory_core::{
    AssetDoc, BuildRequest, Column, Container, DocumentStore, InventorySession, MemoryStore,
    RefreshOutcome, RefreshTicket, RepresentationDoc, RowKind, RowSnapshot, SiteSyncConfig,
    SqliteStore, StaticHost, StoreAggregation, SubsetDoc, SyncSites, TreeFilter, VersionDoc,
};
use serde_json::json;
use tempfile::TempDir;

fn asset(id: &str, name: &str) -> AssetDoc {
    serde_json::from_value(json!({"_id": id, "name": name})).unwrap()
}

fn subset(id: &str, asset: &str, name: &str) -> SubsetDoc {
    serde_json::from_value(json!({
        "_id": id, "parent": asset, "name": name,
        "data": {"families": ["model"]}
    }))
    .unwrap()
}

fn version(id: &str, subset: &str, name: i64) -> VersionDoc {
    serde_json::from_value(json!({
        "_id": id, "parent": subset, "type": "version", "name": name
    }))
    .unwrap()
}

fn hero(id: &str, subset: &str, pointed: &str) -> VersionDoc {
    serde_json::from_value(json!({
        "_id": id, "parent": subset, "type": "hero_version", "version_id": pointed
    }))
    .unwrap()
}

fn representation(id: &str, version: &str, name: &str) -> RepresentationDoc {
    serde_json::from_value(json!({"_id": id, "parent": version, "name": name})).unwrap()
}

/// R1 -> V3 of "model" (highest V5); R2 -> hero of "rig" pointing at V2 (highest V2).
fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_asset(asset("A1", "chair")).unwrap();
    store.insert_subset(subset("S1", "A1", "model")).unwrap();
    store.insert_subset(subset("S2", "A1", "rig")).unwrap();
    for n in 1..=5 {
        store
            .insert_version(version(&format!("S1V{}", n), "S1", n))
            .unwrap();
    }
    store.insert_version(version("S2V1", "S2", 1)).unwrap();
    store.insert_version(version("S2V2", "S2", 2)).unwrap();
    store.insert_version(hero("S2H", "S2", "S2V2")).unwrap();
    store
        .insert_representation(representation("R1", "S1V3", "abc"))
        .unwrap();
    store
        .insert_representation(representation("R2", "S2H", "ma"))
        .unwrap();
    store
}

fn example_containers() -> Vec<Container> {
    vec![
        Container::new("load1:CON", "load1", "R1"),
        Container::new("load2:CON", "load2", "R1"),
        Container::new("load3:CON", "load3", "R2"),
    ]
}

fn session(store: impl DocumentStore + 'static, containers: Vec<Container>) -> InventorySession {
    InventorySession::builder(Arc::new(store), Arc::new(StaticHost::new(containers))).build()
}

fn child_names(row: &RowSnapshot) -> Vec<&str> {
    row.children
        .iter()
        .map(|c| c.columns[Column::Name.header()].as_str())
        .collect()
}

/// Snapshot without item ids, which differ between refreshes.
fn shape(rows: &[RowSnapshot]) -> Vec<(RowKind, Vec<(&'static str, String)>, bool, Vec<String>)> {
    rows.iter()
        .map(|row| {
            (
                row.kind,
                row.columns.iter().map(|(k, v)| (*k, v.clone())).collect(),
                row.outdated,
                child_names(row).into_iter().map(String::from).collect(),
            )
        })
        .collect()
}

#[test]
fn test_example_scenario() {
    let mut session = session(seeded_store(), example_containers());
    session.refresh(&BuildRequest::flat()).unwrap();

    let rows = session.snapshot();
    assert_eq!(rows.len(), 2);

    let r1 = &rows[0];
    assert_eq!(r1.columns["Name"], "chair_model: (abc)");
    assert_eq!(child_names(r1), vec!["load1", "load2"]);
    assert_eq!(r1.columns["Version"], "v003");
    assert_eq!(r1.columns["Count"], "2");
    assert!(r1.outdated);

    let r2 = &rows[1];
    assert_eq!(child_names(r2), vec!["load3"]);
    assert_eq!(r2.columns["Version"], "[v002]");
    assert!(!r2.outdated);

    let outdated: Vec<_> = session
        .outdated_containers()
        .into_iter()
        .map(|c| c.namespace)
        .collect();
    assert_eq!(outdated, vec!["load1", "load2"]);
}

#[test]
fn test_one_group_per_representation() {
    let containers = vec![
        Container::new("a:CON", "a", "R1"),
        Container::new("b:CON", "b", "R2"),
        Container::new("c:CON", "c", "R1"),
        Container::new("d:CON", "d", "R2"),
        Container::new("e:CON", "e", "R1"),
    ];
    let mut session = session(seeded_store(), containers);
    session.refresh(&BuildRequest::flat()).unwrap();

    let rows = session.snapshot();
    assert_eq!(rows.len(), 2);
    assert_eq!(child_names(&rows[0]), vec!["a", "c", "e"]);
    assert_eq!(child_names(&rows[1]), vec!["b", "d"]);
}

#[test]
fn test_outdated_tracks_highest_version() {
    let store = seeded_store();
    store
        .insert_representation(representation("R5", "S1V5", "abc"))
        .unwrap();
    store
        .insert_representation(representation("R1b", "S1V1", "abc"))
        .unwrap();
    let containers = vec![
        Container::new("old:CON", "old", "R1b"),
        Container::new("new:CON", "new", "R5"),
        Container::new("hero:CON", "hero", "R2"),
    ];
    let mut session = session(store, containers);
    session.refresh(&BuildRequest::flat()).unwrap();

    let outdated: Vec<(String, bool)> = session
        .snapshot()
        .iter()
        .map(|row| (child_names(row)[0].to_string(), row.outdated))
        .collect();
    assert!(outdated.contains(&("old".to_string(), true)));
    assert!(outdated.contains(&("new".to_string(), false)));
    assert!(outdated.contains(&("hero".to_string(), false)));
}

#[test]
fn test_missing_representation_is_isolated() {
    let mut containers = example_containers();
    containers.push(Container::new("ghost:CON", "ghost", "R404"));
    let mut session = session(seeded_store(), containers);
    session.refresh(&BuildRequest::flat()).unwrap();

    let rows = session.snapshot();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].kind, RowKind::NotFoundGroup);
    assert_eq!(rows[0].columns["Name"], "< NOT FOUND - representation >");
    assert_eq!(child_names(&rows[0]), vec!["ghost:CON"]);
    assert!(rows[1..].iter().all(|row| row.kind == RowKind::Group));
}

#[test]
fn test_missing_version_reports_where() {
    let store = seeded_store();
    store
        .insert_representation(representation("R9", "V404", "abc"))
        .unwrap();
    let mut session = session(store, vec![Container::new("x:CON", "x", "R9")]);
    session.refresh(&BuildRequest::flat()).unwrap();

    let rows = session.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].columns["Name"], "< NOT FOUND - version >");
}

#[test]
fn test_availability_bounds() {
    let sites = SyncSites::new("studio", "gdrive");
    let empty = group_availability(&[], &sites);
    assert_eq!(empty.active, SiteAvailability::Unavailable);
    assert_eq!(empty.remote, SiteAvailability::Unavailable);

    let store = seeded_store();
    store
        .insert_representation(
            serde_json::from_value(json!({
                "_id": "R1", "parent": "S1V3", "name": "abc",
                "files": [
                    {"sites": [{"name": "studio", "created_dt": "2021-01-01T00:00:00Z"},
                               {"name": "gdrive", "progress": 0.25}]},
                    {"sites": [{"name": "studio", "progress": 1.5}]}
                ]
            }))
            .unwrap(),
        )
        .unwrap();
    let aggregation = StoreAggregation::new(
        Arc::new(store),
        SiteSyncConfig::Enabled(sites),
    );
    let states = aggregation
        .aggregate(&["R1".to_string()], &RefreshTicket::detached())
        .unwrap();
    let GroupState::Resolved(info) = &states["R1"] else {
        panic!("R1 should resolve");
    };
    let availability = info.availability.unwrap();
    for site in [availability.active, availability.remote] {
        if let SiteAvailability::Ratio(ratio) = site {
            assert!((0.0..=1.0).contains(&ratio));
        }
    }
}

#[test]
fn test_filter_keeps_group_of_matching_child() {
    let containers = vec![
        Container::new("alpha:CON", "alpha", "R1"),
        Container::new("beta:CON", "beta", "R1"),
    ];
    let mut session = session(seeded_store(), containers);
    session.refresh(&BuildRequest::flat()).unwrap();

    session.set_text_filter("bet").unwrap();
    let rows = session.snapshot();
    assert_eq!(rows.len(), 1);

    let model = session.model();
    let group = model.child(model.root(), 0).unwrap();
    let alpha = model.child(group, 0).unwrap();
    let beta = model.child(group, 1).unwrap();
    let filter = TreeFilter::new().with_text(Some(TextFilter::literal("bet").unwrap()));
    assert!(filter.matches(model.tree(), group));
    assert!(filter.matches(model.tree(), beta));
    assert!(!filter.matches(model.tree(), alpha));
}

#[test]
fn test_refresh_is_idempotent() {
    let mut session = session(seeded_store(), example_containers());
    session.refresh(&BuildRequest::flat()).unwrap();
    let first = session.snapshot();
    session.refresh(&BuildRequest::flat()).unwrap();
    let second = session.snapshot();

    assert_eq!(shape(&first), shape(&second));
    assert_ne!(first[0].item_id, second[0].item_id);
}

#[test]
fn test_hierarchy_view_nests_containers() {
    let containers = vec![
        Container::new("set:CON", "set", "R1").with_children(["chair:CON"]),
        Container::new("chair:CON", "chair", "R2").with_parent("set:CON"),
    ];
    let host = StaticHost::new(containers).hierarchical();
    let mut session =
        InventorySession::builder(Arc::new(seeded_store()), Arc::new(host)).build();
    session
        .refresh(&BuildRequest::hierarchy(["set:CON"]))
        .unwrap();

    let rows = session.snapshot();
    assert_eq!(rows.len(), 1);
    let set_row = &rows[0].children[0];
    assert_eq!(set_row.columns["Name"], "set");
    assert_eq!(set_row.children.len(), 1);
    assert_eq!(set_row.children[0].kind, RowKind::Group);
    assert!(session.filter().hierarchy_view());
}

#[test]
fn test_sqlite_backed_session() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::open(temp_dir.path().join("db").join("documents.db")).unwrap();
    store.upsert_asset(&asset("A1", "chair")).unwrap();
    store.upsert_subset(&subset("S1", "A1", "model")).unwrap();
    store.upsert_version(&version("V1", "S1", 1)).unwrap();
    store.upsert_version(&version("V2", "S1", 2)).unwrap();
    store
        .upsert_representation(&representation("R1", "V1", "abc"))
        .unwrap();

    let mut session = session(store, vec![Container::new("a:CON", "a", "R1")]);
    assert!(matches!(
        session.refresh(&BuildRequest::flat()).unwrap(),
        RefreshOutcome::Fetched(())
    ));
    let rows = session.snapshot();
    assert!(rows[0].outdated);

    session.set_version(&rows[0].item_id, "V2").unwrap();
    assert!(!session.snapshot()[0].outdated);
}

#[tokio::test]
async fn test_stale_background_refresh_is_discarded() {
    let mut session = session(seeded_store(), example_containers());
    let stale = session.spawn_refresh(BuildRequest::flat());
    let fresh = session.spawn_refresh(BuildRequest::flat());

    let stale = stale.await.unwrap().unwrap();
    assert!(session.finish_refresh(stale).is_stale());
    assert!(session.snapshot().is_empty());

    let fresh = fresh.await.unwrap().unwrap();
    assert!(!session.finish_refresh(fresh).is_stale());
    assert_eq!(session.snapshot().len(), 2);
}
