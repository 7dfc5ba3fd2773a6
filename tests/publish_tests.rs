//! End-to-end publish cycle tests: pipeline, barrier, and reclamation.

mod common;

use common::Fixture;
use roadstore::artifacts::graph::IDENTITY_LEN;
use roadstore::publisher::CONTROL_REGION_NAME;
use roadstore::{PublishedView, Publisher, SectionId, StoreError};
use std::path::Path;
use tempfile::TempDir;

/// Region files other than the control region left under the shm dir
fn leftover_regions(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != CONTROL_REGION_NAME && name.starts_with("roadstore_"))
        .collect()
}

#[test]
fn test_publish_and_attach_roundtrip() {
    let artifact_dir = TempDir::new().unwrap();
    let shm_dir = TempDir::new().unwrap();
    let fixture = Fixture::default();
    let paths = fixture.write(artifact_dir.path());

    let mut publisher = Publisher::new(shm_dir.path()).unwrap();
    let generation = publisher.publish(&paths).unwrap();
    assert_eq!(generation, 1);

    let view = PublishedView::attach(shm_dir.path()).unwrap();
    assert_eq!(view.generation(), 1);
    assert_eq!(view.checksum(), fixture.checksum);

    // direct copies come back byte-identical
    assert_eq!(view.section(SectionId::GraphNodes), fixture.graph_node_bytes());
    assert_eq!(view.section(SectionId::GraphEdges), fixture.graph_edge_bytes());
    assert_eq!(view.section(SectionId::NameChars), fixture.name_chars);
    let tree_flat: Vec<u8> = fixture.tree_nodes.iter().flatten().copied().collect();
    assert_eq!(view.section(SectionId::TreeNodes), tree_flat);

    // transformed sections come back value-equivalent
    assert_eq!(view.section(SectionId::Coordinates), fixture.coordinate_bytes());
    let turns = view.section(SectionId::TurnInstructions);
    for (i, &(_, _, turn)) in fixture.edge_records.iter().enumerate() {
        assert_eq!(turns[i], turn);
    }

    // absent timestamp file stores the sentinel
    assert_eq!(view.timestamp(), "n/a");
}

#[test]
fn test_timestamp_file_is_capped() {
    let artifact_dir = TempDir::new().unwrap();
    let shm_dir = TempDir::new().unwrap();
    let fixture = Fixture::default();
    let mut paths = fixture.write(artifact_dir.path());

    let ts_path = artifact_dir.path().join("map.timestamp");
    let line = "2026-08-26T00:00:00Z-and-then-some-more";
    assert_eq!(line.len(), 39);
    common::write_timestamp(&ts_path, line);
    paths.timestamp = Some(ts_path);

    let mut publisher = Publisher::new(shm_dir.path()).unwrap();
    publisher.publish(&paths).unwrap();

    let view = PublishedView::attach(shm_dir.path()).unwrap();
    assert_eq!(view.timestamp(), &line[..25]);
}

#[test]
fn test_zero_node_count_aborts_without_region() {
    let artifact_dir = TempDir::new().unwrap();
    let shm_dir = TempDir::new().unwrap();
    let mut fixture = Fixture::default();
    fixture.graph_nodes.clear();
    let paths = fixture.write(artifact_dir.path());

    let mut publisher = Publisher::new(shm_dir.path()).unwrap();
    let err = publisher.publish(&paths).unwrap_err();
    assert!(matches!(err, StoreError::EmptyFile { artifact: "graph", .. }));
    assert!(format!("{}", err).contains("no nodes"));

    // nothing published, nothing dangling
    assert_eq!(publisher.current_generation(), 0);
    assert!(leftover_regions(shm_dir.path()).is_empty());
    assert!(matches!(
        PublishedView::attach(shm_dir.path()).unwrap_err(),
        StoreError::NotPublished
    ));
}

#[test]
fn test_truncated_edges_abort_reclaims_pending_slot() {
    let artifact_dir = TempDir::new().unwrap();
    let shm_dir = TempDir::new().unwrap();
    let fixture = Fixture::default();
    let paths = fixture.write(artifact_dir.path());
    // rewrite the edges file so header scan passes but the payload is short
    common::write_truncated_edges(&paths.edges, 50, &fixture.edge_records);

    let mut publisher = Publisher::new(shm_dir.path()).unwrap();
    let err = publisher.publish(&paths).unwrap_err();
    assert!(matches!(err, StoreError::TruncatedPayload { .. }));

    // the aborted generation's names were unlinked
    assert_eq!(publisher.current_generation(), 0);
    assert!(leftover_regions(shm_dir.path()).is_empty());
}

#[test]
fn test_identity_mismatch_does_not_block_publication() {
    let artifact_dir = TempDir::new().unwrap();
    let shm_dir = TempDir::new().unwrap();
    let mut fixture = Fixture::default();
    fixture.identity = [0xEE; IDENTITY_LEN];
    let paths = fixture.write(artifact_dir.path());

    let mut publisher = Publisher::new(shm_dir.path()).unwrap();
    let generation = publisher.publish(&paths).unwrap();
    assert_eq!(generation, 1);
    assert!(PublishedView::attach(shm_dir.path()).is_ok());
}

#[test]
fn test_republish_supersedes_previous_generation() {
    let artifact_dir = TempDir::new().unwrap();
    let shm_dir = TempDir::new().unwrap();
    let fixture = Fixture::default();
    let paths = fixture.write(artifact_dir.path());

    let mut publisher = Publisher::new(shm_dir.path()).unwrap();
    assert_eq!(publisher.publish(&paths).unwrap(), 1);

    // a consumer attached to generation 1 keeps its mapping
    let old_view = PublishedView::attach(shm_dir.path()).unwrap();

    assert_eq!(publisher.publish(&paths).unwrap(), 2);
    assert_eq!(publisher.current_generation(), 2);

    // new attachments resolve generation 2; the old names are gone
    let view = PublishedView::attach(shm_dir.path()).unwrap();
    assert_eq!(view.generation(), 2);
    let leftovers = leftover_regions(shm_dir.path());
    assert!(leftovers.iter().all(|n| n.ends_with("_g2")), "{:?}", leftovers);

    // superseded data stays readable through the old attachment
    assert_eq!(old_view.section(SectionId::NameChars), fixture.name_chars);
}

#[test]
fn test_fresh_publisher_supersedes_foreign_generation() {
    let artifact_dir = TempDir::new().unwrap();
    let shm_dir = TempDir::new().unwrap();
    let fixture = Fixture::default();
    let paths = fixture.write(artifact_dir.path());

    {
        let mut first = Publisher::new(shm_dir.path()).unwrap();
        first.publish(&paths).unwrap();
    }

    // a new loader process picks up where the last one left off
    let mut second = Publisher::new(shm_dir.path()).unwrap();
    assert_eq!(second.publish(&paths).unwrap(), 2);
    let leftovers = leftover_regions(shm_dir.path());
    assert!(leftovers.iter().all(|n| n.ends_with("_g2")), "{:?}", leftovers);
}
