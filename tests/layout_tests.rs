//! Tests for the layout planner's packing guarantees.

use roadstore::{LayoutDescriptor, SectionCounts, SectionId, StoreError};

fn sample_counts() -> SectionCounts {
    let mut counts = SectionCounts::new();
    counts.set(SectionId::NameIndex, 3);
    counts.set(SectionId::NameChars, 27);
    counts.set(SectionId::ViaNodes, 5);
    counts.set(SectionId::NameIds, 5);
    counts.set(SectionId::TurnInstructions, 5);
    counts.set(SectionId::GraphNodes, 11);
    counts.set(SectionId::GraphEdges, 17);
    counts.set(SectionId::TreeNodes, 2);
    counts.set(SectionId::Coordinates, 11);
    counts.set(SectionId::Timestamp, 10);
    counts
}

#[test]
fn test_plan_is_deterministic() {
    let counts = sample_counts();
    let a = LayoutDescriptor::plan(&counts, 99).unwrap();
    let b = LayoutDescriptor::plan(&counts, 99).unwrap();

    for id in SectionId::ALL {
        assert_eq!(a.offset(id), b.offset(id));
        assert_eq!(a.byte_len(id), b.byte_len(id));
    }
    assert_eq!(a.total_size(), b.total_size());
}

#[test]
fn test_consumer_rederives_identical_offsets() {
    let planned = LayoutDescriptor::plan(&sample_counts(), 7).unwrap();
    let rederived = LayoutDescriptor::from_header(*planned.header()).unwrap();

    for id in SectionId::ALL {
        assert_eq!(planned.range(id), rederived.range(id));
    }
    assert_eq!(planned.total_size(), rederived.total_size());
    assert_eq!(rederived.checksum(), 7);
}

#[test]
fn test_packing_validity() {
    let layout = LayoutDescriptor::plan(&sample_counts(), 0).unwrap();

    let mut previous_end = 0usize;
    for id in SectionId::ALL {
        let range = layout.range(id);
        // within the region
        assert!(range.end <= layout.total_size());
        // aligned
        assert_eq!(range.start % id.alignment(), 0, "{} misaligned", id.label());
        // monotonically increasing, no overlap with the previous section
        assert!(range.start >= previous_end, "{} overlaps", id.label());
        previous_end = range.end;
    }
}

#[test]
fn test_zero_count_section_is_transparent() {
    let with_tree = sample_counts();
    let mut without_tree = sample_counts();
    without_tree.set(SectionId::TreeNodes, 0);

    let a = LayoutDescriptor::plan(&with_tree, 0).unwrap();
    let b = LayoutDescriptor::plan(&without_tree, 0).unwrap();

    assert_eq!(b.byte_len(SectionId::TreeNodes), 0);
    // the empty section collapses onto the next section's offset
    assert_eq!(b.offset(SectionId::TreeNodes), b.offset(SectionId::Coordinates));
    // sections before it are unaffected
    assert_eq!(a.offset(SectionId::GraphEdges), b.offset(SectionId::GraphEdges));
}

#[test]
fn test_name_section_sizing() {
    let mut counts = SectionCounts::new();
    counts.set(SectionId::NameIndex, 5_000);
    counts.set(SectionId::NameChars, 120_000);
    let layout = LayoutDescriptor::plan(&counts, 0).unwrap();

    assert_eq!(layout.byte_len(SectionId::NameIndex), 5_000 * 4);
    assert_eq!(layout.byte_len(SectionId::NameChars), 120_000);
}

#[test]
fn test_overflowing_counts_rejected() {
    let mut counts = SectionCounts::new();
    counts.set(SectionId::TreeNodes, u64::MAX / 32);
    let err = LayoutDescriptor::plan(&counts, 0).unwrap_err();
    assert!(matches!(err, StoreError::LayoutOverflow { .. }));

    let mut counts = SectionCounts::new();
    counts.set(SectionId::NameChars, u64::MAX - 2);
    counts.set(SectionId::ViaNodes, u64::MAX / 4);
    assert!(LayoutDescriptor::plan(&counts, 0).is_err());
}

#[test]
fn test_total_size_is_granularity_aligned() {
    let mut counts = SectionCounts::new();
    counts.set(SectionId::Timestamp, 3);
    let layout = LayoutDescriptor::plan(&counts, 0).unwrap();
    assert_eq!(layout.total_size() % 8, 0);
    assert!(layout.total_size() >= 3);
}
