//! Shared fixtures: tiny artifact files in the on-disk binary formats.
#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use roadstore::artifacts::graph::IDENTITY_LEN;
use roadstore::{ArtifactPaths, IdentityMarker};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub type GraphNodeRec = (u32, u32);
pub type GraphEdgeRec = (u32, i32, u32, u32);
pub type NodeRec = (i32, i32, u32);
pub type EdgeRec = (u32, u32, u8);

pub fn write_graph(
    path: &Path,
    identity: [u8; IDENTITY_LEN],
    checksum: u32,
    nodes: &[GraphNodeRec],
    edges: &[GraphEdgeRec],
) {
    let mut f = File::create(path).unwrap();
    f.write_all(&identity).unwrap();
    f.write_u32::<LittleEndian>(checksum).unwrap();
    f.write_u32::<LittleEndian>(nodes.len() as u32).unwrap();
    for &(first_edge, edge_count) in nodes {
        f.write_u32::<LittleEndian>(first_edge).unwrap();
        f.write_u32::<LittleEndian>(edge_count).unwrap();
    }
    f.write_u32::<LittleEndian>(edges.len() as u32).unwrap();
    for &(target, weight, flags, via) in edges {
        f.write_u32::<LittleEndian>(target).unwrap();
        f.write_i32::<LittleEndian>(weight).unwrap();
        f.write_u32::<LittleEndian>(flags).unwrap();
        f.write_u32::<LittleEndian>(via).unwrap();
    }
}

pub fn write_tree(path: &Path, nodes: &[[u8; 64]]) {
    let mut f = File::create(path).unwrap();
    f.write_u32::<LittleEndian>(nodes.len() as u32).unwrap();
    for node in nodes {
        f.write_all(node).unwrap();
    }
}

pub fn write_nodes(path: &Path, records: &[NodeRec]) {
    let mut f = File::create(path).unwrap();
    f.write_u32::<LittleEndian>(records.len() as u32).unwrap();
    for &(lat, lon, id) in records {
        f.write_i32::<LittleEndian>(lat).unwrap();
        f.write_i32::<LittleEndian>(lon).unwrap();
        f.write_u32::<LittleEndian>(id).unwrap();
    }
}

pub fn write_edges(path: &Path, records: &[EdgeRec]) {
    let mut f = File::create(path).unwrap();
    f.write_u32::<LittleEndian>(records.len() as u32).unwrap();
    for &(via_node, name_id, turn) in records {
        f.write_u32::<LittleEndian>(via_node).unwrap();
        f.write_u32::<LittleEndian>(name_id).unwrap();
        f.write_u8(turn).unwrap();
    }
}

/// Like `write_edges` but with a declared count larger than the records
/// actually present.
pub fn write_truncated_edges(path: &Path, declared: u32, records: &[EdgeRec]) {
    let mut f = File::create(path).unwrap();
    f.write_u32::<LittleEndian>(declared).unwrap();
    for &(via_node, name_id, turn) in records {
        f.write_u32::<LittleEndian>(via_node).unwrap();
        f.write_u32::<LittleEndian>(name_id).unwrap();
        f.write_u8(turn).unwrap();
    }
}

pub fn write_names(path: &Path, index: &[u32], chars: &[u8]) {
    let mut f = File::create(path).unwrap();
    f.write_u32::<LittleEndian>(index.len() as u32).unwrap();
    f.write_u32::<LittleEndian>(chars.len() as u32).unwrap();
    for &entry in index {
        f.write_u32::<LittleEndian>(entry).unwrap();
    }
    f.write_all(chars).unwrap();
}

pub fn write_timestamp(path: &Path, text: &str) {
    write!(File::create(path).unwrap(), "{}", text).unwrap();
}

/// A small, mutually consistent artifact set.
pub struct Fixture {
    pub graph_nodes: Vec<GraphNodeRec>,
    pub graph_edges: Vec<GraphEdgeRec>,
    pub tree_nodes: Vec<[u8; 64]>,
    pub node_records: Vec<NodeRec>,
    pub edge_records: Vec<EdgeRec>,
    pub name_index: Vec<u32>,
    pub name_chars: Vec<u8>,
    pub checksum: u32,
    pub identity: [u8; IDENTITY_LEN],
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            graph_nodes: vec![(0, 2), (2, 1), (3, 0)],
            graph_edges: vec![(1, 120, 0b01, 0), (2, 250, 0b10, 0), (0, 75, 0b11, 1)],
            tree_nodes: vec![[0x11; 64], [0x22; 64]],
            node_records: vec![
                (52_520_008, 13_404_954, 0),
                (48_856_613, 2_352_222, 1),
                (51_507_222, -127_500, 2),
            ],
            edge_records: vec![(0, 0, 1), (1, 1, 3), (2, 0, 7)],
            name_index: vec![0, 10, 24],
            name_chars: b"UnterDenLindenChampsElysees".to_vec(),
            checksum: 0xC0FFEE,
            identity: IdentityMarker::current().0,
        }
    }
}

impl Fixture {
    /// Write all artifact files under `dir/map.*` and return their paths.
    pub fn write(&self, dir: &Path) -> ArtifactPaths {
        let paths = ArtifactPaths::from_base(dir.join("map"));
        write_graph(
            &paths.graph,
            self.identity,
            self.checksum,
            &self.graph_nodes,
            &self.graph_edges,
        );
        write_tree(&paths.tree, &self.tree_nodes);
        write_nodes(&paths.nodes, &self.node_records);
        write_edges(&paths.edges, &self.edge_records);
        write_names(&paths.names, &self.name_index, &self.name_chars);
        paths
    }

    /// The graph node array exactly as stored on disk
    pub fn graph_node_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for &(first_edge, edge_count) in &self.graph_nodes {
            out.write_u32::<LittleEndian>(first_edge).unwrap();
            out.write_u32::<LittleEndian>(edge_count).unwrap();
        }
        out
    }

    /// The graph edge array exactly as stored on disk
    pub fn graph_edge_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for &(target, weight, flags, via) in &self.graph_edges {
            out.write_u32::<LittleEndian>(target).unwrap();
            out.write_i32::<LittleEndian>(weight).unwrap();
            out.write_u32::<LittleEndian>(flags).unwrap();
            out.write_u32::<LittleEndian>(via).unwrap();
        }
        out
    }

    /// The decoded coordinate array expected in the region
    pub fn coordinate_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for &(lat, lon, _id) in &self.node_records {
            out.write_i32::<LittleEndian>(lat).unwrap();
            out.write_i32::<LittleEndian>(lon).unwrap();
        }
        out
    }
}
