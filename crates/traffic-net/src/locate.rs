//! `NodeLocator` — R-tree nearest-node snapping.
//!
//! Maps an arbitrary `(lat, lon)` to the closest network node, used to
//! anchor coordinate-based demand (e.g. OSM-derived origin points) onto the
//! graph.  Distances are squared-Euclidean in coordinate space, which is
//! accurate enough for city-scale extents.
//!
//! The index is a snapshot: rebuild after adding nodes or changing
//! coordinates.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use traffic_core::NodeId;

use crate::graph::Graph;

/// Entry stored in the R-tree: a 2-D `[lat, lon]` point with its `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Spatial index over every node of a graph that carries coordinates.
pub struct NodeLocator {
    tree: RTree<NodeEntry>,
}

impl NodeLocator {
    /// Bulk-load the index.  Nodes without coordinates are not indexed.
    pub fn build(graph: &Graph) -> Self {
        let entries: Vec<NodeEntry> = graph
            .nodes()
            .filter_map(|node| {
                node.coords().map(|(lat, lon)| NodeEntry {
                    point: [lat, lon],
                    id: node.id(),
                })
            })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    /// The nearest indexed node to `(lat, lon)`, or `None` for an index
    /// with no coordinates at all.
    pub fn locate(&self, lat: f64, lon: f64) -> Option<NodeId> {
        self.tree.nearest_neighbor(&[lat, lon]).map(|e| e.id)
    }

    /// Up to `k` nearest nodes, ascending by distance.
    pub fn k_nearest(&self, lat: f64, lon: f64, k: usize) -> Vec<NodeId> {
        self.tree
            .nearest_neighbor_iter(&[lat, lon])
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}
