//! `Graph` — ownership of nodes and streets plus shortest-path queries.
//!
//! # Canonical street IDs
//!
//! [`build_adj`](Graph::build_adj) fixes the node count `n` and re-keys
//! every street to `StreetId::encode(src, dst, n) = src·n + dst`.  From
//! then on a node's outgoing streets occupy the contiguous key range
//! `[u·n, (u+1)·n)`, so [`outgoing`](Graph::outgoing) is a `BTreeMap`
//! range scan in ascending destination order — the deterministic order the
//! dynamics engine samples from.  `n` is baked into the ID space and must
//! not change afterwards; node IDs must be dense in `0..n`.
//!
//! # Shortest paths
//!
//! Edge weights are congestion-aware travel times (see
//! [`travel_time`](Graph::travel_time)).  [`distances_to`](Graph::distances_to)
//! runs one Dijkstra over the *reversed* graph and yields the minimum cost
//! from every node to a destination — exactly the quantities the itinerary
//! reachability matrices are built from, at the price of a single run.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::BTreeMap;

use traffic_core::{NodeId, SparseMatrix, StreetId};

use crate::error::{NetError, NetResult};
use crate::node::Node;
use crate::street::Street;

/// Floor applied to the congestion factor `1 − α·ρ` so saturated streets
/// get an astronomically large but finite travel time.
const CONGESTION_FLOOR: f64 = 1e-9;

/// Dijkstra cost wrapper — totally ordered `f64` for the binary heap.
#[derive(PartialEq, Clone, Copy, Debug)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Whether two path costs are equal within the relative tolerance used for
/// shortest-path edge tests.  Reachability matrices must apply the same
/// rule, so this is public.
pub fn costs_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// A directed road network with at most one street per ordered node pair.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    streets: BTreeMap<StreetId, Street>,
    adjacency: SparseMatrix<bool>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a square boolean adjacency: every true cell
    /// `(i, j)` becomes a default street `i → j` (unit length, capacity 1)
    /// between default nodes.
    pub fn from_adjacency(adjacency: SparseMatrix<bool>) -> NetResult<Self> {
        if !adjacency.is_square() {
            return Err(NetError::Parse(format!(
                "adjacency must be square, got {}x{}",
                adjacency.rows(),
                adjacency.cols()
            )));
        }
        let n = adjacency.rows();
        let mut graph = Graph { adjacency, ..Graph::default() };
        let cells: Vec<u32> = graph.adjacency.iter().map(|(k, _)| k).collect();
        for key in cells {
            let id = StreetId(key);
            let (src, dst) = id.decode(n);
            graph.nodes.entry(src).or_insert_with(|| Node::new(src));
            graph.nodes.entry(dst).or_insert_with(|| Node::new(dst));
            graph.streets.insert(id, Street::new(id, src, dst));
        }
        Ok(graph)
    }

    // ── Dimensions & accessors ────────────────────────────────────────────

    /// Node count fixed by `build_adj` (0 before the adjacency exists).
    pub fn n(&self) -> u32 {
        self.adjacency.rows()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn street_count(&self) -> usize {
        self.streets.len()
    }

    pub fn adjacency(&self) -> &SparseMatrix<bool> {
        &self.adjacency
    }

    pub(crate) fn adjacency_mut(&mut self) -> &mut SparseMatrix<bool> {
        &mut self.adjacency
    }

    pub fn node(&self, id: NodeId) -> NetResult<&Node> {
        self.nodes.get(&id).ok_or(NetError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> NetResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(NetError::NodeNotFound(id))
    }

    pub fn street(&self, id: StreetId) -> NetResult<&Street> {
        self.streets.get(&id).ok_or(NetError::StreetNotFound(id))
    }

    pub fn street_mut(&mut self, id: StreetId) -> NetResult<&mut Street> {
        self.streets.get_mut(&id).ok_or(NetError::StreetNotFound(id))
    }

    /// All nodes in ascending ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All nodes in ascending ID order, mutably.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// All streets in ascending ID order.
    pub fn streets(&self) -> impl Iterator<Item = &Street> {
        self.streets.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn street_ids(&self) -> impl Iterator<Item = StreetId> + '_ {
        self.streets.keys().copied()
    }

    /// The street from `src` to `dst`, if one exists.
    pub fn street_between(&self, src: NodeId, dst: NodeId) -> Option<&Street> {
        let n = self.n();
        if n > 0 && src.0 < n && dst.0 < n {
            return self.streets.get(&StreetId::encode(src, dst, n));
        }
        self.streets.values().find(|s| s.node_pair() == (src, dst))
    }

    /// Outgoing streets of `node` in ascending destination order.
    ///
    /// Requires canonical IDs, i.e. a prior `build_adj`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Street> {
        let n = self.n() as u64;
        let start = node.0 as u64 * n;
        let end = start + n;
        self.streets
            .range(StreetId(start.min(u32::MAX as u64) as u32)..)
            .take_while(move |(&id, _)| (id.0 as u64) < end)
            .map(|(_, street)| street)
    }

    // ── Construction ──────────────────────────────────────────────────────

    /// Insert a node.  Fails on an ID collision.
    pub fn add_node(&mut self, node: Node) -> NetResult<()> {
        if self.nodes.contains_key(&node.id()) {
            return Err(NetError::DuplicateNode(node.id()));
        }
        self.nodes.insert(node.id(), node);
        Ok(())
    }

    /// Insert a street.  Fails on an ID collision or missing endpoints —
    /// endpoint nodes are never auto-created.
    pub fn add_street(&mut self, street: Street) -> NetResult<()> {
        if self.streets.contains_key(&street.id()) {
            return Err(NetError::DuplicateStreet(street.id()));
        }
        let (src, dst) = street.node_pair();
        if !self.nodes.contains_key(&src) {
            return Err(NetError::NodeNotFound(src));
        }
        if !self.nodes.contains_key(&dst) {
            return Err(NetError::NodeNotFound(dst));
        }
        self.streets.insert(street.id(), street);
        Ok(())
    }

    /// Rebuild the adjacency from the current street set.
    ///
    /// Fixes `n` to the node count, re-keys every street to its canonical
    /// ID, remaps intersection street priorities to the new IDs, and sets
    /// street angles wherever both endpoints carry coordinates.
    pub fn build_adj(&mut self) -> NetResult<()> {
        let n = self.nodes.len() as u32;
        for &id in self.nodes.keys() {
            if id.0 >= n {
                return Err(NetError::SparseNodeIds { id, count: n as usize });
            }
        }

        let old_streets = std::mem::take(&mut self.streets);
        let mut id_map: BTreeMap<StreetId, StreetId> = BTreeMap::new();
        for (old_id, mut street) in old_streets {
            let (src, dst) = street.node_pair();
            let new_id = StreetId::encode(src, dst, n);
            if self.streets.contains_key(&new_id) {
                return Err(NetError::DuplicateStreet(new_id));
            }
            street.set_id(new_id);
            id_map.insert(old_id, new_id);
            self.streets.insert(new_id, street);
        }

        // Priority sets refer to streets by ID and must follow the re-keying.
        for node in self.nodes.values_mut() {
            if node.is_intersection() {
                let remapped = node
                    .street_priorities()?
                    .iter()
                    .filter_map(|old| id_map.get(old).copied())
                    .collect();
                node.set_street_priorities(remapped)?;
            }
        }

        self.adjacency = SparseMatrix::new(n, n);
        for street in self.streets.values() {
            let (src, dst) = street.node_pair();
            self.adjacency.insert(src.0, dst.0, true)?;
        }

        self.build_street_angles()
    }

    /// Set each street's heading from its endpoint coordinates, where both
    /// endpoints have them.
    pub fn build_street_angles(&mut self) -> NetResult<()> {
        for street in self.streets.values_mut() {
            let (src, dst) = street.node_pair();
            let src_coords = self.nodes.get(&src).ok_or(NetError::NodeNotFound(src))?.coords();
            let dst_coords = self.nodes.get(&dst).ok_or(NetError::NodeNotFound(dst))?.coords();
            if let (Some(a), Some(b)) = (src_coords, dst_coords) {
                street.set_angle_from_coords(a, b);
            }
        }
        Ok(())
    }

    // ── Kind conversions ──────────────────────────────────────────────────

    /// Convert an existing node into a traffic light.
    pub fn make_traffic_light(&mut self, id: NodeId) -> NetResult<()> {
        self.node_mut(id)?.into_traffic_light();
        Ok(())
    }

    /// Convert an existing node into a roundabout.
    pub fn make_roundabout(&mut self, id: NodeId) -> NetResult<()> {
        self.node_mut(id)?.into_roundabout();
        Ok(())
    }

    /// Attach spire counters to an existing street.
    pub fn make_spire_street(&mut self, id: StreetId) -> NetResult<()> {
        self.street_mut(id)?.make_spire();
        Ok(())
    }

    // ── Shortest paths ────────────────────────────────────────────────────

    /// Congestion-aware travel time of a street: free-flow time scaled up
    /// as density rises.  `alpha` weights the density term; at
    /// `α·ρ ≥ 1` the factor bottoms out at a floor, making a saturated
    /// street effectively (but finitely) impassable.
    pub fn travel_time(street: &Street, alpha: f64) -> f64 {
        let factor = (1.0 - alpha * street.density()).max(CONGESTION_FLOOR);
        street.length() / (street.max_speed() * factor)
    }

    /// Minimum cost from every node to `dst` under `weight`, via one
    /// Dijkstra over the reversed graph.  Unreachable nodes get
    /// `f64::INFINITY`.  Requires canonical IDs (`build_adj`).
    pub fn distances_to<W>(&self, dst: NodeId, weight: W) -> NetResult<Vec<f64>>
    where
        W: Fn(&Street) -> f64,
    {
        let n = self.n() as usize;
        if dst.0 as usize >= n {
            return Err(NetError::NodeNotFound(dst));
        }

        // Reverse adjacency: incoming[v] lists (u, w(u→v)).
        let mut incoming: Vec<Vec<(u32, f64)>> = vec![Vec::new(); n];
        for street in self.streets.values() {
            let (src, to) = street.node_pair();
            incoming[to.index()].push((src.0, weight(street)));
        }

        let mut dist = vec![f64::INFINITY; n];
        dist[dst.index()] = 0.0;

        // Min-heap of (cost, node); the secondary key makes tie-breaking
        // deterministic.
        let mut heap: BinaryHeap<Reverse<(Cost, u32)>> = BinaryHeap::new();
        heap.push(Reverse((Cost(0.0), dst.0)));

        while let Some(Reverse((Cost(cost), node))) = heap.pop() {
            if cost > dist[node as usize] {
                continue; // stale entry
            }
            for &(from, w) in &incoming[node as usize] {
                let new_cost = cost + w;
                if new_cost < dist[from as usize] {
                    dist[from as usize] = new_cost;
                    heap.push(Reverse((Cost(new_cost), from)));
                }
            }
        }
        Ok(dist)
    }

    /// The minimum-cost node path from `src` to `dst` under `weight`.
    ///
    /// Cost ties are broken toward the lower successor ID at every step.
    pub fn shortest_path<W>(&self, src: NodeId, dst: NodeId, weight: W) -> NetResult<Vec<NodeId>>
    where
        W: Fn(&Street) -> f64,
    {
        let n = self.n() as usize;
        if src.0 as usize >= n {
            return Err(NetError::NodeNotFound(src));
        }
        let dist = self.distances_to(dst, &weight)?;
        if dist[src.index()].is_infinite() {
            return Err(NetError::Unreachable { from: src, to: dst });
        }

        // Walk downhill: the outgoing scan is in ascending destination
        // order, so the first conforming edge is the lowest-ID successor.
        let mut path = vec![src];
        let mut current = src;
        while current != dst {
            let next = self
                .outgoing(current)
                .find(|s| {
                    let v = s.destination();
                    dist[v.index()].is_finite()
                        && costs_match(weight(s) + dist[v.index()], dist[current.index()])
                })
                .map(|s| s.destination());
            match next {
                Some(v) => {
                    path.push(v);
                    current = v;
                }
                // Numerically impossible on a finite-distance walk, but do
                // not loop forever if the tolerance ever misses.
                None => return Err(NetError::Unreachable { from: src, to: dst }),
            }
        }
        Ok(path)
    }
}
