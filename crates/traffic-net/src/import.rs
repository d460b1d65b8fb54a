//! Network file ingestion and export.
//!
//! Formats:
//!
//! - **Matrix file** — an opening integer `N`, then either `N²`
//!   whitespace-separated 0/1 cells row-major (dense) or one `i j` pair per
//!   non-zero cell (sparse).  Streets are created with unit length and
//!   capacity 1; [`export_matrix`](Graph::export_matrix) writes the sparse
//!   form back out, so export ∘ import is the identity on the adjacency.
//! - **Coordinates file** — `nodeId lat lon` per line; IDs not present in
//!   the graph are skipped.
//! - **OSM CSVs** — comma-separated with a header row: nodes as
//!   `id,lat,lon,…` (assigned sequential internal IDs, raw-ID mapping
//!   returned) and edges as `src,dst,length[,maxspeed],…` resolved through
//!   that mapping.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use traffic_core::{NodeId, SparseMatrix, StreetId};

use crate::error::{NetError, NetResult};
use crate::graph::Graph;
use crate::node::Node;
use crate::street::{Street, DEFAULT_MAX_SPEED};

fn parse<T: FromStr>(token: &str, what: &str) -> NetResult<T> {
    token
        .parse()
        .map_err(|_| NetError::Parse(format!("invalid {what}: {token:?}")))
}

impl Graph {
    /// Ensure both endpoint nodes exist, then add the street for cell
    /// `(i, j)` of an `n × n` adjacency.
    fn add_matrix_cell(&mut self, i: u32, j: u32, n: u32) -> NetResult<()> {
        let (src, dst) = (NodeId(i), NodeId(j));
        if self.node(src).is_err() {
            self.add_node(Node::new(src))?;
        }
        if self.node(dst).is_err() {
            self.add_node(Node::new(dst))?;
        }
        let id = StreetId::encode(src, dst, n);
        self.add_street(Street::new(id, src, dst))?;
        self.adjacency_mut().insert(i, j, true)?;
        Ok(())
    }

    /// Import an adjacency matrix file, creating default nodes and streets
    /// for every non-zero cell.
    ///
    /// `dense` selects the encoding: `N²` row-major 0/1 cells, or `i j`
    /// pairs (one non-zero cell per line).
    pub fn import_matrix(&mut self, path: &Path, dense: bool) -> NetResult<()> {
        let text = fs::read_to_string(path)?;
        let mut tokens = text.split_whitespace();
        let n: u32 = parse(
            tokens.next().ok_or_else(|| NetError::Parse("empty matrix file".into()))?,
            "matrix dimension",
        )?;
        *self.adjacency_mut() = SparseMatrix::new(n, n);

        if dense {
            for i in 0..n {
                for j in 0..n {
                    let token = tokens.next().ok_or_else(|| {
                        NetError::Parse(format!("dense matrix ended early at cell ({i}, {j})"))
                    })?;
                    let value: f64 = parse(token, "matrix cell")?;
                    if value < 0.0 {
                        return Err(NetError::Parse(format!(
                            "adjacency cells must be non-negative (cell ({i}, {j}) = {value})"
                        )));
                    }
                    if value > 0.0 {
                        self.add_matrix_cell(i, j, n)?;
                    }
                }
            }
        } else {
            loop {
                let Some(first) = tokens.next() else { break };
                let second = tokens.next().ok_or_else(|| {
                    NetError::Parse(format!("dangling row index {first:?} at end of file"))
                })?;
                let i: u32 = parse(first, "row index")?;
                let j: u32 = parse(second, "column index")?;
                if i >= n || j >= n {
                    return Err(NetError::Parse(format!(
                        "cell ({i}, {j}) outside the {n}x{n} adjacency"
                    )));
                }
                self.add_matrix_cell(i, j, n)?;
            }
        }
        Ok(())
    }

    /// Write the adjacency in the sparse matrix format: the dimension, then
    /// one `i j` line per non-zero cell in row-major order.
    pub fn export_matrix(&self, path: &Path) -> NetResult<()> {
        let mut file = fs::File::create(path)?;
        let n = self.n();
        writeln!(file, "{n}")?;
        for (key, _) in self.adjacency().iter() {
            writeln!(file, "{} {}", key / n, key % n)?;
        }
        Ok(())
    }

    /// Import node coordinates from `nodeId lat lon` lines.  IDs without a
    /// matching node are skipped.
    pub fn import_coordinates(&mut self, path: &Path) -> NetResult<()> {
        let text = fs::read_to_string(path)?;
        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else { continue };
            let id = NodeId(parse(first, "node id")?);
            let lat: f64 = parse(
                tokens.next().ok_or_else(|| NetError::Parse(format!("missing lat: {line:?}")))?,
                "latitude",
            )?;
            let lon: f64 = parse(
                tokens.next().ok_or_else(|| NetError::Parse(format!("missing lon: {line:?}")))?,
                "longitude",
            )?;
            if let Ok(node) = self.node_mut(id) {
                node.set_coords((lat, lon));
            }
        }
        Ok(())
    }

    /// Import OSM nodes from a comma CSV (`id,lat,lon,…` after a header
    /// row).  Nodes receive sequential internal IDs in row order; the
    /// returned map translates raw OSM IDs for
    /// [`import_osm_edges`](Graph::import_osm_edges).
    pub fn import_osm_nodes(&mut self, path: &Path) -> NetResult<HashMap<u64, NodeId>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let mut mapping = HashMap::new();
        let mut next_id = self.node_count() as u32;
        for record in reader.records() {
            let record = record?;
            let raw: u64 = parse(record.get(0).unwrap_or(""), "OSM node id")?;
            let lat: f64 = parse(record.get(1).unwrap_or(""), "latitude")?;
            let lon: f64 = parse(record.get(2).unwrap_or(""), "longitude")?;
            let id = NodeId(next_id);
            self.add_node(Node::with_coords(id, (lat, lon)))?;
            mapping.insert(raw, id);
            next_id += 1;
        }
        Ok(mapping)
    }

    /// Import OSM edges from a comma CSV (`src,dst,length[,maxspeed],…`
    /// after a header row), resolving endpoints through the node mapping.
    /// A missing or unparsable maxspeed falls back to the 13.9 m/s default.
    ///
    /// Streets get provisional sequential IDs; call
    /// [`build_adj`](Graph::build_adj) afterwards to assign canonical ones.
    pub fn import_osm_edges(
        &mut self,
        path: &Path,
        mapping: &HashMap<u64, NodeId>,
    ) -> NetResult<()> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        for record in reader.records() {
            let record = record?;
            let raw_src: u64 = parse(record.get(0).unwrap_or(""), "edge source")?;
            let raw_dst: u64 = parse(record.get(1).unwrap_or(""), "edge destination")?;
            let length: f64 = parse(record.get(2).unwrap_or(""), "edge length")?;
            let max_speed = record
                .get(3)
                .and_then(|t| t.parse::<f64>().ok())
                .filter(|v| *v > 0.0)
                .unwrap_or(DEFAULT_MAX_SPEED);

            let src = *mapping.get(&raw_src).ok_or_else(|| {
                NetError::Parse(format!("edge references unknown OSM node {raw_src}"))
            })?;
            let dst = *mapping.get(&raw_dst).ok_or_else(|| {
                NetError::Parse(format!("edge references unknown OSM node {raw_dst}"))
            })?;

            let mut street = Street::new(StreetId(self.street_count() as u32), src, dst);
            street.set_length(length)?;
            street.set_max_speed(max_speed)?;
            self.add_street(street)?;
        }
        Ok(())
    }
}
