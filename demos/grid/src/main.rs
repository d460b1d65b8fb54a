//! grid — reference benchmark scenario for `rust_traffic`.
//!
//! A 4×4 grid with streets in both directions, 16 itineraries with
//! destinations cycling over four sinks, stochastic route deviations and a
//! density-dependent speed floor.  Runs 100 ticks and writes the
//! measurement CSVs to `./output`.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use traffic_core::{ItineraryId, NodeId, StreetId};
use traffic_dynamics::{Dynamics, DynamicsOptions, Itinerary};
use traffic_net::{Graph, Node, Street};
use traffic_output::{CsvWriter, MeasurementObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const SIDE: u32 = 4;
const SEED: u64 = 69;
const ERROR_PROBABILITY: f64 = 0.3;
const MIN_SPEED_RATIO: f64 = 0.95;
const TICKS: u64 = 100;
const STREET_CAPACITY: usize = 4;
const DEMAND_ROUNDS: u32 = 4;

/// Destinations of the 16 itineraries, cycling.
const DESTINATIONS: [u32; 4] = [10, 7, 4, 1];

// ── Network ───────────────────────────────────────────────────────────────────

fn build_grid() -> Result<Graph> {
    let mut g = Graph::new();
    for i in 0..SIDE * SIDE {
        g.add_node(Node::new(NodeId(i)))?;
    }
    let mut next = 0u32;
    let mut link = |g: &mut Graph, a: u32, b: u32| -> Result<()> {
        for (src, dst) in [(a, b), (b, a)] {
            let mut street = Street::new(StreetId(next), NodeId(src), NodeId(dst));
            street.set_capacity(STREET_CAPACITY)?;
            g.add_street(street)?;
            next += 1;
        }
        Ok(())
    };
    for r in 0..SIDE {
        for c in 0..SIDE {
            let id = r * SIDE + c;
            if c < SIDE - 1 {
                link(&mut g, id, id + 1)?;
            }
            if r < SIDE - 1 {
                link(&mut g, id, id + SIDE)?;
            }
        }
    }
    g.build_adj()?;
    Ok(g)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let graph = build_grid()?;
    println!(
        "network: {} nodes, {} streets",
        graph.node_count(),
        graph.street_count()
    );

    let options = DynamicsOptions {
        seed: SEED,
        error_probability: ERROR_PROBABILITY,
        min_speed_ratio: MIN_SPEED_RATIO,
        ..Default::default()
    };
    let mut sim = Dynamics::new(graph, options)?;

    for i in 0..SIDE * SIDE {
        let destination = DESTINATIONS[(i % 4) as usize];
        sim.add_itinerary(Itinerary::new(ItineraryId(i), NodeId(destination)))?;
    }

    let started = Instant::now();
    sim.update_paths()?;
    println!("update_paths: {:.2?}", started.elapsed());

    // Demand: every node feeds its own itinerary, several rounds deep.
    // Oversubscribed demands wait in the queue until capacity frees up.
    for _ in 0..DEMAND_ROUNDS {
        for i in 0..SIDE * SIDE {
            sim.queue_agent(NodeId(i), ItineraryId(i))?;
        }
    }

    let out_dir = Path::new("./output");
    fs::create_dir_all(out_dir)?;
    let mut observer = MeasurementObserver::new(CsvWriter::new(out_dir)?);

    let started = Instant::now();
    sim.run(TICKS, &mut observer)?;
    observer.finish()?;

    println!(
        "{TICKS} ticks in {:.2?}: {} created, {} arrived, {} still driving",
        started.elapsed(),
        sim.created(),
        sim.arrived(),
        sim.agent_count(),
    );
    if let Some(m) = sim.last_measurement() {
        println!("final mean speed: {}", m.speed);
    }
    println!("measurements written to {}", out_dir.display());
    Ok(())
}
