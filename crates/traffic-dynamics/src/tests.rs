//! Engine tests: unit coverage plus the end-to-end scenarios (corridor,
//! triangle detour, signalized crossing, congestion clamp, replay).

#[cfg(test)]
mod helpers {
    use traffic_core::{AgentId, ItineraryId, NodeId, StreetId};
    use traffic_net::{Graph, Node, Street};

    use crate::observer::{DynamicsObserver, StreetSample, TickMeasurement};

    /// 4 nodes in a line, unit lengths, 1 m/s — the hand-checkable corridor.
    pub fn corridor() -> Graph {
        let mut g = Graph::new();
        for i in 0..4 {
            g.add_node(Node::new(NodeId(i))).unwrap();
        }
        for i in 0..3 {
            g.add_street(Street::new(StreetId(i), NodeId(i), NodeId(i + 1)))
                .unwrap();
        }
        g.build_adj().unwrap();
        let ids: Vec<StreetId> = g.street_ids().collect();
        for id in ids {
            g.street_mut(id).unwrap().set_max_speed(1.0).unwrap();
        }
        g
    }

    /// 4×4 grid with streets in both directions between neighbors — the
    /// reference benchmark network.
    pub fn grid4() -> Graph {
        let mut g = Graph::new();
        for i in 0..16 {
            g.add_node(Node::new(NodeId(i))).unwrap();
        }
        let mut next = 0u32;
        let mut link = |g: &mut Graph, a: u32, b: u32| {
            g.add_street(Street::new(StreetId(next), NodeId(a), NodeId(b)))
                .unwrap();
            next += 1;
            g.add_street(Street::new(StreetId(next), NodeId(b), NodeId(a)))
                .unwrap();
            next += 1;
        };
        for r in 0..4u32 {
            for c in 0..4u32 {
                let id = r * 4 + c;
                if c < 3 {
                    link(&mut g, id, id + 1);
                }
                if r < 3 {
                    link(&mut g, id, id + 4);
                }
            }
        }
        g.build_adj().unwrap();
        g
    }

    /// Records everything the observer sees.
    #[derive(Default)]
    pub struct Recorder {
        /// `(tick, agent, lifetime_ticks, distance)` per arrival.
        pub arrivals: Vec<(u64, AgentId, u64, f64)>,
        /// `(tick, mean, std)` per tick.
        pub speeds: Vec<(u64, f64, f64)>,
        pub rejections: Vec<(u64, NodeId, ItineraryId)>,
    }

    impl DynamicsObserver for Recorder {
        fn on_tick_end(&mut self, tick: u64, m: &TickMeasurement, _streets: &[StreetSample]) {
            self.speeds.push((tick, m.speed.mean, m.speed.std));
        }

        fn on_arrival(&mut self, tick: u64, agent: &crate::Agent) {
            self.arrivals
                .push((tick, agent.id(), agent.time(), agent.distance()));
        }

        fn on_demand_rejected(&mut self, tick: u64, source: NodeId, itinerary: ItineraryId) {
            self.rejections.push((tick, source, itinerary));
        }
    }
}

// ── Engine basics ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use traffic_core::{ItineraryId, NodeId};
    use traffic_net::Graph;

    use crate::engine::{Dynamics, DynamicsOptions};
    use crate::error::DynamicsError;
    use crate::itinerary::Itinerary;

    use super::helpers::corridor;

    #[test]
    fn options_validated() {
        let bad = DynamicsOptions { error_probability: 1.5, ..Default::default() };
        assert!(matches!(
            Dynamics::new(corridor(), bad),
            Err(DynamicsError::InvalidOption(_))
        ));
        let bad = DynamicsOptions { min_speed_ratio: -0.1, ..Default::default() };
        assert!(Dynamics::new(corridor(), bad).is_err());
        let bad = DynamicsOptions { congestion_factor: 0.0, ..Default::default() };
        assert!(Dynamics::new(corridor(), bad).is_err());
    }

    #[test]
    fn graph_must_be_built() {
        let g = Graph::new();
        assert!(matches!(
            Dynamics::new(g, DynamicsOptions::default()),
            Err(DynamicsError::GraphNotReady)
        ));
    }

    #[test]
    fn itinerary_bookkeeping() {
        let mut sim = Dynamics::new(corridor(), DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        assert!(matches!(
            sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(2))),
            Err(DynamicsError::DuplicateItinerary(_))
        ));
        // destination must exist in the graph
        assert!(sim
            .add_itinerary(Itinerary::new(ItineraryId(1), NodeId(40)))
            .is_err());
        assert_eq!(sim.itinerary(ItineraryId(0)).unwrap().destination(), NodeId(3));
    }

    #[test]
    fn demand_requires_known_itinerary_and_source() {
        let mut sim = Dynamics::new(corridor(), DynamicsOptions::default()).unwrap();
        assert!(matches!(
            sim.queue_agent(NodeId(0), ItineraryId(9)),
            Err(DynamicsError::ItineraryNotFound(_))
        ));
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        assert!(sim.queue_agent(NodeId(99), ItineraryId(0)).is_err());
        sim.queue_agent(NodeId(0), ItineraryId(0)).unwrap();
        assert_eq!(sim.pending_demands(), 1);
    }

    #[test]
    fn spawn_before_update_paths_is_rejected() {
        let mut sim = Dynamics::new(corridor(), DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        assert!(matches!(
            sim.spawn_agent(NodeId(0), ItineraryId(0)),
            Err(DynamicsError::DemandRejected { .. })
        ));
    }
}

// ── Path computation ──────────────────────────────────────────────────────────

#[cfg(test)]
mod paths {
    use traffic_core::{ItineraryId, NodeId, StreetId};
    use traffic_net::{Graph, Node, Street};

    use crate::engine::{Dynamics, DynamicsOptions};
    use crate::itinerary::Itinerary;
    use crate::observer::NoopObserver;

    use super::helpers::{corridor, Recorder};

    /// Triangle with a detour: direct 0→1 is 10 m, the two-hop route via 2
    /// is 3 m + 3 m.
    fn triangle() -> Graph {
        let mut g = Graph::new();
        for i in 0..3 {
            g.add_node(Node::new(NodeId(i))).unwrap();
        }
        let mut direct = Street::new(StreetId(0), NodeId(0), NodeId(1));
        direct.set_length(10.0).unwrap();
        let mut leg_a = Street::new(StreetId(1), NodeId(0), NodeId(2));
        leg_a.set_length(3.0).unwrap();
        let mut leg_b = Street::new(StreetId(2), NodeId(2), NodeId(1));
        leg_b.set_length(3.0).unwrap();
        g.add_street(direct).unwrap();
        g.add_street(leg_a).unwrap();
        g.add_street(leg_b).unwrap();
        g.build_adj().unwrap();
        g
    }

    #[test]
    fn detour_beats_direct_street() {
        let mut sim = Dynamics::new(triangle(), DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(1))).unwrap();
        sim.update_paths().unwrap();
        let path = sim.itinerary(ItineraryId(0)).unwrap().path();
        assert!(path.get(0, 2).unwrap());
        assert!(path.get(2, 1).unwrap());
        assert!(!path.get(0, 1).unwrap());
    }

    #[test]
    fn equal_cost_hops_all_marked() {
        // diamond: 0→1→3 and 0→2→3, identical costs
        let mut g = Graph::new();
        for i in 0..4 {
            g.add_node(Node::new(NodeId(i))).unwrap();
        }
        g.add_street(Street::new(StreetId(0), NodeId(0), NodeId(1))).unwrap();
        g.add_street(Street::new(StreetId(1), NodeId(0), NodeId(2))).unwrap();
        g.add_street(Street::new(StreetId(2), NodeId(1), NodeId(3))).unwrap();
        g.add_street(Street::new(StreetId(3), NodeId(2), NodeId(3))).unwrap();
        g.build_adj().unwrap();

        let mut sim = Dynamics::new(g, DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        sim.update_paths().unwrap();
        let path = sim.itinerary(ItineraryId(0)).unwrap().path();
        assert!(path.get(0, 1).unwrap());
        assert!(path.get(0, 2).unwrap());
        assert!(path.get(1, 3).unwrap());
        assert!(path.get(2, 3).unwrap());
        // nothing points away from the destination
        assert_eq!(path.row_entries(3).unwrap().count(), 0);
    }

    #[test]
    fn unreachable_destination_tolerated() {
        // corridor streets all point forward: node 0 is unreachable from 3
        let mut sim = Dynamics::new(corridor(), DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(0))).unwrap();
        sim.update_paths().unwrap();

        let path = sim.itinerary(ItineraryId(0)).unwrap().path();
        assert_eq!(path.row_entries(3).unwrap().count(), 0);

        // immediate spawn refuses
        assert!(sim.spawn_agent(NodeId(3), ItineraryId(0)).is_err());

        // queued demand is dropped and counted, not retried forever
        sim.queue_agent(NodeId(3), ItineraryId(0)).unwrap();
        let mut rec = Recorder::default();
        sim.evolve_with(&mut rec).unwrap();
        assert_eq!(sim.rejected(), 1);
        assert_eq!(sim.pending_demands(), 0);
        assert_eq!(rec.rejections.len(), 1);
        assert_eq!(rec.rejections[0].1, NodeId(3));
    }

    #[test]
    fn refresh_interval_computes_paths_implicitly() {
        let options = DynamicsOptions {
            path_refresh_interval: Some(4),
            ..Default::default()
        };
        let mut sim = Dynamics::new(corridor(), options).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        // no explicit update_paths: the first tick refreshes at t % 4 == 0
        sim.queue_agent(NodeId(0), ItineraryId(0)).unwrap();
        sim.run(8, &mut NoopObserver).unwrap();
        assert_eq!(sim.created(), 1);
    }
}

// ── End-to-end scenarios ──────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use traffic_core::{ItineraryId, NodeId, StreetId};
    use traffic_net::{Graph, Node, Street};

    use crate::engine::{Dynamics, DynamicsOptions};
    use crate::itinerary::Itinerary;
    use crate::observer::NoopObserver;

    use super::helpers::{corridor, grid4, Recorder};

    #[test]
    fn corridor_arrival_takes_three_transits_and_three_handoffs() {
        let mut sim = Dynamics::new(corridor(), DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        sim.update_paths().unwrap();
        let agent = sim.spawn_agent(NodeId(0), ItineraryId(0)).unwrap();

        let mut rec = Recorder::default();
        sim.run(10, &mut rec).unwrap();

        assert_eq!(rec.arrivals.len(), 1);
        let (tick, id, lifetime, distance) = rec.arrivals[0];
        assert_eq!(id, agent);
        // 3 ticks in transit plus 3 node hand-offs
        assert_eq!(tick, 6);
        assert_eq!(lifetime, 6);
        assert!((distance - 3.0).abs() < 1e-9);
        assert_eq!(sim.agent_count(), 0);
        assert_eq!(sim.arrived(), 1);
    }

    #[test]
    fn corridor_through_roundabouts_same_timing() {
        let mut graph = corridor();
        graph.make_roundabout(NodeId(1)).unwrap();
        graph.make_roundabout(NodeId(2)).unwrap();
        let mut sim = Dynamics::new(graph, DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        sim.update_paths().unwrap();
        sim.spawn_agent(NodeId(0), ItineraryId(0)).unwrap();

        let mut rec = Recorder::default();
        sim.run(10, &mut rec).unwrap();
        assert_eq!(rec.arrivals.len(), 1);
        assert_eq!(rec.arrivals[0].0, 6);
    }

    /// 4-way signalized crossing: north and south approaches hold priority,
    /// east/west depart only in the complementary half of the cycle.
    #[test]
    fn traffic_light_alternates_departure_windows() {
        // 0 = N, 1 = E, 2 = S, 3 = W, 4 = center
        let mut g = Graph::new();
        for i in 0..5 {
            g.add_node(Node::new(NodeId(i))).unwrap();
        }
        for (id, (src, dst)) in [(0, 4), (2, 4), (1, 4), (3, 4), (4, 2), (4, 3)]
            .into_iter()
            .enumerate()
        {
            let mut s = Street::new(StreetId(id as u32), NodeId(src), NodeId(dst));
            s.set_capacity(3).unwrap();
            s.set_max_speed(1.0).unwrap();
            g.add_street(s).unwrap();
        }
        g.build_adj().unwrap();

        let north_in = StreetId::encode(NodeId(0), NodeId(4), 5);
        let south_in = StreetId::encode(NodeId(2), NodeId(4), 5);
        let east_in = StreetId::encode(NodeId(1), NodeId(4), 5);
        let to_south = StreetId::encode(NodeId(4), NodeId(2), 5);
        let to_west = StreetId::encode(NodeId(4), NodeId(3), 5);

        g.make_traffic_light(NodeId(4)).unwrap();
        g.node_mut(NodeId(4)).unwrap().set_capacity(10).unwrap();
        g.node_mut(NodeId(4)).unwrap().add_street_priority(north_in).unwrap();
        g.node_mut(NodeId(4)).unwrap().add_street_priority(south_in).unwrap();
        {
            let timer = g.node_mut(NodeId(4)).unwrap().light_mut().unwrap();
            timer.set_delay(5, 5);
            // counter reaches 0 (green for N/S) on the first crossing tick
            timer.set_phase(7).unwrap();
        }
        g.make_spire_street(to_south).unwrap();
        g.make_spire_street(to_west).unwrap();

        let mut sim = Dynamics::new(g, DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(2))).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(1), NodeId(3))).unwrap();
        sim.update_paths().unwrap();
        for _ in 0..3 {
            sim.spawn_agent(NodeId(0), ItineraryId(0)).unwrap();
            sim.spawn_agent(NodeId(1), ItineraryId(1)).unwrap();
        }

        let mut north_crossings = 0u32;
        let mut east_crossings = 0u32;
        for _ in 0..14 {
            sim.evolve().unwrap();
            let green_for_north = sim
                .graph()
                .node(NodeId(4))
                .unwrap()
                .is_green(north_in)
                .unwrap();
            let green_for_east = sim
                .graph()
                .node(NodeId(4))
                .unwrap()
                .is_green(east_in)
                .unwrap();
            for sample in sim.last_street_samples() {
                if sample.street == to_south && sample.spire_in > 0 {
                    north_crossings += sample.spire_in;
                    assert!(green_for_north, "north agents crossed on red");
                }
                if sample.street == to_west && sample.spire_in > 0 {
                    east_crossings += sample.spire_in;
                    assert!(green_for_east, "east agents crossed on red");
                }
            }
        }
        assert_eq!(north_crossings, 3);
        assert_eq!(east_crossings, 3);
        assert_eq!(sim.arrived(), 6);
    }

    #[test]
    fn congestion_clamps_entry_speed() {
        let mut g = Graph::new();
        g.add_node(Node::new(NodeId(0))).unwrap();
        g.add_node(Node::new(NodeId(1))).unwrap();
        let mut s = Street::new(StreetId(0), NodeId(0), NodeId(1));
        s.set_capacity(10).unwrap();
        s.set_max_speed(2.0).unwrap();
        s.set_length(10.0).unwrap();
        g.add_street(s).unwrap();
        g.build_adj().unwrap();

        let options = DynamicsOptions { min_speed_ratio: 0.5, ..Default::default() };
        let mut sim = Dynamics::new(g, options).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(1))).unwrap();
        sim.update_paths().unwrap();
        for _ in 0..10 {
            sim.queue_agent(NodeId(0), ItineraryId(0)).unwrap();
        }
        sim.evolve().unwrap();
        assert_eq!(sim.agent_count(), 10);

        let speeds: Vec<f64> = sim.agents().map(|a| a.speed()).collect();
        let min = speeds.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = speeds.iter().cloned().fold(0.0, f64::max);
        // the first agent enters an empty street at free flow
        assert!((max - 2.0).abs() < 1e-12);
        // late entrants are clamped to max_speed · min_speed_ratio
        assert!((min - 1.0).abs() < 1e-12);
    }

    #[test]
    fn replay_is_bit_for_bit() {
        let run = || {
            let mut sim = Dynamics::new(
                grid4(),
                DynamicsOptions {
                    seed: 69,
                    error_probability: 0.3,
                    min_speed_ratio: 0.95,
                    ..Default::default()
                },
            )
            .unwrap();
            let destinations = [10u32, 7, 4, 1];
            for i in 0..16u32 {
                sim.add_itinerary(Itinerary::new(
                    ItineraryId(i),
                    NodeId(destinations[(i % 4) as usize]),
                ))
                .unwrap();
            }
            sim.update_paths().unwrap();
            for _round in 0..2u32 {
                for i in 0..16u32 {
                    sim.queue_agent(NodeId(i), ItineraryId(i)).unwrap();
                }
            }
            let mut rec = Recorder::default();
            sim.run(100, &mut rec).unwrap();
            (rec.speeds, rec.arrivals, sim.created(), sim.arrived())
        };

        let first = run();
        let second = run();
        assert_eq!(first.0, second.0, "mean-speed series diverged");
        assert_eq!(first.1, second.1, "arrival series diverged");
        assert_eq!((first.2, first.3), (second.2, second.3));
    }

    #[test]
    fn conservation_holds_every_tick() {
        let mut sim = Dynamics::new(
            grid4(),
            DynamicsOptions { seed: 7, error_probability: 0.1, ..Default::default() },
        )
        .unwrap();
        for i in 0..4u32 {
            sim.add_itinerary(Itinerary::new(ItineraryId(i), NodeId(15 - i))).unwrap();
        }
        sim.update_paths().unwrap();
        for i in 0..4u32 {
            sim.queue_agent(NodeId(i), ItineraryId(i)).unwrap();
            sim.queue_agent(NodeId(i + 4), ItineraryId(i)).unwrap();
        }
        for _ in 0..50 {
            sim.evolve_with(&mut NoopObserver).unwrap();
            // every live agent occupies exactly one street slot
            assert_eq!(
                sim.created() - sim.arrived(),
                sim.network_occupancy() as u64
            );
            assert_eq!(sim.agent_count() as u64, sim.created() - sim.arrived());
        }
    }

    #[test]
    fn measurement_reports_live_agents_and_street_state() {
        let mut sim = Dynamics::new(corridor(), DynamicsOptions::default()).unwrap();
        sim.add_itinerary(Itinerary::new(ItineraryId(0), NodeId(3))).unwrap();
        sim.update_paths().unwrap();
        sim.spawn_agent(NodeId(0), ItineraryId(0)).unwrap();
        sim.evolve().unwrap();

        let m = sim.last_measurement().unwrap();
        assert_eq!(m.tick, 0);
        assert_eq!(m.live, 1);
        assert_eq!(m.arrived, 0);
        // one agent at 1 m/s: mean 1, std 0
        assert!((m.speed.mean - 1.0).abs() < 1e-12);
        assert!(m.speed.std < 1e-12);

        let first = StreetId::encode(NodeId(0), NodeId(1), 4);
        let sample = sim
            .last_street_samples()
            .iter()
            .find(|s| s.street == first)
            .copied()
            .unwrap();
        assert_eq!(sample.density, 1.0); // capacity-1 street holding one agent
        assert!((sample.mean_speed - 1.0).abs() < 1e-12);
        assert!((sim.street_mean_speed(first).unwrap() - 1.0).abs() < 1e-12);
    }
}
