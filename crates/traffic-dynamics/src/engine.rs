//! `Dynamics` — the tick-loop engine.
//!
//! The engine owns the graph, the agent and itinerary maps, the pending
//! demand queue and the RNG.  Every collection it iterates is a `BTreeMap`
//! or an ID-sorted snapshot, so given the same seed a run reproduces its
//! trajectory exactly.
//!
//! Streets are the occupancy ledger: a live agent sits on exactly one
//! street at all times (the waiting set of a node holds hand-off references
//! into the exit queues of its inbound streets).  Conservation is therefore
//! `created − arrived = Σ transit + Σ exit` at every tick boundary.

use std::collections::{BTreeMap, VecDeque};

use traffic_core::{AgentId, ItineraryId, Measurement, NodeId, SimRng, SparseMatrix, StreetId};
use traffic_net::{costs_match, Graph, NetError};

use crate::agent::Agent;
use crate::error::{DynamicsError, DynamicsResult};
use crate::itinerary::Itinerary;
use crate::observer::{DynamicsObserver, NoopObserver, StreetSample, TickMeasurement};

// ── Options ───────────────────────────────────────────────────────────────────

/// Engine configuration.
#[derive(Clone, Copy, Debug)]
pub struct DynamicsOptions {
    /// RNG seed; the same seed always reproduces the same trajectory.
    pub seed: u64,
    /// Probability that a hand-off ignores the itinerary and picks any
    /// outbound street uniformly.  In `[0, 1]`.
    pub error_probability: f64,
    /// Floor on the density-scaled entry speed, as a fraction of the
    /// street's free-flow speed.  In `[0, 1]`.
    pub min_speed_ratio: f64,
    /// Weight of density in the travel-time edge cost.
    pub congestion_factor: f64,
    /// With `Some(k)`, recompute every itinerary's path matrix at the start
    /// of every k-th tick.  `None` leaves recomputation fully explicit.
    pub path_refresh_interval: Option<u64>,
}

impl Default for DynamicsOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            error_probability: 0.0,
            min_speed_ratio: 1.0,
            congestion_factor: 1.0,
            path_refresh_interval: None,
        }
    }
}

impl DynamicsOptions {
    fn validate(&self) -> DynamicsResult<()> {
        if !(0.0..=1.0).contains(&self.error_probability) {
            return Err(DynamicsError::InvalidOption(format!(
                "error_probability {} outside [0, 1]",
                self.error_probability
            )));
        }
        if !(0.0..=1.0).contains(&self.min_speed_ratio) {
            return Err(DynamicsError::InvalidOption(format!(
                "min_speed_ratio {} outside [0, 1]",
                self.min_speed_ratio
            )));
        }
        if !(self.congestion_factor > 0.0) {
            return Err(DynamicsError::InvalidOption(format!(
                "congestion_factor {} must be positive",
                self.congestion_factor
            )));
        }
        Ok(())
    }
}

// ── Demand ────────────────────────────────────────────────────────────────────

/// A request to create one agent at `source` following `itinerary`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Demand {
    pub source: NodeId,
    pub itinerary: ItineraryId,
}

/// Outcome of one injection attempt.
enum Injection {
    Spawned(AgentId),
    /// Source node or first street full; retried next tick.
    Deferred,
    /// The destination is unreachable from the source; the demand is
    /// dropped and counted.
    Unreachable,
}

/// Outcome of one hand-off attempt during node evacuation.
enum Crossing {
    Done,
    Arrived,
    Blocked,
}

// ── Dynamics ──────────────────────────────────────────────────────────────────

/// The simulation engine.  See the crate docs for the tick phases.
pub struct Dynamics {
    graph: Graph,
    options: DynamicsOptions,
    itineraries: BTreeMap<ItineraryId, Itinerary>,
    agents: BTreeMap<AgentId, Agent>,
    pending: VecDeque<Demand>,
    rng: SimRng,
    time: u64,
    next_agent: u32,
    created: u64,
    arrived: u64,
    rejected: u64,
    last_measurement: Option<TickMeasurement>,
    last_samples: Vec<StreetSample>,
}

impl Dynamics {
    /// Build an engine over `graph`, which must have its adjacency built
    /// (`Graph::build_adj`).
    pub fn new(graph: Graph, options: DynamicsOptions) -> DynamicsResult<Self> {
        options.validate()?;
        if graph.n() == 0 {
            return Err(DynamicsError::GraphNotReady);
        }
        Ok(Self {
            graph,
            rng: SimRng::new(options.seed),
            options,
            itineraries: BTreeMap::new(),
            agents: BTreeMap::new(),
            pending: VecDeque::new(),
            time: 0,
            next_agent: 0,
            created: 0,
            arrived: 0,
            rejected: 0,
            last_measurement: None,
            last_samples: Vec::new(),
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutate the network between ticks (adding nodes or streets requires a
    /// fresh `build_adj` and `update_paths` before the next `evolve`).
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn options(&self) -> &DynamicsOptions {
        &self.options
    }

    /// The current tick (number of completed `evolve` calls).
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn agent(&self, id: AgentId) -> DynamicsResult<&Agent> {
        self.agents.get(&id).ok_or(DynamicsError::AgentNotFound(id))
    }

    /// Live agents in ascending ID order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn itinerary(&self, id: ItineraryId) -> DynamicsResult<&Itinerary> {
        self.itineraries
            .get(&id)
            .ok_or(DynamicsError::ItineraryNotFound(id))
    }

    pub fn itineraries(&self) -> impl Iterator<Item = &Itinerary> {
        self.itineraries.values()
    }

    /// Agents created since the start of the run.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Agents that reached their destination since the start of the run.
    pub fn arrived(&self) -> u64 {
        self.arrived
    }

    /// Demands dropped for unreachable destinations since the start.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Demands still waiting for capacity.
    pub fn pending_demands(&self) -> usize {
        self.pending.len()
    }

    /// The measurement of the last completed tick.
    pub fn last_measurement(&self) -> Option<&TickMeasurement> {
        self.last_measurement.as_ref()
    }

    /// The per-street samples of the last completed tick.
    pub fn last_street_samples(&self) -> &[StreetSample] {
        &self.last_samples
    }

    /// Mean and std of every live agent's current speed.
    pub fn mean_speed(&self) -> Measurement {
        Measurement::from_samples(self.agents.values().map(|a| a.speed))
    }

    /// Arithmetic mean of the in-transit agents' speeds on one street
    /// (0 if the street carries none).
    pub fn street_mean_speed(&self, id: StreetId) -> DynamicsResult<f64> {
        let street = self.graph.street(id)?;
        let speeds: Vec<f64> = street
            .transit()
            .filter_map(|a| self.agents.get(&a))
            .map(|a| a.speed)
            .collect();
        if speeds.is_empty() {
            return Ok(0.0);
        }
        Ok(speeds.iter().sum::<f64>() / speeds.len() as f64)
    }

    /// Total street occupancy — equals `created − arrived` at every tick
    /// boundary.
    pub fn network_occupancy(&self) -> usize {
        self.graph.streets().map(|s| s.occupancy()).sum()
    }

    // ── Itineraries & demand ──────────────────────────────────────────────

    /// Register an itinerary.  The destination must exist in the graph.
    pub fn add_itinerary(&mut self, itinerary: Itinerary) -> DynamicsResult<()> {
        if self.itineraries.contains_key(&itinerary.id()) {
            return Err(DynamicsError::DuplicateItinerary(itinerary.id()));
        }
        self.graph.node(itinerary.destination())?;
        self.itineraries.insert(itinerary.id(), itinerary);
        Ok(())
    }

    /// Queue a demand for deferred injection: it is retried once per tick
    /// until the source and first street have room.
    pub fn queue_agent(&mut self, source: NodeId, itinerary: ItineraryId) -> DynamicsResult<()> {
        self.graph.node(source)?;
        if !self.itineraries.contains_key(&itinerary) {
            return Err(DynamicsError::ItineraryNotFound(itinerary));
        }
        self.pending.push_back(Demand { source, itinerary });
        Ok(())
    }

    /// Create an agent immediately, or fail with
    /// [`DemandRejected`](DynamicsError::DemandRejected) when the source or
    /// first street is full or the destination is unreachable.
    pub fn spawn_agent(
        &mut self,
        source: NodeId,
        itinerary: ItineraryId,
    ) -> DynamicsResult<AgentId> {
        self.graph.node(source)?;
        match self.try_inject(Demand { source, itinerary })? {
            Injection::Spawned(id) => Ok(id),
            Injection::Deferred | Injection::Unreachable => {
                Err(DynamicsError::DemandRejected { from_node: source, itinerary })
            }
        }
    }

    // ── Path recomputation ────────────────────────────────────────────────

    /// Rebuild every itinerary's reachability matrix from the current
    /// densities.
    ///
    /// One reverse-graph Dijkstra per itinerary yields the minimum cost
    /// from every node to the destination; a street `u → v` is a
    /// shortest-path edge iff `cost(u,v) + dist(v) = dist(u)` within
    /// tolerance.  Unreachable destinations are tolerated — the matrix
    /// stays empty and injection for the itinerary is refused.
    ///
    /// Recomputation is the dominant cost of the engine and is therefore
    /// never implicit; either call this after mutating the network, or set
    /// [`DynamicsOptions::path_refresh_interval`].
    pub fn update_paths(&mut self) -> DynamicsResult<()> {
        let alpha = self.options.congestion_factor;
        let n = self.graph.n();
        for itinerary in self.itineraries.values_mut() {
            let dist = self
                .graph
                .distances_to(itinerary.destination(), |s| Graph::travel_time(s, alpha))?;
            let mut path = SparseMatrix::new(n, n);
            for street in self.graph.streets() {
                let (u, v) = street.node_pair();
                let (du, dv) = (dist[u.index()], dist[v.index()]);
                if du.is_finite()
                    && dv.is_finite()
                    && costs_match(Graph::travel_time(street, alpha) + dv, du)
                {
                    path.insert(u.0, v.0, true)?;
                }
            }
            itinerary.set_path(path);
        }
        Ok(())
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Advance the simulation one tick.
    pub fn evolve(&mut self) -> DynamicsResult<()> {
        self.evolve_with(&mut NoopObserver)
    }

    /// Advance one tick, reporting progress through `observer`.
    pub fn evolve_with<O: DynamicsObserver>(&mut self, observer: &mut O) -> DynamicsResult<()> {
        if let Some(k) = self.options.path_refresh_interval {
            if k > 0 && self.time % k == 0 {
                self.update_paths()?;
            }
        }
        observer.on_tick_start(self.time);

        self.tick_lights()?;
        self.evacuate_nodes(observer)?;
        self.advance_streets()?;
        self.inject_pending(observer)?;

        let (measurement, samples) = self.record_measurement()?;
        observer.on_tick_end(self.time, &measurement, &samples);
        self.last_measurement = Some(measurement);
        self.last_samples = samples;

        self.time += 1;
        Ok(())
    }

    /// Run `ticks` consecutive ticks.
    pub fn run<O: DynamicsObserver>(&mut self, ticks: u64, observer: &mut O) -> DynamicsResult<()> {
        for _ in 0..ticks {
            self.evolve_with(observer)?;
        }
        Ok(())
    }

    // ── Phase ②: lights ───────────────────────────────────────────────────

    fn tick_lights(&mut self) -> DynamicsResult<()> {
        for node in self.graph.nodes_mut() {
            let id = node.id();
            if let Some(timer) = node.light_mut() {
                timer
                    .increase_counter()
                    .map_err(|_| NetError::LightUnconfigured(id))?;
            }
        }
        Ok(())
    }

    // ── Phase ③: node evacuation ──────────────────────────────────────────

    fn evacuate_nodes<O: DynamicsObserver>(&mut self, observer: &mut O) -> DynamicsResult<()> {
        let node_ids: Vec<NodeId> = self.graph.node_ids().collect();
        for node_id in node_ids {
            // Per-tick outflow budgets for the inbound streets of this node.
            let mut budgets: BTreeMap<StreetId, usize> = BTreeMap::new();

            if self.graph.node(node_id)?.is_roundabout() {
                // Strict FIFO: a blocked head stalls the whole roundabout.
                while let Some(agent_id) = self.graph.node(node_id)?.front()? {
                    match self.try_cross(node_id, agent_id, &mut budgets, observer)? {
                        Crossing::Done | Crossing::Arrived => continue,
                        Crossing::Blocked => break,
                    }
                }
            } else {
                // Angle order; a blocked agent is skipped, not head-of-line
                // blocking — a red inbound street must not stall the green
                // ones.
                let waiting = self.graph.node(node_id)?.waiting();
                for agent_id in waiting {
                    self.try_cross(node_id, agent_id, &mut budgets, observer)?;
                }
            }
        }
        Ok(())
    }

    /// Attempt to move one waiting agent across `node_id`.
    fn try_cross<O: DynamicsObserver>(
        &mut self,
        node_id: NodeId,
        agent_id: AgentId,
        budgets: &mut BTreeMap<StreetId, usize>,
        observer: &mut O,
    ) -> DynamicsResult<Crossing> {
        let (itinerary_id, inbound) = {
            let agent = self
                .agents
                .get(&agent_id)
                .ok_or(DynamicsError::AgentNotFound(agent_id))?;
            let inbound = agent.street.ok_or(DynamicsError::AgentDetached(agent_id))?;
            (agent.itinerary, inbound)
        };

        if !budgets.contains_key(&inbound) {
            let budget = self.graph.street(inbound)?.transport_capacity();
            budgets.insert(inbound, budget);
        }
        if budgets[&inbound] == 0 {
            return Ok(Crossing::Blocked);
        }

        let node = self.graph.node(node_id)?;
        if node.is_traffic_light() && !node.is_green(inbound)? {
            return Ok(Crossing::Blocked);
        }

        let destination = self
            .itineraries
            .get(&itinerary_id)
            .ok_or(DynamicsError::ItineraryNotFound(itinerary_id))?
            .destination();

        // ── Arrival ───────────────────────────────────────────────────────
        if destination == node_id {
            self.graph.node_mut(node_id)?.withdraw(agent_id)?;
            self.graph.street_mut(inbound)?.leave(agent_id)?;
            if let Some(mut agent) = self.agents.remove(&agent_id) {
                agent.street = None;
                self.arrived += 1;
                observer.on_arrival(self.time, &agent);
            }
            if let Some(budget) = budgets.get_mut(&inbound) {
                *budget -= 1;
            }
            return Ok(Crossing::Arrived);
        }

        // ── Hand-off ──────────────────────────────────────────────────────
        let planned = self
            .agents
            .get(&agent_id)
            .and_then(|a| a.next_street)
            .ok_or(DynamicsError::AgentDetached(agent_id))?;

        let outbound = if self.graph.street(planned)?.is_full() {
            // Re-sample without replacement among the remaining open
            // reachability candidates; a closed front leaves the agent
            // waiting for the next tick.
            let alternatives = self.open_candidates(node_id, itinerary_id, Some(planned))?;
            if alternatives.is_empty() {
                return Ok(Crossing::Blocked);
            }
            let pick = alternatives[self.rng.gen_range(0..alternatives.len())];
            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.next_street = Some(pick);
            }
            pick
        } else {
            planned
        };

        self.graph.node_mut(node_id)?.withdraw(agent_id)?;
        self.graph.street_mut(inbound)?.leave(agent_id)?;
        let (speed, delay) = self.entry_kinematics(outbound)?;
        self.graph.street_mut(outbound)?.enter(agent_id)?;

        let now = self.time;
        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(DynamicsError::AgentNotFound(agent_id))?;
        agent.street = Some(outbound);
        agent.next_street = None;
        agent.speed = speed;
        agent.delay = delay;
        agent.entered_at = now;

        if let Some(budget) = budgets.get_mut(&inbound) {
            *budget -= 1;
        }
        Ok(Crossing::Done)
    }

    // ── Phase ④: street progress ──────────────────────────────────────────

    fn advance_streets(&mut self) -> DynamicsResult<()> {
        let street_ids: Vec<StreetId> = self.graph.street_ids().collect();
        for street_id in street_ids {
            let transit: Vec<AgentId> = self.graph.street(street_id)?.transit().collect();
            for agent_id in transit {
                let delay_after = {
                    let agent = self
                        .agents
                        .get_mut(&agent_id)
                        .ok_or(DynamicsError::AgentNotFound(agent_id))?;
                    if agent.entered_at == self.time {
                        continue; // entered this tick; starts moving next tick
                    }
                    if agent.delay > 0 {
                        agent.distance += agent.speed;
                        agent.delay -= 1;
                    }
                    agent.delay
                };
                if delay_after == 0 {
                    self.finish_transit(street_id, agent_id)?;
                }
            }
        }
        Ok(())
    }

    /// Promote an agent whose delay has elapsed: plan its hand-off, move it
    /// into the exit queue and register it at the destination node.  A full
    /// node defers the whole step to a later tick.
    fn finish_transit(&mut self, street_id: StreetId, agent_id: AgentId) -> DynamicsResult<()> {
        let dst = self.graph.street(street_id)?.destination();
        if self.graph.node(dst)?.is_full() {
            return Ok(());
        }
        let (next, angle_key) = self.plan_handoff(street_id, dst, agent_id)?;
        self.graph.street_mut(street_id)?.promote(agent_id)?;
        self.graph.node_mut(dst)?.admit(angle_key, agent_id)?;
        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(DynamicsError::AgentNotFound(agent_id))?;
        agent.next_street = next;
        agent.speed = 0.0;
        Ok(())
    }

    /// Choose the outbound street for an agent reaching `node_id` and the
    /// angle key it queues under.
    ///
    /// With probability `error_probability` the itinerary is ignored and
    /// any outbound street is picked uniformly (the stochastic deviation);
    /// otherwise the choice samples the itinerary's reachability row.
    /// Arriving agents queue under key 0 with no outbound street.
    fn plan_handoff(
        &mut self,
        inbound: StreetId,
        node_id: NodeId,
        agent_id: AgentId,
    ) -> DynamicsResult<(Option<StreetId>, i16)> {
        let itinerary_id = self
            .agents
            .get(&agent_id)
            .ok_or(DynamicsError::AgentNotFound(agent_id))?
            .itinerary;
        let itinerary = self
            .itineraries
            .get(&itinerary_id)
            .ok_or(DynamicsError::ItineraryNotFound(itinerary_id))?;

        if itinerary.destination() == node_id {
            return Ok((None, 0));
        }

        let deviate = self.rng.gen_bool(self.options.error_probability);
        let mut candidates: Vec<StreetId> = if deviate {
            self.graph.outgoing(node_id).map(|s| s.id()).collect()
        } else {
            self.reachability_row(node_id, itinerary_id)?
        };
        if candidates.is_empty() {
            // Stale path matrix after a network edit; any outbound street
            // beats stranding the agent.
            candidates = self.graph.outgoing(node_id).map(|s| s.id()).collect();
        }
        if candidates.is_empty() {
            return Err(DynamicsError::DeadEnd { agent: agent_id, node: node_id });
        }

        let outbound = candidates[self.rng.gen_range(0..candidates.len())];
        let turn = self
            .graph
            .street(inbound)?
            .turn_angle(self.graph.street(outbound)?.angle());
        let angle_key = (turn * 100.0).round() as i16;
        Ok((Some(outbound), angle_key))
    }

    /// The itinerary's shortest-path streets out of `node_id`.
    fn reachability_row(
        &self,
        node_id: NodeId,
        itinerary_id: ItineraryId,
    ) -> DynamicsResult<Vec<StreetId>> {
        let itinerary = self
            .itineraries
            .get(&itinerary_id)
            .ok_or(DynamicsError::ItineraryNotFound(itinerary_id))?;
        let path = itinerary.path();
        if path.rows() == 0 || node_id.0 >= path.rows() {
            return Ok(Vec::new());
        }
        let n = self.graph.n();
        Ok(path
            .row_entries(node_id.0)?
            .map(|(v, _)| StreetId::encode(node_id, NodeId(v), n))
            .collect())
    }

    /// Reachability candidates out of `node_id` with free capacity,
    /// optionally excluding one street.
    fn open_candidates(
        &self,
        node_id: NodeId,
        itinerary_id: ItineraryId,
        exclude: Option<StreetId>,
    ) -> DynamicsResult<Vec<StreetId>> {
        let mut out = Vec::new();
        for id in self.reachability_row(node_id, itinerary_id)? {
            if Some(id) == exclude {
                continue;
            }
            if !self.graph.street(id)?.is_full() {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Entry speed and transit delay for a street at its current density.
    ///
    /// `speed = max(v_max·(1 − ρ), v_max·min_speed_ratio)`, evaluated
    /// before the agent joins; `delay = ⌈length / speed⌉`.
    fn entry_kinematics(&self, street_id: StreetId) -> DynamicsResult<(f64, u32)> {
        let street = self.graph.street(street_id)?;
        let v_max = street.max_speed();
        let speed = (v_max * (1.0 - street.density()))
            .max(v_max * self.options.min_speed_ratio)
            .max(f64::MIN_POSITIVE);
        let ticks = (street.length() / speed).ceil();
        let delay = if ticks >= u32::MAX as f64 { u32::MAX } else { ticks as u32 };
        Ok((speed, delay.max(1)))
    }

    // ── Phase ⑤: injection ────────────────────────────────────────────────

    fn inject_pending<O: DynamicsObserver>(&mut self, observer: &mut O) -> DynamicsResult<()> {
        let mut retained = VecDeque::new();
        let pending = std::mem::take(&mut self.pending);
        for demand in pending {
            match self.try_inject(demand)? {
                Injection::Spawned(_) => {}
                Injection::Deferred => retained.push_back(demand),
                Injection::Unreachable => {
                    self.rejected += 1;
                    observer.on_demand_rejected(self.time, demand.source, demand.itinerary);
                }
            }
        }
        self.pending = retained;
        Ok(())
    }

    fn try_inject(&mut self, demand: Demand) -> DynamicsResult<Injection> {
        if !self.itineraries.contains_key(&demand.itinerary) {
            return Err(DynamicsError::ItineraryNotFound(demand.itinerary));
        }
        let candidates = self.reachability_row(demand.source, demand.itinerary)?;
        if candidates.is_empty() {
            return Ok(Injection::Unreachable);
        }
        if self.graph.node(demand.source)?.is_full() {
            return Ok(Injection::Deferred);
        }
        let chosen = candidates[self.rng.gen_range(0..candidates.len())];
        if self.graph.street(chosen)?.is_full() {
            return Ok(Injection::Deferred);
        }

        let (speed, delay) = self.entry_kinematics(chosen)?;
        let id = AgentId(self.next_agent);
        self.next_agent += 1;

        let mut agent = Agent::new(id, demand.itinerary);
        agent.src_node = Some(demand.source);
        agent.street = Some(chosen);
        agent.speed = speed;
        agent.delay = delay;
        agent.entered_at = self.time;

        self.graph.street_mut(chosen)?.enter(id)?;
        self.agents.insert(id, agent);
        self.created += 1;
        Ok(Injection::Spawned(id))
    }

    // ── Phase ⑥: measurement ──────────────────────────────────────────────

    fn record_measurement(&mut self) -> DynamicsResult<(TickMeasurement, Vec<StreetSample>)> {
        for agent in self.agents.values_mut() {
            agent.time += 1;
        }

        let street_ids: Vec<StreetId> = self.graph.street_ids().collect();
        let mut samples = Vec::with_capacity(street_ids.len());
        for id in street_ids {
            let street = self.graph.street_mut(id)?;
            let spire_in = street.take_input_count();
            let spire_out = street.take_output_count();
            let density = street.density();
            let transit: Vec<AgentId> = street.transit().collect();
            let mean_speed = if transit.is_empty() {
                0.0
            } else {
                let sum: f64 = transit
                    .iter()
                    .filter_map(|a| self.agents.get(a))
                    .map(|a| a.speed)
                    .sum();
                sum / transit.len() as f64
            };
            samples.push(StreetSample { street: id, density, mean_speed, spire_in, spire_out });
        }

        let measurement = TickMeasurement {
            tick: self.time,
            speed: Measurement::from_samples(self.agents.values().map(|a| a.speed)),
            live: self.agents.len(),
            arrived: self.arrived,
            rejected: self.rejected,
        };
        Ok((measurement, samples))
    }
}
