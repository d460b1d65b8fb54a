//! `Node` — a junction of the road network.
//!
//! A node is a shared header (`id`, optional coordinates, capacity) plus one
//! of three kind payloads:
//!
//! - **Intersection** — waiting agents ordered by quantized turn angle with
//!   a stable insertion index as tiebreaker, plus a set of priority street
//!   IDs;
//! - **TrafficLight** — an intersection with a green/red cycle timer;
//! - **Roundabout** — a plain FIFO of waiting agents.
//!
//! The waiting set holds *references*: an agent registered here still sits
//! in the exit queue of its inbound street.  Street capacity is the
//! occupancy ledger; the node bounds how many hand-offs can be staged at
//! once.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use traffic_core::{AgentId, NodeId, StreetId};

use crate::error::{NetError, NetResult};

// ── Intersection payload ──────────────────────────────────────────────────────

/// Waiting-agent book-keeping of a (possibly signalized) intersection.
///
/// The key is `(angle_key, seq)`: `angle_key = round(Δθ·100)` quantizes the
/// turn angle onto the agent's chosen outbound street, `seq` is a
/// monotonically increasing insertion index so duplicate angle keys keep a
/// stable order.  Smaller keys leave first.
#[derive(Clone, Debug, Default)]
pub struct Intersection {
    agents: BTreeMap<(i16, u32), AgentId>,
    seq: u32,
    street_priorities: BTreeSet<StreetId>,
    agent_counter: u32,
}

impl Intersection {
    fn push(&mut self, angle_key: i16, agent: AgentId) {
        self.agents.insert((angle_key, self.seq), agent);
        self.seq = self.seq.wrapping_add(1);
        self.agent_counter += 1;
    }

    fn remove(&mut self, agent: AgentId) -> bool {
        let key = self
            .agents
            .iter()
            .find(|(_, &a)| a == agent)
            .map(|(&k, _)| k);
        match key {
            Some(k) => {
                self.agents.remove(&k);
                true
            }
            None => false,
        }
    }

    fn contains(&self, agent: AgentId) -> bool {
        self.agents.values().any(|&a| a == agent)
    }
}

// ── Traffic-light timer ───────────────────────────────────────────────────────

/// Cyclic green/red phase block of a traffic light.
///
/// The counter lives in `[0, green+red)`.  Priority streets see green while
/// `counter < green`; the remaining streets see green for the rest of the
/// cycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct LightTimer {
    delay: Option<(u32, u32)>,
    counter: u32,
    pending_phase: Option<u32>,
}

impl LightTimer {
    /// The configured `(green, red)` delay, if any.
    pub fn delay(&self) -> Option<(u32, u32)> {
        self.delay
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Configure the `(green, red)` cycle.
    ///
    /// When a delay is already set the counter is adjusted to preserve
    /// temporal continuity:
    ///
    /// 1. a counter at or past the new cycle is pulled back to its last
    ///    tick (`green + red − 1`);
    /// 2. a counter inside a shrunken green window keeps its distance to
    ///    the green/red boundary: `counter = green' − (green − counter)`,
    ///    wrapped modulo the new cycle when it underflows.
    pub fn set_delay(&mut self, green: u32, red: u32) {
        if let Some((old_green, _)) = self.delay {
            let cycle = green + red;
            if self.counter >= cycle {
                self.counter = cycle - 1;
            } else if green < old_green
                && self.counter >= green
                && self.counter <= old_green
            {
                let shifted = green as i64 - (old_green - self.counter) as i64;
                self.counter = shifted.rem_euclid(cycle as i64) as u32;
            }
        }
        self.delay = Some((green, red));
    }

    /// Jump the counter to `phase mod (green + red)` and clear any pending
    /// phase change.
    pub fn set_phase(&mut self, phase: u32) -> NetResult<()> {
        let (green, red) = self.delay.ok_or(NetError::LightUnconfigured(NodeId::INVALID))?;
        self.counter = phase % (green + red);
        self.pending_phase = None;
        Ok(())
    }

    /// Queue a phase jump to take effect at the next counter wrap.
    pub fn set_phase_after_cycle(&mut self, phase: u32) -> NetResult<()> {
        let (green, red) = self.delay.ok_or(NetError::LightUnconfigured(NodeId::INVALID))?;
        self.pending_phase = Some(phase % (green + red));
        Ok(())
    }

    /// Advance the cycle by one tick.  On reaching `green + red` the counter
    /// jumps to the pending phase if one is queued, else to 0.
    pub fn increase_counter(&mut self) -> NetResult<()> {
        let (green, red) = self.delay.ok_or(NetError::LightUnconfigured(NodeId::INVALID))?;
        self.counter += 1;
        if self.counter == green + red {
            self.counter = self.pending_phase.take().unwrap_or(0);
        }
        Ok(())
    }

    /// `true` while the counter is inside the green window `[0, green)`.
    pub fn is_green(&self) -> NetResult<bool> {
        let (green, _) = self.delay.ok_or(NetError::LightUnconfigured(NodeId::INVALID))?;
        Ok(self.counter < green)
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// Kind-specific payload of a node.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Intersection(Intersection),
    TrafficLight { queue: Intersection, timer: LightTimer },
    Roundabout { agents: VecDeque<AgentId> },
}

/// A network junction: shared header plus kind payload.
#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    coords: Option<(f64, f64)>,
    capacity: usize,
    kind: NodeKind,
}

impl Node {
    /// A plain intersection with capacity 1 and no coordinates.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            coords: None,
            capacity: 1,
            kind: NodeKind::Intersection(Intersection::default()),
        }
    }

    /// A plain intersection at `(lat, lon)`.
    pub fn with_coords(id: NodeId, coords: (f64, f64)) -> Self {
        let mut node = Self::new(id);
        node.coords = Some(coords);
        node
    }

    // ── Header accessors ──────────────────────────────────────────────────

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn coords(&self) -> Option<(f64, f64)> {
        self.coords
    }

    pub fn set_coords(&mut self, coords: (f64, f64)) {
        self.coords = Some(coords);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rejects capacities below the number of agents currently waiting.
    pub fn set_capacity(&mut self, capacity: usize) -> NetResult<()> {
        if capacity < self.occupancy() {
            return Err(NetError::CapacityBelowOccupancy {
                requested: capacity,
                occupancy: self.occupancy(),
            });
        }
        self.capacity = capacity;
        Ok(())
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_intersection(&self) -> bool {
        matches!(self.kind, NodeKind::Intersection(_) | NodeKind::TrafficLight { .. })
    }

    pub fn is_traffic_light(&self) -> bool {
        matches!(self.kind, NodeKind::TrafficLight { .. })
    }

    pub fn is_roundabout(&self) -> bool {
        matches!(self.kind, NodeKind::Roundabout { .. })
    }

    // ── Kind conversions (header preserved) ───────────────────────────────

    /// Convert this node into a traffic light, keeping any waiting agents
    /// and street priorities.  Roundabout queues cannot carry over their
    /// angle ordering and start empty.
    pub fn into_traffic_light(&mut self) {
        let queue = match std::mem::replace(
            &mut self.kind,
            NodeKind::Intersection(Intersection::default()),
        ) {
            NodeKind::Intersection(q) => q,
            NodeKind::TrafficLight { queue, .. } => queue,
            NodeKind::Roundabout { .. } => Intersection::default(),
        };
        self.kind = NodeKind::TrafficLight { queue, timer: LightTimer::default() };
    }

    /// Convert this node into a roundabout.  Waiting agents are re-queued
    /// in their current departure order.
    pub fn into_roundabout(&mut self) {
        let agents = match std::mem::replace(
            &mut self.kind,
            NodeKind::Intersection(Intersection::default()),
        ) {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                q.agents.into_values().collect()
            }
            NodeKind::Roundabout { agents } => agents,
        };
        self.kind = NodeKind::Roundabout { agents };
    }

    // ── Waiting-set operations ────────────────────────────────────────────

    /// Number of agents waiting at this node.
    pub fn occupancy(&self) -> usize {
        match &self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                q.agents.len()
            }
            NodeKind::Roundabout { agents } => agents.len(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity
    }

    /// Register a waiting agent.  Intersections order by `angle_key`
    /// (insertion order breaks ties); roundabouts ignore the key and append.
    pub fn admit(&mut self, angle_key: i16, agent: AgentId) -> NetResult<()> {
        if self.is_full() {
            return Err(NetError::NodeFull { node: self.id, capacity: self.capacity });
        }
        match &mut self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                if q.contains(agent) {
                    return Err(NetError::AgentAlreadyAtNode { agent, node: self.id });
                }
                q.push(angle_key, agent);
            }
            NodeKind::Roundabout { agents } => {
                if agents.contains(&agent) {
                    return Err(NetError::AgentAlreadyAtNode { agent, node: self.id });
                }
                agents.push_back(agent);
            }
        }
        Ok(())
    }

    /// Remove a waiting agent (it has crossed, or arrived).
    pub fn withdraw(&mut self, agent: AgentId) -> NetResult<()> {
        let found = match &mut self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                q.remove(agent)
            }
            NodeKind::Roundabout { agents } => {
                match agents.iter().position(|&a| a == agent) {
                    Some(pos) => {
                        agents.remove(pos);
                        true
                    }
                    None => false,
                }
            }
        };
        if found {
            Ok(())
        } else {
            Err(NetError::AgentNotAtNode { agent, node: self.id })
        }
    }

    /// Waiting agents in departure order: ascending `(angle_key, seq)` for
    /// intersections, FIFO for roundabouts.
    pub fn waiting(&self) -> Vec<AgentId> {
        match &self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                q.agents.values().copied().collect()
            }
            NodeKind::Roundabout { agents } => agents.iter().copied().collect(),
        }
    }

    /// Head of a roundabout's FIFO.
    pub fn front(&self) -> NetResult<Option<AgentId>> {
        match &self.kind {
            NodeKind::Roundabout { agents } => Ok(agents.front().copied()),
            _ => Err(NetError::NotRoundabout(self.id)),
        }
    }

    /// Pop the head of a roundabout's FIFO.
    pub fn dequeue(&mut self) -> NetResult<AgentId> {
        match &mut self.kind {
            NodeKind::Roundabout { agents } => {
                agents.pop_front().ok_or(NetError::EmptyRoundabout(self.id))
            }
            _ => Err(NetError::NotRoundabout(self.id)),
        }
    }

    // ── Priorities & counters (intersections only) ────────────────────────

    /// Street IDs with priority at this junction (main roads).
    pub fn street_priorities(&self) -> NetResult<&BTreeSet<StreetId>> {
        match &self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                Ok(&q.street_priorities)
            }
            NodeKind::Roundabout { .. } => Err(NetError::NotIntersection(self.id)),
        }
    }

    pub fn set_street_priorities(&mut self, priorities: BTreeSet<StreetId>) -> NetResult<()> {
        match &mut self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                q.street_priorities = priorities;
                Ok(())
            }
            NodeKind::Roundabout { .. } => Err(NetError::NotIntersection(self.id)),
        }
    }

    pub fn add_street_priority(&mut self, street: StreetId) -> NetResult<()> {
        match &mut self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                q.street_priorities.insert(street);
                Ok(())
            }
            NodeKind::Roundabout { .. } => Err(NetError::NotIntersection(self.id)),
        }
    }

    /// Agents admitted since the last call; resets on read.
    pub fn take_agent_count(&mut self) -> NetResult<u32> {
        match &mut self.kind {
            NodeKind::Intersection(q) | NodeKind::TrafficLight { queue: q, .. } => {
                Ok(std::mem::take(&mut q.agent_counter))
            }
            NodeKind::Roundabout { .. } => Err(NetError::NotIntersection(self.id)),
        }
    }

    // ── Traffic-light operations ──────────────────────────────────────────

    /// The phase timer of a traffic light.
    pub fn light(&self) -> Option<&LightTimer> {
        match &self.kind {
            NodeKind::TrafficLight { timer, .. } => Some(timer),
            _ => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut LightTimer> {
        match &mut self.kind {
            NodeKind::TrafficLight { timer, .. } => Some(timer),
            _ => None,
        }
    }

    /// Whether the light shows green to `street`: priority streets see
    /// green during `[0, green)`, the others during `[green, green+red)`.
    ///
    /// Errors when the node is not a traffic light or the delay is unset.
    pub fn is_green(&self, street: StreetId) -> NetResult<bool> {
        match &self.kind {
            NodeKind::TrafficLight { queue, timer } => {
                let green_window = timer
                    .is_green()
                    .map_err(|_| NetError::LightUnconfigured(self.id))?;
                let has_priority = queue.street_priorities.contains(&street);
                Ok(green_window == has_priority)
            }
            _ => Err(NetError::NotIntersection(self.id)),
        }
    }
}
