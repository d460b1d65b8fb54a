//! `Street` — a directed arc carrying agents.
//!
//! A street holds its agents in two collections:
//!
//! - the **transit set**: agents still traversing, ordered by `AgentId` so
//!   per-tick advancement visits them deterministically;
//! - the **exit queue**: agents that have finished traversing and wait to
//!   hand off at the destination node, FIFO by completion order.
//!
//! The occupancy invariant `|transit| + |exit| ≤ capacity` holds after every
//! mutation; [`enter`](Street::enter) refuses admissions that would break it.
//!
//! Optional *spire* instrumentation counts agents entering and leaving the
//! street since the last reset, the road-sensor ("inductive loop") view of
//! flow.  It is an attachable counter block rather than a street subtype.

use std::collections::{BTreeSet, VecDeque};
use std::f64::consts::PI;

use traffic_core::{AgentId, NodeId, StreetId};

use crate::error::{NetError, NetResult};

/// Free-flow speed applied when none is configured, in m/s (≈ 50 km/h).
pub const DEFAULT_MAX_SPEED: f64 = 13.9;

// ── Spire counters ────────────────────────────────────────────────────────────

/// Crossing counters for an instrumented ("spire") street.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpireCounters {
    inputs: u32,
    outputs: u32,
}

// ── Street ────────────────────────────────────────────────────────────────────

/// A directed street between two nodes.
#[derive(Clone, Debug)]
pub struct Street {
    id: StreetId,
    node_pair: (NodeId, NodeId),
    length: f64,
    max_speed: f64,
    capacity: usize,
    transport_capacity: usize,
    angle: f64,
    transit: BTreeSet<AgentId>,
    exit_queue: VecDeque<AgentId>,
    spire: Option<SpireCounters>,
}

impl Street {
    /// A street from `src` to `dst` with unit length, capacity 1, transport
    /// capacity 1 and the default free-flow speed.
    pub fn new(id: StreetId, src: NodeId, dst: NodeId) -> Self {
        Self {
            id,
            node_pair: (src, dst),
            length: 1.0,
            max_speed: DEFAULT_MAX_SPEED,
            capacity: 1,
            transport_capacity: 1,
            angle: 0.0,
            transit: BTreeSet::new(),
            exit_queue: VecDeque::new(),
            spire: None,
        }
    }

    // ── Attribute accessors ───────────────────────────────────────────────

    pub fn id(&self) -> StreetId {
        self.id
    }

    /// Used by `Graph::build_adj` when re-keying to canonical IDs.
    pub(crate) fn set_id(&mut self, id: StreetId) {
        self.id = id;
    }

    pub fn source(&self) -> NodeId {
        self.node_pair.0
    }

    pub fn destination(&self) -> NodeId {
        self.node_pair.1
    }

    pub fn node_pair(&self) -> (NodeId, NodeId) {
        self.node_pair
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn set_length(&mut self, length: f64) -> NetResult<()> {
        if !(length > 0.0) {
            return Err(NetError::InvalidAttribute(format!(
                "street length must be positive (got {length})"
            )));
        }
        self.length = length;
        Ok(())
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn set_max_speed(&mut self, speed: f64) -> NetResult<()> {
        if !(speed > 0.0) {
            return Err(NetError::InvalidAttribute(format!(
                "street max speed must be positive (got {speed})"
            )));
        }
        self.max_speed = speed;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set the maximum number of agents the street can hold.  Rejects
    /// values below the current occupancy.
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

    /// Maximum number of agents that may leave this street per tick.
    pub fn transport_capacity(&self) -> usize {
        self.transport_capacity
    }

    pub fn set_transport_capacity(&mut self, capacity: usize) {
        self.transport_capacity = capacity;
    }

    /// Outbound heading in `[−π, π]`.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Set the heading directly.  Accepts `[−2π, 2π]` and normalizes into
    /// `[−π, π]`.
    pub fn set_angle(&mut self, angle: f64) -> NetResult<()> {
        if angle.abs() > 2.0 * PI {
            return Err(NetError::InvalidAttribute(format!(
                "street angle {angle} outside [-2π, 2π]"
            )));
        }
        self.angle = normalize_angle(angle);
        Ok(())
    }

    /// Set the heading from the endpoint coordinates: `atan2(Δlat, Δlon)`.
    pub fn set_angle_from_coords(&mut self, src: (f64, f64), dst: (f64, f64)) {
        self.angle = (dst.0 - src.0).atan2(dst.1 - src.1);
    }

    /// The turn angle onto a street with heading `outbound`, normalized to
    /// `[−π, π]`.
    pub fn turn_angle(&self, outbound: f64) -> f64 {
        normalize_angle(outbound - self.angle)
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    /// Agents on the street (transit + exit queue).
    pub fn occupancy(&self) -> usize {
        self.transit.len() + self.exit_queue.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity
    }

    /// Occupancy as a fraction of capacity, in `[0, 1]`.
    pub fn density(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.occupancy() as f64 / self.capacity as f64
    }

    /// Agents currently traversing, ascending by ID.
    pub fn transit(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.transit.iter().copied()
    }

    /// Agents waiting to hand off at the destination, FIFO.
    pub fn exit_queue(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.exit_queue.iter().copied()
    }

    pub fn transit_len(&self) -> usize {
        self.transit.len()
    }

    pub fn exit_len(&self) -> usize {
        self.exit_queue.len()
    }

    /// `true` if the agent is anywhere on this street.
    pub fn carries(&self, agent: AgentId) -> bool {
        self.transit.contains(&agent) || self.exit_queue.contains(&agent)
    }

    // ── Agent movement ────────────────────────────────────────────────────

    /// Admit an agent into the transit set.
    pub fn enter(&mut self, agent: AgentId) -> NetResult<()> {
        if self.is_full() {
            return Err(NetError::StreetFull { street: self.id, capacity: self.capacity });
        }
        if self.carries(agent) {
            return Err(NetError::AgentAlreadyOnStreet { agent, street: self.id });
        }
        self.transit.insert(agent);
        if let Some(spire) = &mut self.spire {
            spire.inputs += 1;
        }
        Ok(())
    }

    /// Move an agent from the transit set to the back of the exit queue.
    pub fn promote(&mut self, agent: AgentId) -> NetResult<()> {
        if !self.transit.remove(&agent) {
            return Err(NetError::AgentNotOnStreet { agent, street: self.id });
        }
        self.exit_queue.push_back(agent);
        Ok(())
    }

    /// Remove an agent from the exit queue (it has crossed the node).
    pub fn leave(&mut self, agent: AgentId) -> NetResult<()> {
        let pos = self
            .exit_queue
            .iter()
            .position(|&a| a == agent)
            .ok_or(NetError::AgentNotOnStreet { agent, street: self.id })?;
        self.exit_queue.remove(pos);
        if let Some(spire) = &mut self.spire {
            spire.outputs += 1;
        }
        Ok(())
    }

    // ── Spire instrumentation ─────────────────────────────────────────────

    /// Attach crossing counters.  Idempotent.
    pub fn make_spire(&mut self) {
        self.spire.get_or_insert_with(SpireCounters::default);
    }

    pub fn is_spire(&self) -> bool {
        self.spire.is_some()
    }

    /// Agents that entered since the last reset, then reset.
    pub fn take_input_count(&mut self) -> u32 {
        match &mut self.spire {
            Some(spire) => std::mem::take(&mut spire.inputs),
            None => 0,
        }
    }

    /// Agents that left since the last reset, then reset.
    pub fn take_output_count(&mut self) -> u32 {
        match &mut self.spire {
            Some(spire) => std::mem::take(&mut spire.outputs),
            None => 0,
        }
    }

    pub fn peek_input_count(&self) -> u32 {
        self.spire.map_or(0, |s| s.inputs)
    }

    pub fn peek_output_count(&self) -> u32 {
        self.spire.map_or(0, |s| s.outputs)
    }
}

/// Fold an angle into `[−π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}
