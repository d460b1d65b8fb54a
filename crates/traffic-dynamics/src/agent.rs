//! `Agent` — a mobile entity following an itinerary.

use traffic_core::{AgentId, ItineraryId, NodeId, StreetId};

/// One vehicle moving through the network.
///
/// Agents are created by the engine at injection and destroyed on arrival
/// at their itinerary's destination.  They reference streets and nodes only
/// by ID.
#[derive(Clone, Debug)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) itinerary: ItineraryId,
    pub(crate) src_node: Option<NodeId>,
    pub(crate) street: Option<StreetId>,
    /// Outbound street chosen when the agent reached the end of its current
    /// street; consumed when it crosses the junction.
    pub(crate) next_street: Option<StreetId>,
    pub(crate) speed: f64,
    /// Remaining transit ticks on the current street.
    pub(crate) delay: u32,
    pub(crate) distance: f64,
    /// Ticks since creation.
    pub(crate) time: u64,
    /// Tick at which the agent entered its current street; an agent never
    /// advances on the tick it entered.
    pub(crate) entered_at: u64,
}

impl Agent {
    pub(crate) fn new(id: AgentId, itinerary: ItineraryId) -> Self {
        Self {
            id,
            itinerary,
            src_node: None,
            street: None,
            next_street: None,
            speed: 0.0,
            delay: 0,
            distance: 0.0,
            time: 0,
            entered_at: 0,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn itinerary(&self) -> ItineraryId {
        self.itinerary
    }

    /// The node the agent was injected at.
    pub fn src_node(&self) -> Option<NodeId> {
        self.src_node
    }

    /// The street the agent currently occupies.
    pub fn street(&self) -> Option<StreetId> {
        self.street
    }

    pub fn next_street(&self) -> Option<StreetId> {
        self.next_street
    }

    /// Current speed in m/s; 0 while waiting at a junction.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    /// Distance covered so far, in metres.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Ticks since creation.
    pub fn time(&self) -> u64 {
        self.time
    }
}
