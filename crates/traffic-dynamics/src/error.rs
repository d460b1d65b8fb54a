//! Engine error type.

use thiserror::Error;

use traffic_core::{AgentId, ItineraryId, MatrixError, NodeId};
use traffic_net::NetError;

/// Errors produced by the dynamics engine.
///
/// Every variant except `DemandRejected` is fatal to the tick that raised
/// it.  `DemandRejected` is the refusal to create an agent — the caller
/// (or the pending-demand queue) decides whether to retry.
#[derive(Debug, Error)]
pub enum DynamicsError {
    #[error("itinerary {0} already exists")]
    DuplicateItinerary(ItineraryId),

    #[error("itinerary {0} not found")]
    ItineraryNotFound(ItineraryId),

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("agent {0} has no current street")]
    AgentDetached(AgentId),

    #[error("agent {agent} is stranded at node {node} with no outgoing street")]
    DeadEnd { agent: AgentId, node: NodeId },

    #[error("demand from {from_node} for itinerary {itinerary} rejected")]
    DemandRejected { from_node: NodeId, itinerary: ItineraryId },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("graph has no adjacency; call build_adj before constructing the engine")]
    GraphNotReady,

    #[error("network error: {0}")]
    Net(#[from] NetError),

    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),
}

/// Shorthand result type for the dynamics engine.
pub type DynamicsResult<T> = Result<T, DynamicsError>;
