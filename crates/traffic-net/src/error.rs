//! Network-subsystem error type.

use thiserror::Error;

use traffic_core::{AgentId, MatrixError, NodeId, StreetId};

/// Errors produced by `traffic-net`.
///
/// The state variants (`NodeFull`, `StreetFull`, `AgentAlreadyAtNode`,
/// `AgentAlreadyOnStreet`, `EmptyRoundabout`, `LightUnconfigured`) signal
/// misuse of the container contracts — the dynamics engine treats them as
/// tick-aborting programming errors, never as recoverable conditions.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("street {0} already exists")]
    DuplicateStreet(StreetId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("street {0} not found")]
    StreetNotFound(StreetId),

    #[error("no route from {from} to {to}")]
    Unreachable { from: NodeId, to: NodeId },

    #[error("node {node} is full (capacity {capacity})")]
    NodeFull { node: NodeId, capacity: usize },

    #[error("street {street} is full (capacity {capacity})")]
    StreetFull { street: StreetId, capacity: usize },

    #[error("agent {agent} is already waiting at node {node}")]
    AgentAlreadyAtNode { agent: AgentId, node: NodeId },

    #[error("agent {agent} is already on street {street}")]
    AgentAlreadyOnStreet { agent: AgentId, street: StreetId },

    #[error("agent {agent} is not at node {node}")]
    AgentNotAtNode { agent: AgentId, node: NodeId },

    #[error("agent {agent} is not on street {street}")]
    AgentNotOnStreet { agent: AgentId, street: StreetId },

    #[error("roundabout {0} is empty")]
    EmptyRoundabout(NodeId),

    #[error("traffic light {0} has no green/red delay configured")]
    LightUnconfigured(NodeId),

    #[error("node {0} is not an intersection")]
    NotIntersection(NodeId),

    #[error("node {0} is not a roundabout")]
    NotRoundabout(NodeId),

    #[error("capacity {requested} is below the current occupancy {occupancy}")]
    CapacityBelowOccupancy { requested: usize, occupancy: usize },

    #[error("invalid street attribute: {0}")]
    InvalidAttribute(String),

    #[error("node id {id} exceeds the node count {count}; canonical street ids need dense 0..n ids")]
    SparseNodeIds { id: NodeId, count: usize },

    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `traffic-net`.
pub type NetResult<T> = Result<T, NetError>;
