//! `Itinerary` — a destination plus its next-hop reachability matrix.

use traffic_core::{ItineraryId, NodeId, SparseMatrix};

/// A named destination with the boolean matrix of shortest-path next hops.
///
/// `path(u, v) = true` iff the street `u → v` lies on some minimum-cost
/// route from `u` to the destination.  The matrix is rebuilt wholesale by
/// [`Dynamics::update_paths`](crate::Dynamics::update_paths); between
/// rebuilds it is read-only, and an empty matrix means the destination is
/// currently unreachable (or paths were never computed).
#[derive(Clone, Debug)]
pub struct Itinerary {
    id: ItineraryId,
    destination: NodeId,
    path: SparseMatrix<bool>,
}

impl Itinerary {
    pub fn new(id: ItineraryId, destination: NodeId) -> Self {
        Self { id, destination, path: SparseMatrix::new(0, 0) }
    }

    pub fn id(&self) -> ItineraryId {
        self.id
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Change the destination.  The stale path matrix is cleared; call
    /// `update_paths` before spawning agents for this itinerary again.
    pub fn set_destination(&mut self, destination: NodeId) {
        self.destination = destination;
        self.path = SparseMatrix::new(0, 0);
    }

    pub fn path(&self) -> &SparseMatrix<bool> {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: SparseMatrix<bool>) {
        self.path = path;
    }
}
