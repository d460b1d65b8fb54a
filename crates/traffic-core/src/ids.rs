//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as `BTreeMap` keys
//! and sorted-collection elements without ceremony.  The inner integer is
//! `pub` for direct indexing into dense `Vec`s via `id.0 as usize`, but
//! callers should prefer the `.index()` helpers for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to `u32::MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Identifier of a road-network node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Identifier of a directed street.
    ///
    /// After a graph has fixed its node count `n`, street IDs use the
    /// canonical encoding `src·n + dst` (see [`StreetId::encode`]).
    pub struct StreetId(u32);
}

typed_id! {
    /// Identifier of a mobile agent.
    pub struct AgentId(u32);
}

typed_id! {
    /// Identifier of an itinerary (a destination plus its next-hop matrix).
    pub struct ItineraryId(u32);
}

impl StreetId {
    /// Canonical encoding of the street from `src` to `dst` in a graph of
    /// `n` nodes.  `n` is fixed at graph-construction time and must never
    /// change afterwards — the encoding bakes it into the ID space.
    #[inline]
    pub fn encode(src: NodeId, dst: NodeId, n: u32) -> StreetId {
        StreetId(src.0 * n + dst.0)
    }

    /// Recover the `(src, dst)` node pair from a canonical street ID.
    #[inline]
    pub fn decode(self, n: u32) -> (NodeId, NodeId) {
        (NodeId(self.0 / n), NodeId(self.0 % n))
    }
}
