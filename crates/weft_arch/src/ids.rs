//! Opaque ID newtypes for arena-allocated fabric entities.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// A declared (possibly multi-tile) wire in a [`WireArena`](crate::WireArena).
    WireId
);

define_id!(
    /// A node (tile location plus wire name) in the [`RoutingGraph`](crate::RoutingGraph).
    NodeId
);

define_id!(
    /// A programmable or fixed connection in the [`RoutingGraph`](crate::RoutingGraph).
    PipId
);
