//! Opaque id newtypes for graph entities.

use crate::arena::ArenaId;
use serde::Serialize;
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Id of a module in the module graph.
    ModuleId,
    "m"
);

define_id!(
    /// Id of a chunk in the chunk graph.
    ChunkId,
    "c"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip() {
        assert_eq!(ModuleId::from_raw(5).as_raw(), 5);
        assert_eq!(ChunkId::from_raw(9).as_raw(), 9);
    }

    #[test]
    fn debug_is_prefixed() {
        assert_eq!(format!("{:?}", ModuleId::from_raw(3)), "m3");
        assert_eq!(format!("{:?}", ChunkId::from_raw(0)), "c0");
    }

    #[test]
    fn ordering_follows_index() {
        assert!(ChunkId::from_raw(1) < ChunkId::from_raw(2));
    }
}
