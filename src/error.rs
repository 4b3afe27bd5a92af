use std::io;

use crate::backend::Repr;

/// Errors reported by [NatSet] operations.
///
/// All mutating operations are all-or-nothing: when an error is returned,
/// the set is exactly as it was before the call.
///
/// [NatSet]: crate::NatSet
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Index outside the natural domain `[0, MAX_INDEX]`.
    ///
    /// [MAX_INDEX]: crate::MAX_INDEX
    #[error("index {index} is outside the natural domain [0, {limit}]")]
    Domain {
        index: u64,
        limit: u32,
    },

    /// Complement bound does not cover the set's maximum element.
    #[error("bound {bound} does not cover the set's maximum element {max_element}")]
    Bound {
        bound: u32,
        max_element: u32,
    },

    /// The representation cannot hold `index` within its capacity limits
    /// (dense memory ceiling, or the sparse engine's index range).
    ///
    /// Unpinned sets fall back to a representation that can hold the index
    /// before this error surfaces.
    #[error("{repr:?} representation cannot hold index {index} (limit {limit})")]
    Capacity {
        repr: Repr,
        index: u32,
        limit: u32,
    },

    /// An optional backend feature is absent. Non-fatal; capabilities are
    /// checkable in advance.
    #[error("{repr:?} representation does not support {capability}")]
    CapabilityUnsupported {
        repr: Repr,
        capability: &'static str,
    },

    /// Exporting through the backend's native serialization failed.
    #[error("serializing bitmap failed")]
    Serialize(#[source] io::Error),

    /// The byte stream is not a valid serialized bitmap.
    #[error("malformed serialized bitmap")]
    Deserialize(#[source] io::Error),
}
