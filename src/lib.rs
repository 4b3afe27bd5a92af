//! Adaptive sets of natural numbers.
//!
//! One facade, [NatSet], over three backing bitset representations:
//!
//! * dense — contiguous word array ([fixedbitset]), O(1) access, memory
//!   proportional to the bound;
//! * sparse — hierarchical bitset ([hibitset]), memory proportional to the
//!   touched range;
//! * compressed — roaring bitmap ([roaring]), memory proportional to
//!   content, native serialization.
//!
//! The facade exposes one contract over all of them and converts between
//! representations as the observed shape of the data changes, without ever
//! leaking representation-specific behavior: membership, cardinality,
//! iteration order, equality and hashing are identical on every path.
//!
//! # Selection
//!
//! The initial representation comes from an optional [UsageHint] (expected
//! bound, expected density, mutation pattern). From then on the selector
//! only trusts observed statistics, rechecked every `max(64, len/16)`
//! mutations by default. All thresholds are plain fields on
//! [SelectorConfig]; [SelectorConfig::pinned] disables adaptation
//! entirely.
//!
//! ```
//! use natset::{NatSet, Repr, SelectorConfig};
//!
//! // densely filled small range: converges onto the dense representation
//! let mut set = NatSet::new();
//! set.insert_all(0..10_000)?;
//! assert_eq!(set.repr(), Repr::Dense);
//!
//! // the representation is never observable through the contract
//! let mut pinned = NatSet::with_config(SelectorConfig::pinned(Repr::Compressed));
//! pinned.insert_all(0..10_000)?;
//! assert_eq!(set, pinned);
//! # Ok::<(), natset::Error>(())
//! ```
//!
//! # Set algebra
//!
//! [union], [intersection], [difference] and [symmetric_difference] (also
//! the `&`, `|`, `-` and `^` operators on `&NatSet`) pick the cheapest
//! evaluation per pair of representations: native word/container
//! operations for same-tag pairs, probe or merge over ascending index
//! streams for mixed pairs. The result's representation is chosen for the
//! result, not inherited.
//!
//! [union]: NatSet::union
//! [intersection]: NatSet::intersection
//! [difference]: NatSet::difference
//! [symmetric_difference]: NatSet::symmetric_difference
//!
//! # Concurrency
//!
//! None. A set is single-writer; concurrent readers are safe only while no
//! writer is active. All operations, conversions included, run to
//! completion on the calling thread.

#[cfg(test)]
mod test;

mod algebra;
mod backend;
pub mod config;
mod convert;
mod error;
mod selector;
mod set;

pub use backend::{Capabilities, Indices, Repr};
pub use config::{MutationPattern, SelectorConfig, UsageHint};
pub use convert::ConversionRecord;
pub use error::Error;
pub use set::NatSet;

/// Upper end of the natural domain: indices are `0..=MAX_INDEX`.
pub const MAX_INDEX: u32 = (1 << 31) - 1;
