//! Backend adapters: one capability contract over three external engines.
//!
//! Each adapter normalizes one engine to the [Engine] contract. The
//! [Backend] slot holds exactly one adapter at a time; all selection is
//! explicit dispatch on the [Repr] tag, there is no dual bookkeeping.

mod compressed;
mod dense;
mod sparse;

pub(crate) use compressed::CompressedBackend;
pub(crate) use dense::DenseBackend;
pub(crate) use sparse::SparseBackend;
pub(crate) use sparse::SPARSE_MAX_INDEX;

use crate::error::Error;

/// Identifies which representation currently backs a [NatSet].
///
/// [NatSet]: crate::NatSet
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Repr {
    /// Contiguous word array; O(1) access, memory proportional to the bound.
    Dense,
    /// Hierarchical bitset allocating lazily; memory proportional to the
    /// touched range.
    Sparse,
    /// Run/array/bitmap containers; memory proportional to content, not range.
    Compressed,
}

/// Capability flags of a backend instance.
#[derive(Clone, Copy, Debug)]
pub struct Capabilities {
    /// Largest index this instance can ever hold.
    pub max_index: u32,
    /// Whether [cardinality] is O(1) rather than a scan.
    ///
    /// [cardinality]: crate::NatSet::len
    pub fast_cardinality: bool,
    /// Whether native byte serialization is available.
    pub serialization: bool,
}

/// The capability contract shared by all three adapters.
pub(crate) trait Engine {
    fn contains(&self, index: u32) -> bool;

    /// Idempotent; reports whether the set changed.
    fn insert(&mut self, index: u32) -> Result<bool, Error>;

    /// Reports whether the set changed.
    fn remove(&mut self, index: u32) -> bool;

    /// Exact count.
    fn cardinality(&self) -> u64;

    fn max_index(&self) -> Option<u32>;

    fn is_empty(&self) -> bool;

    fn clear(&mut self);

    /// Approximate, used only by selection heuristics.
    fn estimated_memory_bytes(&self) -> usize;

    /// Strictly ascending, duplicate-free, restartable.
    fn indices(&self) -> Indices<'_>;

    fn capabilities(&self) -> Capabilities;

    fn export_bytes(&self) -> Result<Vec<u8>, Error>;
}

/// The facade's single owned backend slot.
///
/// Conversion replaces the whole slot ("build new, swap, drop old"); an
/// adapter instance is never aliased by two sets.
#[derive(Clone)]
pub(crate) enum Backend {
    Dense(DenseBackend),
    Sparse(SparseBackend),
    Compressed(CompressedBackend),
}

macro_rules! dispatch {
    ($self:expr, $engine:pat => $body:expr) => {
        match $self {
            Backend::Dense($engine) => $body,
            Backend::Sparse($engine) => $body,
            Backend::Compressed($engine) => $body,
        }
    };
}

impl Backend {
    pub(crate) fn tag(&self) -> Repr {
        match self {
            Backend::Dense(_) => Repr::Dense,
            Backend::Sparse(_) => Repr::Sparse,
            Backend::Compressed(_) => Repr::Compressed,
        }
    }

    pub(crate) fn contains(&self, index: u32) -> bool {
        dispatch!(self, engine => engine.contains(index))
    }

    pub(crate) fn insert(&mut self, index: u32) -> Result<bool, Error> {
        dispatch!(self, engine => engine.insert(index))
    }

    pub(crate) fn remove(&mut self, index: u32) -> bool {
        dispatch!(self, engine => engine.remove(index))
    }

    pub(crate) fn cardinality(&self) -> u64 {
        dispatch!(self, engine => engine.cardinality())
    }

    pub(crate) fn max_index(&self) -> Option<u32> {
        dispatch!(self, engine => engine.max_index())
    }

    pub(crate) fn is_empty(&self) -> bool {
        dispatch!(self, engine => engine.is_empty())
    }

    pub(crate) fn clear(&mut self) {
        dispatch!(self, engine => engine.clear())
    }

    pub(crate) fn estimated_memory_bytes(&self) -> usize {
        dispatch!(self, engine => engine.estimated_memory_bytes())
    }

    pub(crate) fn indices(&self) -> Indices<'_> {
        dispatch!(self, engine => engine.indices())
    }

    pub(crate) fn capabilities(&self) -> Capabilities {
        dispatch!(self, engine => engine.capabilities())
    }

    pub(crate) fn export_bytes(&self) -> Result<Vec<u8>, Error> {
        dispatch!(self, engine => engine.export_bytes())
    }
}

/// Ascending iterator over a set's indices.
///
/// Unifies the engines' native iterators behind one type, so iteration
/// order and item type never depend on the active representation.
pub struct Indices<'a>(Inner<'a>);

enum Inner<'a> {
    Dense(fixedbitset::Ones<'a>),
    Sparse(hibitset::BitIter<&'a hibitset::BitSet>),
    Compressed(roaring::bitmap::Iter<'a>),
}

impl<'a> Indices<'a> {
    pub(crate) fn dense(ones: fixedbitset::Ones<'a>) -> Self {
        Indices(Inner::Dense(ones))
    }

    pub(crate) fn sparse(iter: hibitset::BitIter<&'a hibitset::BitSet>) -> Self {
        Indices(Inner::Sparse(iter))
    }

    pub(crate) fn compressed(iter: roaring::bitmap::Iter<'a>) -> Self {
        Indices(Inner::Compressed(iter))
    }
}

impl Iterator for Indices<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        match &mut self.0 {
            Inner::Dense(ones) => ones.next().map(|bit| bit as u32),
            Inner::Sparse(iter) => iter.next(),
            Inner::Compressed(iter) => iter.next(),
        }
    }
}
