use hibitset::{BitSet, BitSetLike};

use crate::backend::{Capabilities, Engine, Indices, Repr};
use crate::error::Error;

/// Largest index the hierarchical sparse engine can address
/// (four layers of 64-bit words).
pub(crate) const SPARSE_MAX_INDEX: u32 = (1 << 24) - 1;

/// Sparse adapter over a hierarchical bitset.
///
/// Layers grow lazily with the highest touched index. Indices above
/// [SPARSE_MAX_INDEX] are a capacity error; the selector falls back to the
/// compressed representation for those.
#[derive(Clone)]
pub(crate) struct SparseBackend {
    bits: BitSet,
}

impl SparseBackend {
    pub(crate) fn new() -> Self {
        SparseBackend { bits: BitSet::new() }
    }

    pub(crate) fn from_bits(bits: BitSet) -> Self {
        SparseBackend { bits }
    }

    pub(crate) fn bits(&self) -> &BitSet {
        &self.bits
    }
}

impl Engine for SparseBackend {
    #[inline]
    fn contains(&self, index: u32) -> bool {
        index <= SPARSE_MAX_INDEX && self.bits.contains(index)
    }

    fn insert(&mut self, index: u32) -> Result<bool, Error> {
        if index > SPARSE_MAX_INDEX {
            return Err(Error::Capacity {
                repr: Repr::Sparse,
                index,
                limit: SPARSE_MAX_INDEX,
            });
        }
        Ok(!self.bits.add(index))
    }

    fn remove(&mut self, index: u32) -> bool {
        index <= SPARSE_MAX_INDEX && self.bits.remove(index)
    }

    fn cardinality(&self) -> u64 {
        (&self.bits).iter().count() as u64
    }

    fn max_index(&self) -> Option<u32> {
        (&self.bits).iter().last()
    }

    fn is_empty(&self) -> bool {
        self.bits.layer3() == 0
    }

    fn clear(&mut self) {
        self.bits.clear();
    }

    fn estimated_memory_bytes(&self) -> usize {
        // data layer words plus the three index layers above it
        match self.max_index() {
            None => 32,
            Some(max) => {
                let data = (max as usize / 64 + 1) * 8;
                data + data / 64 + data / 4096 + 32
            }
        }
    }

    fn indices(&self) -> Indices<'_> {
        Indices::sparse((&self.bits).iter())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            max_index: SPARSE_MAX_INDEX,
            fast_cardinality: false,
            serialization: false,
        }
    }

    fn export_bytes(&self) -> Result<Vec<u8>, Error> {
        Err(Error::CapabilityUnsupported {
            repr: Repr::Sparse,
            capability: "serialization",
        })
    }
}
