use fixedbitset::FixedBitSet;

use crate::backend::{Capabilities, Engine, Indices, Repr};
use crate::error::Error;
use crate::MAX_INDEX;

/// Dense adapter over a contiguous word-array bitset.
///
/// Grows amortized (doubling) up to `ceiling_bits`; anything beyond is a
/// capacity error, reported before any state changes.
#[derive(Clone)]
pub(crate) struct DenseBackend {
    bits: FixedBitSet,
    ceiling_bits: usize,
}

impl DenseBackend {
    pub(crate) fn new(ceiling_bits: usize) -> Self {
        DenseBackend {
            bits: FixedBitSet::new(),
            ceiling_bits,
        }
    }

    pub(crate) fn with_bits(bits: FixedBitSet, ceiling_bits: usize) -> Self {
        DenseBackend { bits, ceiling_bits }
    }

    pub(crate) fn bits(&self) -> &FixedBitSet {
        &self.bits
    }

    /// Pre-grows the word array when the final bound is known up front.
    pub(crate) fn reserve(&mut self, bits: usize) {
        let bits = bits.min(self.ceiling_bits);
        if bits > self.bits.len() {
            self.bits.grow(bits);
        }
    }

    fn limit(&self) -> u32 {
        self.ceiling_bits
            .saturating_sub(1)
            .min(MAX_INDEX as usize) as u32
    }
}

impl Engine for DenseBackend {
    #[inline]
    fn contains(&self, index: u32) -> bool {
        self.bits.contains(index as usize)
    }

    fn insert(&mut self, index: u32) -> Result<bool, Error> {
        let bit = index as usize;
        if bit >= self.ceiling_bits {
            return Err(Error::Capacity {
                repr: Repr::Dense,
                index,
                limit: self.limit(),
            });
        }
        if bit >= self.bits.len() {
            let grown = (bit + 1).max(self.bits.len() * 2).min(self.ceiling_bits);
            self.bits.grow(grown);
        }
        Ok(!self.bits.put(bit))
    }

    fn remove(&mut self, index: u32) -> bool {
        let bit = index as usize;
        if bit < self.bits.len() && self.bits.contains(bit) {
            self.bits.set(bit, false);
            true
        } else {
            false
        }
    }

    fn cardinality(&self) -> u64 {
        self.bits.count_ones(..) as u64
    }

    fn max_index(&self) -> Option<u32> {
        self.bits.ones().last().map(|bit| bit as u32)
    }

    fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    fn clear(&mut self) {
        self.bits.clear();
    }

    fn estimated_memory_bytes(&self) -> usize {
        self.bits.len().div_ceil(64) * 8
    }

    fn indices(&self) -> Indices<'_> {
        Indices::dense(self.bits.ones())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            max_index: self.limit(),
            fast_cardinality: false,
            serialization: false,
        }
    }

    fn export_bytes(&self) -> Result<Vec<u8>, Error> {
        Err(Error::CapabilityUnsupported {
            repr: Repr::Dense,
            capability: "serialization",
        })
    }
}
