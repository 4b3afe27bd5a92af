use roaring::RoaringBitmap;

use crate::backend::{Capabilities, Engine, Indices};
use crate::error::Error;
use crate::MAX_INDEX;

/// Compressed adapter over a roaring bitmap.
///
/// Covers the whole natural domain, keeps an O(1) cardinality, and is the
/// only representation with native serialization. Restarting its iterator
/// re-decodes run containers, which the selector treats as acceptable for
/// amortized rechecks.
#[derive(Clone)]
pub(crate) struct CompressedBackend {
    bitmap: RoaringBitmap,
}

impl CompressedBackend {
    pub(crate) fn new() -> Self {
        CompressedBackend {
            bitmap: RoaringBitmap::new(),
        }
    }

    pub(crate) fn from_bitmap(bitmap: RoaringBitmap) -> Self {
        CompressedBackend { bitmap }
    }

    pub(crate) fn bitmap(&self) -> &RoaringBitmap {
        &self.bitmap
    }

    pub(crate) fn import_bytes(bytes: &[u8]) -> Result<Self, Error> {
        RoaringBitmap::deserialize_from(bytes)
            .map(Self::from_bitmap)
            .map_err(Error::Deserialize)
    }
}

impl Engine for CompressedBackend {
    #[inline]
    fn contains(&self, index: u32) -> bool {
        self.bitmap.contains(index)
    }

    fn insert(&mut self, index: u32) -> Result<bool, Error> {
        Ok(self.bitmap.insert(index))
    }

    fn remove(&mut self, index: u32) -> bool {
        self.bitmap.remove(index)
    }

    fn cardinality(&self) -> u64 {
        self.bitmap.len()
    }

    fn max_index(&self) -> Option<u32> {
        self.bitmap.max()
    }

    fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    fn clear(&mut self) {
        self.bitmap.clear();
    }

    fn estimated_memory_bytes(&self) -> usize {
        self.bitmap.serialized_size()
    }

    fn indices(&self) -> Indices<'_> {
        Indices::compressed(self.bitmap.iter())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            max_index: MAX_INDEX,
            fast_cardinality: true,
            serialization: true,
        }
    }

    fn export_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::with_capacity(self.bitmap.serialized_size());
        self.bitmap
            .serialize_into(&mut buffer)
            .map_err(Error::Serialize)?;
        Ok(buffer)
    }
}
