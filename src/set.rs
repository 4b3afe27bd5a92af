use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitAnd, BitOr, BitXor, Sub};

use log::warn;

use crate::algebra::{self, SetOp};
use crate::backend::{Backend, Capabilities, CompressedBackend, Indices, Repr};
use crate::config::{SelectorConfig, UsageHint};
use crate::convert::{self, ConversionRecord};
use crate::error::Error;
use crate::selector::{self, Selector};
use crate::MAX_INDEX;

/// Adaptive set of naturals.
///
/// One uniform contract over three representations (see [Repr]); the
/// active one is an implementation detail. Membership, cardinality,
/// iteration order, equality and hashing never depend on it.
///
/// Mutations are reported to the selector, which may migrate the set to a
/// better-fitting representation, synchronously and transparently, at an
/// amortized interval (see [SelectorConfig]). All conversions are
/// build-then-swap: a failed conversion leaves the set exactly as it was.
///
/// Not safe for concurrent mutation; single writer, external
/// synchronization for readers.
///
/// ```
/// use natset::NatSet;
///
/// let mut set = NatSet::new();
/// set.insert(2)?;
/// set.insert(1_000_000)?;
/// set.insert(5)?;
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 5, 1_000_000]);
/// # Ok::<(), natset::Error>(())
/// ```
#[derive(Clone)]
pub struct NatSet {
    backend: Backend,
    selector: Selector,
}

impl NatSet {
    pub fn new() -> Self {
        Self::with_hint_and_config(UsageHint::default(), SelectorConfig::default())
    }

    pub fn with_hint(hint: UsageHint) -> Self {
        Self::with_hint_and_config(hint, SelectorConfig::default())
    }

    pub fn with_config(config: SelectorConfig) -> Self {
        Self::with_hint_and_config(UsageHint::default(), config)
    }

    /// The hint is consumed here and not retained; later representation
    /// decisions use observed statistics only.
    pub fn with_hint_and_config(hint: UsageHint, config: SelectorConfig) -> Self {
        let selector = Selector::new(config);
        let backend = convert::empty(selector.initial(&hint), selector.config());
        NatSet { backend, selector }
    }

    fn wrap(&self, backend: Backend) -> NatSet {
        let mut selector = Selector::new(*self.selector.config());
        selector.set_len(backend.cardinality());
        NatSet { backend, selector }
    }

    /// The currently active representation.
    pub fn repr(&self) -> Repr {
        self.backend.tag()
    }

    /// Capability flags of the active representation.
    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    /// Exact cardinality. O(1) where the backend caches it (see
    /// [Capabilities::fast_cardinality]), otherwise a scan.
    pub fn len(&self) -> u64 {
        self.backend.cardinality()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Membership test. Indices outside the natural domain are simply not
    /// contained.
    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        index <= MAX_INDEX && self.backend.contains(index)
    }

    pub fn first(&self) -> Option<u32> {
        self.backend.indices().next()
    }

    pub fn last(&self) -> Option<u32> {
        self.backend.max_index()
    }

    /// Ascending iterator over the contained indices.
    pub fn iter(&self) -> Indices<'_> {
        self.backend.indices()
    }

    /// Approximate footprint of the active backend.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.backend.estimated_memory_bytes()
    }

    fn check_domain(index: u32) -> Result<(), Error> {
        if index > MAX_INDEX {
            return Err(Error::Domain {
                index: index as u64,
                limit: MAX_INDEX,
            });
        }
        Ok(())
    }

    /// Inserts `index`, reporting whether the set changed. Idempotent.
    ///
    /// When the active representation cannot hold the index, an unpinned
    /// set migrates once to one that can before the error would surface.
    pub fn insert(&mut self, index: u32) -> Result<bool, Error> {
        Self::check_domain(index)?;
        let changed = match self.backend.insert(index) {
            Ok(changed) => changed,
            Err(Error::Capacity { repr, index, limit }) => {
                match self.selector.fallback_for(index, self.backend.tag()) {
                    Some(target) => {
                        self.migrate(target)?;
                        self.backend.insert(index)?
                    }
                    None => return Err(Error::Capacity { repr, index, limit }),
                }
            }
            Err(err) => return Err(err),
        };
        self.selector.note(changed, true);
        self.maybe_convert();
        Ok(changed)
    }

    /// Removes `index`, reporting whether the set changed.
    pub fn remove(&mut self, index: u32) -> Result<bool, Error> {
        Self::check_domain(index)?;
        let changed = self.backend.remove(index);
        self.selector.note(changed, false);
        self.maybe_convert();
        Ok(changed)
    }

    /// Bulk insertion. The batch is sorted and deduplicated once, one
    /// representation decision is made up front, and no conversion happens
    /// mid-batch. Returns the number of newly added indices.
    pub fn insert_all<I: IntoIterator<Item = u32>>(&mut self, indices: I) -> Result<u64, Error> {
        let mut batch: Vec<u32> = indices.into_iter().collect();
        batch.sort_unstable();
        batch.dedup();
        let Some(&batch_max) = batch.last() else {
            return Ok(0);
        };
        Self::check_domain(batch_max)?;

        let config = *self.selector.config();
        let est_len = self.len() + batch.len() as u64;
        let est_max = self.last().map_or(batch_max, |max| max.max(batch_max));
        let runs = selector::average_run_len(batch.iter().copied(), config.run_sample);
        let target = selector::ideal_repr(&config, est_len, Some(est_max), runs);
        if !selector::can_hold(&config, target, batch_max) {
            // pinned onto a representation that cannot take the batch
            return Err(Error::Capacity {
                repr: target,
                index: batch_max,
                limit: selector::capacity_limit(&config, target),
            });
        }
        if target != self.backend.tag() {
            self.migrate(target)?;
        }

        let mut added = 0;
        for index in batch {
            if self.backend.insert(index)? {
                added += 1;
            }
        }
        self.selector.note_bulk(added);
        Ok(added)
    }

    pub fn clear(&mut self) {
        self.backend.clear();
        self.selector.set_len(0);
    }

    /// Migrates to `target`, loss-free. No-op when already there.
    pub fn convert_to(&mut self, target: Repr) -> Result<Option<ConversionRecord>, Error> {
        if target == self.backend.tag() {
            return Ok(None);
        }
        self.migrate_recorded(target).map(Some)
    }

    /// Re-selects the representation from current statistics immediately,
    /// without waiting for the amortized recheck.
    pub fn compact(&mut self) -> Result<Option<ConversionRecord>, Error> {
        match self.selector.recheck(&self.backend) {
            Some(target) => self.migrate_recorded(target).map(Some),
            None => Ok(None),
        }
    }

    /// Whether the active representation offers native serialization.
    pub fn supports_serialization(&self) -> bool {
        self.backend.capabilities().serialization
    }

    /// Serializes through the backend's native format. Check
    /// [Self::supports_serialization] first; absence is
    /// [Error::CapabilityUnsupported], not corruption.
    pub fn export_bytes(&self) -> Result<Vec<u8>, Error> {
        self.backend.export_bytes()
    }

    /// Rebuilds a set from [Self::export_bytes] output. The result is
    /// compressed-backed (the only representation with native
    /// serialization) until adaptation moves it.
    pub fn import_bytes(bytes: &[u8]) -> Result<NatSet, Error> {
        let backend = Backend::Compressed(CompressedBackend::import_bytes(bytes)?);
        let mut selector = Selector::new(SelectorConfig::default());
        selector.set_len(backend.cardinality());
        Ok(NatSet { backend, selector })
    }

    pub fn union(&self, other: &NatSet) -> NatSet {
        self.combine(SetOp::Union, other)
    }

    pub fn intersection(&self, other: &NatSet) -> NatSet {
        self.combine(SetOp::Intersection, other)
    }

    /// Relative complement `self \ other`.
    pub fn difference(&self, other: &NatSet) -> NatSet {
        self.combine(SetOp::Difference, other)
    }

    pub fn symmetric_difference(&self, other: &NatSet) -> NatSet {
        self.combine(SetOp::SymmetricDifference, other)
    }

    /// `[0, bound)` minus self.
    ///
    /// Fails with [Error::Bound] when `bound` does not cover the set's
    /// maximum element, and with [Error::Domain] when `bound` exceeds the
    /// natural domain.
    pub fn complement_within(&self, bound: u32) -> Result<NatSet, Error> {
        if bound as u64 > MAX_INDEX as u64 + 1 {
            return Err(Error::Domain {
                index: bound as u64,
                limit: MAX_INDEX,
            });
        }
        if let Some(max) = self.last() {
            if bound <= max {
                return Err(Error::Bound {
                    bound,
                    max_element: max,
                });
            }
        }
        let backend = algebra::complement_within(&self.backend, bound, self.selector.config())?;
        Ok(self.wrap(backend))
    }

    /// The result's representation is the selector's choice for the
    /// result, not necessarily either operand's; its config is inherited
    /// from `self`.
    ///
    /// # Panics
    ///
    /// When `self`'s config pins a representation that cannot hold the
    /// result.
    fn combine(&self, op: SetOp, other: &NatSet) -> NatSet {
        match algebra::binary(op, &self.backend, &other.backend, self.selector.config()) {
            Ok(backend) => self.wrap(backend),
            Err(err) => panic!("set operation result exceeds the pinned representation: {err}"),
        }
    }

    fn migrate(&mut self, target: Repr) -> Result<(), Error> {
        self.migrate_recorded(target).map(|_| ())
    }

    fn migrate_recorded(&mut self, target: Repr) -> Result<ConversionRecord, Error> {
        let (fresh, record) = convert::convert(&self.backend, target, self.selector.config())?;
        self.backend = fresh;
        self.selector.set_len(record.migrated);
        Ok(record)
    }

    /// Amortized recheck after a mutation. A failed opportunistic
    /// conversion is not an operation failure: the set stays valid in its
    /// prior representation, so it is logged and the mutation's result
    /// stands.
    fn maybe_convert(&mut self) {
        if !self.selector.due() {
            return;
        }
        if let Some(target) = self.selector.recheck(&self.backend) {
            if let Err(err) = self.migrate(target) {
                warn!(
                    "staying on {:?}, switch to {target:?} failed: {err}",
                    self.backend.tag(),
                );
            }
        }
    }
}

impl Default for NatSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Content equality: same indices, regardless of representation.
impl PartialEq for NatSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for NatSet {}

impl Hash for NatSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for index in self.iter() {
            state.write_u32(index);
        }
        state.write_u64(self.len());
    }
}

impl FromIterator<u32> for NatSet {
    /// # Panics
    ///
    /// When an index is outside the natural domain.
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = NatSet::new();
        if let Err(err) = set.insert_all(iter) {
            panic!("{err}");
        }
        set
    }
}

impl<'a> IntoIterator for &'a NatSet {
    type Item = u32;
    type IntoIter = Indices<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl BitOr for &NatSet {
    type Output = NatSet;

    fn bitor(self, rhs: Self) -> NatSet {
        self.union(rhs)
    }
}

impl BitAnd for &NatSet {
    type Output = NatSet;

    fn bitand(self, rhs: Self) -> NatSet {
        self.intersection(rhs)
    }
}

impl Sub for &NatSet {
    type Output = NatSet;

    fn sub(self, rhs: Self) -> NatSet {
        self.difference(rhs)
    }
}

impl BitXor for &NatSet {
    type Output = NatSet;

    fn bitxor(self, rhs: Self) -> NatSet {
        self.symmetric_difference(rhs)
    }
}
