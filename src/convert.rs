//! Conversion protocol between representations.
//!
//! Strictly build-then-swap: a fresh backend is fully populated from the
//! old backend's ascending index stream before the caller commits it into
//! the slot. A failed build leaves the original untouched, so conversion
//! errors never lose elements or leave a half-migrated set.

use log::debug;

use crate::backend::{Backend, CompressedBackend, DenseBackend, Repr, SparseBackend};
use crate::config::SelectorConfig;
use crate::error::Error;

/// Diagnostics for one completed conversion. Ephemeral; logged, returned
/// from explicit conversions, never stored.
#[derive(Clone, Copy, Debug)]
pub struct ConversionRecord {
    pub from: Repr,
    pub to: Repr,
    /// Elements migrated into the new backend.
    pub migrated: u64,
}

/// Fresh empty backend of the given representation.
pub(crate) fn empty(target: Repr, config: &SelectorConfig) -> Backend {
    match target {
        Repr::Dense => Backend::Dense(DenseBackend::new(config.dense_ceiling_bits())),
        Repr::Sparse => Backend::Sparse(SparseBackend::new()),
        Repr::Compressed => Backend::Compressed(CompressedBackend::new()),
    }
}

/// Builds a backend of representation `target` from an ascending,
/// duplicate-free index stream. `bound_hint` lets the dense engine size
/// its word array once instead of growing repeatedly.
pub(crate) fn build_bounded(
    target: Repr,
    indices: impl Iterator<Item = u32>,
    bound_hint: Option<u32>,
    config: &SelectorConfig,
) -> Result<Backend, Error> {
    let mut backend = empty(target, config);
    if let (Backend::Dense(dense), Some(max)) = (&mut backend, bound_hint) {
        dense.reserve(max as usize + 1);
    }
    for index in indices {
        backend.insert(index)?;
    }
    Ok(backend)
}

/// Loss-free migration: reads `old`, returns a fully populated replacement
/// and its [ConversionRecord]. `old` is never mutated; the caller swaps it
/// out (and thereby drops it) only on success.
pub(crate) fn convert(
    old: &Backend,
    target: Repr,
    config: &SelectorConfig,
) -> Result<(Backend, ConversionRecord), Error> {
    let fresh = build_bounded(target, old.indices(), old.max_index(), config)?;
    let record = ConversionRecord {
        from: old.tag(),
        to: target,
        migrated: fresh.cardinality(),
    };
    debug!(
        "converted {:?} -> {:?} ({} elements)",
        record.from, record.to, record.migrated,
    );
    Ok((fresh, record))
}
