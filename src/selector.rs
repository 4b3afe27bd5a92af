//! Representation selection policy.
//!
//! A state machine over the [Repr] choice, not over the data: the initial
//! state comes from construction-time hints, transitions come from
//! *observed* statistics (cardinality, max index, sampled run length)
//! recomputed every `max(batch_floor, len >> batch_shift)` mutations so
//! that conversion cost stays amortized and cannot thrash.

use log::trace;

use crate::backend::{Backend, Repr, SPARSE_MAX_INDEX};
use crate::config::{MutationPattern, SelectorConfig, UsageHint};
use crate::MAX_INDEX;

#[derive(Clone)]
pub(crate) struct Selector {
    config: SelectorConfig,
    /// Mutations since the last recheck.
    mutations: u64,
    /// Running cardinality, kept from mutation reports so the recheck
    /// interval never needs an O(n) backend query. Re-synced on recheck.
    stat_len: u64,
}

impl Selector {
    pub(crate) fn new(config: SelectorConfig) -> Self {
        Selector {
            config,
            mutations: 0,
            stat_len: 0,
        }
    }

    pub(crate) fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub(crate) fn initial(&self, hint: &UsageHint) -> Repr {
        initial_repr(&self.config, hint)
    }

    /// Reports one mutation; `added`/`removed` keep the running count.
    pub(crate) fn note(&mut self, changed: bool, added: bool) {
        self.mutations += 1;
        if changed {
            if added {
                self.stat_len += 1;
            } else {
                self.stat_len = self.stat_len.saturating_sub(1);
            }
        }
    }

    /// Reports a completed bulk insertion; the batch already made its own
    /// representation decision, so the mutation counter restarts.
    pub(crate) fn note_bulk(&mut self, added: u64) {
        self.stat_len += added;
        self.mutations = 0;
    }

    pub(crate) fn set_len(&mut self, len: u64) {
        self.stat_len = len;
    }

    pub(crate) fn due(&self) -> bool {
        self.mutations >= self.config.recheck_interval(self.stat_len)
    }

    /// Recomputes the ideal representation from observed statistics.
    /// Returns the target only when it differs from the current one.
    pub(crate) fn recheck(&mut self, backend: &Backend) -> Option<Repr> {
        self.mutations = 0;
        let len = backend.cardinality();
        self.stat_len = len;
        let max = backend.max_index();
        let runs = average_run_len(backend.indices(), self.config.run_sample);
        let ideal = ideal_repr(&self.config, len, max, runs);
        trace!(
            "recheck: len={len} max={max:?} avg_run={runs:.1} current={:?} ideal={ideal:?}",
            backend.tag(),
        );
        (ideal != backend.tag()).then_some(ideal)
    }

    /// Picks a representation that can hold `index` after the current one
    /// reported a capacity error. Tried once before the error surfaces;
    /// pinned sets never fall back.
    pub(crate) fn fallback_for(&self, index: u32, current: Repr) -> Option<Repr> {
        if self.config.pin.is_some() {
            return None;
        }
        [Repr::Sparse, Repr::Compressed]
            .into_iter()
            .find(|&repr| repr != current && can_hold(&self.config, repr, index))
    }
}

/// Whether `repr` can hold `index` under `config`'s capacity limits.
pub(crate) fn can_hold(config: &SelectorConfig, repr: Repr, index: u32) -> bool {
    index <= capacity_limit(config, repr)
}

pub(crate) fn capacity_limit(config: &SelectorConfig, repr: Repr) -> u32 {
    match repr {
        Repr::Dense => config
            .dense_ceiling_bits()
            .saturating_sub(1)
            .min(MAX_INDEX as usize) as u32,
        Repr::Sparse => SPARSE_MAX_INDEX,
        Repr::Compressed => MAX_INDEX,
    }
}

/// Initial representation from construction-time hints.
pub(crate) fn initial_repr(config: &SelectorConfig, hint: &UsageHint) -> Repr {
    if let Some(pin) = config.pin {
        return pin;
    }
    if hint.mutation == MutationPattern::BulkBatch {
        return Repr::Compressed;
    }
    if let Some(max) = hint.expected_max {
        let dense_fit = max < config.dense_max_bits && can_hold(config, Repr::Dense, max);
        let density = hint.expected_density;
        if dense_fit && density.map_or(false, |d| d >= config.dense_min_density) {
            return Repr::Dense;
        }
        if density.map_or(false, |d| d <= config.compressed_max_density)
            || max > SPARSE_MAX_INDEX
        {
            return Repr::Compressed;
        }
    } else if hint
        .expected_density
        .map_or(false, |d| d <= config.compressed_max_density)
    {
        return Repr::Compressed;
    }
    // Unknown shape: the sparse engine degrades most gracefully.
    Repr::Sparse
}

/// Ideal representation for a set with `len` elements, maximum index `max`
/// and sampled average run length `avg_run`.
pub(crate) fn ideal_repr(
    config: &SelectorConfig,
    len: u64,
    max: Option<u32>,
    avg_run: f64,
) -> Repr {
    if let Some(pin) = config.pin {
        return pin;
    }
    let Some(max) = max else {
        return Repr::Sparse;
    };
    let bound = max as u64 + 1;
    let density = len as f64 / bound as f64;
    if bound <= config.dense_max_bits as u64
        && density >= config.dense_min_density
        && can_hold(config, Repr::Dense, max)
    {
        Repr::Dense
    } else if avg_run >= config.run_threshold || density <= config.compressed_max_density {
        Repr::Compressed
    } else if max <= SPARSE_MAX_INDEX {
        Repr::Sparse
    } else {
        Repr::Compressed
    }
}

/// Average length of maximal consecutive runs over the first `sample`
/// indices of an ascending stream. Zero for an empty stream.
pub(crate) fn average_run_len(indices: impl Iterator<Item = u32>, sample: usize) -> f64 {
    let mut taken = 0u64;
    let mut runs = 0u64;
    let mut prev: Option<u32> = None;
    for index in indices.take(sample) {
        taken += 1;
        match prev {
            Some(p) if index == p + 1 => {}
            _ => runs += 1,
        }
        prev = Some(index);
    }
    if runs == 0 {
        0.0
    } else {
        taken as f64 / runs as f64
    }
}
