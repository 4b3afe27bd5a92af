//! Tunables for representation selection.
//!
//! All policy knobs live in [SelectorConfig], injected at [NatSet]
//! construction. There is no global state; two sets with different configs
//! coexist freely.
//!
//! [NatSet]: crate::NatSet

use crate::backend::Repr;

/// Expected mutation pattern, supplied as part of a [UsageHint].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MutationPattern {
    /// Indices arrive mostly in increasing order.
    AppendMostly,
    #[default]
    Random,
    /// Large sorted batches; favors the run-compressed representation.
    BulkBatch,
}

/// Construction-time usage hint.
///
/// Consumed once by the selector to pick the initial representation and
/// never stored — hints go stale, so later decisions use observed
/// statistics instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct UsageHint {
    /// Expected exclusive upper bound of inserted indices, if known.
    pub expected_max: Option<u32>,
    /// Expected fraction of `[0, expected_max)` that will be set, in (0, 1].
    pub expected_density: Option<f64>,
    pub mutation: MutationPattern,
}

impl UsageHint {
    /// Hint for a set over a known bound with a known fill fraction.
    pub fn bounded(expected_max: u32, expected_density: f64) -> Self {
        UsageHint {
            expected_max: Some(expected_max),
            expected_density: Some(expected_density),
            mutation: MutationPattern::default(),
        }
    }
}

/// Representation-selection tunables.
///
/// Defaults follow the originating heuristics (dense only for small, dense
/// ranges; recheck every `max(64, len/16)` mutations) and are policy, not
/// law — override freely.
#[derive(Clone, Copy, Debug)]
pub struct SelectorConfig {
    /// Forced representation. A pinned set never converts; capacity
    /// problems surface as [Error::Capacity] instead of falling back.
    ///
    /// [Error::Capacity]: crate::Error::Capacity
    pub pin: Option<Repr>,
    /// Largest bound (exclusive) for which the dense representation is
    /// considered.
    pub dense_max_bits: u32,
    /// Minimum density (cardinality / bound) for the dense representation.
    pub dense_min_density: f64,
    /// Density at or below which the compressed representation wins even
    /// without long runs.
    pub compressed_max_density: f64,
    /// Average run length at or above which the compressed representation
    /// wins.
    pub run_threshold: f64,
    /// Number of leading indices sampled for the run-length estimate.
    pub run_sample: usize,
    /// Dense allocations may not exceed this many bytes.
    pub memory_ceiling: usize,
    /// Minimum number of mutations between representation rechecks.
    pub batch_floor: u64,
    /// Recheck interval grows with cardinality: `max(batch_floor, len >> batch_shift)`.
    pub batch_shift: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            pin: None,
            dense_max_bits: 1 << 16,
            dense_min_density: 1.0 / 8.0,
            compressed_max_density: 1.0 / 1024.0,
            run_threshold: 8.0,
            run_sample: 1024,
            memory_ceiling: 16 << 20,
            batch_floor: 64,
            batch_shift: 4,
        }
    }
}

impl SelectorConfig {
    /// Config that pins the representation to `repr`.
    pub fn pinned(repr: Repr) -> Self {
        SelectorConfig {
            pin: Some(repr),
            ..SelectorConfig::default()
        }
    }

    /// Mutation count after which the next recheck runs, for a set of
    /// `len` elements.
    pub(crate) fn recheck_interval(&self, len: u64) -> u64 {
        self.batch_floor.max(len >> self.batch_shift)
    }

    /// Bits the dense representation may grow to under [Self::memory_ceiling].
    pub(crate) fn dense_ceiling_bits(&self) -> usize {
        self.memory_ceiling.saturating_mul(8)
    }
}
