//! Backend-aware set algebra.
//!
//! Same-tag pairs run the engine's native operation (word-wise for dense,
//! hierarchy combinators for sparse, container ops for compressed). Mixed
//! pairs fall back to index streams: probe the smaller side for
//! intersection and difference, merge both ascending streams for union and
//! symmetric difference. The result's representation is the selector's
//! choice for the result's statistics, not either operand's tag.

use std::iter::Peekable;

use hibitset::{BitSet, BitSetAnd, BitSetLike, BitSetNot, BitSetOr, BitSetXor};

use crate::backend::{Backend, CompressedBackend, DenseBackend, SparseBackend};
use crate::config::SelectorConfig;
use crate::convert::{self, build_bounded};
use crate::error::Error;
use crate::selector::{average_run_len, ideal_repr};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SetOp {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

pub(crate) fn binary(
    op: SetOp,
    lhs: &Backend,
    rhs: &Backend,
    config: &SelectorConfig,
) -> Result<Backend, Error> {
    match (lhs, rhs) {
        (Backend::Dense(a), Backend::Dense(b)) => finalize(dense_op(op, a, b, config), config),
        (Backend::Sparse(a), Backend::Sparse(b)) => finalize(sparse_op(op, a, b), config),
        (Backend::Compressed(a), Backend::Compressed(b)) => {
            finalize(compressed_op(op, a, b), config)
        }
        _ => mixed(op, lhs, rhs, config),
    }
}

/// Word-wise operation on a clone of the left word array.
fn dense_op(op: SetOp, a: &DenseBackend, b: &DenseBackend, config: &SelectorConfig) -> Backend {
    let mut bits = a.bits().clone();
    match op {
        SetOp::Union => bits.union_with(b.bits()),
        SetOp::Intersection => bits.intersect_with(b.bits()),
        SetOp::Difference => bits.difference_with(b.bits()),
        SetOp::SymmetricDifference => bits.symmetric_difference_with(b.bits()),
    }
    Backend::Dense(DenseBackend::with_bits(bits, config.dense_ceiling_bits()))
}

/// Lazy hierarchy combinator, materialized once. Unallocated branches are
/// skipped by the combinator itself.
fn sparse_op(op: SetOp, a: &SparseBackend, b: &SparseBackend) -> Backend {
    let mut bits = BitSet::new();
    match op {
        SetOp::Union => {
            for index in BitSetOr(a.bits(), b.bits()).iter() {
                bits.add(index);
            }
        }
        SetOp::Intersection => {
            for index in BitSetAnd(a.bits(), b.bits()).iter() {
                bits.add(index);
            }
        }
        SetOp::Difference => {
            for index in BitSetAnd(a.bits(), BitSetNot(b.bits())).iter() {
                bits.add(index);
            }
        }
        SetOp::SymmetricDifference => {
            for index in BitSetXor(a.bits(), b.bits()).iter() {
                bits.add(index);
            }
        }
    }
    Backend::Sparse(SparseBackend::from_bits(bits))
}

/// Native operation on run descriptors, no decompression.
fn compressed_op(op: SetOp, a: &CompressedBackend, b: &CompressedBackend) -> Backend {
    let bitmap = match op {
        SetOp::Union => a.bitmap() | b.bitmap(),
        SetOp::Intersection => a.bitmap() & b.bitmap(),
        SetOp::Difference => a.bitmap() - b.bitmap(),
        SetOp::SymmetricDifference => a.bitmap() ^ b.bitmap(),
    };
    Backend::Compressed(CompressedBackend::from_bitmap(bitmap))
}

/// Re-materializes a natively computed result when its exact statistics
/// point at a different representation.
fn finalize(backend: Backend, config: &SelectorConfig) -> Result<Backend, Error> {
    let len = backend.cardinality();
    let max = backend.max_index();
    let runs = average_run_len(backend.indices(), config.run_sample);
    let ideal = ideal_repr(config, len, max, runs);
    if ideal == backend.tag() {
        Ok(backend)
    } else {
        convert::convert(&backend, ideal, config).map(|(fresh, _)| fresh)
    }
}

fn mixed(
    op: SetOp,
    lhs: &Backend,
    rhs: &Backend,
    config: &SelectorConfig,
) -> Result<Backend, Error> {
    let len_a = lhs.cardinality();
    let len_b = rhs.cardinality();
    let (est_len, est_max) = match op {
        SetOp::Union | SetOp::SymmetricDifference => {
            (len_a + len_b, lhs.max_index().max(rhs.max_index()))
        }
        SetOp::Intersection => (len_a.min(len_b), lhs.max_index().min(rhs.max_index())),
        SetOp::Difference => (len_a, lhs.max_index()),
    };
    let runs = average_run_len(lhs.indices(), config.run_sample)
        .max(average_run_len(rhs.indices(), config.run_sample));
    let target = ideal_repr(config, est_len, est_max, runs);
    match op {
        SetOp::Intersection => {
            let (small, large) = if len_a <= len_b { (lhs, rhs) } else { (rhs, lhs) };
            build_bounded(
                target,
                small.indices().filter(|&index| large.contains(index)),
                est_max,
                config,
            )
        }
        SetOp::Difference => build_bounded(
            target,
            lhs.indices().filter(|&index| !rhs.contains(index)),
            est_max,
            config,
        ),
        SetOp::Union => build_bounded(
            target,
            MergeAscending::union(lhs.indices(), rhs.indices()),
            est_max,
            config,
        ),
        SetOp::SymmetricDifference => build_bounded(
            target,
            MergeAscending::symmetric(lhs.indices(), rhs.indices()),
            est_max,
            config,
        ),
    }
}

/// `[0, bound)` minus the operand. The bound's validity against the
/// operand's maximum is checked by the facade.
pub(crate) fn complement_within(
    backend: &Backend,
    bound: u32,
    config: &SelectorConfig,
) -> Result<Backend, Error> {
    let len = bound as u64 - backend.cardinality();
    let est_max = if len == 0 { None } else { Some(bound - 1) };
    let target = ideal_repr(config, len, est_max, 1.0);
    build_bounded(
        target,
        ComplementAscending::new(backend.indices(), bound),
        est_max,
        config,
    )
}

/// Ascending merge of two strictly increasing streams. Emits common
/// indices once for union and drops them for symmetric difference.
struct MergeAscending<A: Iterator<Item = u32>, B: Iterator<Item = u32>> {
    a: Peekable<A>,
    b: Peekable<B>,
    keep_common: bool,
}

impl<A: Iterator<Item = u32>, B: Iterator<Item = u32>> MergeAscending<A, B> {
    fn union(a: A, b: B) -> Self {
        MergeAscending {
            a: a.peekable(),
            b: b.peekable(),
            keep_common: true,
        }
    }

    fn symmetric(a: A, b: B) -> Self {
        MergeAscending {
            a: a.peekable(),
            b: b.peekable(),
            keep_common: false,
        }
    }
}

impl<A: Iterator<Item = u32>, B: Iterator<Item = u32>> Iterator for MergeAscending<A, B> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            match (self.a.peek(), self.b.peek()) {
                (None, None) => return None,
                (Some(_), None) => return self.a.next(),
                (None, Some(_)) => return self.b.next(),
                (Some(&x), Some(&y)) => {
                    if x < y {
                        return self.a.next();
                    }
                    if y < x {
                        return self.b.next();
                    }
                    self.b.next();
                    if self.keep_common {
                        return self.a.next();
                    }
                    self.a.next();
                }
            }
        }
    }
}

/// Ascending iterator over the gaps of a member stream within `[0, bound)`.
struct ComplementAscending<I: Iterator<Item = u32>> {
    members: Peekable<I>,
    next: u32,
    bound: u32,
}

impl<I: Iterator<Item = u32>> ComplementAscending<I> {
    fn new(members: I, bound: u32) -> Self {
        ComplementAscending {
            members: members.peekable(),
            next: 0,
            bound,
        }
    }
}

impl<I: Iterator<Item = u32>> Iterator for ComplementAscending<I> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while self.next < self.bound {
            let candidate = self.next;
            self.next += 1;
            match self.members.peek() {
                Some(&member) if member == candidate => {
                    self.members.next();
                }
                _ => return Some(candidate),
            }
        }
        None
    }
}
