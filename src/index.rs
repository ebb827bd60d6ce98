//! Conversions between subscripts, view linear indices and buffer indices.
//!
//! All routines take the N-d descriptor fields explicitly (`shape`, `strides`,
//! `offset`, `order`). An `offset` of zero is treated as a canonical layout:
//! subscripts map to `Σ |stride| * sub` and linear indices decompose by shape alone.

use crate::order::Order;
use crate::{Result, StridedError};

/// How an out-of-range index is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    /// Reject indices outside `[0, len)`.
    #[default]
    Throw,
    /// Wrap around modulo `len` (Euclidean, so `-1` maps to `len - 1`).
    Wrap,
    /// Clamp to `[0, len - 1]`.
    Clamp,
    /// Add `len` to negative indices, then reject anything still out of range.
    Normalize,
}

impl IndexMode {
    /// Resolve `idx` against a dimension of length `len`.
    ///
    /// `arg` identifies the dimension (or argument) in the error.
    pub fn resolve(self, idx: isize, len: usize, arg: usize) -> Result<usize> {
        let out_of_bounds = || StridedError::IndexOutOfBounds {
            arg,
            index: idx,
            len,
        };
        if len == 0 {
            return Err(out_of_bounds());
        }
        let n = len as isize;
        match self {
            IndexMode::Throw => {
                if idx < 0 || idx >= n {
                    return Err(out_of_bounds());
                }
                Ok(idx as usize)
            }
            IndexMode::Wrap => Ok(idx.rem_euclid(n) as usize),
            IndexMode::Clamp => Ok(idx.clamp(0, n - 1) as usize),
            IndexMode::Normalize => {
                let i = if idx < 0 { idx + n } else { idx };
                if i < 0 || i >= n {
                    return Err(out_of_bounds());
                }
                Ok(i as usize)
            }
        }
    }
}

/// Number of elements described by `shape` (1 for rank 0).
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Dense strides for `shape` laid out in `order`.
pub fn shape_to_strides(shape: &[usize], order: Order) -> Vec<isize> {
    let mut strides = vec![0isize; shape.len()];
    let mut acc = 1isize;
    for &d in order.loop_order(shape.len()).iter() {
        strides[d] = acc;
        acc *= shape[d].max(1) as isize;
    }
    strides
}

/// Buffer index of the first indexed element of a dense view whose negative
/// strides run backwards from the end.
pub fn strides_to_offset(shape: &[usize], strides: &[isize]) -> usize {
    shape
        .iter()
        .zip(strides)
        .filter(|(_, s)| **s < 0)
        .map(|(&d, &s)| d.saturating_sub(1) * s.unsigned_abs())
        .sum()
}

/// Convert subscripts into a buffer index.
///
/// `modes` is applied per dimension and cycles when shorter than the rank.
/// An empty `modes` slice means [`IndexMode::Throw`] everywhere.
pub fn sub2ind(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    subs: &[isize],
    modes: &[IndexMode],
) -> Result<usize> {
    if shape.len() != strides.len() {
        return Err(StridedError::StrideLengthMismatch);
    }
    if subs.len() != shape.len() {
        return Err(StridedError::RankMismatch(subs.len(), shape.len()));
    }
    let canonical = offset == 0;
    let mut idx = offset as isize;
    for (dim, ((&len, &stride), &sub)) in shape.iter().zip(strides).zip(subs).enumerate() {
        let mode = if modes.is_empty() {
            IndexMode::Throw
        } else {
            modes[dim % modes.len()]
        };
        let sub = mode.resolve(sub, len, dim)? as isize;
        if canonical {
            idx += sub * stride.abs();
        } else {
            idx += sub * stride;
        }
    }
    usize::try_from(idx).map_err(|_| StridedError::OffsetOverflow)
}

/// Convert a buffer index into subscripts.
///
/// With a non-zero `offset` the index is decomposed against the strides,
/// outermost dimension first in `order`; a negative stride counts back from the
/// end of its dimension.
pub fn ind2sub(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    order: Order,
    idx: isize,
    mode: IndexMode,
) -> Result<Vec<usize>> {
    if shape.len() != strides.len() {
        return Err(StridedError::StrideLengthMismatch);
    }
    let len = numel(shape);
    let mut rem = mode.resolve(idx, len, 0)? as isize;
    let rank = shape.len();
    let mut out = vec![0usize; rank];

    // Outermost first.
    let mut dims = order.loop_order(rank);
    dims.reverse();

    if offset == 0 {
        for &d in dims.iter().rev() {
            let n = shape[d] as isize;
            out[d] = (rem % n) as usize;
            rem /= n;
        }
        return Ok(out);
    }

    for &d in &dims {
        let s = strides[d];
        if s == 0 {
            continue;
        }
        let k = rem / s;
        rem -= k * s;
        out[d] = if s < 0 {
            (shape[d] as isize - 1 + k) as usize
        } else {
            k as usize
        };
    }
    Ok(out)
}

/// Convert a view linear index (in `order`) into a buffer index.
pub fn vind2bind(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    order: Order,
    idx: isize,
    mode: IndexMode,
) -> Result<usize> {
    if shape.len() != strides.len() {
        return Err(StridedError::StrideLengthMismatch);
    }
    let mut rem = mode.resolve(idx, numel(shape), 0)?;
    let mut ind = offset as isize;
    for d in order.loop_order(shape.len()) {
        let sub = rem % shape[d];
        rem /= shape[d];
        ind += sub as isize * strides[d];
    }
    usize::try_from(ind).map_err(|_| StridedError::IndexOutOfBounds {
        arg: 0,
        index: ind,
        len: numel(shape),
    })
}

/// Convert a buffer index into a view linear index (in `order`).
pub fn bind2vind(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    order: Order,
    idx: isize,
    mode: IndexMode,
) -> Result<usize> {
    let subs = ind2sub(shape, strides, offset, order, idx, mode)?;
    let mut vind = 0usize;
    let mut scale = 1usize;
    for d in order.loop_order(shape.len()) {
        vind += subs[d] * scale;
        scale *= shape[d];
    }
    Ok(vind)
}
