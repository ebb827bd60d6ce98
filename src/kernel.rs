//! N-dimensional traversal engine.
//!
//! Planning runs once per call: loop order from the output's [`Order`], reorder
//! every array's strides into that order, drop unit levels, fuse levels that are
//! contiguous for every array, then pick cache block sizes. Traversal walks the
//! planned levels with carry-style offset updates: each level adds its stride
//! when it steps and subtracts `len * stride` when it wraps, so no element offset
//! is ever recomputed from a full multi-index.
//!
//! The engine has no failure modes of its own; it only forwards errors returned
//! by the block callback.

use std::convert::Infallible;

use crate::block::compute_block_sizes;
use crate::fuse::{compress_dims, fuse_dims};
use crate::order::Order;
use crate::Result;

/// A traversal plan: levels innermost first, with per-array strides and block sizes.
#[derive(Debug, Clone)]
pub(crate) struct KernelPlan {
    pub(crate) dims: Vec<usize>,
    pub(crate) strides: Vec<Vec<isize>>,
    pub(crate) blocks: Vec<usize>,
    num_arrays: usize,
}

impl KernelPlan {
    /// True when some level has length zero.
    pub(crate) fn is_empty(&self) -> bool {
        self.dims.contains(&0)
    }
}

/// Build a plan for arrays of a common `shape`.
///
/// Pipeline: order → reorder → compress → fuse → compress → block.
pub(crate) fn build_plan(
    shape: &[usize],
    strides_list: &[&[isize]],
    order: Order,
    elem_size: usize,
) -> KernelPlan {
    let num_arrays = strides_list.len();
    let loop_order = order.loop_order(shape.len());

    let ordered_dims: Vec<usize> = loop_order.iter().map(|&d| shape[d]).collect();
    let ordered_strides: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|strides| loop_order.iter().map(|&d| strides[d]).collect())
        .collect();

    let (dims, strides) = compress_dims(&ordered_dims, &ordered_strides);
    let fused = fuse_dims(&dims, &strides);
    let (dims, strides) = compress_dims(&fused, &strides);
    let blocks = compute_block_sizes(&dims, &strides, elem_size.max(1));

    log::trace!(
        "traversal plan: shape={:?} order={} -> dims={:?} blocks={:?}",
        shape,
        order,
        dims,
        blocks
    );

    KernelPlan {
        dims,
        strides,
        blocks,
        num_arrays,
    }
}

/// Drive `f(offsets, block_len, inner_strides)` over every innermost run.
///
/// `offsets` are relative to each array's base offset. An empty plan makes no
/// calls; a rank-0 plan makes exactly one call of length 1.
pub(crate) fn for_each_inner_block<E, F>(plan: &KernelPlan, mut f: F) -> std::result::Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize]) -> std::result::Result<(), E>,
{
    if plan.is_empty() {
        return Ok(());
    }
    let mut offsets = vec![0isize; plan.num_arrays];
    match plan.dims.len() {
        0 => {
            let inner = vec![0isize; plan.num_arrays];
            f(&offsets, 1, &inner)
        }
        1 => kernel_1d_inner(plan, &mut offsets, &mut f),
        2 => kernel_2d_inner(plan, &mut offsets, &mut f),
        3 => kernel_3d_inner(plan, &mut offsets, &mut f),
        _ => kernel_nd_inner(plan, &mut offsets, &mut f),
    }
}

/// [`for_each_inner_block`] for callbacks that cannot fail.
pub(crate) fn for_each_block<F>(plan: &KernelPlan, mut f: F)
where
    F: FnMut(&[isize], usize, &[isize]),
{
    let done = for_each_inner_block::<Infallible, _>(plan, |offsets, len, inner| {
        f(offsets, len, inner);
        Ok(())
    });
    match done {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

#[inline]
fn advance(offsets: &mut [isize], strides: &[Vec<isize>], level: usize, count: isize) {
    for (offset, s) in offsets.iter_mut().zip(strides) {
        *offset += count * s[level];
    }
}

#[inline]
fn inner_strides(strides: &[Vec<isize>]) -> Vec<isize> {
    strides.iter().map(|s| s[0]).collect()
}

#[inline]
fn block_of(plan: &KernelPlan, level: usize) -> usize {
    plan.blocks[level].clamp(1, plan.dims[level])
}

/// Single level: the whole run in block-sized pieces.
fn kernel_1d_inner<E, F>(
    plan: &KernelPlan,
    offsets: &mut [isize],
    f: &mut F,
) -> std::result::Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize]) -> std::result::Result<(), E>,
{
    let strides = &plan.strides;
    let d0 = plan.dims[0];
    let b0 = block_of(plan, 0);
    let inner = inner_strides(strides);

    let mut j0 = 0usize;
    while j0 < d0 {
        let len = b0.min(d0 - j0);
        f(offsets, len, &inner)?;
        advance(offsets, strides, 0, len as isize);
        j0 += len;
    }
    advance(offsets, strides, 0, -(d0 as isize));
    Ok(())
}

/// Two levels, tiled on both.
fn kernel_2d_inner<E, F>(
    plan: &KernelPlan,
    offsets: &mut [isize],
    f: &mut F,
) -> std::result::Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize]) -> std::result::Result<(), E>,
{
    let strides = &plan.strides;
    let (d0, d1) = (plan.dims[0], plan.dims[1]);
    let (b0, b1) = (block_of(plan, 0), block_of(plan, 1));
    let inner = inner_strides(strides);

    let mut j1 = 0usize;
    while j1 < d1 {
        let len1 = b1.min(d1 - j1);
        let mut j0 = 0usize;
        while j0 < d0 {
            let len0 = b0.min(d0 - j0);
            for _ in 0..len1 {
                f(offsets, len0, &inner)?;
                advance(offsets, strides, 1, 1);
            }
            // carry: rewind level 1, step level 0 to the next tile
            advance(offsets, strides, 1, -(len1 as isize));
            advance(offsets, strides, 0, len0 as isize);
            j0 += len0;
        }
        advance(offsets, strides, 0, -(d0 as isize));
        advance(offsets, strides, 1, len1 as isize);
        j1 += len1;
    }
    advance(offsets, strides, 1, -(d1 as isize));
    Ok(())
}

/// Three levels, tiled on all of them.
fn kernel_3d_inner<E, F>(
    plan: &KernelPlan,
    offsets: &mut [isize],
    f: &mut F,
) -> std::result::Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize]) -> std::result::Result<(), E>,
{
    let strides = &plan.strides;
    let (d0, d1, d2) = (plan.dims[0], plan.dims[1], plan.dims[2]);
    let (b0, b1, b2) = (block_of(plan, 0), block_of(plan, 1), block_of(plan, 2));
    let inner = inner_strides(strides);

    let mut j2 = 0usize;
    while j2 < d2 {
        let len2 = b2.min(d2 - j2);
        let mut j1 = 0usize;
        while j1 < d1 {
            let len1 = b1.min(d1 - j1);
            let mut j0 = 0usize;
            while j0 < d0 {
                let len0 = b0.min(d0 - j0);
                for _ in 0..len2 {
                    for _ in 0..len1 {
                        f(offsets, len0, &inner)?;
                        advance(offsets, strides, 1, 1);
                    }
                    advance(offsets, strides, 1, -(len1 as isize));
                    advance(offsets, strides, 2, 1);
                }
                advance(offsets, strides, 2, -(len2 as isize));
                advance(offsets, strides, 0, len0 as isize);
                j0 += len0;
            }
            advance(offsets, strides, 0, -(d0 as isize));
            advance(offsets, strides, 1, len1 as isize);
            j1 += len1;
        }
        advance(offsets, strides, 1, -(d1 as isize));
        advance(offsets, strides, 2, len2 as isize);
        j2 += len2;
    }
    advance(offsets, strides, 2, -(d2 as isize));
    Ok(())
}

/// Any rank: blocked innermost level, odometer over the outer levels.
fn kernel_nd_inner<E, F>(
    plan: &KernelPlan,
    offsets: &mut [isize],
    f: &mut F,
) -> std::result::Result<(), E>
where
    F: FnMut(&[isize], usize, &[isize]) -> std::result::Result<(), E>,
{
    let strides = &plan.strides;
    let dims = &plan.dims;
    let rank = dims.len();
    let d0 = dims[0];
    let b0 = block_of(plan, 0);
    let inner = inner_strides(strides);
    let mut idx = vec![0usize; rank];

    loop {
        let mut j0 = 0usize;
        while j0 < d0 {
            let len = b0.min(d0 - j0);
            f(offsets, len, &inner)?;
            advance(offsets, strides, 0, len as isize);
            j0 += len;
        }
        advance(offsets, strides, 0, -(d0 as isize));

        let mut level = 1usize;
        loop {
            advance(offsets, strides, level, 1);
            idx[level] += 1;
            if idx[level] < dims[level] {
                break;
            }
            idx[level] = 0;
            advance(offsets, strides, level, -(dims[level] as isize));
            level += 1;
            if level == rank {
                return Ok(());
            }
        }
    }
}

/// Check that every array has exactly `expected` as its shape.
pub(crate) fn ensure_same_shape(expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(crate::StridedError::ShapeMismatch(
            expected.to_vec(),
            actual.to_vec(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Collect every visited element offset for array `k`.
    fn visited(plan: &KernelPlan, k: usize) -> Vec<isize> {
        let mut out = Vec::new();
        for_each_block(plan, |offsets, len, inner| {
            for i in 0..len as isize {
                out.push(offsets[k] + i * inner[k]);
            }
        });
        out
    }

    #[test]
    fn test_plan_fuses_dense_row_major() {
        let plan = build_plan(&[4, 5, 6], &[&[30, 6, 1], &[30, 6, 1]], Order::RowMajor, 8);
        assert_eq!(plan.dims, vec![120]);
        assert_eq!(plan.strides, vec![vec![1], vec![1]]);
    }

    #[test]
    fn test_plan_column_major_loop_order() {
        // column-major: first dimension innermost
        let plan = build_plan(&[3, 4], &[&[1, 3]], Order::ColumnMajor, 8);
        assert_eq!(plan.dims, vec![12]);
        let plan = build_plan(&[3, 4], &[&[1, 5]], Order::ColumnMajor, 8);
        assert_eq!(plan.dims, vec![3, 4]);
        assert_eq!(plan.strides, vec![vec![1, 5]]);
    }

    #[test]
    fn test_plan_drops_unit_levels() {
        let plan = build_plan(&[1, 7, 1], &[&[99, 2, 5]], Order::RowMajor, 8);
        assert_eq!(plan.dims, vec![7]);
        assert_eq!(plan.strides, vec![vec![2]]);
    }

    #[test]
    fn test_zero_sized_makes_no_calls() {
        let plan = build_plan(&[3, 0, 2], &[&[2, 2, 1]], Order::RowMajor, 8);
        let mut calls = 0;
        for_each_block(&plan, |_, _, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_rank_zero_single_call() {
        let plan = build_plan(&[], &[&[], &[]], Order::RowMajor, 8);
        let mut calls = Vec::new();
        for_each_block(&plan, |offsets, len, inner| {
            calls.push((offsets.to_vec(), len, inner.to_vec()));
        });
        assert_eq!(calls, vec![(vec![0, 0], 1, vec![0, 0])]);
    }

    #[test]
    fn test_visits_each_offset_once() {
        for (shape, strides) in [
            (vec![5usize], vec![-3isize]),
            (vec![3, 4], vec![1, 7]),
            (vec![2, 3, 4], vec![40, -10, 2]),
            (vec![2, 2, 3, 2, 2], vec![100, 50, -10, 3, 1]),
        ] {
            let plan = build_plan(&shape, &[&strides], Order::RowMajor, 8);
            let offsets = visited(&plan, 0);
            let n: usize = shape.iter().product();
            assert_eq!(offsets.len(), n);
            let unique: BTreeSet<isize> = offsets.iter().copied().collect();
            assert_eq!(unique.len(), n, "shape {shape:?}");

            let mut expected = BTreeSet::new();
            for lin in 0..n {
                let mut rem = lin;
                let mut off = 0isize;
                for d in (0..shape.len()).rev() {
                    off += (rem % shape[d]) as isize * strides[d];
                    rem /= shape[d];
                }
                expected.insert(off);
            }
            assert_eq!(unique, expected);
        }
    }

    #[test]
    fn test_blocked_traversal_is_complete() {
        // large enough to force blocking on a transposed pair
        let shape = [300, 200];
        let plan = build_plan(&shape, &[&[200, 1], &[1, 300]], Order::RowMajor, 8);
        let offsets = visited(&plan, 1);
        assert_eq!(offsets.len(), 60_000);
        let unique: BTreeSet<isize> = offsets.into_iter().collect();
        assert_eq!(unique.len(), 60_000);
        assert_eq!(unique.iter().next_back(), Some(&59_999));
    }

    #[test]
    fn test_callback_error_propagates() {
        let plan = build_plan(&[4], &[&[1]], Order::RowMajor, 8);
        let res = for_each_inner_block(&plan, |_, _, _| Err(crate::StridedError::OffsetOverflow));
        assert!(res.is_err());
    }

    #[test]
    fn test_ensure_same_shape() {
        assert!(ensure_same_shape(&[2, 3], &[2, 3]).is_ok());
        assert!(matches!(
            ensure_same_shape(&[2, 3], &[3, 2]),
            Err(crate::StridedError::ShapeMismatch(_, _))
        ));
    }
}
