//! Cache block sizes for the traversal engine.
//!
//! The tiling heuristic follows the blocking scheme of Julia's Strided.jl:
//! shrink the level with the largest stride-weighted cost until the tile fits.
//!
//! Block sizes are chosen so the memory touched by one tile of every array
//! fits in [`BLOCK_MEMORY_SIZE`]. Levels are assumed to be in loop order,
//! innermost first.

use crate::fuse::compute_costs;
use crate::{BLOCK_MEMORY_SIZE, CACHE_LINE_SIZE};

/// Compute block sizes for already-ordered levels.
///
/// # Arguments
/// * `dims` - level sizes, innermost first
/// * `strides_list` - per-array strides in the same level order
/// * `elem_size` - element size in bytes
pub(crate) fn compute_block_sizes(
    dims: &[usize],
    strides_list: &[Vec<isize>],
    elem_size: usize,
) -> Vec<usize> {
    if dims.is_empty() {
        return Vec::new();
    }

    let byte_strides: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|strides| strides.iter().map(|&s| s * elem_size as isize).collect())
        .collect();
    let stride_orders: Vec<Vec<usize>> = byte_strides.iter().map(|bs| stride_rank(bs)).collect();
    let costs = compute_costs(strides_list);

    let byte_refs: Vec<&[isize]> = byte_strides.iter().map(Vec::as_slice).collect();
    let order_refs: Vec<&[usize]> = stride_orders.iter().map(Vec::as_slice).collect();
    compute_blocks(dims, &costs, &byte_refs, &order_refs, BLOCK_MEMORY_SIZE)
}

/// Rank of each stride's magnitude among the non-zero strides (1 = smallest).
/// Zero strides rank 1.
fn stride_rank(strides: &[isize]) -> Vec<usize> {
    strides
        .iter()
        .map(|&si| {
            let si = si.unsigned_abs();
            if si == 0 {
                return 1;
            }
            1 + strides
                .iter()
                .filter(|&&s| s != 0 && s.unsigned_abs() < si)
                .count()
        })
        .collect()
}

fn compute_blocks(
    dims: &[usize],
    costs: &[isize],
    byte_strides: &[&[isize]],
    stride_orders: &[&[usize]],
    block_size: usize,
) -> Vec<usize> {
    let n = dims.len();
    if n == 0 {
        return Vec::new();
    }

    if total_memory_region(dims, byte_strides) <= block_size {
        return dims.to_vec();
    }

    // Innermost level already has the smallest stride everywhere: keep it whole
    // and block the rest.
    let min_order = stride_orders
        .iter()
        .filter_map(|orders| orders.iter().min().copied())
        .min()
        .unwrap_or(1);
    if stride_orders
        .iter()
        .all(|orders| !orders.is_empty() && orders[0] == min_order)
    {
        let tail_strides: Vec<&[isize]> = byte_strides.iter().map(|s| &s[1..]).collect();
        let tail_orders: Vec<&[usize]> = stride_orders.iter().map(|s| &s[1..]).collect();
        let mut blocks = vec![dims[0]];
        blocks.extend(compute_blocks(
            &dims[1..],
            &costs[1..],
            &tail_strides,
            &tail_orders,
            block_size,
        ));
        return blocks;
    }

    let min_stride = byte_strides
        .iter()
        .filter_map(|s| s.iter().map(|x| x.unsigned_abs()).min())
        .min()
        .unwrap_or(0);
    if min_stride > block_size {
        return vec![1; n];
    }

    let mut blocks = dims.to_vec();

    // Halve the costliest level until within 2x of the target...
    while total_memory_region(&blocks, byte_strides) >= 2 * block_size {
        match last_argmax_weighted(&blocks, costs) {
            Some(i) => blocks[i] = (blocks[i] + 1) / 2,
            None => break,
        }
    }
    // ...then shave one at a time.
    while total_memory_region(&blocks, byte_strides) > block_size {
        match last_argmax_weighted(&blocks, costs) {
            Some(i) => blocks[i] -= 1,
            None => break,
        }
    }

    blocks
}

/// Bytes touched by a tile of `dims`, counted in cache lines.
///
/// Strides below a cache line extend a contiguous run; larger strides multiply
/// the number of separate runs.
fn total_memory_region(dims: &[usize], byte_strides: &[&[isize]]) -> usize {
    let mut region = 0usize;
    for strides in byte_strides {
        let mut contiguous = 0usize;
        let mut runs = 1usize;
        for (&d, &s) in dims.iter().zip(strides.iter()) {
            let s = s.unsigned_abs();
            if s < CACHE_LINE_SIZE {
                contiguous += d.saturating_sub(1) * s;
            } else {
                runs = runs.saturating_mul(d);
            }
        }
        let lines = contiguous / CACHE_LINE_SIZE + 1;
        region = region.saturating_add(CACHE_LINE_SIZE * lines * runs);
    }
    region
}

/// Last index maximising `(blocks[i] - 1) * costs[i]`, skipping unit blocks.
fn last_argmax_weighted(blocks: &[usize], costs: &[isize]) -> Option<usize> {
    let mut best = 0isize;
    let mut best_idx = None;
    for (i, (&b, &c)) in blocks.iter().zip(costs).enumerate() {
        if b <= 1 {
            continue;
        }
        let score = (b as isize - 1) * c;
        if score >= best {
            best = score;
            best_idx = Some(i);
        }
    }
    best_idx
}
