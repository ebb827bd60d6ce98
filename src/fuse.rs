//! Loop-level simplification for the traversal planner.
//!
//! All functions here work on dimensions already placed in loop order,
//! innermost level first.

/// Drop size-1 levels, which contribute nothing to the traversal.
///
/// Zero-sized levels are kept so the caller can still detect an empty traversal.
pub(crate) fn compress_dims(
    dims: &[usize],
    strides_list: &[Vec<isize>],
) -> (Vec<usize>, Vec<Vec<isize>>) {
    let keep: Vec<usize> = (0..dims.len()).filter(|&i| dims[i] != 1).collect();
    let new_dims = keep.iter().map(|&i| dims[i]).collect();
    let new_strides = strides_list
        .iter()
        .map(|strides| keep.iter().map(|&i| strides[i]).collect())
        .collect();
    (new_dims, new_strides)
}

/// Fuse adjacent levels that are contiguous for every array.
///
/// Level `i` folds into the inner level `i - 1` when
/// `strides[k][i] == dims[i - 1] * strides[k][i - 1]` holds for all arrays `k`.
/// The fused outer level is left with size 1; strides are unchanged.
pub(crate) fn fuse_dims(dims: &[usize], strides_list: &[Vec<isize>]) -> Vec<usize> {
    let n = dims.len();
    let mut fused = dims.to_vec();
    if n <= 1 || strides_list.is_empty() {
        return fused;
    }

    for i in (1..n).rev() {
        let contiguous = strides_list
            .iter()
            .all(|s| s[i] == fused[i - 1] as isize * s[i - 1]);
        if contiguous {
            fused[i - 1] *= fused[i];
            fused[i] = 1;
        }
    }
    fused
}

/// Relative cost of each level for block reduction.
///
/// Uses the smallest absolute stride across arrays: zero maps to 1, anything
/// else to twice its magnitude.
pub(crate) fn compute_costs(strides_list: &[Vec<isize>]) -> Vec<isize> {
    let Some(first) = strides_list.first() else {
        return Vec::new();
    };
    (0..first.len())
        .map(|i| {
            let min = strides_list.iter().map(|s| s[i].abs()).min().unwrap_or(0);
            if min == 0 {
                1
            } else {
                min * 2
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuse_contiguous_column() {
        // 4x5 dense, innermost level first
        let dims = fuse_dims(&[4, 5], &[vec![1, 4]]);
        assert_eq!(dims, vec![20, 1]);
    }

    #[test]
    fn test_fuse_blocked_by_second_array() {
        let dims = fuse_dims(&[4, 5], &[vec![1, 4], vec![1, 8]]);
        assert_eq!(dims, vec![4, 5]);
    }

    #[test]
    fn test_fuse_partial_chain() {
        // levels 0 and 1 contiguous, level 2 padded
        let dims = fuse_dims(&[2, 3, 4], &[vec![1, 2, 10]]);
        assert_eq!(dims, vec![6, 1, 4]);
    }

    #[test]
    fn test_fuse_negative_strides() {
        let dims = fuse_dims(&[3, 2], &[vec![-1, -3]]);
        assert_eq!(dims, vec![6, 1]);
    }

    #[test]
    fn test_compress_dims() {
        let (dims, strides) = compress_dims(&[1, 4, 1, 0], &[vec![7, 1, 9, 4]]);
        assert_eq!(dims, vec![4, 0]);
        assert_eq!(strides, vec![vec![1, 4]]);
    }

    #[test]
    fn test_compute_costs() {
        let costs = compute_costs(&[vec![1, 0, -8], vec![2, 0, 4]]);
        assert_eq!(costs, vec![2, 1, 8]);
        assert!(compute_costs(&[]).is_empty());
    }
}
