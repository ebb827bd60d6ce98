//! Generic 1-D strided loops.
//!
//! Each loop validates every array against its buffer before the first write,
//! then walks `n` elements with one running index per array. The plain form
//! derives offsets from strides; the `_ndarray` form takes them explicitly.

use crate::view::{check_range, stride_to_offset};
use crate::Result;

#[inline]
fn step(idx: &mut isize, stride: isize) {
    *idx += stride;
}

/// `y[k] = f()` for `k in 0..n`.
pub fn nullary<U>(n: usize, y: &mut [U], stride_y: isize, f: impl FnMut() -> U) -> Result<()> {
    nullary_ndarray(n, y, stride_y, stride_to_offset(n, stride_y), f)
}

pub fn nullary_ndarray<U>(
    n: usize,
    y: &mut [U],
    stride_y: isize,
    offset_y: usize,
    mut f: impl FnMut() -> U,
) -> Result<()> {
    check_range(y.len(), n, stride_y, offset_y, 0)?;
    let mut iy = offset_y as isize;
    for _ in 0..n {
        y[iy as usize] = f();
        step(&mut iy, stride_y);
    }
    Ok(())
}

/// `y[k] = f(x[k])` for `k in 0..n`.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::strided;
///
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let mut y = [0.0; 4];
/// // every other element of `x`, written back to front
/// strided::unary(2, &x, 2, &mut y, -1, |v: f64| v * v).unwrap();
/// assert_eq!(y, [9.0, 1.0, 0.0, 0.0]);
/// ```
pub fn unary<T: Copy, U>(
    n: usize,
    x: &[T],
    stride_x: isize,
    y: &mut [U],
    stride_y: isize,
    f: impl FnMut(T) -> U,
) -> Result<()> {
    unary_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
        f,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn unary_ndarray<T: Copy, U>(
    n: usize,
    x: &[T],
    stride_x: isize,
    offset_x: usize,
    y: &mut [U],
    stride_y: isize,
    offset_y: usize,
    mut f: impl FnMut(T) -> U,
) -> Result<()> {
    check_range(x.len(), n, stride_x, offset_x, 0)?;
    check_range(y.len(), n, stride_y, offset_y, 1)?;
    let (mut ix, mut iy) = (offset_x as isize, offset_y as isize);
    for _ in 0..n {
        y[iy as usize] = f(x[ix as usize]);
        step(&mut ix, stride_x);
        step(&mut iy, stride_y);
    }
    Ok(())
}

/// `z[k] = f(x[k], y[k])` for `k in 0..n`.
#[allow(clippy::too_many_arguments)]
pub fn binary<A: Copy, B: Copy, U>(
    n: usize,
    x: &[A],
    stride_x: isize,
    y: &[B],
    stride_y: isize,
    z: &mut [U],
    stride_z: isize,
    f: impl FnMut(A, B) -> U,
) -> Result<()> {
    binary_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
        z,
        stride_z,
        stride_to_offset(n, stride_z),
        f,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn binary_ndarray<A: Copy, B: Copy, U>(
    n: usize,
    x: &[A],
    stride_x: isize,
    offset_x: usize,
    y: &[B],
    stride_y: isize,
    offset_y: usize,
    z: &mut [U],
    stride_z: isize,
    offset_z: usize,
    mut f: impl FnMut(A, B) -> U,
) -> Result<()> {
    check_range(x.len(), n, stride_x, offset_x, 0)?;
    check_range(y.len(), n, stride_y, offset_y, 1)?;
    check_range(z.len(), n, stride_z, offset_z, 2)?;
    let (mut ix, mut iy, mut iz) = (offset_x as isize, offset_y as isize, offset_z as isize);
    for _ in 0..n {
        z[iz as usize] = f(x[ix as usize], y[iy as usize]);
        step(&mut ix, stride_x);
        step(&mut iy, stride_y);
        step(&mut iz, stride_z);
    }
    Ok(())
}

/// `y[k] = f(x[k])` wherever `mask[k] == 0`; masked elements of `y` are left alone.
#[allow(clippy::too_many_arguments)]
pub fn mask_unary<T: Copy, U>(
    n: usize,
    x: &[T],
    stride_x: isize,
    mask: &[u8],
    stride_mask: isize,
    y: &mut [U],
    stride_y: isize,
    f: impl FnMut(T) -> U,
) -> Result<()> {
    mask_unary_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        mask,
        stride_mask,
        stride_to_offset(n, stride_mask),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
        f,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn mask_unary_ndarray<T: Copy, U>(
    n: usize,
    x: &[T],
    stride_x: isize,
    offset_x: usize,
    mask: &[u8],
    stride_mask: isize,
    offset_mask: usize,
    y: &mut [U],
    stride_y: isize,
    offset_y: usize,
    mut f: impl FnMut(T) -> U,
) -> Result<()> {
    check_range(x.len(), n, stride_x, offset_x, 0)?;
    check_range(mask.len(), n, stride_mask, offset_mask, 1)?;
    check_range(y.len(), n, stride_y, offset_y, 2)?;
    let (mut ix, mut im, mut iy) = (offset_x as isize, offset_mask as isize, offset_y as isize);
    for _ in 0..n {
        if mask[im as usize] == 0 {
            y[iy as usize] = f(x[ix as usize]);
        }
        step(&mut ix, stride_x);
        step(&mut im, stride_mask);
        step(&mut iy, stride_y);
    }
    Ok(())
}

/// Like [`binary`], but each input pair first goes through `access`.
///
/// `access(x_k, y_k, k)` returns the values handed to `f`, or `None` to leave
/// `z[k]` untouched.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::strided;
///
/// let x = [-1.0, -2.0, -3.0, -4.0, -5.0];
/// let y = [1.0, 1.0, 2.0, 2.0, 3.0];
/// let mut z = [0.0; 5];
/// strided::map_by2(5, &x, 1, &y, 1, &mut z, 1, |a, b| a + b, |a, b, _| Some((a * 2.0, b * 2.0)))
///     .unwrap();
/// assert_eq!(z, [0.0, -2.0, -2.0, -4.0, -4.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn map_by2<A: Copy, B: Copy, U>(
    n: usize,
    x: &[A],
    stride_x: isize,
    y: &[B],
    stride_y: isize,
    z: &mut [U],
    stride_z: isize,
    f: impl FnMut(A, B) -> U,
    access: impl FnMut(A, B, usize) -> Option<(A, B)>,
) -> Result<()> {
    map_by2_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
        z,
        stride_z,
        stride_to_offset(n, stride_z),
        f,
        access,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn map_by2_ndarray<A: Copy, B: Copy, U>(
    n: usize,
    x: &[A],
    stride_x: isize,
    offset_x: usize,
    y: &[B],
    stride_y: isize,
    offset_y: usize,
    z: &mut [U],
    stride_z: isize,
    offset_z: usize,
    mut f: impl FnMut(A, B) -> U,
    mut access: impl FnMut(A, B, usize) -> Option<(A, B)>,
) -> Result<()> {
    check_range(x.len(), n, stride_x, offset_x, 0)?;
    check_range(y.len(), n, stride_y, offset_y, 1)?;
    check_range(z.len(), n, stride_z, offset_z, 2)?;
    let (mut ix, mut iy, mut iz) = (offset_x as isize, offset_y as isize, offset_z as isize);
    for k in 0..n {
        if let Some((a, b)) = access(x[ix as usize], y[iy as usize], k) {
            z[iz as usize] = f(a, b);
        }
        step(&mut ix, stride_x);
        step(&mut iy, stride_y);
        step(&mut iz, stride_z);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StridedError;

    #[test]
    fn test_unary_negative_strides() {
        let x = [1, 2, 3, 4, 5, 6];
        let mut y = [0; 3];
        unary(3, &x, -2, &mut y, 1, |v| v * 10).unwrap();
        assert_eq!(y, [50, 30, 10]);
    }

    #[test]
    fn test_unary_ndarray_offsets() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let mut y = [0.0; 4];
        unary_ndarray(2, &x, 1, 2, &mut y, -2, 3, |v: f64| -v).unwrap();
        assert_eq!(y, [0.0, -4.0, 0.0, -3.0]);
    }

    #[test]
    fn test_zero_n_is_noop() {
        let x: [f64; 0] = [];
        let mut y = [9.0; 2];
        unary(0, &x, 1, &mut y, 1, |v| v).unwrap();
        assert_eq!(y, [9.0; 2]);
    }

    #[test]
    fn test_insufficient_elements_reported_before_write() {
        let x = [1.0, 2.0, 3.0];
        let mut y = [0.0; 2];
        let err = unary(3, &x, 1, &mut y, 1, |v| v).unwrap_err();
        assert!(matches!(
            err,
            StridedError::InsufficientElements { arg: 1, required: 3, actual: 2 }
        ));
        assert_eq!(y, [0.0; 2]);
    }

    #[test]
    fn test_binary_and_nullary() {
        let x = [1, 2, 3];
        let y = [10, 20, 30];
        let mut z = [0; 3];
        binary(3, &x, 1, &y, -1, &mut z, 1, |a, b| a + b).unwrap();
        assert_eq!(z, [31, 22, 13]);

        let mut w = [0u8; 5];
        let mut next = 0u8;
        nullary(3, &mut w, 2, || {
            next += 1;
            next
        })
        .unwrap();
        assert_eq!(w, [1, 0, 2, 0, 3]);
    }

    #[test]
    fn test_mask_unary_skips_masked() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let mask = [0, 1, 0, 0];
        let mut y = [-1.0; 4];
        mask_unary(4, &x, 1, &mask, 1, &mut y, 1, |v: f64| v.sqrt()).unwrap();
        assert_eq!(y, [1.0, -1.0, 3.0f64.sqrt(), 2.0]);
    }

    #[test]
    fn test_map_by2_skips_none() {
        let x = [1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0];
        let mut z = [0.0; 3];
        map_by2(3, &x, 1, &y, 1, &mut z, 1, |a, b| a * b, |a, b, k| {
            (k != 1).then_some((a, b))
        })
        .unwrap();
        assert_eq!(z, [1.0, 0.0, 3.0]);
    }
}
