//! Level-1 BLAS routines over strided buffers.
//!
//! Every routine has a simple form, whose offsets are derived from the strides
//! (a negative stride starts at the last indexed element), and an `_ndarray`
//! form with explicit offsets. Sums accumulate strictly left to right in index
//! order, so results are reproducible bit for bit.
//!
//! These are raw kernels: they trust their arguments and panic if an index
//! falls outside a buffer. Use a [`Dispatcher`](crate::Dispatcher) or
//! [`check_range`](crate::view::check_range) for validated entry points.

use num_traits::Float;

use crate::view::stride_to_offset;

#[inline]
fn dot<T: Float>(n: usize, x: &[T], sx: isize, ox: usize, y: &[T], sy: isize, oy: usize) -> T {
    let mut sum = T::zero();
    let (mut ix, mut iy) = (ox as isize, oy as isize);
    for _ in 0..n {
        sum = sum + x[ix as usize] * y[iy as usize];
        ix += sx;
        iy += sy;
    }
    sum
}

#[inline]
fn scal<T: Float>(n: usize, alpha: T, x: &mut [T], sx: isize, ox: usize) {
    if n == 0 || alpha == T::one() {
        return;
    }
    let mut ix = ox as isize;
    for _ in 0..n {
        x[ix as usize] = x[ix as usize] * alpha;
        ix += sx;
    }
}

// ============================================================================
// Dot product
// ============================================================================

/// `Σ x[k] * y[k]` over `n` elements; `n == 0` gives 0.
///
/// # Panics
/// Panics if an indexed element lies outside its buffer.
pub fn ddot(n: usize, x: &[f64], stride_x: isize, y: &[f64], stride_y: isize) -> f64 {
    dot(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    )
}

pub fn ddot_ndarray(
    n: usize,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &[f64],
    stride_y: isize,
    offset_y: usize,
) -> f64 {
    dot(n, x, stride_x, offset_x, y, stride_y, offset_y)
}

/// Single-precision [`ddot`], accumulated in `f32`.
pub fn sdot(n: usize, x: &[f32], stride_x: isize, y: &[f32], stride_y: isize) -> f32 {
    dot(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    )
}

pub fn sdot_ndarray(
    n: usize,
    x: &[f32],
    stride_x: isize,
    offset_x: usize,
    y: &[f32],
    stride_y: isize,
    offset_y: usize,
) -> f32 {
    dot(n, x, stride_x, offset_x, y, stride_y, offset_y)
}

// ============================================================================
// Scaling
// ============================================================================

/// `x[k] *= alpha` in place, returning `x`.
///
/// `n == 0`, `stride <= 0` and `alpha == 1` leave `x` untouched.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::blas::dscal;
///
/// let mut x = [1.0, 2.0];
/// let out = dscal(2, 5.0, &mut x, 1);
/// assert_eq!(out, &[5.0, 10.0]);
/// ```
pub fn dscal(n: usize, alpha: f64, x: &mut [f64], stride: isize) -> &mut [f64] {
    if stride > 0 {
        scal(n, alpha, x, stride, 0);
    }
    x
}

/// [`dscal`] from an explicit offset; any stride, including negative and zero.
pub fn dscal_ndarray(n: usize, alpha: f64, x: &mut [f64], stride: isize, offset: usize) -> &mut [f64] {
    scal(n, alpha, x, stride, offset);
    x
}

pub fn sscal(n: usize, alpha: f32, x: &mut [f32], stride: isize) -> &mut [f32] {
    if stride > 0 {
        scal(n, alpha, x, stride, 0);
    }
    x
}

pub fn sscal_ndarray(n: usize, alpha: f32, x: &mut [f32], stride: isize, offset: usize) -> &mut [f32] {
    scal(n, alpha, x, stride, offset);
    x
}

// ============================================================================
// axpy / copy / swap
// ============================================================================

/// `y[k] += alpha * x[k]`, returning `y`. `alpha == 0` leaves `y` untouched.
pub fn daxpy<'y>(
    n: usize,
    alpha: f64,
    x: &[f64],
    stride_x: isize,
    y: &'y mut [f64],
    stride_y: isize,
) -> &'y mut [f64] {
    let (ox, oy) = (stride_to_offset(n, stride_x), stride_to_offset(n, stride_y));
    daxpy_ndarray(n, alpha, x, stride_x, ox, y, stride_y, oy)
}

#[allow(clippy::too_many_arguments)]
pub fn daxpy_ndarray<'y>(
    n: usize,
    alpha: f64,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &'y mut [f64],
    stride_y: isize,
    offset_y: usize,
) -> &'y mut [f64] {
    if n == 0 || alpha == 0.0 {
        return y;
    }
    let (mut ix, mut iy) = (offset_x as isize, offset_y as isize);
    for _ in 0..n {
        y[iy as usize] += alpha * x[ix as usize];
        ix += stride_x;
        iy += stride_y;
    }
    y
}

/// `y[k] = x[k]`, returning `y`.
pub fn dcopy<'y>(n: usize, x: &[f64], stride_x: isize, y: &'y mut [f64], stride_y: isize) -> &'y mut [f64] {
    let (ox, oy) = (stride_to_offset(n, stride_x), stride_to_offset(n, stride_y));
    dcopy_ndarray(n, x, stride_x, ox, y, stride_y, oy)
}

pub fn dcopy_ndarray<'y>(
    n: usize,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &'y mut [f64],
    stride_y: isize,
    offset_y: usize,
) -> &'y mut [f64] {
    let (mut ix, mut iy) = (offset_x as isize, offset_y as isize);
    for _ in 0..n {
        y[iy as usize] = x[ix as usize];
        ix += stride_x;
        iy += stride_y;
    }
    y
}

/// Exchange `x[k]` and `y[k]`.
pub fn dswap(n: usize, x: &mut [f64], stride_x: isize, y: &mut [f64], stride_y: isize) {
    let (ox, oy) = (stride_to_offset(n, stride_x), stride_to_offset(n, stride_y));
    dswap_ndarray(n, x, stride_x, ox, y, stride_y, oy);
}

pub fn dswap_ndarray(
    n: usize,
    x: &mut [f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
) {
    let (mut ix, mut iy) = (offset_x as isize, offset_y as isize);
    for _ in 0..n {
        std::mem::swap(&mut x[ix as usize], &mut y[iy as usize]);
        ix += stride_x;
        iy += stride_y;
    }
}

// ============================================================================
// Absolute sums
// ============================================================================

/// `Σ |x[k]|`; `n == 0` gives 0.
pub fn dasum(n: usize, x: &[f64], stride: isize) -> f64 {
    dasum_ndarray(n, x, stride, stride_to_offset(n, stride))
}

pub fn dasum_ndarray(n: usize, x: &[f64], stride: isize, offset: usize) -> f64 {
    let mut sum = 0.0;
    let mut ix = offset as isize;
    for _ in 0..n {
        sum += x[ix as usize].abs();
        ix += stride;
    }
    sum
}

/// `Σ |x[k]|` skipping NaN elements; `n == 0` gives 0.
///
/// With `n == 1` or `stride == 0` every access reads `x[offset]`, and the
/// result is `n * |x[offset]|` without a NaN check.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::blas::dnanasum;
///
/// assert_eq!(dnanasum(4, &[1.0, f64::NAN, -3.0, 4.0], 1), 8.0);
/// assert_eq!(dnanasum(3, &[-2.0, 9.0], 0), 6.0);
/// ```
pub fn dnanasum(n: usize, x: &[f64], stride: isize) -> f64 {
    dnanasum_ndarray(n, x, stride, stride_to_offset(n, stride))
}

pub fn dnanasum_ndarray(n: usize, x: &[f64], stride: isize, offset: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if n == 1 || stride == 0 {
        return n as f64 * x[offset].abs();
    }
    let mut sum = 0.0;
    let mut ix = offset as isize;
    for _ in 0..n {
        let v = x[ix as usize];
        if !v.is_nan() {
            sum += v.abs();
        }
        ix += stride;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddot_fixture() {
        // 8 + 12 + 3
        assert_eq!(ddot(3, &[4.0, 2.0, -3.0], 1, &[2.0, 6.0, -1.0], 1), 23.0);
        assert_eq!(ddot_ndarray(3, &[4.0, 2.0, -3.0], 1, 0, &[2.0, 6.0, -1.0], 1, 0), 23.0);
        let x = [4.0, 2.0, -3.0, 5.0, -1.0];
        let y = [2.0, 6.0, -1.0, -4.0, 8.0];
        assert_eq!(ddot(5, &x, 1, &y, 1), -5.0);
    }

    #[test]
    fn test_ddot_mirror() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [7.0, 8.0, 9.0, 10.0];
        // x[0], x[2], x[4] against y[2], y[1], y[0]
        let got = ddot_ndarray(3, &x, 2, 0, &y, -1, y.len() - 2);
        assert_eq!(got, 1.0 * 9.0 + 3.0 * 8.0 + 5.0 * 7.0);
        assert_eq!(ddot(3, &x, 2, &y[..3], -1), got);
    }

    #[test]
    fn test_ddot_empty_and_nan() {
        assert_eq!(ddot(0, &[], 1, &[], 1), 0.0);
        assert!(ddot(2, &[1.0, f64::NAN], 1, &[1.0, 1.0], 1).is_nan());
    }

    #[test]
    fn test_sdot() {
        assert_eq!(sdot(3, &[4.0, 2.0, -3.0], 1, &[2.0, 6.0, -1.0], 1), 23.0);
        assert_eq!(sdot_ndarray(2, &[1.0, 2.0, 3.0], -1, 2, &[1.0, 10.0], 1, 0), 23.0);
    }

    #[test]
    fn test_dscal_noop_cases() {
        let mut x = [1.0, 2.0];
        dscal(2, 5.0, &mut x, -1);
        assert_eq!(x, [1.0, 2.0]);
        dscal(0, 5.0, &mut x, 1);
        assert_eq!(x, [1.0, 2.0]);
        let mut y = [f64::NAN];
        dscal(1, 1.0, &mut y, 1);
        assert!(y[0].is_nan());
    }

    #[test]
    fn test_dscal_ndarray_negative_stride() {
        let mut x = [1.0, 2.0, 3.0, 4.0];
        dscal_ndarray(2, 2.0, &mut x, -2, 3);
        assert_eq!(x, [1.0, 4.0, 3.0, 8.0]);
        let mut y = [1.0f32, 2.0, 3.0];
        sscal(2, -1.0, &mut y, 2);
        assert_eq!(y, [-1.0, 2.0, -3.0]);
        sscal_ndarray(1, 3.0, &mut y, 1, 1);
        assert_eq!(y, [-1.0, 6.0, -3.0]);
    }

    #[test]
    fn test_daxpy_copy_swap() {
        let x = [1.0, 2.0, 3.0];
        let mut y = [10.0, 20.0, 30.0];
        daxpy(3, 2.0, &x, 1, &mut y, -1);
        assert_eq!(y, [16.0, 24.0, 32.0]);
        daxpy(3, 0.0, &[f64::NAN; 3], 1, &mut y, 1);
        assert_eq!(y, [16.0, 24.0, 32.0]);

        let mut z = [0.0; 5];
        dcopy(3, &x, 1, &mut z, 2);
        assert_eq!(z, [1.0, 0.0, 2.0, 0.0, 3.0]);
        dcopy_ndarray(2, &x, 1, 1, &mut z, 1, 0);
        assert_eq!(z, [2.0, 3.0, 2.0, 0.0, 3.0]);

        let mut a = [1.0, 2.0];
        let mut b = [3.0, 4.0];
        dswap(2, &mut a, 1, &mut b, -1);
        assert_eq!(a, [4.0, 3.0]);
        assert_eq!(b, [2.0, 1.0]);
        dswap_ndarray(1, &mut a, 1, 1, &mut b, 1, 0);
        assert_eq!(a, [4.0, 2.0]);
        assert_eq!(b, [3.0, 1.0]);
    }

    #[test]
    fn test_dasum() {
        assert_eq!(dasum(3, &[1.0, -2.0, 3.0], 1), 6.0);
        assert_eq!(dasum_ndarray(2, &[1.0, -2.0, 3.0, -4.0], 2, 1), 6.0);
        assert_eq!(dasum(0, &[], 1), 0.0);
    }

    #[test]
    fn test_dnanasum() {
        let x = [1.0, -2.0, f64::NAN, -4.0, 5.0, f64::NAN];
        assert_eq!(dnanasum(6, &x, 1), 12.0);
        assert_eq!(dnanasum(3, &x, 2), 6.0);
        assert_eq!(dnanasum(3, &x, -2), 6.0);
        assert_eq!(dnanasum_ndarray(2, &x, 3, 1), 7.0);
        assert_eq!(dnanasum(0, &x, 1), 0.0);
        // single element and zero stride skip the NaN check
        assert!(dnanasum_ndarray(1, &x, 1, 2).is_nan());
        assert!(dnanasum_ndarray(4, &x, 0, 2).is_nan());
        assert_eq!(dnanasum_ndarray(4, &x, 0, 1), 8.0);
    }
}
