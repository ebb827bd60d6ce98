use num_traits::Float;

/// Restrict `v` to `[min, max]`.
///
/// Any NaN argument gives NaN. Bounds are used as given: with `min > max` the
/// value is pulled toward whichever bound it crosses first (`min` is checked
/// first). Signed zeros order `-0 < +0`, so `clamp(-0.0, 0.0, 5.0)` is `+0`
/// and `clamp(-0.0, -0.0, 5.0)` is `-0`.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::special::clamp;
///
/// assert_eq!(clamp(7.0, 0.0, 5.0), 5.0);
/// assert!(clamp(-0.0f64, -0.0, 5.0).is_sign_negative());
/// assert!(clamp(0.0f64, -0.0, 5.0).is_sign_positive());
/// ```
pub fn clamp<T: Float>(v: T, min: T, max: T) -> T {
    if v.is_nan() || min.is_nan() || max.is_nan() {
        return T::nan();
    }
    if v < min {
        return min;
    }
    if v > max {
        return max;
    }
    let zero = T::zero();
    if v == zero {
        // +0 wins against a lower bound of zero, -0 against an upper bound
        if min == zero && min.is_sign_positive() {
            return min;
        }
        if max == zero && max.is_sign_negative() {
            return max;
        }
    }
    v
}

/// Single-precision [`clamp`].
pub fn clampf(v: f32, min: f32, max: f32) -> f32 {
    clamp(v, min, max)
}

#[inline]
fn positive_difference<T: Float>(x: T, y: T) -> T {
    if x.is_nan() || y.is_nan() {
        return T::nan();
    }
    if x > y {
        x - y
    } else {
        T::zero()
    }
}

/// Positive difference: `x - y` when `x > y`, otherwise `+0`. NaN in, NaN out.
pub fn pdiff(x: f64, y: f64) -> f64 {
    positive_difference(x, y)
}

/// Single-precision [`pdiff`].
pub fn pdifff(x: f32, y: f32) -> f32 {
    positive_difference(x, y)
}
