//! Horner evaluation of polynomials and rational functions.
//!
//! Coefficients are in ascending order: `c[0] + c[1]*x + c[2]*x^2 + ...`.

use num_traits::Float;

#[inline]
fn horner<T: Float>(c: &[T], x: T) -> T {
    c.iter().rev().fold(T::zero(), |acc, &ci| acc * x + ci)
}

#[inline]
fn horner_reversed<T: Float>(c: &[T], x: T) -> T {
    c.iter().fold(T::zero(), |acc, &ci| acc * x + ci)
}

/// Evaluate a polynomial.
///
/// No coefficients gives `0`; a single coefficient is returned as is, even
/// when `x` is NaN.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::special::evalpoly;
///
/// assert_eq!(evalpoly(&[3.0, 2.0, 1.0], 10.0), 123.0);
/// assert_eq!(evalpoly(&[2.5], f64::NAN), 2.5);
/// ```
pub fn evalpoly<T: Float>(c: &[T], x: T) -> T {
    match c {
        [] => T::zero(),
        [c0] => *c0,
        _ => horner(c, x),
    }
}

/// A closure evaluating the polynomial with the given coefficients.
pub fn evalpoly_fn<T: Float>(c: impl Into<Vec<T>>) -> impl Fn(T) -> T {
    let c = c.into();
    move |x| evalpoly(&c, x)
}

/// Evaluate the rational function `P(x) / Q(x)`.
///
/// Empty or differently sized coefficient lists give NaN, single coefficients
/// give `p[0] / q[0]`. For `|x| > 1` both polynomials are evaluated in `1/x`
/// with reversed coefficients, which keeps the terms from overflowing.
pub fn evalrational<T: Float>(p: &[T], q: &[T], x: T) -> T {
    if p.is_empty() || p.len() != q.len() {
        return T::nan();
    }
    if p.len() == 1 {
        return p[0] / q[0];
    }
    if x.abs() <= T::one() {
        horner(p, x) / horner(q, x)
    } else {
        let y = x.recip();
        horner_reversed(p, y) / horner_reversed(q, y)
    }
}

/// A closure evaluating the rational function with the given coefficients.
pub fn evalrational_fn<T: Float>(p: impl Into<Vec<T>>, q: impl Into<Vec<T>>) -> impl Fn(T) -> T {
    let (p, q) = (p.into(), q.into());
    move |x| evalrational(&p, &q, x)
}
