//! Ready-made dispatchers.
//!
//! Each dispatcher registers specialized kernels for the common dtype
//! signatures and a generic fallback for everything else.

use crate::dispatch::{DispatchTable, Dispatcher, StridedArg, StridedArgMut};
use crate::dtype::{DType, Element};
use crate::special::{pdiff as pdiff64, pdifff};
use crate::Result;

/// Run `f` over `n` elements of one input and one output of fixed types.
fn unary_kernel<T: Element, U: Element>(
    n: usize,
    x: &[StridedArg<'_>],
    y: &mut [StridedArgMut<'_>],
    f: impl Fn(T) -> U,
) -> Result<()> {
    let xs = x[0].typed::<T>(n)?;
    let mut ys = y[0].typed_mut::<U>(n)?;
    for k in 0..n {
        ys.set(k, f(xs.get(k)));
    }
    Ok(())
}

fn binary_kernel<A: Element, B: Element, U: Element>(
    n: usize,
    x: &[StridedArg<'_>],
    y: &mut [StridedArgMut<'_>],
    f: impl Fn(A, B) -> U,
) -> Result<()> {
    let a = x[0].typed::<A>(n)?;
    let b = x[1].typed::<B>(n)?;
    let mut out = y[0].typed_mut::<U>(n)?;
    for k in 0..n {
        out.set(k, f(a.get(k), b.get(k)));
    }
    Ok(())
}

fn abs_f64(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    unary_kernel(n, x, y, f64::abs)
}

fn abs_f32(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    unary_kernel(n, x, y, f32::abs)
}

fn abs_i32(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    unary_kernel(n, x, y, i32::wrapping_abs)
}

/// Absolute value, one input and one output.
///
/// Specialized for `float64`, `float32` and `int32` same-type signatures.
pub fn abs() -> Dispatcher {
    let table = DispatchTable::builder()
        .entry([DType::Float64, DType::Float64], abs_f64)
        .entry([DType::Float32, DType::Float32], abs_f32)
        .entry([DType::Int32, DType::Int32], abs_i32)
        .fallback(|x, y| y[0] = x[0].abs())
        .build();
    Dispatcher::new("abs", 1, 1, table)
}

fn pdiff_f64(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    binary_kernel(n, x, y, pdiff64)
}

fn pdiff_f32(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    binary_kernel(n, x, y, pdifff)
}

/// Positive difference `max(x - y, +0)`, two inputs and one output.
pub fn pdiff() -> Dispatcher {
    let table = DispatchTable::builder()
        .entry([DType::Float64, DType::Float64, DType::Float64], pdiff_f64)
        .entry([DType::Float32, DType::Float32, DType::Float32], pdiff_f32)
        .fallback(|x, y| y[0] = pdiff64(x[0], x[1]))
        .build();
    Dispatcher::new("pdiff", 2, 1, table)
}

fn copy_f64(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    unary_kernel(n, x, y, |v: f64| v)
}

fn copy_f32(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    unary_kernel(n, x, y, |v: f32| v)
}

fn copy_f32_f64(n: usize, x: &[StridedArg<'_>], y: &mut [StridedArgMut<'_>]) -> Result<()> {
    unary_kernel(n, x, y, |v: f32| f64::from(v))
}

/// Element-wise copy with dtype conversion.
///
/// Conversions that have no specialized kernel go through `f64` with
/// `as`-cast semantics: float to integer saturates and NaN becomes 0.
pub fn copy() -> Dispatcher {
    let table = DispatchTable::builder()
        .entry([DType::Float64, DType::Float64], copy_f64)
        .entry([DType::Float32, DType::Float32], copy_f32)
        .entry([DType::Float32, DType::Float64], copy_f32_f64)
        .fallback(|x, y| y[0] = x[0])
        .build();
    Dispatcher::new("copy", 1, 1, table)
}
