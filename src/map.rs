//! Element-wise operations over N-d views, driven by the traversal engine.

use std::mem::size_of;

use crate::index::{numel, shape_to_strides};
use crate::kernel::{build_plan, ensure_same_shape, for_each_block, KernelPlan};
use crate::order::Order;
use crate::view::{NdView, NdViewMut};
use crate::Result;

#[inline]
fn at(base: usize, offset: isize, k: usize, stride: isize) -> usize {
    (base as isize + offset + k as isize * stride) as usize
}

/// Plan a traversal, sizing cache blocks by the widest element involved.
fn plan_for(shape: &[usize], strides: &[&[isize]], order: Order, elem_sizes: &[usize]) -> KernelPlan {
    let widest = elem_sizes.iter().copied().max().unwrap_or(1);
    build_plan(shape, strides, order, widest)
}

/// Fill `out` with successive values of `f`.
pub fn nullary_into<U: Copy>(out: &mut NdViewMut<'_, U>, mut f: impl FnMut() -> U) -> Result<()> {
    let plan = plan_for(out.shape(), &[out.strides()], out.order(), &[size_of::<U>()]);
    let base = out.offset();
    let dst = out.data_mut();
    for_each_block(&plan, |offsets, len, inner| {
        for k in 0..len {
            dst[at(base, offsets[0], k, inner[0])] = f();
        }
    });
    Ok(())
}

/// `out[i] = f(x[i])` for every multi-index `i`.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::{unary_into, NdView, NdViewMut};
///
/// let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let x = NdView::row_major(&src, [2, 3]).unwrap();
/// let mut dst = [0.0; 6];
/// let mut out = NdViewMut::column_major(&mut dst, [2, 3]).unwrap();
///
/// unary_into(&x, &mut out, |v| v * 10.0).unwrap();
/// assert_eq!(dst, [10.0, 40.0, 20.0, 50.0, 30.0, 60.0]);
/// ```
pub fn unary_into<T: Copy, U: Copy>(
    x: &NdView<'_, T>,
    out: &mut NdViewMut<'_, U>,
    mut f: impl FnMut(T) -> U,
) -> Result<()> {
    ensure_same_shape(out.shape(), x.shape())?;
    let plan = plan_for(
        out.shape(),
        &[out.strides(), x.strides()],
        out.order(),
        &[size_of::<U>(), size_of::<T>()],
    );
    let (out_base, x_base) = (out.offset(), x.offset());
    let src = x.data();
    let dst = out.data_mut();
    for_each_block(&plan, |offsets, len, inner| {
        for k in 0..len {
            let v = src[at(x_base, offsets[1], k, inner[1])];
            dst[at(out_base, offsets[0], k, inner[0])] = f(v);
        }
    });
    Ok(())
}

/// `out[i] = f(x[i], y[i])` for every multi-index `i`.
pub fn binary_into<A: Copy, B: Copy, U: Copy>(
    x: &NdView<'_, A>,
    y: &NdView<'_, B>,
    out: &mut NdViewMut<'_, U>,
    mut f: impl FnMut(A, B) -> U,
) -> Result<()> {
    ensure_same_shape(out.shape(), x.shape())?;
    ensure_same_shape(out.shape(), y.shape())?;
    let plan = plan_for(
        out.shape(),
        &[out.strides(), x.strides(), y.strides()],
        out.order(),
        &[size_of::<U>(), size_of::<A>(), size_of::<B>()],
    );
    let (out_base, x_base, y_base) = (out.offset(), x.offset(), y.offset());
    let (xs, ys) = (x.data(), y.data());
    let dst = out.data_mut();
    for_each_block(&plan, |offsets, len, inner| {
        for k in 0..len {
            let a = xs[at(x_base, offsets[1], k, inner[1])];
            let b = ys[at(y_base, offsets[2], k, inner[2])];
            dst[at(out_base, offsets[0], k, inner[0])] = f(a, b);
        }
    });
    Ok(())
}

/// `out[i] = f(x[i])` wherever `mask[i] == 0`.
///
/// A non-zero mask entry marks the element as masked: `out[i]` keeps its value.
pub fn mask_unary_into<T: Copy, U: Copy>(
    x: &NdView<'_, T>,
    mask: &NdView<'_, u8>,
    out: &mut NdViewMut<'_, U>,
    mut f: impl FnMut(T) -> U,
) -> Result<()> {
    ensure_same_shape(out.shape(), x.shape())?;
    ensure_same_shape(out.shape(), mask.shape())?;
    let plan = plan_for(
        out.shape(),
        &[out.strides(), x.strides(), mask.strides()],
        out.order(),
        &[size_of::<U>(), size_of::<T>(), size_of::<u8>()],
    );
    let (out_base, x_base, m_base) = (out.offset(), x.offset(), mask.offset());
    let (xs, ms) = (x.data(), mask.data());
    let dst = out.data_mut();
    for_each_block(&plan, |offsets, len, inner| {
        for k in 0..len {
            if ms[at(m_base, offsets[2], k, inner[2])] != 0 {
                continue;
            }
            let v = xs[at(x_base, offsets[1], k, inner[1])];
            dst[at(out_base, offsets[0], k, inner[0])] = f(v);
        }
    });
    Ok(())
}

/// Copy the elements of `x` into a new vector, laid out densely in `x`'s order.
pub fn to_vec<T: Copy>(x: &NdView<'_, T>) -> Vec<T> {
    let len = numel(x.shape());
    if len == 0 {
        return Vec::new();
    }
    let mut buf = vec![x.data()[x.offset()]; len];
    let dense = shape_to_strides(x.shape(), x.order());
    let plan = plan_for(x.shape(), &[&dense, x.strides()], x.order(), &[size_of::<T>()]);
    let base = x.offset();
    let src = x.data();
    for_each_block(&plan, |offsets, len, inner| {
        for k in 0..len {
            buf[at(0, offsets[0], k, inner[0])] = src[at(base, offsets[1], k, inner[1])];
        }
    });
    buf
}
