//! Strided buffer descriptors.
//!
//! [`StridedSlice`] / [`StridedSliceMut`] describe `len` elements of a borrowed
//! buffer reached by `offset + k * stride`. Constructing one never checks bounds;
//! [`StridedSlice::validate`] does, and the dispatch layer calls it before any
//! kernel runs.
//!
//! [`NdView`] / [`NdViewMut`] extend this to a shape, per-dimension strides and a
//! memory [`Order`]. Their constructors validate that every reachable index lies
//! inside the buffer.

use crate::index::{numel, shape_to_strides};
use crate::order::Order;
use crate::{Result, StridedError};

/// Starting offset for the simple calling convention.
///
/// A negative stride walks the buffer backwards, so iteration starts at the
/// last indexed element: `(1 - n) * stride`.
#[inline]
pub fn stride_to_offset(n: usize, stride: isize) -> usize {
    if stride < 0 && n > 0 {
        (n - 1) * stride.unsigned_abs()
    } else {
        0
    }
}

/// Check that `n` elements at `offset + k * stride` fit in a buffer of `buf_len`.
///
/// `arg` names the offending argument in the error.
pub fn check_range(buf_len: usize, n: usize, stride: isize, offset: usize, arg: usize) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    let span = (n as isize - 1)
        .checked_mul(stride)
        .ok_or(StridedError::OffsetOverflow)?;
    let last = (offset as isize)
        .checked_add(span)
        .ok_or(StridedError::OffsetOverflow)?;
    let (lo, hi) = if stride >= 0 {
        (offset as isize, last)
    } else {
        (last, offset as isize)
    };
    if lo < 0 {
        return Err(StridedError::IndexOutOfBounds {
            arg,
            index: lo,
            len: buf_len,
        });
    }
    if hi as usize >= buf_len {
        return Err(StridedError::InsufficientElements {
            arg,
            required: hi as usize + 1,
            actual: buf_len,
        });
    }
    Ok(())
}

/// Check that every index reachable by an N-d view lies inside the buffer.
pub(crate) fn check_nd_range(
    buf_len: usize,
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    arg: usize,
) -> Result<()> {
    if shape.len() != strides.len() {
        return Err(StridedError::StrideLengthMismatch);
    }
    if shape.contains(&0) {
        return Ok(());
    }

    let mut min_offset = offset as isize;
    let mut max_offset = offset as isize;
    for (&d, &s) in shape.iter().zip(strides) {
        let reach = s
            .checked_mul(d as isize - 1)
            .ok_or(StridedError::OffsetOverflow)?;
        if s >= 0 {
            max_offset = max_offset
                .checked_add(reach)
                .ok_or(StridedError::OffsetOverflow)?;
        } else {
            min_offset = min_offset
                .checked_add(reach)
                .ok_or(StridedError::OffsetOverflow)?;
        }
    }

    if min_offset < 0 {
        return Err(StridedError::IndexOutOfBounds {
            arg,
            index: min_offset,
            len: buf_len,
        });
    }
    if max_offset as usize >= buf_len {
        return Err(StridedError::InsufficientElements {
            arg,
            required: max_offset as usize + 1,
            actual: buf_len,
        });
    }
    Ok(())
}

// ============================================================================
// 1-D descriptors
// ============================================================================

/// A 1-D strided view over a borrowed buffer.
#[derive(Debug, Clone, Copy)]
pub struct StridedSlice<'a, T> {
    data: &'a [T],
    len: usize,
    stride: isize,
    offset: usize,
}

impl<'a, T> StridedSlice<'a, T> {
    /// Descriptor with an explicit offset (ndarray convention).
    pub fn new(data: &'a [T], len: usize, stride: isize, offset: usize) -> Self {
        Self {
            data,
            len,
            stride,
            offset,
        }
    }

    /// Descriptor whose offset is derived from the stride (simple convention).
    pub fn with_stride(data: &'a [T], len: usize, stride: isize) -> Self {
        Self::new(data, len, stride, stride_to_offset(len, stride))
    }

    /// Descriptor over every element of `data`.
    pub fn contiguous(data: &'a [T]) -> Self {
        Self::new(data, data.len(), 1, 0)
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Buffer index of logical element `k`.
    #[inline]
    pub fn index(&self, k: usize) -> usize {
        (self.offset as isize + k as isize * self.stride) as usize
    }

    /// Check that every indexed element lies inside the buffer.
    pub fn validate(&self, arg: usize) -> Result<()> {
        check_range(self.data.len(), self.len, self.stride, self.offset, arg)
    }

    /// The same buffer read back to front.
    pub fn reversed(self) -> Self {
        if self.len == 0 {
            return self;
        }
        let last = self.index(self.len - 1);
        Self::new(self.data, self.len, -self.stride, last)
    }
}

impl<'a, T: Copy> StridedSlice<'a, T> {
    /// # Panics
    /// Panics if the element lies outside the buffer.
    #[inline]
    pub fn get(&self, k: usize) -> T {
        self.data[self.index(k)]
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let this = *self;
        (0..this.len).map(move |k| this.get(k))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

/// A mutable 1-D strided view over a borrowed buffer.
#[derive(Debug)]
pub struct StridedSliceMut<'a, T> {
    data: &'a mut [T],
    len: usize,
    stride: isize,
    offset: usize,
}

impl<'a, T> StridedSliceMut<'a, T> {
    pub fn new(data: &'a mut [T], len: usize, stride: isize, offset: usize) -> Self {
        Self {
            data,
            len,
            stride,
            offset,
        }
    }

    pub fn with_stride(data: &'a mut [T], len: usize, stride: isize) -> Self {
        let offset = stride_to_offset(len, stride);
        Self::new(data, len, stride, offset)
    }

    pub fn contiguous(data: &'a mut [T]) -> Self {
        let len = data.len();
        Self::new(data, len, 1, 0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn index(&self, k: usize) -> usize {
        (self.offset as isize + k as isize * self.stride) as usize
    }

    pub fn validate(&self, arg: usize) -> Result<()> {
        check_range(self.data.len(), self.len, self.stride, self.offset, arg)
    }

    /// Read-only descriptor over the same elements.
    pub fn as_slice(&self) -> StridedSlice<'_, T> {
        StridedSlice::new(&*self.data, self.len, self.stride, self.offset)
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }

    /// Give the buffer back.
    pub fn into_data(self) -> &'a mut [T] {
        self.data
    }
}

impl<'a, T: Copy> StridedSliceMut<'a, T> {
    #[inline]
    pub fn get(&self, k: usize) -> T {
        self.data[self.index(k)]
    }

    #[inline]
    pub fn set(&mut self, k: usize, value: T) {
        let i = self.index(k);
        self.data[i] = value;
    }
}

// ============================================================================
// N-D descriptors
// ============================================================================

/// An N-d strided view over a borrowed buffer.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::{NdView, Order};
///
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let view = NdView::new(&data, [2, 3], [3, 1], 0, Order::RowMajor).unwrap();
/// assert_eq!(view.get(&[1, 2]), 6.0);
///
/// // Walk rows backwards without copying.
/// let flipped = view.flip(0).unwrap();
/// assert_eq!(flipped.get(&[0, 0]), 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct NdView<'a, T> {
    data: &'a [T],
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
}

/// A mutable N-d strided view over a borrowed buffer.
#[derive(Debug)]
pub struct NdViewMut<'a, T> {
    data: &'a mut [T],
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
}

impl<'a, T> NdView<'a, T> {
    /// Create a new N-d view.
    ///
    /// # Errors
    /// Returns an error if `shape` and `strides` differ in length or the view
    /// would reach outside `data`.
    pub fn new(
        data: &'a [T],
        shape: impl Into<Vec<usize>>,
        strides: impl Into<Vec<isize>>,
        offset: usize,
        order: Order,
    ) -> Result<Self> {
        let shape = shape.into();
        let strides = strides.into();
        check_nd_range(data.len(), &shape, &strides, offset, 0)?;
        Ok(Self {
            data,
            shape,
            strides,
            offset,
            order,
        })
    }

    /// Dense row-major view over the start of `data`.
    pub fn row_major(data: &'a [T], shape: impl Into<Vec<usize>>) -> Result<Self> {
        let shape = shape.into();
        let strides = shape_to_strides(&shape, Order::RowMajor);
        Self::new(data, shape, strides, 0, Order::RowMajor)
    }

    /// Dense column-major view over the start of `data`.
    pub fn column_major(data: &'a [T], shape: impl Into<Vec<usize>>) -> Result<Self> {
        let shape = shape.into();
        let strides = shape_to_strides(&shape, Order::ColumnMajor);
        Self::new(data, shape, strides, 0, Order::ColumnMajor)
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of indexed elements.
    #[inline]
    pub fn len(&self) -> usize {
        numel(&self.shape)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same view, different traversal order.
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Permute dimensions; `perm[i]` names the source dimension of axis `i`.
    pub fn permute(self, perm: &[usize]) -> Result<Self> {
        let (shape, strides) = permuted(&self.shape, &self.strides, perm)?;
        Ok(Self {
            shape,
            strides,
            ..self
        })
    }

    /// Reverse `axis` by negating its stride.
    pub fn flip(self, axis: usize) -> Result<Self> {
        let (strides, offset) = flipped(&self.shape, &self.strides, self.offset, axis)?;
        Ok(Self {
            strides,
            offset,
            ..self
        })
    }

    #[inline]
    fn linear_index(&self, indices: &[usize]) -> usize {
        linear_index(self.offset, &self.strides, indices)
    }
}

impl<'a, T: Copy> NdView<'a, T> {
    /// # Panics
    /// Panics if `indices` has the wrong rank or is out of bounds.
    #[inline]
    pub fn get(&self, indices: &[usize]) -> T {
        assert_in_bounds(&self.shape, indices);
        self.data[self.linear_index(indices)]
    }

    /// Element at view linear index `idx`, counted in the view's order.
    pub fn iget(&self, idx: usize) -> T {
        let subs = subscripts(&self.shape, self.order, idx);
        self.get(&subs)
    }

    /// Copy the elements out in the view's order.
    pub fn to_vec(&self) -> Vec<T> {
        crate::map::to_vec(self)
    }
}

impl<'a, T> NdViewMut<'a, T> {
    pub fn new(
        data: &'a mut [T],
        shape: impl Into<Vec<usize>>,
        strides: impl Into<Vec<isize>>,
        offset: usize,
        order: Order,
    ) -> Result<Self> {
        let shape = shape.into();
        let strides = strides.into();
        check_nd_range(data.len(), &shape, &strides, offset, 0)?;
        Ok(Self {
            data,
            shape,
            strides,
            offset,
            order,
        })
    }

    pub fn row_major(data: &'a mut [T], shape: impl Into<Vec<usize>>) -> Result<Self> {
        let shape = shape.into();
        let strides = shape_to_strides(&shape, Order::RowMajor);
        Self::new(data, shape, strides, 0, Order::RowMajor)
    }

    pub fn column_major(data: &'a mut [T], shape: impl Into<Vec<usize>>) -> Result<Self> {
        let shape = shape.into();
        let strides = shape_to_strides(&shape, Order::ColumnMajor);
        Self::new(data, shape, strides, 0, Order::ColumnMajor)
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        numel(&self.shape)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }

    /// Read-only view over the same elements.
    pub fn as_view(&self) -> NdView<'_, T> {
        NdView {
            data: &*self.data,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
            order: self.order,
        }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn permute(self, perm: &[usize]) -> Result<Self> {
        let (shape, strides) = permuted(&self.shape, &self.strides, perm)?;
        Ok(Self {
            shape,
            strides,
            ..self
        })
    }

    pub fn flip(self, axis: usize) -> Result<Self> {
        let (strides, offset) = flipped(&self.shape, &self.strides, self.offset, axis)?;
        Ok(Self {
            strides,
            offset,
            ..self
        })
    }
}

impl<'a, T: Copy> NdViewMut<'a, T> {
    #[inline]
    pub fn get(&self, indices: &[usize]) -> T {
        assert_in_bounds(&self.shape, indices);
        self.data[linear_index(self.offset, &self.strides, indices)]
    }

    #[inline]
    pub fn set(&mut self, indices: &[usize], value: T) {
        assert_in_bounds(&self.shape, indices);
        let i = linear_index(self.offset, &self.strides, indices);
        self.data[i] = value;
    }

    /// Set the element at view linear index `idx`, counted in the view's order.
    pub fn iset(&mut self, idx: usize, value: T) {
        let subs = subscripts(&self.shape, self.order, idx);
        self.set(&subs, value);
    }
}

// ============================================================================
// Owned arrays
// ============================================================================

/// A dense owned array, mostly used to stage inputs and outputs for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StridedArray<T> {
    data: Vec<T>,
    shape: Vec<usize>,
    strides: Vec<isize>,
    order: Order,
}

impl<T: Copy> StridedArray<T> {
    /// Build an array by evaluating `f` at every multi-index.
    pub fn from_fn(
        shape: impl Into<Vec<usize>>,
        order: Order,
        mut f: impl FnMut(&[usize]) -> T,
    ) -> Self {
        let shape = shape.into();
        let strides = shape_to_strides(&shape, order);
        let len = numel(&shape);
        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            // Storage position i corresponds to view index i in `order`.
            let subs = subscripts(&shape, order, i);
            data.push(f(&subs));
        }
        Self {
            data,
            shape,
            strides,
            order,
        }
    }

    /// Wrap `data` laid out densely in `order`.
    pub fn from_vec(data: Vec<T>, shape: impl Into<Vec<usize>>, order: Order) -> Result<Self> {
        let shape = shape.into();
        let len = numel(&shape);
        if data.len() != len {
            return Err(StridedError::InsufficientElements {
                arg: 0,
                required: len,
                actual: data.len(),
            });
        }
        let strides = shape_to_strides(&shape, order);
        Ok(Self {
            data,
            shape,
            strides,
            order,
        })
    }

    pub fn filled(shape: impl Into<Vec<usize>>, order: Order, value: T) -> Self {
        Self::from_fn(shape, order, |_| value)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, indices: &[usize]) -> T {
        assert_in_bounds(&self.shape, indices);
        self.data[linear_index(0, &self.strides, indices)]
    }

    pub fn view(&self) -> NdView<'_, T> {
        NdView {
            data: &self.data,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: 0,
            order: self.order,
        }
    }

    pub fn view_mut(&mut self) -> NdViewMut<'_, T> {
        NdViewMut {
            data: &mut self.data,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: 0,
            order: self.order,
        }
    }
}

impl<T: Copy + Default> StridedArray<T> {
    pub fn zeros(shape: impl Into<Vec<usize>>, order: Order) -> Self {
        Self::filled(shape, order, T::default())
    }
}

// ============================================================================
// Helpers
// ============================================================================

#[inline]
fn linear_index(offset: usize, strides: &[isize], indices: &[usize]) -> usize {
    let mut idx = offset as isize;
    for (&i, &s) in indices.iter().zip(strides) {
        idx += i as isize * s;
    }
    idx as usize
}

fn assert_in_bounds(shape: &[usize], indices: &[usize]) {
    assert_eq!(indices.len(), shape.len(), "index rank mismatch");
    for (&i, &d) in indices.iter().zip(shape) {
        assert!(i < d, "index out of bounds");
    }
}

/// Subscripts of view linear index `idx`, with the innermost dimension of
/// `order` varying fastest.
fn subscripts(shape: &[usize], order: Order, mut idx: usize) -> Vec<usize> {
    let mut subs = vec![0usize; shape.len()];
    for d in order.loop_order(shape.len()) {
        subs[d] = idx % shape[d];
        idx /= shape[d];
    }
    subs
}

fn permuted(shape: &[usize], strides: &[isize], perm: &[usize]) -> Result<(Vec<usize>, Vec<isize>)> {
    let rank = shape.len();
    if perm.len() != rank {
        return Err(StridedError::RankMismatch(perm.len(), rank));
    }
    let mut seen = vec![false; rank];
    for &p in perm {
        if p >= rank || seen[p] {
            return Err(StridedError::InvalidAxis { axis: p, rank });
        }
        seen[p] = true;
    }
    Ok((
        perm.iter().map(|&p| shape[p]).collect(),
        perm.iter().map(|&p| strides[p]).collect(),
    ))
}

fn flipped(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    axis: usize,
) -> Result<(Vec<isize>, usize)> {
    let rank = shape.len();
    if axis >= rank {
        return Err(StridedError::InvalidAxis { axis, rank });
    }
    let mut strides = strides.to_vec();
    let shift = shape[axis].saturating_sub(1) as isize * strides[axis];
    let offset = (offset as isize + shift) as usize;
    strides[axis] = -strides[axis];
    Ok((strides, offset))
}
