//! Dtype-keyed kernel dispatch.
//!
//! A [`DispatchTable`] maps an exact tuple of argument dtypes (inputs first,
//! then outputs) to a specialized 1-D [`KernelFn`]. When no entry matches, the
//! table's generic [`ElementFn`] runs element by element through the traversal
//! engine, reading and writing every dtype through `f64`.
//!
//! [`Dispatcher`] owns a table together with the operation's arity and does all
//! validation up front: argument counts, buffer bounds and (for N-d calls)
//! shapes are checked before any kernel touches an output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dtype::{Buffer, BufferMut, DType, Element};
use crate::index::shape_to_strides;
use crate::kernel::{build_plan, ensure_same_shape, for_each_block, for_each_inner_block, KernelPlan};
use crate::order::Order;
use crate::view::{check_nd_range, check_range, stride_to_offset, StridedSlice, StridedSliceMut};
use crate::{Result, StridedError};

/// A specialized kernel: `n` elements of every argument, explicit offsets.
///
/// Kernels are only invoked after the dispatcher has validated every argument
/// for `n` elements.
pub type KernelFn = fn(usize, &[StridedArg<'_>], &mut [StridedArgMut<'_>]) -> Result<()>;

/// Generic per-element operation: input values in, output values out.
///
/// The output slice holds the current output values on entry.
pub type ElementFn = Arc<dyn Fn(&[f64], &mut [f64]) + Send + Sync>;

// ============================================================================
// Arguments
// ============================================================================

/// A read-only 1-D argument: dtype-tagged buffer, stride and offset.
#[derive(Debug, Clone, Copy)]
pub struct StridedArg<'a> {
    pub buf: Buffer<'a>,
    pub stride: isize,
    pub offset: usize,
}

impl<'a> StridedArg<'a> {
    pub fn new(buf: impl Into<Buffer<'a>>, stride: isize, offset: usize) -> Self {
        Self {
            buf: buf.into(),
            stride,
            offset,
        }
    }

    /// Argument whose offset is derived from the stride for `n` elements.
    pub fn with_stride(buf: impl Into<Buffer<'a>>, n: usize, stride: isize) -> Self {
        Self::new(buf, stride, stride_to_offset(n, stride))
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.buf.dtype()
    }

    pub fn validate(&self, n: usize, arg: usize) -> Result<()> {
        check_range(self.buf.len(), n, self.stride, self.offset, arg)
    }

    /// Typed descriptor over `n` elements.
    ///
    /// # Errors
    /// `DTypeMismatch` if the buffer does not hold `T`.
    pub fn typed<T: Element>(&self, n: usize) -> Result<StridedSlice<'a, T>> {
        let data = self.buf.typed::<T>().ok_or(StridedError::DTypeMismatch {
            expected: T::DTYPE,
            actual: self.dtype(),
        })?;
        Ok(StridedSlice::new(data, n, self.stride, self.offset))
    }
}

/// A writable 1-D argument.
#[derive(Debug)]
pub struct StridedArgMut<'a> {
    pub buf: BufferMut<'a>,
    pub stride: isize,
    pub offset: usize,
}

impl<'a> StridedArgMut<'a> {
    pub fn new(buf: impl Into<BufferMut<'a>>, stride: isize, offset: usize) -> Self {
        Self {
            buf: buf.into(),
            stride,
            offset,
        }
    }

    pub fn with_stride(buf: impl Into<BufferMut<'a>>, n: usize, stride: isize) -> Self {
        Self::new(buf, stride, stride_to_offset(n, stride))
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.buf.dtype()
    }

    pub fn validate(&self, n: usize, arg: usize) -> Result<()> {
        check_range(self.buf.len(), n, self.stride, self.offset, arg)
    }

    pub fn typed_mut<T: Element>(&mut self, n: usize) -> Result<StridedSliceMut<'_, T>> {
        let actual = self.dtype();
        let (stride, offset) = (self.stride, self.offset);
        let data = self.buf.typed_mut::<T>().ok_or(StridedError::DTypeMismatch {
            expected: T::DTYPE,
            actual,
        })?;
        Ok(StridedSliceMut::new(data, n, stride, offset))
    }
}

/// A read-only N-d argument.
#[derive(Debug, Clone)]
pub struct NdArg<'a> {
    pub buf: Buffer<'a>,
    pub shape: Vec<usize>,
    pub strides: Vec<isize>,
    pub offset: usize,
    pub order: Order,
}

impl<'a> NdArg<'a> {
    pub fn new(
        buf: impl Into<Buffer<'a>>,
        shape: impl Into<Vec<usize>>,
        strides: impl Into<Vec<isize>>,
        offset: usize,
        order: Order,
    ) -> Self {
        Self {
            buf: buf.into(),
            shape: shape.into(),
            strides: strides.into(),
            offset,
            order,
        }
    }

    /// Dense argument over the start of `buf`, laid out in `order`.
    pub fn dense(buf: impl Into<Buffer<'a>>, shape: impl Into<Vec<usize>>, order: Order) -> Self {
        let shape = shape.into();
        let strides = shape_to_strides(&shape, order);
        Self::new(buf, shape, strides, 0, order)
    }
}

/// A writable N-d argument.
#[derive(Debug)]
pub struct NdArgMut<'a> {
    pub buf: BufferMut<'a>,
    pub shape: Vec<usize>,
    pub strides: Vec<isize>,
    pub offset: usize,
    pub order: Order,
}

impl<'a> NdArgMut<'a> {
    pub fn new(
        buf: impl Into<BufferMut<'a>>,
        shape: impl Into<Vec<usize>>,
        strides: impl Into<Vec<isize>>,
        offset: usize,
        order: Order,
    ) -> Self {
        Self {
            buf: buf.into(),
            shape: shape.into(),
            strides: strides.into(),
            offset,
            order,
        }
    }

    pub fn dense(buf: impl Into<BufferMut<'a>>, shape: impl Into<Vec<usize>>, order: Order) -> Self {
        let shape = shape.into();
        let strides = shape_to_strides(&shape, order);
        Self::new(buf, shape, strides, 0, order)
    }
}

// ============================================================================
// Tables
// ============================================================================

/// Exact-signature kernel table with an optional generic fallback.
#[derive(Clone, Default)]
pub struct DispatchTable {
    entries: HashMap<Vec<DType>, KernelFn>,
    fallback: Option<ElementFn>,
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("signatures", &self.signatures())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::default()
    }

    /// Build a table from a flat dtype list, `arity` dtypes per kernel.
    ///
    /// Entry `i` uses `types[i * arity..(i + 1) * arity]`. A repeated signature
    /// keeps the kernel registered last.
    ///
    /// # Errors
    /// `ArityMismatch` if `types.len() != kernels.len() * arity`.
    pub fn from_flat(types: &[DType], kernels: &[KernelFn], arity: usize) -> Result<Self> {
        let expected = kernels.len() * arity;
        if types.len() != expected || (arity == 0 && !kernels.is_empty()) {
            return Err(StridedError::ArityMismatch {
                expected,
                actual: types.len(),
            });
        }
        let mut builder = DispatchTableBuilder::default();
        for (sig, &kernel) in types.chunks(arity.max(1)).zip(kernels) {
            builder = builder.entry(sig, kernel);
        }
        Ok(builder.build())
    }

    /// Attach or replace the generic fallback.
    pub fn with_fallback(
        mut self,
        op: impl Fn(&[f64], &mut [f64]) + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Arc::new(op));
        self
    }

    /// Kernel registered for exactly `signature`.
    pub fn resolve(&self, signature: &[DType]) -> Option<KernelFn> {
        self.entries.get(signature).copied()
    }

    pub fn fallback(&self) -> Option<&ElementFn> {
        self.fallback.as_ref()
    }

    /// Registered signatures, sorted.
    pub fn signatures(&self) -> Vec<Vec<DType>> {
        let mut sigs: Vec<Vec<DType>> = self.entries.keys().cloned().collect();
        sigs.sort();
        sigs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Incremental [`DispatchTable`] construction.
#[derive(Default)]
pub struct DispatchTableBuilder {
    entries: Vec<(Vec<DType>, KernelFn)>,
    fallback: Option<ElementFn>,
}

impl DispatchTableBuilder {
    pub fn entry(mut self, signature: impl Into<Vec<DType>>, kernel: KernelFn) -> Self {
        self.entries.push((signature.into(), kernel));
        self
    }

    pub fn fallback(mut self, op: impl Fn(&[f64], &mut [f64]) + Send + Sync + 'static) -> Self {
        self.fallback = Some(Arc::new(op));
        self
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            entries: self.entries.into_iter().collect(),
            fallback: self.fallback,
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// A named operation with fixed input/output counts and a dispatch table.
///
/// # Example
///
/// ```rust
/// use strided_dispatch::{DispatchTable, Dispatcher, StridedArg, StridedArgMut};
///
/// let table = DispatchTable::builder()
///     .fallback(|x, y| y[0] = x[0] + x[1])
///     .build();
/// let add = Dispatcher::new("add", 2, 1, table);
///
/// let x = [1.0f64, 2.0, 3.0];
/// let y = [10i32, 20, 30];
/// let mut z = [0.0f32; 3];
/// add.call_ndarray(
///     3,
///     &[StridedArg::new(&x[..], 1, 0), StridedArg::new(&y[..], -1, 2)],
///     &mut [StridedArgMut::new(&mut z[..], 1, 0)],
/// )
/// .unwrap();
/// assert_eq!(z, [31.0, 22.0, 13.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    name: String,
    nin: usize,
    nout: usize,
    table: DispatchTable,
}

impl Dispatcher {
    pub fn new(name: impl Into<String>, nin: usize, nout: usize, table: DispatchTable) -> Self {
        Self {
            name: name.into(),
            nin,
            nout,
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nin(&self) -> usize {
        self.nin
    }

    pub fn nout(&self) -> usize {
        self.nout
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Simple convention: one `(buffer, stride)` pair per array, offsets
    /// derived from the strides. Returns `outputs` for chaining.
    pub fn call<'o, 'b>(
        &self,
        n: usize,
        inputs: &[(Buffer<'_>, isize)],
        outputs: &'o mut [(BufferMut<'b>, isize)],
    ) -> Result<&'o mut [(BufferMut<'b>, isize)]> {
        let ins: Vec<StridedArg<'_>> = inputs
            .iter()
            .map(|&(buf, stride)| StridedArg::with_stride(buf, n, stride))
            .collect();
        {
            let mut outs: Vec<StridedArgMut<'_>> = outputs
                .iter_mut()
                .map(|(buf, stride)| StridedArgMut::with_stride(buf.reborrow(), n, *stride))
                .collect();
            self.run(n, &ins, &mut outs)?;
        }
        Ok(outputs)
    }

    /// Ndarray convention: explicit offsets for every array. Returns `outputs`
    /// for chaining.
    pub fn call_ndarray<'o, 'b>(
        &self,
        n: usize,
        inputs: &[StridedArg<'_>],
        outputs: &'o mut [StridedArgMut<'b>],
    ) -> Result<&'o mut [StridedArgMut<'b>]> {
        self.run(n, inputs, outputs)?;
        Ok(outputs)
    }

    /// N-d form: every argument must have the same shape. The traversal follows
    /// the first output's order and hands each inner run to the resolved kernel.
    pub fn call_nd<'o, 'b>(
        &self,
        inputs: &[NdArg<'_>],
        outputs: &'o mut [NdArgMut<'b>],
    ) -> Result<&'o mut [NdArgMut<'b>]> {
        self.check_arity(inputs.len(), outputs.len())?;

        let reference = outputs
            .first()
            .map(|a| (a.shape.clone(), a.order))
            .or_else(|| inputs.first().map(|a| (a.shape.clone(), a.order)));
        let Some((shape, order)) = reference else {
            return Ok(outputs);
        };
        for (i, a) in inputs.iter().enumerate() {
            ensure_same_shape(&shape, &a.shape)?;
            check_nd_range(a.buf.len(), &a.shape, &a.strides, a.offset, i)?;
        }
        for (j, a) in outputs.iter().enumerate() {
            ensure_same_shape(&shape, &a.shape)?;
            check_nd_range(a.buf.len(), &a.shape, &a.strides, a.offset, self.nin + j)?;
        }

        let signature = signature_of(
            inputs.iter().map(|a| a.buf.dtype()),
            outputs.iter().map(|a| a.buf.dtype()),
        );
        let strides: Vec<&[isize]> = inputs
            .iter()
            .map(|a| a.strides.as_slice())
            .chain(outputs.iter().map(|a| a.strides.as_slice()))
            .collect();
        let plan = build_plan(&shape, &strides, order, elem_size(&signature));

        let in_bases: Vec<(Buffer<'_>, usize)> = inputs.iter().map(|a| (a.buf, a.offset)).collect();
        {
            let mut out_bases: Vec<(BufferMut<'_>, usize)> = outputs
                .iter_mut()
                .map(|a| (a.buf.reborrow(), a.offset))
                .collect();
            self.execute(&signature, &plan, &in_bases, &mut out_bases)?;
        }
        Ok(outputs)
    }

    fn check_arity(&self, nin: usize, nout: usize) -> Result<()> {
        if nin != self.nin || nout != self.nout {
            return Err(StridedError::ArityMismatch {
                expected: self.nin + self.nout,
                actual: nin + nout,
            });
        }
        Ok(())
    }

    /// Validate, then run the specialized kernel or the fallback.
    fn run(&self, n: usize, inputs: &[StridedArg<'_>], outputs: &mut [StridedArgMut<'_>]) -> Result<()> {
        self.check_arity(inputs.len(), outputs.len())?;
        for (i, a) in inputs.iter().enumerate() {
            a.validate(n, i)?;
        }
        for (j, a) in outputs.iter().enumerate() {
            a.validate(n, self.nin + j)?;
        }

        let signature = signature_of(
            inputs.iter().map(StridedArg::dtype),
            outputs.iter().map(StridedArgMut::dtype),
        );
        if let Some(kernel) = self.table.resolve(&signature) {
            log::trace!("{}: specialized kernel for ({})", self.name, format_signature(&signature));
            return kernel(n, inputs, outputs);
        }

        let strides: Vec<[isize; 1]> = inputs
            .iter()
            .map(|a| [a.stride])
            .chain(outputs.iter().map(|a| [a.stride]))
            .collect();
        let stride_refs: Vec<&[isize]> = strides.iter().map(|s| s.as_slice()).collect();
        let plan = build_plan(&[n], &stride_refs, Order::RowMajor, elem_size(&signature));

        let in_bases: Vec<(Buffer<'_>, usize)> = inputs.iter().map(|a| (a.buf, a.offset)).collect();
        let mut out_bases: Vec<(BufferMut<'_>, usize)> = outputs
            .iter_mut()
            .map(|a| (a.buf.reborrow(), a.offset))
            .collect();
        self.run_fallback(&signature, &plan, &in_bases, &mut out_bases)
    }

    /// Run a planned traversal: specialized kernel per inner run, or the fallback.
    fn execute(
        &self,
        signature: &[DType],
        plan: &KernelPlan,
        inputs: &[(Buffer<'_>, usize)],
        outputs: &mut [(BufferMut<'_>, usize)],
    ) -> Result<()> {
        let Some(kernel) = self.table.resolve(signature) else {
            return self.run_fallback(signature, plan, inputs, outputs);
        };
        log::trace!("{}: specialized kernel for ({})", self.name, format_signature(signature));

        let nin = inputs.len();
        for_each_inner_block(plan, |offsets, len, inner| {
            let ins: Vec<StridedArg<'_>> = inputs
                .iter()
                .enumerate()
                .map(|(i, &(buf, base))| {
                    StridedArg::new(buf, inner[i], (base as isize + offsets[i]) as usize)
                })
                .collect();
            let mut outs: Vec<StridedArgMut<'_>> = outputs
                .iter_mut()
                .enumerate()
                .map(|(j, (buf, base))| {
                    let offset = (*base as isize + offsets[nin + j]) as usize;
                    StridedArgMut::new(buf.reborrow(), inner[nin + j], offset)
                })
                .collect();
            kernel(len, &ins, &mut outs)
        })
    }

    fn run_fallback(
        &self,
        signature: &[DType],
        plan: &KernelPlan,
        inputs: &[(Buffer<'_>, usize)],
        outputs: &mut [(BufferMut<'_>, usize)],
    ) -> Result<()> {
        let Some(op) = self.table.fallback() else {
            return Err(StridedError::UnsupportedDType {
                name: self.name.clone(),
                signature: format_signature(signature),
            });
        };
        log::debug!(
            "{}: no kernel for ({}), using generic fallback",
            self.name,
            format_signature(signature)
        );
        apply_element_fn(op, plan, inputs, outputs)
    }
}

/// Drive `op` over every element of a plan, converting through `f64`.
fn apply_element_fn(
    op: &ElementFn,
    plan: &KernelPlan,
    inputs: &[(Buffer<'_>, usize)],
    outputs: &mut [(BufferMut<'_>, usize)],
) -> Result<()> {
    let nin = inputs.len();
    let mut xs = vec![0.0; nin];
    let mut ys = vec![0.0; outputs.len()];
    for_each_block(plan, |offsets, len, inner| {
        for k in 0..len as isize {
            for (i, (buf, base)) in inputs.iter().enumerate() {
                xs[i] = buf.get_f64((*base as isize + offsets[i] + k * inner[i]) as usize);
            }
            for (j, (buf, base)) in outputs.iter().enumerate() {
                let idx = *base as isize + offsets[nin + j] + k * inner[nin + j];
                ys[j] = buf.get_f64(idx as usize);
            }
            op(&xs, &mut ys);
            for (j, (buf, base)) in outputs.iter_mut().enumerate() {
                let idx = *base as isize + offsets[nin + j] + k * inner[nin + j];
                buf.set_f64(idx as usize, ys[j]);
            }
        }
    });
    Ok(())
}

fn signature_of(
    inputs: impl Iterator<Item = DType>,
    outputs: impl Iterator<Item = DType>,
) -> Vec<DType> {
    inputs.chain(outputs).collect()
}

/// Element size used for cache blocking; `Generic` counts as 8 bytes.
fn elem_size(signature: &[DType]) -> usize {
    signature
        .iter()
        .map(|d| d.bytes_per_element().unwrap_or(8))
        .max()
        .unwrap_or(8)
}

fn format_signature(signature: &[DType]) -> String {
    signature
        .iter()
        .map(|d| d.name())
        .collect::<Vec<_>>()
        .join(", ")
}
