//! Element dtypes and dtype-tagged borrowed buffers.

use std::fmt;
use std::str::FromStr;

use bytemuck::Pod;
use num_traits::AsPrimitive;

use crate::{Result, StridedError};

/// Runtime tag identifying the element representation of a buffer.
///
/// `Generic` is the boxed representation: values are carried as `f64`
/// and only the fallback path of a dispatcher can consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    Float64,
    Float32,
    Int32,
    Int16,
    Int8,
    Uint32,
    Uint16,
    Uint8,
    Generic,
}

impl DType {
    /// All dtypes, in declaration order.
    pub const ALL: [DType; 9] = [
        DType::Float64,
        DType::Float32,
        DType::Int32,
        DType::Int16,
        DType::Int8,
        DType::Uint32,
        DType::Uint16,
        DType::Uint8,
        DType::Generic,
    ];

    /// The collaborator-facing name (`"float64"`, `"generic"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            DType::Float64 => "float64",
            DType::Float32 => "float32",
            DType::Int32 => "int32",
            DType::Int16 => "int16",
            DType::Int8 => "int8",
            DType::Uint32 => "uint32",
            DType::Uint16 => "uint16",
            DType::Uint8 => "uint8",
            DType::Generic => "generic",
        }
    }

    /// Size of one element in bytes, `None` for `Generic`.
    pub const fn bytes_per_element(self) -> Option<usize> {
        match self {
            DType::Float64 => Some(8),
            DType::Float32 | DType::Int32 | DType::Uint32 => Some(4),
            DType::Int16 | DType::Uint16 => Some(2),
            DType::Int8 | DType::Uint8 => Some(1),
            DType::Generic => None,
        }
    }

    pub const fn is_floating_point(self) -> bool {
        matches!(self, DType::Float64 | DType::Float32)
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            DType::Int32
                | DType::Int16
                | DType::Int8
                | DType::Uint32
                | DType::Uint16
                | DType::Uint8
        )
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = StridedError;

    fn from_str(s: &str) -> Result<Self> {
        DType::ALL
            .iter()
            .copied()
            .find(|dt| dt.name() == s)
            .ok_or_else(|| StridedError::UnknownDType(s.to_string()))
    }
}

/// A primitive element type with a fixed [`DType`] tag.
///
/// Conversions to and from `f64` follow `as`-cast semantics, which is what the
/// generic fallback path uses to move values between dtypes.
pub trait Element: Pod + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DTYPE: DType;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;

    /// Borrow the typed slice out of a buffer of the matching dtype.
    fn from_buffer<'a>(buf: &Buffer<'a>) -> Option<&'a [Self]>;

    /// Borrow the typed slice out of a mutable buffer of the matching dtype.
    fn from_buffer_mut<'b>(buf: &'b mut BufferMut<'_>) -> Option<&'b mut [Self]>;
}

/// A borrowed, dtype-tagged buffer.
#[derive(Debug, Clone, Copy)]
pub enum Buffer<'a> {
    Float64(&'a [f64]),
    Float32(&'a [f32]),
    Int32(&'a [i32]),
    Int16(&'a [i16]),
    Int8(&'a [i8]),
    Uint32(&'a [u32]),
    Uint16(&'a [u16]),
    Uint8(&'a [u8]),
    Generic(&'a [f64]),
}

/// A mutably borrowed, dtype-tagged buffer.
#[derive(Debug)]
pub enum BufferMut<'a> {
    Float64(&'a mut [f64]),
    Float32(&'a mut [f32]),
    Int32(&'a mut [i32]),
    Int16(&'a mut [i16]),
    Int8(&'a mut [i8]),
    Uint32(&'a mut [u32]),
    Uint16(&'a mut [u16]),
    Uint8(&'a mut [u8]),
    Generic(&'a mut [f64]),
}

/// Expands `$body` once per buffer variant with `$s` bound to the inner slice.
macro_rules! each_variant {
    ($enum:ident, $value:expr, $s:ident => $body:expr) => {
        match $value {
            $enum::Float64($s) => $body,
            $enum::Float32($s) => $body,
            $enum::Int32($s) => $body,
            $enum::Int16($s) => $body,
            $enum::Int8($s) => $body,
            $enum::Uint32($s) => $body,
            $enum::Uint16($s) => $body,
            $enum::Uint8($s) => $body,
            $enum::Generic($s) => $body,
        }
    };
}

impl<'a> Buffer<'a> {
    pub fn dtype(&self) -> DType {
        match self {
            Buffer::Float64(_) => DType::Float64,
            Buffer::Float32(_) => DType::Float32,
            Buffer::Int32(_) => DType::Int32,
            Buffer::Int16(_) => DType::Int16,
            Buffer::Int8(_) => DType::Int8,
            Buffer::Uint32(_) => DType::Uint32,
            Buffer::Uint16(_) => DType::Uint16,
            Buffer::Uint8(_) => DType::Uint8,
            Buffer::Generic(_) => DType::Generic,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(Buffer, self, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read element `idx` converted to `f64`.
    ///
    /// # Panics
    /// Panics if `idx` is out of range.
    #[inline]
    pub fn get_f64(&self, idx: usize) -> f64 {
        each_variant!(Buffer, self, s => s[idx].to_f64())
    }

    /// Borrow as a typed slice; `None` if `T` does not match the dtype.
    pub fn typed<T: Element>(&self) -> Option<&'a [T]> {
        T::from_buffer(self)
    }

    /// View raw bytes as a buffer of `dtype` (`Generic` is read as `f64`).
    pub fn from_bytes(dtype: DType, bytes: &'a [u8]) -> Result<Self> {
        let err = |reason| StridedError::ByteCast { dtype, reason };
        Ok(match dtype {
            DType::Float64 => Buffer::Float64(bytemuck::try_cast_slice(bytes).map_err(err)?),
            DType::Float32 => Buffer::Float32(bytemuck::try_cast_slice(bytes).map_err(err)?),
            DType::Int32 => Buffer::Int32(bytemuck::try_cast_slice(bytes).map_err(err)?),
            DType::Int16 => Buffer::Int16(bytemuck::try_cast_slice(bytes).map_err(err)?),
            DType::Int8 => Buffer::Int8(bytemuck::try_cast_slice(bytes).map_err(err)?),
            DType::Uint32 => Buffer::Uint32(bytemuck::try_cast_slice(bytes).map_err(err)?),
            DType::Uint16 => Buffer::Uint16(bytemuck::try_cast_slice(bytes).map_err(err)?),
            DType::Uint8 => Buffer::Uint8(bytes),
            DType::Generic => Buffer::Generic(bytemuck::try_cast_slice(bytes).map_err(err)?),
        })
    }
}

impl<'a> BufferMut<'a> {
    pub fn dtype(&self) -> DType {
        self.as_buffer().dtype()
    }

    pub fn len(&self) -> usize {
        each_variant!(BufferMut, self, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get_f64(&self, idx: usize) -> f64 {
        each_variant!(BufferMut, self, s => s[idx].to_f64())
    }

    /// Write `value` into element `idx` with `as`-cast conversion.
    ///
    /// # Panics
    /// Panics if `idx` is out of range.
    #[inline]
    pub fn set_f64(&mut self, idx: usize, value: f64) {
        each_variant!(BufferMut, self, s => s[idx] = Element::from_f64(value))
    }

    /// Shared view of the same memory.
    pub fn as_buffer(&self) -> Buffer<'_> {
        match self {
            BufferMut::Float64(s) => Buffer::Float64(s),
            BufferMut::Float32(s) => Buffer::Float32(s),
            BufferMut::Int32(s) => Buffer::Int32(s),
            BufferMut::Int16(s) => Buffer::Int16(s),
            BufferMut::Int8(s) => Buffer::Int8(s),
            BufferMut::Uint32(s) => Buffer::Uint32(s),
            BufferMut::Uint16(s) => Buffer::Uint16(s),
            BufferMut::Uint8(s) => Buffer::Uint8(s),
            BufferMut::Generic(s) => Buffer::Generic(s),
        }
    }

    /// Reborrow for a shorter lifetime, leaving `self` usable afterwards.
    pub fn reborrow(&mut self) -> BufferMut<'_> {
        match self {
            BufferMut::Float64(s) => BufferMut::Float64(s),
            BufferMut::Float32(s) => BufferMut::Float32(s),
            BufferMut::Int32(s) => BufferMut::Int32(s),
            BufferMut::Int16(s) => BufferMut::Int16(s),
            BufferMut::Int8(s) => BufferMut::Int8(s),
            BufferMut::Uint32(s) => BufferMut::Uint32(s),
            BufferMut::Uint16(s) => BufferMut::Uint16(s),
            BufferMut::Uint8(s) => BufferMut::Uint8(s),
            BufferMut::Generic(s) => BufferMut::Generic(s),
        }
    }

    pub fn typed_mut<T: Element>(&mut self) -> Option<&mut [T]> {
        T::from_buffer_mut(self)
    }
}

macro_rules! impl_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const DTYPE: DType = DType::$variant;

            #[inline(always)]
            fn to_f64(self) -> f64 {
                self.as_()
            }

            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value.as_()
            }

            fn from_buffer<'a>(buf: &Buffer<'a>) -> Option<&'a [Self]> {
                match *buf {
                    Buffer::$variant(s) => Some(s),
                    _ => None,
                }
            }

            fn from_buffer_mut<'b>(buf: &'b mut BufferMut<'_>) -> Option<&'b mut [Self]> {
                match buf {
                    BufferMut::$variant(s) => Some(&mut **s),
                    _ => None,
                }
            }
        }

        impl<'a> From<&'a [$t]> for Buffer<'a> {
            fn from(s: &'a [$t]) -> Self {
                Buffer::$variant(s)
            }
        }

        impl<'a> From<&'a mut [$t]> for BufferMut<'a> {
            fn from(s: &'a mut [$t]) -> Self {
                BufferMut::$variant(s)
            }
        }
    };
}

impl_element!(f64, Float64);
impl_element!(f32, Float32);
impl_element!(i32, Int32);
impl_element!(i16, Int16);
impl_element!(i8, Int8);
impl_element!(u32, Uint32);
impl_element!(u16, Uint16);
impl_element!(u8, Uint8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_names_round_trip() {
        for dt in DType::ALL {
            assert_eq!(dt.name().parse::<DType>().unwrap(), dt);
            assert_eq!(dt.to_string(), dt.name());
        }
    }

    #[test]
    fn test_unknown_dtype() {
        let err = "complex128".parse::<DType>().unwrap_err();
        assert!(matches!(err, StridedError::UnknownDType(ref s) if s == "complex128"));
    }

    #[test]
    fn test_bytes_per_element() {
        assert_eq!(DType::Float64.bytes_per_element(), Some(8));
        assert_eq!(DType::Int16.bytes_per_element(), Some(2));
        assert_eq!(DType::Generic.bytes_per_element(), None);
    }

    #[test]
    fn test_buffer_dtype_and_typed() {
        let data = [1.0f32, 2.0];
        let buf = Buffer::from(&data[..]);
        assert_eq!(buf.dtype(), DType::Float32);
        assert_eq!(buf.len(), 2);
        assert!(buf.typed::<f64>().is_none());
        assert_eq!(buf.typed::<f32>().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_generic_is_not_float64() {
        let data = [1.0f64];
        let buf = Buffer::Generic(&data);
        assert_eq!(buf.dtype(), DType::Generic);
        assert!(buf.typed::<f64>().is_none());
        assert_eq!(buf.get_f64(0), 1.0);
    }

    #[test]
    fn test_set_f64_casts() {
        let mut data = [0i8; 3];
        let mut buf = BufferMut::from(&mut data[..]);
        buf.set_f64(0, 3.7);
        buf.set_f64(1, 1000.0);
        buf.set_f64(2, f64::NAN);
        assert_eq!(data, [3, i8::MAX, 0]);
    }

    #[test]
    fn test_reborrow_keeps_buffer_usable() {
        let mut data = [0.0f64; 2];
        let mut buf = BufferMut::from(&mut data[..]);
        {
            let mut inner = buf.reborrow();
            inner.set_f64(1, 5.0);
        }
        buf.set_f64(0, 1.0);
        assert_eq!(buf.as_buffer().get_f64(1), 5.0);
        assert_eq!(data, [1.0, 5.0]);
    }

    #[test]
    fn test_from_bytes() {
        let values = [1.5f64, -2.0];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let buf = Buffer::from_bytes(DType::Float64, bytes).unwrap();
        assert_eq!(buf.typed::<f64>().unwrap(), &values);

        let err = Buffer::from_bytes(DType::Float64, &bytes[..7]).unwrap_err();
        assert!(matches!(err, StridedError::ByteCast { dtype: DType::Float64, .. }));
    }
}
