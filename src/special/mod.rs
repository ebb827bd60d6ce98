//! Scalar special functions.
//!
//! Numeric edge values (NaN, signed zero, infinities) are results, never
//! errors: out-of-domain arguments return NaN.

mod betainc;
mod betaincinv;
mod clamp;
mod gamma;
mod polynomial;

pub use betainc::betainc;
pub use betaincinv::betaincinv;
pub use clamp::{clamp, clampf, pdiff, pdifff};
pub use gamma::{beta, gammaln};
pub use polynomial::{evalpoly, evalpoly_fn, evalrational, evalrational_fn};
