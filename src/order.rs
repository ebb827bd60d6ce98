//! Memory order of N-d descriptors and the loop order derived from it.

use std::fmt;
use std::str::FromStr;

use crate::{Result, StridedError};

/// Which dimension varies fastest in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// Last dimension varies fastest (C order).
    #[default]
    RowMajor,
    /// First dimension varies fastest (Fortran order).
    ColumnMajor,
}

impl Order {
    pub const fn name(self) -> &'static str {
        match self {
            Order::RowMajor => "row-major",
            Order::ColumnMajor => "column-major",
        }
    }

    /// Loop nesting for a rank-`rank` traversal, innermost level first.
    ///
    /// Row-major puts the last dimension innermost, column-major the first.
    pub fn loop_order(self, rank: usize) -> Vec<usize> {
        match self {
            Order::RowMajor => (0..rank).rev().collect(),
            Order::ColumnMajor => (0..rank).collect(),
        }
    }

    /// Infer the memory order from a stride vector.
    ///
    /// Returns `None` when the strides are neither monotonically non-increasing
    /// (row-major) nor non-decreasing (column-major) in magnitude. Strides that
    /// satisfy both (rank <= 1 or equal magnitudes) report row-major.
    pub fn from_strides(strides: &[isize]) -> Option<Order> {
        let abs: Vec<usize> = strides.iter().map(|s| s.unsigned_abs()).collect();
        let row = abs.windows(2).all(|w| w[0] >= w[1]);
        let col = abs.windows(2).all(|w| w[0] <= w[1]);
        match (row, col) {
            (true, _) => Some(Order::RowMajor),
            (false, true) => Some(Order::ColumnMajor),
            (false, false) => None,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Order {
    type Err = StridedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "row-major" => Ok(Order::RowMajor),
            "column-major" => Ok(Order::ColumnMajor),
            other => Err(StridedError::UnknownOrder(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_order() {
        assert_eq!(Order::RowMajor.loop_order(3), vec![2, 1, 0]);
        assert_eq!(Order::ColumnMajor.loop_order(3), vec![0, 1, 2]);
        assert!(Order::RowMajor.loop_order(0).is_empty());
    }

    #[test]
    fn test_from_strides() {
        assert_eq!(Order::from_strides(&[6, 2, 1]), Some(Order::RowMajor));
        assert_eq!(Order::from_strides(&[-6, 2, -1]), Some(Order::RowMajor));
        assert_eq!(Order::from_strides(&[1, 3, 12]), Some(Order::ColumnMajor));
        assert_eq!(Order::from_strides(&[2, 1, 4]), None);
        assert_eq!(Order::from_strides(&[1]), Some(Order::RowMajor));
    }

    #[test]
    fn test_parse() {
        assert_eq!("column-major".parse::<Order>().unwrap(), Order::ColumnMajor);
        assert!("diagonal".parse::<Order>().is_err());
    }
}
