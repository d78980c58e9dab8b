//! Pure kernel for building a Bool mask from one or more comparisons of
//! numeric arrays against constants.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::ArrayBuffer;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparator {
    #[inline]
    pub fn apply<T: PartialOrd>(&self, lhs: T, rhs: T) -> bool {
        match self {
            Comparator::Less => lhs < rhs,
            Comparator::LessEqual => lhs <= rhs,
            Comparator::Greater => lhs > rhs,
            Comparator::GreaterEqual => lhs >= rhs,
            Comparator::Equal => lhs == rhs,
            Comparator::NotEqual => lhs != rhs,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combine {
    #[default]
    And,
    Or,
}

/// One `(values op constant)` term. `values` must be a 1-component buffer.
///
/// Float32 data is compared against the constant rounded to `f32`, so a stored
/// `0.05f32` equals a `0.05` threshold. Every other type compares exactly in `f64`.
#[derive(Debug, Clone, Copy)]
pub struct Comparison<'a> {
    pub values: &'a ArrayBuffer,
    pub comparator: Comparator,
    pub value: f64,
}

impl Comparison<'_> {
    #[inline]
    fn holds(&self, index: usize) -> bool {
        match self.values {
            ArrayBuffer::Float32(v) => self.comparator.apply(v[index], self.value as f32),
            other => self.comparator.apply(other.value_f64(index), self.value),
        }
    }
}

/// Evaluates every comparison per tuple and folds them with `combine`.
/// All buffers must have `len` elements.
pub fn threshold_mask(comparisons: &[Comparison<'_>], combine: Combine, len: usize) -> Vec<bool> {
    (0..len)
        .into_par_iter()
        .map(|i| {
            let mut terms = comparisons
                .iter()
                .map(|c| c.holds(i));
            match combine {
                Combine::And => terms.all(|t| t),
                Combine::Or => terms.any(|t| t),
            }
        })
        .collect()
}
