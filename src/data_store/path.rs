//! `DataArrayPath`: the three-part address used for every cross-filter reference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EbsdError;

/// Separator of the compact string form `container|matrix|array`.
pub const PATH_SEPARATOR: char = '|';

/// An immutable `(container, matrix, array)` triplet. An empty segment means
/// "unset" and is rejected with `PathNotFound` by every lookup that needs it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataArrayPath {
    #[serde(default)]
    container: String,
    #[serde(default)]
    matrix: String,
    #[serde(default)]
    array: String,
}

impl DataArrayPath {
    pub fn new(container: impl Into<String>, matrix: impl Into<String>, array: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            matrix: matrix.into(),
            array: array.into(),
        }
    }

    /// A path addressing a whole attribute matrix.
    pub fn matrix_path(container: impl Into<String>, matrix: impl Into<String>) -> Self {
        Self::new(container, matrix, "")
    }

    /// The fully unset path `("", "", "")`.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn matrix(&self) -> &str {
        &self.matrix
    }

    pub fn array(&self) -> &str {
        &self.array
    }

    /// `true` if any of the three segments is empty.
    pub fn is_unset(&self) -> bool {
        self.container.is_empty() || self.matrix.is_empty() || self.array.is_empty()
    }

    /// `true` only when all three segments are empty.
    pub fn is_empty(&self) -> bool {
        self.container.is_empty() && self.matrix.is_empty() && self.array.is_empty()
    }

    /// Same container and matrix, different array name.
    pub fn with_array(&self, array: impl Into<String>) -> Self {
        Self::new(self.container.clone(), self.matrix.clone(), array)
    }

    /// This path with the array segment dropped.
    pub fn to_matrix_path(&self) -> Self {
        Self::matrix_path(self.container.clone(), self.matrix.clone())
    }

    /// `true` if both paths address the same attribute matrix.
    pub fn same_matrix(&self, other: &DataArrayPath) -> bool {
        self.container == other.container && self.matrix == other.matrix
    }

    pub(crate) fn require_container(&self) -> Result<&str, EbsdError> {
        if self.container.is_empty() {
            return Err(EbsdError::PathNotFound(format!(
                "{self}: container name is unset"
            )));
        }
        Ok(&self.container)
    }

    pub(crate) fn require_matrix(&self) -> Result<(&str, &str), EbsdError> {
        let container = self.require_container()?;
        if self.matrix.is_empty() {
            return Err(EbsdError::PathNotFound(format!(
                "{self}: attribute matrix name is unset"
            )));
        }
        Ok((container, &self.matrix))
    }

    pub(crate) fn require_array(&self) -> Result<(&str, &str, &str), EbsdError> {
        let (container, matrix) = self.require_matrix()?;
        if self.array.is_empty() {
            return Err(EbsdError::PathNotFound(format!(
                "{self}: array name is unset"
            )));
        }
        Ok((container, matrix, &self.array))
    }
}

impl fmt::Display for DataArrayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.container, self.matrix, self.array)
    }
}

impl From<(&str, &str, &str)> for DataArrayPath {
    fn from(parts: (&str, &str, &str)) -> Self {
        Self::new(parts.0, parts.1, parts.2)
    }
}

/// Parses `container|matrix|array`; missing trailing segments are unset.
impl FromStr for DataArrayPath {
    type Err = EbsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(PATH_SEPARATOR).collect();
        if parts.len() > 3 {
            return Err(EbsdError::InvalidParameter(format!(
                "'{s}' has more than three path segments"
            )));
        }
        let get = |i: usize| parts.get(i).copied().unwrap_or("");
        Ok(Self::new(get(0), get(1), get(2)))
    }
}
