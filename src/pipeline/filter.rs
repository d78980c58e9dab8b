//! The capability interface every filter implements, plus its per-run state.

use serde::Serialize;

use crate::data_store::DataContainerArray;
use crate::error::EbsdError;

/// A non-fatal condition reported alongside a successful result.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FilterWarning {
    /// Always positive.
    pub code: i32,
    pub message: String,
}

impl From<EbsdError> for FilterWarning {
    fn from(err: EbsdError) -> Self {
        Self {
            code: err.code().abs(),
            message: err.to_string(),
        }
    }
}

/// What a successful `preflight` or `execute` reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub warnings: Vec<FilterWarning>,
}

impl FilterOutcome {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_warning(warning: impl Into<FilterWarning>) -> Self {
        Self {
            warnings: vec![warning.into()],
        }
    }

    pub fn push(&mut self, warning: impl Into<FilterWarning>) {
        self.warnings.push(warning.into());
    }

    /// The status code of this outcome: 0, or the first warning's code.
    pub fn code(&self) -> i32 {
        self.warnings.first().map_or(crate::error::STATUS_OK, |w| w.code)
    }
}

/// A configured unit of work.
///
/// Filters hold only parameters and paths. They resolve their inputs afresh on
/// every call and never retain references into the store.
///
/// * `preflight` validates parameters and paths and declares every output in
///   the store it is given. The executor always hands it a proxy store, so it
///   must not depend on array contents.
/// * `execute` performs the computation against the real store.
pub trait Filter: Send {
    /// Stable `snake_case` name, as used in pipeline descriptions.
    fn name(&self) -> &'static str;

    /// The filter's parameters as JSON.
    fn parameters(&self) -> serde_json::Value;

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError>;

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError>;
}

/// `Constructed → Preflighted → Executed | Failed`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Constructed,
    Preflighted,
    Executed,
    Failed,
}
