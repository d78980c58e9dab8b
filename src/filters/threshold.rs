//! MultiThresholdObjects: a Bool mask from comparisons of arrays against constants.

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{DataArray, DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::filters::to_json;
use crate::kernels::threshold::{threshold_mask, Combine, Comparator, Comparison};
use crate::pipeline::{Filter, FilterOutcome};
use crate::types::DataType;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThresholdTerm {
    pub path: DataArrayPath,
    pub comparator: Comparator,
    pub value: f64,
}

/// The mask is written to `output_name` in the matrix of the first term.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MultiThresholdObjects {
    pub terms: Vec<ThresholdTerm>,
    #[serde(default)]
    pub combine: Combine,
    pub output_name: String,
}

impl MultiThresholdObjects {
    pub fn from_defaults(_defaults: &FilterDefaults) -> Self {
        Self {
            terms: Vec::new(),
            combine: Combine::And,
            output_name: "Mask".to_string(),
        }
    }

    fn output_path(&self) -> Result<DataArrayPath, EbsdError> {
        let first = self
            .terms
            .first()
            .ok_or_else(|| EbsdError::InvalidParameter("at least one threshold term is required".to_string()))?;
        Ok(first.path.with_array(self.output_name.clone()))
    }

    /// Validates every term and returns the shared tuple count.
    fn check_terms(&self, dca: &DataContainerArray) -> Result<usize, EbsdError> {
        let mut tuples = None;
        for term in &self.terms {
            let array = dca.resolve_numeric(&term.path)?;
            match tuples {
                None => tuples = Some(array.tuple_count()),
                Some(expected) if expected != array.tuple_count() => {
                    return Err(EbsdError::TupleCountMismatch {
                        path: term.path.to_string(),
                        expected,
                        found: array.tuple_count(),
                    })
                }
                Some(_) => {}
            }
        }
        tuples.ok_or_else(|| EbsdError::InvalidParameter("at least one threshold term is required".to_string()))
    }
}

impl Filter for MultiThresholdObjects {
    fn name(&self) -> &'static str {
        "multi_threshold_objects"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.check_terms(dca)?;
        dca.create_array(&self.output_path()?, DataType::Bool, 1, false)?;
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        let len = self.check_terms(dca)?;
        let mut comparisons = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            let values = dca.resolve_numeric(&term.path)?.buffer().ok_or_else(|| {
                EbsdError::AlgorithmicFailure(format!("{} has no data", term.path))
            })?;
            comparisons.push(Comparison {
                values,
                comparator: term.comparator,
                value: term.value,
            });
        }
        let mask = threshold_mask(&comparisons, self.combine, len);
        let selected = mask.iter().filter(|m| **m).count();
        log::debug!("Threshold selected {} of {} tuples", selected, len);

        let output = self.output_path()?;
        dca.insert_array(
            &output.to_matrix_path(),
            DataArray::from_vec(self.output_name.clone(), mask, 1)?,
            false,
        )?;
        Ok(FilterOutcome::ok())
    }
}
