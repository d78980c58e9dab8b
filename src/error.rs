// In: src/error.rs

//! This module defines the single, unified error type for the entire EBSD pipeline
//! library. It uses the `thiserror` crate to provide ergonomic, context-aware error
//! handling, and maps every variant onto the integer status codes that the filter
//! invocation contract surfaces (0 = success, negative = fatal, positive = warning).

use thiserror::Error;

use crate::types::DataType;

//==================================================================================
// 0. Status Codes
//==================================================================================
/// Status code reported for a filter that completed without warnings.
pub const STATUS_OK: i32 = 0;

pub const CODE_PATH_NOT_FOUND: i32 = -80000;
pub const CODE_TYPE_MISMATCH: i32 = -80001;
pub const CODE_COMPONENT_COUNT_MISMATCH: i32 = -80002;
pub const CODE_TUPLE_COUNT_MISMATCH: i32 = -80003;
pub const CODE_DUPLICATE_NAME: i32 = -80004;
pub const CODE_INVALID_PARAMETER: i32 = -80005;
pub const CODE_MISSING_GEOMETRY: i32 = -80006;
pub const CODE_ALGORITHMIC_FAILURE: i32 = -80007;
pub const CODE_IO: i32 = -80008;
pub const CODE_SERDE_JSON: i32 = -80009;
/// Non-fatal: iterative filters that hit their iteration cap.
pub const CODE_CONVERGENCE_FAILURE: i32 = 80010;

//==================================================================================
// 1. The Error Enum
//==================================================================================
#[derive(Error, Debug)]
pub enum EbsdError {
    // =========================================================================
    // === Data Store / Path Resolution Errors
    // =========================================================================
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Component count mismatch at {path}: expected {expected}, found {found}")]
    ComponentCountMismatch {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("Tuple count mismatch at {path}: expected {expected}, found {found}")]
    TupleCountMismatch {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("An object named '{0}' already exists")]
    DuplicateName(String),

    // =========================================================================
    // === Parameter & Algorithm Errors
    // =========================================================================
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data container '{0}' has no geometry suitable for this operation")]
    MissingGeometry(String),

    /// Iterative correlation/alignment did not reach a fixed point in time.
    /// This variant is the only one that does not halt a pipeline.
    #[error("Did not converge after {iterations} iterations: {message}")]
    ConvergenceFailure { iterations: usize, message: String },

    #[error("Algorithm failed: {0}")]
    AlgorithmicFailure(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (writer filter, log file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library (config, pipeline descriptions, manifests).
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

//==================================================================================
// 2. Status Code Mapping
//==================================================================================
impl EbsdError {
    /// The integer status code reported in a pipeline run log.
    pub fn code(&self) -> i32 {
        match self {
            EbsdError::PathNotFound(_) => CODE_PATH_NOT_FOUND,
            EbsdError::TypeMismatch { .. } => CODE_TYPE_MISMATCH,
            EbsdError::ComponentCountMismatch { .. } => CODE_COMPONENT_COUNT_MISMATCH,
            EbsdError::TupleCountMismatch { .. } => CODE_TUPLE_COUNT_MISMATCH,
            EbsdError::DuplicateName(_) => CODE_DUPLICATE_NAME,
            EbsdError::InvalidParameter(_) => CODE_INVALID_PARAMETER,
            EbsdError::MissingGeometry(_) => CODE_MISSING_GEOMETRY,
            EbsdError::ConvergenceFailure { .. } => CODE_CONVERGENCE_FAILURE,
            EbsdError::AlgorithmicFailure(_) => CODE_ALGORITHMIC_FAILURE,
            EbsdError::Io(_) => CODE_IO,
            EbsdError::SerdeJson(_) => CODE_SERDE_JSON,
        }
    }

    /// Returns `false` only for errors that are reported as warnings.
    pub fn is_fatal(&self) -> bool {
        self.code() < 0
    }
}
