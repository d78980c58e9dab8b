//! This file is the root of the `ebsd_pipeline` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`pipeline`, `filters`,
//!     `kernels`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types every caller needs to build a store,
//!     assemble a pipeline and run it.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod config;
pub mod data_store;
pub mod error;
pub mod filters;
pub mod grid;
pub mod kernels;
pub mod orientation;
pub mod pipeline;
pub mod types;
pub mod writer;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use config::{FilterDefaults, PipelineConfig};
pub use data_store::{AttributeMatrixType, DataArray, DataArrayPath, DataContainerArray, Geometry, ImageGeometry};
pub use error::EbsdError;
pub use observability::init_logging;
pub use pipeline::{Filter, FilterConfig, FilterOutcome, Pipeline, RunLog};
pub use types::DataType;
