//! Pure, store-agnostic algorithms.
//!
//! Kernels operate on plain slices, a `VoxelGrid` and an `OrientationField`.
//! They never touch the data store: cleanup kernels return the ordered
//! `TupleCopy` decisions and the calling filter replays them over every array
//! of the cell matrix.

pub mod alignment;
pub mod correlation;
pub mod field;
pub mod morphology;
pub mod mutual_information;
pub mod neighbor_check;
pub mod segmentation;
pub mod threshold;

pub use field::{OrientationField, TupleCopy};
