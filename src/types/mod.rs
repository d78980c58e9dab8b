//! This module defines the core, strongly-typed data representations used
//! throughout the data store and the filters.
//!
//! It includes the canonical `DataType` tag, the closed `ArrayBuffer` storage
//! enum, and the `Element` trait that links Rust primitives to both.

pub mod buffer;
pub mod data_type;

// Re-export the main type(s) for easier access.
pub use buffer::{ArrayBuffer, Element};
pub use data_type::DataType;
