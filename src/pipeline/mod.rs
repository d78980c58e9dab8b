//! The linear filter pipeline: the `Filter` capability trait, the two-phase
//! executor, the run log and JSON pipeline descriptions.

pub mod description;
pub mod executor;
pub mod filter;
pub mod run_log;

pub use description::FilterConfig;
pub use executor::Pipeline;
pub use filter::{Filter, FilterOutcome, FilterState, FilterWarning};
pub use run_log::{FilterLogEntry, Phase, RunLog};
