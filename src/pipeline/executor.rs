// In: src/pipeline/executor.rs

//! The linear filter executor.
//!
//! A run has two phases:
//!
//! 1. **Preflight pass.** Every filter is preflighted, in order, against one
//!    proxy of the store. Each preflight declares its outputs in that proxy so
//!    later filters can find them. The first fatal code ends the run before
//!    anything executes.
//! 2. **Execute pass.** Each filter is preflighted again against a fresh proxy
//!    of the store as earlier filters left it, then executed against the real
//!    store. Codes from that second preflight are logged under
//!    `Phase::Preflight`, skipping warnings the first pass already logged. A
//!    fatal code marks the filter `Failed` and halts the run; outputs of
//!    earlier filters stay in place.
//!
//! Warnings (positive codes, including `ConvergenceFailure`) are logged and
//! never halt the run.

use crate::config::PipelineConfig;
use crate::data_store::DataContainerArray;
use crate::error::{EbsdError, STATUS_OK};
use crate::observability::init_logging;
use crate::pipeline::{Filter, FilterOutcome, FilterState, Phase, RunLog};

/// An ordered list of filters. `run` consumes it, so a pipeline executes at
/// most once and cannot change after execution starts.
#[derive(Default)]
pub struct Pipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.name()))
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn push_boxed(&mut self, filter: Box<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Runs every filter against `dca` and returns the run log.
    pub fn run(self, dca: &mut DataContainerArray) -> RunLog {
        let mut log = RunLog::new(self.filters.len());
        log::info!("Pipeline: preflighting {} filters", self.filters.len());

        //--- 1. Full preflight pass against a single proxy.
        let mut proxy = dca.to_proxy();
        for (index, filter) in self.filters.iter().enumerate() {
            match filter.preflight(&mut proxy) {
                Ok(outcome) => {
                    record_warnings(&mut log, index, filter.name(), Phase::Preflight, &outcome);
                    log.set_state(index, FilterState::Preflighted);
                }
                Err(err) if !err.is_fatal() => {
                    log.record(index, filter.name(), Phase::Preflight, err.code(), err.to_string());
                    log.set_state(index, FilterState::Preflighted);
                }
                Err(err) => {
                    log::warn!("Preflight of filter {} ({}) failed: {}", index, filter.name(), err);
                    log.record(index, filter.name(), Phase::Preflight, err.code(), err.to_string());
                    log.set_state(index, FilterState::Failed);
                    return log;
                }
            }
        }

        //--- 2. Execute pass.
        for (index, filter) in self.filters.iter().enumerate() {
            log::info!("Pipeline: executing filter {} ({})", index, filter.name());
            match filter.preflight(&mut dca.to_proxy()) {
                Ok(mut outcome) => {
                    outcome.warnings.retain(|w| !log.has_entry(index, Phase::Preflight, w.code, &w.message));
                    record_warnings(&mut log, index, filter.name(), Phase::Preflight, &outcome);
                }
                Err(err) if !err.is_fatal() => {
                    if !log.has_entry(index, Phase::Preflight, err.code(), &err.to_string()) {
                        log.record(index, filter.name(), Phase::Preflight, err.code(), err.to_string());
                    }
                }
                Err(err) => {
                    log::warn!("Re-preflight of filter {} ({}) failed: {}", index, filter.name(), err);
                    log.record(index, filter.name(), Phase::Preflight, err.code(), err.to_string());
                    log.set_state(index, FilterState::Failed);
                    return log;
                }
            }
            match filter.execute(dca) {
                Ok(outcome) => {
                    if outcome.warnings.is_empty() {
                        log.record(index, filter.name(), Phase::Execute, STATUS_OK, "ok");
                    }
                    record_warnings(&mut log, index, filter.name(), Phase::Execute, &outcome);
                    log.set_state(index, FilterState::Executed);
                }
                Err(err) if !err.is_fatal() => {
                    log::warn!("Filter {} ({}) finished with a warning: {}", index, filter.name(), err);
                    log.record(index, filter.name(), Phase::Execute, err.code(), err.to_string());
                    log.set_state(index, FilterState::Executed);
                }
                Err(err) => {
                    log::warn!("Filter {} ({}) failed: {}", index, filter.name(), err);
                    log.record(index, filter.name(), Phase::Execute, err.code(), err.to_string());
                    log.set_state(index, FilterState::Failed);
                    return log;
                }
            }
        }

        log_metric!("event" = "pipeline_run", "filters" = &log.executed_count(), "warnings" = &log.warnings().count());
        log
    }

    /// Like [`Pipeline::run`], after installing logging and, when a thread
    /// count is configured, inside a dedicated rayon pool.
    pub fn run_with_config(self, dca: &mut DataContainerArray, config: &PipelineConfig) -> Result<RunLog, EbsdError> {
        init_logging(&config.logging)?;
        match config.parallel.num_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| EbsdError::InvalidParameter(format!("thread pool: {e}")))?;
                Ok(pool.install(|| self.run(dca)))
            }
            None => Ok(self.run(dca)),
        }
    }
}

fn record_warnings(log: &mut RunLog, index: usize, name: &str, phase: Phase, outcome: &FilterOutcome) {
    for warning in &outcome.warnings {
        log::warn!("Filter {} ({}): {}", index, name, warning.message);
        log.record(index, name, phase, warning.code, warning.message.clone());
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
