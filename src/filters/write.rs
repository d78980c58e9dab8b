//! WriteDataContainers: the terminal filter that persists the store.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::DataContainerArray;
use crate::error::EbsdError;
use crate::filters::to_json;
use crate::pipeline::{Filter, FilterOutcome};
use crate::writer::{DataContainerWriter, RawDumpWriter, WriteOptions};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WriteDataContainers {
    pub output_dir: PathBuf,
    #[serde(default)]
    pub options: WriteOptions,
}

impl WriteDataContainers {
    pub fn from_defaults(_defaults: &FilterDefaults) -> Self {
        Self::default()
    }
}

impl Filter for WriteDataContainers {
    fn name(&self) -> &'static str {
        "write_data_containers"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(EbsdError::InvalidParameter(
                "output_dir must be set".to_string(),
            ));
        }
        for name in &self.options.containers {
            dca.container(name)?;
        }
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        RawDumpWriter.write(dca, &self.output_dir, &self.options)?;
        Ok(FilterOutcome::ok())
    }
}
