// In: src/writer.rs

//! Persistence of a finished store.
//!
//! `RawDumpWriter` lays a store out on disk as one `manifest.json` describing
//! the hierarchy plus one raw `.raw` file per array:
//!
//! ```text
//! out/
//! ├── manifest.json
//! └── <container>/<matrix>/<array>.raw
//! ```
//!
//! Array files hold the flat element buffer as produced by
//! `ArrayBuffer::to_bytes` (booleans widened to one byte each). The manifest
//! records the byte order they were written in.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data_store::{AttributeMatrix, AttributeMatrixType, DataContainer, DataContainerArray, Geometry};
use crate::error::EbsdError;
use crate::types::DataType;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_FORMAT: &str = "ebsd-raw-dump";

//==================================================================================
// 1. Writer Interface
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WriteOptions {
    /// Replace an existing manifest in the target directory.
    pub overwrite: bool,
    /// Containers to write; empty writes all of them.
    pub containers: Vec<String>,
}

pub trait DataContainerWriter {
    /// Writes `dca` under `dir` and returns the manifest that was written.
    fn write(&self, dca: &DataContainerArray, dir: &Path, options: &WriteOptions) -> Result<Manifest, EbsdError>;
}

//==================================================================================
// 2. Manifest
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    pub format: String,
    pub version: String,
    /// `little` or `big`.
    pub byte_order: String,
    pub containers: Vec<ContainerEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContainerEntry {
    pub name: String,
    pub geometry: Option<Geometry>,
    pub matrices: Vec<MatrixEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatrixEntry {
    pub name: String,
    pub matrix_type: AttributeMatrixType,
    pub tuple_dims: Vec<usize>,
    pub arrays: Vec<ArrayEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArrayEntry {
    pub name: String,
    pub data_type: DataType,
    pub components: usize,
    pub tuple_count: usize,
    /// Relative to the manifest's directory, `/`-separated.
    pub file: String,
    pub byte_len: usize,
}

impl Manifest {
    pub fn read(dir: &Path) -> Result<Self, EbsdError> {
        let text = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&text)?)
    }
}

//==================================================================================
// 3. RawDumpWriter
//==================================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct RawDumpWriter;

impl DataContainerWriter for RawDumpWriter {
    fn write(&self, dca: &DataContainerArray, dir: &Path, options: &WriteOptions) -> Result<Manifest, EbsdError> {
        if dca.is_proxy() {
            return Err(EbsdError::AlgorithmicFailure(
                "a proxy store has no data to write".to_string(),
            ));
        }
        let manifest_path = dir.join(MANIFEST_FILE);
        if manifest_path.exists() && !options.overwrite {
            return Err(EbsdError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", manifest_path.display()),
            )));
        }
        fs::create_dir_all(dir)?;

        let mut containers = Vec::new();
        for container in selected_containers(dca, options)? {
            containers.push(write_container(container, dir)?);
        }

        let manifest = Manifest {
            format: MANIFEST_FORMAT.to_string(),
            version: crate::VERSION.to_string(),
            byte_order: if cfg!(target_endian = "big") { "big" } else { "little" }.to_string(),
            containers,
        };
        let mut file = fs::File::create(&manifest_path)?;
        file.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;
        log::info!(
            "Wrote {} containers to {}",
            manifest.containers.len(),
            dir.display()
        );
        Ok(manifest)
    }
}

fn selected_containers<'a>(
    dca: &'a DataContainerArray,
    options: &WriteOptions,
) -> Result<Vec<&'a DataContainer>, EbsdError> {
    if options.containers.is_empty() {
        return Ok(dca.containers().collect());
    }
    options
        .containers
        .iter()
        .map(|name| dca.container(name))
        .collect()
}

fn write_container(container: &DataContainer, dir: &Path) -> Result<ContainerEntry, EbsdError> {
    let mut matrices = Vec::new();
    for matrix in container.matrices() {
        matrices.push(write_matrix(container.name(), matrix, dir)?);
    }
    Ok(ContainerEntry {
        name: container.name().to_string(),
        geometry: container.geometry().cloned(),
        matrices,
    })
}

fn write_matrix(container: &str, matrix: &AttributeMatrix, dir: &Path) -> Result<MatrixEntry, EbsdError> {
    let relative_dir = PathBuf::from(file_stem(container)).join(file_stem(matrix.name()));
    fs::create_dir_all(dir.join(&relative_dir))?;

    let mut arrays = Vec::new();
    for array in matrix.arrays() {
        let buffer = array.buffer().ok_or_else(|| {
            EbsdError::AlgorithmicFailure(format!(
                "array '{}' in '{}/{}' is not allocated",
                array.name(),
                container,
                matrix.name()
            ))
        })?;
        let bytes = buffer.to_bytes();
        let relative = relative_dir.join(format!("{}.raw", file_stem(array.name())));
        fs::write(dir.join(&relative), &bytes)?;
        arrays.push(ArrayEntry {
            name: array.name().to_string(),
            data_type: array.data_type(),
            components: array.components(),
            tuple_count: array.tuple_count(),
            file: format!(
                "{}/{}/{}.raw",
                file_stem(container),
                file_stem(matrix.name()),
                file_stem(array.name())
            ),
            byte_len: bytes.len(),
        });
    }
    Ok(MatrixEntry {
        name: matrix.name().to_string(),
        matrix_type: matrix.matrix_type(),
        tuple_dims: matrix.tuple_dims().to_vec(),
        arrays,
    })
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
