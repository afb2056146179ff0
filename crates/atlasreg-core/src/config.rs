//! Pipeline resource configuration.
//!
//! Locates the ANTs installation and selects the backend calling
//! convention. Loaded from the pipeline's JSON resource file; missing
//! fields take defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};

/// Backend calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Embedded ANTsPy runtime. The default: deployable without a locally
    /// compiled ANTs distribution.
    #[default]
    Python,
    /// Locally compiled ANTs scripts and executables.
    Executable,
}

impl FromStr for BackendKind {
    type Err = RegistrationError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "python" => Ok(Self::Python),
            // `cpp` is the tag older pipeline configurations used.
            "executable" | "cpp" => Ok(Self::Executable),
            _ => Err(RegistrationError::invalid_configuration(format!(
                "unknown backend: {name}"
            ))),
        }
    }
}

/// Resources the registration coordinator depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AntsConfig {
    /// Directory holding the `antsRegistrationSyN*.sh` entry points.
    pub scripts_dir: PathBuf,
    /// Directory holding the `antsApplyTransforms` executable.
    pub apply_dir: PathBuf,
    /// Backend calling convention.
    pub backend: BackendKind,
    /// Worker threads handed to the registration scripts.
    pub threads: usize,
    /// Image dimensionality.
    pub dimension: usize,
}

impl Default for AntsConfig {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::new(),
            apply_dir: PathBuf::new(),
            backend: BackendKind::default(),
            threads: 8,
            dimension: 3,
        }
    }
}

impl AntsConfig {
    /// Load from a JSON resource file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|err| {
            RegistrationError::invalid_configuration(format!(
                "failed to parse {}: {err}",
                path.display()
            ))
        })
    }
}
