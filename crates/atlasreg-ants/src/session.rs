//! Registration session coordination.
//!
//! One session per moving/fixed pair: compute the transform chain once,
//! resample any number of volumes forward or inverse through it, then
//! clear. The session owns the working directory and output naming so the
//! backends stay observably interchangeable.

use std::fs;
use std::path::{Path, PathBuf};

use atlasreg_core::{
    AntsConfig, Interpolation, RegistrationError, RegistrationMethod, Result, TransformChainPair,
};
use tracing::{debug, info};

use crate::backend::{self, RegisterRequest, RegistrationBackend, ResampleRequest};

/// Subdirectory of the pipeline output folder holding transforms and
/// resampled volumes for one session.
pub const REGISTRATION_SUBDIR: &str = "registration";

pub struct RegistrationSession {
    backend: Box<dyn RegistrationBackend>,
    workdir: PathBuf,
    transforms: Option<TransformChainPair>,
}

impl RegistrationSession {
    /// Create a session writing under `<output_dir>/registration/`, with
    /// the backend selected by the configuration.
    pub fn new(config: &AntsConfig, output_dir: impl AsRef<Path>) -> Result<Self> {
        let backend = backend::from_config(config)?;
        Ok(Self::with_backend(backend, output_dir))
    }

    /// Create a session over an explicit backend.
    pub fn with_backend(
        backend: Box<dyn RegistrationBackend>,
        output_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            backend,
            workdir: output_dir.as_ref().join(REGISTRATION_SUBDIR),
            transforms: None,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Whether a transform chain is cached for this session.
    pub fn is_computed(&self) -> bool {
        self.transforms.is_some()
    }

    /// Compute the transform chain mapping `moving` onto `fixed`. A no-op
    /// when a chain is already cached; `clear` re-arms it.
    pub fn compute(
        &mut self,
        moving: &Path,
        fixed: &Path,
        method: RegistrationMethod,
    ) -> Result<()> {
        if self.transforms.is_some() {
            debug!("transform chain already computed, skipping registration");
            return Ok(());
        }
        fs::create_dir_all(&self.workdir)?;
        info!(
            backend = self.backend.name(),
            %method,
            moving = %moving.display(),
            fixed = %fixed.display(),
            "computing registration"
        );
        let pair = self.backend.register(&RegisterRequest {
            moving,
            fixed,
            method,
            output_dir: &self.workdir,
        })?;
        self.transforms = Some(pair);
        Ok(())
    }

    /// Resample `moving` into `fixed`'s space through the forward chain.
    /// Returns the output path.
    pub fn apply_forward(
        &self,
        moving: &Path,
        fixed: &Path,
        interpolation: Interpolation,
    ) -> Result<PathBuf> {
        let pair = self
            .transforms
            .as_ref()
            .ok_or(RegistrationError::TransformChainMissing)?;
        fs::create_dir_all(&self.workdir)?;
        let output = self
            .workdir
            .join(format!("{}_reg_atlas.nii.gz", file_stem(moving)));
        self.backend.resample(&ResampleRequest {
            moving,
            reference: fixed,
            chain: &pair.forward,
            interpolation,
            output: &output,
        })?;
        Ok(output)
    }

    /// Resample `moving` (typically an atlas-space label mask) back into
    /// `fixed`'s space through the inverse chain. Returns the output path.
    pub fn apply_inverse(
        &self,
        moving: &Path,
        fixed: &Path,
        interpolation: Interpolation,
        label: &str,
    ) -> Result<PathBuf> {
        let pair = self
            .transforms
            .as_ref()
            .ok_or(RegistrationError::TransformChainMissing)?;
        let output = self.workdir.join(format!("{label}_mask_to_input.nii.gz"));
        // Labels may carry path separators to sort masks into subfolders.
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        self.backend.resample(&ResampleRequest {
            moving,
            reference: fixed,
            chain: &pair.inverse,
            interpolation,
            output: &output,
        })?;
        Ok(output)
    }

    /// Release backend-owned transform files, remove the working directory
    /// and reset the cached chain so a later `compute` runs again.
    /// Idempotent on a fresh or already-cleared session.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(pair) = self.transforms.take() {
            self.backend.release(&pair)?;
        }
        if self.workdir.exists() {
            info!(workdir = %self.workdir.display(), "removing registration directory");
            fs::remove_dir_all(&self.workdir)?;
        }
        Ok(())
    }
}

/// Base name with every extension stripped (`volume.nii.gz` -> `volume`).
fn file_stem(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_strips_all_extensions() {
        assert_eq!(file_stem(Path::new("/data/sub-01_T1w.nii.gz")), "sub-01_T1w");
        assert_eq!(file_stem(Path::new("volume.nii")), "volume");
        assert_eq!(file_stem(Path::new("plain")), "plain");
    }
}
