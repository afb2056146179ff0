//! Transform chain model.
//!
//! A registration run produces an ordered chain of transform components:
//! displacement (warp) field volumes and ITK affine matrix files. Resampling
//! composes the components in the listed order. The inverse chain marks its
//! affine components for inversion at apply time, since the toolkit stores
//! only the forward matrix while warp fields come with a dedicated inverse
//! field file.

use std::path::{Path, PathBuf};

use crate::error::{RegistrationError, Result};

/// Maximum number of components one apply invocation can compose.
pub const MAX_CHAIN_LEN: usize = 4;

/// One component of a composed transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformStep {
    path: PathBuf,
    invert: bool,
}

impl TransformStep {
    /// Component applied as stored.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            invert: false,
        }
    }

    /// Component inverted by the toolkit at apply time.
    pub fn inverted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            invert: true,
        }
    }

    /// Mark this component for inversion at apply time.
    pub fn into_inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Affine components are stored as ITK matrix files.
    pub fn is_affine(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mat"))
    }

    /// Render as one `-t` value for `antsApplyTransforms`. Inverted
    /// components use the `[path, 1]` form.
    pub fn cli_argument(&self) -> String {
        if self.invert {
            format!("[{}, 1]", self.path.display())
        } else {
            self.path.display().to_string()
        }
    }
}

/// Ordered composition of transform components, as produced by one
/// registration run. Holds between 1 and [`MAX_CHAIN_LEN`] components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
}

impl TransformChain {
    pub fn new(steps: Vec<TransformStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(RegistrationError::EmptyTransformChain);
        }
        if steps.len() > MAX_CHAIN_LEN {
            return Err(RegistrationError::ChainTooLong {
                len: steps.len(),
                max: MAX_CHAIN_LEN,
            });
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Component file paths in chain order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.steps.iter().map(|step| step.path())
    }

    /// Invert markers in chain order, matching ANTsPy's `whichtoinvert`.
    pub fn invert_flags(&self) -> Vec<bool> {
        self.steps.iter().map(|step| step.invert).collect()
    }
}

/// Forward and inverse chains from one registration run.
///
/// The forward chain maps moving-image coordinates into fixed-image space;
/// the inverse chain maps back, with affine components flagged for
/// inversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformChainPair {
    pub forward: TransformChain,
    pub inverse: TransformChain,
}

impl TransformChainPair {
    pub fn new(forward: TransformChain, inverse: TransformChain) -> Self {
        Self { forward, inverse }
    }

    /// Every file referenced by either chain, deduplicated. The affine
    /// matrix usually appears in both chains.
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = Vec::new();
        for path in self.forward.paths().chain(self.inverse.paths()) {
            if !files.contains(&path) {
                files.push(path);
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_cli_argument() {
        let step = TransformStep::new("/tmp/reg/1Warp.nii.gz");
        assert_eq!(step.cli_argument(), "/tmp/reg/1Warp.nii.gz");

        let step = TransformStep::inverted("/tmp/reg/0GenericAffine.mat");
        assert_eq!(step.cli_argument(), "[/tmp/reg/0GenericAffine.mat, 1]");
    }

    #[test]
    fn test_step_affine_classification() {
        assert!(TransformStep::new("0GenericAffine.mat").is_affine());
        assert!(TransformStep::new("0GenericAffine.MAT").is_affine());
        assert!(!TransformStep::new("1Warp.nii.gz").is_affine());
        assert!(!TransformStep::new("no_extension").is_affine());
    }

    #[test]
    fn test_chain_rejects_empty() {
        let err = TransformChain::new(Vec::new()).unwrap_err();
        assert!(matches!(err, RegistrationError::EmptyTransformChain));
    }

    #[test]
    fn test_chain_rejects_too_long() {
        let steps = (0..5)
            .map(|i| TransformStep::new(format!("t{i}.mat")))
            .collect();
        let err = TransformChain::new(steps).unwrap_err();
        assert!(matches!(err, RegistrationError::ChainTooLong { len: 5, .. }));
    }

    #[test]
    fn test_chain_order_and_invert_flags() {
        let chain = TransformChain::new(vec![
            TransformStep::new("1InverseWarp.nii.gz"),
            TransformStep::inverted("0GenericAffine.mat"),
        ])
        .unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.invert_flags(), vec![false, true]);
        let paths: Vec<_> = chain.paths().collect();
        assert_eq!(paths[0], Path::new("1InverseWarp.nii.gz"));
        assert_eq!(paths[1], Path::new("0GenericAffine.mat"));
    }

    #[test]
    fn test_pair_files_deduplicates_shared_affine() {
        let forward = TransformChain::new(vec![
            TransformStep::new("1Warp.nii.gz"),
            TransformStep::new("0GenericAffine.mat"),
        ])
        .unwrap();
        let inverse = TransformChain::new(vec![
            TransformStep::new("1InverseWarp.nii.gz"),
            TransformStep::inverted("0GenericAffine.mat"),
        ])
        .unwrap();

        let pair = TransformChainPair::new(forward, inverse);
        let files = pair.files();
        assert_eq!(files.len(), 3);
        assert!(files.contains(&Path::new("0GenericAffine.mat")));
    }
}
