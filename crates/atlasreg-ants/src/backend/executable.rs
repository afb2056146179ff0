//! ANTs executable backend.
//!
//! Drives a locally compiled ANTs distribution: registration through the
//! `antsRegistrationSyN*.sh` entry points, resampling through
//! `antsApplyTransforms`. Transform files land in the request's output
//! directory under the fixed names the scripts produce.

use std::path::{Path, PathBuf};
use std::process::Command;

use atlasreg_core::{
    AntsConfig, RegistrationError, RegistrationMethod, Result, TransformChain, TransformChainPair,
    TransformStep,
};
use tracing::{debug, info};

use super::{RegisterRequest, RegistrationBackend, ResampleRequest};

const WARP_NAME: &str = "1Warp.nii.gz";
const INVERSE_WARP_NAME: &str = "1InverseWarp.nii.gz";
const AFFINE_NAME: &str = "0GenericAffine.mat";

#[derive(Debug)]
pub struct ExecutableBackend {
    scripts_dir: PathBuf,
    apply_dir: PathBuf,
    threads: usize,
    dimension: usize,
}

impl ExecutableBackend {
    pub fn new(config: &AntsConfig) -> Result<Self> {
        if !config.scripts_dir.is_dir() {
            return Err(RegistrationError::invalid_configuration(format!(
                "ANTs scripts directory not found: {}",
                config.scripts_dir.display()
            )));
        }
        if !config.apply_dir.is_dir() {
            return Err(RegistrationError::invalid_configuration(format!(
                "ANTs apply directory not found: {}",
                config.apply_dir.display()
            )));
        }
        Ok(Self {
            scripts_dir: config.scripts_dir.clone(),
            apply_dir: config.apply_dir.clone(),
            threads: config.threads,
            dimension: config.dimension,
        })
    }
}

impl RegistrationBackend for ExecutableBackend {
    fn name(&self) -> &'static str {
        "executable"
    }

    fn register(&self, request: &RegisterRequest<'_>) -> Result<TransformChainPair> {
        let script = self.scripts_dir.join(request.method.script_name());
        let args = registration_args(request, self.dimension, self.threads);
        info!(
            script = %script.display(),
            method = %request.method,
            "starting executable registration"
        );
        run_checked(&script, &args)?;

        let pair = expected_chain_pair(request.method, request.output_dir)?;
        for path in pair.files() {
            if !path.exists() {
                return Err(RegistrationError::computation(format!(
                    "registration did not produce expected transform: {}",
                    path.display()
                )));
            }
        }
        Ok(pair)
    }

    fn resample(&self, request: &ResampleRequest<'_>) -> Result<()> {
        let binary = self.apply_dir.join("antsApplyTransforms");
        let args = apply_args(request, self.dimension);
        info!(
            output = %request.output.display(),
            interpolation = request.interpolation.cli_name(),
            "applying transform chain"
        );
        run_checked(&binary, &args)
    }
}

/// Arguments for one `antsRegistrationSyN*.sh` run. The scripts take
/// single-token options (`-d3`, not `-d 3`); the output prefix keeps a
/// trailing separator so files land inside the output directory.
fn registration_args(request: &RegisterRequest<'_>, dimension: usize, threads: usize) -> Vec<String> {
    vec![
        format!("-d{dimension}"),
        format!("-f{}", request.fixed.display()),
        format!("-m{}", request.moving.display()),
        format!("-o{}/", request.output_dir.display()),
        format!("-t{}", request.method.transform_flag()),
        format!("-n{threads}"),
    ]
}

/// Arguments for one `antsApplyTransforms` run, one `-t` per chain
/// component in composition order.
fn apply_args(request: &ResampleRequest<'_>, dimension: usize) -> Vec<String> {
    let mut args = vec![
        "-d".to_string(),
        dimension.to_string(),
        "-r".to_string(),
        request.reference.display().to_string(),
        "-i".to_string(),
        request.moving.display().to_string(),
    ];
    for step in request.chain.steps() {
        args.push("-t".to_string());
        args.push(step.cli_argument());
    }
    args.push("-o".to_string());
    args.push(request.output.display().to_string());
    args.push("-n".to_string());
    args.push(request.interpolation.cli_name().to_string());
    args
}

/// Transform files the scripts leave under the output prefix. Deformable
/// runs produce a warp field and an affine; linear-only runs produce the
/// affine alone. The affine has no stored inverse and is flagged for
/// inversion in the inverse chain.
fn expected_chain_pair(method: RegistrationMethod, output_dir: &Path) -> Result<TransformChainPair> {
    let affine = output_dir.join(AFFINE_NAME);
    let (forward, inverse) = if method.is_deformable() {
        (
            vec![
                TransformStep::new(output_dir.join(WARP_NAME)),
                TransformStep::new(affine.clone()),
            ],
            vec![
                TransformStep::new(output_dir.join(INVERSE_WARP_NAME)),
                TransformStep::inverted(affine),
            ],
        )
    } else {
        (
            vec![TransformStep::new(affine.clone())],
            vec![TransformStep::inverted(affine)],
        )
    };
    Ok(TransformChainPair::new(
        TransformChain::new(forward)?,
        TransformChain::new(inverse)?,
    ))
}

fn run_checked(program: &Path, args: &[String]) -> Result<()> {
    debug!(program = %program.display(), ?args, "spawning toolkit process");
    let output = Command::new(program).args(args).output().map_err(|err| {
        RegistrationError::computation(format!(
            "failed to spawn {}: {err}",
            program.display()
        ))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RegistrationError::computation(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlasreg_core::Interpolation;

    #[test]
    fn test_registration_args_single_token_options() {
        let request = RegisterRequest {
            moving: Path::new("/data/patient.nii.gz"),
            fixed: Path::new("/data/atlas.nii.gz"),
            method: RegistrationMethod::SynQuick,
            output_dir: Path::new("/out/registration"),
        };
        let args = registration_args(&request, 3, 8);
        assert_eq!(
            args,
            vec![
                "-d3",
                "-f/data/atlas.nii.gz",
                "-m/data/patient.nii.gz",
                "-o/out/registration/",
                "-ts",
                "-n8",
            ]
        );
    }

    #[test]
    fn test_apply_args_forward_chain() {
        let chain = TransformChain::new(vec![
            TransformStep::new("/out/1Warp.nii.gz"),
            TransformStep::new("/out/0GenericAffine.mat"),
        ])
        .unwrap();
        let request = ResampleRequest {
            moving: Path::new("/data/patient.nii.gz"),
            reference: Path::new("/data/atlas.nii.gz"),
            chain: &chain,
            interpolation: Interpolation::Linear,
            output: Path::new("/out/patient_reg_atlas.nii.gz"),
        };
        let args = apply_args(&request, 3);
        assert_eq!(
            args,
            vec![
                "-d",
                "3",
                "-r",
                "/data/atlas.nii.gz",
                "-i",
                "/data/patient.nii.gz",
                "-t",
                "/out/1Warp.nii.gz",
                "-t",
                "/out/0GenericAffine.mat",
                "-o",
                "/out/patient_reg_atlas.nii.gz",
                "-n",
                "Linear",
            ]
        );
    }

    #[test]
    fn test_apply_args_renders_inverted_steps() {
        let chain = TransformChain::new(vec![
            TransformStep::new("/out/1InverseWarp.nii.gz"),
            TransformStep::inverted("/out/0GenericAffine.mat"),
        ])
        .unwrap();
        let request = ResampleRequest {
            moving: Path::new("/data/mask.nii.gz"),
            reference: Path::new("/data/patient.nii.gz"),
            chain: &chain,
            interpolation: Interpolation::NearestNeighbor,
            output: Path::new("/out/tumor_mask_to_input.nii.gz"),
        };
        let args = apply_args(&request, 3);
        assert!(args.contains(&"[/out/0GenericAffine.mat, 1]".to_string()));
        assert_eq!(args.last().unwrap(), "NearestNeighbor");
    }

    #[test]
    fn test_expected_chain_pair_deformable() {
        let pair =
            expected_chain_pair(RegistrationMethod::SynQuick, Path::new("/out")).unwrap();
        assert_eq!(pair.forward.len(), 2);
        assert_eq!(pair.inverse.len(), 2);
        assert_eq!(pair.forward.invert_flags(), vec![false, false]);
        assert_eq!(pair.inverse.invert_flags(), vec![false, true]);

        let forward: Vec<_> = pair.forward.paths().collect();
        assert_eq!(forward[0], Path::new("/out/1Warp.nii.gz"));
        assert_eq!(forward[1], Path::new("/out/0GenericAffine.mat"));
    }

    #[test]
    fn test_expected_chain_pair_linear_only() {
        let pair = expected_chain_pair(RegistrationMethod::Rigid, Path::new("/out")).unwrap();
        assert_eq!(pair.forward.len(), 1);
        assert_eq!(pair.inverse.invert_flags(), vec![true]);
    }
}
