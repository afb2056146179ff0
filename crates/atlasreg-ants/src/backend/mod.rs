//! Backend strategies for driving the ANTs toolkit.
//!
//! Both backends expose the same operations through different calling
//! conventions: the executable backend spawns the distribution's scripts
//! and binaries, the python backend calls the embedded ANTsPy runtime
//! in-process.

pub mod executable;
#[cfg(feature = "antspy")]
pub mod python;

use std::path::Path;

use atlasreg_core::{
    AntsConfig, BackendKind, Interpolation, RegistrationMethod, Result, TransformChain,
    TransformChainPair,
};

/// Inputs for one registration run.
#[derive(Debug, Clone)]
pub struct RegisterRequest<'a> {
    /// Volume being registered.
    pub moving: &'a Path,
    /// Reference volume it is registered onto.
    pub fixed: &'a Path,
    pub method: RegistrationMethod,
    /// Directory receiving transform files and warped outputs.
    pub output_dir: &'a Path,
}

/// Inputs for one resampling run.
#[derive(Debug, Clone)]
pub struct ResampleRequest<'a> {
    /// Volume being resampled.
    pub moving: &'a Path,
    /// Volume defining the output space.
    pub reference: &'a Path,
    pub chain: &'a TransformChain,
    pub interpolation: Interpolation,
    pub output: &'a Path,
}

/// One calling convention into the toolkit.
pub trait RegistrationBackend {
    fn name(&self) -> &'static str;

    /// Run the registration and return the forward/inverse chain pair.
    fn register(&self, request: &RegisterRequest<'_>) -> Result<TransformChainPair>;

    /// Resample `moving` into `reference`'s space through `chain`.
    fn resample(&self, request: &ResampleRequest<'_>) -> Result<()>;

    /// Delete transform files the backend materialized outside the session
    /// working directory. The executable backend writes only into the
    /// working directory and has nothing extra to release.
    fn release(&self, pair: &TransformChainPair) -> Result<()> {
        let _ = pair;
        Ok(())
    }
}

/// Construct the backend selected by the configuration.
pub fn from_config(config: &AntsConfig) -> Result<Box<dyn RegistrationBackend>> {
    match config.backend {
        BackendKind::Executable => Ok(Box::new(executable::ExecutableBackend::new(config)?)),
        #[cfg(feature = "antspy")]
        BackendKind::Python => Ok(Box::new(python::PythonBackend::new(config))),
        #[cfg(not(feature = "antspy"))]
        BackendKind::Python => Err(atlasreg_core::RegistrationError::invalid_configuration(
            "python backend requires building with the `antspy` feature",
        )),
    }
}
