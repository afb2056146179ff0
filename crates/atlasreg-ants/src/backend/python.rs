//! Embedded ANTsPy backend.
//!
//! Calls the `ants` python package in-process through the Python C API.
//! The library materializes transform files in the process temp directory
//! and hands back their paths; `release` removes them explicitly since the
//! session working directory does not contain them.

use std::path::Path;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};

use atlasreg_core::{
    AntsConfig, Interpolation, RegistrationError, Result, TransformChain, TransformChainPair,
    TransformStep,
};
use tracing::{info, warn};

use super::{RegisterRequest, RegistrationBackend, ResampleRequest};

/// Forward-resampled moving input, written next to the transforms so the
/// warped volume is always materialized alongside them.
const WARPED_INPUT_NAME: &str = "registered_input_volume.nii.gz";

pub struct PythonBackend {
    dimension: usize,
}

impl PythonBackend {
    pub fn new(config: &AntsConfig) -> Self {
        Self {
            dimension: config.dimension,
        }
    }

    fn read_image<'py>(
        &self,
        py: Python<'py>,
        ants: &Bound<'py, PyModule>,
        path: &Path,
    ) -> PyResult<Bound<'py, PyAny>> {
        let kwargs = PyDict::new(py);
        kwargs.set_item("dimension", self.dimension)?;
        ants.call_method("image_read", (path_str(path),), Some(&kwargs))
    }
}

impl RegistrationBackend for PythonBackend {
    fn name(&self) -> &'static str {
        "python"
    }

    fn register(&self, request: &RegisterRequest<'_>) -> Result<TransformChainPair> {
        info!(method = %request.method, "starting ANTsPy registration");
        let (fwd, inv) = Python::with_gil(|py| -> PyResult<(Vec<String>, Vec<String>)> {
            let ants = py.import("ants")?;
            let moving = self.read_image(py, &ants, request.moving)?;
            let fixed = self.read_image(py, &ants, request.fixed)?;

            let reg = ants.call_method1(
                "registration",
                (&fixed, &moving, request.method.antspy_name()),
            )?;
            let fwd: Vec<String> = reg.get_item("fwdtransforms")?.extract()?;
            let inv: Vec<String> = reg.get_item("invtransforms")?.extract()?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("fixed", &fixed)?;
            kwargs.set_item("moving", &moving)?;
            kwargs.set_item("transformlist", fwd.clone())?;
            kwargs.set_item("interpolator", Interpolation::Linear.antspy_name())?;
            kwargs.set_item("whichtoinvert", vec![false; fwd.len()])?;
            let warped = ants.call_method("apply_transforms", (), Some(&kwargs))?;

            let warped_path = request.output_dir.join(WARPED_INPUT_NAME);
            ants.call_method1("image_write", (&warped, path_str(&warped_path)))?;
            Ok((fwd, inv))
        })
        .map_err(py_failure)?;

        let forward = TransformChain::new(fwd.into_iter().map(TransformStep::new).collect())?;
        // The library returns the forward affine inside the inverse list;
        // matrix components are inverted at apply time.
        let inverse = TransformChain::new(
            inv.into_iter()
                .map(|path| {
                    let step = TransformStep::new(path);
                    if step.is_affine() {
                        step.into_inverted()
                    } else {
                        step
                    }
                })
                .collect(),
        )?;
        Ok(TransformChainPair::new(forward, inverse))
    }

    fn resample(&self, request: &ResampleRequest<'_>) -> Result<()> {
        let transforms: Vec<String> = request
            .chain
            .steps()
            .iter()
            .map(|step| path_str(step.path()))
            .collect();
        let invert = request.chain.invert_flags();

        Python::with_gil(|py| -> PyResult<()> {
            let ants = py.import("ants")?;
            let moving = self.read_image(py, &ants, request.moving)?;
            let fixed = self.read_image(py, &ants, request.reference)?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("fixed", &fixed)?;
            kwargs.set_item("moving", &moving)?;
            kwargs.set_item("transformlist", transforms)?;
            kwargs.set_item("interpolator", request.interpolation.antspy_name())?;
            kwargs.set_item("whichtoinvert", invert)?;
            let warped = ants.call_method("apply_transforms", (), Some(&kwargs))?;

            ants.call_method1("image_write", (&warped, path_str(request.output)))?;
            Ok(())
        })
        .map_err(py_failure)
    }

    fn release(&self, pair: &TransformChainPair) -> Result<()> {
        for path in pair.files() {
            if path.exists() {
                if let Err(err) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), %err, "failed to remove transform file");
                }
            }
        }
        Ok(())
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn py_failure(err: PyErr) -> RegistrationError {
    RegistrationError::computation(format!("ANTsPy call failed: {err}"))
}
