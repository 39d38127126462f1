//! Pretrained super-resolution models
//!
//! The registry is a fixed table of the models dnnscale knows about. Building
//! it touches no files; weights are read only when a model is loaded.

use crate::error::{Error, Result};
use crate::processing::{frame_to_mat, mat_to_frame, Upscaler};
use crate::types::Frame;

use opencv::core::Mat;
use opencv::dnn_superres::{DnnSuperResImpl, DnnSuperResImplTrait};
use opencv::prelude::*;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Network architecture understood by the inference backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Edsr,
    Espcn,
    Lapsrn,
}

impl Algorithm {
    /// Name passed to the backend's `setModel`
    pub fn backend_name(&self) -> &'static str {
        match self {
            Algorithm::Edsr => "edsr",
            Algorithm::Espcn => "espcn",
            Algorithm::Lapsrn => "lapsrn",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.backend_name())
    }
}

/// Static description of one pretrained model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Registry key, as typed on the command line
    pub name: &'static str,
    /// Weights file
    pub path: PathBuf,
    pub algorithm: Algorithm,
    /// Linear upscale factor
    pub scale: u32,
}

/// (name, weights file, architecture, scale)
const KNOWN_MODELS: &[(&str, &str, Algorithm, u32)] = &[
    ("edsr", "EDSR_x4.pb", Algorithm::Edsr, 4),
    ("espcn", "ESPCN_x4.pb", Algorithm::Espcn, 4),
    ("lapsrn", "LapSRN_x8.pb", Algorithm::Lapsrn, 8),
];

/// Immutable table of known models
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    specs: Vec<ModelSpec>,
}

impl ModelRegistry {
    /// Build the table with weights expected under `models_dir`
    pub fn new(models_dir: impl AsRef<Path>) -> Self {
        let dir = models_dir.as_ref();
        let specs = KNOWN_MODELS
            .iter()
            .map(|&(name, file, algorithm, scale)| ModelSpec {
                name,
                path: dir.join(file),
                algorithm,
                scale,
            })
            .collect();
        Self { specs }
    }

    /// Look up a model by exact name
    pub fn resolve(&self, name: &str) -> Result<&ModelSpec> {
        self.specs
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// Resolve and load a model's weights
    pub fn load(&self, name: &str) -> Result<Model> {
        Model::load(self.resolve(name)?.clone())
    }

    /// Load every known model, failing on the first one that cannot be loaded
    pub fn load_all(&self) -> Result<Vec<Model>> {
        self.specs.iter().cloned().map(Model::load).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.specs.iter()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new("models")
    }
}

/// A model with its weights loaded into the inference backend
pub struct Model {
    spec: ModelSpec,
    // upsample() needs exclusive access to the network
    net: Mutex<opencv::core::Ptr<DnnSuperResImpl>>,
}

impl Model {
    /// Read the weights file and configure architecture and scale
    pub fn load(spec: ModelSpec) -> Result<Self> {
        let load_error = |reason: String| Error::ModelLoad {
            name: spec.name.to_string(),
            reason,
        };

        if !spec.path.is_file() {
            return Err(load_error(format!(
                "weights file not found: {}",
                spec.path.display()
            )));
        }
        let path = spec
            .path
            .to_str()
            .ok_or_else(|| load_error("weights path is not valid UTF-8".into()))?;

        let mut net = DnnSuperResImpl::create().map_err(|e| load_error(e.to_string()))?;
        net.read_model(path).map_err(|e| load_error(e.to_string()))?;
        net.set_model(spec.algorithm.backend_name(), spec.scale as i32)
            .map_err(|e| load_error(e.to_string()))?;

        tracing::info!(
            "Loaded model {} ({} x{}) from {}",
            spec.name,
            spec.algorithm,
            spec.scale,
            spec.path.display()
        );

        Ok(Self {
            spec,
            net: Mutex::new(net),
        })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model").field("spec", &self.spec).finish()
    }
}

impl Upscaler for Model {
    fn scale(&self) -> u32 {
        self.spec.scale
    }

    fn upscale(&self, frame: &Frame) -> Result<Frame> {
        let input = frame_to_mat(frame)?;
        let mut output = Mat::default();

        self.net
            .lock()
            .upsample(&input, &mut output)
            .map_err(|e| Error::Inference(format!("{}: {}", self.spec.name, e)))?;

        if output.empty() {
            return Err(Error::Inference(format!(
                "{}: backend returned an empty frame",
                self.spec.name
            )));
        }

        Ok(mat_to_frame(&output)?.with_index(frame.index))
    }
}
