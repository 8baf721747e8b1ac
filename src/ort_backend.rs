// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! ONNX Runtime session wrapper

use anyhow::{bail, Context, Result};
use log::{info, warn};
use ndarray::{Array, IxDyn};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use regex::Regex;

/// Execution provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    /// model file
    pub f: String,
    pub ep: OrtEP,
    /// (height, width) for dynamic input axes, defaults to 640x640
    pub image_size: (Option<u32>, Option<u32>),
}

impl OrtConfig {
    pub fn new(f: impl Into<String>) -> Self {
        Self {
            f: f.into(),
            ep: OrtEP::CPU,
            image_size: (None, None),
        }
    }
}

pub const DEFAULT_IMAGE_SIZE: u32 = 640;

pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    height: u32,
    width: u32,
    output_name: String,
    names: Option<Vec<String>>,
}

impl OrtBackend {
    pub fn build(args: OrtConfig) -> Result<Self> {
        let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
        let (builder, ep) = Self::with_ep(builder, args.ep)?;
        let session = builder
            .commit_from_file(&args.f)
            .with_context(|| format!("failed to load model {}", args.f))?;

        // input: [batch, 3, height, width]
        let input = match session.inputs.first() {
            Some(input) => input,
            None => bail!("model {} has no inputs", args.f),
        };
        let dims: Vec<i64> = input
            .input_type
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect())
            .unwrap_or_default();
        let height = input_dim(dims.get(2).copied(), args.image_size.0);
        let width = input_dim(dims.get(3).copied(), args.image_size.1);

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .context("model has no outputs")?;

        let names = session
            .metadata()
            .ok()
            .and_then(|m| m.custom("names").ok().flatten())
            .map(|raw| parse_names(&raw));

        Ok(Self {
            session,
            ep,
            height,
            width,
            output_name,
            names,
        })
    }

    #[cfg(feature = "cuda")]
    fn with_ep(
        builder: ort::session::builder::SessionBuilder,
        ep: OrtEP,
    ) -> Result<(ort::session::builder::SessionBuilder, OrtEP)> {
        match ep {
            OrtEP::CUDA(device_id) => {
                let cuda = ort::execution_providers::CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build();
                Ok((builder.with_execution_providers([cuda])?, ep))
            }
            OrtEP::CPU => Ok((builder, ep)),
        }
    }

    #[cfg(not(feature = "cuda"))]
    fn with_ep(
        builder: ort::session::builder::SessionBuilder,
        ep: OrtEP,
    ) -> Result<(ort::session::builder::SessionBuilder, OrtEP)> {
        if let OrtEP::CUDA(_) = ep {
            warn!("built without the `cuda` feature, falling back to CPU");
        }
        Ok((builder, OrtEP::CPU))
    }

    /// Run one NCHW batch, returning the first output tensor.
    pub fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        let input = Tensor::from_array(xs)?;
        let outputs = self.session.run(ort::inputs![input])?;
        let output = outputs
            .get(self.output_name.as_str())
            .with_context(|| format!("model output '{}' missing", self.output_name))?;

        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok(Array::from_shape_vec(IxDyn(&shape), data.to_vec())?)
    }

    pub fn summary(&self, tag: &str) {
        info!(
            "[{}] EP: {:?}, input {}x{}, classes: {}",
            tag,
            self.ep,
            self.width,
            self.height,
            match &self.names {
                Some(names) => names.join(", "),
                None => String::from("(no metadata)"),
            }
        );
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

/// A fixed axis of the export wins; dynamic (-1) or missing axes use the
/// configured size, else 640.
pub fn input_dim(declared: Option<i64>, configured: Option<u32>) -> u32 {
    match declared {
        Some(d) if d > 0 => {
            let d = d as u32;
            if let Some(c) = configured {
                if c != d {
                    warn!("model input is fixed at {}, ignoring requested size {}", d, c);
                }
            }
            d
        }
        _ => configured.unwrap_or(DEFAULT_IMAGE_SIZE),
    }
}

/// Class names from the exporter's `names` metadata, a Python dict literal
/// such as `{0: 'person', 1: 'helmet'}`.
pub fn parse_names(raw: &str) -> Vec<String> {
    let re = match Regex::new(r#"(\d+):\s*['"]([^'"]*)['"]"#) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let mut pairs: Vec<(usize, String)> = re
        .captures_iter(raw)
        .filter_map(|c| Some((c[1].parse().ok()?, c[2].to_string())))
        .collect();
    pairs.sort_by_key(|(id, _)| *id);
    pairs.into_iter().map(|(_, name)| name).collect()
}
