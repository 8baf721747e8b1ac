use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::yolov8::{DEFAULT_CONF, DEFAULT_IOU};
use crate::ort_backend::DEFAULT_IMAGE_SIZE;

/// Convert Pascal VOC XML annotations to YOLO label files.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct ConvertArgs {
    /// Directory containing the VOC `.xml` annotation files
    pub input_dir: PathBuf,

    /// Directory to write the YOLO `.txt` label files to
    pub output_dir: PathBuf,

    /// Ordered class list, one class name per line
    #[arg(long = "classes", default_value = "datasets/classes.txt")]
    pub classes: PathBuf,

    /// Only emit objects of these classes (default: every class)
    #[arg(long = "only", use_value_delimiter = true)]
    pub only: Vec<String>,

    /// Fixed number of decimals for coordinates (default: shortest exact form)
    #[arg(long = "precision", value_parser = validate_precision)]
    pub precision: Option<usize>,
}

/// Person + PPE two-stage inference over a directory of images.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "YOLO Inference Script", long_about = None)]
pub struct DetectArgs {
    /// Path to the input directory containing images
    #[arg(long = "input_dir")]
    pub input_dir: PathBuf,

    /// Path to save the output images
    #[arg(long = "output_dir")]
    pub output_dir: PathBuf,

    /// Path to the person detection model (ONNX)
    #[arg(long = "person_model_path")]
    pub person_model_path: String,

    /// Path to the PPE detection model (ONNX)
    #[arg(long = "ppe_model_path")]
    pub ppe_model_path: String,

    /// TrueType font used for box labels
    #[arg(long = "font")]
    pub font: Option<PathBuf>,

    /// Model input size used when the ONNX input axes are dynamic
    #[arg(long = "imgsz", default_value_t = DEFAULT_IMAGE_SIZE)]
    pub imgsz: u32,

    /// Minimum score a raw model output needs to survive decoding
    #[arg(long = "conf", default_value_t = DEFAULT_CONF, value_parser = validate_score)]
    pub conf: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long = "iou", default_value_t = DEFAULT_IOU, value_parser = validate_score)]
    pub iou: f32,

    /// Run on CUDA (needs the `cuda` feature)
    #[arg(long = "cuda")]
    pub cuda: bool,

    /// CUDA device id
    #[arg(long = "device_id", default_value_t = 0)]
    pub device_id: i32,
}

// Scores and IoU thresholds live in 0.0..=1.0
fn validate_score(s: &str) -> Result<f32, String> {
    match f32::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("value must be between 0.0 and 1.0".to_string()),
    }
}

fn validate_precision(s: &str) -> Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val <= 17 => Ok(val),
        _ => Err("PRECISION must be an integer between 0 and 17".to_string()),
    }
}
