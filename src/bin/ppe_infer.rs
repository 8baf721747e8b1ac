//! PPE inference
//!
//! Person model on each image, PPE model on each person crop, boxes and
//! labels drawn onto a copy saved in the output directory.
use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};

use ppe_detect::io::annotate_directory;
use ppe_detect::utils::load_font;
use ppe_detect::{
    DetectArgs, DetectorConfig, OrtConfig, OrtEP, Painter, TwoStageDetector, YOLOv8,
};

fn model_config(path: &str, args: &DetectArgs) -> OrtConfig {
    let mut config = OrtConfig::new(path);
    config.ep = if args.cuda {
        OrtEP::CUDA(args.device_id)
    } else {
        OrtEP::CPU
    };
    config.image_size = (Some(args.imgsz), Some(args.imgsz));
    config
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = DetectArgs::parse();

    if !args.input_dir.is_dir() {
        bail!("input directory {} does not exist", args.input_dir.display());
    }

    let mut person_model = YOLOv8::new(
        model_config(&args.person_model_path, &args),
        args.conf,
        args.iou,
    )?;
    person_model.summary();
    let mut ppe_model = YOLOv8::new(
        model_config(&args.ppe_model_path, &args),
        args.conf,
        args.iou,
    )?;
    ppe_model.summary();

    let painter = match load_font(args.font.as_deref()) {
        Ok(font) => Painter::new(Some(font)),
        Err(e) => {
            warn!("No label font ({:#}), drawing boxes only", e);
            Painter::new(None)
        }
    };

    if !painter.has_font() {
        info!("Labels disabled, pass --font to enable them");
    }

    let detector = TwoStageDetector::new(DetectorConfig::default(), painter);
    let stats = annotate_directory(
        &args.input_dir,
        &args.output_dir,
        &detector,
        &mut person_model,
        &mut ppe_model,
    )?;
    stats.print_summary("Inference");

    info!("Results saved to {}", args.output_dir.display());
    println!(
        "Annotated {} of {} images into {}",
        stats.successful,
        stats.successful + stats.failed,
        args.output_dir.display()
    );
    Ok(())
}
