// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! PPE detection toolkit
//!
//! Two independent tools sharing one crate:
//! - `voc2yolo`: Pascal VOC XML annotations -> YOLO label text files
//! - `ppe-infer`: person detection, then PPE detection on every person crop,
//!   with the results drawn onto the image
pub mod config; // CLI arguments
pub mod conversion; // VOC record -> YOLO lines
pub mod detection; // two-stage detector, drawing, Detect trait
pub mod io; // batch drivers and file helpers
pub mod models; // ONNX detection models
pub mod ort_backend;
pub mod types;
pub mod utils;
pub mod voc; // Pascal VOC parsing

pub use crate::config::{ConvertArgs, DetectArgs};
pub use crate::conversion::{convert, to_yolo_text, ClassList, ConvertError, YoloLine};
pub use crate::detection::{
    BoxXyxy, Detect, Detection, DetectorConfig, LabelMapping, Painter, TwoStageDetector,
};
pub use crate::io::{annotate_directory, convert_directory, load_class_list};
pub use crate::models::YOLOv8;
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};
pub use crate::types::ProcessingStats;
pub use crate::voc::{AnnotationRecord, ObjectBox, VocError};

/// Greedy per-class non-maximum suppression, highest confidence first.
pub fn non_max_suppression(xs: &mut Vec<Bbox>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].id() != xs[index].id() {
                continue;
            }
            if xs[prev_index].iou(&xs[index]) > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bbox {
    // a bounding box around an object, in original image pixels
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    id: usize,
    confidence: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, id: usize, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            id,
            confidence,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = self.xmax().min(another.xmax());
        let t = self.ymin.max(another.ymin);
        let b = self.ymax().min(another.ymax());
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    pub fn iou(&self, another: &Bbox) -> f32 {
        let union = self.union(another);
        if union <= 0. {
            return 0.;
        }
        self.intersection_area(another) / union
    }
}
