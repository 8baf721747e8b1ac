// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! Detection data structures shared by the models and the two-stage detector

use anyhow::Result;
use image::DynamicImage;
use std::collections::BTreeMap;

use crate::Bbox;

// ========== Boxes ==========

/// Integer pixel box, corners inclusive of `x_min`/`y_min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxXyxy {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoxXyxy {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> i32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> i32 {
        self.y_max.saturating_sub(self.y_min)
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Move both corners by `(dx, dy)`, saturating at the `i32` range.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x_min.saturating_add(dx),
            self.y_min.saturating_add(dy),
            self.x_max.saturating_add(dx),
            self.y_max.saturating_add(dy),
        )
    }

    /// Intersect with the `width`x`height` image rectangle.
    pub fn clamp(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as i32, height as i32);
        Self::new(
            self.x_min.clamp(0, w),
            self.y_min.clamp(0, h),
            self.x_max.clamp(0, w),
            self.y_max.clamp(0, h),
        )
    }
}

/// One model output: box, class and score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoxXyxy,
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoxXyxy, class_id: usize, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }

    /// Same detection with its box moved into another frame.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            bbox: self.bbox.offset(dx, dy),
            ..*self
        }
    }
}

impl From<&Bbox> for Detection {
    // pixel corners are truncated toward zero
    fn from(b: &Bbox) -> Self {
        Self::new(
            BoxXyxy::new(
                b.xmin() as i32,
                b.ymin() as i32,
                b.xmax() as i32,
                b.ymax() as i32,
            ),
            b.id(),
            b.confidence(),
        )
    }
}

// ========== Labels ==========

pub const UNKNOWN_LABEL: &str = "unknown";

/// class_id -> display name for one model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelMapping {
    labels: BTreeMap<usize, String>,
}

impl LabelMapping {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(|(id, s)| (id, s.into())).collect(),
        }
    }

    /// Labels of the person model
    pub fn person() -> Self {
        Self::new([(0, "person")])
    }

    /// Labels of the PPE model
    pub fn ppe() -> Self {
        Self::new([
            (0, "hard-hat"),
            (1, "gloves"),
            (2, "boots"),
            (3, "vest"),
            (4, "ppe-suit"),
        ])
    }

    pub fn label(&self, class_id: usize) -> &str {
        self.labels
            .get(&class_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }
}

// ========== Models ==========

/// A detection model seen from the pipeline: image in, boxes out.
///
/// Boxes are in the pixel frame of the image that was passed in.
pub trait Detect {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

impl<T: Detect + ?Sized> Detect for Box<T> {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>> {
        (**self).detect(image)
    }
}
