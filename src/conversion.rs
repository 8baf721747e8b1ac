use std::fmt;
use thiserror::Error;

use crate::voc::{AnnotationRecord, ObjectBox};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("class '{name}' is not in the class list")]
    UnknownClass { name: String },
    #[error("image size {width}x{height} has a zero dimension")]
    EmptyImage { width: u32, height: u32 },
}

/// Ordered class names; a name's position is its YOLO class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// One class per line, trimmed. Blank lines in the middle keep their slot
    /// so the ids of the following classes do not shift.
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines().map(|line| line.trim().to_string()).collect())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A box in YOLO's normalized center format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLine {
    pub class_id: usize,
    pub x_center: f64,
    pub y_center: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
}

impl YoloLine {
    pub fn from_box(class_id: usize, obj: &ObjectBox, width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let (x_min, y_min) = (obj.x_min as f64, obj.y_min as f64);
        let (x_max, y_max) = (obj.x_max as f64, obj.y_max as f64);

        Self {
            class_id,
            x_center: (x_min + x_max) / 2.0 / w,
            y_center: (y_min + y_max) / 2.0 / h,
            bbox_width: (x_max - x_min) / w,
            bbox_height: (y_max - y_min) / h,
        }
    }

    /// Absolute corners `(x_min, y_min, x_max, y_max)` for an image of `width`x`height`.
    pub fn to_corners(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let (w, h) = (width as f64, height as f64);
        let half_w = self.bbox_width * w / 2.0;
        let half_h = self.bbox_height * h / 2.0;
        let cx = self.x_center * w;
        let cy = self.y_center * h;
        (cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Render the line, either with the shortest exact float form or with a
    /// fixed number of decimals.
    pub fn format(&self, precision: Option<usize>) -> String {
        match precision {
            Some(p) => format!(
                "{} {:.p$} {:.p$} {:.p$} {:.p$}",
                self.class_id,
                self.x_center,
                self.y_center,
                self.bbox_width,
                self.bbox_height,
                p = p
            ),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for YoloLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `{:?}` keeps the decimal point on whole values ("1.0", not "1")
        write!(
            f,
            "{} {:?} {:?} {:?} {:?}",
            self.class_id, self.x_center, self.y_center, self.bbox_width, self.bbox_height
        )
    }
}

/// Convert every object of `record`, in order.
///
/// Each class name is looked up before the allow-list is consulted, so a name
/// missing from `classes` fails the whole record even when the allow-list
/// would have dropped it. `None` or an empty allow-list keeps every object.
pub fn convert(
    record: &AnnotationRecord,
    classes: &ClassList,
    allow_list: Option<&[String]>,
) -> Result<Vec<YoloLine>, ConvertError> {
    if record.image_width == 0 || record.image_height == 0 {
        return Err(ConvertError::EmptyImage {
            width: record.image_width,
            height: record.image_height,
        });
    }

    let allow_list = allow_list.filter(|list| !list.is_empty());
    let mut lines = Vec::with_capacity(record.objects.len());

    for obj in &record.objects {
        let class_id =
            classes
                .index_of(&obj.class_name)
                .ok_or_else(|| ConvertError::UnknownClass {
                    name: obj.class_name.clone(),
                })?;

        if let Some(allowed) = allow_list {
            if !allowed.iter().any(|name| name == &obj.class_name) {
                continue;
            }
        }

        lines.push(YoloLine::from_box(
            class_id,
            obj,
            record.image_width,
            record.image_height,
        ));
    }

    Ok(lines)
}

/// Label file body: one line per box, no trailing newline.
pub fn to_yolo_text(lines: &[YoloLine], precision: Option<usize>) -> String {
    lines
        .iter()
        .map(|line| line.format(precision))
        .collect::<Vec<_>>()
        .join("\n")
}
