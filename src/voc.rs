//! Pascal VOC annotation parsing
//!
//! Only the fields the converter needs are modelled: `size/{width,height}`,
//! `object*/name` and `object*/bndbox/{xmin,ymin,xmax,ymax}`. Everything else
//! in the file (`folder`, `source`, `pose`, `truncated`, `difficult`, ...) is
//! ignored.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed VOC annotation: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// One parsed annotation file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub filename: Option<String>,
    pub image_width: u32,
    pub image_height: u32,
    pub objects: Vec<ObjectBox>,
}

/// A labelled box in absolute pixel corners.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectBox {
    pub class_name: String,
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

// Raw document shape, mirrors the XML tree
#[derive(Debug, Deserialize)]
struct VocAnnotation {
    filename: Option<String>,
    size: VocSize,
    #[serde(rename = "object", default)]
    objects: Vec<VocObject>,
}

#[derive(Debug, Deserialize)]
struct VocSize {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct VocObject {
    name: String,
    bndbox: VocBndBox,
}

#[derive(Debug, Deserialize)]
struct VocBndBox {
    xmin: u32,
    ymin: u32,
    xmax: u32,
    ymax: u32,
}

impl From<VocAnnotation> for AnnotationRecord {
    fn from(doc: VocAnnotation) -> Self {
        Self {
            filename: doc.filename,
            image_width: doc.size.width,
            image_height: doc.size.height,
            objects: doc
                .objects
                .into_iter()
                .map(|obj| ObjectBox {
                    class_name: obj.name.trim().to_string(),
                    x_min: obj.bndbox.xmin,
                    y_min: obj.bndbox.ymin,
                    x_max: obj.bndbox.xmax,
                    y_max: obj.bndbox.ymax,
                })
                .collect(),
        }
    }
}

/// Parse a VOC document held in memory.
pub fn parse_voc(xml: &str) -> Result<AnnotationRecord, VocError> {
    let doc: VocAnnotation = quick_xml::de::from_str(xml)?;
    Ok(doc.into())
}

/// Read and parse a VOC `.xml` file.
pub fn read_voc(path: &Path) -> Result<AnnotationRecord, VocError> {
    let xml = fs::read_to_string(path).map_err(|source| VocError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_voc(&xml)
}
