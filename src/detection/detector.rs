//! Two-stage detector
//! person model on the full image -> PPE model on every person crop -> draw

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage};
use log::debug;

use super::render::Painter;
use super::types::{Detect, Detection, LabelMapping};

/// Minimum score for a PPE box to be drawn
pub const PPE_CONFIDENCE_THRESHOLD: f32 = 0.6;
/// Minimum score for a person box to be drawn
pub const PERSON_CONFIDENCE_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub person_threshold: f32,
    pub ppe_threshold: f32,
    pub person_labels: LabelMapping,
    pub ppe_labels: LabelMapping,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            person_threshold: PERSON_CONFIDENCE_THRESHOLD,
            ppe_threshold: PPE_CONFIDENCE_THRESHOLD,
            person_labels: LabelMapping::person(),
            ppe_labels: LabelMapping::ppe(),
        }
    }
}

/// A box that passed its threshold, with its display label, in full-image
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBox {
    pub detection: Detection,
    pub label: String,
}

pub struct TwoStageDetector {
    config: DetectorConfig,
    painter: Painter,
}

impl TwoStageDetector {
    pub fn new(config: DetectorConfig, painter: Painter) -> Self {
        Self { config, painter }
    }

    /// Run both models and return every box to draw, in drawing order: the
    /// PPE boxes of each person first, then the persons.
    pub fn collect(
        &self,
        image: &DynamicImage,
        person_model: &mut dyn Detect,
        ppe_model: &mut dyn Detect,
    ) -> Result<Vec<LabeledBox>> {
        let persons = person_model
            .detect(image)
            .context("person model failed")?;
        debug!("{} person candidates", persons.len());

        let mut boxes = Vec::new();

        // every person is cropped, whatever its score
        for person in &persons {
            let region = person.bbox.clamp(image.width(), image.height());
            if region.is_empty() {
                debug!("skipping degenerate person box {:?}", person.bbox);
                continue;
            }

            let crop = image.crop_imm(
                region.x_min as u32,
                region.y_min as u32,
                region.width() as u32,
                region.height() as u32,
            );
            let items = ppe_model.detect(&crop).context("PPE model failed")?;

            for item in items {
                let item = item.offset(region.x_min, region.y_min);
                if item.confidence >= self.config.ppe_threshold {
                    boxes.push(LabeledBox {
                        label: self.config.ppe_labels.label(item.class_id).to_string(),
                        detection: item,
                    });
                }
            }
        }

        for person in persons {
            if person.confidence >= self.config.person_threshold {
                boxes.push(LabeledBox {
                    label: self.config.person_labels.label(person.class_id).to_string(),
                    detection: person,
                });
            }
        }

        Ok(boxes)
    }

    /// Annotate one image with person and PPE boxes.
    pub fn annotate(
        &self,
        image: DynamicImage,
        person_model: &mut dyn Detect,
        ppe_model: &mut dyn Detect,
    ) -> Result<RgbImage> {
        let boxes = self.collect(&image, person_model, ppe_model)?;

        let mut canvas = image.into_rgb8();
        for b in &boxes {
            self.painter.draw(&mut canvas, &b.detection.bbox, &b.label);
        }
        Ok(canvas)
    }
}
