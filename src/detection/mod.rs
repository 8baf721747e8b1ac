/// Detection system
///
/// - types:    boxes, detections, label mappings, the `Detect` model trait
/// - detector: person -> crop -> PPE two-stage pipeline
/// - render:   box and label drawing
pub mod detector;
pub mod render;
pub mod types;

pub use detector::{
    DetectorConfig, LabeledBox, TwoStageDetector, PERSON_CONFIDENCE_THRESHOLD,
    PPE_CONFIDENCE_THRESHOLD,
};
pub use render::Painter;
pub use types::{BoxXyxy, Detect, Detection, LabelMapping};
