/// Detection model implementations
///
/// Every model implements `detection::Detect`, so the two-stage detector
/// never depends on a concrete backend.
///
/// ## Usage
/// ```no_run
/// use ppe_detect::models::YOLOv8;
/// use ppe_detect::{Detect, OrtConfig};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut model = YOLOv8::new(OrtConfig::new("person.onnx"), 0.25, 0.7)?;
/// let image = image::open("site.jpg")?;
/// let detections = model.detect(&image)?;
/// # Ok(())
/// # }
/// ```
pub mod yolov8;

pub use yolov8::YOLOv8;
