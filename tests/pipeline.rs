use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use ppe_detect::{
    annotate_directory, BoxXyxy, Detect, Detection, DetectorConfig, Painter, TwoStageDetector,
};
use std::fs;
use tempfile::tempdir;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

// Returns the same detections for every image and records the input sizes
struct FixedModel {
    detections: Vec<Detection>,
    seen: Vec<(u32, u32)>,
}

impl FixedModel {
    fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            seen: Vec::new(),
        }
    }
}

impl Detect for FixedModel {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>> {
        self.seen.push((image.width(), image.height()));
        Ok(self.detections.clone())
    }
}

// Fails on every call, or only on the listed call numbers (0-based)
struct FailingModel {
    fail_all: bool,
    fail_on: Vec<usize>,
    calls: usize,
    detections: Vec<Detection>,
}

impl FailingModel {
    fn always() -> Self {
        Self {
            fail_all: true,
            fail_on: Vec::new(),
            calls: 0,
            detections: Vec::new(),
        }
    }

    fn on_calls(fail_on: Vec<usize>, detections: Vec<Detection>) -> Self {
        Self {
            fail_all: false,
            fail_on,
            calls: 0,
            detections,
        }
    }
}

impl Detect for FailingModel {
    fn detect(&mut self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_all || self.fail_on.contains(&call) {
            anyhow::bail!("inference failed on call {}", call);
        }
        Ok(self.detections.clone())
    }
}

fn write_images(dir: &std::path::Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        RgbImage::from_pixel(32, 32, Rgb([10, 10, 10]))
            .save(dir.join(name))
            .unwrap();
    }
}

fn det(x_min: i32, y_min: i32, x_max: i32, y_max: i32, class_id: usize, conf: f32) -> Detection {
    Detection::new(BoxXyxy::new(x_min, y_min, x_max, y_max), class_id, conf)
}

fn detector() -> TwoStageDetector {
    TwoStageDetector::new(DetectorConfig::default(), Painter::new(None))
}

fn blank(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
}

#[test]
fn test_ppe_boxes_are_remapped_to_full_image() {
    let mut persons = FixedModel::new(vec![det(20, 30, 60, 90, 0, 0.9)]);
    let mut ppe = FixedModel::new(vec![det(5, 5, 15, 25, 0, 0.8)]);

    let boxes = detector()
        .collect(&blank(100, 100), &mut persons, &mut ppe)
        .unwrap();

    assert_eq!(ppe.seen, vec![(40, 60)]);
    assert_eq!(boxes.len(), 2);
    assert_eq!(boxes[0].label, "hard-hat");
    assert_eq!(boxes[0].detection.bbox, BoxXyxy::new(25, 35, 35, 55));
    assert_eq!(boxes[1].label, "person");
}

#[test]
fn test_thresholds_are_inclusive() {
    let mut persons = FixedModel::new(vec![
        det(0, 0, 50, 50, 0, 0.7),
        det(50, 50, 100, 100, 0, 0.69),
    ]);
    let mut ppe = FixedModel::new(vec![
        det(0, 0, 10, 10, 3, 0.6),
        det(0, 0, 10, 10, 2, 0.59),
    ]);

    let boxes = detector()
        .collect(&blank(100, 100), &mut persons, &mut ppe)
        .unwrap();
    let labels: Vec<&str> = boxes.iter().map(|b| b.label.as_str()).collect();

    // both persons are cropped, whatever their score
    assert_eq!(ppe.seen.len(), 2);
    assert_eq!(labels, vec!["vest", "vest", "person"]);
}

#[test]
fn test_unknown_ppe_class_gets_fallback_label() {
    let mut persons = FixedModel::new(vec![det(0, 0, 50, 50, 0, 0.9)]);
    let mut ppe = FixedModel::new(vec![det(0, 0, 10, 10, 9, 0.9)]);

    let boxes = detector()
        .collect(&blank(64, 64), &mut persons, &mut ppe)
        .unwrap();
    assert_eq!(boxes[0].label, "unknown");
}

#[test]
fn test_degenerate_person_is_not_cropped() {
    let mut persons = FixedModel::new(vec![
        det(10, 10, 10, 40, 0, 0.95),
        det(200, 200, 300, 300, 0, 0.95),
    ]);
    let mut ppe = FixedModel::new(vec![det(0, 0, 5, 5, 1, 0.9)]);

    let boxes = detector()
        .collect(&blank(100, 100), &mut persons, &mut ppe)
        .unwrap();

    assert!(ppe.seen.is_empty());
    assert!(boxes.iter().all(|b| b.label == "person"));
}

#[test]
fn test_person_box_is_clamped_before_cropping() {
    let mut persons = FixedModel::new(vec![det(-10, 80, 30, 140, 0, 0.9)]);
    let mut ppe = FixedModel::new(vec![det(0, 0, 4, 4, 4, 0.9)]);

    let boxes = detector()
        .collect(&blank(100, 100), &mut persons, &mut ppe)
        .unwrap();

    assert_eq!(ppe.seen, vec![(30, 20)]);
    assert_eq!(boxes[0].label, "ppe-suit");
    assert_eq!(boxes[0].detection.bbox, BoxXyxy::new(0, 80, 4, 84));
}

#[test]
fn test_annotate_draws_only_kept_boxes() {
    let mut persons = FixedModel::new(vec![det(10, 10, 80, 80, 0, 0.9)]);
    let mut ppe = FixedModel::new(vec![
        det(10, 10, 30, 30, 0, 0.9),
        det(40, 40, 60, 60, 1, 0.5),
    ]);

    let canvas = detector()
        .annotate(blank(100, 100), &mut persons, &mut ppe)
        .unwrap();

    // person outline
    assert_eq!(*canvas.get_pixel(10, 50), GREEN);
    assert_eq!(*canvas.get_pixel(11, 50), GREEN);
    // hard-hat at (20, 20)-(40, 40) in full-image pixels
    assert_eq!(*canvas.get_pixel(20, 30), GREEN);
    assert_eq!(*canvas.get_pixel(40, 30), GREEN);
    // gloves fell under the threshold
    assert_eq!(*canvas.get_pixel(50, 60), BLACK);
    assert_eq!(*canvas.get_pixel(70, 60), BLACK);
    assert_eq!(*canvas.get_pixel(50, 50), BLACK);
}

#[test]
fn test_annotate_directory_skips_non_images() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("images");
    let output = dir.path().join("out");
    fs::create_dir_all(&input).unwrap();

    RgbImage::from_pixel(64, 48, Rgb([10, 10, 10]))
        .save(input.join("a.png"))
        .unwrap();
    RgbImage::from_pixel(32, 32, Rgb([10, 10, 10]))
        .save(input.join("b.jpg"))
        .unwrap();
    fs::write(input.join("readme.txt"), "no image here").unwrap();

    let mut persons = FixedModel::new(vec![det(2, 2, 20, 20, 0, 0.9)]);
    let mut ppe = FixedModel::new(vec![]);

    let stats = annotate_directory(&input, &output, &detector(), &mut persons, &mut ppe).unwrap();

    assert_eq!(stats.total_files_processed, 3);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(persons.seen, vec![(64, 48), (32, 32)]);

    let out = image::open(output.join("a.png")).unwrap();
    assert_eq!((out.width(), out.height()), (64, 48));
    assert!(output.join("b.jpg").exists());
    assert!(!output.join("readme.txt").exists());
}

#[test]
fn test_annotate_directory_counts_unreadable_images() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("images");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("corrupt.jpg"), b"not a jpeg").unwrap();

    let mut persons = FixedModel::new(vec![]);
    let mut ppe = FixedModel::new(vec![]);
    let stats = annotate_directory(
        &input,
        &dir.path().join("out"),
        &detector(),
        &mut persons,
        &mut ppe,
    )
    .unwrap();

    assert_eq!(stats.failed, 1);
    assert!(persons.seen.is_empty());
}

#[test]
fn test_ppe_model_failure_fails_each_image() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("images");
    let output = dir.path().join("out");
    write_images(&input, &["a.png", "b.png"]);

    let mut persons = FixedModel::new(vec![det(2, 2, 20, 20, 0, 0.9)]);
    let mut ppe = FailingModel::always();

    let stats = annotate_directory(&input, &output, &detector(), &mut persons, &mut ppe).unwrap();

    assert_eq!(stats.total_files_processed, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.successful, 0);
    assert_eq!(ppe.calls, 2);
    assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
}

#[test]
fn test_batch_continues_after_person_model_failure() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("images");
    let output = dir.path().join("out");
    write_images(&input, &["a.png", "b.png"]);

    let mut persons = FailingModel::on_calls(vec![0], vec![det(2, 2, 20, 20, 0, 0.9)]);
    let mut ppe = FixedModel::new(vec![]);

    let stats = annotate_directory(&input, &output, &detector(), &mut persons, &mut ppe).unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.successful, 1);
    assert!(!output.join("a.png").exists());
    assert!(output.join("b.png").exists());
    assert_eq!(ppe.seen, vec![(18, 18)]);
}
