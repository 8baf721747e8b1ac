// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 detection model
// load -> preprocess -> run -> postprocess

use anyhow::{bail, Result};
use image::{imageops::FilterType, DynamicImage};
use log::{debug, info};
use ndarray::{s, Array, ArrayViewD, Axis, IxDyn};

use crate::detection::{Detect, Detection};
use crate::{non_max_suppression, Bbox, OrtBackend, OrtConfig};

/// Default score a raw anchor needs before NMS
pub const DEFAULT_CONF: f32 = 0.25;
/// Default NMS IoU threshold
pub const DEFAULT_IOU: f32 = 0.7;

// cx, cy, w, h in front of the class scores
const CXYWH_OFFSET: usize = 4;
// letterbox padding value
const PAD_VALUE: f32 = 144.0 / 255.0;

pub struct YOLOv8 {
    engine: OrtBackend,
    height: u32,
    width: u32,
    conf: f32,
    iou: f32,
    tag: String,
}

impl YOLOv8 {
    pub fn new(config: OrtConfig, conf: f32, iou: f32) -> Result<Self> {
        let tag = config.f.clone();
        let engine = OrtBackend::build(config)?;
        let (height, width) = (engine.height(), engine.width());

        Ok(Self {
            engine,
            height,
            width,
            conf,
            iou,
            tag,
        })
    }

    pub fn preprocess(&self, x: &DynamicImage) -> Array<f32, IxDyn> {
        letterbox(x, self.width, self.height)
    }

    pub fn postprocess(&self, ys: ArrayViewD<'_, f32>, xs0: &DynamicImage) -> Result<Vec<Bbox>> {
        decode(
            ys,
            (self.width, self.height),
            (xs0.width(), xs0.height()),
            self.conf,
            self.iou,
        )
    }

    pub fn run(&mut self, x: &DynamicImage) -> Result<Vec<Bbox>> {
        let t_pre = std::time::Instant::now();
        let xs = self.preprocess(x);
        debug!("[{}] preprocess: {:?}", self.tag, t_pre.elapsed());

        let t_run = std::time::Instant::now();
        let ys = self.engine.run(xs)?;
        debug!("[{}] inference: {:?}", self.tag, t_run.elapsed());

        let t_post = std::time::Instant::now();
        let ys = self.postprocess(ys.view(), x)?;
        debug!("[{}] postprocess: {:?}", self.tag, t_post.elapsed());

        Ok(ys)
    }

    pub fn summary(&self) {
        self.engine.summary(&self.tag);
        info!("[{}] conf: {}, iou: {}", self.tag, self.conf, self.iou);
    }
}

impl Detect for YOLOv8 {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let bboxes = self.run(image)?;
        Ok(bboxes.iter().map(Detection::from).collect())
    }
}

fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// Aspect-preserving resize into the top-left of a `width`x`height` canvas,
/// as a `[1, 3, height, width]` tensor of RGB values in 0..=1.
pub fn letterbox(x: &DynamicImage, width: u32, height: u32) -> Array<f32, IxDyn> {
    let mut ys = Array::from_elem((1, 3, height as usize, width as usize), PAD_VALUE).into_dyn();

    let (_, w_new, h_new) = scale_wh(
        x.width() as f32,
        x.height() as f32,
        width as f32,
        height as f32,
    );
    let img = x
        .resize_exact(
            (w_new as u32).clamp(1, width),
            (h_new as u32).clamp(1, height),
            FilterType::Triangle,
        )
        .into_rgb8();

    for (x, y, rgb) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let [r, g, b] = rgb.0;
        ys[[0, 0, y, x]] = (r as f32) / 255.0;
        ys[[0, 1, y, x]] = (g as f32) / 255.0;
        ys[[0, 2, y, x]] = (b as f32) / 255.0;
    }

    ys
}

/// Decode a `[1, 4 + nc, anchors]` output into boxes in original pixels.
pub fn decode(
    preds: ArrayViewD<'_, f32>,
    (input_w, input_h): (u32, u32),
    (width_original, height_original): (u32, u32),
    conf: f32,
    iou: f32,
) -> Result<Vec<Bbox>> {
    let shape = preds.shape();
    if shape.len() != 3 || shape[1] <= CXYWH_OFFSET {
        bail!(
            "expected a [batch, 4 + classes, anchors] output, got {:?}",
            shape
        );
    }
    let nc = shape[1] - CXYWH_OFFSET;

    let width_original = width_original as f32;
    let height_original = height_original as f32;
    let ratio = (input_w as f32 / width_original).min(input_h as f32 / height_original);

    let mut data: Vec<Bbox> = Vec::new();
    let anchors = preds.index_axis(Axis(0), 0);
    for pred in anchors.axis_iter(Axis(1)) {
        let bbox = pred.slice(s![0..CXYWH_OFFSET]);
        let clss = pred.slice(s![CXYWH_OFFSET..CXYWH_OFFSET + nc]);

        let (id, &confidence) = match clss
            .iter()
            .enumerate()
            .reduce(|max, x| if x.1 > max.1 { x } else { max })
        {
            Some(best) => best,
            None => continue,
        };

        if confidence < conf {
            continue;
        }

        let cx = bbox[0] / ratio;
        let cy = bbox[1] / ratio;
        let w = bbox[2] / ratio;
        let h = bbox[3] / ratio;
        let x1 = (cx - w / 2.).clamp(0., width_original);
        let y1 = (cy - h / 2.).clamp(0., height_original);
        let x2 = (cx + w / 2.).clamp(0., width_original);
        let y2 = (cy + h / 2.).clamp(0., height_original);

        data.push(Bbox::new(x1, y1, x2 - x1, y2 - y1, id, confidence));
    }

    non_max_suppression(&mut data, iou);
    Ok(data)
}
