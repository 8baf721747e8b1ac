//! Box and label drawing

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use super::types::BoxXyxy;

/// Green, as in the original annotated outputs
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 2;
/// Label position relative to the box's top-left corner
pub const LABEL_INSET: (i32, i32) = (5, 12);
pub const LABEL_SCALE: f32 = 16.0;

/// Draws outlined boxes and their labels onto RGB canvases.
///
/// Without a font only the outlines are drawn.
pub struct Painter {
    font: Option<FontVec>,
    color: Rgb<u8>,
    thickness: u32,
    label_scale: PxScale,
    label_inset: (i32, i32),
}

impl Default for Painter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Painter {
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            color: BOX_COLOR,
            thickness: BOX_THICKNESS,
            label_scale: PxScale::from(LABEL_SCALE),
            label_inset: LABEL_INSET,
        }
    }

    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    pub fn with_thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness.max(1);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn color(&self) -> Rgb<u8> {
        self.color
    }

    /// Outline `bbox` and write `label` inside its top-left corner.
    pub fn draw(&self, canvas: &mut RgbImage, bbox: &BoxXyxy, label: &str) {
        self.draw_outline(canvas, bbox);

        if let Some(font) = &self.font {
            draw_text_mut(
                canvas,
                self.color,
                bbox.x_min.saturating_add(self.label_inset.0),
                bbox.y_min.saturating_add(self.label_inset.1),
                self.label_scale,
                font,
                label,
            );
        }
    }

    // Nested 1px rectangles, growing inward from the box edge
    fn draw_outline(&self, canvas: &mut RgbImage, bbox: &BoxXyxy) {
        // corners past the canvas keep their outline off-canvas
        let margin = self.thickness as i32 + 1;
        let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
        let bbox = BoxXyxy::new(
            bbox.x_min.clamp(-margin, cw.saturating_add(margin)),
            bbox.y_min.clamp(-margin, ch.saturating_add(margin)),
            bbox.x_max.clamp(-margin, cw.saturating_add(margin)),
            bbox.y_max.clamp(-margin, ch.saturating_add(margin)),
        );
        let width = bbox.width().saturating_add(1);
        let height = bbox.height().saturating_add(1);

        for t in 0..self.thickness as i32 {
            let (w, h) = (width - 2 * t, height - 2 * t);
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x_min + t, bbox.y_min + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, rect, self.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_is_two_pixels_thick() {
        let mut canvas = RgbImage::new(40, 40);
        Painter::default().draw(&mut canvas, &BoxXyxy::new(10, 10, 30, 30), "vest");

        assert_eq!(*canvas.get_pixel(10, 20), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(11, 20), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(12, 20), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(30, 30), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(20, 20), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(9, 9), Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_past_the_edge_are_clipped() {
        let mut canvas = RgbImage::new(20, 20);
        Painter::default().draw(&mut canvas, &BoxXyxy::new(-10, -10, 50, 50), "person");
        assert_eq!(*canvas.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn thin_box_does_not_panic() {
        let mut canvas = RgbImage::new(20, 20);
        Painter::default().draw(&mut canvas, &BoxXyxy::new(5, 5, 5, 15), "gloves");
        assert_eq!(*canvas.get_pixel(5, 10), BOX_COLOR);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let mut canvas = RgbImage::new(20, 20);
        let painter = Painter::default();
        painter.draw(&mut canvas, &BoxXyxy::new(5, 5, i32::MAX, i32::MAX), "vest");
        painter.draw(&mut canvas, &BoxXyxy::new(i32::MAX - 1, 0, i32::MAX, 10), "boots");
        assert_eq!(*canvas.get_pixel(5, 10), BOX_COLOR);
    }

    #[test]
    fn custom_color_and_thickness() {
        let red = Rgb([255, 0, 0]);
        let painter = Painter::default().with_color(red).with_thickness(1);
        assert_eq!(painter.color(), red);

        let mut canvas = RgbImage::new(20, 20);
        painter.draw(&mut canvas, &BoxXyxy::new(2, 2, 12, 12), "vest");
        assert_eq!(*canvas.get_pixel(2, 5), red);
        assert_eq!(*canvas.get_pixel(3, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn without_font_labels_are_skipped() {
        let painter = Painter::default();
        assert!(!painter.has_font());
    }
}
