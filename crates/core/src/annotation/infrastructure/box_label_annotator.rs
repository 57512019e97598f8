/// Box-and-banner annotator drawing with `imageproc`.
///
/// Each face gets a hollow rectangle and a filled banner carrying its label.
/// The banner sits inside the bottom edge of the box, moves below the box
/// when the box is too short, and above it when below would leave the frame.
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::annotation::domain::annotation_style::AnnotationStyle;
use crate::annotation::domain::frame_annotator::{FrameAnnotator, MatchedFace};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

pub struct BoxLabelAnnotator {
    style: AnnotationStyle,
    font: Option<FontVec>,
}

impl BoxLabelAnnotator {
    pub fn new(style: AnnotationStyle, font: Option<FontVec>) -> Self {
        if font.is_none() {
            log::warn!("No font available; labels will be drawn without text");
        }
        Self { style, font }
    }

    fn draw_face(&self, canvas: &mut RgbImage, face: &MatchedFace) {
        let (fw, fh) = canvas.dimensions();
        let region = face.region.clamped(fw, fh);
        if region.is_empty() {
            return;
        }
        let color = Rgb(self.style.color_for(&face.result.label));

        for i in 0..self.style.thickness as i32 {
            let w = region.width - 2 * i;
            let h = region.height - 2 * i;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(region.x + i, region.y + i).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, rect, color);
        }

        let text = self.style.label_text(&face.result);
        let scale = PxScale::from(self.style.font_size);
        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(scale, font, &text),
            None => (0, 0),
        };

        let Some(banner) = banner_placement(
            &region,
            self.style.banner_height,
            text_w + 2 * self.style.text_inset,
            fw,
            fh,
        ) else {
            return;
        };
        draw_filled_rect_mut(
            canvas,
            Rect::at(banner.x, banner.y).of_size(banner.width, banner.height),
            color,
        );

        if let Some(font) = &self.font {
            let text_y = banner.y + (banner.height.saturating_sub(text_h) / 2) as i32;
            draw_text_mut(
                canvas,
                Rgb(self.style.text_color),
                banner.x + self.style.text_inset as i32,
                text_y,
                scale,
                font,
                &text,
            );
        }
    }
}

impl FrameAnnotator for BoxLabelAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[MatchedFace],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if faces.is_empty() {
            return Ok(());
        }
        let channels = frame.channels();
        frame
            .with_rgb_canvas(|canvas| {
                for face in faces {
                    self.draw_face(canvas, face);
                }
            })
            .ok_or_else(|| format!("cannot annotate frame with {channels} channels").into())
    }
}

/// Banner rectangle in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Placement {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

/// Places the label banner for a (clamped, non-empty) face box.
///
/// The banner spans at least the box width, widening for long labels up to
/// the right frame edge. It stays inside the box when the box is at least
/// twice the banner height.
fn banner_placement(
    region: &Region,
    banner_height: u32,
    min_width: u32,
    frame_width: u32,
    frame_height: u32,
) -> Option<Placement> {
    let height = banner_height.min(frame_height) as i32;
    let available = frame_width as i32 - region.x;
    let width = region.width.max(min_width as i32).min(available);
    if height <= 0 || width <= 0 {
        return None;
    }

    let y = if region.height >= 2 * height {
        region.bottom() - height
    } else if region.bottom() + height <= frame_height as i32 {
        region.bottom()
    } else {
        (region.y - height).max(0)
    };

    Some(Placement {
        x: region.x,
        y,
        width: width as u32,
        height: height as u32,
    })
}
