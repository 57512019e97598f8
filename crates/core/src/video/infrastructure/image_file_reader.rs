use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

/// Decodes reference photos with the `image` crate.
///
/// Any colour type is converted to RGB8; EXIF orientation is not applied,
/// so reference photos should be stored upright.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?
            .to_rgb8();
        if img.width() == 0 || img.height() == 0 {
            return Err(format!("{} has no pixels", path.display()).into());
        }
        Ok(Frame::from_rgb_image(img, 0))
    }
}
