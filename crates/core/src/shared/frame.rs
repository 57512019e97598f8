use image::RgbImage;
use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A single decoded video frame or still image: contiguous RGB bytes in
/// row-major order.
///
/// Conversion from codec pixel formats happens in the readers; everything
/// downstream sees packed RGB24.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Wraps an `image` RGB buffer, taking ownership of its pixels.
    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Lends the pixels to `draw` as an owned `RgbImage` and moves them back
    /// afterwards, so drawing routines can paint into the frame without a
    /// copy. Returns `None` for non-RGB frames.
    pub fn with_rgb_canvas<R>(&mut self, draw: impl FnOnce(&mut RgbImage) -> R) -> Option<R> {
        if self.channels != 3 || self.data.len() != self.len_for(3) {
            return None;
        }
        let pixels = std::mem::take(&mut self.data);
        let mut canvas = RgbImage::from_raw(self.width, self.height, pixels)?;
        let out = draw(&mut canvas);
        self.data = canvas.into_raw();
        Some(out)
    }

    /// Copies the pixels covered by `region` (clamped to the frame) into a
    /// tightly packed buffer. Returns `(pixels, width, height)`.
    pub fn crop(&self, region: &Region) -> (Vec<u8>, u32, u32) {
        let r = region.clamped(self.width, self.height);
        let channels = self.channels as usize;
        let fw = self.width as usize;
        let (rx, ry) = (r.x as usize, r.y as usize);
        let (rw, rh) = (r.width as usize, r.height as usize);

        let mut out = Vec::with_capacity(rw * rh * channels);
        for row in ry..ry + rh {
            let start = (row * fw + rx) * channels;
            out.extend_from_slice(&self.data[start..start + rw * channels]);
        }
        (out, rw as u32, rh as u32)
    }

    fn len_for(&self, channels: usize) -> usize {
        self.width as usize * self.height as usize * channels
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: i32, y: i32, w: i32, h: i32) -> Region {
        Region::new(x, y, w, h)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_from_rgb_image_keeps_pixels() {
        let img = RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let frame = Frame::from_rgb_image(img, 7);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 7);
        assert_eq!(&frame.data()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_rgb_canvas_writes_through_to_frame() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        frame
            .with_rgb_canvas(|canvas| canvas.put_pixel(1, 1, image::Rgb([1, 2, 3])))
            .unwrap();
        assert_eq!(&frame.data()[9..12], &[1, 2, 3]);
    }

    #[test]
    fn test_rgb_canvas_rejects_grayscale() {
        let mut frame = Frame::new(vec![0u8; 4], 2, 2, 1, 0);
        assert!(frame.with_rgb_canvas(|_| ()).is_none());
        assert_eq!(frame.data().len(), 4);
    }

    #[test]
    fn test_crop_inside_frame() {
        // 4x2 frame, pixel value = column index
        let mut data = Vec::new();
        for _row in 0..2 {
            for col in 0..4u8 {
                data.extend_from_slice(&[col, col, col]);
            }
        }
        let frame = Frame::new(data, 4, 2, 3, 0);
        let (pixels, w, h) = frame.crop(&region(1, 0, 2, 2));
        assert_eq!((w, h), (2, 2));
        assert_eq!(pixels, vec![1, 1, 1, 2, 2, 2, 1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_crop_clamps_to_frame() {
        let frame = Frame::new(vec![9u8; 4 * 4 * 3], 4, 4, 3, 0);
        let (pixels, w, h) = frame.crop(&region(-2, 2, 10, 10));
        assert_eq!((w, h), (4, 2));
        assert_eq!(pixels.len(), 4 * 2 * 3);
    }
}
