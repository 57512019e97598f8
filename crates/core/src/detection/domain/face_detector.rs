use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for locating faces in a frame.
///
/// Regions come back in descending confidence order, so the first region is
/// the detector's most confident face.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
