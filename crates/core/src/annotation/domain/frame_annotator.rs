use crate::recognition::domain::face_matcher::MatchResult;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// A detected face and the gallery's verdict on it.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedFace {
    pub region: Region,
    pub result: MatchResult,
}

/// Domain interface for drawing match results onto a frame.
///
/// Implementations modify the frame in-place. An empty `faces` slice must
/// leave the pixels untouched.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[MatchedFace],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
