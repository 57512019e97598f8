use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container estimate; 0 when the demuxer cannot tell.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Frame rate rounded for encoder time bases, falling back to 30 when
    /// the source reports none.
    pub fn encoder_fps(&self) -> i32 {
        let fps = self.fps.round() as i32;
        if fps <= 0 {
            DEFAULT_FPS
        } else {
            fps
        }
    }
}

const DEFAULT_FPS: i32 = 30;
