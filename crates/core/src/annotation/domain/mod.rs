pub mod annotation_style;
pub mod frame_annotator;
