pub mod annotate_video_use_case;
pub mod load_gallery_use_case;
pub mod pipeline_logger;
