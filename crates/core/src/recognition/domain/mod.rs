pub mod embedding;
pub mod face_matcher;
pub mod gallery;
pub mod multi_face_policy;
pub mod recognition_config;
